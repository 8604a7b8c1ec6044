//! # PB - Project Board client
//!
//! A terminal client for a project-management REST backend: projects, tasks,
//! users and teams, browsed through an interactive board or scripted through
//! plain subcommands.
//!
//! ## Key Features
//!
//! - **Kanban Board**: Tasks grouped into To Do, Work In Progress, Under Review
//! and Completed; grab a card and drop it on another column to change its status
//! - **Multiple Views**: Board, card list, timeline (Gantt) and table per project
//! - **Shared Query Cache**: Identical requests are de-duplicated and results are
//! refetched automatically when a create or status change invalidates them
//! - **Debounced Search**: Tasks, projects and users, after a pause in typing
//! - **Priority Pages**: The current user's tasks, one page per priority
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive board
//! pb
//!
//! # Point at another backend
//! pb --base-url http://localhost:8000 projects
//!
//! # Show a project's board on stdout
//! pb tasks --project 5 --view board
//!
//! # Move a task
//! pb move 42 under-review
//! ```
//!
//! ## Configuration
//!
//! Settings resolve from flags, then `API_BASE_URL` / `PB_USER_ID`, then
//! `~/.pb/config.yaml`, then defaults. The interactive UI logs to
//! `~/.pb/pb.log`; set `RUST_LOG` to change the level.

use clap::Parser;

pub mod api;
pub mod board;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod format;
pub mod logging;
pub mod project;
pub mod search;
pub mod task;
pub mod timeline;
pub mod user;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod project_form;
    pub mod run;
    pub mod task_form;
    pub mod utils;
    pub mod views;
}

use cli::Cli;
use cmd::{dispatch, Commands};
use config::AppConfig;
use logging::LogTarget;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // The UI owns the terminal, so it logs to a file.
    let command = cli.command.unwrap_or(Commands::Ui);
    let target = match command {
        Commands::Ui => LogTarget::File(&config.log_file),
        _ => LogTarget::Stderr,
    };
    if let Err(e) = logging::init(target) {
        eprintln!("Failed to set up logging: {}", e);
        std::process::exit(1);
    }

    dispatch(command, config).await;
}
