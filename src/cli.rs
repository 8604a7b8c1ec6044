use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::config::Overrides;

/// Terminal client for the project board REST backend.
/// Runs the interactive board when no subcommand is given.
#[derive(Parser)]
#[command(name = "pb", version, about = "Project board client for the terminal")]
pub struct Cli {
    /// Backend base URL (overrides API_BASE_URL and the config file).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Path to the YAML config file. Defaults to ~/.pb/config.yaml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Current user id (overrides PB_USER_ID and the config file).
    #[arg(long = "user", global = true)]
    pub user_id: Option<u64>,

    /// Where the interactive UI writes its log.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Flag values that take precedence over env and file config.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            user_id: self.user_id,
            log_file: self.log_file.clone(),
            config: self.config.clone(),
        }
    }
}
