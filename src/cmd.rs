//! Command implementations for the CLI interface.
//!
//! Each handler runs one request through the shared `ApiClient`, prints a
//! plain-text rendering and exits non-zero on failure. The interactive UI
//! is one more subcommand.

use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::debug;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::fields::{Priority, Status, ViewMode};
use crate::format::{print_board, print_projects, print_task_list, print_task_table, print_teams, print_users, truncate};
use crate::project::NewProject;
use crate::search::{is_searchable, SearchResults, Section};
use crate::timeline::{bar_span, date_range, project_bars};
use crate::tui::input::InputField;
use crate::tui::project_form::ProjectForm;
use crate::tui::run::run_tui;
use crate::tui::task_form::TaskForm;
use crate::user::find_user;

/// Rendering of a task collection on the command line.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TaskView {
    #[default]
    List,
    Table,
    Board,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive board (the default).
    Ui,

    /// List all projects.
    Projects,

    /// Create a project.
    ProjectAdd {
        /// Project name.
        #[arg(long)]
        name: String,
        /// Optional description.
        #[arg(long)]
        desc: Option<String>,
        /// Start date, YYYY-MM-DD.
        #[arg(long)]
        start: Option<String>,
        /// End date, YYYY-MM-DD.
        #[arg(long)]
        end: Option<String>,
    },

    /// List the tasks of one project.
    Tasks {
        /// Project id.
        #[arg(long)]
        project: u64,
        /// Rendering: list | table | board.
        #[arg(long, value_enum, default_value_t = TaskView::List)]
        view: TaskView,
    },

    /// List tasks authored by or assigned to the current user (see --user).
    UserTasks {
        /// Only tasks of this priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },

    /// Create a task.
    TaskAdd {
        /// Short title for the task.
        title: String,
        /// Project id.
        #[arg(long)]
        project: u64,
        /// Author user id. Defaults to the configured user.
        #[arg(long)]
        author: Option<u64>,
        /// Assigned user id. Defaults to the configured user.
        #[arg(long)]
        assignee: Option<u64>,
        /// Start date, YYYY-MM-DD.
        #[arg(long)]
        start: String,
        /// Due date, YYYY-MM-DD.
        #[arg(long)]
        due: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
        /// Story points.
        #[arg(long)]
        points: Option<u32>,
        /// Initial status.
        #[arg(long, value_enum, default_value_t = Status::ToDo)]
        status: Status,
        /// Priority.
        #[arg(long, value_enum, default_value_t = Priority::Backlog)]
        priority: Priority,
    },

    /// Move a task to another status.
    Move {
        /// Task id.
        task: u64,
        /// Target status.
        #[arg(value_enum)]
        status: Status,
    },

    /// Search tasks, projects and users.
    Search {
        /// At least three characters.
        term: String,
    },

    /// List all users.
    Users,

    /// List all teams.
    Teams,

    /// Print the project timeline.
    Timeline {
        /// Granularity: day | week | month.
        #[arg(long, value_enum, default_value_t = ViewMode::Month)]
        mode: ViewMode,
    },

    /// Show the resolved settings and current user.
    Settings,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Print an error and exit, the way every command fails.
fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

fn or_fail<T>(context: &str, result: Result<T, ApiError>) -> T {
    result.unwrap_or_else(|err| fail(context, err))
}

/// Launch the interactive UI.
pub async fn cmd_ui(config: AppConfig) {
    if let Err(e) = run_tui(config).await {
        fail("Failed to run UI", e);
    }
}

pub async fn cmd_projects(client: &ApiClient) {
    let projects = or_fail("Failed to fetch projects", client.get_projects().await);
    if projects.is_empty() {
        println!("No projects.");
        return;
    }
    print_projects(&projects);
}

/// Create a project. Validation is shared with the UI form.
pub async fn cmd_project_add(
    client: &ApiClient,
    name: String,
    desc: Option<String>,
    start: Option<String>,
    end: Option<String>,
) {
    let mut form = ProjectForm::new();
    form.name = InputField::with_value(&name);
    form.description = InputField::with_value(desc.as_deref().unwrap_or(""));
    form.start_date = InputField::with_value(start.as_deref().unwrap_or(""));
    form.end_date = InputField::with_value(end.as_deref().unwrap_or(""));
    let project: NewProject = form.build().unwrap_or_else(|e| fail("Invalid project", e));

    let created = or_fail("Failed to create project", client.create_project(&project).await);
    println!("Created project #{} '{}'", created.id, created.name);
}

pub async fn cmd_tasks(client: &ApiClient, project: u64, view: TaskView) {
    let tasks = or_fail("Failed to fetch tasks", client.get_tasks(project).await);
    if tasks.is_empty() {
        println!("No tasks in project #{}.", project);
        return;
    }
    match view {
        TaskView::List => print_task_list(&tasks),
        TaskView::Table => print_task_table(&tasks),
        TaskView::Board => print_board(&tasks),
    }
}

pub async fn cmd_user_tasks(client: &ApiClient, user: u64, priority: Option<Priority>) {
    let mut tasks = or_fail("Failed to fetch tasks", client.get_tasks_by_user(user).await);
    if let Some(p) = priority {
        tasks.retain(|t| t.priority == Some(p));
    }
    if tasks.is_empty() {
        println!("No tasks for user #{}.", user);
        return;
    }
    print_task_table(&tasks);
}

/// Create a task. Author and assignee default to `fallback_user`.
#[allow(clippy::too_many_arguments)]
pub async fn cmd_task_add(
    client: &ApiClient,
    fallback_user: u64,
    title: String,
    project: u64,
    author: Option<u64>,
    assignee: Option<u64>,
    start: String,
    due: String,
    desc: Option<String>,
    tags: Option<String>,
    points: Option<u32>,
    status: Status,
    priority: Priority,
) {
    let mut form = TaskForm::new(Some(project));
    form.title = InputField::with_value(&title);
    form.description = InputField::with_value(desc.as_deref().unwrap_or(""));
    form.tags = InputField::with_value(tags.as_deref().unwrap_or(""));
    form.start_date = InputField::with_value(&start);
    form.due_date = InputField::with_value(&due);
    form.points = InputField::with_value(&points.map(|p| p.to_string()).unwrap_or_default());
    form.author = InputField::with_value(&author.unwrap_or(fallback_user).to_string());
    form.assignee = InputField::with_value(&assignee.unwrap_or(fallback_user).to_string());
    form.status = Status::ALL.iter().position(|s| *s == status).unwrap_or(0);
    form.priority = Priority::ALL.iter().position(|p| *p == priority).unwrap_or(0);
    let task = form.build().unwrap_or_else(|e| fail("Invalid task", e));

    let created = or_fail("Failed to create task", client.create_task(&task).await);
    println!("Created task #{} '{}' in project #{}", created.id, created.title, created.project_id);
}

pub async fn cmd_move(client: &ApiClient, task: u64, status: Status) {
    let updated = or_fail("Failed to update task", client.update_task_status(task, status).await);
    println!("Moved task #{} '{}' to {}", updated.id, updated.title, status);
}

fn print_search_results(results: &SearchResults) {
    let sections = results.sections();
    if sections.is_empty() {
        println!("No results.");
        return;
    }
    for section in sections {
        println!("{} ({})", section.title(), section.len());
        match section {
            Section::Tasks(tasks) => {
                for t in tasks {
                    println!("  #{:<5} {}", t.id, truncate(&t.title, 60));
                }
            }
            Section::Projects(projects) => {
                for p in projects {
                    println!("  #{:<5} {}", p.id, truncate(&p.name, 60));
                }
            }
            Section::Users(users) => {
                for u in users {
                    println!("  {} <{}>", u.username, u.email);
                }
            }
        }
    }
}

pub async fn cmd_search(client: &ApiClient, term: String) {
    if !is_searchable(&term) {
        fail("Search term too short", format!("'{}' has fewer than 3 characters", term.trim()));
    }
    let results = or_fail("Search failed", client.search(term.trim()).await);
    print_search_results(&results);
}

pub async fn cmd_users(client: &ApiClient) {
    let users = or_fail("Failed to fetch users", client.get_users().await);
    print_users(&users);
}

pub async fn cmd_teams(client: &ApiClient) {
    let teams = or_fail("Failed to fetch teams", client.get_teams().await);
    print_teams(&teams);
}

/// Text Gantt chart of all dated projects, one cell per unit.
pub async fn cmd_timeline(client: &ApiClient, mode: ViewMode) {
    let projects = or_fail("Failed to fetch projects", client.get_projects().await);
    let bars = project_bars(&projects);
    let Some((origin, _)) = date_range(&bars) else {
        println!("No projects with both a start and an end date.");
        return;
    };
    debug!(bars = bars.len(), %origin, "rendering timeline");
    println!("{} view from {}", mode.label(), origin.format("%m/%d/%Y"));
    for bar in &bars {
        let (offset, len) = bar_span(bar, origin, mode);
        println!(
            "{:<24} {}{}",
            truncate(&bar.name, 24),
            " ".repeat(offset.max(0) as usize),
            "#".repeat(len.max(1) as usize)
        );
    }
}

pub async fn cmd_settings(client: &ApiClient, config: &AppConfig) {
    println!("{:<16} {}", "API base URL", config.base_url);
    println!("{:<16} {}", "User id", config.user_id);
    println!("{:<16} {}", "Config file", config.config_path.display());
    println!("{:<16} {}", "Log file", config.log_file.display());
    println!("{:<16} {} ms", "Search debounce", config.search_debounce.as_millis());
    let users = or_fail("Failed to fetch users", client.get_users().await);
    match find_user(&users, config.user_id) {
        Some(u) => println!("{:<16} {} <{}>", "Current user", u.username, u.email),
        None => println!("{:<16} not found", "Current user"),
    }
}

/// Generate shell completion scripts for the specified shell.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Run one subcommand.
pub async fn dispatch(command: Commands, config: AppConfig) {
    if let Commands::Ui = command {
        return cmd_ui(config).await;
    }
    let client = ApiClient::http(&config.base_url, config.cache_keep_unused);
    match command {
        Commands::Ui => unreachable!("UI command handled above"),
        Commands::Projects => cmd_projects(&client).await,
        Commands::ProjectAdd { name, desc, start, end } => cmd_project_add(&client, name, desc, start, end).await,
        Commands::Tasks { project, view } => cmd_tasks(&client, project, view).await,
        Commands::UserTasks { priority } => cmd_user_tasks(&client, config.user_id, priority).await,
        Commands::TaskAdd {
            title, project, author, assignee, start, due, desc, tags, points, status, priority,
        } => {
            cmd_task_add(
                &client, config.user_id, title, project, author, assignee, start, due, desc, tags, points, status,
                priority,
            )
            .await
        }
        Commands::Move { task, status } => cmd_move(&client, task, status).await,
        Commands::Search { term } => cmd_search(&client, term).await,
        Commands::Users => cmd_users(&client).await,
        Commands::Teams => cmd_teams(&client).await,
        Commands::Timeline { mode } => cmd_timeline(&client, mode).await,
        Commands::Settings => cmd_settings(&client, &config).await,
        Commands::Completions { shell } => cmd_completions(shell),
    }
}
