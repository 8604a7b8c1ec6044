//! Display helpers shared by the TUI views and the CLI tables.

use chrono::{DateTime, NaiveDate, NaiveTime};

use crate::board::{Board, BOARD_COLUMNS};
use crate::fields::{Priority, Status};
use crate::project::Project;
use crate::task::Task;
use crate::user::{Team, User};

/// Placeholder for missing cells.
pub const NONE: &str = "-";
pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const UNASSIGNED: &str = "Unassigned";

/// Parse a backend date: a full RFC 3339 timestamp or a bare `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    // Timestamps without an offset, e.g. "2024-01-01T00:00:00".
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// `MM/DD/YYYY`, or `None` when the value is absent or unparseable.
pub fn format_date(raw: Option<&str>) -> Option<String> {
    raw.and_then(parse_date).map(|d| d.format("%m/%d/%Y").to_string())
}

/// Midnight UTC of `date` as a complete ISO-8601 timestamp.
pub fn to_iso_timestamp(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN).and_utc().to_rfc3339()
}

pub fn status_label(status: Option<Status>) -> &'static str {
    status.map_or(NONE, Status::label)
}

pub fn priority_label(priority: Option<Priority>) -> &'static str {
    priority.map_or(NONE, Priority::label)
}

pub fn author_name(task: &Task) -> &str {
    task.author.as_ref().map_or(UNKNOWN_AUTHOR, |u| u.username.as_str())
}

pub fn assignee_name(task: &Task) -> &str {
    task.assignee.as_ref().map_or(UNASSIGNED, |u| u.username.as_str())
}

/// Truncate a string to a maximum width, adding an ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Print tasks as an aligned table.
pub fn print_task_table(tasks: &[Task]) {
    println!(
        "{:<6} {:<28} {:<17} {:<8} {:<11} {:<11} {:<12} {:<12} {}",
        "ID", "Title", "Status", "Priority", "Start", "Due", "Author", "Assignee", "Tags"
    );
    for t in tasks {
        println!(
            "{:<6} {:<28} {:<17} {:<8} {:<11} {:<11} {:<12} {:<12} {}",
            t.id,
            truncate(&t.title, 28),
            status_label(t.status),
            priority_label(t.priority),
            format_date(t.start_date.as_deref()).unwrap_or_else(|| NONE.into()),
            format_date(t.due_date.as_deref()).unwrap_or_else(|| NONE.into()),
            truncate(author_name(t), 12),
            truncate(assignee_name(t), 12),
            t.tags.as_deref().unwrap_or("")
        );
    }
}

/// One block per task, card style.
pub fn print_task_list(tasks: &[Task]) {
    for t in tasks {
        println!("#{} {} [{}] ({})", t.id, t.title, status_label(t.status), priority_label(t.priority));
        if let Some(desc) = t.description.as_deref().filter(|d| !d.is_empty()) {
            println!("    {}", desc);
        }
        println!(
            "    author: {}  assignee: {}  comments: {}",
            author_name(t),
            assignee_name(t),
            t.comment_count()
        );
    }
}

/// Four status columns side by side, with counts in the headers.
pub fn print_board(tasks: &[Task]) {
    const WIDTH: usize = 24;
    let board = Board::from_tasks(tasks);
    let header: Vec<String> = BOARD_COLUMNS
        .iter()
        .map(|s| format!("{:<WIDTH$}", format!("{} ({})", s.label(), board.count(*s))))
        .collect();
    println!("{}", header.join(" "));
    let rows = BOARD_COLUMNS.iter().map(|s| board.count(*s)).max().unwrap_or(0);
    for row in 0..rows {
        let cells: Vec<String> = BOARD_COLUMNS
            .iter()
            .map(|s| {
                let cell = board
                    .column(*s)
                    .get(row)
                    .map(|t| truncate(&format!("#{} {}", t.id, t.title), WIDTH))
                    .unwrap_or_default();
                format!("{:<WIDTH$}", cell)
            })
            .collect();
        println!("{}", cells.join(" ").trim_end());
    }
}

pub fn print_projects(projects: &[Project]) {
    println!("{:<6} {:<28} {:<11} {:<11} {}", "ID", "Name", "Start", "End", "Description");
    for p in projects {
        println!(
            "{:<6} {:<28} {:<11} {:<11} {}",
            p.id,
            truncate(&p.name, 28),
            format_date(p.start_date.as_deref()).unwrap_or_else(|| NONE.into()),
            format_date(p.end_date.as_deref()).unwrap_or_else(|| NONE.into()),
            p.description.as_deref().unwrap_or("")
        );
    }
}

pub fn print_users(users: &[User]) {
    println!("{:<6} {:<16} {:<28} {}", "ID", "Username", "Email", "Team");
    for u in users {
        println!(
            "{:<6} {:<16} {:<28} {}",
            u.user_id.map_or_else(|| NONE.to_string(), |id| id.to_string()),
            truncate(&u.username, 16),
            truncate(&u.email, 28),
            u.team_id.map_or_else(|| NONE.to_string(), |id| id.to_string())
        );
    }
}

pub fn print_teams(teams: &[Team]) {
    println!("{:<8} {:<20} {:<16} {}", "Team ID", "Team Name", "Product Owner", "Project Manager");
    for t in teams {
        println!(
            "{:<8} {:<20} {:<16} {}",
            t.id,
            truncate(&t.team_name, 20),
            t.product_owner_username.as_deref().unwrap_or(NONE),
            t.project_manager_username.as_deref().unwrap_or(NONE)
        );
    }
}
