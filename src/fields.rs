//! Enumerations and field types shared by tasks, views and the CLI.
//!
//! Status and priority values travel over the wire as the human-readable
//! labels the backend stores ("To Do", "Work In Progress", ...), so each enum
//! carries explicit serde renames and a label lookup used for lenient parsing.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// Workflow status of a task. Board columns follow this declaration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Status {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "Work In Progress")]
    WorkInProgress,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "Completed")]
    Completed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::ToDo,
        Status::WorkInProgress,
        Status::UnderReview,
        Status::Completed,
    ];

    /// Wire label, also used for display.
    pub fn label(self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::WorkInProgress => "Work In Progress",
            Status::UnderReview => "Under Review",
            Status::Completed => "Completed",
        }
    }

    /// Look a status up by its wire label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown status '{}'", s))
    }
}

/// Task priority, most pressing first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
    Backlog,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Urgent,
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Backlog,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Backlog => "Backlog",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown priority '{}'", s))
    }
}

/// Deserialize an optional enum field, mapping unrecognised labels to `None`.
///
/// The backend is free to hold values this client does not know about; a
/// task with such a status must still load (it just lands in no board column).
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Granularity of a timeline (Gantt) view.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ViewMode {
    Day,
    Week,
    #[default]
    Month,
}

impl ViewMode {
    /// Column width in pixels used by the graphical Gantt renderer; the
    /// terminal renderer scales it down to cells.
    pub fn column_width(self) -> u16 {
        match self {
            ViewMode::Month => 150,
            ViewMode::Day | ViewMode::Week => 100,
        }
    }

    /// Next mode in Day > Week > Month order, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            ViewMode::Day => ViewMode::Week,
            ViewMode::Week => ViewMode::Month,
            ViewMode::Month => ViewMode::Day,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
        }
    }
}

/// Rendering of a project's task collection.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ProjectTab {
    #[default]
    Board,
    List,
    Timeline,
    Table,
}

impl ProjectTab {
    pub const ALL: [ProjectTab; 4] = [
        ProjectTab::Board,
        ProjectTab::List,
        ProjectTab::Timeline,
        ProjectTab::Table,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProjectTab::Board => "Board",
            ProjectTab::List => "List",
            ProjectTab::Timeline => "Timeline",
            ProjectTab::Table => "Table",
        }
    }
}
