//! Enumerations for TUI state management.

use crate::fields::Priority;

/// Modal state layered over the current page.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    Browse,
    AddTask,
    AddProject,
    Help,
}

/// Whether keystrokes go to a text input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputMode {
    None,
    Text,
}

/// List or table rendering of a task collection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ListLayout {
    #[default]
    List,
    Table,
}

impl ListLayout {
    pub fn toggle(self) -> Self {
        match self {
            ListLayout::List => ListLayout::Table,
            ListLayout::Table => ListLayout::List,
        }
    }
}

/// A routed page.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Page {
    Projects,
    /// One project's tasks.
    Project(u64),
    Timeline,
    Search,
    Users,
    Teams,
    /// The current user's tasks of one priority.
    Priority(Priority),
    Settings,
}

impl Page {
    /// Sidebar entries in display order.
    pub const SIDEBAR: [Page; 11] = [
        Page::Projects,
        Page::Timeline,
        Page::Search,
        Page::Users,
        Page::Teams,
        Page::Priority(Priority::Urgent),
        Page::Priority(Priority::High),
        Page::Priority(Priority::Medium),
        Page::Priority(Priority::Low),
        Page::Priority(Priority::Backlog),
        Page::Settings,
    ];

    pub fn title(&self) -> String {
        match self {
            Page::Projects => "Projects".into(),
            Page::Project(id) => format!("Project #{}", id),
            Page::Timeline => "Timeline".into(),
            Page::Search => "Search".into(),
            Page::Users => "Users".into(),
            Page::Teams => "Teams".into(),
            Page::Priority(p) => format!("Priority: {}", p.label()),
            Page::Settings => "Settings".into(),
        }
    }

    /// Position in the sidebar; project pages count as Projects.
    pub fn sidebar_index(&self) -> usize {
        let page = match self {
            Page::Project(_) => Page::Projects,
            other => *other,
        };
        Self::SIDEBAR.iter().position(|p| *p == page).unwrap_or(0)
    }

    /// Neighbouring sidebar page, wrapping around.
    pub fn cycle(&self, forward: bool) -> Page {
        let n = Self::SIDEBAR.len();
        let idx = self.sidebar_index();
        let next = if forward { (idx + 1) % n } else { (idx + n - 1) % n };
        Self::SIDEBAR[next]
    }
}
