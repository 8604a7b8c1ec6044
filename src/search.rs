//! Free-text search: result sections and input debouncing.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::api::endpoints::MIN_SEARCH_LEN;
use crate::project::Project;
use crate::task::Task;
use crate::user::User;

/// Aggregate answer of the search endpoint. Any section may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
    #[serde(default)]
    pub projects: Option<Vec<Project>>,
    #[serde(default)]
    pub users: Option<Vec<User>>,
}

/// One non-empty group of results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section<'a> {
    Tasks(&'a [Task]),
    Projects(&'a [Project]),
    Users(&'a [User]),
}

impl Section<'_> {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Tasks(_) => "Tasks",
            Section::Projects(_) => "Projects",
            Section::Users(_) => "Users",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Section::Tasks(v) => v.len(),
            Section::Projects(v) => v.len(),
            Section::Users(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SearchResults {
    /// Tasks, then projects, then users; empty or missing sections left out.
    pub fn sections(&self) -> Vec<Section<'_>> {
        let mut out = Vec::new();
        if let Some(tasks) = self.tasks.as_deref().filter(|t| !t.is_empty()) {
            out.push(Section::Tasks(tasks));
        }
        if let Some(projects) = self.projects.as_deref().filter(|p| !p.is_empty()) {
            out.push(Section::Projects(projects));
        }
        if let Some(users) = self.users.as_deref().filter(|u| !u.is_empty()) {
            out.push(Section::Users(users));
        }
        out
    }
}

/// Whether a term is long enough to be sent.
pub fn is_searchable(term: &str) -> bool {
    term.trim().chars().count() >= MIN_SEARCH_LEN
}

/// What a settled input asks the search page to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTrigger {
    /// Search for this trimmed term.
    Fire(String),
    /// The input settled below the minimum length; drop current results.
    Clear,
}

/// Delays a search until input has been quiet for `interval`.
///
/// Time is passed in by the caller so the UI tick drives it and tests can
/// step it explicitly.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Debouncer {
            interval,
            pending: None,
        }
    }

    /// Record the current input; restarts the quiet period.
    pub fn input(&mut self, term: &str, now: Instant) {
        self.pending = Some((term.to_string(), now + self.interval));
    }

    /// When the pending term becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Reports the settled input once its quiet period has passed.
    /// Terms shorter than the minimum settle as `Clear`, never `Fire`.
    pub fn poll(&mut self, now: Instant) -> Option<SearchTrigger> {
        match &self.pending {
            Some((_, at)) if *at <= now => {}
            _ => return None,
        }
        let (term, _) = self.pending.take()?;
        if is_searchable(&term) {
            Some(SearchTrigger::Fire(term.trim().to_string()))
        } else {
            Some(SearchTrigger::Clear)
        }
    }
}
