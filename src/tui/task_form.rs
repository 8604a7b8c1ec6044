//! New-task form for the terminal user interface.
//!
//! Holds the field state of the task modal and turns it into a `NewTask`.
//! Submission is allowed only when `build` succeeds, so the view just greys
//! out the submit hint instead of reporting per-field errors.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::fields::{Priority, Status};
use crate::format::to_iso_timestamp;
use crate::task::NewTask;
use crate::tui::input::InputField;

/// Global order constants for the form fields.
pub const TITLE_GLOBAL_ORDER: usize = 0;
pub const DESCRIPTION_GLOBAL_ORDER: usize = 1;
pub const STATUS_GLOBAL_ORDER: usize = 2;
pub const PRIORITY_GLOBAL_ORDER: usize = 3;
pub const TAGS_GLOBAL_ORDER: usize = 4;
pub const START_DATE_GLOBAL_ORDER: usize = 5;
pub const DUE_DATE_GLOBAL_ORDER: usize = 6;
pub const POINTS_GLOBAL_ORDER: usize = 7;
pub const AUTHOR_GLOBAL_ORDER: usize = 8;
pub const ASSIGNEE_GLOBAL_ORDER: usize = 9;
/// Only present when no project comes from the surrounding page.
pub const PROJECT_GLOBAL_ORDER: usize = 10;

const DEFAULT_PRIORITY_INDEX: usize = 4;

/// Parse a `YYYY-MM-DD` date field.
pub fn parse_form_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

fn parse_id(field: &'static str, input: &InputField) -> Result<u64, ValidationError> {
    let raw = input.text().ok_or(ValidationError::MissingField(field))?;
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Task form state.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub tags: InputField,
    pub start_date: InputField,
    pub due_date: InputField,
    pub points: InputField,
    pub author: InputField,
    pub assignee: InputField,
    /// Manual project id, used only without `context_project`.
    pub project_id: InputField,
    pub status: usize,
    pub priority: usize,
    pub current_field: usize,
    /// Project id supplied by the page the modal was opened from.
    pub context_project: Option<u64>,
}

impl TaskForm {
    pub fn new(context_project: Option<u64>) -> Self {
        let mut form = Self {
            title: InputField::new(),
            description: InputField::new(),
            tags: InputField::new(),
            start_date: InputField::new(),
            due_date: InputField::new(),
            points: InputField::new(),
            author: InputField::new(),
            assignee: InputField::new(),
            project_id: InputField::new(),
            status: 0,
            priority: DEFAULT_PRIORITY_INDEX,
            current_field: TITLE_GLOBAL_ORDER,
            context_project,
        };
        form.update_active_field();
        form
    }

    /// Clear every field, keeping the project context.
    pub fn reset(&mut self) {
        *self = Self::new(self.context_project);
    }

    pub fn selected_status(&self) -> Status {
        Status::ALL[self.status % Status::ALL.len()]
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.priority % Priority::ALL.len()]
    }

    /// Whether the manual project id field is shown.
    pub fn shows_project_field(&self) -> bool {
        self.context_project.is_none()
    }

    /// Number of navigable fields.
    pub fn field_count(&self) -> usize {
        if self.shows_project_field() {
            PROJECT_GLOBAL_ORDER + 1
        } else {
            PROJECT_GLOBAL_ORDER
        }
    }

    fn field_mut(&mut self, order: usize) -> Option<&mut InputField> {
        match order {
            TITLE_GLOBAL_ORDER => Some(&mut self.title),
            DESCRIPTION_GLOBAL_ORDER => Some(&mut self.description),
            TAGS_GLOBAL_ORDER => Some(&mut self.tags),
            START_DATE_GLOBAL_ORDER => Some(&mut self.start_date),
            DUE_DATE_GLOBAL_ORDER => Some(&mut self.due_date),
            POINTS_GLOBAL_ORDER => Some(&mut self.points),
            AUTHOR_GLOBAL_ORDER => Some(&mut self.author),
            ASSIGNEE_GLOBAL_ORDER => Some(&mut self.assignee),
            PROJECT_GLOBAL_ORDER => Some(&mut self.project_id),
            _ => None,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + self.field_count() - 1) % self.field_count();
        self.update_active_field();
    }

    /// Mark only the current text field as active.
    pub fn update_active_field(&mut self) {
        for order in 0..=PROJECT_GLOBAL_ORDER {
            if let Some(field) = self.field_mut(order) {
                field.active = false;
            }
        }
        let current = self.current_field;
        if let Some(field) = self.field_mut(current) {
            field.active = true;
        }
    }

    pub fn handle_char(&mut self, c: char) {
        let current = self.current_field;
        if let Some(field) = self.field_mut(current) {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        let current = self.current_field;
        if let Some(field) = self.field_mut(current) {
            field.handle_backspace();
        }
    }

    /// Left/right move the cursor in text fields and cycle selectors.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            STATUS_GLOBAL_ORDER => {
                let n = Status::ALL.len();
                self.status = if right { (self.status + 1) % n } else { (self.status + n - 1) % n };
            }
            PRIORITY_GLOBAL_ORDER => {
                let n = Priority::ALL.len();
                self.priority = if right { (self.priority + 1) % n } else { (self.priority + n - 1) % n };
            }
            current => {
                if let Some(field) = self.field_mut(current) {
                    if right {
                        field.move_cursor_right();
                    } else {
                        field.move_cursor_left();
                    }
                }
            }
        }
    }

    /// Exactly one of the context id and the manual id must be present.
    fn resolve_project(&self) -> Result<u64, ValidationError> {
        match (self.context_project, self.project_id.text()) {
            (Some(_), Some(_)) => Err(ValidationError::AmbiguousProject),
            (Some(id), None) if id > 0 => Ok(id),
            (Some(id), None) => Err(ValidationError::InvalidNumber {
                field: "project id",
                value: id.to_string(),
            }),
            (None, _) => parse_id("project id", &self.project_id),
        }
    }

    /// Validate and build the payload. Dates become midnight-UTC timestamps
    /// here, not while typing.
    pub fn build(&self) -> Result<NewTask, ValidationError> {
        let title = self.title.text().ok_or(ValidationError::MissingField("title"))?;
        let author = parse_id("author user id", &self.author)?;
        let assignee = parse_id("assigned user id", &self.assignee)?;
        let start = self
            .start_date
            .text()
            .ok_or(ValidationError::MissingField("start date"))?;
        let start = parse_form_date("start date", start)?;
        let due = self.due_date.text().ok_or(ValidationError::MissingField("due date"))?;
        let due = parse_form_date("due date", due)?;
        let points = match self.points.text() {
            Some(raw) => Some(raw.parse::<i64>().ok().filter(|p| *p >= 0).ok_or_else(|| {
                ValidationError::InvalidNumber {
                    field: "points",
                    value: raw.to_string(),
                }
            })?),
            None => None,
        };
        let project_id = self.resolve_project()?;

        Ok(NewTask {
            title: title.to_string(),
            description: self.description.text().map(str::to_string),
            status: Some(self.selected_status()),
            priority: Some(self.selected_priority()),
            tags: self.tags.text().map(str::to_string),
            start_date: Some(to_iso_timestamp(start)),
            due_date: Some(to_iso_timestamp(due)),
            points,
            project_id,
            author_user_id: Some(author),
            assigned_user_id: Some(assignee),
        })
    }

    pub fn can_submit(&self) -> bool {
        self.build().is_ok()
    }
}
