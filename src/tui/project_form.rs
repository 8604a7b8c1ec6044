//! New-project form.

use crate::error::ValidationError;
use crate::format::to_iso_timestamp;
use crate::project::NewProject;
use crate::tui::input::InputField;
use crate::tui::task_form::parse_form_date;

pub const NAME_GLOBAL_ORDER: usize = 0;
pub const DESCRIPTION_GLOBAL_ORDER: usize = 1;
pub const START_DATE_GLOBAL_ORDER: usize = 2;
pub const END_DATE_GLOBAL_ORDER: usize = 3;
const FIELD_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct ProjectForm {
    pub name: InputField,
    pub description: InputField,
    pub start_date: InputField,
    pub end_date: InputField,
    pub current_field: usize,
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectForm {
    pub fn new() -> Self {
        let mut form = Self {
            name: InputField::new(),
            description: InputField::new(),
            start_date: InputField::new(),
            end_date: InputField::new(),
            current_field: NAME_GLOBAL_ORDER,
        };
        form.name.active = true;
        form
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn field_mut(&mut self, order: usize) -> &mut InputField {
        match order {
            DESCRIPTION_GLOBAL_ORDER => &mut self.description,
            START_DATE_GLOBAL_ORDER => &mut self.start_date,
            END_DATE_GLOBAL_ORDER => &mut self.end_date,
            _ => &mut self.name,
        }
    }

    fn focus(&mut self, order: usize) {
        self.field_mut(self.current_field).active = false;
        self.current_field = order % FIELD_COUNT;
        self.field_mut(self.current_field).active = true;
    }

    pub fn next_field(&mut self) {
        self.focus(self.current_field + 1);
    }

    pub fn prev_field(&mut self) {
        self.focus(self.current_field + FIELD_COUNT - 1);
    }

    pub fn handle_char(&mut self, c: char) {
        self.field_mut(self.current_field).handle_char(c);
    }

    pub fn handle_backspace(&mut self) {
        self.field_mut(self.current_field).handle_backspace();
    }

    pub fn handle_left_right(&mut self, right: bool) {
        let field = self.field_mut(self.current_field);
        if right {
            field.move_cursor_right();
        } else {
            field.move_cursor_left();
        }
    }

    /// Name is required; dates are optional but must be `YYYY-MM-DD`.
    pub fn build(&self) -> Result<NewProject, ValidationError> {
        let name = self.name.text().ok_or(ValidationError::MissingField("project name"))?;
        let start_date = match self.start_date.text() {
            Some(raw) => Some(to_iso_timestamp(parse_form_date("start date", raw)?)),
            None => None,
        };
        let end_date = match self.end_date.text() {
            Some(raw) => Some(to_iso_timestamp(parse_form_date("end date", raw)?)),
            None => None,
        };
        Ok(NewProject {
            name: name.to_string(),
            description: self.description.text().map(str::to_string),
            start_date,
            end_date,
        })
    }

    pub fn can_submit(&self) -> bool {
        self.build().is_ok()
    }
}
