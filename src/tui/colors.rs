//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Priority, Status};

/// Board column header for To Do.
pub const TODO_BLUE: Color = Color::Rgb(0x25, 0x63, 0xEB);
/// Board column header for Work In Progress.
pub const PROGRESS_GREEN: Color = Color::Rgb(0x05, 0x96, 0x69);
/// Board column header for Under Review.
pub const REVIEW_AMBER: Color = Color::Rgb(0xD9, 0x77, 0x06);
/// Board column header for Completed.
pub const COMPLETED_BLACK: Color = Color::Rgb(0, 0, 0);

/// Focused field borders and highlights.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Error messages and the drop-column highlight.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);

pub fn status_color(status: Status) -> Color {
    match status {
        Status::ToDo => TODO_BLUE,
        Status::WorkInProgress => PROGRESS_GREEN,
        Status::UnderReview => REVIEW_AMBER,
        Status::Completed => COMPLETED_BLACK,
    }
}

/// Badge color of a priority.
pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Urgent => Color::Red,
        Priority::High => Color::Yellow,
        Priority::Medium => Color::Green,
        Priority::Low => Color::Blue,
        Priority::Backlog => Color::Gray,
    }
}
