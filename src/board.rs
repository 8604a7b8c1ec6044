//! Board view model.
//!
//! Tasks of one project are grouped into four fixed status columns. Moving a
//! card is modelled as an explicit drag/drop contract: a drag source yields
//! a `DragItem`, a `DropTarget` accepts one payload kind and turns a drop
//! into a `StatusChange`. Nothing here touches the network; the caller sends
//! the change through the client and the board is rebuilt from the refetched
//! list.

use crate::fields::{Priority, Status};
use crate::format::{format_date, NONE};
use crate::task::Task;

/// Columns in display order. Not derived from data: a task whose status is
/// unknown appears in none of them.
pub const BOARD_COLUMNS: [Status; 4] = Status::ALL;

/// The only payload kind a board column accepts.
pub const TASK_DRAG_KIND: &str = "task";

/// Payload of a drag: the task identity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragItem {
    pub kind: &'static str,
    pub id: u64,
}

impl DragItem {
    pub fn task(id: u64) -> Self {
        DragItem {
            kind: TASK_DRAG_KIND,
            id,
        }
    }
}

/// Status change requested by a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub task_id: u64,
    pub status: Status,
}

/// A board column as a drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub accepts: &'static str,
    pub status: Status,
}

impl DropTarget {
    pub fn column(status: Status) -> Self {
        DropTarget {
            accepts: TASK_DRAG_KIND,
            status,
        }
    }

    pub fn can_accept(&self, item: &DragItem) -> bool {
        item.kind == self.accepts
    }

    /// Handle a drop. Dropping onto the card's current column still yields a
    /// change.
    pub fn drop(&self, item: &DragItem) -> Option<StatusChange> {
        self.can_accept(item).then_some(StatusChange {
            task_id: item.id,
            status: self.status,
        })
    }
}

fn column_index(status: Status) -> usize {
    match status {
        Status::ToDo => 0,
        Status::WorkInProgress => 1,
        Status::UnderReview => 2,
        Status::Completed => 3,
    }
}

/// Tasks grouped by status column, preserving list order within a column.
#[derive(Debug, Default)]
pub struct Board<'a> {
    columns: [Vec<&'a Task>; 4],
}

impl<'a> Board<'a> {
    pub fn from_tasks(tasks: &'a [Task]) -> Self {
        let mut board = Board::default();
        for task in tasks {
            if let Some(status) = task.status {
                board.columns[column_index(status)].push(task);
            }
        }
        board
    }

    pub fn column(&self, status: Status) -> &[&'a Task] {
        &self.columns[column_index(status)]
    }

    pub fn count(&self, status: Status) -> usize {
        self.columns[column_index(status)].len()
    }
}

/// Keyboard drag interaction on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { item: DragItem, hover: Status },
}

impl DragState {
    /// Pick up a card. Cards without a known status cannot be on the board,
    /// so they cannot be grabbed either.
    pub fn grab(&mut self, task: &Task) -> bool {
        match task.status {
            Some(status) => {
                *self = DragState::Dragging {
                    item: DragItem::task(task.id),
                    hover: status,
                };
                true
            }
            None => false,
        }
    }

    /// Move the hovered column by `delta`, clamped to the board.
    pub fn hover_by(&mut self, delta: isize) {
        if let DragState::Dragging { hover, .. } = self {
            let idx = column_index(*hover) as isize + delta;
            let idx = idx.clamp(0, BOARD_COLUMNS.len() as isize - 1) as usize;
            *hover = BOARD_COLUMNS[idx];
        }
    }

    /// Release over the hovered column.
    pub fn drop(&mut self) -> Option<StatusChange> {
        let change = match *self {
            DragState::Dragging { item, hover } => DropTarget::column(hover).drop(&item),
            DragState::Idle => None,
        };
        *self = DragState::Idle;
        change
    }

    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }

    pub fn is_dragging(&self, task_id: u64) -> bool {
        matches!(self, DragState::Dragging { item, .. } if item.id == task_id)
    }

    pub fn is_hovering(&self, status: Status) -> bool {
        matches!(self, DragState::Dragging { hover, .. } if *hover == status)
    }

    pub fn active(&self) -> bool {
        !matches!(self, DragState::Idle)
    }
}

/// Split a comma-joined tag string into chips: trimmed, empties dropped,
/// duplicates removed keeping the first occurrence.
pub fn split_tags(tags: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Everything a card shows, derived from one task.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub id: u64,
    pub title: String,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    pub points: Option<i64>,
    /// `start - due`; either side left out when absent.
    pub dates: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub assignee: Option<String>,
    pub comments: usize,
    pub attachment: Option<String>,
}

impl CardView {
    pub fn from_task(task: &Task) -> Self {
        let start = format_date(task.start_date.as_deref());
        let due = format_date(task.due_date.as_deref());
        let dates = match (start, due) {
            (Some(s), Some(d)) => Some(format!("{} - {}", s, d)),
            (Some(s), None) => Some(format!("{} - {}", s, NONE)),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        };
        CardView {
            id: task.id,
            title: task.title.clone(),
            priority: task.priority,
            tags: task.tags.as_deref().map(split_tags).unwrap_or_default(),
            points: task.points,
            dates,
            description: task.description.clone().filter(|d| !d.is_empty()),
            author: task.author.as_ref().map(|u| u.username.clone()),
            assignee: task.assignee.as_ref().map(|u| u.username.clone()),
            comments: task.comment_count(),
            attachment: task
                .attachments
                .as_ref()
                .and_then(|a| a.first())
                .map(|a| a.file_name.clone().unwrap_or_else(|| a.file_url.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: u64, status: &str) -> Task {
        serde_json::from_value(json!({
            "id": id, "title": format!("t{}", id), "status": status, "projectId": 1
        }))
        .unwrap()
    }

    #[test]
    fn every_known_status_lands_in_exactly_one_column() {
        let tasks = vec![
            task(1, "To Do"),
            task(2, "Completed"),
            task(3, "To Do"),
            task(4, "Under Review"),
            task(5, "Work In Progress"),
            task(6, "Blocked"),
        ];
        let board = Board::from_tasks(&tasks);
        let total: usize = BOARD_COLUMNS.iter().map(|s| board.count(*s)).sum();
        assert_eq!(total, 5);
        for status in BOARD_COLUMNS {
            let expected = tasks.iter().filter(|t| t.status == Some(status)).count();
            assert_eq!(board.count(status), expected);
            assert_eq!(board.column(status).len(), expected);
        }
        let todo: Vec<u64> = board.column(Status::ToDo).iter().map(|t| t.id).collect();
        assert_eq!(todo, vec![1, 3]);
        // Unknown status is on no column.
        assert!(BOARD_COLUMNS
            .iter()
            .all(|s| board.column(*s).iter().all(|t| t.id != 6)));
    }

    #[test]
    fn drop_target_accepts_only_tasks() {
        let target = DropTarget::column(Status::Completed);
        assert_eq!(
            target.drop(&DragItem::task(9)),
            Some(StatusChange {
                task_id: 9,
                status: Status::Completed
            })
        );
        let other = DragItem { kind: "project", id: 9 };
        assert!(!target.can_accept(&other));
        assert_eq!(target.drop(&other), None);
    }

    #[test]
    fn keyboard_drag_moves_between_columns() {
        let card = task(42, "To Do");
        let mut drag = DragState::default();
        assert!(drag.grab(&card));
        assert!(drag.is_dragging(42));
        assert!(drag.is_hovering(Status::ToDo));

        drag.hover_by(-1);
        assert!(drag.is_hovering(Status::ToDo));
        drag.hover_by(2);
        assert!(drag.is_hovering(Status::UnderReview));
        drag.hover_by(5);
        assert!(drag.is_hovering(Status::Completed));
        drag.hover_by(-1);

        assert_eq!(
            drag.drop(),
            Some(StatusChange {
                task_id: 42,
                status: Status::UnderReview
            })
        );
        assert!(!drag.active());
        assert_eq!(drag.drop(), None);
    }

    #[test]
    fn same_column_drop_still_fires() {
        let mut drag = DragState::default();
        drag.grab(&task(7, "Completed"));
        assert_eq!(drag.drop().map(|c| c.status), Some(Status::Completed));
    }

    #[test]
    fn cancel_and_unknown_status() {
        let mut drag = DragState::default();
        assert!(!drag.grab(&task(1, "Blocked")));
        drag.grab(&task(2, "To Do"));
        drag.cancel();
        assert_eq!(drag.drop(), None);
    }

    #[test]
    fn tag_chips() {
        assert_eq!(split_tags("api, backend,,api , ui"), vec!["api", "backend", "ui"]);
        assert!(split_tags(" , ").is_empty());
    }

    #[test]
    fn card_view_derivation() {
        let task: Task = serde_json::from_value(json!({
            "id": 3,
            "title": "Card",
            "status": "To Do",
            "priority": "Urgent",
            "tags": "a,b",
            "startDate": "2024-01-01T00:00:00.000Z",
            "dueDate": "2024-01-10T00:00:00.000Z",
            "points": 5,
            "projectId": 1,
            "comments": [{"id": 1, "text": "x", "taskId": 3, "userId": 1}],
            "attachments": [{"id": 1, "fileURL": "https://x/y.png", "taskId": 3, "uploadedById": 1}]
        }))
        .unwrap();
        let card = CardView::from_task(&task);
        assert_eq!(card.tags, vec!["a", "b"]);
        assert_eq!(card.dates.as_deref(), Some("01/01/2024 - 01/10/2024"));
        assert_eq!(card.comments, 1);
        assert_eq!(card.attachment.as_deref(), Some("https://x/y.png"));
        assert_eq!(card.priority, Some(Priority::Urgent));

        let bare = CardView::from_task(&task_with_due_only());
        assert_eq!(bare.dates.as_deref(), Some("02/03/2024"));
        assert_eq!(bare.comments, 0);
        assert!(bare.tags.is_empty());
    }

    fn task_with_due_only() -> Task {
        serde_json::from_value(json!({
            "id": 4, "title": "t", "projectId": 1, "dueDate": "2024-02-03"
        }))
        .unwrap()
    }
}
