//! Gantt timeline model.
//!
//! Projects and tasks with both dates become bars; items missing either
//! date are left off the chart. Geometry is expressed in whole units of the
//! current `ViewMode` from a common origin, so the renderer only scales.

use chrono::{Datelike, NaiveDate};

use crate::fields::ViewMode;
use crate::format::parse_date;
use crate::project::Project;
use crate::task::Task;

/// Progress shown on every project bar.
pub const PROJECT_PROGRESS: u8 = 50;

/// Pixels of the graphical chart per terminal cell.
const PIXELS_PER_CELL: u16 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    Project,
    Task,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineBar {
    /// `Project-<id>` or `Task-<id>`.
    pub id: String,
    pub name: String,
    pub kind: BarKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Percent, 0..=100.
    pub progress: u8,
}

fn dates(start: Option<&str>, end: Option<&str>) -> Option<(NaiveDate, NaiveDate)> {
    let start = parse_date(start?)?;
    let end = parse_date(end?)?;
    Some(if end < start { (end, start) } else { (start, end) })
}

pub fn project_bars(projects: &[Project]) -> Vec<TimelineBar> {
    projects
        .iter()
        .filter_map(|p| {
            let (start, end) = dates(p.start_date.as_deref(), p.end_date.as_deref())?;
            Some(TimelineBar {
                id: format!("Project-{}", p.id),
                name: p.name.clone(),
                kind: BarKind::Project,
                start,
                end,
                progress: PROJECT_PROGRESS,
            })
        })
        .collect()
}

/// Story points as progress: a tenth of a point per percent, capped at 100.
pub fn task_progress(points: Option<i64>) -> u8 {
    points.map_or(0, |p| (p.saturating_mul(10)).clamp(0, 100) as u8)
}

pub fn task_bars(tasks: &[Task]) -> Vec<TimelineBar> {
    tasks
        .iter()
        .filter_map(|t| {
            let (start, end) = dates(t.start_date.as_deref(), t.due_date.as_deref())?;
            Some(TimelineBar {
                id: format!("Task-{}", t.id),
                name: t.title.clone(),
                kind: BarKind::Task,
                start,
                end,
                progress: task_progress(t.points),
            })
        })
        .collect()
}

/// Earliest start and latest end over all bars.
pub fn date_range(bars: &[TimelineBar]) -> Option<(NaiveDate, NaiveDate)> {
    let start = bars.iter().map(|b| b.start).min()?;
    let end = bars.iter().map(|b| b.end).max()?;
    Some((start, end))
}

/// Whole units of `mode` from `origin` to `date`.
pub fn units_between(mode: ViewMode, origin: NaiveDate, date: NaiveDate) -> i64 {
    match mode {
        ViewMode::Day => (date - origin).num_days(),
        ViewMode::Week => (date - origin).num_days().div_euclid(7),
        ViewMode::Month => {
            let months = |d: NaiveDate| d.year() as i64 * 12 + d.month0() as i64;
            months(date) - months(origin)
        }
    }
}

/// Offset and length of a bar in units; a bar always covers at least one.
pub fn bar_span(bar: &TimelineBar, origin: NaiveDate, mode: ViewMode) -> (i64, i64) {
    let offset = units_between(mode, origin, bar.start);
    let end = units_between(mode, origin, bar.end);
    (offset, (end - offset + 1).max(1))
}

/// Terminal cells per unit, scaled from the chart's column width.
pub fn cells_per_unit(mode: ViewMode) -> u16 {
    (mode.column_width() / PIXELS_PER_CELL).max(1)
}

/// Header label of the unit `index` units after `origin`.
pub fn unit_label(mode: ViewMode, origin: NaiveDate, index: i64) -> String {
    match mode {
        ViewMode::Day => (origin + chrono::Duration::days(index)).format("%d").to_string(),
        ViewMode::Week => (origin + chrono::Duration::weeks(index)).format("W%V").to_string(),
        ViewMode::Month => {
            let total = origin.year() as i64 * 12 + origin.month0() as i64 + index;
            NaiveDate::from_ymd_opt(total.div_euclid(12) as i32, total.rem_euclid(12) as u32 + 1, 1)
                .map(|d| d.format("%b %y").to_string())
                .unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn project_bars_skip_undated() {
        let projects: Vec<Project> = serde_json::from_value(json!([
            {"id": 1, "name": "A", "startDate": "2024-01-01T00:00:00Z", "endDate": "2024-02-15T00:00:00Z"},
            {"id": 2, "name": "B", "startDate": "2024-01-01T00:00:00Z"},
            {"id": 3, "name": "C"}
        ]))
        .unwrap();
        let bars = project_bars(&projects);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].id, "Project-1");
        assert_eq!(bars[0].progress, 50);
        assert_eq!(bars[0].kind, BarKind::Project);
        assert_eq!((bars[0].start, bars[0].end), (d(2024, 1, 1), d(2024, 2, 15)));
    }

    #[test]
    fn task_progress_from_points() {
        assert_eq!(task_progress(None), 0);
        assert_eq!(task_progress(Some(3)), 30);
        assert_eq!(task_progress(Some(10)), 100);
        assert_eq!(task_progress(Some(25)), 100);
        assert_eq!(task_progress(Some(-2)), 0);

        let tasks: Vec<Task> = serde_json::from_value(json!([
            {"id": 9, "title": "T", "projectId": 1, "points": 4,
             "startDate": "2024-03-01", "dueDate": "2024-03-05"}
        ]))
        .unwrap();
        let bars = task_bars(&tasks);
        assert_eq!(bars[0].id, "Task-9");
        assert_eq!(bars[0].progress, 40);
    }

    #[test]
    fn spans_per_mode() {
        let bar = TimelineBar {
            id: "Task-1".into(),
            name: "x".into(),
            kind: BarKind::Task,
            start: d(2024, 1, 10),
            end: d(2024, 3, 2),
            progress: 0,
        };
        let origin = d(2024, 1, 1);
        assert_eq!(bar_span(&bar, origin, ViewMode::Day), (9, 53));
        assert_eq!(bar_span(&bar, origin, ViewMode::Week), (1, 8));
        assert_eq!(bar_span(&bar, origin, ViewMode::Month), (0, 3));
        assert_eq!(date_range(std::slice::from_ref(&bar)), Some((bar.start, bar.end)));
        assert_eq!(date_range(&[]), None);
    }

    #[test]
    fn cell_widths_follow_column_width() {
        assert_eq!(cells_per_unit(ViewMode::Month), 6);
        assert_eq!(cells_per_unit(ViewMode::Day), 4);
        assert_eq!(unit_label(ViewMode::Month, d(2024, 11, 1), 2), "Jan 25");
    }
}
