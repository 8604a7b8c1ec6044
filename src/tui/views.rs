//! Page and view renderers.
//!
//! Pure functions from already-decoded data to widgets. The app decides
//! which one to call and owns all selection and drag state.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::board::{Board, CardView, DragState, BOARD_COLUMNS};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::fields::{ProjectTab, Status, ViewMode};
use crate::format::{assignee_name, author_name, format_date, priority_label, status_label, truncate, NONE};
use crate::project::Project;
use crate::search::{SearchResults, Section};
use crate::task::Task;
use crate::timeline::{bar_span, cells_per_unit, date_range, unit_label, TimelineBar};
use crate::tui::colors::{priority_color, status_color, DARK_RED, GOLD};
use crate::tui::enums::Page;
use crate::tui::input::InputField;
use crate::tui::project_form::{
    ProjectForm, DESCRIPTION_GLOBAL_ORDER as PROJECT_DESCRIPTION, END_DATE_GLOBAL_ORDER, NAME_GLOBAL_ORDER,
    START_DATE_GLOBAL_ORDER as PROJECT_START,
};
use crate::tui::task_form::{
    TaskForm, ASSIGNEE_GLOBAL_ORDER, AUTHOR_GLOBAL_ORDER, DESCRIPTION_GLOBAL_ORDER, DUE_DATE_GLOBAL_ORDER,
    POINTS_GLOBAL_ORDER, PRIORITY_GLOBAL_ORDER, PROJECT_GLOBAL_ORDER, START_DATE_GLOBAL_ORDER,
    STATUS_GLOBAL_ORDER, TAGS_GLOBAL_ORDER, TITLE_GLOBAL_ORDER,
};
use crate::user::{Team, User};

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn highlight() -> Style {
    Style::default().bg(Color::Gray).fg(Color::Black)
}

fn table_state(selected: usize, len: usize) -> TableState {
    TableState::default().with_selected((len > 0).then_some(selected.min(len.saturating_sub(1))))
}

pub fn render_loading(f: &mut Frame, area: Rect, title: &str) {
    let p = Paragraph::new("Loading...").block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(p, area);
}

/// Inline error replacing the content area.
pub fn render_error(f: &mut Frame, area: Rect, title: &str, err: &ApiError) {
    let text = vec![
        Line::from(Span::styled("An error occurred while fetching data", bold().fg(Color::Red))),
        Line::from(""),
        Line::from(err.to_string()),
    ];
    let p = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

pub fn render_sidebar(f: &mut Frame, area: Rect, current: Page) {
    let items: Vec<ListItem> = Page::SIDEBAR.iter().map(|p| ListItem::new(p.title())).collect();
    let mut state = ListState::default().with_selected(Some(current.sidebar_index()));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("PB"))
        .highlight_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state);
}

/// Header with the page title and, on project pages, the tab strip.
pub fn render_header(f: &mut Frame, area: Rect, title: &str, tab: Option<ProjectTab>) {
    let mut spans = vec![Span::styled(title.to_string(), bold())];
    if let Some(active) = tab {
        spans.push(Span::raw("   "));
        for (i, t) in ProjectTab::ALL.iter().enumerate() {
            let style = if *t == active {
                Style::default().fg(GOLD).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!("{} {}", i + 1, t.label()), style));
            spans.push(Span::raw("  "));
        }
    }
    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(header, area);
}

pub fn render_projects(f: &mut Frame, area: Rect, projects: &[Project], selected: usize) {
    let header = Row::new(["ID", "Name", "Start", "End", "Description"].map(|h| Cell::from(h).style(bold())));
    let rows: Vec<Row> = projects
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(p.id.to_string()),
                Cell::from(p.name.clone()),
                Cell::from(format_date(p.start_date.as_deref()).unwrap_or_else(|| NONE.into())),
                Cell::from(format_date(p.end_date.as_deref()).unwrap_or_else(|| NONE.into())),
                Cell::from(p.description.clone().unwrap_or_default()),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(5),
        Constraint::Length(24),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Projects ({}) - Enter to open, n new project",
            projects.len()
        )))
        .row_highlight_style(highlight())
        .highlight_symbol(">> ");
    f.render_stateful_widget(table, area, &mut table_state(selected, projects.len()));
}

fn card_lines(card: &CardView, dimmed: bool) -> Vec<Line<'static>> {
    let base = if dimmed {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };
    let mut head = Vec::new();
    if let Some(p) = card.priority {
        head.push(Span::styled(format!("[{}] ", p.label()), base.fg(priority_color(p))));
    }
    for tag in &card.tags {
        head.push(Span::styled(format!("#{} ", tag), base.fg(Color::Cyan)));
    }
    if let Some(points) = card.points {
        head.push(Span::styled(format!("{} pts", points), base));
    }

    let mut lines = vec![Line::from(Span::styled(format!("#{} {}", card.id, card.title), base.add_modifier(Modifier::BOLD)))];
    if !head.is_empty() {
        lines.push(Line::from(head));
    }
    if let Some(dates) = &card.dates {
        lines.push(Line::from(Span::styled(dates.clone(), base)));
    }
    if let Some(desc) = &card.description {
        lines.push(Line::from(Span::styled(truncate(desc, 40), base.fg(Color::Gray))));
    }
    let mut people = format!(
        "{} -> {}  comments: {}",
        card.author.as_deref().unwrap_or("?"),
        card.assignee.as_deref().unwrap_or("?"),
        card.comments
    );
    if let Some(file) = &card.attachment {
        people.push_str(&format!("  file: {}", truncate(file, 20)));
    }
    lines.push(Line::from(Span::styled(people, base)));
    lines
}

/// Four status columns with counts. The hovered drop column is outlined and
/// the dragged card dimmed.
pub fn render_board(f: &mut Frame, area: Rect, tasks: &[Task], focus: (usize, usize), drag: &DragState) {
    let board = Board::from_tasks(tasks);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (idx, status) in BOARD_COLUMNS.iter().enumerate() {
        let hovering = drag.is_hovering(*status);
        let border = if hovering {
            Style::default().fg(GOLD).bg(DARK_RED).add_modifier(Modifier::BOLD)
        } else if focus.0 == idx {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        };
        let title = Line::from(vec![
            Span::styled(" ", Style::default().bg(status_color(*status))),
            Span::raw(format!(" {} ({}) ", status.label(), board.count(*status))),
        ]);
        let items: Vec<ListItem> = board
            .column(*status)
            .iter()
            .map(|task| {
                let card = CardView::from_task(task);
                let mut lines = card_lines(&card, drag.is_dragging(task.id));
                lines.push(Line::from(""));
                ListItem::new(lines)
            })
            .collect();
        let mut state = ListState::default();
        if focus.0 == idx && board.count(*status) > 0 {
            state.select(Some(focus.1.min(board.count(*status) - 1)));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).border_style(border).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        f.render_stateful_widget(list, columns[idx], &mut state);
    }
}

/// Card-list rendering of tasks.
pub fn render_task_list(f: &mut Frame, area: Rect, title: &str, tasks: &[Task], selected: usize) {
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| {
            let card = CardView::from_task(task);
            let mut lines = card_lines(&card, false);
            lines.insert(1, Line::from(Span::styled(status_label(task.status), Style::default().fg(Color::Gray))));
            lines.push(Line::from(""));
            ListItem::new(lines)
        })
        .collect();
    let mut state = ListState::default().with_selected((!tasks.is_empty()).then_some(selected.min(tasks.len().saturating_sub(1))));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!("{} ({}) - a add task", title, tasks.len())))
        .highlight_style(highlight());
    f.render_stateful_widget(list, area, &mut state);
}

/// Tabular rendering of tasks.
pub fn render_task_table(f: &mut Frame, area: Rect, title: &str, tasks: &[Task], selected: usize) {
    let header = Row::new(
        [
            "Title", "Description", "Status", "Priority", "Tags", "Start Date", "Due Date", "Author", "Assignee",
        ]
        .map(|h| Cell::from(h).style(bold())),
    );
    let rows: Vec<Row> = tasks
        .iter()
        .map(|t| {
            let status_style = t
                .status
                .map(|s| Style::default().fg(Color::White).bg(status_color(s)))
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(t.title.clone()),
                Cell::from(t.description.clone().unwrap_or_default()),
                Cell::from(status_label(t.status)).style(status_style),
                Cell::from(priority_label(t.priority)),
                Cell::from(t.tags.clone().unwrap_or_default()),
                Cell::from(format_date(t.start_date.as_deref()).unwrap_or_default()),
                Cell::from(format_date(t.due_date.as_deref()).unwrap_or_default()),
                Cell::from(author_name(t).to_string()),
                Cell::from(assignee_name(t).to_string()),
            ])
        })
        .collect();
    let widths = [
        Constraint::Min(16),
        Constraint::Min(16),
        Constraint::Length(17),
        Constraint::Length(8),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!("{} ({}) - a add task", title, tasks.len())))
        .row_highlight_style(highlight())
        .highlight_symbol(">> ");
    f.render_stateful_widget(table, area, &mut table_state(selected, tasks.len()));
}

/// Gantt chart: one row per bar, `mode` units across.
pub fn render_timeline(f: &mut Frame, area: Rect, title: &str, bars: &[TimelineBar], mode: ViewMode, selected: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} - {} view (m to change)", title, mode.label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some((origin, _)) = date_range(bars) else {
        f.render_widget(Paragraph::new("Nothing with both a start and an end date."), inner);
        return;
    };

    const NAME_WIDTH: usize = 22;
    let cell = cells_per_unit(mode) as usize;
    let units = (inner.width as usize).saturating_sub(NAME_WIDTH) / cell.max(1);

    let mut lines = Vec::with_capacity(bars.len() + 1);
    let mut header = format!("{:<w$}", "", w = NAME_WIDTH);
    for i in 0..units {
        header.push_str(&format!("{:<cell$}", truncate(&unit_label(mode, origin, i as i64), cell)));
    }
    lines.push(Line::from(Span::styled(header, bold())));

    for (i, bar) in bars.iter().enumerate() {
        let (offset, len) = bar_span(bar, origin, mode);
        let offset = offset.max(0) as usize;
        let len = len.max(1) as usize;
        let filled = (len * cell * bar.progress as usize) / 100;
        let name_style = if i == selected { highlight() } else { Style::default() };
        let mut spans = vec![Span::styled(format!("{:<w$}", truncate(&bar.name, NAME_WIDTH - 1), w = NAME_WIDTH), name_style)];
        if offset < units {
            let visible = (len * cell).min((units - offset) * cell);
            spans.push(Span::raw(" ".repeat(offset * cell)));
            spans.push(Span::styled("█".repeat(filled.min(visible)), Style::default().fg(Color::Cyan)));
            spans.push(Span::styled("░".repeat(visible.saturating_sub(filled)), Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::from(spans));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

pub fn render_users(f: &mut Frame, area: Rect, users: &[User], selected: usize) {
    let header = Row::new(["ID", "Username", "Email", "Team", "Picture"].map(|h| Cell::from(h).style(bold())));
    let rows: Vec<Row> = users
        .iter()
        .map(|u| {
            Row::new(vec![
                Cell::from(u.user_id.map(|id| id.to_string()).unwrap_or_else(|| NONE.into())),
                Cell::from(u.username.clone()),
                Cell::from(u.email.clone()),
                Cell::from(u.team_id.map(|id| id.to_string()).unwrap_or_else(|| NONE.into())),
                Cell::from(u.profile_picture_url.clone().unwrap_or_default()),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(6),
        Constraint::Length(16),
        Constraint::Length(28),
        Constraint::Length(6),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!("Users ({})", users.len())))
        .row_highlight_style(highlight());
    f.render_stateful_widget(table, area, &mut table_state(selected, users.len()));
}

pub fn render_teams(f: &mut Frame, area: Rect, teams: &[Team], selected: usize) {
    let header = Row::new(["Team ID", "Team Name", "Product Owner", "Project Manager"].map(|h| Cell::from(h).style(bold())));
    let rows: Vec<Row> = teams
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(t.id.to_string()),
                Cell::from(t.team_name.clone()),
                Cell::from(t.product_owner_username.clone().unwrap_or_else(|| NONE.into())),
                Cell::from(t.project_manager_username.clone().unwrap_or_else(|| NONE.into())),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(18),
        Constraint::Length(18),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!("Teams ({})", teams.len())))
        .row_highlight_style(highlight());
    f.render_stateful_widget(table, area, &mut table_state(selected, teams.len()));
}

pub fn render_search_input(f: &mut Frame, area: Rect, input: &InputField) {
    let p = Paragraph::new(input.display()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search (at least 3 characters)")
            .border_style(Style::default().fg(GOLD)),
    );
    f.render_widget(p, area);
}

/// Result sections in fixed order; empty sections are not drawn at all.
pub fn render_search_results(f: &mut Frame, area: Rect, results: &SearchResults) {
    let mut lines = Vec::new();
    for section in results.sections() {
        lines.push(Line::from(Span::styled(format!("{} ({})", section.title(), section.len()), bold().fg(GOLD))));
        match section {
            Section::Tasks(tasks) => {
                for t in tasks {
                    lines.push(Line::from(format!(
                        "  #{} {} [{}] project #{}",
                        t.id,
                        t.title,
                        status_label(t.status),
                        t.project_id
                    )));
                }
            }
            Section::Projects(projects) => {
                for p in projects {
                    lines.push(Line::from(format!("  #{} {}", p.id, p.name)));
                }
            }
            Section::Users(users) => {
                for u in users {
                    lines.push(Line::from(format!("  {} <{}>", u.username, u.email)));
                }
            }
        }
        lines.push(Line::from(""));
    }
    if lines.is_empty() {
        lines.push(Line::from("No results."));
    }
    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Results"))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

pub fn render_settings(f: &mut Frame, area: Rect, config: &AppConfig, user: Option<&User>) {
    let row = |label: &str, value: String| {
        Line::from(vec![Span::styled(format!("{:<16}", label), bold()), Span::raw(value)])
    };
    let mut lines = vec![
        row("API base URL", config.base_url.clone()),
        row("User id", config.user_id.to_string()),
        row("Config file", config.config_path.display().to_string()),
        row("Log file", config.log_file.display().to_string()),
        row("Search debounce", format!("{} ms", config.search_debounce.as_millis())),
        Line::from(""),
    ];
    match user {
        Some(u) => {
            lines.push(row("Username", u.username.clone()));
            lines.push(row("Email", u.email.clone()));
            lines.push(row("Team", u.team_id.map(|t| t.to_string()).unwrap_or_else(|| NONE.into())));
        }
        None => lines.push(Line::from(format!("User {} not found.", config.user_id))),
    }
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Settings"));
    f.render_widget(p, area);
}

fn input_box<'a>(label: &'a str, value: String, focused: bool) -> Paragraph<'a> {
    let style = if focused { Style::default().fg(GOLD) } else { Style::default() };
    Paragraph::new(value).block(Block::default().borders(Borders::ALL).title(label).border_style(style))
}

fn submit_hint(can_submit: bool, submitting: bool) -> Paragraph<'static> {
    let (text, style) = if submitting {
        ("Submitting...", Style::default().fg(Color::Yellow))
    } else if can_submit {
        ("Enter: create   Esc: cancel   Tab: next field", Style::default().fg(Color::Green))
    } else {
        ("Fill in the required fields (*)   Esc: cancel", Style::default().fg(Color::DarkGray))
    };
    Paragraph::new(text).style(style).alignment(Alignment::Center)
}

/// Task modal. Submission is greyed out until the form builds.
pub fn render_task_form(f: &mut Frame, area: Rect, form: &TaskForm, submitting: bool) {
    let area = crate::tui::utils::centered_rect(70, 90, area);
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Create New Task");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(3); form.field_count()];
    constraints.push(Constraint::Min(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);
    let at = |order: usize| form.current_field == order;

    f.render_widget(input_box("Title *", form.title.display(), at(TITLE_GLOBAL_ORDER)), chunks[0]);
    f.render_widget(input_box("Description", form.description.display(), at(DESCRIPTION_GLOBAL_ORDER)), chunks[1]);
    f.render_widget(
        input_box("Status", format!("< {} >", form.selected_status().label()), at(STATUS_GLOBAL_ORDER)),
        chunks[2],
    );
    f.render_widget(
        input_box("Priority", format!("< {} >", form.selected_priority().label()), at(PRIORITY_GLOBAL_ORDER)),
        chunks[3],
    );
    f.render_widget(input_box("Tags (comma separated)", form.tags.display(), at(TAGS_GLOBAL_ORDER)), chunks[4]);
    f.render_widget(input_box("Start Date * (YYYY-MM-DD)", form.start_date.display(), at(START_DATE_GLOBAL_ORDER)), chunks[5]);
    f.render_widget(input_box("Due Date * (YYYY-MM-DD)", form.due_date.display(), at(DUE_DATE_GLOBAL_ORDER)), chunks[6]);
    f.render_widget(input_box("Points", form.points.display(), at(POINTS_GLOBAL_ORDER)), chunks[7]);
    f.render_widget(input_box("Author User ID *", form.author.display(), at(AUTHOR_GLOBAL_ORDER)), chunks[8]);
    f.render_widget(input_box("Assigned User ID *", form.assignee.display(), at(ASSIGNEE_GLOBAL_ORDER)), chunks[9]);
    if form.shows_project_field() {
        f.render_widget(input_box("Project ID *", form.project_id.display(), at(PROJECT_GLOBAL_ORDER)), chunks[10]);
    }
    let last = chunks.len() - 1;
    f.render_widget(submit_hint(form.can_submit(), submitting), chunks[last]);
}

pub fn render_project_form(f: &mut Frame, area: Rect, form: &ProjectForm, submitting: bool) {
    let area = crate::tui::utils::centered_rect(60, 60, area);
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Create New Project");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(inner);
    let at = |order: usize| form.current_field == order;
    f.render_widget(input_box("Project Name *", form.name.display(), at(NAME_GLOBAL_ORDER)), chunks[0]);
    f.render_widget(input_box("Description", form.description.display(), at(PROJECT_DESCRIPTION)), chunks[1]);
    f.render_widget(input_box("Start Date (YYYY-MM-DD)", form.start_date.display(), at(PROJECT_START)), chunks[2]);
    f.render_widget(input_box("End Date (YYYY-MM-DD)", form.end_date.display(), at(END_DATE_GLOBAL_ORDER)), chunks[3]);
    f.render_widget(submit_hint(form.can_submit(), submitting), chunks[4]);
}

pub fn render_help(f: &mut Frame, area: Rect) {
    let section = |title: &'static str| Line::from(Span::styled(title, bold()));
    let help_text = vec![
        section("Navigation:"),
        Line::from("  Tab/Shift+Tab  Next/previous page"),
        Line::from("  ↑/↓, k/j       Move selection"),
        Line::from("  Enter          Open selected project"),
        Line::from("  Esc            Back (or cancel a drag)"),
        Line::from("  r              Refetch this page"),
        Line::from("  h/F1           Show this help"),
        Line::from("  q/Ctrl+C       Quit"),
        Line::from(""),
        section("Project page:"),
        Line::from("  1-4, [ ]       Board / List / Timeline / Table"),
        Line::from("  a              Add task"),
        Line::from("  ←/→            Move between board columns"),
        Line::from("  Space          Grab card, then ←/→ and Space to drop"),
        Line::from("  m              Cycle timeline Day/Week/Month"),
        Line::from(""),
        section("Other pages:"),
        Line::from("  n              New project (Projects page)"),
        Line::from("  v              List/table toggle (Priority pages)"),
        Line::from("  type           Search terms (Search page)"),
        Line::from(""),
        section("Forms:"),
        Line::from("  Tab/↑/↓        Move between fields"),
        Line::from("  ←/→            Change status/priority"),
        Line::from("  Enter          Create"),
        Line::from("  Esc            Cancel"),
    ];
    let paragraph = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help - Press any key to return"))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

/// Text for a status bar slot describing the board focus.
pub fn board_focus_label(status: Status, drag: &DragState) -> String {
    match drag {
        DragState::Dragging { item, hover } => format!("Dragging #{} over {} (Space drop, Esc cancel)", item.id, hover.label()),
        DragState::Idle => format!("Column: {} (Space to grab a card)", status.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn error_view_shows_message_without_retry_prompt() {
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        let err = ApiError::Status { status: 500, body: "boom".into() };
        terminal.draw(|f| render_error(f, f.area(), "Projects", &err)).unwrap();

        let screen: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("An error occurred while fetching data"));
        assert!(screen.contains("server returned 500: boom"));
        assert!(!screen.contains("retry"));
    }
}
