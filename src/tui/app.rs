//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and coordinates between
//! pages. Server data is never held here: each page watches the queries
//! it needs and reads them back from the shared `ApiClient` cache on every
//! draw, so a refetch triggered anywhere shows up on the next frame.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::api::cache::QueryKey;
use crate::api::endpoints::{Endpoint, GET_PROJECTS, GET_TASKS, GET_TASKS_BY_USER, GET_TEAMS, GET_USERS, SEARCH};
use crate::api::{args, ApiClient, QueryState, Subscription};
use crate::board::{Board, DragState, StatusChange, BOARD_COLUMNS};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::fields::{ProjectTab, ViewMode};
use crate::project::{find_project, Project};
use crate::search::{is_searchable, Debouncer, SearchResults, SearchTrigger};
use crate::task::Task;
use crate::timeline::{project_bars, task_bars};
use crate::tui::{
    colors::{DARK_RED, GOLD},
    enums::{AppState, InputMode, ListLayout, Page},
    input::InputField,
    project_form::ProjectForm,
    task_form::TaskForm,
    views,
};
use crate::user::{find_user, Team, User};

/// UI tick driving the search debounce and cache eviction.
const TICK: Duration = Duration::from_millis(100);

/// State snapshot for navigation history.
#[derive(Clone, Copy, Debug)]
struct NavigationSnapshot {
    page: Page,
    project_tab: ProjectTab,
    selected: usize,
}

/// Result of a mutation run in the background.
#[derive(Debug)]
pub enum MutationOutcome {
    TaskCreated(Result<Task, ApiError>),
    ProjectCreated(Result<Project, ApiError>),
    StatusChanged {
        change: StatusChange,
        result: Result<Task, ApiError>,
    },
}

fn query_key(endpoint: &'static Endpoint, args: Value) -> QueryKey {
    QueryKey::new(endpoint.name, &args)
}

/// Main application state for the terminal user interface.
pub struct App {
    client: ApiClient,
    config: AppConfig,
    state: AppState,
    page: Page,
    project_tab: ProjectTab,
    priority_layout: ListLayout,
    timeline_mode: ViewMode,
    subscriptions: Vec<Subscription>,
    selected: usize,
    board_col: usize,
    board_row: usize,
    drag: DragState,
    task_form: TaskForm,
    project_form: ProjectForm,
    search_input: InputField,
    search_debouncer: Debouncer,
    search_term: String,
    input_mode: InputMode,
    status_message: String,
    navigation_history: Vec<NavigationSnapshot>,
    max_history: usize,
    outcome_tx: mpsc::UnboundedSender<MutationOutcome>,
    outcomes: mpsc::UnboundedReceiver<MutationOutcome>,
    submitting: bool,
    should_quit: bool,
}

impl App {
    /// Create the app on the Projects page. Must be called within a tokio
    /// runtime since entering a page starts its fetches.
    pub fn new(client: ApiClient, config: AppConfig) -> Self {
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let search_debouncer = Debouncer::new(config.search_debounce);
        let mut app = App {
            client,
            config,
            state: AppState::Browse,
            page: Page::Projects,
            project_tab: ProjectTab::default(),
            priority_layout: ListLayout::default(),
            timeline_mode: ViewMode::default(),
            subscriptions: Vec::new(),
            selected: 0,
            board_col: 0,
            board_row: 0,
            drag: DragState::Idle,
            task_form: TaskForm::new(None),
            project_form: ProjectForm::new(),
            search_input: InputField::new(),
            search_debouncer,
            search_term: String::new(),
            input_mode: InputMode::None,
            status_message: String::new(),
            navigation_history: Vec::new(),
            max_history: 10,
            outcome_tx,
            outcomes,
            submitting: false,
            should_quit: false,
        };
        app.enter_page(Page::Projects);
        app
    }

    /// Query keys the page reads, in watch order.
    fn page_keys(&self, page: Page) -> Vec<(&'static Endpoint, Value)> {
        match page {
            Page::Projects | Page::Timeline => vec![(&GET_PROJECTS, args::none())],
            Page::Project(id) => vec![(&GET_TASKS, args::project_tasks(id)), (&GET_PROJECTS, args::none())],
            Page::Search if is_searchable(&self.search_term) => vec![(&SEARCH, args::search(&self.search_term))],
            Page::Search => Vec::new(),
            Page::Users | Page::Settings => vec![(&GET_USERS, args::none())],
            Page::Teams => vec![(&GET_TEAMS, args::none())],
            Page::Priority(_) => vec![(&GET_TASKS_BY_USER, args::user_tasks(self.config.user_id))],
        }
    }

    /// Switch the page and its subscriptions. New subscriptions are taken
    /// before the old ones drop so shared keys stay watched throughout.
    fn enter_page(&mut self, page: Page) {
        self.page = page;
        self.drag.cancel();
        self.board_col = 0;
        self.board_row = 0;
        self.input_mode = if page == Page::Search { InputMode::Text } else { InputMode::None };
        let subscriptions = self
            .page_keys(page)
            .into_iter()
            .map(|(endpoint, args)| self.client.watch(endpoint, args))
            .collect();
        self.subscriptions = subscriptions;
        debug!(page = %page.title(), watching = self.subscriptions.len(), "entered page");
    }

    /// Push current state to navigation history and move to a new page.
    fn push_state(&mut self, page: Page) {
        let snapshot = NavigationSnapshot {
            page: self.page,
            project_tab: self.project_tab,
            selected: self.selected,
        };
        self.navigation_history.push(snapshot);
        if self.navigation_history.len() > self.max_history {
            self.navigation_history.remove(0);
        }

        if let Page::Project(_) = page {
            self.project_tab = ProjectTab::default();
        }
        self.selected = 0;
        self.enter_page(page);
        self.status_message.clear();
    }

    /// Go back to the previous page if history exists.
    fn go_back(&mut self) -> bool {
        match self.navigation_history.pop() {
            Some(snapshot) => {
                self.enter_page(snapshot.page);
                self.project_tab = snapshot.project_tab;
                self.selected = snapshot.selected;
                self.status_message.clear();
                true
            }
            None => false,
        }
    }

    fn has_navigation_history(&self) -> bool {
        !self.navigation_history.is_empty()
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn projects(&self) -> QueryState<Vec<Project>> {
        self.client.state(&query_key(&GET_PROJECTS, args::none()))
    }

    fn project_tasks(&self, project_id: u64) -> QueryState<Vec<Task>> {
        self.client.state(&query_key(&GET_TASKS, args::project_tasks(project_id)))
    }

    /// The configured user's tasks of the page's priority.
    fn priority_tasks(&self) -> QueryState<Vec<Task>> {
        let Page::Priority(priority) = self.page else {
            return QueryState::Loading;
        };
        match self
            .client
            .state::<Vec<Task>>(&query_key(&GET_TASKS_BY_USER, args::user_tasks(self.config.user_id)))
        {
            QueryState::Ready(tasks) => {
                QueryState::Ready(tasks.into_iter().filter(|t| t.priority == Some(priority)).collect())
            }
            QueryState::Loading => QueryState::Loading,
            QueryState::Failed(err) => QueryState::Failed(err),
        }
    }

    fn users(&self) -> QueryState<Vec<User>> {
        self.client.state(&query_key(&GET_USERS, args::none()))
    }

    fn teams(&self) -> QueryState<Vec<Team>> {
        self.client.state(&query_key(&GET_TEAMS, args::none()))
    }

    fn search_results(&self) -> QueryState<SearchResults> {
        self.client.state(&query_key(&SEARCH, args::search(&self.search_term)))
    }

    /// Number of selectable rows on the current page.
    fn item_count(&self) -> usize {
        let len = |state: QueryState<Vec<_>>| state.ready().map_or(0, Vec::len);
        match self.page {
            Page::Projects => self.projects().ready().map_or(0, Vec::len),
            Page::Timeline => self.projects().ready().map_or(0, |p| project_bars(p).len()),
            Page::Project(id) => match self.project_tab {
                ProjectTab::Timeline => self.project_tasks(id).ready().map_or(0, |t| task_bars(t).len()),
                _ => len(self.project_tasks(id)),
            },
            Page::Priority(_) => len(self.priority_tasks()),
            Page::Users => self.users().ready().map_or(0, Vec::len),
            Page::Teams => self.teams().ready().map_or(0, Vec::len),
            Page::Search | Page::Settings => 0,
        }
    }

    fn on_board(&self) -> bool {
        matches!(self.page, Page::Project(_)) && self.project_tab == ProjectTab::Board
    }

    /// The card under the board cursor.
    fn focused_card(&self) -> Option<Task> {
        let Page::Project(id) = self.page else {
            return None;
        };
        let tasks = self.project_tasks(id);
        let tasks = tasks.ready()?;
        let board = Board::from_tasks(tasks);
        board
            .column(BOARD_COLUMNS[self.board_col])
            .get(self.board_row)
            .map(|task| (*task).clone())
    }

    fn column_len(&self, col: usize) -> usize {
        let Page::Project(id) = self.page else {
            return 0;
        };
        self.project_tasks(id)
            .ready()
            .map_or(0, |tasks| Board::from_tasks(tasks).count(BOARD_COLUMNS[col]))
    }

    fn spawn_status_change(&mut self, change: StatusChange) {
        info!(task = change.task_id, status = %change.status, "moving task");
        let client = self.client.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = client.update_task_status(change.task_id, change.status).await;
            let _ = tx.send(MutationOutcome::StatusChanged { change, result });
        });
    }

    fn submit_task(&mut self) {
        if self.submitting {
            return;
        }
        match self.task_form.build() {
            Ok(task) => {
                self.submitting = true;
                let client = self.client.clone();
                let tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let result = client.create_task(&task).await;
                    let _ = tx.send(MutationOutcome::TaskCreated(result));
                });
            }
            Err(err) => self.set_status_message(format!("Error: {}", err)),
        }
    }

    fn submit_project(&mut self) {
        if self.submitting {
            return;
        }
        match self.project_form.build() {
            Ok(project) => {
                self.submitting = true;
                let client = self.client.clone();
                let tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let result = client.create_project(&project).await;
                    let _ = tx.send(MutationOutcome::ProjectCreated(result));
                });
            }
            Err(err) => self.set_status_message(format!("Error: {}", err)),
        }
    }

    /// Apply a finished mutation. Forms close only on success.
    fn handle_outcome(&mut self, outcome: MutationOutcome) {
        match outcome {
            MutationOutcome::TaskCreated(Ok(task)) => {
                self.submitting = false;
                self.state = AppState::Browse;
                self.task_form.reset();
                self.set_status_message(format!("Created task #{} '{}'", task.id, task.title));
            }
            MutationOutcome::ProjectCreated(Ok(project)) => {
                self.submitting = false;
                self.state = AppState::Browse;
                self.project_form.reset();
                self.set_status_message(format!("Created project #{} '{}'", project.id, project.name));
            }
            MutationOutcome::TaskCreated(Err(err)) | MutationOutcome::ProjectCreated(Err(err)) => {
                self.submitting = false;
                warn!(error = %err, "create failed");
                self.set_status_message(format!("Failed to create: {}", err));
            }
            MutationOutcome::StatusChanged { change, result: Ok(_) } => {
                self.set_status_message(format!("Moved task #{} to {}", change.task_id, change.status));
            }
            MutationOutcome::StatusChanged { change, result: Err(err) } => {
                self.set_status_message(format!("Failed to move task #{}: {}", change.task_id, err));
            }
        }
    }

    /// Apply the settled search input once typing has paused, and drop
    /// cache entries nobody has watched for a while.
    fn on_tick(&mut self, now: Instant) {
        if let Some(trigger) = self.search_debouncer.poll(now) {
            let term = match trigger {
                SearchTrigger::Fire(term) => term,
                SearchTrigger::Clear => String::new(),
            };
            if term != self.search_term {
                debug!(%term, "search term settled");
                self.search_term = term;
                if self.page == Page::Search {
                    self.enter_page(Page::Search);
                }
            }
        }
        self.client.evict_unused();
    }

    fn refetch_page(&mut self) {
        for sub in &self.subscriptions {
            self.client.refetch(sub.key());
        }
        self.set_status_message("Refreshing...".to_string());
    }

    fn open_task_form(&mut self) {
        let context = match self.page {
            Page::Project(id) => Some(id),
            Page::Priority(_) => None,
            _ => return,
        };
        self.task_form = TaskForm::new(context);
        self.state = AppState::AddTask;
    }

    fn handle_search_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char(c) => self.search_input.handle_char(c),
            KeyCode::Backspace => self.search_input.handle_backspace(),
            KeyCode::Delete => self.search_input.handle_delete(),
            KeyCode::Left => self.search_input.move_cursor_left(),
            KeyCode::Right => self.search_input.move_cursor_right(),
            KeyCode::Esc | KeyCode::Enter => {
                self.input_mode = InputMode::None;
                return true;
            }
            _ => return false,
        }
        self.search_debouncer.input(&self.search_input.value, Instant::now());
        true
    }

    fn handle_board_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Left | KeyCode::Right => {
                let delta = if key == KeyCode::Right { 1 } else { -1 };
                if self.drag.active() {
                    self.drag.hover_by(delta);
                } else {
                    let last = BOARD_COLUMNS.len() as isize - 1;
                    self.board_col = (self.board_col as isize + delta).clamp(0, last) as usize;
                    self.board_row = 0;
                }
            }
            KeyCode::Up | KeyCode::Char('k') if !self.drag.active() => {
                self.board_row = self.board_row.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') if !self.drag.active() => {
                let len = self.column_len(self.board_col);
                if self.board_row + 1 < len {
                    self.board_row += 1;
                }
            }
            KeyCode::Char(' ') => {
                if self.drag.active() {
                    if let Some(change) = self.drag.drop() {
                        if let Some(idx) = BOARD_COLUMNS.iter().position(|s| *s == change.status) {
                            self.board_col = idx;
                            self.board_row = 0;
                        }
                        self.spawn_status_change(change);
                    }
                } else if let Some(task) = self.focused_card() {
                    self.drag.grab(&task);
                }
            }
            KeyCode::Esc if self.drag.active() => self.drag.cancel(),
            _ => return false,
        }
        true
    }

    fn handle_browse_input(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if self.page == Page::Search && self.input_mode == InputMode::Text {
            if matches!(key, KeyCode::Tab | KeyCode::BackTab) {
                self.push_state(self.page.cycle(key == KeyCode::Tab));
                return;
            }
            if self.handle_search_input(key) {
                return;
            }
        }
        if self.on_board() && self.handle_board_input(key) {
            return;
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                self.go_back();
            }
            KeyCode::Tab => self.push_state(self.page.cycle(true)),
            KeyCode::BackTab => self.push_state(self.page.cycle(false)),
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            KeyCode::Char('r') => self.refetch_page(),
            KeyCode::Char('/') => self.push_state(Page::Search),
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.item_count() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => match self.page {
                Page::Projects => {
                    let target = self.projects().ready().and_then(|p| p.get(self.selected).map(|p| p.id));
                    if let Some(id) = target {
                        self.push_state(Page::Project(id));
                    }
                }
                Page::Search => self.input_mode = InputMode::Text,
                _ => {}
            },
            KeyCode::Char('n') if self.page == Page::Projects => {
                self.project_form.reset();
                self.state = AppState::AddProject;
            }
            KeyCode::Char('a') => self.open_task_form(),
            KeyCode::Char(c @ '1'..='4') if matches!(self.page, Page::Project(_)) => {
                let idx = c as usize - '1' as usize;
                self.project_tab = ProjectTab::ALL[idx];
                self.selected = 0;
            }
            KeyCode::Char('[') | KeyCode::Char(']') if matches!(self.page, Page::Project(_)) => {
                let n = ProjectTab::ALL.len();
                let idx = ProjectTab::ALL.iter().position(|t| *t == self.project_tab).unwrap_or(0);
                let idx = if key == KeyCode::Char(']') { (idx + 1) % n } else { (idx + n - 1) % n };
                self.project_tab = ProjectTab::ALL[idx];
                self.selected = 0;
            }
            KeyCode::Char('m') => {
                let timeline = self.page == Page::Timeline
                    || (matches!(self.page, Page::Project(_)) && self.project_tab == ProjectTab::Timeline);
                if timeline {
                    self.timeline_mode = self.timeline_mode.cycle();
                }
            }
            KeyCode::Char('v') if matches!(self.page, Page::Priority(_)) => {
                self.priority_layout = self.priority_layout.toggle();
            }
            _ => {
                if modifiers.contains(KeyModifiers::CONTROL) {
                    debug!(?key, "unbound control key");
                }
            }
        }
    }

    fn handle_task_form_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.state = AppState::Browse;
                self.status_message.clear();
            }
            KeyCode::Enter => self.submit_task(),
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
    }

    fn handle_project_form_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.state = AppState::Browse;
                self.status_message.clear();
            }
            KeyCode::Enter => self.submit_project(),
            KeyCode::Tab | KeyCode::Down => self.project_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.project_form.prev_field(),
            KeyCode::Left => self.project_form.handle_left_right(false),
            KeyCode::Right => self.project_form.handle_left_right(true),
            KeyCode::Backspace => self.project_form.handle_backspace(),
            KeyCode::Char(c) => self.project_form.handle_char(c),
            _ => {}
        }
    }

    /// Dispatch a key press based on the current application state.
    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if !self.submitting {
            self.status_message.clear();
        }
        match self.state {
            AppState::Browse => self.handle_browse_input(key.code, key.modifiers),
            AppState::AddTask => self.handle_task_form_input(key.code),
            AppState::AddProject => self.handle_project_form_input(key.code),
            AppState::Help => self.state = AppState::Browse,
        }
    }

    /// Draw a query's content, or its loading or error placeholder.
    fn render_query<T>(f: &mut Frame, area: Rect, title: &str, state: QueryState<T>, draw: impl FnOnce(&mut Frame, Rect, &T)) {
        match state {
            QueryState::Loading => views::render_loading(f, area, title),
            QueryState::Failed(err) => views::render_error(f, area, title, &err),
            QueryState::Ready(data) => draw(f, area, &data),
        }
    }

    fn render_project(&self, f: &mut Frame, area: Rect, id: u64) {
        let title = format!("Tasks of project #{}", id);
        let (tab, selected, focus, drag, mode) = (
            self.project_tab,
            self.selected,
            (self.board_col, self.board_row),
            &self.drag,
            self.timeline_mode,
        );
        Self::render_query(f, area, &title, self.project_tasks(id), |f, area, tasks| match tab {
            ProjectTab::Board => views::render_board(f, area, tasks, focus, drag),
            ProjectTab::List => views::render_task_list(f, area, &title, tasks, selected),
            ProjectTab::Timeline => views::render_timeline(f, area, &title, &task_bars(tasks), mode, selected),
            ProjectTab::Table => views::render_task_table(f, area, &title, tasks, selected),
        });
    }

    fn render_search(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        views::render_search_input(f, chunks[0], &self.search_input);
        if !is_searchable(&self.search_term) {
            let hint = Paragraph::new("Type at least 3 characters to search tasks, projects and users.")
                .block(Block::default().borders(Borders::ALL).title("Results"));
            f.render_widget(hint, chunks[1]);
            return;
        }
        Self::render_query(f, chunks[1], "Results", self.search_results(), views::render_search_results);
    }

    fn render_page(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let (title, tab) = match self.page {
            Page::Project(id) => {
                let name = self
                    .projects()
                    .ready()
                    .and_then(|p| find_project(p, id).map(|p| p.name.clone()))
                    .unwrap_or_else(|| self.page.title());
                (name, Some(self.project_tab))
            }
            page => (page.title(), None),
        };
        views::render_header(f, chunks[0], &title, tab);

        let area = chunks[1];
        let selected = self.selected;
        match self.page {
            Page::Projects => Self::render_query(f, area, "Projects", self.projects(), |f, area, projects| {
                views::render_projects(f, area, projects, selected)
            }),
            Page::Project(id) => self.render_project(f, area, id),
            Page::Timeline => {
                let mode = self.timeline_mode;
                Self::render_query(f, area, "Timeline", self.projects(), |f, area, projects| {
                    views::render_timeline(f, area, "Projects Timeline", &project_bars(projects), mode, selected)
                })
            }
            Page::Search => self.render_search(f, area),
            Page::Users => Self::render_query(f, area, "Users", self.users(), |f, area, users| {
                views::render_users(f, area, users, selected)
            }),
            Page::Teams => Self::render_query(f, area, "Teams", self.teams(), |f, area, teams| {
                views::render_teams(f, area, teams, selected)
            }),
            Page::Priority(priority) => {
                let title = format!("{} priority tasks", priority.label());
                let layout = self.priority_layout;
                Self::render_query(f, area, &title, self.priority_tasks(), |f, area, tasks| match layout {
                    ListLayout::List => views::render_task_list(f, area, &title, tasks, selected),
                    ListLayout::Table => views::render_task_table(f, area, &title, tasks, selected),
                })
            }
            Page::Settings => {
                let config = &self.config;
                Self::render_query(f, area, "Settings", self.users(), |f, area, users| {
                    views::render_settings(f, area, config, find_user(users, config.user_id))
                })
            }
        }
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let fetching = self.subscriptions.iter().any(|s| self.client.is_fetching(s.key()));
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.submitting {
            "Submitting...".to_string()
        } else {
            match self.state {
                AppState::Browse if self.on_board() => {
                    views::board_focus_label(BOARD_COLUMNS[self.board_col], &self.drag)
                }
                AppState::Browse => {
                    let back_tip = if self.has_navigation_history() { " | Esc Back" } else { "" };
                    let fetch_tip = if fetching { " | Fetching..." } else { "" };
                    format!("{} | Press 'h' for help{}{}", self.page.title(), back_tip, fetch_tip)
                }
                AppState::AddTask => "Add New Task".to_string(),
                AppState::AddProject => "Add New Project".to_string(),
                AppState::Help => "Help".to_string(),
            }
        };

        let is_error = self.status_message.starts_with("Error") || self.status_message.starts_with("Failed");
        let (bg, fg) = if is_error { (DARK_RED, Color::White) } else { (GOLD, Color::Rgb(20, 20, 20)) };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(bg).fg(fg))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the page and modal renderers.
    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(22), Constraint::Min(0)])
            .split(chunks[0]);

        views::render_sidebar(f, body[0], self.page);
        match self.state {
            AppState::Help => views::render_help(f, body[1]),
            AppState::Browse => self.render_page(f, body[1]),
            AppState::AddTask => {
                self.render_page(f, body[1]);
                views::render_task_form(f, chunks[0], &self.task_form, self.submitting);
            }
            AppState::AddProject => {
                self.render_page(f, body[1]);
                views::render_project_form(f, chunks[0], &self.project_form, self.submitting);
            }
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Redraws after every key press, cache event, mutation outcome and tick
    /// until the user quits.
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let mut keys = EventStream::new();
        let mut cache_events = self.client.events();
        let mut tick = tokio::time::interval(TICK);

        while !self.should_quit {
            terminal.draw(|f| self.render(f))?;

            tokio::select! {
                maybe_event = keys.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err),
                    None => break,
                },
                event = cache_events.recv() => match event {
                    Ok(event) => debug!(?event, "cache event"),
                    Err(broadcast::error::RecvError::Lagged(missed)) => debug!(missed, "cache events lagged"),
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(outcome) = self.outcomes.recv() => self.handle_outcome(outcome),
                _ = tick.tick() => self.on_tick(Instant::now()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::testing::FakeBackend;
    use crate::api::transport::Method;
    use crate::config::{EnvVars, FileConfig, Overrides};
    use crate::fields::{Priority, Status};

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    async fn app_with(backend: &Arc<FakeBackend>) -> App {
        let client = ApiClient::new(backend.clone(), Duration::from_secs(60));
        client.get_projects().await.unwrap();
        client.get_tasks(5).await.unwrap();
        let config = AppConfig::resolve(&Overrides::default(), &EnvVars::default(), &FileConfig::default()).unwrap();
        App::new(client, config)
    }

    #[tokio::test]
    async fn back_restores_page_tab_and_selection() {
        let backend = FakeBackend::seeded();
        let mut app = app_with(&backend).await;

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.page, Page::Project(5));
        assert_eq!(app.project_tab, ProjectTab::Board);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected, 1);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.page, Page::Timeline);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.page, Page::Project(5));
        assert_eq!(app.project_tab, ProjectTab::List);
        assert_eq!(app.selected, 1);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.page, Page::Projects);
        assert!(!app.has_navigation_history());
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let backend = FakeBackend::seeded();
        let mut app = app_with(&backend).await;
        for _ in 0..25 {
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.navigation_history.len(), 10);
    }

    #[tokio::test]
    async fn board_drag_moves_card_and_reports() {
        let backend = FakeBackend::seeded();
        let mut app = app_with(&backend).await;
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focused_card().map(|t| t.id), Some(42));

        press(&mut app, KeyCode::Char(' '));
        assert!(app.drag.is_dragging(42));
        press(&mut app, KeyCode::Right);
        assert!(app.drag.is_hovering(Status::WorkInProgress));
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.drag.active());
        assert_eq!(app.board_col, 1);

        let outcome = app.outcomes.recv().await.unwrap();
        app.handle_outcome(outcome);
        assert_eq!(backend.count(Method::Patch, "/tasks/42/status"), 1);
        assert_eq!(app.status_message, "Moved task #42 to Work In Progress");
    }

    #[tokio::test]
    async fn esc_cancels_drag_without_request() {
        let backend = FakeBackend::seeded();
        let mut app = app_with(&backend).await;
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Esc);

        assert!(!app.drag.active());
        assert_eq!(app.page, Page::Project(5));
        assert_eq!(backend.count(Method::Patch, "/tasks/42/status"), 0);
    }

    #[tokio::test]
    async fn failed_create_keeps_form_open() {
        let backend = FakeBackend::seeded();
        let mut app = app_with(&backend).await;
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state, AppState::AddTask);
        assert_eq!(app.task_form.context_project, Some(5));

        app.task_form.title = InputField::with_value("Fix bug");
        app.task_form.author = InputField::with_value("7");
        app.task_form.assignee = InputField::with_value("3");
        app.task_form.start_date = InputField::with_value("2024-01-01");
        app.task_form.due_date = InputField::with_value("2024-01-10");
        backend.set_failing(true);
        press(&mut app, KeyCode::Enter);
        assert!(app.submitting);

        let outcome = app.outcomes.recv().await.unwrap();
        app.handle_outcome(outcome);
        assert_eq!(app.state, AppState::AddTask);
        assert!(!app.submitting);
        assert!(app.status_message.starts_with("Failed to create"));

        backend.set_failing(false);
        press(&mut app, KeyCode::Enter);
        let outcome = app.outcomes.recv().await.unwrap();
        app.handle_outcome(outcome);
        assert_eq!(app.state, AppState::Browse);
        assert!(app.status_message.contains("Fix bug"));
    }

    #[tokio::test]
    async fn search_fires_after_quiet_period() {
        let backend = FakeBackend::seeded();
        let mut app = app_with(&backend).await;
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.page, Page::Search);
        assert_eq!(app.input_mode, InputMode::Text);
        assert!(app.subscriptions.is_empty());

        for c in "wri".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        app.on_tick(Instant::now());
        assert_eq!(app.search_term, "");

        app.on_tick(Instant::now() + app.config.search_debounce + Duration::from_millis(1));
        assert_eq!(app.search_term, "wri");
        assert_eq!(app.subscriptions.len(), 1);
        assert_eq!(app.subscriptions[0].key(), &query_key(&SEARCH, args::search("wri")));
    }

    #[tokio::test]
    async fn shortened_term_drops_results() {
        let backend = FakeBackend::seeded();
        let mut app = app_with(&backend).await;
        press(&mut app, KeyCode::Char('/'));
        for c in "wri".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        app.on_tick(Instant::now() + app.config.search_debounce + Duration::from_millis(1));
        assert_eq!(app.subscriptions.len(), 1);

        for _ in 0..3 {
            press(&mut app, KeyCode::Backspace);
        }
        assert_eq!(app.search_input.value, "");
        // Results stay until the shorter input settles.
        assert_eq!(app.search_term, "wri");

        app.on_tick(Instant::now() + app.config.search_debounce + Duration::from_millis(1));
        assert!(!is_searchable(&app.search_term));
        assert!(app.search_term.is_empty());
        assert!(app.subscriptions.is_empty());
        assert!(app.search_results().ready().is_none());
    }

    #[tokio::test]
    async fn priority_page_filters_user_tasks() {
        let backend = FakeBackend::seeded();
        let mut app = app_with(&backend).await;
        app.config.user_id = 7;
        app.push_state(Page::Priority(Priority::High));
        let key = app.subscriptions[0].key().clone();
        app.client.get_tasks_by_user(7).await.unwrap();
        assert!(!app.client.is_fetching(&key));

        let tasks = app.priority_tasks();
        let ids: Vec<u64> = tasks.ready().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![42]);

        press(&mut app, KeyCode::Char('v'));
        assert_eq!(app.priority_layout, ListLayout::Table);
    }
}
