//! Cached access to the REST backend.
//!
//! `ApiClient` owns the query cache and every request goes through it:
//! concurrent queries for the same key share one in-flight fetch, results are
//! kept per key and tagged, and a successful mutation invalidates the tags
//! it names and refetches whatever is still being watched. All views read
//! server data through this one client.

pub mod cache;
pub mod endpoints;
#[cfg(test)]
pub mod testing;
pub mod transport;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::cache::{QueryCache, QueryKey, Tag};
use crate::api::endpoints::{
    Endpoint, EndpointKind, CREATE_PROJECT, CREATE_TASK, GET_PROJECTS, GET_TASKS, GET_TASKS_BY_USER, GET_TEAMS,
    GET_USERS, SEARCH, UPDATE_TASK_STATUS,
};
use crate::api::transport::{HttpTransport, Transport};
use crate::error::ApiError;
use crate::fields::Status;
use crate::project::{NewProject, Project};
use crate::search::SearchResults;
use crate::task::{NewTask, Task};
use crate::user::{Team, User};

type SharedFetch = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

const EVENT_CAPACITY: usize = 64;

/// Something changed in the cache. Views redraw on any event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Failed(QueryKey),
    Invalidated(QueryKey),
}

/// What a view sees for a watched query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Loading,
    Ready(T),
    Failed(ApiError),
}

impl<T> QueryState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            QueryState::Ready(data) => Some(data),
            _ => None,
        }
    }
}

/// Argument builders for the query endpoints.
pub mod args {
    use serde_json::{json, Value};

    pub fn none() -> Value {
        Value::Null
    }

    pub fn project_tasks(project_id: u64) -> Value {
        json!({ "projectId": project_id })
    }

    pub fn user_tasks(user_id: u64) -> Value {
        json!({ "userId": user_id })
    }

    pub fn search(query: &str) -> Value {
        json!({ "query": query })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(ApiError::decode)
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    cache: Mutex<QueryCache>,
    in_flight: Mutex<HashMap<QueryKey, SharedFetch>>,
    events: broadcast::Sender<CacheEvent>,
    keep_unused: Duration,
}

impl ClientInner {
    /// Join the in-flight fetch for `key` or start a new one.
    ///
    /// The fetch runs as its own task, so its result lands in the cache even
    /// when every caller has gone away. Must be called within a tokio runtime.
    fn start_fetch(self: &Arc<Self>, endpoint: &'static Endpoint, args: Value, key: QueryKey) -> SharedFetch {
        let mut in_flight = lock(&self.in_flight);
        if let Some(existing) = in_flight.get(&key) {
            debug!(%key, "joining in-flight request");
            return existing.clone();
        }

        let generation = lock(&self.cache).ensure(&key, endpoint, &args, Instant::now());
        let inner = Arc::clone(self);
        let task_key = key.clone();
        // The task removes itself from `in_flight` when done; it cannot get
        // there before the insert below since we hold the lock.
        let handle = tokio::spawn(async move { inner.run_fetch(endpoint, args, task_key, generation).await });
        let shared = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ApiError::Transport(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared();
        in_flight.insert(key, shared.clone());
        shared
    }

    async fn run_fetch(
        self: Arc<Self>,
        endpoint: &'static Endpoint,
        args: Value,
        key: QueryKey,
        generation: u64,
    ) -> Result<Value, ApiError> {
        let result = match (endpoint.request)(&args) {
            Ok(request) => {
                info!(%key, path = %request.path, "fetching");
                self.transport.send(request).await
            }
            Err(e) => Err(e),
        };

        let now = Instant::now();
        let refetch = {
            let mut cache = lock(&self.cache);
            match &result {
                Ok(data) => {
                    let tags = (endpoint.provides)(Some(data), &args);
                    cache.store(&key, data.clone(), tags, generation, now)
                }
                Err(err) => {
                    warn!(%key, error = %err, "query failed");
                    cache.store_error(&key, err.clone(), (endpoint.provides)(None, &args), now);
                    false
                }
            }
        };
        lock(&self.in_flight).remove(&key);

        let event = match &result {
            Ok(_) => CacheEvent::Updated(key.clone()),
            Err(_) => CacheEvent::Failed(key.clone()),
        };
        let _ = self.events.send(event);

        if refetch {
            debug!(%key, "result arrived after invalidation, refetching");
            let _ = self.start_fetch(endpoint, args, key);
        }
        result
    }

    /// Start fetches for watched keys. Keys evicted meanwhile are skipped.
    fn refetch_keys(self: &Arc<Self>, keys: &[QueryKey]) {
        let targets: Vec<(QueryKey, &'static Endpoint, Value)> = {
            let cache = lock(&self.cache);
            keys.iter()
                .filter_map(|k| cache.get(k).map(|e| (k.clone(), e.endpoint, e.args.clone())))
                .collect()
        };
        for (key, endpoint, args) in targets {
            let _ = self.events.send(CacheEvent::Invalidated(key.clone()));
            let _ = self.start_fetch(endpoint, args, key);
        }
    }
}

/// Handle to the shared cache service. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("entries", &lock(&self.inner.cache).len())
            .finish()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, keep_unused: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        ApiClient {
            inner: Arc::new(ClientInner {
                transport,
                cache: Mutex::new(QueryCache::new()),
                in_flight: Mutex::new(HashMap::new()),
                events,
                keep_unused,
            }),
        }
    }

    /// Client talking HTTP to `base_url`.
    pub fn http(base_url: &str, keep_unused: Duration) -> Self {
        Self::new(Arc::new(HttpTransport::new(base_url)), keep_unused)
    }

    pub fn events(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    /// Run a query endpoint, answering from the cache when the entry is fresh.
    pub async fn query(&self, endpoint: &'static Endpoint, args: Value) -> Result<Value, ApiError> {
        endpoint.check_kind(EndpointKind::Query)?;
        let key = QueryKey::new(endpoint.name, &args);
        {
            let now = Instant::now();
            let mut cache = lock(&self.inner.cache);
            cache.ensure(&key, endpoint, &args, now);
            cache.touch(&key, now);
            if let Some(entry) = cache.get(&key) {
                if let (true, Some(data)) = (entry.is_fresh(), &entry.data) {
                    debug!(%key, "cache hit");
                    return Ok(data.clone());
                }
            }
        }
        self.inner.start_fetch(endpoint, args, key).await
    }

    /// Subscribe to a query. The entry is fetched now unless already fresh,
    /// and refetched whenever a mutation invalidates it while the
    /// subscription lives.
    pub fn watch(&self, endpoint: &'static Endpoint, args: Value) -> Subscription {
        let key = QueryKey::new(endpoint.name, &args);
        let fresh = {
            let mut cache = lock(&self.inner.cache);
            cache.subscribe(&key, endpoint, &args, Instant::now());
            cache.get(&key).is_some_and(|e| e.is_fresh())
        };
        if !fresh {
            drop(self.inner.start_fetch(endpoint, args, key.clone()));
        }
        Subscription {
            inner: Arc::clone(&self.inner),
            key,
        }
    }

    /// Current state of a key. A recorded error wins over older data.
    pub fn state<T: DeserializeOwned>(&self, key: &QueryKey) -> QueryState<T> {
        let cache = lock(&self.inner.cache);
        let Some(entry) = cache.get(key) else {
            return QueryState::Loading;
        };
        if let Some(err) = &entry.error {
            return QueryState::Failed(err.clone());
        }
        match &entry.data {
            Some(data) => match decode(data.clone()) {
                Ok(value) => QueryState::Ready(value),
                Err(err) => QueryState::Failed(err),
            },
            None => QueryState::Loading,
        }
    }

    /// Whether a fetch for `key` is currently running.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        lock(&self.inner.in_flight).contains_key(key)
    }

    /// Run a mutation endpoint. On success the tags it names are invalidated
    /// and watched entries refetch in the background; on failure the cache
    /// is left untouched.
    pub async fn mutate(&self, endpoint: &'static Endpoint, args: Value) -> Result<Value, ApiError> {
        endpoint.check_kind(EndpointKind::Mutation)?;
        let request = (endpoint.request)(&args)?;
        info!(endpoint = endpoint.name, path = %request.path, "sending mutation");
        match self.inner.transport.send(request).await {
            Ok(response) => {
                let tags = (endpoint.invalidates)(&args);
                self.invalidate(&tags);
                Ok(response)
            }
            Err(err) => {
                warn!(endpoint = endpoint.name, error = %err, "mutation failed");
                Err(err)
            }
        }
    }

    /// Mark every entry matching `tags` stale and refetch the watched ones.
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<QueryKey> {
        let keys = lock(&self.inner.cache).invalidate(tags);
        if !keys.is_empty() {
            let labels: Vec<String> = tags.iter().map(Tag::to_string).collect();
            debug!(tags = ?labels, refetching = keys.len(), "invalidated");
        }
        self.inner.refetch_keys(&keys);
        keys
    }

    /// Force a refetch of one key, whatever its state.
    pub fn refetch(&self, key: &QueryKey) {
        lock(&self.inner.cache).mark_stale(key);
        self.inner.refetch_keys(std::slice::from_ref(key));
    }

    /// Drop cache entries that have been unwatched for the configured period.
    pub fn evict_unused(&self) -> usize {
        let evicted = lock(&self.inner.cache).evict_unused(Instant::now(), self.inner.keep_unused);
        if evicted > 0 {
            debug!(evicted, "evicted unused cache entries");
        }
        evicted
    }

    pub async fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        decode(self.query(&GET_PROJECTS, args::none()).await?)
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        let body = serde_json::to_value(project).map_err(ApiError::decode)?;
        decode(self.mutate(&CREATE_PROJECT, body).await?)
    }

    pub async fn get_tasks(&self, project_id: u64) -> Result<Vec<Task>, ApiError> {
        decode(self.query(&GET_TASKS, args::project_tasks(project_id)).await?)
    }

    pub async fn get_tasks_by_user(&self, user_id: u64) -> Result<Vec<Task>, ApiError> {
        decode(self.query(&GET_TASKS_BY_USER, args::user_tasks(user_id)).await?)
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let body = serde_json::to_value(task).map_err(ApiError::decode)?;
        decode(self.mutate(&CREATE_TASK, body).await?)
    }

    pub async fn update_task_status(&self, task_id: u64, status: Status) -> Result<Task, ApiError> {
        let args = json!({ "taskId": task_id, "status": status });
        decode(self.mutate(&UPDATE_TASK_STATUS, args).await?)
    }

    pub async fn search(&self, query: &str) -> Result<SearchResults, ApiError> {
        decode(self.query(&SEARCH, args::search(query)).await?)
    }

    pub async fn get_users(&self) -> Result<Vec<User>, ApiError> {
        decode(self.query(&GET_USERS, args::none()).await?)
    }

    pub async fn get_teams(&self) -> Result<Vec<Team>, ApiError> {
        decode(self.query(&GET_TEAMS, args::none()).await?)
    }
}

/// Keeps a query watched until dropped.
pub struct Subscription {
    inner: Arc<ClientInner>,
    key: QueryKey,
}

impl Subscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Subscription").field(&self.key).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        lock(&self.inner.cache).unsubscribe(&self.key, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeBackend;
    use crate::api::transport::Method;
    use crate::board::{Board, DragItem, DropTarget, TASK_DRAG_KIND};
    use crate::fields::Priority;
    use crate::tui::task_form::TaskForm;

    fn client(backend: &Arc<FakeBackend>) -> ApiClient {
        ApiClient::new(backend.clone(), Duration::from_secs(60))
    }

    /// Wait until the given key has been written by a fetch.
    async fn settle(client: &ApiClient, rx: &mut broadcast::Receiver<CacheEvent>, key: &QueryKey) {
        loop {
            match rx.recv().await.unwrap() {
                CacheEvent::Updated(k) | CacheEvent::Failed(k) if &k == key => break,
                _ => {}
            }
        }
        assert!(!client.is_fetching(key));
    }

    #[tokio::test]
    async fn concurrent_queries_share_one_request() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);

        let (a, b) = tokio::join!(client.get_tasks(5), client.get_tasks(5));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(backend.count(Method::Get, "/tasks?projectId=5"), 1);

        // Fresh entry answers from the cache.
        let again = client.get_tasks(5).await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(backend.count(Method::Get, "/tasks?projectId=5"), 1);
    }

    #[tokio::test]
    async fn different_arguments_are_separate_entries() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        let five = client.get_tasks(5).await.unwrap();
        let six = client.get_tasks(6).await.unwrap();
        assert!(five.iter().all(|t| t.project_id == 5));
        assert!(six.iter().all(|t| t.project_id == 6));
        assert_eq!(backend.requests().len(), 2);
    }

    #[tokio::test]
    async fn status_update_refetches_only_affected_lists() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        let _five = client.watch(&GET_TASKS, args::project_tasks(5));
        let _six = client.watch(&GET_TASKS, args::project_tasks(6));
        client.get_tasks(5).await.unwrap();
        client.get_tasks(6).await.unwrap();

        let updated = client.update_task_status(43, Status::ToDo).await.unwrap();
        assert_eq!(updated.status, Some(Status::ToDo));

        let tasks = client.get_tasks(5).await.unwrap();
        let statuses: Vec<_> = tasks.iter().map(|t| (t.id, t.status)).collect();
        assert_eq!(statuses, vec![(42, Some(Status::ToDo)), (43, Some(Status::ToDo))]);
        assert_eq!(backend.count(Method::Get, "/tasks?projectId=5"), 2);

        client.get_tasks(6).await.unwrap();
        assert_eq!(backend.count(Method::Get, "/tasks?projectId=6"), 1);
    }

    #[tokio::test]
    async fn unwatched_entries_go_stale_without_refetch() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        client.get_tasks(5).await.unwrap();
        client.update_task_status(42, Status::Completed).await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(backend.count(Method::Get, "/tasks?projectId=5"), 1);

        // The next read fetches again.
        let tasks = client.get_tasks(5).await.unwrap();
        assert_eq!(tasks[0].status, Some(Status::Completed));
        assert_eq!(backend.count(Method::Get, "/tasks?projectId=5"), 2);
    }

    #[tokio::test]
    async fn failures_are_reported_once_without_retry() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        let mut rx = client.events();
        backend.set_failing(true);

        let sub = client.watch(&GET_PROJECTS, args::none());
        settle(&client, &mut rx, sub.key()).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(backend.count(Method::Get, "/projects"), 1);
        assert!(matches!(
            client.state::<Vec<Project>>(sub.key()),
            QueryState::Failed(ApiError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_alone() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        let sub = client.watch(&GET_TASKS, args::project_tasks(5));
        client.get_tasks(5).await.unwrap();

        backend.set_failing(true);
        assert!(client.update_task_status(42, Status::Completed).await.is_err());
        tokio::task::yield_now().await;
        assert_eq!(backend.count(Method::Get, "/tasks?projectId=5"), 1);
        let tasks = client.state::<Vec<Task>>(sub.key());
        assert_eq!(tasks.ready().unwrap()[0].status, Some(Status::ToDo));
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_network() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        assert!(matches!(client.get_tasks(0).await, Err(ApiError::InvalidArgument(_))));
        assert!(matches!(client.search("ab").await, Err(ApiError::InvalidArgument(_))));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn endpoints_only_run_as_their_own_kind() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        assert!(matches!(
            client.mutate(&GET_PROJECTS, args::none()).await,
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.query(&CREATE_PROJECT, json!({"name": "Apollo"})).await,
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(backend.requests().is_empty());
        assert_eq!(lock(&client.inner.cache).len(), 0);
    }

    #[tokio::test]
    async fn late_response_lands_after_unsubscribe() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        let mut rx = client.events();

        let sub = client.watch(&GET_USERS, args::none());
        let key = sub.key().clone();
        drop(sub);
        settle(&client, &mut rx, &key).await;

        let users = client.state::<Vec<User>>(&key);
        assert_eq!(users.ready().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn search_results_decode_with_sections() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        let results = client.search("wri").await.unwrap();
        let titles: Vec<_> = results.tasks.unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Write docs"]);
        assert_eq!(results.projects, Some(vec![]));
    }

    #[tokio::test]
    async fn created_task_appears_in_project_list() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        let sub = client.watch(&GET_TASKS, args::project_tasks(5));
        assert_eq!(client.get_tasks(5).await.unwrap().len(), 2);

        let mut form = TaskForm::new(Some(5));
        form.title.value = "Fix bug".into();
        form.author.value = "7".into();
        form.assignee.value = "3".into();
        form.start_date.value = "2024-01-01".into();
        form.due_date.value = "2024-01-10".into();
        assert!(form.can_submit());
        let new_task = form.build().unwrap();
        client.create_task(&new_task).await.unwrap();

        let posted = backend
            .requests()
            .into_iter()
            .find(|r| r.method == Method::Post && r.path == "/tasks")
            .unwrap();
        let body = posted.body.unwrap();
        assert_eq!(body["title"], "Fix bug");
        assert_eq!(body["startDate"], "2024-01-01T00:00:00+00:00");
        assert_eq!(body["dueDate"], "2024-01-10T00:00:00+00:00");
        assert_eq!(body["authorUserId"], 7);
        assert_eq!(body["assignedUserId"], 3);
        assert_eq!(body["projectId"], 5);
        assert_eq!(body["status"], "To Do");
        assert_eq!(body["priority"], "Backlog");

        let tasks = client.get_tasks(5).await.unwrap();
        let created = tasks.iter().find(|t| t.title == "Fix bug").unwrap();
        assert_eq!(created.priority, Some(Priority::Backlog));
        assert_eq!(tasks.len(), 3);
        assert_eq!(backend.count(Method::Get, "/tasks?projectId=5"), 2);
        drop(sub);
    }

    #[tokio::test]
    async fn dropping_a_card_moves_it_on_the_board() {
        let backend = FakeBackend::seeded();
        let client = client(&backend);
        let sub = client.watch(&GET_TASKS, args::project_tasks(5));
        let tasks = client.get_tasks(5).await.unwrap();
        let board = Board::from_tasks(&tasks);
        assert_eq!(board.column(Status::ToDo).len(), 1);

        let item = DragItem {
            kind: TASK_DRAG_KIND,
            id: 42,
        };
        assert_eq!(item, DragItem::task(42));
        let change = DropTarget::column(Status::UnderReview).drop(&item).unwrap();
        client
            .update_task_status(change.task_id, change.status)
            .await
            .unwrap();

        let patches: Vec<_> = backend
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Patch)
            .collect();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].path, "/tasks/42/status");
        assert_eq!(patches[0].body, Some(json!({"status": "Under Review"})));

        let refetched = client.get_tasks(5).await.unwrap();
        let board = Board::from_tasks(&refetched);
        assert!(board.column(Status::ToDo).is_empty());
        let review: Vec<u64> = board.column(Status::UnderReview).iter().map(|t| t.id).collect();
        assert_eq!(review, vec![42]);
        drop(sub);
    }
}
