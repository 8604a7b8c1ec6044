//! In-memory backend used by the client tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::transport::{ApiRequest, Method, Transport};
use crate::error::ApiError;

#[derive(Default)]
struct Store {
    projects: Vec<Value>,
    tasks: Vec<Value>,
    users: Vec<Value>,
    teams: Vec<Value>,
    next_id: u64,
}

/// Serves the REST routes from memory and records every request.
#[derive(Default)]
pub struct FakeBackend {
    store: Mutex<Store>,
    requests: Mutex<Vec<ApiRequest>>,
    failing: AtomicBool,
}

impl FakeBackend {
    /// Two projects (5 and 6), three tasks, two users and a team.
    pub fn seeded() -> Arc<Self> {
        let backend = FakeBackend::default();
        {
            let mut store = backend.store.lock().unwrap();
            store.projects = vec![
                json!({"id": 5, "name": "Apollo", "startDate": "2024-01-01T00:00:00.000Z", "endDate": "2024-03-01T00:00:00.000Z"}),
                json!({"id": 6, "name": "Gemini"}),
            ];
            store.tasks = vec![
                json!({"id": 42, "title": "Wire login", "status": "To Do", "priority": "High", "projectId": 5, "authorUserId": 7, "assignedUserId": 3}),
                json!({"id": 43, "title": "Write docs", "status": "Completed", "priority": "Low", "projectId": 5, "authorUserId": 3}),
                json!({"id": 50, "title": "Spike", "status": "Work In Progress", "projectId": 6, "authorUserId": 7}),
            ];
            store.users = vec![
                json!({"userId": 3, "username": "bo", "email": "bo@example.com", "teamId": 1}),
                json!({"userId": 7, "username": "ana", "email": "ana@example.com", "teamId": 1}),
            ];
            store.teams = vec![json!({"id": 1, "teamName": "Core", "productOwnerUsername": "ana"})];
            store.next_id = 100;
        }
        Arc::new(backend)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of recorded requests with this method and exact path.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn route(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let mut store = self.store.lock().unwrap();
        let (path, query) = match request.path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (request.path.as_str(), None),
        };
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let not_found = || ApiError::Status {
            status: 404,
            body: "not found".into(),
        };

        match (request.method, segments.as_slice()) {
            (Method::Get, ["projects"]) => Ok(Value::Array(store.projects.clone())),
            (Method::Post, ["projects"]) => {
                let mut project = request.body.clone().unwrap_or(Value::Null);
                store.next_id += 1;
                project["id"] = json!(store.next_id);
                store.projects.push(project.clone());
                Ok(project)
            }
            (Method::Get, ["tasks"]) => {
                let project_id: u64 = query
                    .and_then(|q| q.strip_prefix("projectId="))
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(not_found)?;
                Ok(Value::Array(
                    store
                        .tasks
                        .iter()
                        .filter(|t| t["projectId"] == json!(project_id))
                        .cloned()
                        .collect(),
                ))
            }
            (Method::Get, ["tasks", "user", id]) => {
                let user_id: u64 = id.parse().map_err(|_| not_found())?;
                Ok(Value::Array(
                    store
                        .tasks
                        .iter()
                        .filter(|t| t["authorUserId"] == json!(user_id) || t["assignedUserId"] == json!(user_id))
                        .cloned()
                        .collect(),
                ))
            }
            (Method::Post, ["tasks"]) => {
                let mut task = request.body.clone().unwrap_or(Value::Null);
                store.next_id += 1;
                task["id"] = json!(store.next_id);
                store.tasks.push(task.clone());
                Ok(task)
            }
            (Method::Patch, ["tasks", id, "status"]) => {
                let task_id: u64 = id.parse().map_err(|_| not_found())?;
                let status = request
                    .body
                    .as_ref()
                    .and_then(|b| b.get("status"))
                    .cloned()
                    .unwrap_or(Value::Null);
                let task = store
                    .tasks
                    .iter_mut()
                    .find(|t| t["id"] == json!(task_id))
                    .ok_or_else(not_found)?;
                task["status"] = status;
                Ok(task.clone())
            }
            (Method::Get, ["search"]) => {
                let term = query
                    .and_then(|q| q.strip_prefix("query="))
                    .map(|q| urlencoding::decode(q).map(|c| c.into_owned()).unwrap_or_default())
                    .unwrap_or_default()
                    .to_lowercase();
                let hits = |items: &[Value], field: &str| -> Vec<Value> {
                    items
                        .iter()
                        .filter(|v| {
                            v[field]
                                .as_str()
                                .is_some_and(|s| s.to_lowercase().contains(&term))
                        })
                        .cloned()
                        .collect()
                };
                Ok(json!({
                    "tasks": hits(&store.tasks, "title"),
                    "projects": hits(&store.projects, "name"),
                    "users": hits(&store.users, "username"),
                }))
            }
            (Method::Get, ["users"]) => Ok(Value::Array(store.users.clone())),
            (Method::Get, ["teams"]) => Ok(Value::Array(store.teams.clone())),
            _ => Err(not_found()),
        }
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        // Let other tasks run so concurrent callers genuinely overlap.
        tokio::task::yield_now().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                body: "unavailable".into(),
            });
        }
        self.route(&request)
    }
}
