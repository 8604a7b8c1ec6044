//! Declarative endpoint table.
//!
//! Every REST operation the client uses is one `Endpoint` value: how to turn
//! JSON arguments into a request, which tags a result provides, and which
//! tags a successful mutation invalidates. `ApiClient` runs all of them
//! through a single dispatch routine.

use serde_json::{json, Value};

use crate::api::cache::{Tag, TagKind};
use crate::api::transport::{ApiRequest, Method};
use crate::error::ApiError;

/// Minimum trimmed length of a search term before a request is sent.
pub const MIN_SEARCH_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Query,
    Mutation,
}

/// One REST operation.
#[derive(Debug)]
pub struct Endpoint {
    pub name: &'static str,
    pub kind: EndpointKind,
    /// Build the HTTP request from the arguments.
    pub request: fn(&Value) -> Result<ApiRequest, ApiError>,
    /// Tags provided by a query result; `None` when the fetch failed.
    pub provides: fn(Option<&Value>, &Value) -> Vec<Tag>,
    /// Tags invalidated by a successful mutation.
    pub invalidates: fn(&Value) -> Vec<Tag>,
}

impl Endpoint {
    /// Reject running a query as a mutation or the other way round.
    pub fn check_kind(&self, kind: EndpointKind) -> Result<(), ApiError> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(ApiError::invalid(format!("{} is a {:?} endpoint, not a {:?}", self.name, self.kind, kind)))
        }
    }
}

fn no_tags(_: &Value) -> Vec<Tag> {
    Vec::new()
}

fn no_provided_tags(_: Option<&Value>, _: &Value) -> Vec<Tag> {
    Vec::new()
}

/// Read a strictly positive integer argument.
fn positive_id(args: &Value, field: &str) -> Result<u64, ApiError> {
    match args.get(field).and_then(Value::as_u64) {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid(format!("{} must be a positive integer", field))),
    }
}

/// Ids of every element of a JSON array result.
fn result_ids(result: Option<&Value>) -> Option<Vec<u64>> {
    let items = result?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_u64))
            .collect(),
    )
}

pub static GET_PROJECTS: Endpoint = Endpoint {
    name: "getProjects",
    kind: EndpointKind::Query,
    request: |_| Ok(ApiRequest::get("/projects")),
    provides: |_, _| vec![Tag::all(TagKind::Projects)],
    invalidates: no_tags,
};

pub static CREATE_PROJECT: Endpoint = Endpoint {
    name: "createProject",
    kind: EndpointKind::Mutation,
    request: |project| {
        let has_name = project
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|n| !n.trim().is_empty());
        if !has_name {
            return Err(ApiError::invalid("project name is required"));
        }
        Ok(ApiRequest::new(Method::Post, "/projects", Some(project.clone())))
    },
    provides: no_provided_tags,
    invalidates: |_| vec![Tag::all(TagKind::Projects)],
};

pub static GET_TASKS: Endpoint = Endpoint {
    name: "getTasks",
    kind: EndpointKind::Query,
    request: |args| {
        let project_id = positive_id(args, "projectId")?;
        Ok(ApiRequest::get(format!("/tasks?projectId={}", project_id)))
    },
    provides: |result, _| match result_ids(result) {
        Some(ids) if !ids.is_empty() => ids.into_iter().map(|id| Tag::id(TagKind::Tasks, id)).collect(),
        _ => vec![Tag::all(TagKind::Tasks)],
    },
    invalidates: no_tags,
};

pub static GET_TASKS_BY_USER: Endpoint = Endpoint {
    name: "getTasksByUser",
    kind: EndpointKind::Query,
    request: |args| {
        let user_id = positive_id(args, "userId")?;
        Ok(ApiRequest::get(format!("/tasks/user/{}", user_id)))
    },
    provides: |result, args| match result_ids(result) {
        Some(ids) if !ids.is_empty() => ids.into_iter().map(|id| Tag::id(TagKind::Tasks, id)).collect(),
        // Fallback keyed by the user id, so an empty list is still hit by a
        // broad task invalidation.
        _ => match args.get("userId").and_then(Value::as_u64) {
            Some(user_id) => vec![Tag::id(TagKind::Tasks, user_id)],
            None => vec![Tag::all(TagKind::Tasks)],
        },
    },
    invalidates: no_tags,
};

pub static CREATE_TASK: Endpoint = Endpoint {
    name: "createTask",
    kind: EndpointKind::Mutation,
    request: |task| {
        let has_title = task
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.trim().is_empty());
        if !has_title {
            return Err(ApiError::invalid("task title is required"));
        }
        positive_id(task, "projectId")?;
        Ok(ApiRequest::new(Method::Post, "/tasks", Some(task.clone())))
    },
    provides: no_provided_tags,
    invalidates: |_| vec![Tag::all(TagKind::Tasks)],
};

pub static UPDATE_TASK_STATUS: Endpoint = Endpoint {
    name: "updateTaskStatus",
    kind: EndpointKind::Mutation,
    request: |args| {
        let task_id = positive_id(args, "taskId")?;
        let status = args
            .get("status")
            .cloned()
            .ok_or_else(|| ApiError::invalid("status is required"))?;
        Ok(ApiRequest::new(
            Method::Patch,
            format!("/tasks/{}/status", task_id),
            Some(json!({ "status": status })),
        ))
    },
    provides: no_provided_tags,
    invalidates: |args| match args.get("taskId").and_then(Value::as_u64) {
        Some(id) => vec![Tag::id(TagKind::Tasks, id)],
        None => Vec::new(),
    },
};

pub static SEARCH: Endpoint = Endpoint {
    name: "search",
    kind: EndpointKind::Query,
    request: |args| {
        let query = args.get("query").and_then(Value::as_str).unwrap_or("");
        if query.trim().chars().count() < MIN_SEARCH_LEN {
            return Err(ApiError::invalid(format!(
                "search term must be at least {} characters",
                MIN_SEARCH_LEN
            )));
        }
        Ok(ApiRequest::get(format!("/search?query={}", urlencoding::encode(query))))
    },
    provides: no_provided_tags,
    invalidates: no_tags,
};

pub static GET_USERS: Endpoint = Endpoint {
    name: "getUsers",
    kind: EndpointKind::Query,
    request: |_| Ok(ApiRequest::get("/users")),
    provides: |_, _| vec![Tag::all(TagKind::Users)],
    invalidates: no_tags,
};

pub static GET_TEAMS: Endpoint = Endpoint {
    name: "getTeams",
    kind: EndpointKind::Query,
    request: |_| Ok(ApiRequest::get("/teams")),
    provides: |_, _| vec![Tag::all(TagKind::Teams)],
    invalidates: no_tags,
};

/// All endpoints, in the order they appear in the backend's route table.
pub static ENDPOINTS: [&Endpoint; 9] = [
    &GET_PROJECTS,
    &CREATE_PROJECT,
    &GET_TASKS,
    &GET_TASKS_BY_USER,
    &CREATE_TASK,
    &UPDATE_TASK_STATUS,
    &SEARCH,
    &GET_USERS,
    &GET_TEAMS,
];
