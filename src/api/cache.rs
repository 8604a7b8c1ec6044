//! In-memory query cache with tag-based invalidation.
//!
//! Maps each query key to its last result and bookkeeping, and each tag to
//! the keys whose results provided it. This type is synchronous and does no
//! I/O; `ApiClient` drives it and decides when to fetch.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::api::endpoints::Endpoint;
use crate::error::ApiError;

/// Family of cached data a tag refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Projects,
    Tasks,
    Users,
    Teams,
}

/// Label attached to cached results and to mutations.
///
/// A tag without an id stands for the whole family when invalidated; a tag
/// with an id only matches that exact id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: TagKind,
    pub id: Option<u64>,
}

impl Tag {
    pub const fn all(kind: TagKind) -> Self {
        Tag { kind, id: None }
    }

    pub const fn id(kind: TagKind, id: u64) -> Self {
        Tag { kind, id: Some(id) }
    }

    /// Whether invalidating `self` hits a result that provided `provided`.
    pub fn matches(&self, provided: &Tag) -> bool {
        self.kind == provided.kind && (self.id.is_none() || self.id == provided.id)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{:?}:{}", self.kind, id),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

/// Endpoint name plus canonical JSON of its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub endpoint: &'static str,
    pub args: String,
}

impl QueryKey {
    /// serde_json maps are key-sorted, so equal arguments give equal keys.
    pub fn new(endpoint: &'static str, args: &Value) -> Self {
        QueryKey {
            endpoint,
            args: args.to_string(),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}

/// One cached query result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub endpoint: &'static Endpoint,
    pub args: Value,
    pub data: Option<Value>,
    pub error: Option<ApiError>,
    pub stale: bool,
    pub subscribers: usize,
    /// Bumped on every invalidation; a fetch started under an older
    /// generation cannot mark the entry fresh.
    pub generation: u64,
    tags: Vec<Tag>,
    last_used: Instant,
}

impl CacheEntry {
    fn new(endpoint: &'static Endpoint, args: Value, now: Instant) -> Self {
        CacheEntry {
            endpoint,
            args,
            data: None,
            error: None,
            stale: true,
            subscribers: 0,
            generation: 0,
            tags: Vec::new(),
            last_used: now,
        }
    }

    /// Has a usable result that no invalidation has touched since.
    pub fn is_fresh(&self) -> bool {
        !self.stale && self.error.is_none() && self.data.is_some()
    }
}

/// The shared query cache.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    tag_index: HashMap<Tag, HashSet<QueryKey>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create the entry for `key` if needed, returning its current generation.
    pub fn ensure(&mut self, key: &QueryKey, endpoint: &'static Endpoint, args: &Value, now: Instant) -> u64 {
        self.entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(endpoint, args.clone(), now))
            .generation
    }

    pub fn subscribe(&mut self, key: &QueryKey, endpoint: &'static Endpoint, args: &Value, now: Instant) {
        self.ensure(key, endpoint, args, now);
        if let Some(entry) = self.entries.get_mut(key) {
            entry.subscribers += 1;
            entry.last_used = now;
        }
    }

    /// Mark an entry as just used so eviction leaves it alone.
    pub fn touch(&mut self, key: &QueryKey, now: Instant) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_used = now;
        }
    }

    pub fn unsubscribe(&mut self, key: &QueryKey, now: Instant) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.last_used = now;
        }
    }

    /// Record a successful fetch started at `generation`.
    ///
    /// Returns true when the result arrived after an invalidation and the
    /// entry is still watched, i.e. it needs another fetch. A result for an
    /// entry evicted while its fetch ran is dropped.
    pub fn store(&mut self, key: &QueryKey, data: Value, tags: Vec<Tag>, generation: u64, now: Instant) -> bool {
        if !self.entries.contains_key(key) {
            return false;
        }
        self.retag(key, &tags);
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        entry.data = Some(data);
        entry.error = None;
        entry.last_used = now;
        entry.tags = tags;
        entry.stale = entry.generation != generation;
        entry.stale && entry.subscribers > 0
    }

    /// Record a failed fetch. Previous data is kept but the error wins when
    /// the entry is read.
    pub fn store_error(&mut self, key: &QueryKey, error: ApiError, tags: Vec<Tag>, now: Instant) {
        if !self.entries.contains_key(key) {
            return;
        }
        self.retag(key, &tags);
        if let Some(entry) = self.entries.get_mut(key) {
            entry.error = Some(error);
            entry.last_used = now;
            entry.tags = tags;
            entry.stale = true;
        }
    }

    fn retag(&mut self, key: &QueryKey, tags: &[Tag]) {
        if let Some(entry) = self.entries.get(key) {
            for old in &entry.tags {
                if let Some(keys) = self.tag_index.get_mut(old) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.tag_index.remove(old);
                    }
                }
            }
        }
        for tag in tags {
            self.tag_index.entry(*tag).or_default().insert(key.clone());
        }
    }

    /// Mark every entry that provided a tag matched by `tags` as stale.
    ///
    /// Returns the invalidated keys that currently have subscribers; those
    /// are the ones to refetch right away.
    pub fn invalidate(&mut self, tags: &[Tag]) -> Vec<QueryKey> {
        let mut hit: HashSet<QueryKey> = HashSet::new();
        for (provided, keys) in &self.tag_index {
            if tags.iter().any(|t| t.matches(provided)) {
                hit.extend(keys.iter().cloned());
            }
        }

        let mut refetch = Vec::new();
        for key in hit {
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.stale = true;
                entry.generation += 1;
                if entry.subscribers > 0 {
                    refetch.push(key);
                }
            }
        }
        refetch.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        refetch
    }

    /// Mark one entry stale regardless of tags (manual refetch).
    pub fn mark_stale(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.stale = true;
            entry.generation += 1;
        }
    }

    /// Drop entries nobody has watched for longer than `keep_for`.
    pub fn evict_unused(&mut self, now: Instant, keep_for: Duration) -> usize {
        let expired: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|(_, e)| e.subscribers == 0 && now.saturating_duration_since(e.last_used) >= keep_for)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.retag(key, &[]);
            self.entries.remove(key);
        }
        expired.len()
    }

    /// Keys of all entries that currently have at least one subscriber.
    pub fn watched_keys(&self) -> Vec<QueryKey> {
        self.entries
            .iter()
            .filter(|(_, e)| e.subscribers > 0)
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::endpoints::{GET_PROJECTS, GET_TASKS};
    use serde_json::json;

    fn tasks_key(project: u64) -> (QueryKey, Value) {
        let args = json!({ "projectId": project });
        (QueryKey::new(GET_TASKS.name, &args), args)
    }

    #[test]
    fn keys_are_canonical() {
        let a = QueryKey::new("x", &json!({"b": 1, "a": 2}));
        let b = QueryKey::new("x", &json!({"a": 2, "b": 1}));
        assert_eq!(a, b);
        assert_ne!(a, QueryKey::new("y", &json!({"a": 2, "b": 1})));
    }

    #[test]
    fn tag_matching() {
        let all = Tag::all(TagKind::Tasks);
        let one = Tag::id(TagKind::Tasks, 4);
        assert!(all.matches(&one));
        assert!(all.matches(&all));
        assert!(one.matches(&one));
        assert!(!one.matches(&Tag::id(TagKind::Tasks, 5)));
        assert!(!one.matches(&all));
        assert!(!all.matches(&Tag::all(TagKind::Projects)));
    }

    #[test]
    fn store_then_fresh_until_invalidated() {
        let now = Instant::now();
        let mut cache = QueryCache::new();
        let (key, args) = tasks_key(5);
        let gen = cache.ensure(&key, &GET_TASKS, &args, now);
        cache.subscribe(&key, &GET_TASKS, &args, now);
        cache.store(&key, json!([{"id": 1}]), vec![Tag::id(TagKind::Tasks, 1)], gen, now);
        assert!(cache.get(&key).unwrap().is_fresh());

        // Unrelated id leaves it alone.
        assert!(cache.invalidate(&[Tag::id(TagKind::Tasks, 2)]).is_empty());
        assert!(cache.get(&key).unwrap().is_fresh());

        let refetch = cache.invalidate(&[Tag::id(TagKind::Tasks, 1)]);
        assert_eq!(refetch, vec![key.clone()]);
        assert!(!cache.get(&key).unwrap().is_fresh());
    }

    #[test]
    fn broad_invalidation_hits_every_id_and_fallback() {
        let now = Instant::now();
        let mut cache = QueryCache::new();
        let (k1, a1) = tasks_key(1);
        let (k2, a2) = tasks_key(2);
        let g1 = cache.ensure(&k1, &GET_TASKS, &a1, now);
        let g2 = cache.ensure(&k2, &GET_TASKS, &a2, now);
        cache.store(&k1, json!([{"id": 9}]), vec![Tag::id(TagKind::Tasks, 9)], g1, now);
        cache.store(&k2, json!([]), vec![Tag::all(TagKind::Tasks)], g2, now);

        // No subscribers: nothing to refetch now, but both are stale.
        assert!(cache.invalidate(&[Tag::all(TagKind::Tasks)]).is_empty());
        assert!(!cache.get(&k1).unwrap().is_fresh());
        assert!(!cache.get(&k2).unwrap().is_fresh());
    }

    #[test]
    fn specific_id_does_not_hit_list_fallback() {
        let now = Instant::now();
        let mut cache = QueryCache::new();
        let (key, args) = tasks_key(3);
        let gen = cache.ensure(&key, &GET_TASKS, &args, now);
        cache.store(&key, json!([]), vec![Tag::all(TagKind::Tasks)], gen, now);
        cache.invalidate(&[Tag::id(TagKind::Tasks, 3)]);
        assert!(cache.get(&key).unwrap().is_fresh());
    }

    #[test]
    fn late_result_after_invalidation_stays_stale() {
        let now = Instant::now();
        let mut cache = QueryCache::new();
        let args = Value::Null;
        let key = QueryKey::new(GET_PROJECTS.name, &args);
        cache.subscribe(&key, &GET_PROJECTS, &args, now);
        let started = cache.get(&key).unwrap().generation;
        cache.store(&key, json!([]), vec![Tag::all(TagKind::Projects)], started, now);

        let started = cache.get(&key).unwrap().generation;
        cache.invalidate(&[Tag::all(TagKind::Projects)]);
        let needs_refetch = cache.store(&key, json!([{"id": 1}]), vec![Tag::all(TagKind::Projects)], started, now);
        assert!(needs_refetch);
        let entry = cache.get(&key).unwrap();
        assert!(!entry.is_fresh());
        assert_eq!(entry.data, Some(json!([{"id": 1}])));
    }

    #[test]
    fn retagging_replaces_old_tags() {
        let now = Instant::now();
        let mut cache = QueryCache::new();
        let (key, args) = tasks_key(1);
        let gen = cache.ensure(&key, &GET_TASKS, &args, now);
        cache.store(&key, json!([{"id": 1}]), vec![Tag::id(TagKind::Tasks, 1)], gen, now);
        cache.store(&key, json!([{"id": 2}]), vec![Tag::id(TagKind::Tasks, 2)], gen, now);
        cache.invalidate(&[Tag::id(TagKind::Tasks, 1)]);
        assert!(cache.get(&key).unwrap().is_fresh());
    }

    #[test]
    fn errors_are_never_fresh() {
        let now = Instant::now();
        let mut cache = QueryCache::new();
        let args = Value::Null;
        let key = QueryKey::new(GET_PROJECTS.name, &args);
        cache.ensure(&key, &GET_PROJECTS, &args, now);
        cache.store_error(&key, ApiError::Transport("down".into()), vec![], now);
        let entry = cache.get(&key).unwrap();
        assert!(!entry.is_fresh());
        assert_eq!(entry.error, Some(ApiError::Transport("down".into())));
    }

    #[test]
    fn eviction_skips_watched_entries() {
        let now = Instant::now();
        let keep = Duration::from_secs(60);
        let mut cache = QueryCache::new();
        let (watched, a1) = tasks_key(1);
        let (idle, a2) = tasks_key(2);
        cache.subscribe(&watched, &GET_TASKS, &a1, now);
        cache.subscribe(&idle, &GET_TASKS, &a2, now);
        cache.unsubscribe(&idle, now);

        assert_eq!(cache.evict_unused(now + Duration::from_secs(30), keep), 0);
        assert_eq!(cache.evict_unused(now + Duration::from_secs(61), keep), 1);
        assert!(cache.get(&idle).is_none());
        assert!(cache.get(&watched).is_some());
        assert_eq!(cache.watched_keys(), vec![watched]);
    }

    #[test]
    fn results_for_evicted_entries_leave_no_tags_behind() {
        let now = Instant::now();
        let keep = Duration::from_secs(60);
        let mut cache = QueryCache::new();
        let (key, args) = tasks_key(1);
        let gen = cache.ensure(&key, &GET_TASKS, &args, now);
        let later = now + Duration::from_secs(61);
        assert_eq!(cache.evict_unused(later, keep), 1);

        assert!(!cache.store(&key, json!([{"id": 1}]), vec![Tag::id(TagKind::Tasks, 1)], gen, later));
        cache.store_error(&key, ApiError::Transport("down".into()), vec![Tag::all(TagKind::Tasks)], later);
        assert!(cache.get(&key).is_none());
        assert!(cache.tag_index.is_empty());
        assert!(cache.invalidate(&[Tag::all(TagKind::Tasks)]).is_empty());
    }

    #[test]
    fn touched_entries_survive_eviction() {
        let now = Instant::now();
        let keep = Duration::from_secs(60);
        let mut cache = QueryCache::new();
        let (key, args) = tasks_key(1);
        cache.ensure(&key, &GET_TASKS, &args, now);
        cache.touch(&key, now + Duration::from_secs(50));
        assert_eq!(cache.evict_unused(now + Duration::from_secs(61), keep), 0);
        assert!(cache.get(&key).is_some());
    }
}
