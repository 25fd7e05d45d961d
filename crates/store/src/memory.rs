//! In-process [`KvStore`] backend.
//!
//! Every operation runs inside one critical section, so compound primitives
//! such as [`KvStore::list_move_to_tail`] are atomic here just as the Lua
//! script makes them atomic in Redis. Expiry is lazy and uses
//! `tokio::time::Instant`, which lets tests drive TTLs with a paused clock.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{StoreError, StoreResult};
use crate::kv::KvStore;

#[derive(Debug)]
enum Value {
    Str(String),
    List(VecDeque<String>),
    Set(BTreeSet<String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

type Entries = HashMap<String, Entry>;

/// Single-process store. State is lost on restart and is not shared between
/// instances.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: while unavailable every call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Entries>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(entries)
    }
}

fn wrong_type(op: &'static str, key: &str, found: &Value) -> StoreError {
    StoreError::Command {
        op,
        message: format!("key {key} holds a {}", found.kind()),
    }
}

fn list_mut<'a>(
    entries: &'a mut Entries,
    op: &'static str,
    key: &str,
) -> StoreResult<&'a mut VecDeque<String>> {
    let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
        value: Value::List(VecDeque::new()),
        expires_at: None,
    });
    match &mut entry.value {
        Value::List(list) => Ok(list),
        other => Err(wrong_type(op, key, other)),
    }
}

fn list_ref<'a>(
    entries: &'a Entries,
    op: &'static str,
    key: &str,
) -> StoreResult<Option<&'a VecDeque<String>>> {
    match entries.get(key).map(|entry| &entry.value) {
        None => Ok(None),
        Some(Value::List(list)) => Ok(Some(list)),
        Some(other) => Err(wrong_type(op, key, other)),
    }
}

/// Drop empty lists and sets, matching Redis where an emptied collection
/// ceases to exist.
fn drop_if_empty(entries: &mut Entries, key: &str) {
    let empty = match entries.get(key).map(|entry| &entry.value) {
        Some(Value::List(list)) => list.is_empty(),
        Some(Value::Set(set)) => set.is_empty(),
        _ => false,
    };
    if empty {
        entries.remove(key);
    }
}

/// Resolve Redis-style inclusive indices against a list of `len` items.
fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Glob matching supporting `*` and `?`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            resume = t;
            p += 1;
        } else if let Some(star_at) = star {
            p = star_at + 1;
            resume += 1;
            t = resume;
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.lock()?;
        match entries.get(key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(Value::Str(value)) => Ok(Some(value.clone())),
            Some(other) => Err(wrong_type("GET", key, other)),
        }
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    async fn list_append(&self, key: &str, value: &str) -> StoreResult<u64> {
        let mut entries = self.lock()?;
        let list = list_mut(&mut entries, "RPUSH", key)?;
        list.push_back(value.to_string());
        Ok(list.len() as u64)
    }

    async fn list_remove_value(&self, key: &str, value: &str) -> StoreResult<u64> {
        let mut entries = self.lock()?;
        if list_ref(&entries, "LREM", key)?.is_none() {
            return Ok(0);
        }
        let list = list_mut(&mut entries, "LREM", key)?;
        let before = list.len();
        list.retain(|item| item != value);
        let removed = (before - list.len()) as u64;
        drop_if_empty(&mut entries, key);
        Ok(removed)
    }

    async fn list_move_to_tail(&self, key: &str, value: &str) -> StoreResult<u64> {
        let mut entries = self.lock()?;
        let list = list_mut(&mut entries, "MOVE_TO_TAIL", key)?;
        list.retain(|item| item != value);
        list.push_back(value.to_string());
        Ok(list.len() as u64)
    }

    async fn list_pop_front(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.lock()?;
        if list_ref(&entries, "LPOP", key)?.is_none() {
            return Ok(None);
        }
        let popped = list_mut(&mut entries, "LPOP", key)?.pop_front();
        drop_if_empty(&mut entries, key);
        Ok(popped)
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>> {
        let entries = self.lock()?;
        let Some(list) = list_ref(&entries, "LRANGE", key)? else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn list_length(&self, key: &str) -> StoreResult<u64> {
        let entries = self.lock()?;
        Ok(list_ref(&entries, "LLEN", key)?.map_or(0, |list| list.len() as u64))
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> StoreResult<bool> {
        let mut entries = self.lock()?;
        let current = match entries.get(key).map(|entry| &entry.value) {
            None => None,
            Some(Value::Str(current)) => Some(current.as_str()),
            Some(other) => return Err(wrong_type("CAS", key, other)),
        };
        if current != expected {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: None,
            },
        );
        Ok(true)
    }

    async fn increment(&self, key: &str) -> StoreResult<i64> {
        let mut entries = self.lock()?;
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Str("0".to_string()),
            expires_at: None,
        });
        let raw = match &mut entry.value {
            Value::Str(raw) => raw,
            other => return Err(wrong_type("INCR", key, other)),
        };
        let current: i64 = raw.parse().map_err(|_| StoreError::Command {
            op: "INCR",
            message: format!("value of {key} is not an integer"),
        })?;
        let next = current + 1;
        *raw = next.to_string();
        Ok(next)
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut entries = self.lock()?;
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Set(BTreeSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            other => Err(wrong_type("SADD", key, other)),
        }
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let entries = self.lock()?;
        match entries.get(key).map(|entry| &entry.value) {
            None => Ok(Vec::new()),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(other) => Err(wrong_type("SMEMBERS", key, other)),
        }
    }

    async fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let entries = self.lock()?;
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }
}
