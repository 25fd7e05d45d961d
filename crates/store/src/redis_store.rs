//! Redis-backed [`KvStore`].
//!
//! Every call is bounded by the configured operation timeout and surfaces
//! connection trouble as [`StoreError::Unavailable`] / [`StoreError::Timeout`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, RedisResult, Script};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::kv::KvStore;

/// Redis scripts for atomic compound operations
mod scripts {
    use redis::Script;

    /// Remove every occurrence of ARGV[1] from list KEYS[1], then append it.
    pub fn move_to_tail() -> Script {
        Script::new(
            r#"
            redis.call('LREM', KEYS[1], 0, ARGV[1])
            return redis.call('RPUSH', KEYS[1], ARGV[1])
            "#,
        )
    }

    /// Compare-and-swap on a string key. ARGV[1] is '1' when KEYS[1] must
    /// hold ARGV[2], '0' when it must be absent; ARGV[3] is the new value.
    pub fn compare_and_swap() -> Script {
        Script::new(
            r#"
            local current = redis.call('GET', KEYS[1])
            if ARGV[1] == '1' then
                if current ~= ARGV[2] then
                    return 0
                end
            elseif current then
                return 0
            end
            redis.call('SET', KEYS[1], ARGV[3])
            return 1
            "#,
        )
    }
}

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    op_timeout: Duration,
    move_to_tail: Script,
    compare_and_swap: Script,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("connection", &"ConnectionManager")
            .field("op_timeout", &self.op_timeout)
            .finish()
    }
}

impl RedisStore {
    pub async fn connect(url: &str, op_timeout: Duration) -> StoreResult<Self> {
        info!(op_timeout_ms = op_timeout.as_millis() as u64, "Connecting to Redis store");

        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid store url: {e}")))?;

        let conn = tokio::time::timeout(op_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Timeout {
                op: "CONNECT",
                after: op_timeout,
            })?
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!("Connected to Redis store");

        Ok(Self {
            conn,
            op_timeout,
            move_to_tail: scripts::move_to_tail(),
            compare_and_swap: scripts::compare_and_swap(),
        })
    }

    async fn run<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = RedisResult<T>>,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(classify(op, err)),
            Err(_) => Err(StoreError::Timeout {
                op,
                after: self.op_timeout,
            }),
        }
    }
}

fn classify(op: &'static str, err: RedisError) -> StoreError {
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        StoreError::Unavailable(format!("{op}: {err}"))
    } else {
        StoreError::Command {
            op,
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        debug!(key, ttl = ?ttl, "Store SET");
        let mut conn = self.conn.clone();
        match ttl {
            // SETEX rejects 0; sub-second TTLs round up to one second.
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                self.run("SETEX", async move {
                    conn.set_ex::<_, _, ()>(key, value, secs).await
                })
                .await
            }
            None => {
                self.run("SET", async move { conn.set::<_, _, ()>(key, value).await })
                    .await
            }
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        self.run("GET", async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        debug!(key, "Store DEL");
        let mut conn = self.conn.clone();
        let removed = self
            .run("DEL", async move { conn.del::<_, u64>(key).await })
            .await?;
        Ok(removed > 0)
    }

    async fn list_append(&self, key: &str, value: &str) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        self.run("RPUSH", async move { conn.rpush::<_, _, u64>(key, value).await })
            .await
    }

    async fn list_remove_value(&self, key: &str, value: &str) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        self.run("LREM", async move {
            conn.lrem::<_, _, u64>(key, 0, value).await
        })
        .await
    }

    async fn list_move_to_tail(&self, key: &str, value: &str) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        let script = &self.move_to_tail;
        self.run("MOVE_TO_TAIL", async move {
            script
                .key(key)
                .arg(value)
                .invoke_async::<u64>(&mut conn)
                .await
        })
        .await
    }

    async fn list_pop_front(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        self.run("LPOP", async move {
            redis::cmd("LPOP")
                .arg(key)
                .query_async::<Option<String>>(&mut conn)
                .await
        })
        .await
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        self.run("LRANGE", async move {
            redis::cmd("LRANGE")
                .arg(key)
                .arg(start)
                .arg(stop)
                .query_async::<Vec<String>>(&mut conn)
                .await
        })
        .await
    }

    async fn list_length(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        self.run("LLEN", async move { conn.llen::<_, u64>(key).await })
            .await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let script = &self.compare_and_swap;
        let (guard, expected) = match expected {
            Some(expected) => ("1", expected),
            None => ("0", ""),
        };
        let swapped = self
            .run("CAS", async move {
                script
                    .key(key)
                    .arg(guard)
                    .arg(expected)
                    .arg(value)
                    .invoke_async::<i64>(&mut conn)
                    .await
            })
            .await?;
        Ok(swapped == 1)
    }

    async fn increment(&self, key: &str) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        self.run("INCR", async move { conn.incr::<_, _, i64>(key, 1).await })
            .await
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let added = self
            .run("SADD", async move { conn.sadd::<_, _, u64>(key, member).await })
            .await?;
        Ok(added > 0)
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut members = self
            .run("SMEMBERS", async move {
                conn.smembers::<_, Vec<String>>(key).await
            })
            .await?;
        members.sort();
        Ok(members)
    }

    async fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>> {
        debug!(pattern, "Store KEYS");
        let mut conn = self.conn.clone();
        let mut keys = self
            .run("KEYS", async move { conn.keys::<_, Vec<String>>(pattern).await })
            .await?;
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        self.run("PING", async move {
            redis::cmd("PING").query_async::<String>(&mut conn).await
        })
        .await
        .map(|_| ())
    }
}
