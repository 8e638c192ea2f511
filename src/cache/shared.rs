// src/cache/shared.rs
use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

const KEY_PREFIX: &str = "jobscout:";
const TAG_PREFIX: &str = "jobscout:tag:";

/// Shared cache layer backed by Redis. Every method returns a plain
/// `Result`; the tiered facade logs failures and degrades to the local
/// layer rather than surfacing them.
pub struct SharedCache {
    manager: SharedConnectionManager,
}

impl SharedCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).context("failed to construct Redis client")?;
        let manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    fn entry_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    fn tag_key(tag: &str) -> String {
        format!("{}{}", TAG_PREFIX, tag)
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.manager.lock().await;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::entry_key(key))
            .query_async(&mut *conn)
            .await
            .context("Redis GET failed")?;

        match raw {
            Some(payload) => {
                let value = serde_json::from_str(&payload)
                    .context("cached payload is not valid JSON")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, value: &Value, ttl: Duration, tags: &[String]) -> Result<()> {
        let entry_key = Self::entry_key(key);
        let mut conn = self.manager.lock().await;

        if ttl.is_zero() {
            redis::cmd("DEL")
                .arg(&entry_key)
                .query_async::<_, ()>(&mut *conn)
                .await
                .context("Redis DEL failed")?;
            return Ok(());
        }

        let payload = serde_json::to_string(value).context("failed to serialize cache value")?;
        redis::cmd("SET")
            .arg(&entry_key)
            .arg(payload)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut *conn)
            .await
            .context("Redis SET failed")?;

        for tag in tags {
            redis::cmd("SADD")
                .arg(Self::tag_key(tag))
                .arg(&entry_key)
                .query_async::<_, ()>(&mut *conn)
                .await
                .context("Redis SADD failed")?;
        }

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.lock().await;
        redis::cmd("DEL")
            .arg(Self::entry_key(key))
            .query_async::<_, ()>(&mut *conn)
            .await
            .context("Redis DEL failed")?;
        Ok(())
    }

    pub async fn invalidate_by_tag(&self, tag: &str) -> Result<()> {
        let tag_key = Self::tag_key(tag);
        let mut conn = self.manager.lock().await;

        let members: Vec<String> = redis::cmd("SMEMBERS")
            .arg(&tag_key)
            .query_async(&mut *conn)
            .await
            .context("Redis SMEMBERS failed")?;

        for member in &members {
            redis::cmd("DEL")
                .arg(member)
                .query_async::<_, ()>(&mut *conn)
                .await
                .context("Redis DEL failed")?;
        }

        redis::cmd("DEL")
            .arg(&tag_key)
            .query_async::<_, ()>(&mut *conn)
            .await
            .context("Redis DEL failed")?;

        Ok(())
    }
}
