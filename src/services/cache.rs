//! Read-through response cache backed by Redis
//!
//! List and detail responses for the cached endpoints are stored verbatim
//! as JSON under a `cache:` namespace. Every write to a resource drops the
//! whole prefix for that resource, so readers never see stale rows. Redis
//! being down is never fatal: lookups degrade to a miss and writes are
//! skipped, with a warning.

use redis::{AsyncCommands, Client};
use serde_json::Value;
use tracing::warn;

use crate::error::{AppError, AppResult};

const NAMESPACE: &str = "cache";

/// Cache key for one endpoint hit. The raw query string is kept as-is,
/// so `?titre=a&page=2` and `?page=2&titre=a` are distinct entries.
pub fn build_key(resource: &str, id: Option<i32>, raw_query: &str) -> String {
    let mut key = match id {
        Some(id) => format!("{}:{}:{}", NAMESPACE, resource, id),
        None => format!("{}:{}", NAMESPACE, resource),
    };
    if !raw_query.is_empty() {
        key.push('?');
        key.push_str(raw_query);
    }
    key
}

#[derive(Clone)]
pub struct CacheService {
    client: Client,
    ttl_seconds: u64,
}

impl CacheService {
    /// Create the cache service and check the connection once at startup
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            client,
            ttl_seconds,
        })
    }

    /// Fetch a cached response. Any Redis failure is a miss.
    pub async fn get_json(&self, key: &str) -> Option<Value> {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("cache lookup skipped, Redis unavailable: {}", e);
                return None;
            }
        };
        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("cache lookup failed for {}: {}", key, e);
                return None;
            }
        };
        raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("dropping unreadable cache entry {}: {}", key, e);
                None
            }
        })
    }

    /// Store a response under the key with the configured TTL
    pub async fn set_json(&self, key: &str, value: &Value) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("cache store skipped for {}: {}", key, e);
                return;
            }
        };
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("cache store skipped, Redis unavailable: {}", e);
                return;
            }
        };
        if let Err(e) = conn.set_ex::<_, _, ()>(key, raw, self.ttl_seconds).await {
            warn!("cache store failed for {}: {}", key, e);
        }
    }

    /// Drop every entry for one resource, list and detail alike. Called on
    /// every successful write to that resource.
    pub async fn invalidate_resource(&self, resource: &str) {
        let pattern = format!("{}:{}*", NAMESPACE, resource);
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("cache invalidation skipped, Redis unavailable: {}", e);
                return;
            }
        };

        let mut cursor: u64 = 0;
        loop {
            let scan: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;
            let (next, keys) = match scan {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("cache invalidation failed for {}: {}", pattern, e);
                    return;
                }
            };
            if !keys.is_empty() {
                if let Err(e) = conn.del::<_, ()>(keys).await {
                    warn!("cache invalidation failed for {}: {}", pattern, e);
                    return;
                }
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_key_keeps_the_raw_query() {
        assert_eq!(build_key("livres", None, ""), "cache:livres");
        assert_eq!(
            build_key("livres", None, "titre=1&page=2"),
            "cache:livres?titre=1&page=2"
        );
    }

    #[test]
    fn query_order_makes_distinct_keys() {
        let a = build_key("emprunts", None, "page=2&titre=a");
        let b = build_key("emprunts", None, "titre=a&page=2");
        assert_ne!(a, b);
    }

    #[test]
    fn detail_key_includes_the_id() {
        assert_eq!(build_key("livres", Some(5), ""), "cache:livres:5");
    }
}
