use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use axum::http::HeaderMap;

const FORWARDED_FOR: &str = "x-forwarded-for";
const ANONYMOUS: &str = "anonymous";
const OVERFLOW: &str = "overflow";
const MAX_TRACKED_CLIENTS: usize = 4096;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refilled(&self, now: Instant, per_second: f64) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        (self.tokens + elapsed * per_second).min(per_second)
    }
}

/// Per-client token bucket. Capacity and refill rate are both the configured
/// requests per second.
///
/// Buckets that have refilled to capacity are dropped, since a fresh bucket
/// behaves the same. Once `max_clients` buckets are live, unseen clients share
/// a single overflow bucket.
#[derive(Debug)]
pub struct AdmissionLimiter {
    per_second: f64,
    max_clients: usize,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl AdmissionLimiter {
    pub fn per_second(limit: u32) -> Self {
        Self::with_capacity(limit, MAX_TRACKED_CLIENTS)
    }

    pub fn with_capacity(limit: u32, max_clients: usize) -> Self {
        Self {
            per_second: f64::from(limit.max(1)),
            max_clients: max_clients.max(1),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn allow(&self, client: &str) -> bool {
        self.allow_at(client, Instant::now())
    }

    fn allow_at(&self, client: &str, now: Instant) -> bool {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let per_second = self.per_second;
        buckets.retain(|key, bucket| key == client || bucket.refilled(now, per_second) < per_second);

        let key = if buckets.contains_key(client) || buckets.len() < self.max_clients {
            client
        } else {
            OVERFLOW
        };
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: per_second,
            last_refill: now,
        });

        bucket.tokens = bucket.refilled(now, per_second);
        bucket.last_refill = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// First `X-Forwarded-For` hop, or a shared key when the header is absent.
///
/// The header is client-supplied, so the key is only trustworthy behind a
/// proxy that overwrites it.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}
