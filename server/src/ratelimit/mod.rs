//! Sliding-window admission control
//!
//! Bounds the number of accepted requests per client key within the last
//! `window`. Timestamps older than the window are pruned lazily on every
//! check. The log is split across shards so keys in different shards never
//! contend; calls on one key are serialized by its shard mutex.
//!
//! Keys come from [`client_key`]. The `client` request param is trusted as
//! given: it exists for a gateway that forwards end-user addresses, and any
//! local process may set it. The socket is owner-only, so only processes of
//! the daemon's own user can pick their bucket this way. Stale keys of such
//! callers are reclaimed by [`RateLimiter::sweep`].

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::config::RateLimitConfig;

const SHARDS: usize = 16;

/// Bucket for requests that carry no usable identity
pub const UNKNOWN_CLIENT: &str = "unknown";

type Log = HashMap<String, VecDeque<Instant>>;

pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    shards: Vec<Mutex<Log>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            window,
            max_requests,
            shards: (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Admit or reject one request for `key`
    pub fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now())
    }

    /// Same as [`is_allowed`](Self::is_allowed) with an explicit clock reading
    pub fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        let mut shard = self.shard(key);
        let stamps = shard.entry(key.to_string()).or_default();

        prune(stamps, now, self.window);

        if stamps.len() < self.max_requests {
            stamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// Drop keys with no activity inside the window. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut log = lock(shard);
            let before = log.len();
            log.retain(|_, stamps| {
                prune(stamps, now, self.window);
                !stamps.is_empty()
            });
            removed += before - log.len();
        }
        if removed > 0 {
            debug!("Rate limiter swept {} idle keys", removed);
        }
        removed
    }

    /// Number of keys currently holding a log
    pub fn tracked_keys(&self) -> usize {
        self.shards.iter().map(|s| lock(s).len()).sum()
    }

    fn shard(&self, key: &str) -> MutexGuard<'_, Log> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.shards.len();
        lock(&self.shards[idx])
    }
}

/// A poisoned shard still holds a consistent log (mutations are single
/// push/pop calls), so recover the guard instead of failing admission.
fn lock(shard: &Mutex<Log>) -> MutexGuard<'_, Log> {
    shard.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = stamps.front() {
        if now.saturating_duration_since(oldest) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}

/// Derive the admission key for a request.
///
/// An explicit non-empty `client` param wins (a gateway forwarding the
/// end-user address), then the peer process id, then [`UNKNOWN_CLIENT`].
/// `client` is not authenticated; callers that set it share no bucket with
/// their own `pid:` key.
pub fn client_key(params: &Value, peer_pid: Option<i32>) -> String {
    if let Some(client) = params.get("client").and_then(|v| v.as_str()) {
        let client = client.trim();
        if !client.is_empty() {
            return client.to_string();
        }
    }
    match peer_pid {
        Some(pid) => format!("pid:{}", pid),
        None => UNKNOWN_CLIENT.to_string(),
    }
}
