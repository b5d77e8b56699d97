use std::time::{Duration, Instant};

use dashmap::DashMap;

const MAX_FAILURES: u32 = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);
const PRUNE_THRESHOLD: usize = 10_000;

/// Per-username login brute force limiter: 5 failures per 15 minutes.
#[derive(Default)]
pub struct LoginRateLimiter {
    /// username -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a login attempt is allowed. Returns the seconds to wait when it is not.
    /// Does NOT increment the counter; call `record_failure()` on a rejected attempt.
    pub fn check(&self, username: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(&key(username)) else {
            return Ok(());
        };
        let (count, start) = *entry.value();

        if now.duration_since(start) > WINDOW || count < MAX_FAILURES {
            return Ok(());
        }

        let elapsed = now.duration_since(start).as_secs();
        Err(WINDOW.as_secs().saturating_sub(elapsed))
    }

    pub fn record_failure(&self, username: &str) {
        let now = Instant::now();

        if self.entries.len() >= PRUNE_THRESHOLD {
            self.entries
                .retain(|_, (_, start)| now.duration_since(*start) <= WINDOW);
        }

        let mut entry = self.entries.entry(key(username)).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }
}

fn key(username: &str) -> String {
    username.trim().to_lowercase()
}
