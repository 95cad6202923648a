//! Link Records and Access Tracking
//!
//! A [`Record`] is what the registry stores per alias. Next to the target and
//! its expiry deadline it carries an [`AccessRecorder`]: a monotonically
//! increasing hit counter plus a bounded window of the most recent access
//! times, used for analytics only.

use crate::config::MAX_TTL_SECS;
use std::collections::VecDeque;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// `now + ttl` with the TTL capped at [`MAX_TTL_SECS`].
///
/// Returns the capped TTL alongside the deadline. Never panics: if even the
/// capped deadline is unrepresentable the TTL shrinks to what fits.
fn arm(ttl: Duration, now: Instant) -> (Duration, Instant) {
    let mut ttl = ttl.min(Duration::from_secs(MAX_TTL_SECS));
    loop {
        if let Some(deadline) = now.checked_add(ttl) {
            return (ttl, deadline);
        }
        ttl /= 2;
    }
}

/// Bounded history of recent accesses plus a total hit counter.
///
/// When the window is full the oldest timestamp is dropped first.
#[derive(Debug, Clone)]
pub struct AccessRecorder {
    count: u64,
    recent: VecDeque<SystemTime>,
    capacity: usize,
}

impl AccessRecorder {
    /// Creates an empty recorder keeping at most `capacity` timestamps.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            count: 0,
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records one access at `at`.
    pub fn record(&mut self, at: SystemTime) {
        self.count += 1;
        if self.recent.len() >= self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(at);
    }

    /// Total number of recorded accesses.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Recent access times, oldest first.
    pub fn recent(&self) -> Vec<SystemTime> {
        self.recent.iter().copied().collect()
    }
}

/// A single alias → target binding.
#[derive(Debug, Clone)]
pub struct Record {
    /// The string the alias resolves to
    pub target: String,
    /// Wall-clock creation time
    pub created_at: SystemTime,
    /// Lifetime granted at the last (re)arm
    pub ttl: Duration,
    /// Monotonic deadline, last arm time + ttl
    pub expires_at: Instant,
    /// Hit counter and recent access window
    pub accesses: AccessRecorder,
}

impl Record {
    /// Creates a fresh record armed at `now`.
    pub fn new(target: String, ttl: Duration, now: Instant, history_size: usize) -> Self {
        let (ttl, expires_at) = arm(ttl, now);
        Self {
            target,
            created_at: SystemTime::now(),
            ttl,
            expires_at,
            accesses: AccessRecorder::new(history_size),
        }
    }

    /// Re-arms the record: `expires_at` becomes `now + ttl`.
    pub fn rearm(&mut self, ttl: Duration, now: Instant) {
        let (ttl, expires_at) = arm(ttl, now);
        self.ttl = ttl;
        self.expires_at = expires_at;
    }

    /// Lazy-expiry check used by reads: strictly past the deadline.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    /// Time left before expiry, zero once due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

/// Read-only analytics view of a link, as returned by `stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStats {
    pub alias: String,
    pub target: String,
    pub access_count: u64,
    /// Oldest first
    pub recent_accesses: Vec<SystemTime>,
}

/// Point-in-time copy of a live link, as returned by `list_active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub alias: String,
    pub target: String,
    pub access_count: u64,
    pub recent_accesses: Vec<SystemTime>,
    pub ttl: Duration,
    pub created_at: SystemTime,
    /// Wall-clock projection of the monotonic deadline
    pub expires_at: SystemTime,
    pub time_remaining: Duration,
}

impl LinkSnapshot {
    pub(crate) fn from_record(alias: &str, record: &Record, now: Instant) -> Self {
        let time_remaining = record.remaining(now);
        Self {
            alias: alias.to_string(),
            target: record.target.clone(),
            access_count: record.accesses.count(),
            recent_accesses: record.accesses.recent(),
            ttl: record.ttl,
            created_at: record.created_at,
            expires_at: SystemTime::now()
                .checked_add(time_remaining)
                .unwrap_or_else(SystemTime::now),
            time_remaining,
        }
    }
}

/// Milliseconds since the unix epoch, zero for times before it.
pub fn unix_millis(at: SystemTime) -> i64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
