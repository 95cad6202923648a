//! Link Registry with TTL-Ordered Expiry
//!
//! This module implements the core of FlashLink: an in-memory registry that
//! maps short aliases to target strings. Every link carries a time-to-live.
//!
//! ## Structures
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Registry                             │
//! │                 RwLock<RegistryState>                        │
//! │  ┌────────────────┐ ┌────────────────┐ ┌──────────────────┐  │
//! │  │  records       │ │  reverse       │ │  expiry          │  │
//! │  │  alias->Record │ │  target->{alias│ │  (deadline,alias)│  │
//! │  └────────────────┘ └────────────────┘ └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ sweep_expired()
//!                     ┌─────────┴─────────┐
//!                     │   ExpirySweeper   │
//!                     └───────────────────┘
//! ```
//!
//! The three structures always change together under the write lock, in the
//! order records → reverse index → expiry index. There is exactly one removal
//! routine ([`RegistryState::remove`]); explicit deletes, lazy expiry on read
//! and the background sweep all go through it.
//!
//! ## Expiry
//!
//! - **Lazy**: `resolve`, `stats` and `update` treat a link whose deadline has
//!   passed as already gone and remove it on the spot.
//! - **Active**: the sweeper pops due entries off the head of the expiry index.
//!
//! A caller cannot tell the two apart: both report [`RegistryError::NotFound`].

use crate::config::{RegistryConfig, MAX_TTL_SECS};
use crate::storage::alias::{alias_space, in_alias_space, unique_alias};
use crate::storage::expiry::ExpirySweeper;
use crate::storage::expiry_index::ExpiryIndex;
use crate::storage::record::{LinkSnapshot, LinkStats, Record};
use crate::storage::reverse_index::ReverseIndex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;
use tracing::{debug, info};

/// Outcomes other than success.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The alias does not exist or has expired
    #[error("alias does not exist or has expired")]
    NotFound,

    /// The alias is already bound to a live link
    #[error("alias already exists: {0}")]
    AliasConflict(String),

    /// Every generated alias of the configured length is in use
    #[error("no free alias of length {0}")]
    AliasSpaceExhausted(usize),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Counters and sizes reported by [`Registry::stats_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub links: u64,
    pub targets: u64,
    pub queued: u64,
    pub created: u64,
    pub resolved: u64,
    pub misses: u64,
    pub deleted: u64,
    pub expired: u64,
}

/// Everything guarded by the registry lock.
#[derive(Debug, Default)]
struct RegistryState {
    records: HashMap<String, Record>,
    reverse: ReverseIndex,
    expiry: ExpiryIndex,
}

impl RegistryState {
    fn insert(&mut self, alias: &str, record: Record) {
        let expires_at = record.expires_at;
        let target = record.target.clone();
        self.records.insert(alias.to_string(), record);
        self.reverse.insert(&target, alias);
        self.expiry.insert(alias, expires_at);
    }

    /// The single removal routine.
    fn remove(&mut self, alias: &str) -> Option<Record> {
        let record = self.records.remove(alias)?;
        self.reverse.remove(&record.target, alias);
        self.expiry.remove(alias);
        Some(record)
    }

    /// Removes `alias` if its deadline has passed. Returns true if it did.
    fn purge_if_expired(&mut self, alias: &str, now: Instant) -> bool {
        let expired = self
            .records
            .get(alias)
            .map(|r| r.is_expired_at(now))
            .unwrap_or(false);
        if expired {
            self.remove(alias);
        }
        expired
    }

    /// Pops every due entry off the expiry index and removes its record.
    fn sweep(&mut self, now: Instant) -> u64 {
        let mut removed = 0u64;

        while let Some(head) = self.expiry.peek_min() {
            if head.expires_at > now {
                break;
            }
            self.expiry.pop_min();

            match self.records.get(&head.alias).map(|r| r.expires_at) {
                Some(deadline) if deadline <= now => {
                    self.remove(&head.alias);
                    removed += 1;
                }
                // Renewed after being queued; keep it indexed at its real deadline
                Some(deadline) => self.expiry.insert(&head.alias, deadline),
                None => {}
            }
        }

        removed
    }

    /// Whether a generated alias of length `len` can still be found.
    fn has_free_alias(&self, len: usize) -> bool {
        match alias_space(len) {
            Some(space) if self.records.len() as u64 >= space => {
                let used = self
                    .records
                    .keys()
                    .filter(|alias| in_alias_space(alias, len))
                    .count();
                (used as u64) < space
            }
            _ => true,
        }
    }

    fn clear(&mut self) {
        self.records.clear();
        self.reverse.clear();
        self.expiry.clear();
    }
}

/// The link registry.
///
/// Designed to be wrapped in an `Arc` and shared by every connection. All
/// operations are thread-safe; writers are serialized, readers run in
/// parallel.
///
/// # Example
///
/// ```
/// use flashlink::{Registry, RegistryConfig, RegistryError};
///
/// let registry = Registry::new(RegistryConfig::default());
///
/// let alias = registry.create("https://example.com", None, Some(60)).unwrap();
/// assert_eq!(registry.resolve(&alias).unwrap(), "https://example.com");
///
/// assert!(registry.delete(&alias));
/// assert_eq!(registry.resolve(&alias), Err(RegistryError::NotFound));
/// ```
pub struct Registry {
    state: RwLock<RegistryState>,
    config: RegistryConfig,

    /// Background sweeper, present when started through [`Registry::start`]
    sweeper: Mutex<Option<ExpirySweeper>>,

    created_count: AtomicU64,
    resolved_count: AtomicU64,
    miss_count: AtomicU64,
    deleted_count: AtomicU64,
    expired_count: AtomicU64,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("links", &self.len())
            .field("config", &self.config)
            .field("created_count", &self.created_count.load(Ordering::Relaxed))
            .field("expired_count", &self.expired_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl Registry {
    /// Creates a registry without a background sweeper.
    ///
    /// Expired links are still removed lazily on access; call
    /// [`Registry::sweep_expired`] or attach an [`ExpirySweeper`] to reclaim
    /// links nobody reads again.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            config,
            sweeper: Mutex::new(None),
            created_count: AtomicU64::new(0),
            resolved_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            deleted_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Creates a shared registry and starts its background sweeper.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start(config: RegistryConfig) -> Arc<Self> {
        let registry = Arc::new(Self::new(config));
        let sweeper = ExpirySweeper::start(&registry, registry.config.sweep_interval);
        *registry
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(sweeper);
        registry
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Absent or zero seconds fall back to the configured default.
    fn ttl_or_default(&self, ttl_secs: Option<u64>) -> Duration {
        match ttl_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs.min(MAX_TTL_SECS)),
            _ => self.config.default_ttl,
        }
    }

    /// Creates a link to `target`.
    ///
    /// With `alias` given, fails with [`RegistryError::AliasConflict`] if a
    /// live link already uses it. Without one, random aliases are drawn until
    /// a free one turns up. If the whole generated space is taken even after
    /// sweeping, fails with [`RegistryError::AliasSpaceExhausted`].
    ///
    /// # Returns
    ///
    /// The alias the link was stored under.
    pub fn create(
        &self,
        target: &str,
        alias: Option<&str>,
        ttl_secs: Option<u64>,
    ) -> RegistryResult<String> {
        let ttl = self.ttl_or_default(ttl_secs);
        let now = Instant::now();
        let mut state = self.write();

        let alias = match alias.filter(|a| !a.is_empty()) {
            Some(requested) => {
                if state.records.contains_key(requested) {
                    if !state.purge_if_expired(requested, now) {
                        return Err(RegistryError::AliasConflict(requested.to_string()));
                    }
                    self.expired_count.fetch_add(1, Ordering::Relaxed);
                }
                requested.to_string()
            }
            None => {
                let len = self.config.alias_length;
                if !state.has_free_alias(len) {
                    let swept = state.sweep(now);
                    self.expired_count.fetch_add(swept, Ordering::Relaxed);
                    if !state.has_free_alias(len) {
                        return Err(RegistryError::AliasSpaceExhausted(len));
                    }
                }
                let mut rng = rand::thread_rng();
                unique_alias(&mut rng, len, |candidate| {
                    state.records.contains_key(candidate)
                })
            }
        };

        let record = Record::new(target.to_string(), ttl, now, self.config.history_size);
        state.insert(&alias, record);
        self.created_count.fetch_add(1, Ordering::Relaxed);

        debug!(alias = %alias, ttl_secs = ttl.as_secs(), "Link created");
        Ok(alias)
    }

    /// Resolves `alias` to its target and records the access.
    pub fn resolve(&self, alias: &str) -> RegistryResult<String> {
        let now = Instant::now();
        let mut state = self.write();

        if state.purge_if_expired(alias, now) {
            self.expired_count.fetch_add(1, Ordering::Relaxed);
            debug!(alias = %alias, "Link expired on access");
        }

        match state.records.get_mut(alias) {
            Some(record) => {
                record.accesses.record(SystemTime::now());
                self.resolved_count.fetch_add(1, Ordering::Relaxed);
                Ok(record.target.clone())
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Err(RegistryError::NotFound)
            }
        }
    }

    /// Returns analytics for `alias` without counting as an access.
    pub fn stats(&self, alias: &str) -> RegistryResult<LinkStats> {
        let now = Instant::now();

        // Read lock first: the common case is a live link
        {
            let state = self.read();
            match state.records.get(alias) {
                Some(record) if !record.is_expired_at(now) => {
                    return Ok(LinkStats {
                        alias: alias.to_string(),
                        target: record.target.clone(),
                        access_count: record.accesses.count(),
                        recent_accesses: record.accesses.recent(),
                    });
                }
                Some(_) => {}
                None => return Err(RegistryError::NotFound),
            }
        }

        // Expired - need the write lock to remove it
        let mut state = self.write();
        if state.purge_if_expired(alias, now) {
            self.expired_count.fetch_add(1, Ordering::Relaxed);
            debug!(alias = %alias, "Link expired on access");
            return Err(RegistryError::NotFound);
        }

        // Race: renewed between the two locks
        state
            .records
            .get(alias)
            .map(|record| LinkStats {
                alias: alias.to_string(),
                target: record.target.clone(),
                access_count: record.accesses.count(),
                recent_accesses: record.accesses.recent(),
            })
            .ok_or(RegistryError::NotFound)
    }

    /// Renames `alias`, renews its TTL, or both.
    ///
    /// A rename creates a fresh link under `new_alias` (access history is not
    /// carried over) armed from now with `new_ttl_secs` or the current TTL,
    /// then removes the old alias. A TTL-only update re-arms the link from
    /// now. Passing neither is a successful no-op.
    pub fn update(
        &self,
        alias: &str,
        new_alias: Option<&str>,
        new_ttl_secs: Option<u64>,
    ) -> RegistryResult<()> {
        let now = Instant::now();
        let mut state = self.write();

        if state.purge_if_expired(alias, now) {
            self.expired_count.fetch_add(1, Ordering::Relaxed);
            return Err(RegistryError::NotFound);
        }
        let Some(record) = state.records.get(alias) else {
            return Err(RegistryError::NotFound);
        };

        let new_ttl = new_ttl_secs
            .filter(|&secs| secs > 0)
            .map(|secs| Duration::from_secs(secs.min(MAX_TTL_SECS)));

        match new_alias.filter(|a| !a.is_empty() && *a != alias) {
            Some(new_alias) => {
                let target = record.target.clone();
                let ttl = new_ttl.unwrap_or(record.ttl);

                if state.records.contains_key(new_alias) {
                    if !state.purge_if_expired(new_alias, now) {
                        return Err(RegistryError::AliasConflict(new_alias.to_string()));
                    }
                    self.expired_count.fetch_add(1, Ordering::Relaxed);
                }

                let fresh = Record::new(target, ttl, now, self.config.history_size);
                state.insert(new_alias, fresh);
                state.remove(alias);

                debug!(from = %alias, to = %new_alias, ttl_secs = ttl.as_secs(), "Link renamed");
            }
            None => {
                if let Some(ttl) = new_ttl {
                    if let Some(record) = state.records.get_mut(alias) {
                        record.rearm(ttl, now);
                        let expires_at = record.expires_at;
                        state.expiry.remove(alias);
                        state.expiry.insert(alias, expires_at);
                    }
                    debug!(alias = %alias, ttl_secs = ttl.as_secs(), "Link renewed");
                }
            }
        }

        Ok(())
    }

    /// Deletes `alias`.
    ///
    /// # Returns
    ///
    /// Returns `true` if the link was deleted, `false` if it didn't exist.
    pub fn delete(&self, alias: &str) -> bool {
        let removed = self.write().remove(alias).is_some();
        if removed {
            self.deleted_count.fetch_add(1, Ordering::Relaxed);
            debug!(alias = %alias, "Link deleted");
        }
        removed
    }

    /// Snapshot of every link whose deadline is still ahead, soonest first.
    ///
    /// Skipped expired links are left for the sweeper.
    pub fn list_active(&self) -> Vec<LinkSnapshot> {
        let now = Instant::now();
        let state = self.read();

        state
            .expiry
            .aliases()
            .filter_map(|alias| {
                state
                    .records
                    .get(alias)
                    .filter(|record| record.expires_at > now)
                    .map(|record| LinkSnapshot::from_record(alias, record, now))
            })
            .collect()
    }

    /// Removes every link whose deadline has passed.
    ///
    /// Called by the background sweeper. Holds the write lock for the whole
    /// batch.
    ///
    /// # Returns
    ///
    /// Returns the number of links that were removed.
    pub fn sweep_expired(&self) -> u64 {
        let now = Instant::now();
        let removed = self.write().sweep(now);

        if removed > 0 {
            self.expired_count.fetch_add(removed, Ordering::Relaxed);
        }
        removed
    }

    /// Stops the background sweeper and drops every link.
    ///
    /// The registry stays usable afterwards, empty and without a sweeper.
    pub async fn shutdown(&self) {
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            sweeper.shutdown().await;
        }

        let mut state = self.write();
        let links = state.records.len();
        state.clear();
        info!(links = links, "Registry shut down");
    }

    /// Whether a background sweeper is attached and still running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| !s.is_finished())
            .unwrap_or(false)
    }

    /// Aliases currently pointing at `target`, sorted.
    pub fn aliases_for(&self, target: &str) -> Vec<String> {
        let state = self.read();
        let mut aliases: Vec<String> = state
            .reverse
            .aliases(target)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        aliases.sort();
        aliases
    }

    /// Number of stored links, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries in the expiry index.
    pub fn expiry_queue_len(&self) -> usize {
        self.read().expiry.len()
    }

    pub fn stats_snapshot(&self) -> RegistryStats {
        let state = self.read();
        RegistryStats {
            links: state.records.len() as u64,
            targets: state.reverse.len() as u64,
            queued: state.expiry.len() as u64,
            created: self.created_count.load(Ordering::Relaxed),
            resolved: self.resolved_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            deleted: self.deleted_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
impl Registry {
    /// Moves the deadline of `alias` into the past without sweeping it.
    pub(crate) fn force_expire(&self, alias: &str) {
        let past = Instant::now()
            .checked_sub(Duration::from_secs(1))
            .unwrap_or_else(Instant::now);
        let mut state = self.write();
        if let Some(record) = state.records.get_mut(alias) {
            record.expires_at = past;
            state.expiry.insert(alias, past);
        }
    }

    /// Panics unless the three structures agree.
    pub(crate) fn assert_consistent(&self) {
        let state = self.read();

        assert_eq!(state.expiry.len(), state.records.len());
        for (alias, record) in &state.records {
            assert_eq!(state.expiry.deadline(alias), Some(record.expires_at));
            let aliases = state
                .reverse
                .aliases(&record.target)
                .expect("target missing from reverse index");
            assert!(aliases.contains(alias));
        }

        let mut reverse_total = 0;
        for (target, aliases) in state.reverse.iter() {
            assert!(!aliases.is_empty());
            for alias in aliases {
                reverse_total += 1;
                let record = state.records.get(alias).expect("dangling reverse entry");
                assert_eq!(&record.target, target);
            }
        }
        assert_eq!(reverse_total, state.records.len());
    }
}
