//! Background Expiry Sweeper
//!
//! This module implements a background task that periodically removes links
//! whose deadline has passed. This is called "active expiry" as opposed to
//! "lazy expiry" (which happens on access).
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry is cheap but only catches links somebody reads again. A link
//! that is never resolved after its TTL runs out would stay in memory forever.
//!
//! ## Design
//!
//! The sweeper runs as a single Tokio task and:
//! 1. Waits for the next tick of a fixed interval (default: 1s)
//! 2. Takes the registry write lock once
//! 3. Pops due entries off the head of the expiry index and deletes them
//! 4. Stops at the first entry whose deadline is still ahead
//!
//! The task only holds a `Weak` reference to the registry, so it never keeps
//! the registry alive on its own, and exits when the registry is dropped.

use crate::storage::Registry;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
    /// The sweeper task, taken when awaited
    task: Option<JoinHandle<()>>,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// # Arguments
    ///
    /// * `registry` - The registry to sweep
    /// * `interval` - Time between sweeps
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start(registry: &Arc<Registry>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(sweeper_loop(Arc::downgrade(registry), interval, shutdown_rx));

        info!(
            interval_ms = interval.as_millis() as u64,
            "Background expiry sweeper started"
        );

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Signals the sweeper to stop.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        let signalled = self.shutdown_tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        });
        if signalled {
            info!("Background expiry sweeper stopped");
        }
    }

    /// Stops the sweeper and waits for its task to finish.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Expiry sweeper task ended abnormally");
            }
        }
    }

    /// Whether the sweeper task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop(
    registry: Weak<Registry>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; wait a full period instead
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
                continue;
            }
        }

        let Some(registry) = registry.upgrade() else {
            debug!("Registry dropped, expiry sweeper exiting");
            return;
        };

        let expired = registry.sweep_expired();

        if expired > 0 {
            debug!(
                expired = expired,
                links_remaining = registry.len(),
                "Expired links cleaned up"
            );
        } else {
            trace!("Expiry sweep found nothing due");
        }
    }
}

/// Starts the expiry sweeper at the registry's configured interval.
///
/// This is a convenience function for simple use cases.
pub fn start_expiry_sweeper(registry: &Arc<Registry>) -> ExpirySweeper {
    ExpirySweeper::start(registry, registry.config().sweep_interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::storage::RegistryError;

    #[tokio::test]
    async fn test_sweeper_cleans_expired_links() {
        let registry = Arc::new(Registry::new(RegistryConfig::default()));

        for i in 0..10 {
            registry
                .create(&format!("https://example.com/{}", i), None, Some(1))
                .unwrap();
        }
        let keeper = registry.create("https://keep.me", None, Some(600)).unwrap();
        assert_eq!(registry.len(), 11);

        let _sweeper = ExpirySweeper::start(&registry, Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(1300)).await;

        // Swept without anybody reading them
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.expiry_queue_len(), 1);
        assert_eq!(registry.aliases_for("https://keep.me"), vec![keeper]);
        assert_eq!(registry.stats_snapshot().expired, 10);
        registry.assert_consistent();
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_drop() {
        let registry = Arc::new(Registry::new(RegistryConfig::default()));

        {
            let _sweeper = ExpirySweeper::start(&registry, Duration::from_millis(10));
            tokio::time::sleep(Duration::from_millis(50)).await;
            // Sweeper is dropped here
        }

        let alias = registry.create("t", None, Some(1)).unwrap();
        registry.force_expire(&alias);

        tokio::time::sleep(Duration::from_millis(100)).await;

        // Still stored since nothing swept it...
        assert_eq!(registry.len(), 1);
        // ...but a read triggers lazy expiry
        assert_eq!(registry.resolve(&alias), Err(RegistryError::NotFound));
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_task() {
        let registry = Arc::new(Registry::new(RegistryConfig::default()));
        let sweeper = start_expiry_sweeper(&registry);
        assert!(!sweeper.is_finished());

        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_exits_when_registry_dropped() {
        let registry = Arc::new(Registry::new(RegistryConfig::default()));
        let sweeper = ExpirySweeper::start(&registry, Duration::from_millis(10));

        drop(registry);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(sweeper.is_finished());
    }
}
