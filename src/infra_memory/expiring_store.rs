use crate::domain_port::{Clock, Expirable};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const DEFAULT_CAPACITY: usize = 64;
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("sweep interval must be non-zero")]
    ZeroSweepInterval,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub capacity: usize,
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// In-memory map of string keys to values that know their own expiry.
///
/// Every operation takes the same lock, so operations on one store are
/// linearizable and `pop` hands a value to at most one caller. Expired
/// entries stay in the map until they are popped, deleted or swept.
pub struct ExpiringStore<T> {
    items: Mutex<HashMap<String, T>>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl<T> ExpiringStore<T>
where
    T: Expirable + Clone + Send + 'static,
{
    /// Creates the store and starts its sweep task.
    ///
    /// Must be called from within a Tokio runtime. The first sweep runs one
    /// `sweep_interval` after construction.
    pub fn new(clock: Arc<dyn Clock>, config: StoreConfig) -> Result<Arc<Self>, StoreError> {
        if config.sweep_interval.is_zero() {
            return Err(StoreError::ZeroSweepInterval);
        }
        let store = Arc::new(Self {
            items: Mutex::new(HashMap::with_capacity(config.capacity)),
            clock,
            cancel: CancellationToken::new(),
        });
        tokio::spawn(sweep(
            Arc::downgrade(&store),
            config.sweep_interval,
            store.cancel.clone(),
        ));
        Ok(store)
    }

    pub fn set(&self, key: impl Into<String>, item: T) {
        self.items().insert(key.into(), item);
    }

    /// Returns the entry without looking at its expiry.
    pub fn get(&self, key: &str) -> Option<T> {
        self.items().get(key).cloned()
    }

    pub fn pop(&self, key: &str) -> Option<T> {
        self.items().remove(key)
    }

    /// Removes the entry and returns it only if it had not expired yet.
    ///
    /// The entry is gone afterwards either way.
    pub fn pop_validate(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let item = self.items().remove(key)?;
        if item.is_expired(now) { None } else { Some(item) }
    }

    pub fn delete(&self, key: &str) {
        self.items().remove(key);
    }

    /// Drops every entry expired as of now and returns how many went.
    pub fn purge(&self) -> usize {
        let now = self.clock.now();
        let mut items = self.items();
        let before = items.len();
        items.retain(|_, item| !item.is_expired(now));
        before - items.len()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Stops the sweep task. Safe to call more than once; never waits.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn items(&self) -> MutexGuard<'_, HashMap<String, T>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> Drop for ExpiringStore<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn sweep<T>(store: Weak<ExpiringStore<T>>, period: Duration, cancel: CancellationToken)
where
    T: Expirable + Clone + Send + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else { break };
                let purged = store.purge();
                if purged > 0 {
                    tracing::debug!(purged, remaining = store.len(), "expired entries purged");
                }
            }
        }
    }

    tracing::debug!("expiring store sweep stopped");
}
