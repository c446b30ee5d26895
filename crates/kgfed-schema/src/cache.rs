//! Process-wide schema cache with background refresh.
//!
//! Readers only ever see fully built snapshots: a build runs to completion
//! off to the side and is then published with one atomic pointer swap.
//!
//! ```ignore
//! let cache = SchemaCache::new(SchemaBuilder::from_path("kgfed.toml")?);
//! cache.ensure_initialized().await;
//! cache.start_background_refresh(cache.refresh_interval());
//!
//! let snapshot = cache.get_snapshot(false).await;
//! ```

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::builder::SchemaBuilder;
use crate::snapshot::SchemaSnapshot;

/// Cheaply clonable handle; clones share one snapshot and one refresh task.
#[derive(Clone)]
pub struct SchemaCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    /// Published snapshot (lock-free reads)
    snapshot: ArcSwapOption<SchemaSnapshot>,
    /// Serializes builds so concurrent first callers share one result.
    build_lock: Mutex<()>,
    builder: SchemaBuilder,
    refresh_task: OnceLock<JoinHandle<()>>,
}

impl SchemaCache {
    pub fn new(builder: SchemaBuilder) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                snapshot: ArcSwapOption::empty(),
                build_lock: Mutex::new(()),
                builder,
                refresh_task: OnceLock::new(),
            }),
        }
    }

    pub fn builder(&self) -> &SchemaBuilder {
        &self.inner.builder
    }

    /// Refresh interval from the builder's current configuration.
    pub fn refresh_interval(&self) -> Duration {
        self.inner.builder.config().refresh_interval
    }

    /// Build the first snapshot unless one is already published.
    pub async fn ensure_initialized(&self) -> Arc<SchemaSnapshot> {
        if let Some(snapshot) = self.inner.snapshot.load_full() {
            return snapshot;
        }

        let _guard = self.inner.build_lock.lock().await;
        // Double-check after acquiring lock
        if let Some(snapshot) = self.inner.snapshot.load_full() {
            return snapshot;
        }
        self.inner.rebuild_locked().await
    }

    /// Rebuild now and publish the result.
    pub async fn refresh(&self) -> Arc<SchemaSnapshot> {
        self.inner.rebuild().await
    }

    /// The snapshot, rebuilding first when `force_update` is set.
    ///
    /// The returned `Arc` is shared with the cache; `Arc::make_mut` gives the
    /// caller a private copy, so edits never leak into later reads.
    pub async fn get_snapshot(&self, force_update: bool) -> Arc<SchemaSnapshot> {
        if force_update {
            self.refresh().await
        } else {
            self.ensure_initialized().await
        }
    }

    /// Whatever is published right now, without building.
    pub fn current(&self) -> Option<Arc<SchemaSnapshot>> {
        self.inner.snapshot.load_full()
    }

    /// Start the periodic rebuild task.
    ///
    /// At most one task ever runs per cache, however many times (or from how
    /// many clones) this is called. Returns `true` for the call that started it.
    /// Outside a Tokio runtime nothing is started and `false` is returned.
    pub fn start_background_refresh(&self, interval: Duration) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No Tokio runtime, background schema refresh not started");
            return false;
        };
        let mut started = false;
        self.inner.refresh_task.get_or_init(|| {
            started = true;
            spawn_refresh(&runtime, Arc::downgrade(&self.inner), interval)
        });
        if started {
            info!(interval = ?interval, "Started background schema refresh");
        }
        started
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner
            .refresh_task
            .get()
            .is_some_and(|task| !task.is_finished())
    }

    /// Abort the periodic task. It is not restarted by later `start` calls.
    pub fn stop_background_refresh(&self) {
        if let Some(task) = self.inner.refresh_task.get() {
            task.abort();
            info!("Stopped background schema refresh");
        }
    }
}

impl CacheInner {
    async fn rebuild(&self) -> Arc<SchemaSnapshot> {
        let _guard = self.build_lock.lock().await;
        self.rebuild_locked().await
    }

    async fn rebuild_locked(&self) -> Arc<SchemaSnapshot> {
        let snapshot = Arc::new(self.builder.build().await);
        self.snapshot.store(Some(Arc::clone(&snapshot)));
        info!(
            generation = snapshot.generation(),
            errors = snapshot.errors().len(),
            "Published schema snapshot"
        );
        snapshot
    }
}

impl Drop for CacheInner {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.get() {
            task.abort();
        }
    }
}

fn spawn_refresh(runtime: &Handle, cache: Weak<CacheInner>, interval: Duration) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = cache.upgrade() else {
                debug!("Schema cache dropped, ending refresh task");
                break;
            };
            inner.rebuild().await;
        }
    })
}
