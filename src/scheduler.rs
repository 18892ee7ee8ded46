use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::PackageEntry;
use crate::derive::{derive_all, derive_panel, DeriveContext};
use crate::history::UptimeHistoryStore;
use crate::panels::{PanelId, PanelRenderer};
use crate::sources::SharedAdapter;
use crate::state::{Freshness, RefreshCycle, SourceBook};
use crate::types::source::{ErrorKind, NormalizedRecord, SourceId, SourceResult};
use crate::types::uptime::{ServiceId, UptimeSample};

/// Longest accepted refresh period. Longer requests are clamped so timer
/// deadlines stay representable.
pub const MAX_INTERVAL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Handle to an armed refresh timer.
#[derive(Debug, Clone)]
pub struct ScheduleHandle {
    interval_seconds: u64,
    abort: Arc<AbortHandle>,
    cancelled: Arc<AtomicBool>,
}

impl ScheduleHandle {
    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.abort.abort();
    }

    /// True once `cancel` was called on this handle or any clone of it.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Fetches spawned by one tick. Dropping it leaves the fetches running.
pub struct Tick {
    handles: Vec<JoinHandle<()>>,
}

impl Tick {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Resolves once every fetch of this tick has been applied.
    pub async fn wait(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Fetch task ended abnormally");
            }
        }
    }
}

struct Shared {
    adapters: Vec<SharedAdapter>,
    active: Vec<SourceId>,
    book: Mutex<SourceBook>,
    history: UptimeHistoryStore,
    cycle: Mutex<RefreshCycle>,
    renderer: Arc<dyn PanelRenderer>,
    packages: Vec<PackageEntry>,
}

impl Shared {
    fn tick(self: &Arc<Self>) -> Tick {
        let ids: Vec<SourceId> = self.adapters.iter().map(|a| a.id()).collect();
        self.cycle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .begin(ids.iter().copied(), Utc::now());
        info!(sources = ids.len(), "Refresh tick");

        let handles = self
            .adapters
            .iter()
            .map(|adapter| {
                let shared = Arc::clone(self);
                let adapter = Arc::clone(adapter);
                tokio::spawn(async move {
                    let id = adapter.id();
                    let result = match AssertUnwindSafe(adapter.fetch()).catch_unwind().await {
                        Ok(result) => result,
                        Err(_) => {
                            warn!(source = %id, "Adapter panicked during fetch");
                            SourceResult::Failed {
                                reason: ErrorKind::Unknown,
                                attempted_at: Utc::now(),
                            }
                        }
                    };
                    shared.apply(id, result);
                })
            })
            .collect();
        Tick { handles }
    }

    /// Store a completed fetch and re-render the panels it feeds. The book
    /// stays locked through rendering so panels see results in completion
    /// order.
    fn apply(&self, id: SourceId, result: SourceResult<NormalizedRecord>) {
        match &result {
            SourceResult::Ok { latency_ms, .. } => {
                debug!(source = %id, latency_ms, "Fetch succeeded");
            }
            SourceResult::Failed { reason, .. } => {
                warn!(source = %id, error = %reason, "Fetch failed");
            }
        }

        let mut book = self.book.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(service) = id.monitored_service() {
            self.history
                .record(service, result.is_ok(), result.latency_ms());
        }
        book.apply(id, result);
        self.cycle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .finish(id);

        let ctx = DeriveContext {
            book: &book,
            history: &self.history,
            packages: &self.packages,
            active: &self.active,
            now: Utc::now(),
        };
        for panel in PanelId::affected_by(id) {
            let view = derive_panel(panel, &ctx);
            self.renderer.render(panel, &view);
        }
    }

    fn render_all(&self) {
        let book = self.book.lock().unwrap_or_else(|e| e.into_inner());
        let ctx = DeriveContext {
            book: &book,
            history: &self.history,
            packages: &self.packages,
            active: &self.active,
            now: Utc::now(),
        };
        for (panel, view) in derive_all(&ctx) {
            self.renderer.render(panel, &view);
        }
    }
}

/// Drives periodic refresh of every adapter and pushes derived panel views to
/// the renderer. Renderers must not call back into the scheduler.
pub struct RefreshScheduler {
    shared: Arc<Shared>,
    timer: Mutex<Option<ScheduleHandle>>,
}

impl RefreshScheduler {
    pub fn new(
        adapters: Vec<SharedAdapter>,
        renderer: Arc<dyn PanelRenderer>,
        packages: Vec<PackageEntry>,
    ) -> Self {
        Self::with_history(adapters, renderer, packages, UptimeHistoryStore::new())
    }

    pub fn with_history(
        adapters: Vec<SharedAdapter>,
        renderer: Arc<dyn PanelRenderer>,
        packages: Vec<PackageEntry>,
        history: UptimeHistoryStore,
    ) -> Self {
        let active = adapters.iter().map(|a| a.id()).collect();
        Self {
            shared: Arc::new(Shared {
                adapters,
                active,
                book: Mutex::new(SourceBook::new()),
                history,
                cycle: Mutex::new(RefreshCycle::default()),
                renderer,
                packages,
            }),
            timer: Mutex::new(None),
        }
    }

    /// Arm a repeating refresh every `interval_seconds`, replacing any armed
    /// timer. The first tick fires one period from now; `0` leaves refresh
    /// manual only. Periods above `MAX_INTERVAL_SECONDS` are clamped.
    pub fn start(&self, interval_seconds: u64) -> Option<ScheduleHandle> {
        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = timer.take() {
            old.cancel();
            debug!(interval_seconds = old.interval_seconds(), "Cancelled refresh timer");
        }
        if interval_seconds > MAX_INTERVAL_SECONDS {
            warn!(
                requested = interval_seconds,
                max = MAX_INTERVAL_SECONDS,
                "Refresh interval too long; clamping"
            );
        }
        let interval_seconds = interval_seconds.min(MAX_INTERVAL_SECONDS);
        self.shared
            .cycle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .interval_seconds = interval_seconds;

        if interval_seconds == 0 {
            info!("Auto-refresh off");
            return None;
        }

        let period = Duration::from_secs(interval_seconds);
        let Some(first) = Instant::now().checked_add(period) else {
            warn!(interval_seconds, "Refresh deadline out of range; auto-refresh off");
            self.shared
                .cycle
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .interval_seconds = 0;
            return None;
        };
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Fire-and-forget: the next tick does not wait for this one.
                drop(shared.tick());
            }
        });
        let handle = ScheduleHandle {
            interval_seconds,
            abort: Arc::new(task.abort_handle()),
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        info!(interval_seconds, "Auto-refresh armed");
        *timer = Some(handle.clone());
        Some(handle)
    }

    /// Cancel the timer. In-flight fetches still complete and apply.
    pub fn stop(&self) {
        if let Some(handle) = self.timer.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.cancel();
            info!(interval_seconds = handle.interval_seconds(), "Auto-refresh stopped");
        }
    }

    pub fn set_interval(&self, interval_seconds: u64) -> Option<ScheduleHandle> {
        self.start(interval_seconds)
    }

    pub fn trigger_now(&self) -> Tick {
        self.shared.tick()
    }

    pub fn render_all(&self) {
        self.shared.render_all();
    }

    /// Period of the armed timer, `0` when none is armed. A handle cancelled
    /// from outside is released here.
    pub fn interval_seconds(&self) -> u64 {
        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if timer.as_ref().is_some_and(ScheduleHandle::is_cancelled) {
            timer.take();
            self.shared
                .cycle
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .interval_seconds = 0;
        }
        timer.as_ref().map_or(0, ScheduleHandle::interval_seconds)
    }

    pub fn cycle(&self) -> RefreshCycle {
        self.shared
            .cycle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn latest(&self, id: SourceId) -> Option<SourceResult<NormalizedRecord>> {
        self.shared
            .book
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .latest(id)
            .cloned()
    }

    pub fn freshness(&self, id: SourceId) -> Freshness {
        self.shared
            .book
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .freshness(id)
    }

    pub fn uptime(&self, service: ServiceId) -> Vec<UptimeSample> {
        self.shared.history.snapshot(service)
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
