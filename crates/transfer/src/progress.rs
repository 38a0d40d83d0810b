use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use genvault_protocol::ProgressSnapshot;
use tokio::sync::watch;

/// Default minimum spacing between delivered snapshots.
const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Callback invoked with each delivered snapshot.
///
/// Handlers run while the tracker's mutex is held, so they must not block and
/// must not call back into [`ProgressTracker::update`] and friends.
/// [`ProgressTracker::cancel`] is safe to call from a handler.
pub type ProgressHandler = Box<dyn Fn(ProgressSnapshot) + Send + Sync>;

/// Accumulates completed/total work units for one logical operation and
/// delivers throttled snapshots to registered handlers.
///
/// The state update, the throttle check and the delivery happen in a single
/// critical section, so two racing updates can neither both deliver a stale
/// snapshot nor both be dropped.
pub struct ProgressTracker {
    inner: Mutex<TrackerInner>,
    cancelled: AtomicBool,
    latest: watch::Sender<Option<ProgressSnapshot>>,
}

struct TrackerInner {
    completed: i64,
    total: Option<i64>,
    description: String,
    additional_info: Option<String>,
    last_delivery: Option<Instant>,
    interval: Duration,
    handlers: Vec<ProgressHandler>,
}

impl TrackerInner {
    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(
            self.completed,
            self.total,
            self.description.clone(),
            self.additional_info.clone(),
        )
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ProgressTracker {
    /// Creates an indeterminate tracker with the given delivery interval.
    ///
    /// If `interval` is `None`, defaults to 100 ms.
    pub fn new(interval: Option<Duration>) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            inner: Mutex::new(TrackerInner {
                completed: 0,
                total: None,
                description: String::new(),
                additional_info: None,
                last_delivery: None,
                interval: interval.unwrap_or(DEFAULT_INTERVAL),
                handlers: Vec::new(),
            }),
            cancelled: AtomicBool::new(false),
            latest,
        }
    }

    /// Registers a progress handler.
    pub fn on_progress(&self, handler: ProgressHandler) {
        self.lock().handlers.push(handler);
    }

    /// Returns a receiver that always holds the most recently delivered snapshot.
    ///
    /// The receiver never blocks the tracked operation; slow observers simply
    /// skip intermediate values. The forced completion snapshot is always the
    /// final value.
    pub fn subscribe(&self) -> watch::Receiver<Option<ProgressSnapshot>> {
        self.latest.subscribe()
    }

    /// Switches between determinate (`Some`) and indeterminate (`None`) mode.
    pub fn set_total_unit_count(&self, total: Option<i64>) {
        self.lock().total = total;
    }

    /// Replaces the completed count and delivers a snapshot if one is due.
    pub fn update(
        &self,
        completed: i64,
        description: impl Into<String>,
        additional_info: Option<String>,
        force: bool,
    ) {
        let description = description.into();
        self.apply(force, |inner| {
            inner.completed = completed;
            inner.description = description;
            inner.additional_info = additional_info;
        });
    }

    /// Adds `delta` to the completed count and delivers a snapshot if one is due.
    pub fn increment(
        &self,
        delta: i64,
        description: impl Into<String>,
        additional_info: Option<String>,
        force: bool,
    ) {
        let description = description.into();
        self.apply(force, |inner| {
            inner.completed = inner.completed.saturating_add(delta);
            inner.description = description;
            inner.additional_info = additional_info;
        });
    }

    /// Marks the operation finished and always delivers a final snapshot.
    ///
    /// In determinate mode the completed count is clamped to the total.
    pub fn complete(&self, description: Option<&str>) {
        self.apply(true, |inner| {
            if let Some(total) = inner.total {
                inner.completed = total;
            }
            if let Some(description) = description {
                inner.description = description.to_string();
            }
            inner.additional_info = None;
        });
    }

    /// Requests cancellation. Work stops only where callers poll
    /// [`is_cancelled`](Self::is_cancelled).
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn completed_unit_count(&self) -> i64 {
        self.lock().completed
    }

    pub fn total_unit_count(&self) -> Option<i64> {
        self.lock().total
    }

    /// Current state, regardless of throttling.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock().snapshot()
    }

    fn apply(&self, force: bool, mutate: impl FnOnce(&mut TrackerInner)) {
        let mut inner = self.lock();
        mutate(&mut inner);

        let now = Instant::now();
        let interval = inner.interval;
        let due = force
            || inner
                .last_delivery
                .is_none_or(|last| now.duration_since(last) >= interval);
        if !due {
            return;
        }
        inner.last_delivery = Some(now);

        let snapshot = inner.snapshot();
        for handler in &inner.handlers {
            let snap = snapshot.clone();
            if catch_unwind(AssertUnwindSafe(|| handler(snap))).is_err() {
                tracing::warn!(
                    description = %snapshot.description,
                    "progress handler panicked, ignoring"
                );
            }
        }
        self.latest.send_replace(Some(snapshot));
    }

    fn lock(&self) -> MutexGuard<'_, TrackerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
