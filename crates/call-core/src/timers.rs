//! Cancellable per-purpose call timers
//!
//! Each call screen owns up to three scheduled behaviors: an inactivity
//! timeout that auto-dismisses the full-screen UI, a 1-second duration tick
//! while the call is active (suspended on hold), and an auto-dismiss for
//! transient surfaces. Every one of them must be cancelled on every exit
//! path - a leaked recurring callback fires against stale state.
//!
//! [`CallTimers`] keys tasks by [`TimerKind`]. Cancel is idempotent, and
//! starting a timer that is already running aborts the prior instance
//! first, so restart can never duplicate callbacks. Dropping the registry
//! aborts everything outstanding.

use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

/// Inactivity timeout for the full-screen active-call UI.
pub const ACTIVE_SCREEN_TIMEOUT: Duration = Duration::from_secs(300);

/// Inactivity timeout for the full-screen incoming-call UI.
pub const INCOMING_SCREEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Period of the call-duration display tick.
pub const DURATION_TICK: Duration = Duration::from_secs(1);

/// Purpose a scheduled task serves. One task per kind at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Auto-dismiss a full-screen call UI after inactivity.
    InactivityTimeout,
    /// Periodic tick driving the call-duration display.
    DurationTick,
    /// Auto-dismiss for transient surfaces.
    AutoDismiss,
}

/// Registry of cancellable scheduled tasks, keyed by purpose.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use ringside_call_core::timers::{CallTimers, TimerKind};
///
/// # tokio_test::block_on(async {
/// let timers = CallTimers::new();
/// timers.start_timeout(TimerKind::AutoDismiss, Duration::from_secs(30), || {
///     // dismiss the surface
/// });
/// timers.cancel(TimerKind::AutoDismiss);
/// timers.cancel(TimerKind::AutoDismiss); // idempotent
/// # });
/// ```
pub struct CallTimers {
    tasks: DashMap<TimerKind, JoinHandle<()>>,
}

impl CallTimers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
        }
    }

    /// Schedule `f` to run once after `delay`.
    ///
    /// A task already registered under `kind` is aborted first.
    pub fn start_timeout<F>(&self, kind: TimerKind, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        self.install(kind, handle);
    }

    /// Schedule `f` to run every `period`, first firing one period from now.
    ///
    /// A task already registered under `kind` is aborted first.
    pub fn start_interval<F>(&self, kind: TimerKind, period: Duration, mut f: F)
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                f();
            }
        });
        self.install(kind, handle);
    }

    /// Cancel the task registered under `kind`, if any. Idempotent.
    pub fn cancel(&self, kind: TimerKind) {
        if let Some((_, handle)) = self.tasks.remove(&kind) {
            handle.abort();
            debug!("cancelled timer {:?}", kind);
        }
    }

    /// Cancel everything outstanding.
    pub fn cancel_all(&self) {
        let kinds: Vec<TimerKind> = self.tasks.iter().map(|e| *e.key()).collect();
        for kind in kinds {
            self.cancel(kind);
        }
    }

    /// Whether a task is currently registered (and not yet finished) under
    /// `kind`.
    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.tasks
            .get(&kind)
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    fn install(&self, kind: TimerKind, handle: JoinHandle<()>) {
        if let Some(previous) = self.tasks.insert(kind, handle) {
            previous.abort();
            debug!("restarted timer {:?}, prior instance aborted", kind);
        }
    }
}

impl Default for CallTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CallTimers {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_once_after_delay() {
        let timers = CallTimers::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();

        timers.start_timeout(TimerKind::InactivityTimeout, Duration::from_secs(30), move || {
            fired2.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_secs(29)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Nothing further ever fires.
        tokio::time::advance(Duration::from_secs(600)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_periodically_until_cancelled() {
        let timers = CallTimers::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks2 = ticks.clone();

        timers.start_interval(TimerKind::DurationTick, DURATION_TICK, move || {
            ticks2.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 5);

        timers.cancel(TimerKind::DurationTick);
        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn double_cancel_is_idempotent() {
        let timers = CallTimers::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();

        timers.start_timeout(TimerKind::AutoDismiss, Duration::from_secs(10), move || {
            fired2.fetch_add(1, Ordering::SeqCst);
        });
        timers.cancel(TimerKind::AutoDismiss);
        timers.cancel(TimerKind::AutoDismiss);

        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timers.is_running(TimerKind::AutoDismiss));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_aborts_prior_instance() {
        let timers = CallTimers::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        // First instance would tick every second.
        let t = ticks.clone();
        timers.start_interval(TimerKind::DurationTick, Duration::from_secs(1), move || {
            t.fetch_add(1, Ordering::SeqCst);
        });

        // Restart with the same period; only one instance may tick.
        let t = ticks.clone();
        timers.start_interval(TimerKind::DurationTick, Duration::from_secs(1), move || {
            t.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_secs(4)).await;
        tokio::task::yield_now().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_clears_every_kind() {
        let timers = CallTimers::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        timers.start_timeout(TimerKind::InactivityTimeout, Duration::from_secs(5), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let c = count.clone();
        timers.start_interval(TimerKind::DurationTick, Duration::from_secs(1), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        timers.cancel_all();
        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
