use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Receives progress and status updates from a running session.
///
/// Implementations must be cheap; they are called from the matching loop.
/// Hosts with a UI typically forward both calls to their event queue.
pub trait ProgressObserver: Send + Sync {
    /// Percentage of targets processed, `0..=100`, never decreasing.
    fn on_progress(&self, percent: u8);

    /// Human-readable status line.
    fn on_status(&self, message: &str);
}

/// Observer that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _percent: u8) {}

    fn on_status(&self, _message: &str) {}
}

/// Adapts a pair of closures into an observer.
pub struct FnObserver<P, S> {
    progress: P,
    status: S,
}

impl<P, S> FnObserver<P, S>
where
    P: Fn(u8) + Send + Sync,
    S: Fn(&str) + Send + Sync,
{
    pub fn new(progress: P, status: S) -> Self {
        Self { progress, status }
    }
}

impl<P, S> ProgressObserver for FnObserver<P, S>
where
    P: Fn(u8) + Send + Sync,
    S: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, percent: u8) {
        (self.progress)(percent)
    }

    fn on_status(&self, message: &str) {
        (self.status)(message)
    }
}

/// Forwards progress to an observer, clamped to 100 and never going backwards.
pub struct ProgressTracker {
    observer: Arc<dyn ProgressObserver>,
    last: AtomicU8,
}

impl ProgressTracker {
    pub fn new(observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            observer,
            last: AtomicU8::new(0),
        }
    }

    /// Report `percent`; values below the last reported one are raised to it.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.last.fetch_max(percent, Ordering::SeqCst);
        self.observer.on_progress(percent.max(previous));
    }

    /// Report `done` out of `total` as a percentage. An empty batch is complete.
    pub fn report_fraction(&self, done: usize, total: usize) {
        let percent = if total == 0 {
            100
        } else {
            (done.min(total) * 100 / total) as u8
        };
        self.report(percent);
    }

    pub fn status(&self, message: &str) {
        self.observer.on_status(message);
    }

    pub fn last(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }
}
