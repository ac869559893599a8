use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag shared between a host and an in-flight run.
/// The engine checks it between steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Invoked between "step begins" and the step's dispatch. Only affects presentation timing.
pub trait Pacing {
    fn pause(&mut self, delay: Duration, cancel: &CancellationToken);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacing;

impl Pacing for NoPacing {
    fn pause(&mut self, _delay: Duration, _cancel: &CancellationToken) {}
}

/// Blocks the current thread, waking every `slice` to notice cancellation.
#[derive(Debug, Clone, Copy)]
pub struct SleepPacing {
    slice: Duration,
}

impl SleepPacing {
    pub fn new(slice: Duration) -> Self {
        Self {
            slice: slice.max(Duration::from_millis(1)),
        }
    }
}

impl Default for SleepPacing {
    fn default() -> Self {
        Self::new(Duration::from_millis(25))
    }
}

impl Pacing for SleepPacing {
    fn pause(&mut self, delay: Duration, cancel: &CancellationToken) {
        let deadline = Instant::now() + delay;
        loop {
            if cancel.is_cancelled() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep(self.slice.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod pacing_tests {
    use super::*;

    #[test]
    fn token_clones_share_state() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn sleep_pacing_returns_immediately_when_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let started = Instant::now();
        SleepPacing::default().pause(Duration::from_secs(30), &token);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn sleep_pacing_waits_for_short_delays() {
        let token = CancellationToken::new();
        let started = Instant::now();
        SleepPacing::new(Duration::from_millis(2)).pause(Duration::from_millis(10), &token);
        assert!(started.elapsed() >= Duration::from_millis(10));
    }
}
