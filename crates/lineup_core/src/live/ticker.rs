use super::session::SessionInner;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Handle to the one tick task a session may own.
///
/// Each arm gets a fresh generation; a loop whose generation is no longer
/// current stops without ticking, so a replaced task can never double-count
/// a second.
#[derive(Debug, Default)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl Ticker {
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Spawn a tick task unless one is already live.
    pub fn arm(&mut self, spawn: impl FnOnce(u64) -> JoinHandle<()>) -> bool {
        if self.is_armed() {
            return false;
        }
        self.generation += 1;
        self.handle = Some(spawn(self.generation));
        true
    }

    /// Abort the current task, if any. A loop from the old generation that
    /// is already waiting on the lock stops without ticking.
    pub fn disarm(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        self.generation += 1;
        let was_live = !handle.is_finished();
        handle.abort();
        was_live
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && self.generation == generation
    }

    /// Called by a loop that is ending on its own.
    pub(crate) fn release(&mut self, generation: u64) {
        if self.generation == generation {
            self.handle = None;
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub(crate) fn spawn_tick_loop(
    shared: &Arc<Mutex<SessionInner>>,
    generation: u64,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run_tick_loop(Arc::downgrade(shared), generation, period))
}

/// One `tick()` per `period` until the clock stops, the ticker is re-armed
/// elsewhere, or the session is dropped.
async fn run_tick_loop(shared: Weak<Mutex<SessionInner>>, generation: u64, period: Duration) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let Some(shared) = shared.upgrade() else {
            break;
        };
        let mut inner = shared.lock().await;
        if !inner.ticker.is_current(generation) {
            break;
        }
        if !inner.on_tick() {
            inner.ticker.release(generation);
            log::debug!("tick loop {generation} finished");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> JoinHandle<()> {
        tokio::spawn(std::future::pending())
    }

    #[tokio::test]
    async fn test_arm_is_idempotent() {
        let mut ticker = Ticker::default();
        assert!(ticker.arm(|_| idle()));
        assert!(!ticker.arm(|_| idle()));
        assert_eq!(ticker.generation(), 1);
        assert!(ticker.is_current(1));
    }

    #[tokio::test]
    async fn test_disarm_invalidates_generation() {
        let mut ticker = Ticker::default();
        ticker.arm(|_| idle());
        assert!(ticker.disarm());
        assert!(!ticker.is_armed());
        assert!(!ticker.is_current(1));
        assert!(!ticker.disarm());
        assert_eq!(ticker.generation(), 2);

        assert!(ticker.arm(|_| idle()));
        assert_eq!(ticker.generation(), 3);
        assert!(ticker.is_current(3));
        // a stale loop releasing must not clear the live handle
        ticker.release(1);
        assert!(ticker.is_armed());
        ticker.release(3);
        assert!(!ticker.is_armed());
    }
}
