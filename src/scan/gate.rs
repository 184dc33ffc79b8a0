//! Debounce timer and single-flight guard.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::Notify;
use tokio::time::{Duration, sleep};

/// Cancellation token for one debounce wait.
#[derive(Debug, Clone, Default)]
pub struct DelayHandle {
    cancelled: Rc<Cell<bool>>,
    notify: Rc<Notify>,
}

impl DelayHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the wait. Later calls do nothing.
    pub fn cancel(&self) {
        if !self.cancelled.replace(true) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Resolves `true` once `delay` elapses, or `false` if cancelled first.
    pub async fn wait(&self, delay: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        let cancelled = self.notify.notified();
        tokio::select! {
            biased;
            _ = cancelled => false,
            _ = sleep(delay) => !self.is_cancelled(),
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

/// Releases the single-flight slot when dropped.
#[derive(Debug)]
pub struct FlightGuard {
    in_flight: Rc<Cell<bool>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.in_flight.set(false);
    }
}

/// One outstanding debounce wait plus the lookup-in-flight flag.
#[derive(Debug, Default)]
pub struct LookupGate {
    timer: RefCell<Option<DelayHandle>>,
    in_flight: Rc<Cell<bool>>,
}

impl LookupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits `delay`, replacing (and cancelling) any outstanding wait.
    pub async fn wait(&self, delay: Duration) -> bool {
        let handle = DelayHandle::new();
        if let Some(previous) = self.timer.replace(Some(handle.clone())) {
            previous.cancel();
        }

        let elapsed = handle.wait(delay).await;

        let mut timer = self.timer.borrow_mut();
        if timer.as_ref().is_some_and(|current| current.same_as(&handle)) {
            *timer = None;
        }
        elapsed
    }

    /// Cancels the outstanding wait, if any.
    pub fn clear(&self) {
        let outstanding = self.timer.borrow_mut().take();
        if let Some(handle) = outstanding {
            handle.cancel();
        }
    }

    pub fn has_pending_wait(&self) -> bool {
        self.timer.borrow().is_some()
    }

    /// Claims the lookup slot. `None` while another lookup holds it.
    pub fn try_begin(&self) -> Option<FlightGuard> {
        if self.in_flight.replace(true) {
            return None;
        }
        Some(FlightGuard {
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn test_wait_elapses() {
        let handle = DelayHandle::new();
        assert!(handle.wait(Duration::from_millis(20)).await);
        assert!(!handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_resolves_false_once() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let handle = DelayHandle::new();
                let waiter = {
                    let handle = handle.clone();
                    tokio::task::spawn_local(async move { handle.wait(Duration::from_secs(5)).await })
                };
                tokio::task::yield_now().await;

                handle.cancel();
                handle.cancel();

                assert!(!waiter.await.unwrap());
                assert!(handle.is_cancelled());
                assert!(!handle.wait(Duration::from_millis(1)).await);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_wait_cancels_outstanding_one() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let gate = Rc::new(LookupGate::new());
                let first = {
                    let gate = gate.clone();
                    tokio::task::spawn_local(async move { gate.wait(Duration::from_millis(100)).await })
                };
                tokio::task::yield_now().await;
                assert!(gate.has_pending_wait());

                assert!(gate.wait(Duration::from_millis(100)).await);
                assert!(!first.await.unwrap());
                assert!(!gate.has_pending_wait());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_wait() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let gate = Rc::new(LookupGate::new());
                let waiter = {
                    let gate = gate.clone();
                    tokio::task::spawn_local(async move { gate.wait(Duration::from_millis(100)).await })
                };
                tokio::task::yield_now().await;

                gate.clear();
                assert!(!waiter.await.unwrap());
                gate.clear();
            })
            .await;
    }

    #[test]
    fn test_single_flight() {
        let gate = LookupGate::new();
        let guard = gate.try_begin().expect("slot is free");
        assert!(gate.is_in_flight());
        assert!(gate.try_begin().is_none());

        drop(guard);
        assert!(!gate.is_in_flight());
        assert!(gate.try_begin().is_some());
    }
}
