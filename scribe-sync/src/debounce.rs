//! Single-timer debouncing.
//!
//! A burst of `schedule` calls, each less than `delay` after the previous
//! one, runs exactly one action, `delay` after the last call. The armed timer
//! lives in one slot shared by every call so replacing it always cancels the
//! previous one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Default)]
struct TimerSlot {
    /// Incremented by every schedule/cancel; a timer only fires if its
    /// generation is still current when it wakes.
    generation: u64,
    armed: Option<JoinHandle<()>>,
}

pub struct Debouncer {
    delay: Duration,
    slot: Arc<Mutex<TimerSlot>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    /// Replace any armed timer with one that runs `action` after the delay.
    ///
    /// Once the timer fires the slot is cleared before `action` starts, so
    /// later calls never interrupt an action that is already running.
    pub fn schedule<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.armed.take() {
            previous.abort();
            trace!("debounce timer replaced");
        }
        slot.generation += 1;
        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        let delay = self.delay;

        slot.armed = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = shared.lock();
                if slot.generation != generation {
                    return;
                }
                slot.armed = None;
            }
            action().await;
        }));
    }

    /// Drop the armed timer, if any, without running its action.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        match slot.armed.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot.lock().armed.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Instant};

    const DELAY: Duration = Duration::from_millis(2000);

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_into_one_call_after_the_last() {
        let debouncer = Debouncer::new(DELAY);
        let fired: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let mut last_call = Instant::now();
        for _ in 0..5 {
            let fired = Arc::clone(&fired);
            debouncer.schedule(move || async move {
                fired.lock().push(Instant::now());
            });
            last_call = Instant::now();
            sleep(Duration::from_millis(500)).await;
        }

        sleep(DELAY).await;
        let fired = fired.lock();
        assert_eq!(fired.len(), 1);
        let waited = fired[0] - last_call;
        assert!(waited >= DELAY, "fired {waited:?} after last call");
        assert!(waited < DELAY + Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_fire_before_quiet_period() {
        let debouncer = Debouncer::new(DELAY);
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        debouncer.schedule(move || async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        sleep(DELAY - Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_armed());

        sleep(Duration::from_millis(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn separated_calls_fire_separately() {
        let debouncer = Debouncer::new(DELAY);
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let c = Arc::clone(&count);
            debouncer.schedule(move || async move {
                c.fetch_add(1, Ordering::SeqCst);
            });
            sleep(DELAY * 2).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_action() {
        let debouncer = Debouncer::new(DELAY);
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        debouncer.schedule(move || async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        sleep(DELAY * 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn running_action_is_not_interrupted_by_new_schedule() {
        let debouncer = Debouncer::new(DELAY);
        let finished = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&finished);
        debouncer.schedule(move || async move {
            sleep(Duration::from_secs(10)).await;
            f.fetch_add(1, Ordering::SeqCst);
        });
        // let the first action start its long await
        sleep(DELAY + Duration::from_millis(1)).await;

        let f = Arc::clone(&finished);
        debouncer.schedule(move || async move {
            f.fetch_add(10, Ordering::SeqCst);
        });

        sleep(Duration::from_secs(20)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 11);
    }
}
