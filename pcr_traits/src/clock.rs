use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source for the acquisition loop.
///
/// The controller blocks on `sleep()` for the sensor settle delay, and the runner
/// uses it to pace cycle ticks. Tests swap in [`test_clock::TestClock`] so a
/// 31-cycle run completes instantly.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-clock implementation backed by `std::time::Instant` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Deterministic clock: `sleep(d)` advances virtual time by `d` and records it.
    ///
    /// Clones share the same timeline, so a test can hand one clone to the
    /// controller and inspect the recorded sleeps through another.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        state: Arc<Mutex<State>>,
    }

    #[derive(Debug, Default)]
    struct State {
        offset: Duration,
        sleeps: Vec<Duration>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                state: Arc::new(Mutex::new(State::default())),
            }
        }

        /// Advance virtual time without recording a sleep.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut st) = self.state.lock() {
                st.offset = st.offset.saturating_add(d);
            }
        }

        /// Virtual time elapsed since construction.
        pub fn elapsed(&self) -> Duration {
            self.state.lock().map(|st| st.offset).unwrap_or(Duration::ZERO)
        }

        /// Every duration passed to `sleep()`, in call order.
        pub fn sleeps(&self) -> Vec<Duration> {
            self.state
                .lock()
                .map(|st| st.sleeps.clone())
                .unwrap_or_default()
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            if let Ok(mut st) = self.state.lock() {
                st.offset = st.offset.saturating_add(d);
                st.sleeps.push(d);
            }
        }
    }
}
