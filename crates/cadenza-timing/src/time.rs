use std::cell::Cell;
use std::time::Instant;

use cadenza_types::TimeUs;

/// Abstraction over wall-clock time sources.
/// Implementations: SystemTimeProvider (production), MockTimeProvider (testing).
pub trait TimeProvider {
    /// Current time in microseconds from an arbitrary epoch.
    fn now_us(&self) -> TimeUs;
}

/// Monotonic wall time measured from construction.
pub struct SystemTimeProvider {
    start: Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_us(&self) -> TimeUs {
        self.start.elapsed().as_micros() as TimeUs
    }
}

/// Manually driven time for deterministic tests and simulations.
#[derive(Debug, Default)]
pub struct MockTimeProvider {
    current_us: Cell<TimeUs>,
}

impl MockTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, us: TimeUs) {
        self.current_us.set(us);
    }

    pub fn advance(&self, delta_us: TimeUs) {
        self.current_us.set(self.current_us.get() + delta_us);
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_us(&self) -> TimeUs {
        self.current_us.get()
    }
}

impl<T: TimeProvider + ?Sized> TimeProvider for std::rc::Rc<T> {
    fn now_us(&self) -> TimeUs {
        (**self).now_us()
    }
}
