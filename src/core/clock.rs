use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic millisecond time source driving the host loop
/// Real loops sleep, simulated loops jump
pub trait TimeSource {
    /// Milliseconds since the clock's origin
    fn now_ms(&self) -> f64;

    /// Block (or jump) until `deadline_ms` is reached
    fn wait_until(&self, deadline_ms: f64);

    /// Consume `ms` of time, used to model work done inside a callback
    fn spend(&self, ms: f64);
}

/// Wall clock backed by `Instant`
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create new clock starting now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Reset origin to current time
    pub fn reset(&mut self) {
        self.origin = Instant::now();
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn wait_until(&self, deadline_ms: f64) {
        let remaining = deadline_ms - self.now_ms();
        if remaining > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(remaining / 1000.0));
        }
    }

    fn spend(&self, ms: f64) {
        let deadline = self.now_ms() + ms;
        self.wait_until(deadline);
    }
}

/// Deterministic clock for tests and offline simulation
/// Time only moves when the loop waits or a callback spends it
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: f64) -> Self {
        Self { now: Cell::new(ms) }
    }

    /// Move time forward by `ms`
    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms.max(0.0));
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn wait_until(&self, deadline_ms: f64) {
        // Never rewinds
        if deadline_ms > self.now.get() {
            self.now.set(deadline_ms);
        }
    }

    fn spend(&self, ms: f64) {
        self.advance(ms);
    }
}
