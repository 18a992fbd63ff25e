use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use log::trace;

use super::clock::TimeSource;
use super::timer::{FixedHz, Schedule, TimerId, TimerQueue};
use crate::error::Result;

/// Callback run before the next display refresh, receives the frame timestamp
pub type FrameCallback = Box<dyn FnOnce(&mut Host, f64)>;

/// Callback run when a timer fires
pub type TimerCallback = Box<dyn FnMut(&mut Host)>;

/// Wraps frame callbacks at request time
/// Implementations observe each invocation and must forward it unchanged
pub trait FrameInterceptor {
    fn wrap(&self, callback: FrameCallback) -> FrameCallback;
}

/// Handle for a pending frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(u64);

/// Single-threaded cooperative event loop
///
/// Owns three kinds of work:
/// - frame callbacks, dispatched in batches on refresh boundaries
/// - interval/timeout timers
/// - local futures (async fetches), polled until stalled after every dispatch
///
/// Every callback runs to completion before the next one starts.
pub struct Host {
    clock: Rc<dyn TimeSource>,
    refresh: FixedHz,
    frame_queue: Vec<(FrameRequestId, FrameCallback)>,
    /// Boundary the queued batch is due at, fixed when the batch opens
    next_refresh_ms: Option<f64>,
    next_frame_id: u64,
    interceptor: Option<Rc<dyn FrameInterceptor>>,
    timers: TimerQueue,
    timer_callbacks: HashMap<TimerId, Option<TimerCallback>>,
    pool: LocalPool,
    spawner: LocalSpawner,
    refreshes: u64,
}

impl Host {
    /// Create host driven by `clock` refreshing at `refresh_hz`
    pub fn new(clock: Rc<dyn TimeSource>, refresh_hz: f64) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();

        Self {
            clock,
            refresh: FixedHz::new(refresh_hz),
            frame_queue: Vec::new(),
            next_refresh_ms: None,
            next_frame_id: 0,
            interceptor: None,
            timers: TimerQueue::new(),
            timer_callbacks: HashMap::new(),
            pool,
            spawner,
            refreshes: 0,
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn clock(&self) -> Rc<dyn TimeSource> {
        Rc::clone(&self.clock)
    }

    /// Model `ms` of work inside the current callback
    pub fn spend(&self, ms: f64) {
        self.clock.spend(ms);
    }

    pub fn refresh_interval_ms(&self) -> f64 {
        self.refresh.interval_ms()
    }

    /// Number of refresh batches dispatched so far
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    // === Frame scheduling ===

    /// Ask for `callback` to run before the next refresh
    /// Passes through the installed interceptor, if any
    pub fn request_frame(&mut self, callback: FrameCallback) -> FrameRequestId {
        let callback = match &self.interceptor {
            Some(interceptor) => interceptor.wrap(callback),
            None => callback,
        };

        let id = FrameRequestId(self.next_frame_id);
        self.next_frame_id += 1;
        if self.next_refresh_ms.is_none() {
            self.next_refresh_ms = Some(self.refresh.next_tick_after(self.now_ms()));
        }
        self.frame_queue.push((id, callback));
        id
    }

    pub fn cancel_frame(&mut self, id: FrameRequestId) -> bool {
        let before = self.frame_queue.len();
        self.frame_queue.retain(|(queued, _)| *queued != id);
        if self.frame_queue.is_empty() {
            self.next_refresh_ms = None;
        }
        self.frame_queue.len() != before
    }

    pub fn pending_frames(&self) -> usize {
        self.frame_queue.len()
    }

    /// Replace the frame interceptor, returning the one it displaced
    pub fn install_frame_interceptor(
        &mut self,
        interceptor: Rc<dyn FrameInterceptor>,
    ) -> Option<Rc<dyn FrameInterceptor>> {
        self.interceptor.replace(interceptor)
    }

    /// Put back a previously displaced interceptor (or none)
    pub fn restore_frame_interceptor(&mut self, previous: Option<Rc<dyn FrameInterceptor>>) {
        self.interceptor = previous;
    }

    /// Currently installed interceptor, for chaining a new one in front of it
    pub fn frame_interceptor(&self) -> Option<Rc<dyn FrameInterceptor>> {
        self.interceptor.clone()
    }

    pub fn has_frame_interceptor(&self) -> bool {
        self.interceptor.is_some()
    }

    // === Timers ===

    pub fn set_interval(&mut self, period_ms: f64, callback: TimerCallback) -> TimerId {
        let due = self.now_ms() + period_ms;
        let id = self.timers.insert(due, Schedule::Every(period_ms));
        self.timer_callbacks.insert(id, Some(callback));
        id
    }

    pub fn set_timeout(&mut self, delay_ms: f64, callback: TimerCallback) -> TimerId {
        let due = self.now_ms() + delay_ms.max(0.0);
        let id = self.timers.insert(due, Schedule::Once);
        self.timer_callbacks.insert(id, Some(callback));
        id
    }

    /// Cancel a timer; safe to call from inside its own callback
    pub fn clear_timer(&mut self, id: TimerId) -> bool {
        self.timer_callbacks.remove(&id);
        self.timers.cancel(id)
    }

    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.timers.contains(id)
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    // === Async ===

    pub fn spawn_local<F>(&self, future: F) -> Result<()>
    where
        F: Future<Output = ()> + 'static,
    {
        self.spawner.spawn_local(future)?;
        Ok(())
    }

    /// Poll local futures until none can make progress
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    // === Loop ===

    /// Run the loop for `duration_ms` from now
    pub fn run_for(&mut self, duration_ms: f64) {
        let deadline = self.now_ms() + duration_ms;
        self.run_until(deadline);
    }

    /// Dispatch timers and refreshes in time order until `deadline_ms`
    pub fn run_until(&mut self, deadline_ms: f64) {
        loop {
            self.pool.run_until_stalled();

            let timer_due = self.timers.next_due();
            // A timer sharing the boundary fires first; the batch stays due
            let frame_due = self.next_refresh_ms;

            let next = match (timer_due, frame_due) {
                (Some(t), Some(f)) => t.min(f),
                (Some(t), None) => t,
                (None, Some(f)) => f,
                (None, None) => f64::INFINITY,
            };

            if next > deadline_ms {
                self.clock.wait_until(deadline_ms);
                break;
            }

            self.clock.wait_until(next);

            match (timer_due, frame_due) {
                (Some(t), Some(f)) if f < t => self.dispatch_frames(),
                (Some(_), _) => self.fire_due_timers(),
                (None, Some(_)) => self.dispatch_frames(),
                (None, None) => {}
            }
        }
    }

    fn dispatch_frames(&mut self) {
        let batch = std::mem::take(&mut self.frame_queue);
        self.next_refresh_ms = None;
        let timestamp = self.now_ms();
        self.refreshes += 1;
        trace!("refresh {} at {:.2}ms: {} callbacks", self.refreshes, timestamp, batch.len());

        for (_, callback) in batch {
            callback(self, timestamp);
        }

        self.pool.run_until_stalled();
    }

    fn fire_due_timers(&mut self) {
        let now = self.now_ms();

        while let Some(id) = self.timers.pop_due(now) {
            let Some(mut callback) = self.timer_callbacks.get_mut(&id).and_then(Option::take) else {
                continue;
            };

            callback(self);

            // Cleared from inside the callback, or a one-shot
            if self.timers.contains(id) {
                if let Some(slot) = self.timer_callbacks.get_mut(&id) {
                    *slot = Some(callback);
                }
            } else {
                self.timer_callbacks.remove(&id);
            }

            self.pool.run_until_stalled();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::render_loop::RenderLoop;
    use std::cell::RefCell;

    fn manual_host() -> (Rc<ManualClock>, Host) {
        let clock = Rc::new(ManualClock::new());
        let host = Host::new(clock.clone(), 60.0);
        (clock, host)
    }

    #[test]
    fn frames_run_on_refresh_boundaries() {
        let (_clock, mut host) = manual_host();
        let stamps = Rc::new(RefCell::new(Vec::new()));

        let sink = stamps.clone();
        host.request_frame(Box::new(move |_, ts| sink.borrow_mut().push(ts)));
        host.run_for(100.0);

        let stamps = stamps.borrow();
        assert_eq!(stamps.len(), 1);
        assert!((stamps[0] - 16.6667).abs() < 0.001);
    }

    #[test]
    fn interval_fires_until_cleared() {
        let (_clock, mut host) = manual_host();
        let count = Rc::new(RefCell::new(0));

        let sink = count.clone();
        let id = host.set_interval(
            100.0,
            Box::new(move |_| *sink.borrow_mut() += 1),
        );

        host.run_for(350.0);
        assert_eq!(*count.borrow(), 3);

        assert!(host.clear_timer(id));
        host.run_for(500.0);
        assert_eq!(*count.borrow(), 3);
    }

    #[test]
    fn timer_can_clear_itself() {
        let (_clock, mut host) = manual_host();
        let count = Rc::new(RefCell::new(0u32));
        let own_id: Rc<RefCell<Option<TimerId>>> = Rc::new(RefCell::new(None));

        let sink = count.clone();
        let id_slot = own_id.clone();
        let id = host.set_interval(
            10.0,
            Box::new(move |host| {
                *sink.borrow_mut() += 1;
                if let Some(id) = *id_slot.borrow() {
                    host.clear_timer(id);
                }
            }),
        );
        *own_id.borrow_mut() = Some(id);

        host.run_for(100.0);
        assert_eq!(*count.borrow(), 1);
        assert!(!host.is_timer_active(id));
    }

    #[test]
    fn timer_on_refresh_boundary_keeps_frame_cadence() {
        let frames_with_timers = |period_ms: Option<f64>| {
            let (_clock, mut host) = manual_host();
            if let Some(period_ms) = period_ms {
                host.set_interval(period_ms, Box::new(|_| {}));
            }
            let render_loop = RenderLoop::start(&mut host, Box::new(|host, _| host.spend(2.0)));
            host.run_for(1000.0);
            (render_loop.frames(), host.refreshes())
        };

        let plain = frames_with_timers(None);
        assert!((59..=60).contains(&plain.0), "{} frames", plain.0);
        assert_eq!(frames_with_timers(Some(100.0)), plain);
        assert_eq!(frames_with_timers(Some(50.0)), plain);
    }

    #[test]
    fn frame_stamps_stay_on_boundaries_past_timers() {
        let (_clock, mut host) = manual_host();
        let stamps = Rc::new(RefCell::new(Vec::new()));
        host.set_interval(100.0, Box::new(|_| {}));

        let sink = stamps.clone();
        RenderLoop::start(&mut host, Box::new(move |_, ts| sink.borrow_mut().push(ts)));
        host.run_for(240.0);

        let interval = host.refresh_interval_ms();
        let stamps = stamps.borrow();
        assert_eq!(stamps.len(), 14);
        for pair in stamps.windows(2) {
            assert!((pair[1] - pair[0] - interval).abs() < 1e-6);
        }
    }

    #[test]
    fn cancelled_frame_never_runs() {
        let (_clock, mut host) = manual_host();
        let ran = Rc::new(RefCell::new(false));

        let sink = ran.clone();
        let id = host.request_frame(Box::new(move |_, _| *sink.borrow_mut() = true));
        assert!(host.cancel_frame(id));

        host.run_for(100.0);
        assert!(!*ran.borrow());
    }

    #[test]
    fn spawned_futures_complete() {
        let (_clock, mut host) = manual_host();
        let done = Rc::new(RefCell::new(false));

        let sink = done.clone();
        host.spawn_local(async move {
            *sink.borrow_mut() = true;
        })
        .unwrap();

        host.run_until_stalled();
        assert!(*done.borrow());
    }

    #[test]
    fn deadline_moves_manual_clock() {
        let (clock, mut host) = manual_host();
        host.run_for(250.0);
        assert_eq!(clock.now_ms(), 250.0);
    }
}
