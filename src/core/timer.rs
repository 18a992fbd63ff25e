//! Timer bookkeeping for the host loop
//! Holds due times only; callbacks live with the host

/// Handle returned when a timer is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// How a timer repeats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    /// Fires once then disappears
    Once,
    /// Fires every `period_ms`
    Every(f64),
}

/// Shortest period an interval may have, keeps zero-period timers from spinning
pub const MIN_PERIOD_MS: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    id: TimerId,
    due_ms: f64,
    schedule: Schedule,
}

/// Pending timers ordered by due time
#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: Vec<TimerEntry>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer, returns its handle
    pub fn insert(&mut self, due_ms: f64, schedule: Schedule) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let schedule = match schedule {
            Schedule::Every(period) => Schedule::Every(period.max(MIN_PERIOD_MS)),
            once => once,
        };

        self.entries.push(TimerEntry { id, due_ms, schedule });
        id
    }

    /// Remove a timer, returns false when it was already gone
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest due time among pending timers
    pub fn next_due(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|entry| entry.due_ms)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Take the earliest timer due at or before `now_ms`
    /// Intervals are rescheduled one period later (missed periods are skipped),
    /// one-shots are removed
    pub fn pop_due(&mut self, now_ms: f64) -> Option<TimerId> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due_ms <= now_ms)
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)))
            .map(|(index, _)| index)?;

        let entry = self.entries[index];
        match entry.schedule {
            Schedule::Once => {
                self.entries.remove(index);
            }
            Schedule::Every(period) => {
                let next = entry.due_ms + period;
                self.entries[index].due_ms = if next <= now_ms { now_ms + period } else { next };
            }
        }

        Some(entry.id)
    }
}

const BOUNDARY_EPSILON: f64 = 1e-9;

/// Fixed refresh rate - yields vsync-aligned tick times
#[derive(Debug, Clone, Copy)]
pub struct FixedHz {
    interval_ms: f64,
}

impl FixedHz {
    /// Create refresh timer at given frequency
    pub fn new(hz: f64) -> Self {
        Self {
            interval_ms: 1000.0 / hz.max(1.0),
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// First refresh boundary strictly after `now_ms`
    pub fn next_tick_after(&self, now_ms: f64) -> f64 {
        // Sitting on a boundary (up to float error) counts as past it
        let ticks = (now_ms / self.interval_ms + BOUNDARY_EPSILON).floor() + 1.0;
        ticks * self.interval_ms
    }
}
