//! Arpeggio step timing, driven by the audio clock.

/// Frequency of `step` for a held `base` frequency: cyclic semitone offsets.
pub fn arpeggio_frequency(base: f32, pattern: &[i32], step: usize) -> f32 {
    if pattern.is_empty() {
        return base;
    }
    let offset = pattern[step % pattern.len()];
    base * (2.0_f32).powf(offset as f32 / 12.0)
}

/// A single periodic timer. At most one exists; the owner holds it in an `Option`
/// and drops it to cancel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepTimer {
    interval: f64,
    next_due: f64,
}

impl StepTimer {
    /// Timer whose first tick is due immediately at `now`.
    pub fn new(rate: f32, now: f64) -> Self {
        Self {
            interval: interval_for(rate),
            next_due: now,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn next_due(&self) -> f64 {
        self.next_due
    }

    /// Change the rate; the next tick keeps its due time.
    pub fn set_rate(&mut self, rate: f32) {
        self.interval = interval_for(rate);
    }

    /// Start time of the step that is due at `now`, advancing the timer, or
    /// `None` if nothing is due. A timer that fell more than one interval
    /// behind resyncs to `now` instead of firing a burst of stale steps.
    pub fn poll(&mut self, now: f64) -> Option<f64> {
        if now < self.next_due {
            return None;
        }
        let fire_at = if now - self.next_due > self.interval {
            now
        } else {
            self.next_due
        };
        self.next_due = fire_at + self.interval;
        Some(fire_at)
    }
}

fn interval_for(rate: f32) -> f64 {
    let rate = if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        crate::constants::ARP_MIN_RATE
    };
    1.0 / rate as f64
}
