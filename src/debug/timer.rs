use instant::Instant;

/// Which phase of the frame is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemPhase {
    Movement = 0,
    Wander = 1,
    Animation = 2,
    BuildInstances = 3,
    SceneSync = 4,
}

impl SystemPhase {
    pub const ALL: [SystemPhase; 5] = [
        Self::Movement,
        Self::Wander,
        Self::Animation,
        Self::BuildInstances,
        Self::SceneSync,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Movement => "Movement",
            Self::Wander => "Wander",
            Self::Animation => "Animation",
            Self::BuildInstances => "Build Inst.",
            Self::SceneSync => "Scene Sync",
        }
    }
}

/// Per-system timing with exponential moving average smoothing.
pub struct SystemTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; 5],
    /// Timestamp when `begin()` was called.
    start: Instant,
}

const EMA_ALPHA: f64 = 0.1;

impl SystemTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; 5],
            start: Instant::now(),
        }
    }

    /// Call before a system runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a system finishes. Records elapsed time for `phase`.
    pub fn end(&mut self, phase: SystemPhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        self.record(phase, elapsed_us);
    }

    fn record(&mut self, phase: SystemPhase, elapsed_us: f64) {
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    /// Sum of all phase durations (microseconds).
    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }
}

impl Default for SystemTimers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_moves_toward_samples() {
        let mut timers = SystemTimers::new();
        timers.record(SystemPhase::Wander, 100.0);
        assert!((timers.durations_us[1] - 10.0).abs() < 1e-9);
        timers.record(SystemPhase::Wander, 100.0);
        assert!((timers.durations_us[1] - 19.0).abs() < 1e-9);
        assert!((timers.total_us() - 19.0).abs() < 1e-9);
    }

    #[test]
    fn phases_index_their_slot() {
        for (i, phase) in SystemPhase::ALL.iter().enumerate() {
            assert_eq!(*phase as usize, i);
            assert!(!phase.label().is_empty());
        }
    }
}
