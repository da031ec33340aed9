pub mod backlog;
pub mod timer;

use self::backlog::Backlog;
use self::timer::SystemTimers;

/// Number of frame times to keep in the histogram.
const FRAME_HISTORY_LEN: usize = 300;
/// Number of diagnostic messages kept for display.
const MESSAGE_BACKLOG: usize = 64;
/// How often to log FPS (seconds).
const FPS_LOG_INTERVAL: f64 = 5.0;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Info,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub text: String,
}

/// Diagnostics panel: runtime faults are surfaced here instead of vanishing,
/// alongside frame statistics.
pub struct DebugPanel {
    /// Shown automatically as soon as an error arrives.
    pub visible: bool,

    /// Recent messages, oldest first.
    pub messages: Backlog<Diagnostic>,

    /// Rolling window of frame times (seconds).
    pub frame_times: Backlog<f64>,

    /// Computed stats.
    pub fps: f64,
    pub frame_time_avg: f64,
    pub frame_time_min: f64,
    pub frame_time_max: f64,

    /// Per-system timers (updated by systems::tick).
    pub system_timers: SystemTimers,

    pub error_count: u64,

    // Periodic log accumulator.
    frame_count: u64,
    log_timer: f64,
    log_frame_count: u32,
    log_frame_sum: f64,
    log_frame_min: f64,
    log_frame_max: f64,
}

impl DebugPanel {
    pub fn new() -> Self {
        Self {
            visible: false,
            messages: Backlog::new(MESSAGE_BACKLOG),
            frame_times: Backlog::new(FRAME_HISTORY_LEN),
            fps: 0.0,
            frame_time_avg: 0.0,
            frame_time_min: 0.0,
            frame_time_max: 0.0,
            system_timers: SystemTimers::new(),
            error_count: 0,
            frame_count: 0,
            log_timer: 0.0,
            log_frame_count: 0,
            log_frame_sum: 0.0,
            log_frame_min: f64::MAX,
            log_frame_max: 0.0,
        }
    }

    /// Record a runtime fault. Makes the panel visible.
    pub fn report_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::error!("{text}");
        self.error_count += 1;
        self.visible = true;
        self.messages.push(Diagnostic {
            level: Level::Error,
            text,
        });
    }

    /// Informational banner, e.g. a hint for first-time users.
    pub fn notice(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::info!("{text}");
        self.visible = true;
        self.messages.push(Diagnostic {
            level: Level::Info,
            text,
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter().filter(|d| d.level == Level::Error)
    }

    /// Record a frame time, update rolling stats, and periodically log.
    pub fn record_frame(&mut self, dt: f64) {
        self.frame_count += 1;
        self.frame_times.push(dt);

        let len = self.frame_times.len();
        if len > 0 {
            let mut sum = 0.0;
            let mut min = f64::MAX;
            let mut max = 0.0f64;
            for &t in self.frame_times.iter() {
                sum += t;
                min = min.min(t);
                max = max.max(t);
            }
            self.frame_time_avg = sum / len as f64;
            self.frame_time_min = min;
            self.frame_time_max = max;
            self.fps = if self.frame_time_avg > 0.0 {
                1.0 / self.frame_time_avg
            } else {
                0.0
            };
        }

        self.log_frame_count += 1;
        self.log_frame_sum += dt;
        self.log_frame_min = self.log_frame_min.min(dt);
        self.log_frame_max = self.log_frame_max.max(dt);
        self.log_timer += dt;

        if self.log_timer >= FPS_LOG_INTERVAL {
            let avg_ms = (self.log_frame_sum / self.log_frame_count as f64) * 1000.0;
            let fps = self.log_frame_count as f64 / self.log_timer;
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | sim: {:.1}us | total frames: {}",
                fps,
                avg_ms,
                self.log_frame_min * 1000.0,
                self.log_frame_max * 1000.0,
                self.system_timers.total_us(),
                self.frame_count,
            );
            self.log_timer = 0.0;
            self.log_frame_count = 0;
            self.log_frame_sum = 0.0;
            self.log_frame_min = f64::MAX;
            self.log_frame_max = 0.0;
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for DebugPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_open_the_panel() {
        let mut panel = DebugPanel::new();
        assert!(!panel.visible);
        panel.report_error("scene backend failure: lost context");
        assert!(panel.visible);
        assert_eq!(panel.error_count, 1);
        assert_eq!(panel.errors().count(), 1);
    }

    #[test]
    fn notices_are_not_errors() {
        let mut panel = DebugPanel::new();
        panel.notice("no saved data");
        assert_eq!(panel.errors().count(), 0);
        assert_eq!(panel.messages.len(), 1);
    }

    #[test]
    fn frame_stats_track_window() {
        let mut panel = DebugPanel::new();
        panel.record_frame(0.010);
        panel.record_frame(0.030);
        assert!((panel.frame_time_avg - 0.020).abs() < 1e-12);
        assert_eq!(panel.frame_time_min, 0.010);
        assert_eq!(panel.frame_time_max, 0.030);
        assert!((panel.fps - 50.0).abs() < 1e-9);
        assert_eq!(panel.frame_count(), 2);
    }
}
