use std::time::Duration;

/// Rolling window of frame durations.
///
/// Keeps a running total so `average` and `fps` are O(1); the loop feeds
/// `fps()` into [`FrameBudgetGovernor::begin_frame`](crate::FrameBudgetGovernor::begin_frame).
#[derive(Debug, Clone)]
pub struct FrameTimer {
    history: Vec<Duration>,
    index: usize,
    filled: bool,
    total: Duration,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            history: vec![Duration::ZERO; capacity],
            index: 0,
            filled: false,
            total: Duration::ZERO,
        }
    }

    pub fn capacity(&self) -> usize {
        self.history.len()
    }

    pub fn record(&mut self, dt: Duration) {
        let evicted = std::mem::replace(&mut self.history[self.index], dt);
        self.total = self.total - evicted + dt;
        self.index = (self.index + 1) % self.history.len();
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.history.len()
        } else {
            self.index
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn window(&self) -> &[Duration] {
        &self.history[..self.count()]
    }

    pub fn average(&self) -> Duration {
        match self.count() {
            0 => Duration::ZERO,
            n => self.total / n as u32,
        }
    }

    pub fn max(&self) -> Duration {
        self.window().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.window().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    /// Frames per second implied by the average frame time; 0 when empty.
    pub fn fps(&self) -> f32 {
        let avg = self.average().as_secs_f32();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    pub fn clear(&mut self) {
        self.history.fill(Duration::ZERO);
        self.index = 0;
        self.filled = false;
        self.total = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_total_survives_many_laps() {
        let mut timer = FrameTimer::new(3);
        for ms in 1..=100 {
            timer.record(Duration::from_millis(ms));
        }

        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(99));
        assert_eq!(timer.min(), Duration::from_millis(98));
        assert_eq!(timer.max(), Duration::from_millis(100));
        let window_sum: Duration = timer.window().iter().sum();
        assert_eq!(timer.total, window_sum);
    }

    #[test]
    fn partial_window_averages_recorded_frames_only() {
        let mut timer = FrameTimer::new(8);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(30));
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert!((timer.fps() - 50.0).abs() < 0.01);
    }

    #[test]
    fn fps_follows_the_latest_window() {
        let mut timer = FrameTimer::new(4);
        assert_eq!(timer.fps(), 0.0);
        for _ in 0..4 {
            timer.record(Duration::from_millis(10));
        }
        assert!((timer.fps() - 100.0).abs() < 0.01);

        for _ in 0..4 {
            timer.record(Duration::from_millis(40));
        }
        assert!((timer.fps() - 25.0).abs() < 0.01);
    }

    #[test]
    fn clear_resets_window() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(5));
        timer.clear();
        assert!(timer.is_empty());
        assert_eq!(timer.average(), Duration::ZERO);
    }
}
