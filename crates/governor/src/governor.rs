use serde::{Deserialize, Serialize};
use simcore_common::Priority;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Throttling thresholds and history length.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Number of measurements kept per system for the rolling average.
    pub history: usize,
    /// Below this FPS, low and medium systems are throttled hard.
    pub fps_throttle_low: f32,
    /// Below this FPS, low and medium systems run every other tick.
    pub fps_throttle_medium: f32,
    /// At or above this FPS, throttled systems step back toward every tick.
    pub fps_recover: f32,
    pub low_frequency_under_load: u32,
    pub medium_frequency_under_load: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            history: 60,
            fps_throttle_low: 30.0,
            fps_throttle_medium: 45.0,
            fps_recover: 55.0,
            low_frequency_under_load: 4,
            medium_frequency_under_load: 2,
        }
    }
}

/// Cost history and throttle state for one registered system.
#[derive(Debug, Clone)]
pub struct SystemRecord {
    priority: Priority,
    times: Vec<f64>,
    write_idx: usize,
    sum: f64,
    last_time: f64,
    skip_count: u64,
    frequency: u32,
    frame_counter: u32,
}

impl SystemRecord {
    fn new(priority: Priority, history: usize) -> Self {
        Self {
            priority,
            times: vec![0.0; history],
            write_idx: 0,
            sum: 0.0,
            last_time: 0.0,
            skip_count: 0,
            frequency: 1,
            frame_counter: 0,
        }
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Mean over the full history window; slots not yet written count as 0.
    pub fn avg_time_ms(&self) -> f64 {
        self.sum / self.times.len() as f64
    }

    pub fn last_time_ms(&self) -> f64 {
        self.last_time
    }

    /// Ticks on which this system was told not to run.
    pub fn skip_count(&self) -> u64 {
        self.skip_count
    }

    /// Runs once every `frequency` checks.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    fn push_time(&mut self, ms: f64) {
        let evicted = std::mem::replace(&mut self.times[self.write_idx], ms);
        self.sum += ms - evicted;
        self.last_time = ms;
        self.write_idx = (self.write_idx + 1) % self.times.len();
        if self.write_idx == 0 {
            // Resum once per lap so float error cannot accumulate.
            self.sum = self.times.iter().sum();
        }
    }

    fn check(&mut self) -> bool {
        self.frame_counter += 1;
        if self.frame_counter >= self.frequency {
            self.frame_counter = 0;
            true
        } else {
            self.skip_count += 1;
            false
        }
    }
}

/// One row of the performance report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemReport {
    pub name: String,
    pub priority: Priority,
    pub avg_time_ms: f64,
    pub last_time_ms: f64,
    pub skip_count: u64,
    pub frequency: u32,
}

/// Measures each system's cost and lowers how often non-critical systems
/// run while the frame rate is low.
#[derive(Debug)]
pub struct FrameBudgetGovernor {
    config: GovernorConfig,
    names: HashMap<String, usize>,
    systems: Vec<(String, SystemRecord)>,
    frame_start: Option<Instant>,
    frame_elapsed: Duration,
    current_fps: f32,
    frame_count: u64,
    report: Vec<SystemReport>,
    report_dirty: bool,
}

impl Default for FrameBudgetGovernor {
    fn default() -> Self {
        Self::new(GovernorConfig::default())
    }
}

impl FrameBudgetGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        assert!(config.history > 0, "history must be positive");
        Self {
            config,
            names: HashMap::new(),
            systems: Vec::new(),
            frame_start: None,
            frame_elapsed: Duration::ZERO,
            current_fps: 0.0,
            frame_count: 0,
            report: Vec::new(),
            report_dirty: true,
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Start a frame: store the observed FPS and recompute every frequency.
    pub fn begin_frame(&mut self, fps: f32) {
        self.frame_start = Some(Instant::now());
        self.current_fps = fps;
        self.frame_count += 1;
        self.report_dirty = true;
        self.adapt_frequencies();
        tracing::trace!(frame = self.frame_count, fps, "frame begin");
    }

    /// Finish the frame and return its wall-clock duration.
    pub fn end_frame(&mut self) -> Duration {
        if let Some(start) = self.frame_start.take() {
            self.frame_elapsed = start.elapsed();
        }
        self.frame_elapsed
    }

    fn adapt_frequencies(&mut self) {
        let fps = self.current_fps;
        for (name, record) in &mut self.systems {
            let next = next_frequency(&self.config, record.priority, record.frequency, fps);
            if next != record.frequency {
                tracing::debug!(
                    system = %name,
                    priority = %record.priority,
                    from = record.frequency,
                    to = next,
                    fps,
                    "frequency changed"
                );
                record.frequency = next;
            }
        }
    }

    fn slot(&mut self, name: &str, priority: Priority) -> usize {
        if let Some(&idx) = self.names.get(name) {
            return idx;
        }
        let idx = self.systems.len();
        self.systems
            .push((name.to_owned(), SystemRecord::new(priority, self.config.history)));
        self.names.insert(name.to_owned(), idx);
        self.report_dirty = true;
        tracing::debug!(system = name, %priority, "registered system");
        idx
    }

    /// Register a system, or update the priority of an existing one.
    pub fn register(&mut self, name: &str, priority: Priority) {
        let idx = self.slot(name, priority);
        let record = &mut self.systems[idx].1;
        if record.priority != priority {
            record.priority = priority;
            self.report_dirty = true;
        }
    }

    /// Whether `name` may run this tick. Unknown names are registered with
    /// `priority`. A `false` answer counts as a skip.
    pub fn should_run(&mut self, name: &str, priority: Priority) -> bool {
        let idx = self.slot(name, priority);
        self.systems[idx].1.check()
    }

    /// Store a measured duration. Unknown names are registered as `Medium`.
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        let idx = self.slot(name, Priority::Medium);
        self.systems[idx].1.push_time(elapsed.as_secs_f64() * 1000.0);
    }

    /// Run `f` only if the system is allowed to run this tick, timing it.
    pub fn measure<R>(
        &mut self,
        name: &str,
        priority: Priority,
        f: impl FnOnce() -> R,
    ) -> Option<R> {
        if !self.should_run(name, priority) {
            return None;
        }
        let start = Instant::now();
        let out = f();
        self.record(name, start.elapsed());
        Some(out)
    }

    pub fn system(&self, name: &str) -> Option<&SystemRecord> {
        self.names.get(name).map(|&idx| &self.systems[idx].1)
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn current_fps(&self) -> f32 {
        self.current_fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Duration of the last completed frame.
    pub fn frame_elapsed(&self) -> Duration {
        self.frame_elapsed
    }

    /// Per-system summary in registration order.
    ///
    /// Rebuilt at most once per frame; later reads in the same frame return
    /// the cached rows.
    pub fn performance_report(&mut self) -> &[SystemReport] {
        if self.report_dirty {
            for (i, (name, record)) in self.systems.iter().enumerate() {
                match self.report.get_mut(i) {
                    Some(row) => {
                        row.priority = record.priority;
                        row.avg_time_ms = record.avg_time_ms();
                        row.last_time_ms = record.last_time;
                        row.skip_count = record.skip_count;
                        row.frequency = record.frequency;
                    }
                    None => self.report.push(SystemReport {
                        name: name.clone(),
                        priority: record.priority,
                        avg_time_ms: record.avg_time_ms(),
                        last_time_ms: record.last_time,
                        skip_count: record.skip_count,
                        frequency: record.frequency,
                    }),
                }
            }
            self.report_dirty = false;
        }
        &self.report
    }
}

fn next_frequency(config: &GovernorConfig, priority: Priority, current: u32, fps: f32) -> u32 {
    if priority == Priority::Critical {
        return 1;
    }
    if fps < config.fps_throttle_low {
        match priority {
            Priority::Low => config.low_frequency_under_load,
            Priority::Medium => config.medium_frequency_under_load,
            _ => 1,
        }
    } else if fps < config.fps_throttle_medium {
        match priority {
            Priority::Low | Priority::Medium => config.medium_frequency_under_load,
            _ => 1,
        }
    } else if fps >= config.fps_recover {
        current.saturating_sub(1).max(1)
    } else {
        // Between the medium threshold and recovery: hold.
        current
    }
}
