/// Self-throttle against the shared tick clock: "run at most once every
/// `interval` ticks".
///
/// This is what individual behavior systems use on their own; the governor's
/// frequency is a second, independent throttle layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval: u64,
    last_check: u64,
}

impl Cadence {
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            last_check: 0,
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn last_check(&self) -> u64 {
        self.last_check
    }

    /// True if at least `interval` ticks passed since the last due tick;
    /// marks `tick` as the new last check when it is.
    pub fn due(&mut self, tick: u64) -> bool {
        if tick.saturating_sub(self.last_check) < self.interval {
            return false;
        }
        self.last_check = tick;
        true
    }
}
