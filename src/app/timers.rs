use std::time::{Duration, Instant};

/// Debounced idle timer: every keystroke pushes the deadline out again, so
/// at most one expiry is ever pending.
#[derive(Debug, Clone)]
pub struct IdleClearTimer {
    idle: Duration,
    deadline: Option<Instant>,
}

impl IdleClearTimer {
    pub fn new(idle: Duration) -> Self {
        Self {
            idle,
            deadline: None,
        }
    }

    pub fn rearm(&mut self, now: Instant) {
        self.deadline = Some(now + self.idle);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true once when the deadline has passed, then disarms.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Advanced(u16),
    Finished,
}

/// Cosmetic save bar. Each started save adds its own ticker and every ticker
/// advances the same bar; overlapping saves therefore fill it faster. The
/// first step past 100 hides the bar, resets it and retires all tickers.
#[derive(Debug, Clone)]
pub struct SaveProgress {
    step: u16,
    interval: Duration,
    value: u16,
    tickers: Vec<Instant>,
}

impl SaveProgress {
    pub const DONE_ABOVE: u16 = 100;

    pub fn new(step: u16, interval: Duration) -> Self {
        Self {
            step: step.max(1),
            interval,
            value: 0,
            tickers: Vec::new(),
        }
    }

    pub fn start(&mut self, now: Instant) {
        if self.tickers.is_empty() {
            self.value = 0;
        } else {
            tracing::debug!(
                running = self.tickers.len(),
                "fake save started while another is running"
            );
        }
        self.tickers.push(now + self.interval);
    }

    pub fn is_visible(&self) -> bool {
        !self.tickers.is_empty()
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn active_tickers(&self) -> usize {
        self.tickers.len()
    }

    /// Fraction for a gauge widget, clamped to 1.0.
    pub fn ratio(&self) -> f64 {
        f64::from(self.value.min(Self::DONE_ABOVE)) / f64::from(Self::DONE_ABOVE)
    }

    pub fn tick(&mut self, now: Instant) -> Option<ProgressEvent> {
        let mut advanced = false;
        for idx in 0..self.tickers.len() {
            while now >= self.tickers[idx] {
                self.tickers[idx] += self.interval;
                self.value = self.value.saturating_add(self.step);
                advanced = true;
                if self.value > Self::DONE_ABOVE {
                    self.value = 0;
                    self.tickers.clear();
                    return Some(ProgressEvent::Finished);
                }
            }
        }
        advanced.then_some(ProgressEvent::Advanced(self.value))
    }

    pub fn cancel(&mut self) {
        self.tickers.clear();
        self.value = 0;
    }
}
