use std::collections::VecDeque;
use std::time::Duration;

const DEFAULT_RUNNING_SIZE: usize = 60;

/// What one render tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSample {
    pub duration: Duration,
    pub draws: u32,
    pub uploads: u32,
}

/// Sliding window over the most recent render ticks.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    samples: VecDeque<TickSample>,
    total_ticks: u64,
}

impl FrameCounter {
    pub fn record(&mut self, sample: TickSample) {
        if self.samples.len() >= DEFAULT_RUNNING_SIZE {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.total_ticks += 1;
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn tick_mean(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.samples.iter().map(|s| s.duration).sum();
        sum / self.samples.len() as u32
    }

    pub fn tick_worst(&self) -> Duration {
        self.samples
            .iter()
            .map(|s| s.duration)
            .max()
            .unwrap_or_default()
    }

    pub fn fps_mean(&self) -> u32 {
        let dt = self.tick_mean().as_secs_f32();
        if dt < f32::EPSILON {
            0
        } else {
            (1.0 / dt) as u32
        }
    }

    pub fn draws_mean(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.samples.iter().map(|s| s.draws as u64).sum();
        sum as f32 / self.samples.len() as f32
    }

    /// Uploads inside the current window.
    pub fn uploads(&self) -> u64 {
        self.samples.iter().map(|s| s.uploads as u64).sum()
    }
}
