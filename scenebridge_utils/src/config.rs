use crate::BridgeArgs;
use bon::Builder;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDesc {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowDesc {
    fn default() -> Self {
        Self {
            title: "scenebridge".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl WindowDesc {
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Tuning knobs of the synchronization pipeline.
///
/// Every component receives the config it needs when it is constructed.
#[derive(Debug, Clone, Builder)]
pub struct BridgeConfig {
    #[builder(default)]
    pub window: WindowDesc,
    /// Render loop frame limit. `None` renders as fast as the backend allows.
    pub target_fps: Option<u32>,

    /// Wall-clock budget of one incremental builder drain.
    #[builder(default = Duration::from_millis(4))]
    pub builder_budget: Duration,
    #[builder(default = 4)]
    pub builder_small_batch: usize,
    #[builder(default = 16)]
    pub builder_large_batch: usize,
    /// Queue depth from which the builder switches to small batches.
    #[builder(default = 64)]
    pub builder_deep_queue: usize,

    #[builder(default = Duration::from_millis(4))]
    pub transient_budget: Duration,
    #[builder(default = 64)]
    pub transient_max_per_tick: usize,
    /// Generations a superseded transient resource survives before it is destroyed.
    #[builder(default = 3)]
    pub destroy_after_generations: u64,
    #[builder(default = 60)]
    pub sweep_interval_generations: u64,

    #[builder(default = Duration::from_secs(5))]
    pub log_interval: Duration,
    #[builder(default = Duration::from_secs(1))]
    pub startup_retry_interval: Duration,
    #[builder(default = Duration::from_millis(500))]
    pub stop_wait: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BridgeConfig {
    /// Defaults overridden by the process arguments.
    pub fn from_args() -> Self {
        Self::default().with_args(BridgeArgs::get())
    }

    pub fn with_args(mut self, args: &BridgeArgs) -> Self {
        if args.unlimited_fps {
            self.target_fps = None;
        } else if let Some(fps) = args.target_fps {
            self.target_fps = Some(fps);
        }
        if let Some(ms) = args.builder_budget_ms {
            self.builder_budget = Duration::from_millis(ms);
        }
        if let Some(ms) = args.transient_budget_ms {
            self.transient_budget = Duration::from_millis(ms);
        }
        if let Some(generations) = args.destroy_after {
            self.destroy_after_generations = generations;
        }
        if let Some(ms) = args.log_interval_ms {
            self.log_interval = Duration::from_millis(ms);
        }
        if let Some(size) = args.window_size.flatten() {
            self.window.width = size.x;
            self.window.height = size.y;
        }
        self
    }

    /// Minimum time between two render ticks, if a frame limit is configured.
    pub fn frame_interval(&self) -> Option<Duration> {
        self.target_fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    #[test]
    fn defaults_match_pipeline_constants() {
        let config = BridgeConfig::default();
        assert_eq!(config.destroy_after_generations, 3);
        assert_eq!(config.sweep_interval_generations, 60);
        assert_eq!(config.target_fps, None);
        assert_eq!(config.frame_interval(), None);
        assert!(config.builder_small_batch < config.builder_large_batch);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = BridgeConfig::builder()
            .target_fps(50)
            .builder_budget(Duration::from_millis(2))
            .build();

        assert_eq!(config.frame_interval(), Some(Duration::from_millis(20)));
        assert_eq!(config.builder_budget, Duration::from_millis(2));
        assert_eq!(config.builder_large_batch, 16);
    }

    #[test]
    fn args_are_applied_on_top() {
        let args = BridgeArgs::from_args(
            &["bridge"],
            &["--target-fps", "144", "--window-size", "800x600", "--destroy-after", "5"],
        )
        .unwrap();
        let config = BridgeConfig::default().with_args(&args);

        assert_eq!(config.target_fps, Some(144));
        assert_eq!(config.destroy_after_generations, 5);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
    }

    #[test]
    fn zero_fps_means_unlimited() {
        let config = BridgeConfig::builder().target_fps(0).build();
        assert_eq!(config.frame_interval(), None);
    }
}
