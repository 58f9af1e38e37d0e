//! Worker configuration.

use std::time::Duration;

use authloop_session::ModelConfig;
use authloop_tick::CheckTimerConfig;

/// Tunables for one auth worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Time between periodic checks. Zero disables them.
    pub check_interval: Duration,
    /// How long `auth_changing` lasts before settling.
    pub settle_delay: Duration,
    /// Capacity of the worker's command queue.
    pub channel_size: usize,
    /// Random extra delay before the first periodic check.
    pub initial_jitter: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            check_interval: CheckTimerConfig::DEFAULT_INTERVAL,
            settle_delay: ModelConfig::DEFAULT_SETTLE_DELAY,
            channel_size: 64,
            initial_jitter: Duration::ZERO,
        }
    }
}

impl WorkerConfig {
    /// A zero-capacity queue can't be built; raise it to one.
    pub fn validated(mut self) -> Self {
        if self.channel_size == 0 {
            tracing::warn!("worker channel_size of 0 raised to 1");
            self.channel_size = 1;
        }
        self
    }

    pub(crate) fn timer(&self) -> CheckTimerConfig {
        CheckTimerConfig {
            interval: self.check_interval,
            initial_jitter: self.initial_jitter,
        }
    }

    pub(crate) fn model(&self) -> ModelConfig {
        ModelConfig {
            settle_delay: self.settle_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_component_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.check_interval, Duration::from_secs(30));
        assert_eq!(config.settle_delay, Duration::from_millis(20));
        assert_eq!(config.channel_size, 64);
    }

    #[test]
    fn test_validated_raises_zero_channel_size() {
        let config = WorkerConfig {
            channel_size: 0,
            ..WorkerConfig::default()
        }
        .validated();
        assert_eq!(config.channel_size, 1);
    }

    #[test]
    fn test_timer_and_model_carry_settings() {
        let config = WorkerConfig {
            check_interval: Duration::from_secs(5),
            settle_delay: Duration::from_millis(1),
            initial_jitter: Duration::from_secs(2),
            ..WorkerConfig::default()
        };
        assert_eq!(config.timer().interval, Duration::from_secs(5));
        assert_eq!(config.timer().initial_jitter, Duration::from_secs(2));
        assert_eq!(config.model().settle_delay, Duration::from_millis(1));
    }
}
