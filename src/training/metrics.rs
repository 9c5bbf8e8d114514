//! Running and moving statistics over episode rewards and losses.

use crate::error::TrainError;
use std::collections::VecDeque;

/// Retention factor of the exponential running averages (0.99 old / 0.01 new)
const EMA_RETAIN: f64 = 0.99;

/// Everything known about one finished episode
#[derive(Debug, Clone)]
pub struct EpisodeRecord {
    /// 1-based episode index
    pub episode: usize,
    /// Clipped reward accumulated over the episode
    pub reward: f64,
    /// Loss accumulated over the episode's learning updates
    pub loss: f64,
    /// Environment steps taken
    pub steps: usize,
    /// Wall-clock episode duration
    pub duration_secs: f64,
    /// Agent exploration rate at episode end
    pub exploration_rate: f64,
}

impl EpisodeRecord {
    /// Mean wall-clock time per environment step
    pub fn mean_step_time(&self) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        self.duration_secs / self.steps as f64
    }
}

/// Smoothing strategy applied to a scalar series, one variant per averaging
/// scheme
#[derive(Debug, Clone)]
pub enum Smoother {
    /// Exponential moving average, seeded with the first observation
    Exponential { retain: f64, value: Option<f64> },
    /// Simple moving average over the last `size` raw values; undefined until
    /// the window fills
    Window { size: usize, values: VecDeque<f64> },
}

impl Smoother {
    /// Exponential variant keeping `retain` of the previous value per update
    pub fn exponential(retain: f64) -> Self {
        Self::Exponential {
            retain,
            value: None,
        }
    }

    /// Sliding-window variant over the last `size` values
    pub fn window(size: usize) -> Self {
        assert!(size >= 1, "window size must be at least 1");
        Self::Window {
            size,
            values: VecDeque::with_capacity(size),
        }
    }

    /// Fold one sample in and return the updated value, if defined yet
    pub fn update(&mut self, sample: f64) -> Option<f64> {
        match self {
            Smoother::Exponential { retain, value } => {
                let next = match *value {
                    Some(previous) => *retain * previous + (1.0 - *retain) * sample,
                    None => sample,
                };
                *value = Some(next);
                Some(next)
            }
            Smoother::Window { size, values } => {
                if values.len() == *size {
                    values.pop_front();
                }
                values.push_back(sample);
                if values.len() < *size {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / *size as f64)
                }
            }
        }
    }

    /// Current value, if defined yet
    pub fn value(&self) -> Option<f64> {
        match self {
            Smoother::Exponential { value, .. } => *value,
            Smoother::Window { size, values } => {
                if values.len() < *size {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / *size as f64)
                }
            }
        }
    }
}

/// Aggregated statistics at a point in the run
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    /// Episodes folded in so far
    pub episodes: usize,
    pub min_reward: f64,
    pub max_reward: f64,
    /// Arithmetic mean reward over all episodes
    pub mean_reward: f64,
    /// Exponential running average of episode rewards
    pub running_reward: f64,
    /// Exponential running average of episode losses
    pub running_loss: f64,
    /// Simple moving average of recent rewards; `None` until the window fills
    pub moving_avg_reward: Option<f64>,
}

/// Owns the per-run reward/loss statistics; constructed once per training run
pub struct MetricsAggregator {
    episodes: usize,
    min_reward: f64,
    max_reward: f64,
    reward_sum: f64,
    running_reward: Smoother,
    running_loss: Smoother,
    moving_reward: Smoother,
}

impl MetricsAggregator {
    /// Create an aggregator with the given moving-average window (in episodes)
    pub fn new(moving_avg_window: usize) -> Self {
        Self {
            episodes: 0,
            min_reward: f64::INFINITY,
            max_reward: f64::NEG_INFINITY,
            reward_sum: 0.0,
            running_reward: Smoother::exponential(EMA_RETAIN),
            running_loss: Smoother::exponential(EMA_RETAIN),
            moving_reward: Smoother::window(moving_avg_window),
        }
    }

    /// Fold one finished episode into the running statistics.
    ///
    /// Non-finite rewards/losses and empty episodes are rejected before any
    /// state changes, so a bad value can never poison the averages.
    pub fn record(&mut self, record: &EpisodeRecord) -> Result<StatsSnapshot, TrainError> {
        if !record.reward.is_finite() {
            return Err(TrainError::InvalidMetric {
                episode: record.episode,
                name: "episode_reward",
                value: record.reward,
            });
        }
        if !record.loss.is_finite() {
            return Err(TrainError::InvalidMetric {
                episode: record.episode,
                name: "episode_loss",
                value: record.loss,
            });
        }
        if record.steps == 0 {
            return Err(TrainError::InvalidMetric {
                episode: record.episode,
                name: "step_count",
                value: 0.0,
            });
        }

        self.episodes += 1;
        self.min_reward = self.min_reward.min(record.reward);
        self.max_reward = self.max_reward.max(record.reward);
        self.reward_sum += record.reward;
        self.running_reward.update(record.reward);
        self.running_loss.update(record.loss);
        self.moving_reward.update(record.reward);

        Ok(self.snapshot())
    }

    /// Current statistics without folding anything in
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            episodes: self.episodes,
            min_reward: self.min_reward,
            max_reward: self.max_reward,
            mean_reward: if self.episodes == 0 {
                0.0
            } else {
                self.reward_sum / self.episodes as f64
            },
            running_reward: self.running_reward.value().unwrap_or(0.0),
            running_loss: self.running_loss.value().unwrap_or(0.0),
            moving_avg_reward: self.moving_reward.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(episode: usize, reward: f64, loss: f64) -> EpisodeRecord {
        EpisodeRecord {
            episode,
            reward,
            loss,
            steps: 10,
            duration_secs: 1.0,
            exploration_rate: 0.5,
        }
    }

    #[test]
    fn test_max_tracks_true_maximum() {
        let mut metrics = MetricsAggregator::new(5);
        let rewards = [3.0, -1.0, 7.5, 2.0, 7.4, 0.0];
        let mut true_max = f64::NEG_INFINITY;

        for (i, &reward) in rewards.iter().enumerate() {
            let stats = metrics.record(&record(i + 1, reward, 0.1)).unwrap();
            true_max = true_max.max(reward);
            assert_eq!(stats.max_reward, true_max);
        }
    }

    #[test]
    fn test_min_tracks_true_minimum() {
        let mut metrics = MetricsAggregator::new(5);
        metrics.record(&record(1, 2.0, 0.1)).unwrap();
        let stats = metrics.record(&record(2, -4.0, 0.1)).unwrap();

        assert_eq!(stats.min_reward, -4.0);
    }

    #[test]
    fn test_moving_average_over_full_window() {
        let mut metrics = MetricsAggregator::new(5);

        for (i, reward) in [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().enumerate() {
            metrics.record(&record(i + 1, reward, 0.1)).unwrap();
        }
        assert_eq!(metrics.snapshot().moving_avg_reward, Some(3.0));

        // Window slides: [2, 3, 4, 5, 6] -> 4.0
        let stats = metrics.record(&record(6, 6.0, 0.1)).unwrap();
        assert_eq!(stats.moving_avg_reward, Some(4.0));
    }

    #[test]
    fn test_moving_average_undefined_during_warmup() {
        let mut metrics = MetricsAggregator::new(5);

        for i in 1..=4 {
            let stats = metrics.record(&record(i, 1.0, 0.1)).unwrap();
            assert_eq!(stats.moving_avg_reward, None);
        }
    }

    #[test]
    fn test_running_average_seeded_with_first_value() {
        let mut metrics = MetricsAggregator::new(5);
        let stats = metrics.record(&record(1, 10.0, 2.0)).unwrap();

        assert_eq!(stats.running_reward, 10.0);
        assert_eq!(stats.running_loss, 2.0);

        let stats = metrics.record(&record(2, 0.0, 0.0)).unwrap();
        assert!((stats.running_reward - 9.9).abs() < 1e-9);
        assert!((stats.running_loss - 1.98).abs() < 1e-9);
    }

    #[test]
    fn test_nan_reward_is_rejected() {
        let mut metrics = MetricsAggregator::new(5);
        metrics.record(&record(1, 1.0, 0.1)).unwrap();

        let err = metrics.record(&record(2, f64::NAN, 0.1)).unwrap_err();
        assert!(matches!(err, TrainError::InvalidMetric { name: "episode_reward", .. }));

        // The bad episode left no trace
        let stats = metrics.snapshot();
        assert_eq!(stats.episodes, 1);
        assert_eq!(stats.max_reward, 1.0);
    }

    #[test]
    fn test_infinite_loss_is_rejected() {
        let mut metrics = MetricsAggregator::new(5);
        let err = metrics.record(&record(1, 1.0, f64::INFINITY)).unwrap_err();

        assert!(matches!(err, TrainError::InvalidMetric { name: "episode_loss", .. }));
    }

    #[test]
    fn test_zero_steps_is_rejected() {
        let mut metrics = MetricsAggregator::new(5);
        let mut bad = record(1, 1.0, 0.1);
        bad.steps = 0;

        let err = metrics.record(&bad).unwrap_err();
        assert!(matches!(err, TrainError::InvalidMetric { name: "step_count", .. }));
    }

    #[test]
    fn test_mean_step_time() {
        let mut episode = record(1, 1.0, 0.1);
        episode.steps = 4;
        episode.duration_secs = 2.0;

        assert_eq!(episode.mean_step_time(), 0.5);
    }
}
