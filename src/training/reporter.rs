//! Console and TensorBoard reporting of per-episode statistics.

use crate::error::TrainError;
use crate::training::metrics::{EpisodeRecord, StatsSnapshot};
use crate::utils::{MemoryMonitor, MemoryUsage};
use tensorboard_rs::summary_writer::SummaryWriter;
use tracing::info;

/// Emits a console line and TensorBoard scalars for finished episodes, and
/// enforces the memory safety valve
pub struct Reporter {
    interval: usize,
    writer: SummaryWriter,
    memory: MemoryMonitor,
}

impl Reporter {
    /// `log_dir` is the run's TensorBoard event directory; `interval` is the
    /// reporting stride in episodes (0 is treated as every episode)
    pub fn new(log_dir: &str, interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            writer: SummaryWriter::new(log_dir),
            memory: MemoryMonitor::new(),
        }
    }

    /// Whether `episode` falls on the reporting interval
    fn on_interval(interval: usize, episode: usize) -> bool {
        episode % interval == 0
    }

    /// Report one finished episode.
    ///
    /// Memory is sampled on every call so the safety valve does not wait for
    /// a reporting episode; console and telemetry output happen only when the
    /// episode falls on the interval.
    pub fn report(
        &mut self,
        record: &EpisodeRecord,
        stats: &StatsSnapshot,
    ) -> Result<(), TrainError> {
        let memory = self.memory.sample();
        if memory.exceeds_limit() {
            return Err(TrainError::ResourceExhaustion {
                used_gb: memory.used_gb(),
                total_gb: memory.total_gb(),
            });
        }

        if !Self::on_interval(self.interval, record.episode) {
            return Ok(());
        }

        self.emit_console(record, stats, &memory);
        self.emit_scalars(record, stats);
        Ok(())
    }

    fn emit_console(&self, record: &EpisodeRecord, stats: &StatsSnapshot, memory: &MemoryUsage) {
        let moving_avg = match stats.moving_avg_reward {
            Some(value) => format!("{value:.3}"),
            None => "warming up".to_string(),
        };

        info!(
            "episode {:>4} | reward {:>8.3} (min {:.3} | max {:.3} | mean {:.3}) | \
             running reward {:.3} | moving avg {} | running loss {:.4} | eps {:.3} | \
             steps {:>4} | {:.2}s ({:.1} ms/step) | {:.1}/{:.1} GB RAM",
            record.episode,
            record.reward,
            stats.min_reward,
            stats.max_reward,
            stats.mean_reward,
            stats.running_reward,
            moving_avg,
            stats.running_loss,
            record.exploration_rate,
            record.steps,
            record.duration_secs,
            record.mean_step_time() * 1000.0,
            memory.used_gb(),
            memory.total_gb(),
        );
    }

    /// Scalar series are keyed by episode index
    fn emit_scalars(&mut self, record: &EpisodeRecord, stats: &StatsSnapshot) {
        let step = record.episode;
        self.writer
            .add_scalar("reward/episode", record.reward as f32, step);
        self.writer
            .add_scalar("reward/max", stats.max_reward as f32, step);
        self.writer
            .add_scalar("reward/running", stats.running_reward as f32, step);
        self.writer
            .add_scalar("loss/running", stats.running_loss as f32, step);
        if let Some(moving_avg) = stats.moving_avg_reward {
            self.writer
                .add_scalar("reward/moving_avg", moving_avg as f32, step);
        }
        self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_gating() {
        // interval = 3 emits only on episodes 3, 6, 9, ...
        let emitted: Vec<usize> = (1..=9)
            .filter(|&episode| Reporter::on_interval(3, episode))
            .collect();

        assert_eq!(emitted, vec![3, 6, 9]);
    }

    #[test]
    fn test_interval_of_one_emits_every_episode() {
        for episode in 1..=5 {
            assert!(Reporter::on_interval(1, episode));
        }
    }

    #[test]
    fn test_zero_interval_is_normalized() {
        let dir = tempfile::TempDir::new().unwrap();
        let reporter = Reporter::new(dir.path().to_str().unwrap(), 0);

        assert_eq!(reporter.interval, 1);
    }
}
