//! The episode/step training loop.

use crate::agent::{Agent, Experience};
use crate::environment::{Environment, StepResult};
use crate::error::TrainError;
use crate::training::checkpoint::{Checkpoint, CheckpointStore};
use crate::training::metrics::{EpisodeRecord, MetricsAggregator, StatsSnapshot};
use crate::training::reporter::Reporter;
use crate::utils::TrainingConfig;
use std::time::Instant;
use tracing::debug;

/// Raw environment rewards are clipped to [-REWARD_CLIP, REWARD_CLIP] before
/// accumulation and replay storage
pub const REWARD_CLIP: f64 = 1.0;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    /// Episodes executed by this run
    pub episodes: usize,
    /// Global environment steps at exit
    pub global_steps: usize,
    /// Final statistics snapshot
    pub stats: StatsSnapshot,
}

/// Drives episodes and steps, feeding the aggregator, reporter and checkpoint
/// store
pub struct TrainingLoop<'a> {
    env: &'a mut dyn Environment,
    agent: &'a mut dyn Agent,
    config: &'a TrainingConfig,
    metrics: &'a mut MetricsAggregator,
    reporter: &'a mut Reporter,
    checkpoints: Option<&'a CheckpointStore>,
    start_episode: usize,
    global_step: usize,
}

impl<'a> TrainingLoop<'a> {
    pub fn new(
        env: &'a mut dyn Environment,
        agent: &'a mut dyn Agent,
        config: &'a TrainingConfig,
        metrics: &'a mut MetricsAggregator,
        reporter: &'a mut Reporter,
    ) -> Self {
        Self {
            env,
            agent,
            config,
            metrics,
            reporter,
            checkpoints: None,
            start_episode: 0,
            global_step: 0,
        }
    }

    /// Enable checkpointing into `store`
    pub fn with_checkpoints(mut self, store: &'a CheckpointStore) -> Self {
        self.checkpoints = Some(store);
        self
    }

    /// Continue episode and step counting from a restored checkpoint
    pub fn resume_from(mut self, episode: usize, step: usize) -> Self {
        self.start_episode = episode;
        self.global_step = step;
        self
    }

    /// Run the configured episode budget to completion.
    ///
    /// Aborts on the reporter's memory safety valve and on invalid metric
    /// values; both are surfaced, never swallowed.
    pub fn run(&mut self) -> Result<TrainingSummary, TrainError> {
        let checkpoint_interval = self.config.checkpoint_interval.max(1);
        let first = self.start_episode + 1;
        let last = self.start_episode + self.config.num_episodes;

        for episode in first..=last {
            let record = self.run_episode(episode)?;
            let stats = self.metrics.record(&record)?;
            self.reporter.report(&record, &stats)?;

            // Always checkpoint after the final episode so a finished run is
            // resumable and evaluable
            if episode % checkpoint_interval == 0 || episode == last {
                self.save_checkpoint(episode)?;
            }
        }

        Ok(TrainingSummary {
            episodes: self.config.num_episodes,
            global_steps: self.global_step,
            stats: self.metrics.snapshot(),
        })
    }

    fn run_episode(&mut self, episode: usize) -> Result<EpisodeRecord, TrainError> {
        let train_stride = self.config.train_stride.max(1);
        let mut observation = self.env.reset();
        let mut episode_reward = 0.0;
        let mut episode_loss = 0.0;
        let mut steps_taken = 0;
        let started = Instant::now();

        for step in 1..=self.config.max_steps_per_episode {
            let action = self.agent.select_action(&observation);
            let StepResult {
                state: next_observation,
                reward: raw_reward,
                done,
            } = self.env.step(action);

            let reward = raw_reward.clamp(-REWARD_CLIP, REWARD_CLIP);
            self.agent.remember(Experience::new(
                observation,
                action,
                reward,
                next_observation.clone(),
                done,
            ));
            observation = next_observation;

            if step % train_stride == 0 {
                // None while the replay buffer cannot fill a batch yet
                episode_loss += self.agent.train_step().unwrap_or(0.0);
            }

            episode_reward += reward;
            self.global_step += 1;
            steps_taken = step;

            if done {
                break;
            }
        }

        Ok(EpisodeRecord {
            episode,
            reward: episode_reward,
            loss: episode_loss,
            steps: steps_taken,
            duration_secs: started.elapsed().as_secs_f64(),
            exploration_rate: self.agent.exploration_rate(),
        })
    }

    fn save_checkpoint(&self, episode: usize) -> Result<(), TrainError> {
        let store = match self.checkpoints {
            Some(store) => store,
            None => return Ok(()),
        };

        let snapshot = self.agent.snapshot()?;
        let checkpoint = Checkpoint::from_snapshot(episode, self.global_step, snapshot);
        let path = store.save(&checkpoint)?;
        debug!("checkpoint saved to {}", path.display());
        Ok(())
    }
}
