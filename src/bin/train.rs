//! Train a DQN agent on an episodic environment.
//!
//! Usage:
//! ```bash
//! cargo run --release --bin train
//! cargo run --release --bin train -- --config config.json
//! cargo run --release --bin train -- --resume --episodes 500
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rust_dqn_trainer::{
    agent::{Agent, DQNAgent, DQNConfig},
    environment::make_env,
    training::{timestamp_run_name, CheckpointStore, MetricsAggregator, Reporter, TrainingLoop},
    utils::AppConfig,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train a DQN agent")]
struct Args {
    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resume from the newest checkpoint under the models root
    #[arg(long)]
    resume: bool,

    /// Override the episode budget
    #[arg(long)]
    episodes: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::from_env(),
    };
    if let Some(episodes) = args.episodes {
        config.training.num_episodes = episodes;
    }

    let mut env = make_env(&config.environment.id)?;

    let agent_config = DQNConfig {
        learning_rate: config.agent.learning_rate,
        momentum: config.agent.momentum,
        gamma: config.agent.gamma,
        epsilon_start: config.agent.epsilon_start,
        epsilon_end: config.agent.epsilon_end,
        epsilon_decay: config.agent.epsilon_decay,
        replay_capacity: config.agent.replay_capacity,
        batch_size: config.agent.batch_size,
        target_update_freq: config.agent.target_update_freq,
        tau: config.agent.tau,
        hidden_layers: config.agent.hidden_layers.clone(),
    };
    let mut agent = DQNAgent::new(env.state_size(), env.action_size(), agent_config);

    let models_root = Path::new(&config.storage.models_root);

    // Restoring only continues model, optimizer and progress counters; the
    // statistics start fresh with the new run
    let (start_episode, start_step) = if args.resume {
        let checkpoint = CheckpointStore::load_latest(models_root)
            .context("no checkpoint to resume from")?;
        agent.restore(&checkpoint.to_snapshot())?;
        info!(
            "resuming from episode {} (step {}, eps {:.3})",
            checkpoint.episode, checkpoint.step, checkpoint.exploration_rate
        );
        (checkpoint.episode, checkpoint.step)
    } else {
        (0, 0)
    };

    let run_name = timestamp_run_name();
    let store = CheckpointStore::create(models_root, &run_name)?;
    let log_dir = format!("{}/{}", config.storage.logs_root, run_name);
    let mut reporter = Reporter::new(&log_dir, config.training.report_interval);
    let mut metrics = MetricsAggregator::new(config.training.moving_avg_window);

    info!(
        "starting run {}: {} agent, {} episodes of up to {} steps on {}",
        run_name,
        agent.name(),
        config.training.num_episodes,
        config.training.max_steps_per_episode,
        config.environment.id,
    );

    let mut training = TrainingLoop::new(
        env.as_mut(),
        &mut agent,
        &config.training,
        &mut metrics,
        &mut reporter,
    )
    .with_checkpoints(&store)
    .resume_from(start_episode, start_step);

    let summary = training.run()?;

    info!(
        "training complete: {} episodes, {} steps | reward min {:.3} / max {:.3} / running {:.3}",
        summary.episodes,
        summary.global_steps,
        summary.stats.min_reward,
        summary.stats.max_reward,
        summary.stats.running_reward,
    );
    info!("checkpoints in {}", store.dir().display());

    Ok(())
}
