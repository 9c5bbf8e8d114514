//! Evaluate a trained DQN agent with greedy actions.
//!
//! Usage:
//! ```bash
//! cargo run --release --bin evaluate
//! cargo run --release --bin evaluate -- --episodes 20
//! cargo run --release --bin evaluate -- --checkpoint models/2024-06-15-12-30-00/episode200-step61234.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rust_dqn_trainer::{
    agent::{Agent, DQNAgent, DQNConfig},
    environment::make_env,
    training::CheckpointStore,
    utils::AppConfig,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Evaluate a trained DQN agent")]
struct Args {
    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of evaluation episodes
    #[arg(long, default_value = "5")]
    episodes: usize,

    /// Load this checkpoint file instead of the latest run's newest
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::from_env(),
    };

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

    let checkpoint = match &args.checkpoint {
        Some(path) => CheckpointStore::load(path)
            .with_context(|| format!("loading checkpoint {}", path.display()))?,
        None => CheckpointStore::load_latest(Path::new(&config.storage.models_root))
            .context("no trained run found under the models root")?,
    };
    agent.restore(&checkpoint.to_snapshot())?;
    info!(
        "evaluating checkpoint from episode {} (step {})",
        checkpoint.episode, checkpoint.step
    );

    let mut total_reward = 0.0;
    for episode in 1..=args.episodes {
        let mut observation = env.reset();
        let mut episode_reward = 0.0;
        let mut steps = 0;

        for _ in 0..config.training.max_steps_per_episode {
            let action = agent.greedy_action(&observation);
            let result = env.step(action);

            episode_reward += result.reward;
            steps += 1;
            observation = result.state;

            if result.done {
                break;
            }
        }

        info!("episode {episode}: reward {episode_reward:.2} over {steps} steps");
        total_reward += episode_reward;
    }

    info!(
        "mean reward over {} episodes: {:.2}",
        args.episodes,
        total_reward / args.episodes as f64
    );

    Ok(())
}
