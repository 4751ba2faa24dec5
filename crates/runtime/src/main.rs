#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
//! # A2C cart-pole trainer
//!
//! Loads a run configuration (JSON file plus flag overrides), trains an
//! advantage actor-critic agent until the cart-pole task is solved or the
//! episode budget runs out, then plays a few greedy evaluation episodes.
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`; use
//! `RUST_LOG=rl=debug` for a line per episode.

mod cli;

use anyhow::Result;
use clap::Parser;
use rl::{evaluate, A2cAgent, CartPoleEnv, Driver, Env, Outcome};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();
    let config = args.run_config()?;
    tracing::debug!(?config, "run configuration");

    let env = CartPoleEnv::new(config.env.clone(), config.seed)?;
    let agent = A2cAgent::new(
        env.observation_size(),
        env.action_count(),
        config.agent.clone(),
        config.seed,
    )?;

    tracing::info!(
        "Training for at most {} episodes (seed {}, hidden layers {:?})...",
        config.driver.max_episodes,
        config.seed,
        config.agent.hidden_layers
    );
    let mut driver = Driver::new(agent, env, config.driver.clone())?;
    let report = driver.run()?;
    match report.outcome {
        Outcome::Solved { episode, rolling_mean } => {
            tracing::info!("Solved after episode {episode} with rolling mean {rolling_mean:.2}");
        }
        Outcome::BudgetExhausted { episodes } => {
            let last = report.history.last().map_or(0.0, |r| r.rolling_mean);
            tracing::info!("Not solved within {episodes} episodes; rolling mean {last:.2}");
        }
    }

    if config.eval_episodes > 0 {
        let (agent, mut env) = driver.into_parts();
        let totals = evaluate(
            &agent,
            &mut env,
            config.eval_episodes,
            config.driver.max_steps_per_episode,
        )?;
        let mean = totals.iter().sum::<f32>() / totals.len() as f32;
        tracing::info!("Greedy evaluation over {} episodes: mean reward {mean:.1}", totals.len());
    }

    tracing::info!("training finished");
    Ok(())
}
