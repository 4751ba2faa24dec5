use anyhow::{Context, Result};
use clap::Parser;
use rl::RunConfig;
use std::path::PathBuf;

/// Train an advantage actor-critic agent on cart-pole.
#[derive(Debug, Parser)]
#[command(name = "a2c", version, about)]
pub struct Args {
    /// JSON file with a full or partial run configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of training episodes
    #[arg(short, long)]
    pub episodes: Option<usize>,

    /// Seed for weights, sampling and environment resets
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Hidden layer widths, e.g. `--hidden 64,64`
    #[arg(long, value_delimiter = ',')]
    pub hidden: Option<Vec<usize>>,

    /// Adam learning rate
    #[arg(long)]
    pub learning_rate: Option<f32>,

    /// Rolling mean that counts as solved; defaults to the environment's
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Greedy episodes to play after training
    #[arg(long)]
    pub eval_episodes: Option<usize>,
}

impl Args {
    /// Loads the configuration file, if any, and applies the flag overrides.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a valid configuration.
    pub fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => RunConfig::default(),
        };

        if let Some(episodes) = self.episodes {
            config.driver.max_episodes = episodes;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(hidden) = &self.hidden {
            config.agent.hidden_layers.clone_from(hidden);
        }
        if let Some(lr) = self.learning_rate {
            config.agent.learning_rate = lr;
        }
        if let Some(threshold) = self.threshold {
            config.driver.solved_threshold = Some(threshold);
        }
        if let Some(n) = self.eval_episodes {
            config.eval_episodes = n;
        }
        Ok(config)
    }
}
