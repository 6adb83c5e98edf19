use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use neuroflap::{
    random::{default_rng, WyRng},
    Config, Course, Trainer,
};
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evolve a population on the headless course
    Train {
        #[arg(long, default_value_t = 100)]
        generations: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// JSON config file; missing fields use the defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where to write the best network once training ends
        #[arg(long, default_value = "best_brain.json")]
        save: PathBuf,
    },
    /// Replay a saved network for one episode
    Demo {
        #[arg(long)]
        load: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Evolution and pipe layout draw from separate generators, both derived from `seed`.
fn trainer(config: Config, seed: Option<u64>) -> Result<Trainer<Course<WyRng>, WyRng>> {
    let mut rng = seed.map_or_else(default_rng, WyRng::seed_from_u64);
    let course = Course::new(config.course.clone(), WyRng::seed_from_u64(rng.random()));
    Ok(Trainer::new(config, course, rng)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Train {
            generations,
            seed,
            config,
            save,
        } => {
            let mut trainer = trainer(load_config(config.as_ref())?, seed)?;
            for generation in 1..=generations.max(1) {
                trainer.play_episode();
                // keep the last generation around so its best network can be saved
                if generation < generations {
                    trainer.evolve_if_all_dead();
                }
            }

            let stats = trainer.stats();
            info!(
                generation = stats.generation,
                best_fitness = stats.best_fitness,
                best_score = stats.best_score,
                best_ever = trainer.record().best_ever().unwrap_or(stats.best_fitness),
                "training finished"
            );
            trainer
                .save_best(&save)
                .with_context(|| format!("failed to save best network: {}", save.display()))?;
        }
        Command::Demo { load, seed, config } => {
            let mut trainer = trainer(load_config(config.as_ref())?, seed)?;
            trainer
                .load_as_single_agent(&load)
                .with_context(|| format!("failed to load network: {}", load.display()))?;
            let ticks = trainer.play_episode();
            let stats = trainer.stats();
            info!(
                ticks,
                fitness = stats.best_fitness,
                score = stats.best_score,
                "demo episode over"
            );
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&Config::default())?);
        }
    }

    Ok(())
}
