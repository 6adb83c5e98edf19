//! The driving loop: an [Environment] plays episodes with a [Population], and a [Trainer]
//! replaces the population whenever every agent has died.

use crate::{
    config::{Config, ConfigError},
    constants::NEUROFLAP_MAX_SPEED,
    population::Population,
    reproduce::{EvolutionEngine, GenerationRecord},
    serialize::{CodecError, WeightCodec},
};
use rand::Rng;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Whatever the agents live in. Each tick it must ask every living agent to decide, apply the
/// consequences, accrue fitness and kill agents as needed. It owns agents' positions.
pub trait Environment {
    /// Length of the observation vector handed to [crate::Agent::decide]
    fn observation_size(&self) -> usize;

    /// Return to the start of a fresh episode.
    fn reset(&mut self);

    /// Advance a single tick for `population`.
    fn step(&mut self, population: &mut Population);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// A full population that evolves between episodes
    Training,
    /// One loaded agent replaying its episode; nothing evolves
    Demo,
}

/// Snapshot for whatever displays the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub mode: Mode,
    pub generation: usize,
    pub population: usize,
    pub alive: usize,
    pub best_fitness: u64,
    pub best_score: u32,
    pub speed: u32,
}

pub struct Trainer<E: Environment, R: Rng> {
    config: Config,
    engine: EvolutionEngine,
    codec: WeightCodec,
    population: Population,
    environment: E,
    rng: R,
    mode: Mode,
    speed: u32,
}

impl<E: Environment, R: Rng> Trainer<E, R> {
    pub fn new(config: Config, mut environment: E, mut rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        if environment.observation_size() != config.architecture.input_size {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "environment observes {} values but networks take {}",
                    environment.observation_size(),
                    config.architecture.input_size
                ),
            });
        }

        let engine = EvolutionEngine::new(config.architecture, config.evolution.clone());
        let population = engine.initial_population(&mut rng);
        environment.reset();

        Ok(Self {
            codec: WeightCodec::new(config.architecture),
            config,
            engine,
            population,
            environment,
            rng,
            mode: Mode::Training,
            speed: 1,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    pub fn record(&self) -> &GenerationRecord {
        self.engine.record()
    }

    pub fn generation(&self) -> usize {
        self.engine.generation()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Ticks per [Trainer::step_frame], clamped to `1..=NEUROFLAP_MAX_SPEED`
    pub fn set_speed(&mut self, speed: u32) {
        self.speed = speed.clamp(1, NEUROFLAP_MAX_SPEED);
    }

    pub fn stats(&self) -> Stats {
        let best = self.population.best();
        Stats {
            mode: self.mode,
            generation: self.generation(),
            population: self.population.len(),
            alive: self.population.alive_count(),
            best_fitness: best.fitness(),
            best_score: best.score(),
            speed: self.speed,
        }
    }

    /// Brand new random population at generation 1, history cleared.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.population = self.engine.initial_population(&mut self.rng);
        self.mode = Mode::Training;
        self.environment.reset();
        info!("training reset");
    }

    pub fn tick(&mut self) {
        self.environment.step(&mut self.population);
    }

    /// Run `speed` ticks back to back, as one display frame would.
    pub fn step_frame(&mut self) {
        for _ in 0..self.speed {
            if self.population.all_dead() {
                break;
            }
            self.tick();
        }
    }

    /// If no agent is left alive, start the next episode and return true. Training breeds a
    /// new generation; demo mode replays the same network.
    pub fn evolve_if_all_dead(&mut self) -> bool {
        if !self.population.all_dead() {
            return false;
        }

        self.population = match self.mode {
            Mode::Training => self.engine.evolve(&self.population, &mut self.rng),
            Mode::Demo => Population::single(self.population.best().network().clone()),
        };
        if self.mode == Mode::Training {
            let record = self.engine.record();
            info!(
                generation = record.generation,
                best = record.best_fitness_history.last().copied().unwrap_or_default(),
                avg = record.avg_fitness_history.last().copied().unwrap_or_default(),
                "new generation"
            );
        }
        self.environment.reset();
        true
    }

    /// Tick until every agent is dead. Returns the number of ticks played.
    pub fn play_episode(&mut self) -> u64 {
        let mut ticks = 0;
        while !self.population.all_dead() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// [Trainer::play_episode], then move on to the next one.
    pub fn run_generation(&mut self) -> u64 {
        let ticks = self.play_episode();
        self.evolve_if_all_dead();
        ticks
    }

    /// Save the network of the currently fittest agent.
    pub fn save_best<P: AsRef<Path>>(&self, path: P) -> Result<(), CodecError> {
        self.codec.save(self.population.best().network(), path)
    }

    /// Swap in a single loaded agent and switch to demo mode. On error nothing changes.
    pub fn load_as_single_agent<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CodecError> {
        let network = self.codec.load(path).inspect_err(|e| {
            warn!("keeping current population: {e}");
        })?;
        self.population = Population::single(network);
        self.mode = Mode::Demo;
        self.environment.reset();
        Ok(())
    }
}
