//! Immutable run configuration, loaded from JSON or taken from [crate::constants].

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("failed to access config file: {source}")]
    Io { source: io::Error },
    #[display("failed to parse config file: {source}")]
    Parse { source: serde_json::Error },
    #[display("invalid config: {reason}")]
    Invalid { reason: String },
}

/// Layer sizes shared by every network of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Architecture {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

impl Architecture {
    pub const fn new(input_size: usize, hidden_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            hidden_size,
            output_size,
        }
    }

    /// Length of the flat parameter encoding of a network with this shape
    pub const fn parameter_count(&self) -> usize {
        self.input_size * self.hidden_size
            + self.hidden_size * self.output_size
            + self.hidden_size
            + self.output_size
    }
}

impl Default for Architecture {
    fn default() -> Self {
        Self::new(
            NEUROFLAP_INPUT_SIZE,
            NEUROFLAP_HIDDEN_SIZE,
            NEUROFLAP_OUTPUT_SIZE,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub elitism_count: usize,
    pub tournament_size: usize,
    pub mutation_rate: f64,
    pub mutation_strength: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: NEUROFLAP_POPULATION_SIZE,
            elitism_count: NEUROFLAP_ELITISM_COUNT,
            tournament_size: NEUROFLAP_TOURNAMENT_SIZE,
            mutation_rate: NEUROFLAP_MUTATION_RATE,
            mutation_strength: NEUROFLAP_MUTATION_STRENGTH,
        }
    }
}

/// Physics and layout of the headless obstacle course, plus its fitness rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    pub screen_width: f64,
    pub screen_height: f64,
    pub ground_height: f64,
    pub bird_x: f64,
    pub bird_radius: f64,
    pub gravity: f64,
    pub flap_strength: f64,
    pub pipe_width: f64,
    pub pipe_gap: f64,
    pub pipe_speed: f64,
    pub pipe_spawn_rate: u32,
    pub first_pipe_delay: u32,
    pub pipe_margin: f64,
    pub tick_reward: u64,
    pub obstacle_bonus: u64,
    pub max_ticks: u64,
}

impl CourseConfig {
    /// y coordinate of the ground surface
    pub fn floor(&self) -> f64 {
        self.screen_height - self.ground_height
    }
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            screen_width: NEUROFLAP_SCREEN_WIDTH,
            screen_height: NEUROFLAP_SCREEN_HEIGHT,
            ground_height: NEUROFLAP_GROUND_HEIGHT,
            bird_x: NEUROFLAP_BIRD_X,
            bird_radius: NEUROFLAP_BIRD_RADIUS,
            gravity: NEUROFLAP_GRAVITY,
            flap_strength: NEUROFLAP_FLAP_STRENGTH,
            pipe_width: NEUROFLAP_PIPE_WIDTH,
            pipe_gap: NEUROFLAP_PIPE_GAP,
            pipe_speed: NEUROFLAP_PIPE_SPEED,
            pipe_spawn_rate: NEUROFLAP_PIPE_SPAWN_RATE,
            first_pipe_delay: NEUROFLAP_FIRST_PIPE_DELAY,
            pipe_margin: NEUROFLAP_PIPE_MARGIN,
            tick_reward: NEUROFLAP_TICK_REWARD,
            obstacle_bonus: NEUROFLAP_OBSTACLE_BONUS,
            max_ticks: NEUROFLAP_MAX_TICKS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub architecture: Architecture,
    pub evolution: EvolutionConfig,
    pub course: CourseConfig,
}

impl Config {
    /// Read a (possibly partial) config; missing fields fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io { source })?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let raw = serde_json::to_string_pretty(self).expect("plain config structs serialize");
        fs::write(path, raw).map_err(|source| ConfigError::Io { source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };

        let Architecture {
            input_size,
            hidden_size,
            output_size,
        } = self.architecture;
        if input_size == 0 || hidden_size == 0 || output_size == 0 {
            return invalid("layer sizes must be non-zero");
        }

        let evo = &self.evolution;
        if evo.population_size == 0 {
            return invalid("population_size must be non-zero");
        }
        if evo.elitism_count > evo.population_size {
            return invalid("elitism_count exceeds population_size");
        }
        if evo.tournament_size == 0 {
            return invalid("tournament_size must be at least 1");
        }
        if !(0.0..=1.0).contains(&evo.mutation_rate) {
            return invalid("mutation_rate must lie within [0, 1]");
        }
        if !(evo.mutation_strength >= 0.0 && evo.mutation_strength.is_finite()) {
            return invalid("mutation_strength must be finite and non-negative");
        }

        let course = &self.course;
        if course.pipe_spawn_rate == 0 {
            return invalid("pipe_spawn_rate must be non-zero");
        }
        if course.floor() - course.pipe_gap - 2. * course.pipe_margin < 0. {
            return invalid("pipe gap and margins do not fit between ceiling and ground");
        }

        Ok(())
    }
}
