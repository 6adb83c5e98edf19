//! Centralized defaults for neuroflap.
//!
//! All tunable parameters carry the `NEUROFLAP_` prefix. They only seed
//! [crate::config::Config]'s defaults; nothing reads them at runtime otherwise.

// ============================================================================
// Network Architecture
// ============================================================================

/// Length of the observation vector handed to each policy network
pub const NEUROFLAP_INPUT_SIZE: usize = 4;

/// Width of the single hidden layer
pub const NEUROFLAP_HIDDEN_SIZE: usize = 8;

/// Number of network outputs; only the first drives the flap decision
pub const NEUROFLAP_OUTPUT_SIZE: usize = 1;

/// Sigmoid arguments are clipped to ±this before exponentiation. The clip only keeps `exp`
/// finite: in f64 the sigmoid already rounds to exactly 1.0 above roughly 36.7.
pub const NEUROFLAP_SIGMOID_CLIP: f64 = 500.0;

/// Network output above which an agent flaps
pub const NEUROFLAP_FLAP_THRESHOLD: f64 = 0.5;

// ============================================================================
// Evolution Parameters
// ============================================================================

/// Number of agents in every training generation
pub const NEUROFLAP_POPULATION_SIZE: usize = 100;

/// Number of top-ranked agents carried over unchanged
pub const NEUROFLAP_ELITISM_COUNT: usize = 2;

/// Number of agents sampled per tournament
pub const NEUROFLAP_TOURNAMENT_SIZE: usize = 5;

/// Per-parameter probability of receiving a perturbation
pub const NEUROFLAP_MUTATION_RATE: f64 = 0.1;

/// Standard deviation of a mutation perturbation
pub const NEUROFLAP_MUTATION_STRENGTH: f64 = 0.5;

// ============================================================================
// Fitness
// ============================================================================

/// Fitness granted for every tick survived
pub const NEUROFLAP_TICK_REWARD: u64 = 1;

/// Fitness granted for passing an obstacle
pub const NEUROFLAP_OBSTACLE_BONUS: u64 = 100;

// ============================================================================
// Course
// ============================================================================

pub const NEUROFLAP_SCREEN_WIDTH: f64 = 600.0;
pub const NEUROFLAP_SCREEN_HEIGHT: f64 = 600.0;
pub const NEUROFLAP_GROUND_HEIGHT: f64 = 50.0;

pub const NEUROFLAP_BIRD_X: f64 = 100.0;
pub const NEUROFLAP_BIRD_RADIUS: f64 = 15.0;
pub const NEUROFLAP_GRAVITY: f64 = 0.5;
pub const NEUROFLAP_FLAP_STRENGTH: f64 = -8.0;

pub const NEUROFLAP_PIPE_WIDTH: f64 = 60.0;
pub const NEUROFLAP_PIPE_GAP: f64 = 150.0;
pub const NEUROFLAP_PIPE_SPEED: f64 = 4.0;

/// Ticks between pipe spawns
pub const NEUROFLAP_PIPE_SPAWN_RATE: u32 = 90;

/// Ticks before the first pipe of an episode spawns
pub const NEUROFLAP_FIRST_PIPE_DELAY: u32 = 30;

/// Minimum distance between a gap and the ceiling or ground
pub const NEUROFLAP_PIPE_MARGIN: f64 = 80.0;

/// Ticks after which an episode is cut short and every survivor dies
pub const NEUROFLAP_MAX_TICKS: u64 = 20_000;

/// Upper bound for the ticks-per-frame speed multiplier
pub const NEUROFLAP_MAX_SPEED: u32 = 10;
