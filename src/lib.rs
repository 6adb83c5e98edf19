pub mod agent;
pub mod config;
pub mod constants;
pub mod course;
pub mod crossover;
mod macros;
pub mod network;
pub mod population;
pub mod random;
pub mod reproduce;
pub mod scenario;
pub mod serialize;

pub use agent::Agent;
pub use config::{Architecture, Config, ConfigError};
pub use course::Course;
pub use network::{activate, PolicyNetwork};
pub use population::Population;
pub use reproduce::{EvolutionEngine, GenerationRecord};
pub use scenario::{Environment, Mode, Stats, Trainer};
pub use serialize::{CodecError, WeightCodec};
