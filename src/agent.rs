use crate::{config::Architecture, constants::NEUROFLAP_FLAP_THRESHOLD, network::PolicyNetwork};
use rand::Rng;

/// A bird: one policy network plus the bookkeeping of its current episode.
///
/// Position and velocity belong to the environment. Fitness, score and the alive flag live
/// here; once [Agent::die] has been called none of them change again.
#[derive(Debug, Clone)]
pub struct Agent {
    network: PolicyNetwork,
    fitness: u64,
    score: u32,
    alive: bool,
}

impl Agent {
    pub fn new(network: PolicyNetwork) -> Self {
        Self {
            network,
            fitness: 0,
            score: 0,
            alive: true,
        }
    }

    pub fn random<R: Rng + ?Sized>(architecture: Architecture, rng: &mut R) -> Self {
        Self::new(PolicyNetwork::random(architecture, rng))
    }

    /// A fresh, living agent driven by a deep copy of this agent's network
    pub fn respawn(&self) -> Self {
        Self::new(self.network.clone())
    }

    pub fn network(&self) -> &PolicyNetwork {
        &self.network
    }

    pub fn into_network(self) -> PolicyNetwork {
        self.network
    }

    pub fn fitness(&self) -> u64 {
        self.fitness
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether to flap this tick. Dead agents never flap.
    pub fn decide(&self, observation: &[f64]) -> bool {
        self.alive && self.network.forward(observation)[0] > NEUROFLAP_FLAP_THRESHOLD
    }

    pub fn accrue_fitness(&mut self, delta: u64) {
        if self.alive {
            self.fitness += delta;
        }
    }

    /// Count a passed obstacle and award `bonus`, which should outweigh a tick's reward.
    pub fn mark_passed_obstacle(&mut self, bonus: u64) {
        if self.alive {
            self.score += 1;
            self.fitness += bonus;
        }
    }

    pub fn die(&mut self) {
        self.alive = false;
    }
}
