//! An ordered group of agents who play the same episode together.

use crate::{agent::Agent, config::Architecture, network::PolicyNetwork};
use rand::Rng;

#[derive(Debug, Clone)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    /// Panics on an empty collection; every population holds at least one agent.
    pub fn new(agents: Vec<Agent>) -> Self {
        assert!(!agents.is_empty(), "a population needs at least one agent");
        Self { agents }
    }

    pub fn random<R: Rng + ?Sized>(architecture: Architecture, size: usize, rng: &mut R) -> Self {
        Self::new((0..size).map(|_| Agent::random(architecture, rng)).collect())
    }

    /// A population of exactly one agent, as used to replay a saved network
    pub fn single(network: PolicyNetwork) -> Self {
        Self::new(vec![Agent::new(network)])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    pub fn all_dead(&self) -> bool {
        self.agents.iter().all(|a| !a.is_alive())
    }

    /// Agents sorted by descending fitness. The sort is stable, so equally fit agents keep
    /// their population order.
    pub fn ranked(&self) -> Vec<&Agent> {
        let mut ranked = self.agents.iter().collect::<Vec<_>>();
        ranked.sort_by(|l, r| r.fitness().cmp(&l.fitness()));
        ranked
    }

    /// The fittest agent, earliest on ties
    pub fn best(&self) -> &Agent {
        self.agents
            .iter()
            .reduce(|best, a| if a.fitness() > best.fitness() { a } else { best })
            .expect("population is never empty")
    }

    pub fn mean_fitness(&self) -> f64 {
        self.agents.iter().map(|a| a.fitness() as f64).sum::<f64>() / self.len() as f64
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::WyRng;
    use rand::SeedableRng;

    const ARCH: Architecture = Architecture::new(2, 4, 1);

    fn with_fitness(fitness: &[u64]) -> Population {
        let mut rng = WyRng::seed_from_u64(5);
        let mut population = Population::random(ARCH, fitness.len(), &mut rng);
        for (agent, &f) in population.agents_mut().iter_mut().zip(fitness) {
            agent.accrue_fitness(f);
        }
        population
    }

    #[test]
    fn test_random_size() {
        let mut rng = WyRng::seed_from_u64(6);
        let population = Population::random(ARCH, 17, &mut rng);
        assert_eq!(population.len(), 17);
        assert_eq!(population.alive_count(), 17);
        assert!(!population.all_dead());
    }

    #[test]
    #[should_panic(expected = "at least one agent")]
    fn test_empty_panics() {
        Population::new(vec![]);
    }

    #[test]
    fn test_ranked_is_stable() {
        let population = with_fitness(&[3, 7, 3, 9, 7]);
        let order = population
            .ranked()
            .iter()
            .map(|a| {
                population
                    .iter()
                    .position(|b| core::ptr::eq(*a, b))
                    .unwrap()
            })
            .collect::<Vec<_>>();
        assert_eq!(order, vec![3, 1, 4, 0, 2]);
    }

    #[test]
    fn test_best_prefers_earliest() {
        let population = with_fitness(&[3, 9, 9, 1]);
        assert!(core::ptr::eq(population.best(), &population.agents()[1]));
        assert_eq!(population.mean_fitness(), 5.5);
    }

    #[test]
    fn test_all_dead() {
        let mut population = with_fitness(&[1, 2]);
        population.agents_mut()[0].die();
        assert_eq!(population.alive_count(), 1);
        assert!(!population.all_dead());
        population.agents_mut()[1].die();
        assert!(population.all_dead());
    }
}
