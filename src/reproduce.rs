//! Generational replacement: ranking, elitism, tournament selection and offspring.

use crate::{
    agent::Agent,
    config::{Architecture, EvolutionConfig},
    crossover::{crossover, mutate},
    population::Population,
};
use rand::{seq::index, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Generation counter plus one best / mean fitness entry per completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub best_fitness_history: Vec<u64>,
    pub avg_fitness_history: Vec<f64>,
}

impl Default for GenerationRecord {
    fn default() -> Self {
        Self {
            generation: 1,
            best_fitness_history: Vec::new(),
            avg_fitness_history: Vec::new(),
        }
    }
}

impl GenerationRecord {
    pub fn best_ever(&self) -> Option<u64> {
        self.best_fitness_history.iter().copied().max()
    }
}

/// Pick a parent from a population ranked fittest-first: sample `size` distinct members and
/// keep the best ranked one.
fn tournament_select<'a, R: Rng + ?Sized>(
    ranked: &[&'a Agent],
    size: usize,
    rng: &mut R,
) -> &'a Agent {
    assert!(size > 0, "tournament needs at least one entrant");
    let winner = index::sample(rng, ranked.len(), size.min(ranked.len()))
        .into_iter()
        .min()
        .expect("tournament has at least one entrant");
    ranked[winner]
}

#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    architecture: Architecture,
    config: EvolutionConfig,
    record: GenerationRecord,
}

impl EvolutionEngine {
    pub fn new(architecture: Architecture, config: EvolutionConfig) -> Self {
        Self {
            architecture,
            config,
            record: GenerationRecord::default(),
        }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn record(&self) -> &GenerationRecord {
        &self.record
    }

    pub fn generation(&self) -> usize {
        self.record.generation
    }

    /// Forget all history and start over at generation 1
    pub fn reset(&mut self) {
        self.record = GenerationRecord::default();
    }

    pub fn initial_population<R: Rng + ?Sized>(&self, rng: &mut R) -> Population {
        Population::random(self.architecture, self.config.population_size, rng)
    }

    /// Breed the next generation from the final fitness of `population`.
    ///
    /// The top `elitism_count` networks are cloned untouched. Every other slot is a uniform
    /// crossover of two tournament winners, mutated independently of its siblings.
    pub fn evolve<R: Rng + ?Sized>(&mut self, population: &Population, rng: &mut R) -> Population {
        let EvolutionConfig {
            population_size,
            elitism_count,
            tournament_size,
            mutation_rate,
            mutation_strength,
        } = self.config;

        let ranked = population.ranked();
        let best = ranked[0].fitness();
        let mean = population.mean_fitness();
        self.record.best_fitness_history.push(best);
        self.record.avg_fitness_history.push(mean);

        let mut next = Vec::with_capacity(population_size);
        next.extend(
            ranked
                .iter()
                .take(elitism_count.min(population_size))
                .map(|elite| elite.respawn()),
        );

        let mut mutated = 0;
        while next.len() < population_size {
            let l = tournament_select(&ranked, tournament_size, rng);
            let r = tournament_select(&ranked, tournament_size, rng);

            let mut child = crossover(l.network(), r.network(), rng);
            mutated += mutate(&mut child, mutation_rate, mutation_strength, rng);
            next.push(Agent::new(child));
        }

        debug!(
            generation = self.record.generation,
            best,
            mean,
            elites = elitism_count.min(population_size),
            mutated,
            "evolved generation"
        );
        self.record.generation += 1;

        Population::new(next)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::WyRng;
    use rand::SeedableRng;

    fn engine(population_size: usize, elitism_count: usize) -> EvolutionEngine {
        EvolutionEngine::new(
            Architecture::new(2, 4, 1),
            EvolutionConfig {
                population_size,
                elitism_count,
                ..EvolutionConfig::default()
            },
        )
    }

    fn score(population: &mut Population, fitness: impl IntoIterator<Item = u64>) {
        for (agent, f) in population.agents_mut().iter_mut().zip(fitness) {
            agent.accrue_fitness(f);
            agent.die();
        }
    }

    #[test]
    fn test_tournament_select() {
        let mut rng = WyRng::seed_from_u64(20);
        let population = {
            let mut p = engine(10, 0).initial_population(&mut rng);
            score(&mut p, (0..10).rev());
            p
        };
        let ranked = population.ranked();

        // a tournament as large as the population always yields the best
        for _ in 0..100 {
            let winner = tournament_select(&ranked, 10, &mut rng);
            assert_eq!(winner.fitness(), 9);
        }

        // size 1 is uniform, so everyone wins sometimes
        let mut wins = [0usize; 10];
        for _ in 0..10_000 {
            wins[9 - tournament_select(&ranked, 1, &mut rng).fitness() as usize] += 1;
        }
        assert!(wins.iter().all(|&w| w > 800), "{wins:?}");

        // bigger tournaments favour the top
        let mut top = 0;
        for _ in 0..10_000 {
            if tournament_select(&ranked, 5, &mut rng).fitness() >= 7 {
                top += 1;
            }
        }
        assert!(top > 8_000, "{top}");
    }

    #[test]
    fn test_evolve_scenario() {
        let mut rng = WyRng::seed_from_u64(21);
        let mut engine = engine(50, 5);
        let mut population = engine.initial_population(&mut rng);
        let fitness = (0..50u64).map(|i| 500 - 10 * i).collect::<Vec<_>>();
        score(&mut population, fitness.iter().copied());

        let next = engine.evolve(&population, &mut rng);

        assert_eq!(next.len(), 50);
        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.record().best_fitness_history, vec![500]);
        let mean = fitness.iter().sum::<u64>() as f64 / 50.;
        assert_eq!(engine.record().avg_fitness_history, vec![mean]);
        assert_eq!(mean, 255.);

        for (elite, source) in next.agents()[..5].iter().zip(population.agents()) {
            assert_eq!(elite.network().parameters(), source.network().parameters());
            assert!(elite.is_alive());
            assert_eq!(elite.fitness(), 0);
        }
        for child in &next.agents()[5..] {
            assert!(child.is_alive());
            assert_eq!(child.fitness(), 0);
        }
    }

    #[test]
    fn test_elites_follow_ranking() {
        let mut rng = WyRng::seed_from_u64(22);
        let mut engine = engine(20, 3);
        let mut population = engine.initial_population(&mut rng);
        // fittest at index 7, then ties between 2 and 11 resolved by order
        let mut fitness = vec![1u64; 20];
        fitness[7] = 90;
        fitness[2] = 40;
        fitness[11] = 40;
        score(&mut population, fitness);

        let next = engine.evolve(&population, &mut rng);
        for (elite, source) in next.agents()[..3].iter().zip([7, 2, 11]) {
            assert_eq!(
                elite.network().parameters(),
                population.agents()[source].network().parameters()
            );
        }
    }

    #[test]
    fn test_size_preserved_across_generations() {
        let mut rng = WyRng::seed_from_u64(23);
        let mut engine = engine(30, 2);
        let mut population = engine.initial_population(&mut rng);
        for generation in 1..=10u64 {
            score(&mut population, (0..30).map(|i| (i * generation) % 17));
            population = engine.evolve(&population, &mut rng);
            assert_eq!(population.len(), 30);
        }
        assert_eq!(engine.generation(), 11);
        assert_eq!(engine.record().best_fitness_history.len(), 10);
        assert_eq!(engine.record().avg_fitness_history.len(), 10);
    }

    #[test]
    fn test_evolve_from_single_agent() {
        let mut rng = WyRng::seed_from_u64(24);
        let mut engine = engine(12, 2);
        let mut population = Population::random(Architecture::new(2, 4, 1), 1, &mut rng);
        score(&mut population, [10]);

        let next = engine.evolve(&population, &mut rng);
        assert_eq!(next.len(), 12);
    }

    #[test]
    fn test_siblings_mutate_independently() {
        let mut rng = WyRng::seed_from_u64(25);
        let mut engine = EvolutionEngine::new(
            Architecture::new(2, 4, 1),
            EvolutionConfig {
                population_size: 10,
                elitism_count: 1,
                mutation_rate: 0.5,
                ..EvolutionConfig::default()
            },
        );
        // identical parents, so any difference between children comes from mutation
        let template = Agent::random(Architecture::new(2, 4, 1), &mut rng);
        let mut population = Population::new(vec![template.respawn(); 10]);
        score(&mut population, [5; 10]);

        let next = engine.evolve(&population, &mut rng);
        let children = next.agents()[1..]
            .iter()
            .map(|a| a.network().parameters())
            .collect::<Vec<_>>();
        let masks = children
            .iter()
            .map(|c| {
                c.iter()
                    .zip(template.network().parameters())
                    .map(|(c, t)| *c != t)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        for (i, l) in masks.iter().enumerate() {
            for r in &masks[i + 1..] {
                assert_ne!(l, r);
            }
        }
    }

    #[test]
    fn test_reset() {
        let mut rng = WyRng::seed_from_u64(26);
        let mut engine = engine(8, 1);
        let mut population = engine.initial_population(&mut rng);
        score(&mut population, 0..8);
        engine.evolve(&population, &mut rng);
        engine.reset();
        assert_eq!(engine.record(), &GenerationRecord::default());
        assert_eq!(engine.generation(), 1);
    }
}
