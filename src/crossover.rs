//! Genetic operators over a network's flat parameter vector.

use crate::network::PolicyNetwork;
use rand::Rng;
use rand_distr::StandardNormal;

/// Uniform crossover: every position independently takes `l`'s or `r`'s value on a fair
/// coin. Values are never blended.
///
/// Parents of different architectures cannot be crossed; that is a configuration error and
/// panics.
pub fn crossover<R: Rng + ?Sized>(
    l: &PolicyNetwork,
    r: &PolicyNetwork,
    rng: &mut R,
) -> PolicyNetwork {
    assert_eq!(
        l.architecture(),
        r.architecture(),
        "cannot cross networks of different architectures"
    );

    let genes = crossover_genes(&l.parameters(), &r.parameters(), rng);
    PolicyNetwork::from_parameters(l.architecture(), &genes)
}

pub fn crossover_genes<R: Rng + ?Sized>(l: &[f64], r: &[f64], rng: &mut R) -> Vec<f64> {
    assert_eq!(l.len(), r.len(), "cannot cross genomes of different lengths");
    l.iter()
        .zip(r)
        .map(|(&l, &r)| if rng.random_bool(0.5) { l } else { r })
        .collect()
}

/// Perturb each gene with probability `rate` by `N(0, 1) * strength`. Returns how many genes
/// were touched.
pub fn mutate_genes<R: Rng + ?Sized>(
    genes: &mut [f64],
    rate: f64,
    strength: f64,
    rng: &mut R,
) -> usize {
    let mut mutated = 0;
    for gene in genes.iter_mut() {
        if rng.random_bool(rate) {
            *gene += rng.sample::<f64, _>(StandardNormal) * strength;
            mutated += 1;
        }
    }
    mutated
}

/// [mutate_genes] applied to a network in place
pub fn mutate<R: Rng + ?Sized>(
    network: &mut PolicyNetwork,
    rate: f64,
    strength: f64,
    rng: &mut R,
) -> usize {
    let mut genes = network.parameters();
    let mutated = mutate_genes(&mut genes, rate, strength, rng);
    network.set_parameters(&genes);
    mutated
}
