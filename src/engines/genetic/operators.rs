use crate::driver::VariableBinding;
use crate::engines::genetic::genome::{Genome, Individual};
use crate::types::OptimizationDirection;
use rand::Rng;
use std::cmp::Ordering;

/// Tournament selection: best of `tournament_size` random draws
pub fn tournament_selection<R: Rng>(
    population: &[Individual],
    tournament_size: usize,
    direction: OptimizationDirection,
    rng: &mut R,
) -> usize {
    let mut best_idx = rng.gen_range(0..population.len());

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..population.len());
        if population[idx].compare(&population[best_idx], direction) == Ordering::Less {
            best_idx = idx;
        }
    }

    best_idx
}

/// Roulette wheel selection over penalized scores.
///
/// Weights are the distance from the worst finite score plus 1% of the
/// score range, so the worst individual keeps a small chance. Non-finite
/// scores get no weight; a flat population is drawn uniformly.
pub fn roulette_selection<R: Rng>(
    population: &[Individual],
    direction: OptimizationDirection,
    rng: &mut R,
) -> usize {
    let finite = || population.iter().map(|i| i.score).filter(|s| s.is_finite());
    let worst = finite().reduce(|a, b| if direction.is_better(a, b) { b } else { a });
    let best = finite().reduce(|a, b| if direction.is_better(b, a) { b } else { a });

    let (Some(worst), Some(best)) = (worst, best) else {
        return uniform_selection(population, rng);
    };
    let range = (best - worst).abs();
    if range == 0.0 {
        return uniform_selection(population, rng);
    }
    let offset = range * 0.01;

    let weights: Vec<f64> = population
        .iter()
        .map(|i| {
            if i.score.is_finite() {
                (i.score - worst).abs() + offset
            } else {
                0.0
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();

    let mut spin = rng.gen::<f64>() * total;
    for (idx, weight) in weights.iter().enumerate() {
        spin -= weight;
        if spin <= 0.0 && *weight > 0.0 {
            return idx;
        }
    }

    // Fallback for rounding at the end of the wheel
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(population.len() - 1)
}

/// Linear rank selection: the worst individual has weight 1, the best `n`.
pub fn rank_selection<R: Rng>(
    population: &[Individual],
    direction: OptimizationDirection,
    rng: &mut R,
) -> usize {
    let mut order: Vec<usize> = (0..population.len()).collect();
    // Worst first
    order.sort_by(|a, b| population[*b].compare(&population[*a], direction));

    let n = order.len();
    let total = n * (n + 1) / 2;
    let mut spin = rng.gen_range(0..total);
    for (position, idx) in order.iter().enumerate() {
        let weight = position + 1;
        if spin < weight {
            return *idx;
        }
        spin -= weight;
    }

    order[n - 1]
}

pub fn uniform_selection<R: Rng>(population: &[Individual], rng: &mut R) -> usize {
    rng.gen_range(0..population.len())
}

/// Single-point crossover: swap genome tails after a cut in `1..len`
pub fn single_point_crossover<R: Rng>(parent1: &Genome, parent2: &Genome, rng: &mut R) -> (Genome, Genome) {
    let len = parent1.len().min(parent2.len());
    if len <= 1 {
        return (parent1.clone(), parent2.clone());
    }

    let point = rng.gen_range(1..len);

    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();

    child1[point..len].copy_from_slice(&parent2[point..len]);
    child2[point..len].copy_from_slice(&parent1[point..len]);

    (child1, child2)
}

/// Uniform crossover: each gene position is swapped with probability 0.5
pub fn uniform_crossover<R: Rng>(parent1: &Genome, parent2: &Genome, rng: &mut R) -> (Genome, Genome) {
    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();

    for i in 0..child1.len().min(child2.len()) {
        if rng.gen_bool(0.5) {
            std::mem::swap(&mut child1[i], &mut child2[i]);
        }
    }

    (child1, child2)
}

/// Mutation: each gene is resampled from its variable's domain with
/// probability `mutation_rate`
pub fn mutate<R: Rng>(genome: &mut Genome, bindings: &[VariableBinding], mutation_rate: f64, rng: &mut R) {
    for (gene, binding) in genome.iter_mut().zip(bindings) {
        if rng.gen::<f64>() < mutation_rate {
            *gene = binding.sample(rng);
        }
    }
}

/// Generate random genome
pub fn random_genome<R: Rng>(bindings: &[VariableBinding], rng: &mut R) -> Genome {
    bindings.iter().map(|b| b.sample(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn population(scores: &[f64]) -> Vec<Individual> {
        scores
            .iter()
            .map(|s| Individual {
                genome: vec![*s],
                decoded: vec![*s],
                objective: *s,
                violation: 0.0,
                score: *s,
            })
            .collect()
    }

    fn histogram<F: FnMut(&mut StdRng) -> usize>(n: usize, draws: usize, mut select: F) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = vec![0; n];
        for _ in 0..draws {
            counts[select(&mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn test_tournament_prefers_better() {
        let pop = population(&[5.0, 1.0, 3.0]);
        let dir = OptimizationDirection::Minimize;
        let counts = histogram(3, 3000, |rng| tournament_selection(&pop, 2, dir, rng));
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > counts[0]);

        let mut rng = StdRng::seed_from_u64(1);
        // A huge tournament almost surely contains the best
        assert_eq!(tournament_selection(&pop, 64, dir, &mut rng), 1);
    }

    #[test]
    fn test_roulette_respects_direction() {
        let pop = population(&[0.0, 10.0, 20.0]);
        let min = histogram(3, 3000, |rng| roulette_selection(&pop, OptimizationDirection::Minimize, rng));
        assert!(min[0] > min[1] && min[1] > min[2]);
        assert!(min[2] > 0);

        let max = histogram(3, 3000, |rng| roulette_selection(&pop, OptimizationDirection::Maximize, rng));
        assert!(max[2] > max[1] && max[1] > max[0]);
    }

    #[test]
    fn test_roulette_skips_non_finite() {
        let mut pop = population(&[1.0, 2.0, 3.0]);
        pop[2].score = f64::INFINITY;
        let counts = histogram(3, 1000, |rng| roulette_selection(&pop, OptimizationDirection::Minimize, rng));
        assert_eq!(counts[2], 0);

        let flat = population(&[4.0, 4.0]);
        let counts = histogram(2, 1000, |rng| roulette_selection(&flat, OptimizationDirection::Minimize, rng));
        assert!(counts[0] > 0 && counts[1] > 0);
    }

    #[test]
    fn test_rank_weights() {
        let pop = population(&[3.0, 1.0, 2.0]);
        let counts = histogram(3, 6000, |rng| rank_selection(&pop, OptimizationDirection::Minimize, rng));
        // Expected shares 1/6, 3/6, 2/6
        assert!(counts[1] > counts[2] && counts[2] > counts[0]);
        assert!((800..1200).contains(&counts[0]));
    }

    #[test]
    fn test_single_point_crossover_swaps_tails() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = vec![0.0, 0.0, 0.0, 0.0];
        let b = vec![1.0, 1.0, 1.0, 1.0];
        let (c1, c2) = single_point_crossover(&a, &b, &mut rng);
        let point = c1.iter().position(|g| *g == 1.0).unwrap();
        assert!((1..4).contains(&point));
        assert!(c1[point..].iter().all(|g| *g == 1.0));
        assert!(c2[..point].iter().all(|g| *g == 1.0));
        assert!(c2[point..].iter().all(|g| *g == 0.0));

        let (s1, s2) = single_point_crossover(&vec![0.0], &vec![1.0], &mut rng);
        assert_eq!((s1, s2), (vec![0.0], vec![1.0]));
    }

    #[test]
    fn test_uniform_crossover_conserves_genes() {
        let mut rng = StdRng::seed_from_u64(9);
        let a: Genome = (0..16).map(|i| i as f64).collect();
        let b: Genome = (0..16).map(|i| -(i as f64)).collect();
        let (c1, c2) = uniform_crossover(&a, &b, &mut rng);
        for i in 0..16 {
            let mut pair = [c1[i], c2[i]];
            pair.sort_by(|x, y| x.partial_cmp(y).unwrap());
            let mut expected = [a[i], b[i]];
            expected.sort_by(|x, y| x.partial_cmp(y).unwrap());
            assert_eq!(pair, expected);
        }
    }
}
