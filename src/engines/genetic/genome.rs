/// Genome representation for the genetic driver
///
/// A genome holds one gene per registered design variable, in registry
/// order. Continuous and integer genes carry the native value; enumerated
/// genes carry an index into the variable's allowed values. Keeping every
/// gene as a plain `f64` lets crossover slice and swap genomes without
/// caring about kinds, while sampling and mutation dispatch on the
/// [`VariableBinding`](crate::driver::VariableBinding) of each position.
pub type Genome = Vec<f64>;

use crate::driver::Evaluation;
use crate::types::OptimizationDirection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A scored genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub genome: Genome,
    /// Genome in native units, registry order
    pub decoded: Vec<f64>,
    pub objective: f64,
    /// Sum of positive constraint residuals; infinite for failed evaluations
    pub violation: f64,
    /// Objective for feasible individuals, penalized score otherwise
    pub score: f64,
}

impl Individual {
    pub fn evaluated(genome: Genome, evaluation: Evaluation) -> Self {
        let violation = evaluation.violation();
        Self {
            genome,
            decoded: evaluation.outputs,
            objective: evaluation.objective,
            violation,
            score: evaluation.objective,
        }
    }

    /// Individual whose evaluation failed, ranked below everything else.
    pub fn failed(genome: Genome, decoded: Vec<f64>, direction: OptimizationDirection) -> Self {
        Self {
            genome,
            decoded,
            objective: direction.worst(),
            violation: f64::INFINITY,
            score: direction.worst(),
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.violation <= 0.0
    }

    /// `Ordering::Less` when `self` is the better individual.
    ///
    /// Feasible beats infeasible, feasible pairs compare by objective and
    /// infeasible pairs by total violation.
    pub fn compare(&self, other: &Individual, direction: OptimizationDirection) -> Ordering {
        match (self.is_feasible(), other.is_feasible()) {
            (true, true) => direction.compare(self.objective, other.objective),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .violation
                .partial_cmp(&other.violation)
                .unwrap_or(Ordering::Equal),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.decoded
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.decoded.iter()
    }
}

impl<'a> IntoIterator for &'a Individual {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.decoded.iter()
    }
}

impl IntoIterator for Individual {
    type Item = f64;
    type IntoIter = std::vec::IntoIter<f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.decoded.into_iter()
    }
}

/// Worst finite objective in a population.
pub fn worst_objective(population: &[Individual], direction: OptimizationDirection) -> Option<f64> {
    worst_of(population, direction, false)
}

fn worst_of(population: &[Individual], direction: OptimizationDirection, feasible_only: bool) -> Option<f64> {
    population
        .iter()
        .filter(|i| (!feasible_only || i.is_feasible()) && i.objective.is_finite())
        .map(|i| i.objective)
        .reduce(|a, b| if direction.is_better(a, b) { b } else { a })
}

/// Fills in `score` for every individual of a population.
///
/// Infeasible individuals are scored from a base worsened by
/// `penalty_weight * violation`, so they stay comparable but never score
/// better than a feasible one. The base is the worse of `anchor` and the
/// worst feasible objective in the population. A fixed `anchor` keeps the
/// scores of infeasible individuals independent of the population they
/// were drawn with; without one the worst finite objective stands in.
pub fn assign_scores(
    population: &mut [Individual],
    direction: OptimizationDirection,
    penalty_weight: f64,
    anchor: Option<f64>,
) {
    let feasible = worst_of(population, direction, true);
    let base = match (anchor, feasible) {
        (Some(a), Some(f)) => {
            if direction.is_better(a, f) {
                f
            } else {
                a
            }
        }
        (Some(a), None) => a,
        (None, Some(f)) => f,
        (None, None) => worst_of(population, direction, false).unwrap_or(0.0),
    };

    for individual in population.iter_mut() {
        individual.score = if individual.is_feasible() {
            individual.objective
        } else if individual.violation.is_finite() {
            direction.worsen(base, penalty_weight * individual.violation)
        } else {
            direction.worst()
        };
    }
}

/// Index of the best individual, first one on ties.
pub fn best_index(population: &[Individual], direction: OptimizationDirection) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, individual) in population.iter().enumerate() {
        match best {
            Some(b) if individual.compare(&population[b], direction) != Ordering::Less => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ind(objective: f64, violation: f64) -> Individual {
        Individual {
            genome: vec![objective],
            decoded: vec![objective],
            objective,
            violation,
            score: objective,
        }
    }

    #[test]
    fn test_feasible_dominates() {
        let dir = OptimizationDirection::Minimize;
        let feasible = ind(100.0, 0.0);
        let infeasible = ind(-100.0, 0.5);
        assert_eq!(feasible.compare(&infeasible, dir), Ordering::Less);
        assert_eq!(infeasible.compare(&feasible, dir), Ordering::Greater);
        assert_eq!(ind(0.0, 0.1).compare(&ind(0.0, 0.2), dir), Ordering::Less);
    }

    #[test]
    fn test_penalty_worse_than_any_feasible() {
        let mut population = vec![ind(1.0, 0.0), ind(5.0, 0.0), ind(-50.0, 0.25), ind(-60.0, 2.0)];
        assign_scores(&mut population, OptimizationDirection::Minimize, 1.0, None);
        assert_eq!(population[0].score, 1.0);
        assert_eq!(population[2].score, 5.25);
        assert_eq!(population[3].score, 7.0);

        let mut population = vec![ind(1.0, 0.0), ind(5.0, 0.0), ind(50.0, 0.25)];
        assign_scores(&mut population, OptimizationDirection::Maximize, 2.0, None);
        assert_eq!(population[2].score, 0.5);
    }

    #[test]
    fn test_anchor_fixes_infeasible_scores() {
        let dir = OptimizationDirection::Minimize;
        let mut first = vec![ind(10.0, 2.0), ind(40.0, 1.0)];
        let mut second = vec![ind(10.0, 2.0), ind(900.0, 3.0)];
        assign_scores(&mut first, dir, 1.0, Some(50.0));
        assign_scores(&mut second, dir, 1.0, Some(50.0));
        assert_eq!(first[0].score, 52.0);
        assert_eq!(first[0].score, second[0].score);
        assert_eq!(first[1].score, 51.0);

        // A feasible objective beyond the anchor becomes the base
        let mut mixed = vec![ind(70.0, 0.0), ind(10.0, 0.5)];
        assign_scores(&mut mixed, dir, 1.0, Some(50.0));
        assert_eq!(mixed[1].score, 70.5);
        assert_eq!(worst_objective(&mixed, dir), Some(70.0));
    }

    #[test]
    fn test_failed_individual_is_worst() {
        let dir = OptimizationDirection::Maximize;
        let mut population = vec![ind(1.0, 3.0), Individual::failed(vec![0.0], vec![0.0], dir)];
        assign_scores(&mut population, dir, 1.0, None);
        assert_eq!(population[0].score, -2.0);
        assert_eq!(population[1].score, f64::NEG_INFINITY);
        assert_eq!(best_index(&population, dir), Some(0));
    }

    #[test]
    fn test_best_index_prefers_first_on_tie() {
        let population = vec![ind(2.0, 0.0), ind(1.0, 0.0), ind(1.0, 0.0)];
        assert_eq!(best_index(&population, OptimizationDirection::Minimize), Some(1));
        assert_eq!(best_index(&[], OptimizationDirection::Minimize), None);
    }

    #[test]
    fn test_iterates_decoded_values() {
        let individual = Individual {
            genome: vec![0.5, 1.0],
            decoded: vec![0.5, 0.0],
            objective: 0.25,
            violation: 0.0,
            score: 0.25,
        };
        let values: Vec<f64> = individual.iter().copied().collect();
        assert_eq!(values, vec![0.5, 0.0]);
        let [x, y]: [f64; 2] = individual.into_iter().collect::<Vec<_>>().try_into().unwrap();
        assert_eq!((x, y), (0.5, 0.0));
    }
}
