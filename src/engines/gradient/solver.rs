use crate::config::GradientConfig;
use crate::driver::Evaluation;
use crate::error::Result;

/// Objective and constraints as a solver sees them: a function of a point
/// in design space. Constraint residuals are feasible when <= 0.
pub trait SolverProblem {
    fn dimension(&self) -> usize;

    fn evaluate(&mut self, x: &[f64]) -> Result<Evaluation>;

    /// Called after every completed solver iteration.
    fn on_iteration(&mut self, _iteration: usize, _x: &[f64], _objective: f64, _max_violation: f64) {}
}

/// Tolerances and budgets handed to a solver
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub itmax: usize,
    pub fdch: f64,
    pub fdchm: f64,
    pub ctlmin: f64,
    pub delfun: f64,
    pub dabfun: f64,
    pub itrm: usize,
    pub penalty: f64,
}

impl From<&GradientConfig> for SolverSettings {
    fn from(config: &GradientConfig) -> Self {
        Self {
            itmax: config.itmax,
            fdch: config.fdch,
            fdchm: config.fdchm,
            ctlmin: config.ctlmin,
            delfun: config.delfun,
            dabfun: config.dabfun,
            itrm: config.itrm,
            penalty: config.penalty,
        }
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self::from(&GradientConfig::default())
    }
}

impl SolverSettings {
    /// Finite-difference step for a coordinate at `x`.
    pub fn step(&self, x: f64) -> f64 {
        (self.fdch * x.abs()).max(self.fdchm)
    }

    /// Whether an objective change is small enough to count towards
    /// convergence.
    pub fn is_small_change(&self, previous: f64, current: f64) -> bool {
        (current - previous).abs() <= (self.delfun * current.abs()).max(self.dabfun)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub x: Vec<f64>,
    pub objective: f64,
    pub max_violation: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// A gradient-based minimizer for bound- and inequality-constrained
/// problems. Implementations must keep every evaluated point inside
/// `[lower, upper]`.
pub trait ConstrainedSolver {
    fn minimize(
        &mut self,
        problem: &mut dyn SolverProblem,
        x0: &[f64],
        lower: &[f64],
        upper: &[f64],
        settings: &SolverSettings,
    ) -> Result<SolverOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_has_floor() {
        let settings = SolverSettings {
            fdch: 1e-6,
            fdchm: 1e-6,
            ..Default::default()
        };
        assert_eq!(settings.step(0.0), 1e-6);
        assert_eq!(settings.step(-4.0), 4e-6);
    }

    #[test]
    fn test_small_change() {
        let settings = SolverSettings::default();
        assert!(settings.is_small_change(-27.08, -27.09));
        assert!(!settings.is_small_change(-27.0, -27.5));
        assert!(settings.is_small_change(0.0, 0.0005));
    }
}
