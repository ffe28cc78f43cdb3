use super::augmented::AugmentedLagrangian;
use super::solver::{ConstrainedSolver, SolverProblem, SolverSettings};
use crate::config::{ConfigSection, GradientConfig};
use crate::driver::{
    DesignVariableRegistry, Driver, Evaluation, ObjectiveEvaluator, RunReport, VariableKind,
};
use crate::error::{DriverError, Result};
use crate::model::Model;

/// Routes solver evaluations through the objective evaluator and the model
struct ModelProblem<'a> {
    name: &'a str,
    model: &'a mut dyn Model,
    registry: &'a DesignVariableRegistry,
    evaluator: &'a mut ObjectiveEvaluator,
    iprint: u8,
}

impl SolverProblem for ModelProblem<'_> {
    fn dimension(&self) -> usize {
        self.registry.len()
    }

    fn evaluate(&mut self, x: &[f64]) -> Result<Evaluation> {
        let evaluation = self.evaluator.evaluate(self.model, self.registry, x)?;
        if self.iprint >= 2 {
            log::info!(
                "{}: evaluation {} at {:?}: objective {}, constraints {:?}",
                self.name,
                self.evaluator.evaluation_count(),
                x,
                evaluation.objective,
                evaluation.constraints
            );
        }
        Ok(evaluation)
    }

    fn on_iteration(&mut self, iteration: usize, x: &[f64], objective: f64, max_violation: f64) {
        if self.iprint >= 1 {
            log::info!(
                "{}: iteration {} objective {:.6} max violation {:.3e} at {:?}",
                self.name,
                iteration,
                objective,
                max_violation,
                x
            );
        }
    }
}

/// Bound- and constraint-aware driver around a [`ConstrainedSolver`].
///
/// Only continuous design variables are supported. The starting point is
/// read from the model and clamped into the bounds; after the solver
/// returns, its final point is written back and the model executed so it
/// holds the final state.
pub struct ConstrainedGradientDriver {
    name: String,
    config: GradientConfig,
    solver: Box<dyn ConstrainedSolver>,
    iterations: usize,
    converged: bool,
    final_point: Vec<f64>,
}

impl ConstrainedGradientDriver {
    pub fn new(name: &str) -> Self {
        Self::with_config(name, GradientConfig::default())
    }

    pub fn with_config(name: &str, config: GradientConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            solver: Box::new(AugmentedLagrangian::default()),
            iterations: 0,
            converged: false,
            final_point: Vec::new(),
        }
    }

    pub fn with_solver<S: ConstrainedSolver + 'static>(mut self, solver: S) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn config(&self) -> &GradientConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GradientConfig {
        &mut self.config
    }

    pub fn set_objective(&mut self, objective: &str) {
        self.config.objective = objective.to_string();
    }

    pub fn add_constraint(&mut self, constraint: &str) {
        self.config.constraints.push(constraint.to_string());
    }

    /// Appends a design variable to the parallel `design_vars` /
    /// `lower_bounds` / `upper_bounds` arrays.
    pub fn add_des_var(&mut self, path: &str, low: f64, high: f64) {
        self.config.design_vars.push(path.to_string());
        self.config.lower_bounds.push(low);
        self.config.upper_bounds.push(high);
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Native design values of the last run's final point.
    pub fn final_point(&self) -> &[f64] {
        &self.final_point
    }

    fn build_registry(&self, model: &dyn Model) -> Result<DesignVariableRegistry> {
        if self.config.design_vars.is_empty() {
            return Err(DriverError::Configuration(format!(
                "{}: no design variables have been added",
                self.name
            )));
        }
        let mut registry = DesignVariableRegistry::new(self.name.as_str(), "CONMIN");
        let bounds = self.config.lower_bounds.iter().zip(&self.config.upper_bounds);
        for (path, (low, high)) in self.config.design_vars.iter().zip(bounds) {
            registry.add(model, path, Some(*low), Some(*high))?;
        }
        if let Some(binding) = registry.iter().find(|b| b.kind() != VariableKind::Continuous) {
            return Err(DriverError::Configuration(format!(
                "{}: design variable '{}' is not continuous; gradient drivers only support float variables",
                self.name,
                binding.path()
            )));
        }
        Ok(registry)
    }
}

impl Driver for ConstrainedGradientDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, model: &mut dyn Model) -> Result<RunReport> {
        self.config.validate()?;
        let mut evaluator = ObjectiveEvaluator::new(
            &self.name,
            &self.config.objective,
            &self.config.constraints,
            self.config.constraint_sense,
        )?;
        let registry = self.build_registry(model)?;

        let lower = &self.config.lower_bounds;
        let upper = &self.config.upper_bounds;
        let x0 = registry
            .iter()
            .zip(lower.iter().zip(upper))
            .map(|(binding, (lo, hi))| -> Result<f64> { Ok(binding.read(&*model)?.max(*lo).min(*hi)) })
            .collect::<Result<Vec<f64>>>()?;

        self.iterations = 0;
        self.converged = false;
        self.final_point.clear();
        if self.config.iprint >= 1 {
            log::info!("{}: starting from {:?}", self.name, x0);
        }

        let settings = SolverSettings::from(&self.config);
        let outcome = {
            let mut problem = ModelProblem {
                name: &self.name,
                model: &mut *model,
                registry: &registry,
                evaluator: &mut evaluator,
                iprint: self.config.iprint,
            };
            self.solver.minimize(&mut problem, &x0, lower, upper, &settings)?
        };

        let last = evaluator.evaluate(model, &registry, &outcome.x)?;
        self.iterations = outcome.iterations;
        self.converged = outcome.converged;
        self.final_point = last.outputs.clone();

        if self.config.iprint >= 1 {
            log::info!(
                "{}: finished after {} iterations (converged: {}), objective {}",
                self.name,
                self.iterations,
                self.converged,
                last.objective
            );
        }

        Ok(RunReport {
            driver: self.name.clone(),
            iterations: self.iterations,
            evaluations: evaluator.evaluation_count(),
            converged: self.converged,
            feasible: last.max_violation() <= self.config.ctlmin,
            objective: last.objective,
            design_values: registry.list().into_iter().zip(last.outputs).collect(),
        })
    }

    fn iter_count(&self) -> usize {
        self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assembly, Paraboloid, SphereFunction};

    fn paraboloid() -> Assembly {
        let mut top = Assembly::new();
        top.add("paraboloid", Paraboloid::new()).unwrap();
        top
    }

    #[test]
    fn test_rejects_non_continuous_variables() {
        let mut top = Assembly::new();
        top.add("comp", SphereFunction::new()).unwrap();
        let mut driver = ConstrainedGradientDriver::new("driver");
        driver.set_objective("comp.total");
        driver.add_des_var("comp.z", -5.0, 5.0);
        let err = driver.run(&mut top).unwrap_err();
        assert!(matches!(err, DriverError::Configuration(_)));
        assert!(err.to_string().contains("comp.z"));
    }

    #[test]
    fn test_requires_design_variables() {
        let mut top = paraboloid();
        let mut driver = ConstrainedGradientDriver::new("driver");
        driver.set_objective("paraboloid.f_xy");
        assert!(matches!(driver.run(&mut top), Err(DriverError::Configuration(_))));
    }

    #[test]
    fn test_start_point_clamped() {
        let mut top = paraboloid();
        top.set("paraboloid.x", crate::types::Value::Float(-40.0)).unwrap();
        let mut driver = ConstrainedGradientDriver::new("driver");
        driver.set_objective("paraboloid.f_xy");
        driver.add_des_var("paraboloid.x", 0.0, 10.0);
        driver.add_des_var("paraboloid.y", -10.0, 0.0);
        driver.config_mut().itmax = 1;

        let report = driver.run(&mut top).unwrap();
        assert_eq!(driver.iter_count(), 1);
        assert!(report.design_values.iter().all(|(_, v)| v.is_finite()));
        let x = top.get("paraboloid.x").unwrap().as_f64().unwrap();
        assert!((0.0..=10.0).contains(&x));
    }
}
