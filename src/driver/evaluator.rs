use super::registry::DesignVariableRegistry;
use crate::error::{DriverError, Result};
use crate::expression::{parse_constraint, parse_expression, ExprError, Expr, Relation};
use crate::model::Model;
use crate::types::{ConstraintSense, Value};

/// An inequality over model outputs; feasible when [`residual`] is <= 0.
///
/// [`residual`]: ConstraintBinding::residual
#[derive(Debug, Clone)]
pub struct ConstraintBinding {
    text: String,
    lhs: Expr,
    relation: Option<(Relation, Expr)>,
    sense: ConstraintSense,
}

impl ConstraintBinding {
    pub fn parse(text: &str, sense: ConstraintSense) -> std::result::Result<Self, ExprError> {
        let (lhs, relation) = parse_constraint(text)?;
        Ok(Self {
            text: text.to_string(),
            lhs,
            relation,
            sense,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn residual(&self, model: &dyn Model) -> std::result::Result<f64, ExprError> {
        let lhs = self.lhs.eval(model)?;
        Ok(match &self.relation {
            Some((Relation::Less | Relation::LessEqual, rhs)) => lhs - rhs.eval(model)?,
            Some((Relation::Greater | Relation::GreaterEqual, rhs)) => rhs.eval(model)? - lhs,
            None => match self.sense {
                ConstraintSense::LessOrEqualZero => lhs,
                ConstraintSense::GreaterOrEqualZero => -lhs,
            },
        })
    }
}

/// Result of one model evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub objective: f64,
    /// Residuals in constraint order, feasible when <= 0.
    pub constraints: Vec<f64>,
    /// Native design values that were written to the model.
    pub outputs: Vec<f64>,
}

impl Evaluation {
    /// Sum of the positive residuals.
    pub fn violation(&self) -> f64 {
        self.constraints.iter().map(|c| c.max(0.0)).sum()
    }

    pub fn max_violation(&self) -> f64 {
        self.constraints.iter().fold(0.0_f64, |m, c| m.max(*c))
    }

    pub fn is_feasible(&self) -> bool {
        self.violation() <= 0.0
    }
}

/// Writes candidates into a model, executes it and reads back the objective
/// and constraints.
#[derive(Debug, Clone)]
pub struct ObjectiveEvaluator {
    driver: String,
    objective_text: String,
    objective: Expr,
    constraints: Vec<ConstraintBinding>,
    evaluations: usize,
}

impl ObjectiveEvaluator {
    pub fn new(driver: &str, objective: &str, constraints: &[String], sense: ConstraintSense) -> Result<Self> {
        if objective.trim().is_empty() {
            return Err(DriverError::Configuration(format!(
                "{}: no objective has been specified",
                driver
            )));
        }
        let compiled = parse_expression(objective).map_err(|e| {
            DriverError::Configuration(format!("{}: invalid objective '{}': {}", driver, objective, e))
        })?;
        let constraints = constraints
            .iter()
            .map(|text| {
                ConstraintBinding::parse(text, sense).map_err(|e| {
                    DriverError::Configuration(format!("{}: invalid constraint '{}': {}", driver, text, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            driver: driver.to_string(),
            objective_text: objective.to_string(),
            objective: compiled,
            constraints,
            evaluations: 0,
        })
    }

    pub fn objective(&self) -> &str {
        &self.objective_text
    }

    pub fn constraints(&self) -> &[ConstraintBinding] {
        &self.constraints
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluations
    }

    pub fn reset_count(&mut self) {
        self.evaluations = 0;
    }

    pub fn evaluate(
        &mut self,
        model: &mut dyn Model,
        registry: &DesignVariableRegistry,
        candidate: &[f64],
    ) -> Result<Evaluation> {
        if candidate.len() != registry.len() {
            return Err(DriverError::evaluation(
                &self.driver,
                format!(
                    "candidate has {} values but {} design variables are registered",
                    candidate.len(),
                    registry.len()
                ),
            ));
        }
        self.evaluations += 1;

        let values = registry
            .iter()
            .zip(candidate)
            .map(|(binding, gene)| {
                binding.to_value(*gene).map_err(|e| {
                    DriverError::evaluation(&self.driver, format!("failed to set '{}': {}", binding.path(), e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // A rejected write puts back whatever this candidate already changed
        let mut previous = Vec::with_capacity(values.len());
        for (binding, value) in registry.iter().zip(values) {
            let name = &binding.path().name;
            let before = model.get(name);
            if let Err(e) = binding.path().write(model, value) {
                restore(model, previous);
                return Err(DriverError::evaluation(
                    &self.driver,
                    format!("failed to set '{}': {}", binding.path(), e),
                ));
            }
            if let Ok(before) = before {
                previous.push((name.clone(), before));
            }
        }
        let outputs: Vec<f64> = registry
            .iter()
            .zip(candidate)
            .map(|(binding, gene)| binding.decode(*gene))
            .collect();

        model
            .execute()
            .map_err(|e| DriverError::evaluation(&self.driver, format!("model execution failed: {}", e)))?;

        let objective = self.objective.eval(model).map_err(|e| {
            DriverError::evaluation(
                &self.driver,
                format!("failed to evaluate objective '{}': {}", self.objective_text, e),
            )
        })?;
        if !objective.is_finite() {
            return Err(DriverError::evaluation(
                &self.driver,
                format!("objective '{}' evaluated to {}", self.objective_text, objective),
            ));
        }

        let constraints = self
            .constraints
            .iter()
            .map(|c| {
                c.residual(model).map_err(|e| {
                    DriverError::evaluation(
                        &self.driver,
                        format!("failed to evaluate constraint '{}': {}", c.text(), e),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some((constraint, residual)) = self
            .constraints
            .iter()
            .zip(&constraints)
            .find(|(_, residual)| !residual.is_finite())
        {
            return Err(DriverError::evaluation(
                &self.driver,
                format!("constraint '{}' evaluated to {}", constraint.text(), residual),
            ));
        }

        log::debug!(
            "{}: evaluation #{} {:?} -> objective {} constraints {:?}",
            self.driver,
            self.evaluations,
            outputs,
            objective,
            constraints
        );

        Ok(Evaluation {
            objective,
            constraints,
            outputs,
        })
    }
}

/// Puts back attribute values captured before a partial write, newest
/// first so repeated writes to one array end at its original contents.
fn restore(model: &mut dyn Model, previous: Vec<(String, Value)>) {
    for (name, value) in previous.into_iter().rev() {
        if let Err(e) = model.set(&name, value) {
            log::warn!("could not restore '{}' after a rejected write: {}", name, e);
        }
    }
}
