pub mod binding;
pub mod evaluator;
pub mod registry;

pub use binding::{VariableBinding, VariableKind};
pub use evaluator::{ConstraintBinding, Evaluation, ObjectiveEvaluator};
pub use registry::DesignVariableRegistry;

use crate::error::Result;
use crate::model::Model;
use serde::{Deserialize, Serialize};

/// Summary of a finished driver run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub driver: String,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
    pub feasible: bool,
    pub objective: f64,
    /// Final design values as (path, native value), in registry order.
    pub design_values: Vec<(String, f64)>,
}

/// Iteration loop shared by every optimization strategy.
///
/// A driver borrows the model mutably for the whole run and is the only
/// writer of design values while it runs.
pub trait Driver {
    fn name(&self) -> &str;

    fn run(&mut self, model: &mut dyn Model) -> Result<RunReport>;

    /// Iterations (generations for the GA) completed by the last run.
    fn iter_count(&self) -> usize;
}
