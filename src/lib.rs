//! Optimization drivers for component models: a design-variable registry,
//! an objective/constraint evaluator, a genetic algorithm and a
//! constrained gradient driver, all behind a common [`driver::Driver`] loop.

pub mod config;
pub mod driver;
pub mod engines;
pub mod error;
pub mod expression;
pub mod model;
pub mod types;

pub use driver::{DesignVariableRegistry, Driver, ObjectiveEvaluator, RunReport};
pub use engines::{ConstrainedGradientDriver, Genetic};
pub use error::{DriverError, Result};
