pub mod genetic;
pub mod gradient;

pub use genetic::Genetic;
pub use gradient::{AugmentedLagrangian, ConstrainedGradientDriver, ConstrainedSolver};
