pub mod augmented;
pub mod driver;
pub mod solver;

pub use augmented::AugmentedLagrangian;
pub use driver::ConstrainedGradientDriver;
pub use solver::{ConstrainedSolver, SolverOutcome, SolverProblem, SolverSettings};
