pub mod engine;
pub mod genome;
pub mod operators;
pub mod progress;

pub use engine::Genetic;
pub use genome::{Genome, Individual};
pub use progress::{ChannelProgressCallback, LogProgressCallback, ProgressCallback, ProgressMessage};
