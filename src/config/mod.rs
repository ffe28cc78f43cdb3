pub mod traits;
pub mod genetic;
pub mod gradient;
pub mod manager;

pub use manager::{ConfigManager, DriverKind, ReferenceModel, RunConfig, RunSection};
pub use genetic::{CrossoverMethod, DesignVarSpec, EvaluationErrorPolicy, GeneticConfig, SelectionMethod};
pub use gradient::GradientConfig;
pub use traits::{ConfigManifest, ConfigSection, FieldManifest};
