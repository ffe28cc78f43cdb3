use super::{genetic::GeneticConfig, gradient::GradientConfig, traits::ConfigSection};
use crate::error::DriverError;
use crate::model::{Assembly, Paraboloid, SphereFunction, SphereFunctionArray};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix of environment variables that override run-file values,
/// e.g. `OPTDRIVER__GENETIC__SEED=7`.
pub const ENV_PREFIX: &str = "OPTDRIVER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    #[default]
    Genetic,
    Gradient,
}

/// Built-in models a run file can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceModel {
    #[default]
    Paraboloid,
    Sphere,
    SphereArray,
}

impl ReferenceModel {
    /// Builds an assembly holding the model. The paraboloid is registered
    /// as `paraboloid`, the sphere functions as `comp`.
    pub fn build(&self) -> Result<Assembly, DriverError> {
        let mut top = Assembly::new();
        match self {
            ReferenceModel::Paraboloid => top.add("paraboloid", Paraboloid::new())?,
            ReferenceModel::Sphere => top.add("comp", SphereFunction::new())?,
            ReferenceModel::SphereArray => top.add("comp", SphereFunctionArray::new())?,
        }
        Ok(top)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub name: String,
    pub driver: DriverKind,
    pub model: ReferenceModel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub run: RunSection,
    pub genetic: GeneticConfig,
    pub gradient: GradientConfig,
}

impl RunConfig {
    /// Only the section of the selected driver has to be valid.
    pub fn validate(&self) -> Result<(), DriverError> {
        match self.run.driver {
            DriverKind::Genetic => self.genetic.validate(),
            DriverKind::Gradient => self.gradient.validate(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, DriverError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Instance name used in log lines and error messages.
    pub fn driver_name(&self) -> &str {
        if self.run.name.is_empty() {
            "driver"
        } else {
            &self.run.name
        }
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<RunConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(RunConfig::default())),
        }
    }

    /// Loads a run file, applying `OPTDRIVER__SECTION__KEY` environment
    /// overrides on top of it.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DriverError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DriverError::Configuration(format!(
                "Failed to read config: {} does not exist",
                path.display()
            )));
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: RunConfig = settings.try_deserialize()?;
        config.validate()?;

        log::info!("loaded run configuration from {}", path.display());
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DriverError> {
        let toml_str = self.get().to_toml_string()?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> RunConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn update<F>(&self, f: F) -> Result<(), DriverError>
    where
        F: FnOnce(&mut RunConfig),
    {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
