use crate::error::DriverError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections of a run file
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), DriverError>;
    fn to_manifest(&self) -> ConfigManifest;
}

/// Description of a section's options, for help output and templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigManifest {
    pub section: String,
    pub fields: Vec<FieldManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldManifest {
    pub name: String,
    pub field_type: String,
    pub default: serde_json::Value,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub description: String,
}

impl FieldManifest {
    pub fn new(name: &str, field_type: &str, default: serde_json::Value, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            default,
            min: None,
            max: None,
            description: description.to_string(),
        }
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

pub(crate) fn check_rate(name: &str, value: f64) -> Result<(), DriverError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DriverError::Configuration(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}

pub(crate) fn check_positive(name: &str, value: f64) -> Result<(), DriverError> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(DriverError::Configuration(format!(
            "{} must be a positive number, got {}",
            name, value
        )));
    }
    Ok(())
}
