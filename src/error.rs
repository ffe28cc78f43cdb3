use thiserror::Error;

use crate::expression::ExprError;
use crate::model::ModelError;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("{driver}: {message}")]
    Validation { driver: String, message: String },

    #[error("{driver}: {message}")]
    Evaluation { driver: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Expression error: {0}")]
    Expression(#[from] ExprError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl DriverError {
    pub fn validation(driver: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            driver: driver.to_string(),
            message: message.into(),
        }
    }

    pub fn evaluation(driver: &str, message: impl Into<String>) -> Self {
        Self::Evaluation {
            driver: driver.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
