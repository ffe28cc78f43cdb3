pub mod assembly;
pub mod components;
pub mod path;

pub use assembly::Assembly;
pub use components::{Paraboloid, SphereFunction, SphereFunctionArray};
pub use path::AttributePath;

use crate::types::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("'{0}' is not an attribute of the model")]
    UnknownAttribute(String),

    #[error("'{name}' expects a {expected} value, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("value {value} for '{name}' is outside [{low}, {high}]")]
    OutOfRange {
        name: String,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("value {value} for '{name}' is not one of the allowed values")]
    NotAllowed { name: String, value: String },

    #[error("'{0}' is an output and cannot be set")]
    ReadOnly(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("'{0}' is already part of the assembly")]
    DuplicateComponent(String),
}

/// Direction of data flow for an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoType {
    Input,
    Output,
}

/// Declared type and domain of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    Float { low: Option<f64>, high: Option<f64> },
    Int { low: Option<i64>, high: Option<i64> },
    Enum { values: Vec<Value> },
    Array { len: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub kind: AttributeKind,
    pub io: IoType,
}

impl AttributeInfo {
    pub fn input(kind: AttributeKind) -> Self {
        Self {
            kind,
            io: IoType::Input,
        }
    }

    pub fn output(kind: AttributeKind) -> Self {
        Self {
            kind,
            io: IoType::Output,
        }
    }

    /// Checks that `value` fits the declared type and domain.
    ///
    /// Models call this from `set` so that bad input is reported instead of
    /// being clamped.
    pub fn check(&self, name: &str, value: &Value) -> Result<(), ModelError> {
        let mismatch = |expected: &str| ModelError::TypeMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: value.type_name().to_string(),
        };

        match (&self.kind, value) {
            (AttributeKind::Float { low, high }, Value::Float(_) | Value::Int(_)) => {
                let v = value.as_f64().unwrap_or(f64::NAN);
                check_range(name, v, *low, *high)
            }
            (AttributeKind::Int { low, high }, Value::Int(v)) => check_range(
                name,
                *v as f64,
                low.map(|l| l as f64),
                high.map(|h| h as f64),
            ),
            (AttributeKind::Enum { values }, Value::Int(_) | Value::Float(_)) => {
                let v = value.as_f64().unwrap_or(f64::NAN);
                if values.iter().any(|allowed| allowed.as_f64() == Some(v)) {
                    Ok(())
                } else {
                    Err(ModelError::NotAllowed {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                }
            }
            (AttributeKind::Array { len }, Value::Array(items)) => {
                if items.len() == *len {
                    Ok(())
                } else {
                    Err(mismatch(&format!("array of length {}", len)))
                }
            }
            (AttributeKind::Float { .. }, _) => Err(mismatch("float")),
            (AttributeKind::Int { .. }, _) => Err(mismatch("int")),
            (AttributeKind::Enum { .. }, _) => Err(mismatch("enum")),
            (AttributeKind::Array { .. }, _) => Err(mismatch("array")),
        }
    }
}

fn check_range(name: &str, value: f64, low: Option<f64>, high: Option<f64>) -> Result<(), ModelError> {
    let below = low.is_some_and(|l| value < l);
    let above = high.is_some_and(|h| value > h);
    if value.is_nan() || below || above {
        return Err(ModelError::OutOfRange {
            name: name.to_string(),
            value,
            low: low.unwrap_or(f64::NEG_INFINITY),
            high: high.unwrap_or(f64::INFINITY),
        });
    }
    Ok(())
}

/// A computational unit with named attributes and an execute step.
///
/// Drivers only ever talk to this trait. Attribute names are whatever the
/// implementation routes on; an [`Assembly`] uses `"component.attribute"`.
pub trait Model {
    /// Metadata for `name`, or `None` if the model has no such attribute.
    fn attribute(&self, name: &str) -> Option<AttributeInfo>;

    fn get(&self, name: &str) -> Result<Value, ModelError>;

    fn set(&mut self, name: &str, value: Value) -> Result<(), ModelError>;

    /// Recomputes outputs from the current inputs.
    fn execute(&mut self) -> Result<(), ModelError>;
}
