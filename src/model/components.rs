//! Reference components used by the CLI and the test-suite.

use super::{AttributeInfo, AttributeKind, Model, ModelError};
use crate::types::Value;

fn read_only(name: &str) -> ModelError {
    ModelError::ReadOnly(name.to_string())
}

fn unknown(name: &str) -> ModelError {
    ModelError::UnknownAttribute(name.to_string())
}

fn as_float(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

/// `f_xy = (x-3)^2 + x*y + (y+4)^2 - 3`
#[derive(Debug, Clone, Default)]
pub struct Paraboloid {
    pub x: f64,
    pub y: f64,
    pub f_xy: f64,
}

impl Paraboloid {
    pub fn new() -> Self {
        Self::default()
    }

    fn input_kind() -> AttributeKind {
        AttributeKind::Float {
            low: Some(-50.0),
            high: Some(50.0),
        }
    }
}

impl Model for Paraboloid {
    fn attribute(&self, name: &str) -> Option<AttributeInfo> {
        match name {
            "x" | "y" => Some(AttributeInfo::input(Self::input_kind())),
            "f_xy" => Some(AttributeInfo::output(AttributeKind::Float {
                low: None,
                high: None,
            })),
            _ => None,
        }
    }

    fn get(&self, name: &str) -> Result<Value, ModelError> {
        match name {
            "x" => Ok(Value::Float(self.x)),
            "y" => Ok(Value::Float(self.y)),
            "f_xy" => Ok(Value::Float(self.f_xy)),
            _ => Err(unknown(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
        let info = self.attribute(name).ok_or_else(|| unknown(name))?;
        if name == "f_xy" {
            return Err(read_only(name));
        }
        info.check(name, &value)?;
        match name {
            "x" => self.x = as_float(&value),
            _ => self.y = as_float(&value),
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), ModelError> {
        let (x, y) = (self.x, self.y);
        self.f_xy = (x - 3.0).powi(2) + x * y + (y + 4.0).powi(2) - 3.0;
        Ok(())
    }
}

/// Sum of squares over a float, an enumerated and an integer input.
#[derive(Debug, Clone)]
pub struct SphereFunction {
    pub x: f64,
    pub y: i64,
    pub z: i64,
    pub total: f64,
}

impl SphereFunction {
    pub const Y_VALUES: [i64; 7] = [-10, 0, 1, 2, 3, 4, 5];

    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: -10,
            z: 0,
            total: 0.0,
        }
    }
}

impl Default for SphereFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for SphereFunction {
    fn attribute(&self, name: &str) -> Option<AttributeInfo> {
        match name {
            "x" => Some(AttributeInfo::input(AttributeKind::Float {
                low: Some(-5.12),
                high: Some(5.13),
            })),
            "y" => Some(AttributeInfo::input(AttributeKind::Enum {
                values: Self::Y_VALUES.iter().map(|v| Value::Int(*v)).collect(),
            })),
            "z" => Some(AttributeInfo::input(AttributeKind::Int {
                low: Some(-5),
                high: Some(5),
            })),
            "total" => Some(AttributeInfo::output(AttributeKind::Float {
                low: None,
                high: None,
            })),
            _ => None,
        }
    }

    fn get(&self, name: &str) -> Result<Value, ModelError> {
        match name {
            "x" => Ok(Value::Float(self.x)),
            "y" => Ok(Value::Int(self.y)),
            "z" => Ok(Value::Int(self.z)),
            "total" => Ok(Value::Float(self.total)),
            _ => Err(unknown(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
        let info = self.attribute(name).ok_or_else(|| unknown(name))?;
        if name == "total" {
            return Err(read_only(name));
        }
        info.check(name, &value)?;
        match name {
            "x" => self.x = as_float(&value),
            "y" => self.y = as_float(&value) as i64,
            _ => self.z = as_float(&value) as i64,
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), ModelError> {
        self.total = self.x.powi(2) + (self.y * self.y) as f64 + (self.z * self.z) as f64;
        Ok(())
    }
}

/// Sum of squares over a three-element array input.
#[derive(Debug, Clone, Default)]
pub struct SphereFunctionArray {
    pub x: [f64; 3],
    pub total: f64,
}

impl SphereFunctionArray {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Model for SphereFunctionArray {
    fn attribute(&self, name: &str) -> Option<AttributeInfo> {
        match name {
            "x" => Some(AttributeInfo::input(AttributeKind::Array { len: 3 })),
            "total" => Some(AttributeInfo::output(AttributeKind::Float {
                low: None,
                high: None,
            })),
            _ => None,
        }
    }

    fn get(&self, name: &str) -> Result<Value, ModelError> {
        match name {
            "x" => Ok(Value::Array(self.x.to_vec())),
            "total" => Ok(Value::Float(self.total)),
            _ => Err(unknown(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
        let info = self.attribute(name).ok_or_else(|| unknown(name))?;
        if name == "total" {
            return Err(read_only(name));
        }
        info.check(name, &value)?;
        if let Value::Array(items) = value {
            self.x.copy_from_slice(&items);
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), ModelError> {
        self.total = self.x.iter().map(|v| v * v).sum();
        Ok(())
    }
}
