use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Attribute value exchanged with a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Array(Vec<f64>),
}

impl Value {
    /// Numeric view of a scalar value. Arrays have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Array(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Array(_) => "array",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Whether the objective should be minimized or maximized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationDirection {
    #[default]
    Minimize,
    Maximize,
}

impl OptimizationDirection {
    /// Orders two objective values so that `Ordering::Less` means `a` is better.
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            OptimizationDirection::Minimize => ord,
            OptimizationDirection::Maximize => ord.reverse(),
        }
    }

    pub fn is_better(&self, a: f64, b: f64) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// Worst possible score in this direction.
    pub fn worst(&self) -> f64 {
        match self {
            OptimizationDirection::Minimize => f64::INFINITY,
            OptimizationDirection::Maximize => f64::NEG_INFINITY,
        }
    }

    /// Moves `value` by `amount` in the worsening direction.
    pub fn worsen(&self, value: f64, amount: f64) -> f64 {
        match self {
            OptimizationDirection::Minimize => value + amount,
            OptimizationDirection::Maximize => value - amount,
        }
    }
}

/// Sign convention for plain constraint expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintSense {
    /// Feasible when the expression is <= 0
    #[default]
    LessOrEqualZero,
    /// Feasible when the expression is >= 0
    GreaterOrEqualZero,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_compare() {
        assert!(OptimizationDirection::Minimize.is_better(1.0, 2.0));
        assert!(OptimizationDirection::Maximize.is_better(2.0, 1.0));
        assert_eq!(OptimizationDirection::Maximize.worsen(5.0, 1.0), 4.0);
        assert_eq!(OptimizationDirection::Minimize.worst(), f64::INFINITY);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::Array(vec![1.0, 2.5]).to_string(), "[1, 2.5]");
        assert_eq!(Value::Array(vec![]).as_f64(), None);
    }
}
