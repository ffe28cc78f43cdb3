use super::{Model, ModelError};
use crate::types::Value;
use std::fmt;

/// Reference to a scalar slot of a model: `"comp.x"` or `"comp.x[2]"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    pub name: String,
    pub index: Option<usize>,
}

impl AttributePath {
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        let (name, index) = match text.find('[') {
            Some(open) => {
                let inner = text[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| format!("'{}' has an unterminated index", text))?;
                let index = inner
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("'{}' has an invalid index '{}'", text, inner))?;
                (&text[..open], Some(index))
            }
            None => (text, None),
        };

        let valid_segment = |s: &str| {
            let mut chars = s.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if name.is_empty() || !name.split('.').all(valid_segment) {
            return Err(format!("'{}' is not a valid attribute path", text));
        }

        Ok(Self {
            name: name.to_string(),
            index,
        })
    }

    pub fn is_element(&self) -> bool {
        self.index.is_some()
    }

    /// Reads the scalar this path refers to.
    pub fn read(&self, model: &dyn Model) -> Result<f64, ModelError> {
        let value = model.get(&self.name)?;
        match (self.index, &value) {
            (None, Value::Int(_) | Value::Float(_)) => Ok(value.as_f64().unwrap_or(f64::NAN)),
            (Some(i), Value::Array(items)) => items.get(i).copied().ok_or_else(|| {
                ModelError::UnknownAttribute(self.to_string())
            }),
            (None, Value::Array(_)) => Err(ModelError::TypeMismatch {
                name: self.to_string(),
                expected: "scalar".to_string(),
                actual: "array".to_string(),
            }),
            (Some(_), other) => Err(ModelError::TypeMismatch {
                name: self.to_string(),
                expected: "array".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Writes `value` to the slot; array elements are read, modified and
    /// written back as a whole array.
    pub fn write(&self, model: &mut dyn Model, value: Value) -> Result<(), ModelError> {
        let Some(i) = self.index else {
            return model.set(&self.name, value);
        };
        let element = value.as_f64().ok_or_else(|| ModelError::TypeMismatch {
            name: self.to_string(),
            expected: "scalar".to_string(),
            actual: value.type_name().to_string(),
        })?;
        match model.get(&self.name)? {
            Value::Array(mut items) => {
                let slot = items
                    .get_mut(i)
                    .ok_or_else(|| ModelError::UnknownAttribute(self.to_string()))?;
                *slot = element;
                model.set(&self.name, Value::Array(items))
            }
            other => Err(ModelError::TypeMismatch {
                name: self.name.clone(),
                expected: "array".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.name, i),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assembly, SphereFunctionArray};

    #[test]
    fn test_parse_paths() {
        let p = AttributePath::parse("comp.x").unwrap();
        assert_eq!(p.name, "comp.x");
        assert_eq!(p.index, None);

        let p = AttributePath::parse("comp.x[2]").unwrap();
        assert_eq!(p.name, "comp.x");
        assert_eq!(p.index, Some(2));
        assert_eq!(p.to_string(), "comp.x[2]");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AttributePath::parse("").is_err());
        assert!(AttributePath::parse("comp..x").is_err());
        assert!(AttributePath::parse("comp.x[").is_err());
        assert!(AttributePath::parse("comp.x[a]").is_err());
        assert!(AttributePath::parse("1comp.x").is_err());
    }

    #[test]
    fn test_element_read_write() {
        let mut top = Assembly::new();
        top.add("comp", SphereFunctionArray::new()).unwrap();

        let p = AttributePath::parse("comp.x[1]").unwrap();
        p.write(&mut top, Value::Float(2.5)).unwrap();
        assert_eq!(p.read(&top).unwrap(), 2.5);
        assert_eq!(top.get("comp.x").unwrap(), Value::Array(vec![0.0, 2.5, 0.0]));

        let out_of_range = AttributePath::parse("comp.x[3]").unwrap();
        assert!(out_of_range.read(&top).is_err());
        assert!(AttributePath::parse("comp.x").unwrap().read(&top).is_err());
    }
}
