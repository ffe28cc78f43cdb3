use super::{AttributeInfo, Model, ModelError};
use crate::types::Value;
use indexmap::IndexMap;

/// Named collection of components addressed as `"component.attribute"`.
///
/// `execute` runs every component once in the order they were added. There
/// is no dependency analysis between components.
#[derive(Default)]
pub struct Assembly {
    components: IndexMap<String, Box<dyn Model>>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<M: Model + 'static>(&mut self, name: &str, component: M) -> Result<(), ModelError> {
        if self.components.contains_key(name) {
            return Err(ModelError::DuplicateComponent(name.to_string()));
        }
        self.components.insert(name.to_string(), Box::new(component));
        Ok(())
    }

    pub fn component(&self, name: &str) -> Option<&dyn Model> {
        self.components.get(name).map(|c| c.as_ref())
    }

    pub fn component_names(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    fn route<'a>(&self, name: &'a str) -> Result<(&dyn Model, &'a str), ModelError> {
        let (component, attribute) = name
            .split_once('.')
            .ok_or_else(|| ModelError::UnknownAttribute(name.to_string()))?;
        let model = self
            .components
            .get(component)
            .ok_or_else(|| ModelError::UnknownAttribute(name.to_string()))?;
        Ok((model.as_ref(), attribute))
    }
}

impl Model for Assembly {
    fn attribute(&self, name: &str) -> Option<AttributeInfo> {
        let (model, attribute) = self.route(name).ok()?;
        model.attribute(attribute)
    }

    fn get(&self, name: &str) -> Result<Value, ModelError> {
        let (model, attribute) = self.route(name)?;
        model.get(attribute).map_err(|e| qualify(e, name, attribute))
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
        let (component, attribute) = name
            .split_once('.')
            .ok_or_else(|| ModelError::UnknownAttribute(name.to_string()))?;
        let model = self
            .components
            .get_mut(component)
            .ok_or_else(|| ModelError::UnknownAttribute(name.to_string()))?;
        model
            .set(attribute, value)
            .map_err(|e| qualify(e, name, attribute))
    }

    fn execute(&mut self) -> Result<(), ModelError> {
        for (name, component) in self.components.iter_mut() {
            log::trace!("executing component '{}'", name);
            component
                .execute()
                .map_err(|e| ModelError::Execution(format!("{}: {}", name, e)))?;
        }
        Ok(())
    }
}

/// Replaces the component-local attribute name in `err` with the full path.
fn qualify(err: ModelError, full: &str, local: &str) -> ModelError {
    let swap = |n: String| if n == local { full.to_string() } else { n };
    match err {
        ModelError::UnknownAttribute(n) => ModelError::UnknownAttribute(swap(n)),
        ModelError::ReadOnly(n) => ModelError::ReadOnly(swap(n)),
        ModelError::TypeMismatch {
            name,
            expected,
            actual,
        } => ModelError::TypeMismatch {
            name: swap(name),
            expected,
            actual,
        },
        ModelError::OutOfRange {
            name,
            value,
            low,
            high,
        } => ModelError::OutOfRange {
            name: swap(name),
            value,
            low,
            high,
        },
        ModelError::NotAllowed { name, value } => ModelError::NotAllowed {
            name: swap(name),
            value,
        },
        other => other,
    }
}
