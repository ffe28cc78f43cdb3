use super::binding::VariableBinding;
use crate::error::{DriverError, Result};
use crate::model::{AttributePath, Model};
use indexmap::IndexMap;

/// Ordered set of design variables owned by a driver.
///
/// Registration order is the gene order of every candidate the driver
/// evaluates.
#[derive(Debug, Clone)]
pub struct DesignVariableRegistry {
    driver: String,
    label: String,
    bindings: IndexMap<String, VariableBinding>,
}

impl DesignVariableRegistry {
    /// `driver` is the instance name used as the error prefix, `label` the
    /// kind of driver (e.g. "genetic").
    pub fn new(driver: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            label: label.into(),
            bindings: IndexMap::new(),
        }
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn add(&mut self, model: &dyn Model, path: &str, low: Option<f64>, high: Option<f64>) -> Result<()> {
        let parsed = AttributePath::parse(path)
            .map_err(|message| DriverError::validation(&self.driver, message))?;
        let key = parsed.to_string();
        if self.bindings.contains_key(&key) {
            return Err(DriverError::validation(
                &self.driver,
                format!(
                    "Trying to add '{}' to the {} driver, but it is already in the driver",
                    key, self.label
                ),
            ));
        }

        let binding = VariableBinding::resolve(&self.driver, model, parsed, low, high)?;
        log::debug!("{}: added design variable '{}' ({:?})", self.driver, key, binding.kind());
        self.bindings.insert(key, binding);
        Ok(())
    }

    pub fn remove(&mut self, path: &str) -> Result<()> {
        let key = AttributePath::parse(path)
            .map(|p| p.to_string())
            .unwrap_or_else(|_| path.to_string());
        if self.bindings.shift_remove(&key).is_none() {
            return Err(DriverError::validation(
                &self.driver,
                format!(
                    "Trying to remove design variable '{}', but it is not in the {} driver",
                    path, self.label
                ),
            ));
        }
        Ok(())
    }

    /// Snapshot of the registered paths in registration order.
    pub fn list(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn get(&self, path: &str) -> Option<&VariableBinding> {
        self.bindings.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableBinding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Decodes a full candidate into native values.
    pub fn decode(&self, genome: &[f64]) -> Vec<f64> {
        self.iter().zip(genome).map(|(b, g)| b.decode(*g)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assembly, SphereFunction, SphereFunctionArray};

    fn model() -> Assembly {
        let mut top = Assembly::new();
        top.add("comp", SphereFunction::new()).unwrap();
        top.add("arr", SphereFunctionArray::new()).unwrap();
        top
    }

    #[test]
    fn test_list_remove_clear() {
        let top = model();
        let mut reg = DesignVariableRegistry::new("driver", "genetic");
        reg.add(&top, "comp.x", None, None).unwrap();
        reg.add(&top, "comp.y", None, None).unwrap();
        assert_eq!(reg.list(), vec!["comp.x", "comp.y"]);

        reg.remove("comp.x").unwrap();
        assert_eq!(reg.list(), vec!["comp.y"]);

        let err = reg.remove("xyz").unwrap_err();
        assert_eq!(
            err.to_string(),
            "driver: Trying to remove design variable 'xyz', but it is not in the genetic driver"
        );

        reg.add(&top, "comp.x", None, None).unwrap();
        reg.clear();
        assert!(reg.list().is_empty());
        reg.clear();
        assert!(reg.is_empty());
    }

    #[test]
    fn test_duplicate_rejected() {
        let top = model();
        let mut reg = DesignVariableRegistry::new("driver", "genetic");
        reg.add(&top, "comp.y", None, None).unwrap();
        let err = reg.add(&top, "comp.y", None, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "driver: Trying to add 'comp.y' to the genetic driver, but it is already in the driver"
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_readd_moves_to_end() {
        let top = model();
        let mut reg = DesignVariableRegistry::new("driver", "genetic");
        reg.add(&top, "comp.x", None, None).unwrap();
        reg.add(&top, "comp.z", None, None).unwrap();
        let before = reg.list();
        reg.remove("comp.x").unwrap();
        reg.add(&top, "comp.x", None, None).unwrap();
        assert_eq!(reg.list(), vec!["comp.z", "comp.x"]);
        assert_eq!(before, vec!["comp.x", "comp.z"]);
    }

    #[test]
    fn test_failed_add_has_no_effect() {
        let top = model();
        let mut reg = DesignVariableRegistry::new("driver", "genetic");
        assert!(reg.add(&top, "arr.x[0]", None, None).is_err());
        assert!(reg.is_empty());
        reg.add(&top, "arr.x[0]", Some(-5.12), Some(5.13)).unwrap();
        assert_eq!(reg.list(), vec!["arr.x[0]"]);
    }
}
