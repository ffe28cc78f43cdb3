use super::traits::{check_positive, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::DriverError;
use crate::types::ConstraintSense;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Options of the constrained gradient driver.
///
/// Names follow the CONMIN conventions: `itmax` bounds the number of solver
/// iterations, `fdch`/`fdchm` are the relative and minimum absolute
/// finite-difference steps, and `delfun`/`dabfun` the relative and absolute
/// objective-change thresholds that must hold for `itrm` consecutive
/// iterations before the run counts as converged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientConfig {
    pub objective: String,
    pub design_vars: Vec<String>,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
    pub constraints: Vec<String>,
    pub constraint_sense: ConstraintSense,
    pub iprint: u8,
    pub itmax: usize,
    pub fdch: f64,
    pub fdchm: f64,
    pub ctlmin: f64,
    pub delfun: f64,
    pub dabfun: f64,
    pub itrm: usize,
    pub penalty: f64,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            objective: String::new(),
            design_vars: Vec::new(),
            lower_bounds: Vec::new(),
            upper_bounds: Vec::new(),
            constraints: Vec::new(),
            constraint_sense: ConstraintSense::default(),
            iprint: 0,
            itmax: 10,
            fdch: 0.01,
            fdchm: 0.01,
            ctlmin: 0.001,
            delfun: 0.001,
            dabfun: 0.001,
            itrm: 3,
            penalty: 10.0,
        }
    }
}

impl ConfigSection for GradientConfig {
    fn section_name() -> &'static str {
        "gradient"
    }

    fn validate(&self) -> Result<(), DriverError> {
        if self.itmax == 0 {
            return Err(DriverError::Configuration("itmax must be at least 1".to_string()));
        }
        if self.itrm == 0 {
            return Err(DriverError::Configuration("itrm must be at least 1".to_string()));
        }
        check_positive("fdch", self.fdch)?;
        check_positive("fdchm", self.fdchm)?;
        check_positive("delfun", self.delfun)?;
        check_positive("dabfun", self.dabfun)?;
        check_positive("penalty", self.penalty)?;
        if !(self.ctlmin >= 0.0) {
            return Err(DriverError::Configuration(format!(
                "ctlmin must not be negative, got {}",
                self.ctlmin
            )));
        }

        let n = self.design_vars.len();
        if self.lower_bounds.len() != n || self.upper_bounds.len() != n {
            return Err(DriverError::Configuration(format!(
                "lower_bounds ({}) and upper_bounds ({}) must have one entry per design variable ({})",
                self.lower_bounds.len(),
                self.upper_bounds.len(),
                n
            )));
        }
        for ((path, low), high) in self.design_vars.iter().zip(&self.lower_bounds).zip(&self.upper_bounds) {
            if !(low < high) {
                return Err(DriverError::Configuration(format!(
                    "lower bound {} must be below upper bound {} for '{}'",
                    low, high, path
                )));
            }
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Gradient".to_string(),
            fields: vec![
                FieldManifest::new("objective", "string", json!(""), "Expression to minimize"),
                FieldManifest::new("design_vars", "list", json!([]), "Paths of the design variables"),
                FieldManifest::new("lower_bounds", "list", json!([]), "One lower bound per design variable"),
                FieldManifest::new("upper_bounds", "list", json!([]), "One upper bound per design variable"),
                FieldManifest::new("constraints", "list", json!([]), "Constraints, feasible when <= 0"),
                FieldManifest::new("iprint", "integer", json!(0), "0 silent, 1 iterations, 2 evaluations")
                    .range(Some(0.0), Some(2.0)),
                FieldManifest::new("itmax", "integer", json!(10), "Maximum number of iterations")
                    .range(Some(1.0), None),
                FieldManifest::new("fdch", "float", json!(0.01), "Relative finite-difference step"),
                FieldManifest::new("fdchm", "float", json!(0.01), "Minimum absolute finite-difference step"),
                FieldManifest::new("ctlmin", "float", json!(0.001), "Constraint tolerance"),
                FieldManifest::new("delfun", "float", json!(0.001), "Relative objective convergence"),
                FieldManifest::new("dabfun", "float", json!(0.001), "Absolute objective convergence"),
                FieldManifest::new("itrm", "integer", json!(3), "Consecutive converged iterations"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paraboloid() -> GradientConfig {
        GradientConfig {
            objective: "paraboloid.f_xy".to_string(),
            design_vars: vec!["paraboloid.x".to_string(), "paraboloid.y".to_string()],
            lower_bounds: vec![-50.0, -50.0],
            upper_bounds: vec![50.0, 50.0],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(paraboloid().validate().is_ok());
    }

    #[test]
    fn test_bounds_length_mismatch() {
        let mut config = paraboloid();
        config.upper_bounds.pop();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DriverError::Configuration(_)));
        assert!(err.to_string().contains("upper_bounds (1)"));
    }

    #[test]
    fn test_inverted_bounds() {
        let mut config = paraboloid();
        config.lower_bounds[1] = 60.0;
        assert!(config.validate().unwrap_err().to_string().contains("paraboloid.y"));
    }

    #[test]
    fn test_step_sizes_positive() {
        let config = GradientConfig {
            fdch: 0.0,
            ..paraboloid()
        };
        assert!(config.validate().is_err());
    }
}
