use crate::error::{DriverError, Result};
use crate::model::{AttributeKind, AttributePath, IoType, Model, ModelError};
use crate::types::Value;
use rand::Rng;

/// How a design variable's values are drawn and written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Continuous,
    Integer,
    Enumerated,
}

/// A design variable resolved against a model.
///
/// Resolution happens once, when the variable is registered. Genes handed to
/// [`VariableBinding::write`] are native values for continuous and integer
/// variables and indices into `allowed_values` for enumerated ones.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableBinding {
    path: AttributePath,
    kind: VariableKind,
    low: Option<f64>,
    high: Option<f64>,
    allowed_values: Option<Vec<Value>>,
}

impl VariableBinding {
    pub fn resolve(
        driver: &str,
        model: &dyn Model,
        path: AttributePath,
        low: Option<f64>,
        high: Option<f64>,
    ) -> Result<Self> {
        let fail = |message: String| DriverError::validation(driver, message);

        let info = model.attribute(&path.name).ok_or_else(|| {
            fail(format!(
                "Can't add design variable '{}' because it doesn't exist",
                path
            ))
        })?;
        if info.io == IoType::Output {
            return Err(fail(format!(
                "'{}' is an output and can't be a design variable",
                path
            )));
        }

        if let Some(index) = path.index {
            let AttributeKind::Array { len } = info.kind else {
                return Err(fail(format!("'{}' is indexed but '{}' is not an array", path, path.name)));
            };
            if index >= len {
                return Err(fail(format!(
                    "index {} of '{}' is out of range for an array of length {}",
                    index, path, len
                )));
            }
            let (Some(low), Some(high)) = (low, high) else {
                return Err(fail(format!(
                    "values for 'high' and 'low' arguments are required when specifying an \
                     Array element as a design variable. They were not given for '{}'",
                    path
                )));
            };
            check_order(driver, &path, low, high, false)?;
            return Ok(Self {
                path,
                kind: VariableKind::Continuous,
                low: Some(low),
                high: Some(high),
                allowed_values: None,
            });
        }

        match info.kind {
            AttributeKind::Float {
                low: declared_low,
                high: declared_high,
            } => {
                let (low, high) = merge_bounds(driver, &path, low, high, declared_low, declared_high)?;
                check_order(driver, &path, low, high, false)?;
                Ok(Self {
                    path,
                    kind: VariableKind::Continuous,
                    low: Some(low),
                    high: Some(high),
                    allowed_values: None,
                })
            }
            AttributeKind::Int {
                low: declared_low,
                high: declared_high,
            } => {
                let (low, high) = merge_bounds(
                    driver,
                    &path,
                    low,
                    high,
                    declared_low.map(|l| l as f64),
                    declared_high.map(|h| h as f64),
                )?;
                if low.fract() != 0.0 || high.fract() != 0.0 {
                    return Err(fail(format!(
                        "bounds for integer design variable '{}' must be whole numbers",
                        path
                    )));
                }
                check_order(driver, &path, low, high, true)?;
                Ok(Self {
                    path,
                    kind: VariableKind::Integer,
                    low: Some(low),
                    high: Some(high),
                    allowed_values: None,
                })
            }
            AttributeKind::Enum { values } => {
                if values.is_empty() {
                    return Err(fail(format!("'{}' has no allowed values", path)));
                }
                if low.is_some() || high.is_some() {
                    log::warn!(
                        "{}: ignoring 'low'/'high' for enumerated design variable '{}'",
                        driver,
                        path
                    );
                }
                Ok(Self {
                    path,
                    kind: VariableKind::Enumerated,
                    low: None,
                    high: None,
                    allowed_values: Some(values),
                })
            }
            AttributeKind::Array { .. } => Err(fail(format!(
                "'{}' is an array; add its elements individually, e.g. '{}[0]'",
                path, path
            ))),
        }
    }

    pub fn path(&self) -> &AttributePath {
        &self.path
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn low(&self) -> Option<f64> {
        self.low
    }

    pub fn high(&self) -> Option<f64> {
        self.high
    }

    pub fn allowed_values(&self) -> Option<&[Value]> {
        self.allowed_values.as_deref()
    }

    /// Draws a gene uniformly from the variable's domain.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match self.kind {
            VariableKind::Continuous => {
                let (low, high) = self.bounds();
                rng.gen_range(low..=high)
            }
            VariableKind::Integer => {
                let (low, high) = self.bounds();
                rng.gen_range(low as i64..=high as i64) as f64
            }
            VariableKind::Enumerated => rng.gen_range(0..self.choices()) as f64,
        }
    }

    /// Maps a gene to the native value the model receives.
    pub fn decode(&self, gene: f64) -> f64 {
        match self.kind {
            VariableKind::Continuous => gene,
            VariableKind::Integer => gene.round(),
            VariableKind::Enumerated => self
                .choice(gene)
                .and_then(Value::as_f64)
                .unwrap_or(f64::NAN),
        }
    }

    pub fn to_value(&self, gene: f64) -> std::result::Result<Value, ModelError> {
        match self.kind {
            VariableKind::Continuous => Ok(Value::Float(gene)),
            VariableKind::Integer => Ok(Value::Int(gene.round() as i64)),
            VariableKind::Enumerated => self.choice(gene).cloned().ok_or_else(|| ModelError::NotAllowed {
                name: self.path.to_string(),
                value: format!("choice #{}", gene),
            }),
        }
    }

    pub fn write(&self, model: &mut dyn Model, gene: f64) -> std::result::Result<(), ModelError> {
        let value = self.to_value(gene)?;
        self.path.write(model, value)
    }

    /// Current native value on the model.
    pub fn read(&self, model: &dyn Model) -> std::result::Result<f64, ModelError> {
        self.path.read(model)
    }

    fn bounds(&self) -> (f64, f64) {
        (self.low.unwrap_or(0.0), self.high.unwrap_or(0.0))
    }

    fn choices(&self) -> usize {
        self.allowed_values.as_ref().map_or(0, Vec::len)
    }

    fn choice(&self, gene: f64) -> Option<&Value> {
        if gene < 0.0 || !gene.is_finite() {
            return None;
        }
        self.allowed_values.as_ref()?.get(gene.round() as usize)
    }
}

/// Explicit bounds win; a missing one falls back to the declared bound.
fn merge_bounds(
    driver: &str,
    path: &AttributePath,
    low: Option<f64>,
    high: Option<f64>,
    declared_low: Option<f64>,
    declared_high: Option<f64>,
) -> Result<(f64, f64)> {
    let (Some(l), Some(h)) = (low.or(declared_low), high.or(declared_high)) else {
        return Err(DriverError::validation(
            driver,
            format!(
                "values for 'high' and 'low' arguments are required for '{}' because \
                 the variable declares no bounds",
                path
            ),
        ));
    };
    let outside = declared_low.is_some_and(|d| l < d) || declared_high.is_some_and(|d| h > d);
    if outside {
        return Err(DriverError::validation(
            driver,
            format!(
                "bounds [{}, {}] for '{}' exceed the declared range [{}, {}]",
                l,
                h,
                path,
                declared_low.unwrap_or(f64::NEG_INFINITY),
                declared_high.unwrap_or(f64::INFINITY)
            ),
        ));
    }
    Ok((l, h))
}

fn check_order(driver: &str, path: &AttributePath, low: f64, high: f64, allow_equal: bool) -> Result<()> {
    let ordered = if allow_equal { low <= high } else { low < high };
    if !ordered || !low.is_finite() || !high.is_finite() {
        return Err(DriverError::validation(
            driver,
            format!("'low' ({}) must be below 'high' ({}) for '{}'", low, high, path),
        ));
    }
    Ok(())
}
