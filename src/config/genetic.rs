use super::traits::{check_positive, check_rate, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::DriverError;
use crate::types::{ConstraintSense, OptimizationDirection};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    Tournament,
    #[default]
    Roulette,
    Rank,
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMethod {
    #[default]
    SinglePoint,
    Uniform,
}

/// What the GA does when evaluating an individual fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationErrorPolicy {
    /// Abort the run with the evaluation error
    #[default]
    Abort,
    /// Score the individual as maximally infeasible and continue
    Penalize,
}

/// Design variable entry of a run file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignVarSpec {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
}

impl DesignVarSpec {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            low: None,
            high: None,
        }
    }

    pub fn bounded(path: &str, low: f64, high: f64) -> Self {
        Self {
            path: path.to_string(),
            low: Some(low),
            high: Some(high),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub objective: String,
    pub constraints: Vec<String>,
    pub constraint_sense: ConstraintSense,
    pub population_size: usize,
    pub generations: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub opt_type: OptimizationDirection,
    pub selection_method: SelectionMethod,
    pub tournament_size: usize,
    pub crossover_method: CrossoverMethod,
    pub elitism: bool,
    pub penalty_weight: f64,
    pub on_evaluation_error: EvaluationErrorPolicy,
    pub design_vars: Vec<DesignVarSpec>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            objective: String::new(),
            constraints: Vec::new(),
            constraint_sense: ConstraintSense::default(),
            population_size: 80,
            generations: 10,
            crossover_rate: 0.8,
            mutation_rate: 0.02,
            seed: None,
            opt_type: OptimizationDirection::Minimize,
            selection_method: SelectionMethod::Roulette,
            tournament_size: 2,
            crossover_method: CrossoverMethod::SinglePoint,
            elitism: true,
            penalty_weight: 1.0,
            on_evaluation_error: EvaluationErrorPolicy::Abort,
            design_vars: Vec::new(),
        }
    }
}

impl ConfigSection for GeneticConfig {
    fn section_name() -> &'static str {
        "genetic"
    }

    fn validate(&self) -> Result<(), DriverError> {
        if self.population_size < 2 {
            return Err(DriverError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if self.tournament_size < 1 {
            return Err(DriverError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        check_rate("Mutation rate", self.mutation_rate)?;
        check_rate("Crossover rate", self.crossover_rate)?;
        check_positive("Penalty weight", self.penalty_weight)?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Genetic".to_string(),
            fields: vec![
                FieldManifest::new("objective", "string", json!(""), "Expression to optimize"),
                FieldManifest::new(
                    "population_size",
                    "integer",
                    json!(80),
                    "Number of individuals per generation",
                )
                .range(Some(2.0), None),
                FieldManifest::new(
                    "generations",
                    "integer",
                    json!(10),
                    "Evolution cycles after the initial population",
                ),
                FieldManifest::new(
                    "crossover_rate",
                    "float",
                    json!(0.8),
                    "Probability that a parent pair is recombined",
                )
                .range(Some(0.0), Some(1.0)),
                FieldManifest::new(
                    "mutation_rate",
                    "float",
                    json!(0.02),
                    "Per-gene probability of resampling",
                )
                .range(Some(0.0), Some(1.0)),
                FieldManifest::new("seed", "integer", json!(null), "Random seed; omit for entropy"),
                FieldManifest::new("opt_type", "enum", json!("minimize"), "minimize | maximize"),
                FieldManifest::new(
                    "selection_method",
                    "enum",
                    json!("roulette"),
                    "tournament | roulette | rank | uniform",
                ),
                FieldManifest::new(
                    "crossover_method",
                    "enum",
                    json!("single_point"),
                    "single_point | uniform",
                ),
                FieldManifest::new("elitism", "bool", json!(true), "Carry the best individual forward"),
                FieldManifest::new(
                    "on_evaluation_error",
                    "enum",
                    json!("abort"),
                    "abort | penalize",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = GeneticConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population_size, 80);
        assert_eq!(config.selection_method, SelectionMethod::Roulette);
    }

    #[test]
    fn test_invalid_rates() {
        let config = GeneticConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DriverError::Configuration(_))));

        let config = GeneticConfig {
            population_size: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = GeneticConfig {
            penalty_weight: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: GeneticConfig = toml::from_str(
            r#"
            objective = "comp.total"
            seed = 123
            selection_method = "tournament"
            opt_type = "maximize"

            [[design_vars]]
            path = "comp.x[0]"
            low = -5.12
            high = 5.13
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(123));
        assert_eq!(config.selection_method, SelectionMethod::Tournament);
        assert_eq!(config.opt_type, OptimizationDirection::Maximize);
        assert_eq!(config.design_vars, vec![DesignVarSpec::bounded("comp.x[0]", -5.12, 5.13)]);
        assert_eq!(config.generations, 10);
    }
}
