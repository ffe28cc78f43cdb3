use crate::config::{ConfigSection, CrossoverMethod, EvaluationErrorPolicy, GeneticConfig, SelectionMethod};
use crate::driver::{DesignVariableRegistry, Driver, ObjectiveEvaluator, RunReport, VariableBinding};
use crate::engines::genetic::{
    genome::{assign_scores, best_index, worst_objective, Genome, Individual},
    operators::*,
    progress::{LogProgressCallback, ProgressCallback},
};
use crate::error::{DriverError, Result};
use crate::model::Model;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// Generational genetic algorithm over the registered design variables.
///
/// The initial population counts as generation 0, after which exactly
/// `generations` evolution cycles run. With a fixed `seed` two runs on the
/// same model produce identical results.
pub struct Genetic {
    name: String,
    config: GeneticConfig,
    registry: DesignVariableRegistry,
    best: Option<Individual>,
    history: Vec<f64>,
    /// Penalty base for infeasible individuals, fixed by the first
    /// generation with a finite objective
    penalty_anchor: Option<f64>,
    generations_run: usize,
    evaluations: usize,
}

impl Genetic {
    pub fn new(name: &str) -> Self {
        Self::with_config(name, GeneticConfig::default())
    }

    /// Design variables listed in `config` are not registered; use
    /// [`Genetic::from_config`] when a model is at hand.
    pub fn with_config(name: &str, config: GeneticConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            registry: DesignVariableRegistry::new(name, "genetic"),
            best: None,
            history: Vec::new(),
            penalty_anchor: None,
            generations_run: 0,
            evaluations: 0,
        }
    }

    /// Builds the driver and registers the configured design variables
    /// against `model`.
    pub fn from_config(name: &str, mut config: GeneticConfig, model: &dyn Model) -> Result<Self> {
        config.validate()?;
        let design_vars = std::mem::take(&mut config.design_vars);
        let mut driver = Self::with_config(name, config);
        for spec in &design_vars {
            driver.add_des_var(model, &spec.path, spec.low, spec.high)?;
        }
        Ok(driver)
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GeneticConfig {
        &mut self.config
    }

    pub fn set_objective(&mut self, objective: &str) {
        self.config.objective = objective.to_string();
    }

    pub fn add_constraint(&mut self, constraint: &str) {
        self.config.constraints.push(constraint.to_string());
    }

    pub fn add_des_var(&mut self, model: &dyn Model, path: &str, low: Option<f64>, high: Option<f64>) -> Result<()> {
        self.registry.add(model, path, low, high)
    }

    pub fn remove_des_var(&mut self, path: &str) -> Result<()> {
        self.registry.remove(path)
    }

    pub fn list_des_vars(&self) -> Vec<String> {
        self.registry.list()
    }

    pub fn clear_des_vars(&mut self) {
        self.registry.clear();
    }

    pub fn registry(&self) -> &DesignVariableRegistry {
        &self.registry
    }

    /// Best individual of the last run under the feasibility-first rule.
    pub fn best_individual(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    /// Best score after each generation of the last run, generation 0 first.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluations
    }

    pub fn run_with_progress<C: ProgressCallback>(
        &mut self,
        model: &mut dyn Model,
        callback: &mut C,
    ) -> Result<RunReport> {
        self.config.validate()?;
        if self.registry.is_empty() {
            return Err(DriverError::Configuration(format!(
                "{}: no design variables have been added",
                self.name
            )));
        }
        let mut evaluator = ObjectiveEvaluator::new(
            &self.name,
            &self.config.objective,
            &self.config.constraints,
            self.config.constraint_sense,
        )?;
        let bindings: Vec<VariableBinding> = self.registry.iter().cloned().collect();
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        self.best = None;
        self.history.clear();
        self.penalty_anchor = None;
        self.generations_run = 0;
        self.evaluations = 0;

        log::info!(
            "{}: genetic run over {} design variables, population {}, {} generations",
            self.name,
            bindings.len(),
            self.config.population_size,
            self.config.generations
        );

        let genomes: Vec<Genome> = (0..self.config.population_size)
            .map(|_| random_genome(&bindings, &mut rng))
            .collect();
        let mut population = self.evaluate_generation(0, genomes, model, &mut evaluator, callback)?;

        for generation in 1..=self.config.generations {
            let genomes = self.create_next_generation(&population, &bindings, &mut rng);
            population = self.evaluate_generation(generation, genomes, model, &mut evaluator, callback)?;
            self.generations_run = generation;
        }
        self.evaluations = evaluator.evaluation_count();

        let best = self
            .best
            .clone()
            .ok_or_else(|| DriverError::evaluation(&self.name, "no individual was evaluated"))?;

        // Leave the model holding the best design
        if best.violation.is_finite() {
            for (binding, gene) in bindings.iter().zip(&best.genome) {
                binding.write(model, *gene)?;
            }
            model.execute()?;
        }

        Ok(RunReport {
            driver: self.name.clone(),
            iterations: self.generations_run,
            evaluations: self.evaluations,
            converged: true,
            feasible: best.is_feasible(),
            objective: best.objective,
            design_values: self.registry.list().into_iter().zip(best.decoded).collect(),
        })
    }

    fn evaluate_generation<C: ProgressCallback>(
        &mut self,
        generation: usize,
        genomes: Vec<Genome>,
        model: &mut dyn Model,
        evaluator: &mut ObjectiveEvaluator,
        callback: &mut C,
    ) -> Result<Vec<Individual>> {
        callback.on_generation_start(generation);

        let total = genomes.len();
        let mut population = Vec::with_capacity(total);
        for (i, genome) in genomes.into_iter().enumerate() {
            let individual = match evaluator.evaluate(model, &self.registry, &genome) {
                Ok(evaluation) => Individual::evaluated(genome, evaluation),
                Err(err) => match self.config.on_evaluation_error {
                    EvaluationErrorPolicy::Abort => return Err(err),
                    EvaluationErrorPolicy::Penalize => {
                        log::warn!("{} (individual penalized)", err);
                        let decoded = self.registry.decode(&genome);
                        Individual::failed(genome, decoded, self.config.opt_type)
                    }
                },
            };
            population.push(individual);
            callback.on_individual_evaluated(i + 1, total);
        }
        if self.penalty_anchor.is_none() {
            self.penalty_anchor = worst_objective(&population, self.config.opt_type);
        }
        assign_scores(
            &mut population,
            self.config.opt_type,
            self.config.penalty_weight,
            self.penalty_anchor,
        );

        if let Some(idx) = best_index(&population, self.config.opt_type) {
            let improved = match &self.best {
                Some(best) => population[idx].compare(best, self.config.opt_type).is_lt(),
                None => true,
            };
            if improved {
                self.best = Some(population[idx].clone());
            }
        }
        if let Some(best) = &self.best {
            self.history.push(best.score);
            callback.on_generation_complete(generation, best);
        }

        Ok(population)
    }

    fn create_next_generation<R: Rng>(
        &self,
        population: &[Individual],
        bindings: &[VariableBinding],
        rng: &mut R,
    ) -> Vec<Genome> {
        let size = self.config.population_size;
        let mut next_generation = Vec::with_capacity(size);

        if self.config.elitism {
            if let Some(idx) = best_index(population, self.config.opt_type) {
                next_generation.push(population[idx].genome.clone());
            }
        }

        while next_generation.len() < size {
            let parent1 = &population[self.select(population, rng)].genome;
            let parent2 = &population[self.select(population, rng)].genome;

            let (mut child1, mut child2) = if rng.gen::<f64>() < self.config.crossover_rate {
                match self.config.crossover_method {
                    CrossoverMethod::SinglePoint => single_point_crossover(parent1, parent2, rng),
                    CrossoverMethod::Uniform => uniform_crossover(parent1, parent2, rng),
                }
            } else {
                (parent1.clone(), parent2.clone())
            };

            mutate(&mut child1, bindings, self.config.mutation_rate, rng);
            mutate(&mut child2, bindings, self.config.mutation_rate, rng);

            next_generation.push(child1);
            if next_generation.len() < size {
                next_generation.push(child2);
            }
        }

        next_generation
    }

    fn select<R: Rng>(&self, population: &[Individual], rng: &mut R) -> usize {
        let direction = self.config.opt_type;
        match self.config.selection_method {
            SelectionMethod::Tournament => {
                tournament_selection(population, self.config.tournament_size, direction, rng)
            }
            SelectionMethod::Roulette => roulette_selection(population, direction, rng),
            SelectionMethod::Rank => rank_selection(population, direction, rng),
            SelectionMethod::Uniform => uniform_selection(population, rng),
        }
    }
}

impl Driver for Genetic {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, model: &mut dyn Model) -> Result<RunReport> {
        let mut callback = LogProgressCallback::new(&self.name);
        self.run_with_progress(model, &mut callback)
    }

    fn iter_count(&self) -> usize {
        self.generations_run
    }
}
