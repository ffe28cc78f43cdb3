use approx::assert_abs_diff_eq;
use optdriver::config::GradientConfig;
use optdriver::driver::{Driver, Evaluation};
use optdriver::engines::gradient::{
    ConstrainedGradientDriver, ConstrainedSolver, SolverOutcome, SolverProblem, SolverSettings,
};
use optdriver::model::{Assembly, AttributeInfo, Model, ModelError, Paraboloid};
use optdriver::types::{ConstraintSense, Value};
use optdriver::DriverError;
use std::cell::Cell;
use std::rc::Rc;

fn paraboloid() -> Assembly {
    let mut top = Assembly::new();
    top.add("paraboloid", Paraboloid::new()).unwrap();
    top
}

/// Constrained paraboloid with the classic CONMIN settings.
fn constrained_driver() -> ConstrainedGradientDriver {
    let mut driver = ConstrainedGradientDriver::new("driver");
    driver.set_objective("paraboloid.f_xy");
    driver.add_des_var("paraboloid.x", -50.0, 50.0);
    driver.add_des_var("paraboloid.y", -50.0, 50.0);
    driver.add_constraint("paraboloid.y-paraboloid.x+15.0");
    let config = driver.config_mut();
    config.iprint = 0;
    config.itmax = 30;
    config.fdch = 0.000001;
    config.fdchm = 0.000001;
    driver
}

#[test]
fn test_constrained_paraboloid() {
    let mut top = paraboloid();
    let mut driver = constrained_driver();
    let report = driver.run(&mut top).unwrap();

    assert!(report.converged);
    assert!(report.feasible);
    assert!(driver.iter_count() >= 1 && driver.iter_count() <= 30);

    let x = top.get("paraboloid.x").unwrap().as_f64().unwrap();
    let y = top.get("paraboloid.y").unwrap().as_f64().unwrap();
    assert_abs_diff_eq!(x, 7.1667, epsilon = 1e-3);
    assert_abs_diff_eq!(y, -7.8333, epsilon = 1e-3);
    assert!(y - x + 15.0 <= 1e-3);

    let f_xy = top.get("paraboloid.f_xy").unwrap().as_f64().unwrap();
    assert_abs_diff_eq!(f_xy, -27.0833, epsilon = 1e-3);
    assert_eq!(report.objective, f_xy);
    assert_eq!(driver.final_point(), &[x, y]);
    assert_eq!(report.design_values[0].0, "paraboloid.x");
}

#[test]
fn test_greater_or_equal_sense() {
    let mut top = paraboloid();
    let mut driver = constrained_driver();
    let config = driver.config_mut();
    config.constraints = vec!["paraboloid.x-paraboloid.y-15.0".to_string()];
    config.constraint_sense = ConstraintSense::GreaterOrEqualZero;
    driver.run(&mut top).unwrap();

    let x = top.get("paraboloid.x").unwrap().as_f64().unwrap();
    let y = top.get("paraboloid.y").unwrap().as_f64().unwrap();
    assert_abs_diff_eq!(x, 43.0 / 6.0, epsilon = 1e-3);
    assert_abs_diff_eq!(y, -47.0 / 6.0, epsilon = 1e-3);
}

#[test]
fn test_bounds_length_mismatch() {
    let mut top = paraboloid();
    let mut driver = constrained_driver();
    driver.config_mut().upper_bounds.pop();
    let err = driver.run(&mut top).unwrap_err();
    assert!(matches!(err, DriverError::Configuration(_)));
    assert_eq!(driver.iter_count(), 0);
}

#[test]
fn test_missing_objective() {
    let mut top = paraboloid();
    let mut driver = ConstrainedGradientDriver::with_config(
        "driver",
        GradientConfig {
            design_vars: vec!["paraboloid.x".to_string()],
            lower_bounds: vec![-50.0],
            upper_bounds: vec![50.0],
            ..Default::default()
        },
    );
    let err = driver.run(&mut top).unwrap_err();
    assert!(matches!(err, DriverError::Configuration(_)));
}

#[test]
fn test_bounds_beyond_declared_range() {
    let mut top = paraboloid();
    let mut driver = ConstrainedGradientDriver::new("driver");
    driver.set_objective("paraboloid.f_xy");
    driver.add_des_var("paraboloid.x", -60.0, 50.0);
    let err = driver.run(&mut top).unwrap_err();
    assert!(matches!(err, DriverError::Validation { .. }));
}

/// Evaluates the start point once and reports it as the answer.
struct StayPut {
    calls: usize,
}

impl ConstrainedSolver for StayPut {
    fn minimize(
        &mut self,
        problem: &mut dyn SolverProblem,
        x0: &[f64],
        _lower: &[f64],
        _upper: &[f64],
        settings: &SolverSettings,
    ) -> optdriver::Result<SolverOutcome> {
        self.calls += 1;
        assert_eq!(problem.dimension(), x0.len());
        assert_eq!(settings.itmax, 30);
        let Evaluation {
            objective,
            constraints,
            ..
        } = problem.evaluate(x0)?;
        problem.on_iteration(1, x0, objective, constraints[0]);
        Ok(SolverOutcome {
            x: x0.to_vec(),
            objective,
            max_violation: constraints[0].max(0.0),
            iterations: 1,
            converged: false,
        })
    }
}

#[test]
fn test_custom_solver_sees_model_start_point() {
    let mut top = paraboloid();
    top.set("paraboloid.x", Value::Float(3.0)).unwrap();
    top.set("paraboloid.y", Value::Float(-4.0)).unwrap();

    let mut driver = constrained_driver().with_solver(StayPut { calls: 0 });
    let report = driver.run(&mut top).unwrap();

    assert_eq!(report.iterations, 1);
    assert!(!report.converged);
    // Start point is infeasible: -4 - 3 + 15 = 8
    assert!(!report.feasible);
    assert_eq!(report.objective, -15.0);
    assert_eq!(report.evaluations, 2);
    assert_eq!(driver.final_point(), &[3.0, -4.0]);
}

/// Paraboloid whose execute step always fails, counting the attempts.
struct FailingParaboloid {
    inner: Paraboloid,
    attempts: Rc<Cell<usize>>,
}

impl Model for FailingParaboloid {
    fn attribute(&self, name: &str) -> Option<AttributeInfo> {
        self.inner.attribute(name)
    }

    fn get(&self, name: &str) -> Result<Value, ModelError> {
        self.inner.get(name)
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
        self.inner.set(name, value)
    }

    fn execute(&mut self) -> Result<(), ModelError> {
        self.attempts.set(self.attempts.get() + 1);
        Err(ModelError::Execution("mesh did not converge".to_string()))
    }
}

#[test]
fn test_model_failure_stops_the_run() {
    let attempts = Rc::new(Cell::new(0));
    let mut top = Assembly::new();
    top.add(
        "paraboloid",
        FailingParaboloid {
            inner: Paraboloid::new(),
            attempts: Rc::clone(&attempts),
        },
    )
    .unwrap();

    let mut driver = constrained_driver();
    let err = driver.run(&mut top).unwrap_err();
    match &err {
        DriverError::Evaluation { driver, message } => {
            assert_eq!(driver, "driver");
            assert!(message.contains("mesh did not converge"), "{}", message);
        }
        other => panic!("expected an evaluation error, got {:?}", other),
    }
    // The first failing evaluation ends the run
    assert_eq!(attempts.get(), 1);
    assert!(driver.final_point().is_empty());
}
