use super::solver::{ConstrainedSolver, SolverOutcome, SolverProblem, SolverSettings};
use crate::error::Result;
use ndarray::{Array1, Array2, Axis, Zip};

const ARMIJO: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 40;
const CURVATURE_FLOOR: f64 = 1e-12;
const MAX_PENALTY: f64 = 1e8;

/// Augmented Lagrangian method with a projected quasi-Newton inner solve.
///
/// Each outer iteration minimizes
/// `f + r/2 * sum(max(0, g + lambda/r)^2) - sum(lambda^2)/(2r)` over the
/// bounds, then updates the multipliers `lambda = max(0, lambda + r*g)`.
/// Gradients are central finite differences with the step from
/// [`SolverSettings::step`], shortened near a bound so no evaluation leaves
/// the box. Outer iterations are counted against `itmax`.
#[derive(Debug, Clone)]
pub struct AugmentedLagrangian {
    pub max_inner_iterations: usize,
    /// Factor applied to the penalty when an outer iteration fails to cut
    /// the violation by at least three quarters.
    pub penalty_growth: f64,
}

impl Default for AugmentedLagrangian {
    fn default() -> Self {
        Self {
            max_inner_iterations: 200,
            penalty_growth: 4.0,
        }
    }
}

/// Merit function of one outer iteration
struct Merit<'a> {
    problem: &'a mut dyn SolverProblem,
    multipliers: &'a Array1<f64>,
    penalty: f64,
}

impl Merit<'_> {
    fn value(&mut self, x: &Array1<f64>) -> Result<f64> {
        let evaluation = self.problem.evaluate(&x.to_vec())?;
        let r = self.penalty;
        let shifted: f64 = evaluation
            .constraints
            .iter()
            .zip(self.multipliers.iter())
            .map(|(g, lambda)| {
                let t = (g + lambda / r).max(0.0);
                t * t - (lambda / r) * (lambda / r)
            })
            .sum();
        Ok(evaluation.objective + 0.5 * r * shifted)
    }

    fn gradient(
        &mut self,
        x: &Array1<f64>,
        lower: &Array1<f64>,
        upper: &Array1<f64>,
        settings: &SolverSettings,
    ) -> Result<Array1<f64>> {
        let mut grad = Array1::zeros(x.len());
        let mut probe = x.clone();
        for i in 0..x.len() {
            let h = settings.step(x[i]);
            let forward = (x[i] + h).min(upper[i]);
            let backward = (x[i] - h).max(lower[i]);
            if forward <= backward {
                continue;
            }
            probe[i] = forward;
            let f_forward = self.value(&probe)?;
            probe[i] = backward;
            let f_backward = self.value(&probe)?;
            probe[i] = x[i];
            grad[i] = (f_forward - f_backward) / (forward - backward);
        }
        Ok(grad)
    }
}

impl AugmentedLagrangian {
    /// Projected BFGS on the merit function, starting from `x`.
    fn inner_minimize(
        &self,
        merit: &mut Merit<'_>,
        x: Array1<f64>,
        lower: &Array1<f64>,
        upper: &Array1<f64>,
        settings: &SolverSettings,
    ) -> Result<Array1<f64>> {
        let n = x.len();
        let mut x = x;
        let mut phi = merit.value(&x)?;
        let mut grad = merit.gradient(&x, lower, upper, settings)?;
        let mut inverse_hessian = Array2::<f64>::eye(n);

        for _ in 0..self.max_inner_iterations {
            let projected = projected_gradient(&x, &grad, lower, upper);
            if inf_norm(&projected) <= 1e-7 * (1.0 + phi.abs()) {
                break;
            }

            let mut direction = descent_direction(&inverse_hessian, &grad, &x, lower, upper);
            let mut slope = direction.dot(&grad);
            if !(slope < 0.0) {
                inverse_hessian = Array2::eye(n);
                direction = -&projected;
                slope = direction.dot(&grad);
                if !(slope < 0.0) {
                    break;
                }
            }

            let mut t = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let candidate = clamp(&(&x + &(&direction * t)), lower, upper);
                let step = &candidate - &x;
                let predicted = grad.dot(&step);
                let value = merit.value(&candidate)?;
                if value <= phi + ARMIJO * predicted.min(0.0) && predicted < 0.0 {
                    accepted = Some((candidate, step, value));
                    break;
                }
                t *= 0.5;
            }
            let Some((candidate, step, value)) = accepted else {
                break;
            };

            let new_grad = merit.gradient(&candidate, lower, upper, settings)?;
            let change = &new_grad - &grad;
            let curvature = step.dot(&change);
            if curvature > CURVATURE_FLOOR {
                bfgs_update(&mut inverse_hessian, &step, &change, curvature);
            }

            let converged = (phi - value).abs() <= 1e-14 * (1.0 + value.abs());
            x = candidate;
            phi = value;
            grad = new_grad;
            if converged {
                break;
            }
        }

        Ok(x)
    }
}

impl ConstrainedSolver for AugmentedLagrangian {
    fn minimize(
        &mut self,
        problem: &mut dyn SolverProblem,
        x0: &[f64],
        lower: &[f64],
        upper: &[f64],
        settings: &SolverSettings,
    ) -> Result<SolverOutcome> {
        let lower = Array1::from(lower.to_vec());
        let upper = Array1::from(upper.to_vec());
        let mut x = clamp(&Array1::from(x0.to_vec()), &lower, &upper);
        let start = problem.evaluate(&x.to_vec())?;
        let mut multipliers = Array1::<f64>::zeros(start.constraints.len());
        let mut penalty = settings.penalty;
        let mut previous_objective = start.objective;
        let mut previous_violation = start.max_violation();
        let mut outcome = SolverOutcome {
            x: x.to_vec(),
            objective: start.objective,
            max_violation: previous_violation,
            iterations: 0,
            converged: false,
        };
        let mut small_changes = 0;

        for iteration in 1..=settings.itmax {
            let mut merit = Merit {
                problem: &mut *problem,
                multipliers: &multipliers,
                penalty,
            };
            x = self.inner_minimize(&mut merit, x, &lower, &upper, settings)?;

            let point = x.to_vec();
            let evaluation = problem.evaluate(&point)?;
            let max_violation = evaluation.max_violation();
            for (lambda, g) in multipliers.iter_mut().zip(&evaluation.constraints) {
                *lambda = (*lambda + penalty * g).max(0.0);
            }

            if max_violation <= settings.ctlmin && settings.is_small_change(previous_objective, evaluation.objective) {
                small_changes += 1;
            } else {
                small_changes = 0;
            }
            if max_violation > settings.ctlmin && max_violation > 0.25 * previous_violation {
                penalty = (penalty * self.penalty_growth).min(MAX_PENALTY);
            }

            problem.on_iteration(iteration, &point, evaluation.objective, max_violation);
            outcome = SolverOutcome {
                x: point,
                objective: evaluation.objective,
                max_violation,
                iterations: iteration,
                converged: small_changes >= settings.itrm,
            };
            if outcome.converged {
                break;
            }
            previous_objective = evaluation.objective;
            previous_violation = max_violation;
        }

        Ok(outcome)
    }
}

fn inf_norm(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}

fn clamp(x: &Array1<f64>, lower: &Array1<f64>, upper: &Array1<f64>) -> Array1<f64> {
    Zip::from(x)
        .and(lower)
        .and(upper)
        .map_collect(|&xi, &lo, &hi| xi.max(lo).min(hi))
}

fn at_blocking_bound(x: f64, g: f64, lower: f64, upper: f64) -> bool {
    (x <= lower && g > 0.0) || (x >= upper && g < 0.0)
}

/// Gradient with components pushing out of the box removed.
fn projected_gradient(x: &Array1<f64>, grad: &Array1<f64>, lower: &Array1<f64>, upper: &Array1<f64>) -> Array1<f64> {
    Zip::from(x)
        .and(grad)
        .and(lower)
        .and(upper)
        .map_collect(|&xi, &gi, &lo, &hi| if at_blocking_bound(xi, gi, lo, hi) { 0.0 } else { gi })
}

/// Quasi-Newton direction restricted to the free variables.
fn descent_direction(
    h: &Array2<f64>,
    grad: &Array1<f64>,
    x: &Array1<f64>,
    lower: &Array1<f64>,
    upper: &Array1<f64>,
) -> Array1<f64> {
    let free = Zip::from(x)
        .and(grad)
        .and(lower)
        .and(upper)
        .map_collect(|&xi, &gi, &lo, &hi| !at_blocking_bound(xi, gi, lo, hi));
    let free_grad = Zip::from(grad)
        .and(&free)
        .map_collect(|&g, &is_free| if is_free { g } else { 0.0 });

    let mut direction = -h.dot(&free_grad);
    Zip::from(&mut direction).and(&free).for_each(|d, &is_free| {
        if !is_free {
            *d = 0.0;
        }
    });
    direction
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    a.view().insert_axis(Axis(1)).dot(&b.view().insert_axis(Axis(0)))
}

/// Inverse BFGS update `H = (I - rho s y^T) H (I - rho y s^T) + rho s s^T`.
fn bfgs_update(h: &mut Array2<f64>, s: &Array1<f64>, y: &Array1<f64>, sy: f64) {
    let rho = 1.0 / sy;
    let hy = h.dot(y);
    let yhy = y.dot(&hy);
    let cross = outer(s, &hy) + outer(&hy, s);
    h.scaled_add(-rho, &cross);
    h.scaled_add(rho * rho * yhy + rho, &outer(s, s));
}
