//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `Σ r_i(θ)²` for a residual function `r: θ → ℝⁿ`, optionally with
//! box bounds on each parameter. Each iteration:
//!
//! - builds a central-difference Jacobian `J` and the gradient `g = Jᵀr`
//! - pins parameters sitting on a bound whose gradient points outward
//! - solves the damped step as the augmented least-squares problem
//!   `[J; √λ·D] δ = [-r; 0]` (`D` = Marquardt column scaling)
//! - projects the trial point into the bounds and accepts it if the SSE
//!   decreases (λ shrinks), otherwise grows λ and retries from the same point
//!
//! The residual closure returns `None` when θ leaves the model's domain; such
//! trial points are treated as infinitely bad and rejected.

use log::trace;
use nalgebra::{DMatrix, DVector};

use crate::math::solve_least_squares;

/// SSE below which the fit is treated as exact.
const SSE_FLOOR: f64 = 1e-14;

/// Smallest column scale used in the damping matrix; columns at or below it are flat.
const SCALE_FLOOR: f64 = 1e-12;

/// Consecutive plateau steps that end the search.
const PLATEAU_STEPS: usize = 2;

/// Optimizer budget and tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmConfig {
    /// Maximum number of Jacobian evaluations (outer iterations).
    pub max_iterations: usize,
    /// Converged when an accepted step reduces the SSE by less than this fraction.
    pub ftol: f64,
    /// Converged after two consecutive accepted steps each reducing the SSE by
    /// less than this fraction (a flat valley floor).
    pub plateau_ftol: f64,
    /// Converged when `‖δ‖ <= xtol · (‖θ‖ + xtol)`.
    pub xtol: f64,
    /// Converged when the scaled gradient `max_j |g_j| / (‖J_j‖·‖r‖)` falls below this.
    pub gtol: f64,
    /// Largest scaled gradient at which saturated damping still counts as a minimum.
    pub stall_gtol: f64,
    pub initial_lambda: f64,
    pub lambda_factor: f64,
    pub min_lambda: f64,
    /// Damping beyond which no descent step exists.
    pub max_lambda: f64,
    /// Relative finite-difference step for the Jacobian.
    pub jacobian_step: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-12,
            plateau_ftol: 1e-9,
            xtol: 1e-10,
            gtol: 1e-10,
            stall_gtol: 1e-4,
            initial_lambda: 1e-3,
            lambda_factor: 10.0,
            min_lambda: 1e-15,
            max_lambda: 1e12,
            jacobian_step: 1e-6,
        }
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LmStop {
    /// Residuals are (numerically) zero.
    ExactFit,
    /// Relative SSE decrease fell below `ftol`, or stayed below `plateau_ftol`.
    SseTolerance,
    /// Step size fell below `xtol`.
    StepTolerance,
    /// Scaled gradient over the free parameters fell below `gtol`.
    GradientTolerance,
    /// Damping saturated at a point whose gradient is already negligible.
    Stalled,
    /// Damping saturated while the gradient still points downhill.
    NoDescent,
    /// The residuals do not respond to any parameter.
    FlatRegion,
    /// `max_iterations` exhausted.
    IterationLimit,
    /// The residual function is undefined at the starting point.
    InvalidStart,
    /// The Jacobian could not be evaluated.
    InvalidJacobian,
}

impl LmStop {
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            LmStop::ExactFit
                | LmStop::SseTolerance
                | LmStop::StepTolerance
                | LmStop::GradientTolerance
                | LmStop::Stalled
        )
    }
}

/// Final optimizer state.
#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: Vec<f64>,
    pub sse: f64,
    pub iterations: usize,
    pub stop: LmStop,
}

impl LmOutcome {
    pub fn converged(&self) -> bool {
        self.stop.is_converged()
    }
}

/// Run unbounded Levenberg–Marquardt from `initial`.
pub fn levenberg_marquardt<F>(residuals: F, initial: &[f64], config: &LmConfig) -> LmOutcome
where
    F: Fn(&[f64]) -> Option<Vec<f64>>,
{
    levenberg_marquardt_bounded(residuals, initial, &[], config)
}

/// Run Levenberg–Marquardt with `bounds[j] = (lo, hi)` on parameter `j`.
///
/// Parameters beyond `bounds.len()` are unbounded. The start is projected into
/// the box before the first evaluation.
pub fn levenberg_marquardt_bounded<F>(
    residuals: F,
    initial: &[f64],
    bounds: &[(f64, f64)],
    config: &LmConfig,
) -> LmOutcome
where
    F: Fn(&[f64]) -> Option<Vec<f64>>,
{
    let k = initial.len();
    let bound = |j: usize| bounds.get(j).copied().unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
    let project = |v: &[f64]| -> Vec<f64> {
        v.iter()
            .enumerate()
            .map(|(j, x)| {
                let (lo, hi) = bound(j);
                x.max(lo).min(hi)
            })
            .collect()
    };
    let mut params = project(initial);

    let Some(mut r) = eval(&residuals, &params) else {
        return finish(params, f64::INFINITY, 0, LmStop::InvalidStart);
    };
    let mut sse = sum_sq(&r);
    let mut lambda = config.initial_lambda;
    let mut plateau = 0;

    for iteration in 0..config.max_iterations {
        if sse < SSE_FLOOR {
            return finish(params, sse, iteration, LmStop::ExactFit);
        }

        let Some(mut jac) = jacobian(&residuals, &params, r.len(), config.jacobian_step) else {
            return finish(params, sse, iteration, LmStop::InvalidJacobian);
        };
        let col_norms: Vec<f64> = (0..k).map(|j| jac.column(j).norm()).collect();
        if col_norms.iter().all(|&c| c <= SCALE_FLOOR) {
            return finish(params, sse, iteration, LmStop::FlatRegion);
        }

        let gradient = jac.transpose() * DVector::from_column_slice(&r);
        let free: Vec<bool> = (0..k)
            .map(|j| {
                let (lo, hi) = bound(j);
                !((params[j] >= hi && gradient[j] < 0.0) || (params[j] <= lo && gradient[j] > 0.0))
            })
            .collect();
        let r_norm = sse.sqrt();
        let gnorm = (0..k)
            .filter(|&j| free[j] && col_norms[j] > SCALE_FLOOR)
            .map(|j| gradient[j].abs() / (col_norms[j] * r_norm))
            .fold(0.0, f64::max);
        if gnorm <= config.gtol {
            return finish(params, sse, iteration, LmStop::GradientTolerance);
        }

        for j in (0..k).filter(|&j| !free[j]) {
            jac.column_mut(j).fill(0.0);
        }
        let scales: Vec<f64> = (0..k)
            .map(|j| if free[j] { col_norms[j].max(SCALE_FLOOR) } else { 1.0 })
            .collect();

        loop {
            let (a, b) = damped_system(&jac, &r, &scales, lambda);
            let step = solve_least_squares(&a, &b);
            let trial = step.as_ref().and_then(|delta| {
                let moved: Vec<f64> = params.iter().zip(delta.iter()).map(|(p, d)| p + d).collect();
                let candidate = project(&moved);
                let step_norm = norm(&candidate.iter().zip(&params).map(|(c, p)| c - p).collect::<Vec<_>>());
                let trial_r = eval(&residuals, &candidate)?;
                let trial_sse = sum_sq(&trial_r);
                Some((candidate, trial_r, trial_sse, step_norm))
            });

            match trial {
                Some((candidate, trial_r, trial_sse, step_norm)) if trial_sse < sse => {
                    let rel_decrease = (sse - trial_sse) / sse;
                    let param_norm = norm(&params);
                    trace!(
                        "lm iter={iteration} sse={trial_sse:.6e} lambda={lambda:.1e} step={step_norm:.3e} grad={gnorm:.3e}"
                    );

                    params = candidate;
                    r = trial_r;
                    sse = trial_sse;
                    lambda = (lambda / config.lambda_factor).max(config.min_lambda);

                    if sse < SSE_FLOOR {
                        return finish(params, sse, iteration + 1, LmStop::ExactFit);
                    }
                    if rel_decrease < config.ftol {
                        return finish(params, sse, iteration + 1, LmStop::SseTolerance);
                    }
                    plateau = if rel_decrease < config.plateau_ftol { plateau + 1 } else { 0 };
                    if plateau >= PLATEAU_STEPS {
                        return finish(params, sse, iteration + 1, LmStop::SseTolerance);
                    }
                    if step_norm <= config.xtol * (param_norm + config.xtol) {
                        return finish(params, sse, iteration + 1, LmStop::StepTolerance);
                    }
                    break;
                }
                _ => {
                    lambda *= config.lambda_factor;
                    if lambda > config.max_lambda {
                        let stop = if gnorm <= config.stall_gtol {
                            LmStop::Stalled
                        } else {
                            LmStop::NoDescent
                        };
                        return finish(params, sse, iteration + 1, stop);
                    }
                }
            }
        }
    }

    finish(params, sse, config.max_iterations, LmStop::IterationLimit)
}

fn finish(params: Vec<f64>, sse: f64, iterations: usize, stop: LmStop) -> LmOutcome {
    LmOutcome {
        params,
        sse,
        iterations,
        stop,
    }
}

fn eval<F>(residuals: &F, params: &[f64]) -> Option<Vec<f64>>
where
    F: Fn(&[f64]) -> Option<Vec<f64>>,
{
    let r = residuals(params)?;
    r.iter().all(|v| v.is_finite()).then_some(r)
}

fn sum_sq(r: &[f64]) -> f64 {
    r.iter().map(|v| v * v).sum()
}

fn norm(v: &[f64]) -> f64 {
    sum_sq(v).sqrt()
}

/// Central-difference Jacobian `∂r_i/∂θ_j`.
fn jacobian<F>(residuals: &F, params: &[f64], n: usize, rel_step: f64) -> Option<DMatrix<f64>>
where
    F: Fn(&[f64]) -> Option<Vec<f64>>,
{
    let k = params.len();
    let mut jac = DMatrix::<f64>::zeros(n, k);

    for j in 0..k {
        let h = rel_step * params[j].abs().max(1.0);

        let mut up = params.to_vec();
        up[j] += h;
        let mut down = params.to_vec();
        down[j] -= h;

        let r_up = eval(residuals, &up)?;
        let r_down = eval(residuals, &down)?;
        if r_up.len() != n || r_down.len() != n {
            return None;
        }

        for i in 0..n {
            jac[(i, j)] = (r_up[i] - r_down[i]) / (2.0 * h);
        }
    }

    Some(jac)
}

/// Build `[J; √λ·D]` and `[-r; 0]`.
fn damped_system(jac: &DMatrix<f64>, r: &[f64], scales: &[f64], lambda: f64) -> (DMatrix<f64>, DVector<f64>) {
    let n = jac.nrows();
    let k = jac.ncols();
    let sqrt_lambda = lambda.sqrt();

    let mut a = DMatrix::<f64>::zeros(n + k, k);
    a.view_mut((0, 0), (n, k)).copy_from(jac);
    for j in 0..k {
        a[(n + j, j)] = sqrt_lambda * scales[j];
    }

    let mut b = DVector::<f64>::zeros(n + k);
    for i in 0..n {
        b[i] = -r[i];
    }

    (a, b)
}
