//! Dynamic programming solvers for [`DiscreteDp`].
//!
//! A decision rule is stored as one row (pair) index per state. Ties between actions are
//! broken towards the first pair of the state, so every solve is deterministic.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::operator::TransitionOperator;
use super::DiscreteDp;
use crate::error::{Error, Result};
use crate::helper_methods::{midrange, span, sup_norm, sup_norm_diff};

pub const DEFAULT_EPSILON: f64 = 1e-3;
pub const DEFAULT_MAX_ITER: usize = 250;
pub const DEFAULT_K: usize = 20;

/// Relative accuracy of iterative policy evaluation.
const EVAL_TOL: f64 = 1e-12;
const EVAL_MAX_SWEEPS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum SolveMethod {
    ValueIteration,
    PolicyIteration,
    /// `k` applications of the policy operator between improvement steps
    ModifiedPolicyIteration { k: usize },
}

impl SolveMethod {
    pub fn all(k: usize) -> [SolveMethod; 3] {
        [
            SolveMethod::ValueIteration,
            SolveMethod::PolicyIteration,
            SolveMethod::ModifiedPolicyIteration { k },
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SolveMethod::ValueIteration => "value_iteration",
            SolveMethod::PolicyIteration => "policy_iteration",
            SolveMethod::ModifiedPolicyIteration { .. } => "modified_policy_iteration",
        }
    }
}

impl Default for SolveMethod {
    fn default() -> Self {
        SolveMethod::PolicyIteration
    }
}

impl std::fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveMethod::ModifiedPolicyIteration { k } => write!(f, "{}(k={})", self.name(), k),
            _ => write!(f, "{}", self.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Target accuracy of value and modified policy iteration
    pub epsilon: f64,
    /// Cap on outer iterations
    pub max_iter: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            epsilon: DEFAULT_EPSILON,
            max_iter: DEFAULT_MAX_ITER,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(Error::InvalidConfiguration(format!(
                "solver epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidConfiguration(
                "solver max_iter must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResult {
    pub method: SolveMethod,
    /// Chosen action index for each state
    pub policy: Vec<usize>,
    pub values: Vec<f64>,
    pub num_iter: usize,
    /// False when `max_iter` was reached before the stopping rule fired
    pub converged: bool,
}

impl<T: TransitionOperator> DiscreteDp<T> {
    pub fn solve(&self, method: SolveMethod, options: &SolverOptions) -> Result<SolveResult> {
        options.validate()?;
        let (rows, v, num_iter, converged) = match method {
            SolveMethod::ValueIteration => self.value_iteration(options),
            SolveMethod::PolicyIteration => self.policy_iteration(options),
            SolveMethod::ModifiedPolicyIteration { k } => self.modified_policy_iteration(k, options)?,
        };
        if converged {
            info!(%method, num_iter, "solve converged");
        } else {
            warn!(%method, max_iter = options.max_iter, "solve hit the iteration cap before converging");
        }
        Ok(SolveResult {
            method,
            policy: self.actions_of(&rows),
            values: v.to_vec(),
            num_iter,
            converged,
        })
    }

    /// R[i] + beta * sum_j Q[i, j] v[j] for every pair `i`.
    pub fn pair_values(&self, v: &Array1<f64>) -> Array1<f64> {
        (0..self.num_pairs())
            .map(|i| self.rewards[i] + self.discount * self.transitions.row_dot(i, v))
            .collect()
    }

    /// State-wise maximum of a pair vector, with the maximizing row of each state.
    pub fn state_wise_max(&self, pair_vals: &Array1<f64>) -> (Array1<f64>, Vec<usize>) {
        let n = self.num_states();
        let mut best = Array1::<f64>::zeros(n);
        let mut rows: Vec<usize> = vec![0; n];
        for s in 0..n {
            let pairs = self.pairs_of(s);
            let mut arg = pairs.start;
            let mut max = pair_vals[arg];
            for i in pairs.skip(1) {
                if pair_vals[i] > max {
                    max = pair_vals[i];
                    arg = i;
                }
            }
            best[s] = max;
            rows[s] = arg;
        }
        (best, rows)
    }

    /// Bellman operator: returns Tv and a v-greedy decision rule.
    pub fn bellman(&self, v: &Array1<f64>) -> (Array1<f64>, Vec<usize>) {
        self.state_wise_max(&self.pair_values(v))
    }

    pub fn greedy(&self, v: &Array1<f64>) -> Vec<usize> {
        self.bellman(v).1
    }

    /// T_sigma v = R_sigma + beta Q_sigma v.
    pub fn policy_operator(&self, rows: &[usize], v: &Array1<f64>) -> Array1<f64> {
        rows.iter()
            .map(|&i| self.rewards[i] + self.discount * self.transitions.row_dot(i, v))
            .collect()
    }

    /// Value of following the decision rule forever, the fixed point of T_sigma.
    pub fn evaluate_policy(&self, rows: &[usize]) -> Array1<f64> {
        let beta = self.discount;
        let scale = (1.0 - beta) / beta;
        let mut v: Array1<f64> = rows.iter().map(|&i| self.rewards[i]).collect();
        for sweep in 0..EVAL_MAX_SWEEPS {
            let new_v = self.policy_operator(rows, &v);
            let change = sup_norm_diff(&new_v, &v);
            let tol = EVAL_TOL * scale * sup_norm(&new_v).max(1.0);
            v = new_v;
            if change <= tol {
                debug!(sweeps = sweep + 1, "policy evaluated");
                return v;
            }
        }
        warn!(sweeps = EVAL_MAX_SWEEPS, "policy evaluation stopped at the sweep cap");
        v
    }

    /// Action index of each state's chosen row.
    pub fn actions_of(&self, rows: &[usize]) -> Vec<usize> {
        rows.iter().map(|&i| self.a_indices[i]).collect()
    }

    fn value_iteration(&self, options: &SolverOptions) -> (Vec<usize>, Array1<f64>, usize, bool) {
        let beta = self.discount;
        let tol = options.epsilon * (1.0 - beta) / (2.0 * beta);
        let mut v = self.state_wise_max(&self.rewards).0;
        let mut num_iter = 0;
        let mut converged = false;
        for i in 0..options.max_iter {
            num_iter = i + 1;
            let (tv, _) = self.bellman(&v);
            let diff = sup_norm_diff(&tv, &v);
            debug!(iteration = num_iter, diff, "value iteration");
            v = tv;
            if diff < tol {
                converged = true;
                break;
            }
        }
        (self.greedy(&v), v, num_iter, converged)
    }

    fn policy_iteration(&self, options: &SolverOptions) -> (Vec<usize>, Array1<f64>, usize, bool) {
        let v_init = self.state_wise_max(&self.rewards).0;
        let mut rows = self.greedy(&v_init);
        let mut v = v_init;
        let mut num_iter = 0;
        let mut converged = false;
        for i in 0..options.max_iter {
            num_iter = i + 1;
            v = self.evaluate_policy(&rows);
            let new_rows = self.greedy(&v);
            let changed = new_rows.iter().zip(rows.iter()).filter(|(a, b)| a != b).count();
            debug!(iteration = num_iter, changed, "policy iteration");
            if changed == 0 {
                converged = true;
                break;
            }
            rows = new_rows;
        }
        (rows, v, num_iter, converged)
    }

    fn modified_policy_iteration(
        &self,
        k: usize,
        options: &SolverOptions,
    ) -> Result<(Vec<usize>, Array1<f64>, usize, bool)> {
        let beta = self.discount;
        let tol = options.epsilon * (1.0 - beta) / beta;
        let mut v = self.state_wise_max(&self.rewards).0;
        let mut rows: Vec<usize> = Vec::new();
        let mut num_iter = 0;
        let mut converged = false;
        for i in 0..options.max_iter {
            num_iter = i + 1;
            let (mut u, sigma) = self.bellman(&v);
            rows = sigma;
            let diff = &u - &v;
            let diff_span = span(&diff)?;
            debug!(iteration = num_iter, span = diff_span, "modified policy iteration");
            if diff_span < tol {
                v = &u + midrange(&diff)? * beta / (1.0 - beta);
                converged = true;
                break;
            }
            for _ in 0..k {
                u = self.policy_operator(&rows, &u);
            }
            v = u;
        }
        Ok((rows, v, num_iter, converged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discrete_dp::sparse::CsrMatrix;
    use ndarray::{arr1, arr2, Array2};

    /// Two states, two actions. Action 1 in state 0 moves to state 1, where staying pays 2.
    fn small_dp() -> DiscreteDp<Array2<f64>> {
        let r = arr1(&[1.0, 0.0, 0.0, 2.0]);
        let q = arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 1.0]]);
        DiscreteDp::new(r, q, 0.9, vec![0, 0, 1, 1], vec![0, 1, 0, 1]).unwrap()
    }

    #[test]
    fn policy_iteration_finds_exact_values() {
        let dp = small_dp();
        let res = dp.solve(SolveMethod::PolicyIteration, &SolverOptions::default()).unwrap();
        assert!(res.converged);
        assert_eq!(res.policy, vec![1, 1]);
        // v1 = 2 / (1 - 0.9) = 20, v0 = 0.9 * 20 = 18
        assert!((res.values[1] - 20.0).abs() < 1e-9);
        assert!((res.values[0] - 18.0).abs() < 1e-9);
    }

    #[test]
    fn all_methods_agree_on_small_dp() {
        let dp = small_dp();
        let options = SolverOptions {
            epsilon: 1e-8,
            max_iter: 10_000,
        };
        for method in SolveMethod::all(DEFAULT_K) {
            let res = dp.solve(method, &options).unwrap();
            assert!(res.converged, "{} did not converge", method);
            assert_eq!(res.policy, vec![1, 1], "{}", method);
            assert!((res.values[0] - 18.0).abs() < 1e-6, "{}: {:?}", method, res.values);
            assert!((res.values[1] - 20.0).abs() < 1e-6, "{}: {:?}", method, res.values);
        }
    }

    #[test]
    fn greedy_breaks_ties_towards_first_action() {
        let r = arr1(&[1.0, 1.0]);
        let q = arr2(&[[1.0], [1.0]]);
        let dp = DiscreteDp::new(r, q, 0.5, vec![0, 0], vec![0, 1]).unwrap();
        let (tv, rows) = dp.bellman(&arr1(&[0.0]));
        assert_eq!(tv.to_vec(), vec![1.0]);
        assert_eq!(rows, vec![0]);
    }

    #[test]
    fn evaluate_policy_matches_closed_form() {
        let dp = small_dp();
        // always action 0: state 0 earns 1 forever, state 1 earns nothing and moves to state 0
        let v = dp.evaluate_policy(&[0, 2]);
        assert!((v[0] - 10.0).abs() < 1e-9);
        assert!((v[1] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn iteration_cap_is_reported_not_raised() {
        let dp = small_dp();
        let options = SolverOptions {
            epsilon: 1e-12,
            max_iter: 3,
        };
        let res = dp.solve(SolveMethod::ValueIteration, &options).unwrap();
        assert!(!res.converged);
        assert_eq!(res.num_iter, 3);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let dp = small_dp();
        let zero_iter = SolverOptions {
            epsilon: 1e-3,
            max_iter: 0,
        };
        assert!(dp.solve(SolveMethod::PolicyIteration, &zero_iter).is_err());
        let bad_eps = SolverOptions {
            epsilon: -1.0,
            max_iter: 10,
        };
        assert!(dp.solve(SolveMethod::ValueIteration, &bad_eps).is_err());
    }

    #[test]
    fn sparse_and_dense_give_identical_results() {
        let dense = small_dp();
        let sparse = DiscreteDp::new(
            dense.rewards().clone(),
            CsrMatrix::from_dense(dense.transitions()),
            0.9,
            dense.s_indices().to_vec(),
            dense.a_indices().to_vec(),
        )
        .unwrap();
        for method in SolveMethod::all(DEFAULT_K) {
            let a = dense.solve(method, &SolverOptions::default()).unwrap();
            let b = sparse.solve(method, &SolverOptions::default()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn method_serializes_with_tag() {
        let json = serde_json::to_string(&SolveMethod::ModifiedPolicyIteration { k: 5 }).unwrap();
        assert_eq!(json, r#"{"name":"modified_policy_iteration","k":5}"#);
        let back: SolveMethod = serde_json::from_str(r#"{"name":"value_iteration"}"#).unwrap();
        assert_eq!(back, SolveMethod::ValueIteration);
    }
}
