//! Finite discounted MDPs in state-action pair form.
//!
//! A [`DiscreteDp`] holds one reward and one transition row per feasible (state, action)
//! pair. Pairs are ordered by state, then action; `s_indices[i]` and `a_indices[i]`
//! name the pair behind row `i`.

pub mod operator;
pub mod random;
pub mod solver;
pub mod sparse;

use ndarray::{Array1, Array2, Array3};
use tracing::debug;

use crate::error::{Error, Result};
use operator::TransitionOperator;

/// Tolerance on row sums of the transition operator.
pub const STOCHASTIC_TOL: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct DiscreteDp<T> {
    rewards: Array1<f64>,
    transitions: T,
    discount: f64,
    s_indices: Vec<usize>,
    a_indices: Vec<usize>,
    /// Pairs of state `s` occupy rows `state_ptr[s]..state_ptr[s + 1]`.
    state_ptr: Vec<usize>,
}

impl<T: TransitionOperator> DiscreteDp<T> {
    pub fn new(
        rewards: Array1<f64>,
        transitions: T,
        discount: f64,
        s_indices: Vec<usize>,
        a_indices: Vec<usize>,
    ) -> Result<DiscreteDp<T>> {
        if !(discount > 0.0 && discount < 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "discount factor {} is outside (0,1)",
                discount
            )));
        }
        let num_pairs = s_indices.len();
        if a_indices.len() != num_pairs {
            return Err(Error::DimensionMismatch {
                what: "action index vector",
                expected: num_pairs,
                actual: a_indices.len(),
            });
        }
        if rewards.len() != num_pairs {
            return Err(Error::DimensionMismatch {
                what: "reward vector",
                expected: num_pairs,
                actual: rewards.len(),
            });
        }
        if transitions.num_rows() != num_pairs {
            return Err(Error::DimensionMismatch {
                what: "transition operator rows",
                expected: num_pairs,
                actual: transitions.num_rows(),
            });
        }
        if let Some(i) = rewards.iter().position(|r| !r.is_finite()) {
            return Err(Error::InvalidConfiguration(format!(
                "reward {} (state {}, action {}) is not finite: {}",
                i, s_indices[i], a_indices[i], rewards[i]
            )));
        }
        let num_states = transitions.num_cols();
        let state_ptr = state_offsets(&s_indices, &a_indices, num_states)?;

        for row in 0..num_pairs {
            let sum = transitions.row_sum(row);
            let mut bad_entry = false;
            transitions.for_each_entry(row, |_, p| bad_entry |= !p.is_finite() || p < 0.0);
            // NaN compares false, so check finiteness before the tolerance
            if bad_entry || !sum.is_finite() || (sum - 1.0).abs() > STOCHASTIC_TOL {
                return Err(Error::InvalidConfiguration(format!(
                    "transition row {} (state {}, action {}) is not a probability distribution, sum = {}",
                    row, s_indices[row], a_indices[row], sum
                )));
            }
        }
        debug!(num_states, num_pairs, discount, "built discrete dp");

        Ok(DiscreteDp {
            rewards,
            transitions,
            discount,
            s_indices,
            a_indices,
            state_ptr,
        })
    }

    pub fn num_states(&self) -> usize {
        self.state_ptr.len() - 1
    }

    pub fn num_pairs(&self) -> usize {
        self.s_indices.len()
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn rewards(&self) -> &Array1<f64> {
        &self.rewards
    }

    pub fn transitions(&self) -> &T {
        &self.transitions
    }

    pub fn s_indices(&self) -> &[usize] {
        &self.s_indices
    }

    pub fn a_indices(&self) -> &[usize] {
        &self.a_indices
    }

    /// Rows belonging to state `s`.
    pub fn pairs_of(&self, s: usize) -> std::ops::Range<usize> {
        self.state_ptr[s]..self.state_ptr[s + 1]
    }
}

impl DiscreteDp<Array3<f64>> {
    /// Product formulation: every action is feasible in every state, `r` is
    /// (state x action) and `q` is (state x action x state).
    pub fn from_product(r: Array2<f64>, q: Array3<f64>, discount: f64) -> Result<DiscreteDp<Array3<f64>>> {
        let (n, m) = r.dim();
        let (qn, qm, qs) = q.dim();
        if qn != n {
            return Err(Error::DimensionMismatch {
                what: "transition array states",
                expected: n,
                actual: qn,
            });
        }
        if qm != m {
            return Err(Error::DimensionMismatch {
                what: "transition array actions",
                expected: m,
                actual: qm,
            });
        }
        if qs != n {
            return Err(Error::DimensionMismatch {
                what: "transition array successor states",
                expected: n,
                actual: qs,
            });
        }
        let s_indices: Vec<usize> = (0..n * m).map(|i| i / m).collect();
        let a_indices: Vec<usize> = (0..n * m).map(|i| i % m).collect();
        let rewards = Array1::from(r.iter().copied().collect::<Vec<f64>>());
        DiscreteDp::new(rewards, q, discount, s_indices, a_indices)
    }
}

/// Validate pair ordering and compute where each state's pairs start.
fn state_offsets(s_indices: &[usize], a_indices: &[usize], num_states: usize) -> Result<Vec<usize>> {
    let mut state_ptr: Vec<usize> = vec![0; num_states + 1];
    for (i, (&s, &a)) in s_indices.iter().zip(a_indices.iter()).enumerate() {
        if s >= num_states {
            return Err(Error::DimensionMismatch {
                what: "state index",
                expected: num_states,
                actual: s,
            });
        }
        if i > 0 {
            let (ps, pa) = (s_indices[i - 1], a_indices[i - 1]);
            if s < ps || (s == ps && a <= pa) {
                return Err(Error::InvalidConfiguration(format!(
                    "state-action pairs must be sorted by state then action, pair {} = ({}, {}) follows ({}, {})",
                    i, s, a, ps, pa
                )));
            }
        }
        state_ptr[s + 1] += 1;
    }
    for s in 0..num_states {
        if state_ptr[s + 1] == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "state {} has no feasible action",
                s
            )));
        }
        state_ptr[s + 1] += state_ptr[s];
    }
    Ok(state_ptr)
}
