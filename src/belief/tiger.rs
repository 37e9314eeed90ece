//! Discretized tiger problem.
//!
//! The hidden state is the tiger's door; the belief is P(tiger behind the right door).
//! Listening costs a little and yields a noisy signal; opening a door pays out and resets
//! the episode to the uninformed belief 0.5. On a [`BeliefGrid`] of `G` points this becomes
//! a `G`-state MDP whose state-action pairs are flattened as `g * NUM_ACTIONS + action`.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::grid::BeliefGrid;
use super::observation::{NoiseModel, Observation};
use crate::discrete_dp::sparse::{CsrMatrix, TripletMatrix};
use crate::discrete_dp::DiscreteDp;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Listen,
    OpenLeft,
    OpenRight,
}

pub const NUM_ACTIONS: usize = 3;

impl Action {
    pub const ALL: [Action; NUM_ACTIONS] = [Action::Listen, Action::OpenLeft, Action::OpenRight];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(a: usize) -> Option<Action> {
        Action::ALL.get(a).copied()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Listen => "listen",
            Action::OpenLeft => "open_left",
            Action::OpenRight => "open_right",
        };
        write!(f, "{}", name)
    }
}

/// Linear index of the pair (grid index, action).
pub fn pair_index(g: usize, action: Action) -> usize {
    g * NUM_ACTIONS + action.index()
}

/// Inverse of [`pair_index`].
pub fn split_pair(i: usize) -> (usize, Action) {
    let action = match i % NUM_ACTIONS {
        0 => Action::Listen,
        1 => Action::OpenLeft,
        _ => Action::OpenRight,
    };
    (i / NUM_ACTIONS, action)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payoffs {
    /// Opening the door without the tiger
    pub reward: f64,
    /// Opening the door with the tiger
    pub penalty: f64,
    /// Listening
    pub cost: f64,
}

impl Default for Payoffs {
    fn default() -> Self {
        Payoffs {
            reward: 10.0,
            penalty: -100.0,
            cost: -1.0,
        }
    }
}

impl Payoffs {
    /// Expected immediate reward of `action` at belief `b`.
    pub fn expected(&self, action: Action, b: f64) -> f64 {
        match action {
            Action::Listen => self.cost,
            // the tiger is behind the left door with probability 1 - b
            Action::OpenLeft => self.penalty * (1.0 - b) + self.reward * b,
            Action::OpenRight => self.reward * (1.0 - b) + self.penalty * b,
        }
    }
}

/// Reward vector of length `G * NUM_ACTIONS` in pair order.
pub fn assemble_rewards(grid: &BeliefGrid, payoffs: &Payoffs) -> Array1<f64> {
    grid.iter()
        .flat_map(|b| Action::ALL.into_iter().map(move |a| payoffs.expected(a, b)))
        .collect()
}

/// Raw triplets of the transition operator, before duplicate merging.
///
/// Listening emits one triplet per observation with nonzero likelihood, aimed at the grid
/// point nearest the posterior. Opening either door emits a single triplet with
/// probability 1 to the grid point closest to 0.5.
pub fn transition_triplets(grid: &BeliefGrid, noise: &NoiseModel) -> Result<TripletMatrix> {
    noise.validate()?;
    let g_count = grid.len();
    let reset = grid.closest_index(0.5);
    let mut triplets =
        TripletMatrix::with_capacity(g_count * NUM_ACTIONS, g_count, g_count * (Observation::ALL.len() + 2));

    for (g, b) in grid.iter().enumerate() {
        for observation in Observation::ALL {
            let p = noise.likelihood(observation, b);
            // a signal that cannot occur contributes nothing to the row
            if p == 0.0 {
                continue;
            }
            let posterior = noise.update(b, observation)?;
            triplets.push(pair_index(g, Action::Listen), grid.nearest_index(posterior), p)?;
        }
        triplets.push(pair_index(g, Action::OpenLeft), reset, 1.0)?;
        triplets.push(pair_index(g, Action::OpenRight), reset, 1.0)?;
    }
    debug!(triplets = triplets.len(), reset, "assembled transition triplets");
    Ok(triplets)
}

/// Transition operator with duplicate (pair, target) entries summed.
pub fn assemble_transitions(grid: &BeliefGrid, noise: &NoiseModel) -> Result<CsrMatrix> {
    Ok(transition_triplets(grid, noise)?.to_csr())
}

/// The tiger problem on a fixed grid, ready to package as an MDP descriptor.
#[derive(Debug, Clone)]
pub struct TigerProblem {
    pub grid: BeliefGrid,
    pub noise: NoiseModel,
    pub payoffs: Payoffs,
    pub discount: f64,
}

impl TigerProblem {
    pub fn new(grid: BeliefGrid, noise: NoiseModel, payoffs: Payoffs, discount: f64) -> Result<TigerProblem> {
        noise.validate()?;
        if !(discount > 0.0 && discount < 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "discount factor {} is outside (0,1)",
                discount
            )));
        }
        Ok(TigerProblem {
            grid,
            noise,
            payoffs,
            discount,
        })
    }

    pub fn uniform(grid_size: usize, noise: NoiseModel, payoffs: Payoffs, discount: f64) -> Result<TigerProblem> {
        TigerProblem::new(BeliefGrid::uniform(grid_size)?, noise, payoffs, discount)
    }

    pub fn num_pairs(&self) -> usize {
        self.grid.len() * NUM_ACTIONS
    }

    /// Assemble rewards and transitions and package them with the pair index vectors.
    pub fn descriptor(&self) -> Result<DiscreteDp<CsrMatrix>> {
        let rewards = assemble_rewards(&self.grid, &self.payoffs);
        let transitions = assemble_transitions(&self.grid, &self.noise)?;
        let (rows, cols) = transitions.shape();
        if cols != self.grid.len() {
            return Err(Error::DimensionMismatch {
                what: "transition operator columns",
                expected: self.grid.len(),
                actual: cols,
            });
        }
        if rewards.len() != rows {
            return Err(Error::DimensionMismatch {
                what: "reward vector",
                expected: rows,
                actual: rewards.len(),
            });
        }
        let (s_indices, a_indices): (Vec<usize>, Vec<usize>) = (0..self.num_pairs())
            .map(|i| {
                let (g, a) = split_pair(i);
                (g, a.index())
            })
            .unzip();
        info!(
            grid_size = self.grid.len(),
            pairs = rows,
            nnz = transitions.nnz(),
            "packaged tiger mdp"
        );
        DiscreteDp::new(rewards, transitions, self.discount, s_indices, a_indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discrete_dp::operator::TransitionOperator;

    fn five_point() -> TigerProblem {
        TigerProblem::uniform(5, NoiseModel::default(), Payoffs::default(), 0.95).unwrap()
    }

    #[test]
    fn pair_index_round_trips() {
        for g in 0..4 {
            for a in Action::ALL {
                assert_eq!(split_pair(pair_index(g, a)), (g, a));
            }
        }
        assert_eq!(pair_index(2, Action::OpenRight), 8);
        assert_eq!(Action::from_index(1), Some(Action::OpenLeft));
        assert_eq!(Action::from_index(3), None);
    }

    #[test]
    fn rewards_on_five_point_grid() {
        let p = five_point();
        let r = assemble_rewards(&p.grid, &p.payoffs);
        assert_eq!(r.len(), 15);
        assert_eq!(r[pair_index(0, Action::OpenRight)], 10.0);
        assert_eq!(r[pair_index(4, Action::OpenRight)], -100.0);
        assert_eq!(r[pair_index(2, Action::Listen)], -1.0);
        assert_eq!(r[pair_index(0, Action::OpenLeft)], -100.0);
        assert_eq!(r[pair_index(4, Action::OpenLeft)], 10.0);
        assert_eq!(r[pair_index(2, Action::OpenLeft)], -45.0);
    }

    #[test]
    fn listen_rows_on_five_point_grid() {
        let p = five_point();
        let q = assemble_transitions(&p.grid, &p.noise).unwrap();
        // b = 0.5: posteriors 0.15 and 0.85 snap to 0.25 and 0.75
        let middle: Vec<(usize, f64)> = q.row(pair_index(2, Action::Listen)).collect();
        assert_eq!(middle.len(), 2);
        assert_eq!(middle[0].0, 1);
        assert_eq!(middle[1].0, 3);
        assert!((middle[0].1 - 0.5).abs() < 1e-12);
        assert!((middle[1].1 - 0.5).abs() < 1e-12);
        // b = 0.25: posteriors 0.0556 and 0.654 snap to 0 and 0.75
        let low: Vec<(usize, f64)> = q.row(pair_index(1, Action::Listen)).collect();
        assert_eq!(low.iter().map(|e| e.0).collect::<Vec<_>>(), vec![0, 3]);
        assert!((low[0].1 - 0.675).abs() < 1e-12);
    }

    #[test]
    fn certain_beliefs_merge_into_one_entry() {
        let p = five_point();
        let raw = transition_triplets(&p.grid, &p.noise).unwrap();
        // 5 points x (2 listen + 2 open)
        assert_eq!(raw.len(), 20);
        let q = raw.to_csr();
        for g in [0, 4] {
            let row: Vec<(usize, f64)> = q.row(pair_index(g, Action::Listen)).collect();
            assert_eq!(row.len(), 1, "grid index {}", g);
            assert_eq!(row[0].0, g);
            assert!((row[0].1 - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn open_actions_reset_to_middle() {
        let p = five_point();
        let q = assemble_transitions(&p.grid, &p.noise).unwrap();
        for g in 0..5 {
            for a in [Action::OpenLeft, Action::OpenRight] {
                let row: Vec<(usize, f64)> = q.row(pair_index(g, a)).collect();
                assert_eq!(row, vec![(2, 1.0)]);
            }
        }
    }

    #[test]
    fn every_row_is_stochastic() {
        let p = TigerProblem::uniform(101, NoiseModel::new(0.1, 0.3).unwrap(), Payoffs::default(), 0.9).unwrap();
        let q = assemble_transitions(&p.grid, &p.noise).unwrap();
        for i in 0..p.num_pairs() {
            assert!((q.row_sum(i) - 1.0).abs() < 1e-9, "row {}", i);
            assert!(q.row_len(i) <= 2);
        }
    }

    #[test]
    fn noiseless_listening_skips_impossible_signals() {
        let p = TigerProblem::uniform(5, NoiseModel::new(0.0, 0.0).unwrap(), Payoffs::default(), 0.9).unwrap();
        let q = assemble_transitions(&p.grid, &p.noise).unwrap();
        // at b = 0 only the left signal can occur
        assert_eq!(q.row(pair_index(0, Action::Listen)).collect::<Vec<_>>(), vec![(0, 1.0)]);
        assert!(p.descriptor().is_ok());
    }

    #[test]
    fn descriptor_indexes_pairs() {
        let dp = five_point().descriptor().unwrap();
        assert_eq!(dp.num_states(), 5);
        assert_eq!(dp.num_pairs(), 15);
        assert_eq!(&dp.s_indices()[..6], &[0, 0, 0, 1, 1, 1]);
        assert_eq!(&dp.a_indices()[..6], &[0, 1, 2, 0, 1, 2]);
        assert_eq!(dp.discount(), 0.95);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(TigerProblem::uniform(1, NoiseModel::default(), Payoffs::default(), 0.95).is_err());
        assert!(TigerProblem::uniform(5, NoiseModel::default(), Payoffs::default(), 1.0).is_err());
        assert!(TigerProblem::uniform(5, NoiseModel::default(), Payoffs::default(), 0.0).is_err());
        let bad_noise = NoiseModel {
            p_left: 1.2,
            p_right: 0.1,
        };
        assert!(TigerProblem::uniform(5, bad_noise, Payoffs::default(), 0.95).is_err());
    }
}
