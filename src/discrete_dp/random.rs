//! Seeded random MDPs, materialized in each transition encoding.

use ndarray::{Array1, Array2, Array3};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sparse::{CsrMatrix, TripletMatrix};
use super::DiscreteDp;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomDpSpec {
    pub num_states: usize,
    pub num_actions: usize,
    /// Successor states per pair
    pub support: usize,
    pub discount: f64,
    /// Rewards are scale * N(0, 1)
    pub scale: f64,
    pub seed: u64,
}

impl Default for RandomDpSpec {
    fn default() -> Self {
        RandomDpSpec {
            num_states: 100,
            num_actions: 10,
            support: 5,
            discount: 0.95,
            scale: 1.0,
            seed: 1234,
        }
    }
}

impl RandomDpSpec {
    pub fn validate(&self) -> Result<()> {
        if self.num_states == 0 || self.num_actions == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "random dp needs at least one state and one action, got {} x {}",
                self.num_states, self.num_actions
            )));
        }
        if self.support == 0 || self.support > self.num_states {
            return Err(Error::InvalidConfiguration(format!(
                "support {} must lie in 1..={}",
                self.support, self.num_states
            )));
        }
        if !(self.scale >= 0.0 && self.scale.is_finite()) {
            return Err(Error::InvalidConfiguration(format!(
                "reward scale {} must be finite and non-negative",
                self.scale
            )));
        }
        Ok(())
    }

    pub fn num_pairs(&self) -> usize {
        self.num_states * self.num_actions
    }
}

/// One random draw, every action feasible in every state.
#[derive(Debug, Clone)]
pub struct RandomDp {
    spec: RandomDpSpec,
    rewards: Array1<f64>,
    transitions: CsrMatrix,
}

impl RandomDp {
    pub fn generate(spec: RandomDpSpec) -> Result<RandomDp> {
        spec.validate()?;
        let n = spec.num_states;
        let num_pairs = spec.num_pairs();
        let mut rng = StdRng::seed_from_u64(spec.seed);

        let rewards: Array1<f64> = (0..num_pairs)
            .map(|_| spec.scale * rng.sample::<f64, _>(StandardNormal))
            .collect();

        let mut triplets = TripletMatrix::with_capacity(num_pairs, n, num_pairs * spec.support);
        for i in 0..num_pairs {
            let mut targets = sample(&mut rng, n, spec.support).into_vec();
            targets.sort_unstable();
            let probs = random_probvec(&mut rng, spec.support);
            for (j, p) in targets.into_iter().zip(probs.into_iter()) {
                triplets.push(i, j, p)?;
            }
        }
        debug!(num_states = n, num_pairs, seed = spec.seed, "generated random dp");

        Ok(RandomDp {
            spec,
            rewards,
            transitions: triplets.to_csr(),
        })
    }

    pub fn spec(&self) -> &RandomDpSpec {
        &self.spec
    }

    fn s_indices(&self) -> Vec<usize> {
        (0..self.spec.num_pairs()).map(|i| i / self.spec.num_actions).collect()
    }

    fn a_indices(&self) -> Vec<usize> {
        (0..self.spec.num_pairs()).map(|i| i % self.spec.num_actions).collect()
    }

    /// (state x action) rewards with a (state x action x state) transition array.
    pub fn dense_product(&self) -> Result<DiscreteDp<Array3<f64>>> {
        let (n, m) = (self.spec.num_states, self.spec.num_actions);
        let r = self
            .rewards
            .clone()
            .into_shape((n, m))
            .map_err(|_| Error::DimensionMismatch {
                what: "reward array",
                expected: n * m,
                actual: self.rewards.len(),
            })?;
        let q = self
            .transitions
            .to_dense()
            .into_shape((n, m, n))
            .map_err(|_| Error::DimensionMismatch {
                what: "transition array",
                expected: n * m * n,
                actual: self.transitions.nnz(),
            })?;
        DiscreteDp::from_product(r, q, self.spec.discount)
    }

    /// Pair rewards with a dense (pair x state) transition matrix.
    pub fn dense_state_action(&self) -> Result<DiscreteDp<Array2<f64>>> {
        DiscreteDp::new(
            self.rewards.clone(),
            self.transitions.to_dense(),
            self.spec.discount,
            self.s_indices(),
            self.a_indices(),
        )
    }

    /// Pair rewards with a compressed sparse (pair x state) transition matrix.
    pub fn sparse_state_action(&self) -> Result<DiscreteDp<CsrMatrix>> {
        DiscreteDp::new(
            self.rewards.clone(),
            self.transitions.clone(),
            self.spec.discount,
            self.s_indices(),
            self.a_indices(),
        )
    }
}

/// Uniform draw from the (len - 1)-simplex: gaps between sorted uniform cut points.
fn random_probvec<R: Rng>(rng: &mut R, len: usize) -> Vec<f64> {
    let mut cuts: Vec<f64> = (0..len - 1).map(|_| rng.gen::<f64>()).collect();
    cuts.sort_by(f64::total_cmp);
    let mut probs = Vec::with_capacity(len);
    let mut prev = 0.0;
    for c in cuts.into_iter().chain(std::iter::once(1.0)) {
        probs.push(c - prev);
        prev = c;
    }
    probs
}
