//! Solve one random MDP in three transition encodings and check that the solvers cannot
//! tell them apart.

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::discrete_dp::operator::TransitionOperator;
use crate::discrete_dp::random::{RandomDp, RandomDpSpec};
use crate::discrete_dp::solver::{SolveMethod, SolveResult, SolverOptions};
use crate::discrete_dp::DiscreteDp;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// (state x action x state) array
    DenseProduct,
    /// (pair x state) matrix
    DenseStateAction,
    /// compressed (pair x state) matrix
    SparseStateAction,
}

impl Representation {
    pub const ALL: [Representation; 3] = [
        Representation::DenseProduct,
        Representation::DenseStateAction,
        Representation::SparseStateAction,
    ];
}

#[derive(Debug, Clone, Serialize)]
pub struct RepresentationRun {
    pub representation: Representation,
    pub result: SolveResult,
    pub seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub spec: RandomDpSpec,
    pub runs: Vec<RepresentationRun>,
}

pub fn compare_representations(
    spec: &RandomDpSpec,
    options: &SolverOptions,
    methods: &[SolveMethod],
) -> Result<ComparisonReport> {
    let draw = RandomDp::generate(*spec)?;
    let product = draw.dense_product()?;
    let dense = draw.dense_state_action()?;
    let sparse = draw.sparse_state_action()?;

    let mut runs: Vec<RepresentationRun> = Vec::with_capacity(methods.len() * Representation::ALL.len());
    for &method in methods.iter() {
        runs.push(timed_solve(Representation::DenseProduct, &product, method, options)?);
        runs.push(timed_solve(Representation::DenseStateAction, &dense, method, options)?);
        runs.push(timed_solve(Representation::SparseStateAction, &sparse, method, options)?);
    }
    Ok(ComparisonReport { spec: *spec, runs })
}

fn timed_solve<T: TransitionOperator>(
    representation: Representation,
    dp: &DiscreteDp<T>,
    method: SolveMethod,
    options: &SolverOptions,
) -> Result<RepresentationRun> {
    let start = Instant::now();
    let result = dp.solve(method, options)?;
    let seconds = start.elapsed().as_secs_f64();
    info!(?representation, %method, seconds, num_iter = result.num_iter, "timed solve");
    Ok(RepresentationRun {
        representation,
        result,
        seconds,
    })
}

impl ComparisonReport {
    pub fn runs_for(&self, method: SolveMethod) -> impl Iterator<Item = &RepresentationRun> {
        self.runs.iter().filter(move |r| r.result.method == method)
    }

    /// Checks that
    /// - policy iteration gives the same policy in every encoding,
    /// - value iteration and modified policy iteration agree with that policy,
    /// - each method takes the same number of iterations in every encoding.
    pub fn verify(&self) -> Result<()> {
        let reference = self
            .runs
            .iter()
            .find(|r| r.result.method == SolveMethod::PolicyIteration)
            .map(|r| &r.result.policy);

        for run in self.runs.iter() {
            let first = self
                .runs_for(run.result.method)
                .next()
                .unwrap_or(run);
            if run.result.num_iter != first.result.num_iter {
                return Err(Error::RepresentationMismatch(format!(
                    "{} took {} iterations on {:?} but {} on {:?}",
                    run.result.method,
                    run.result.num_iter,
                    run.representation,
                    first.result.num_iter,
                    first.representation
                )));
            }
            if let Some(policy) = reference {
                if &run.result.policy != policy {
                    let differing = run
                        .result
                        .policy
                        .iter()
                        .zip(policy.iter())
                        .filter(|(a, b)| a != b)
                        .count();
                    return Err(Error::RepresentationMismatch(format!(
                        "{} on {:?} differs from the policy iteration policy in {} states",
                        run.result.method, run.representation, differing
                    )));
                }
            }
        }
        Ok(())
    }

    /// Wall-clock seconds of each solve, in run order.
    pub fn timings(&self) -> Vec<(SolveMethod, Representation, f64)> {
        self.runs
            .iter()
            .map(|r| (r.result.method, r.representation, r.seconds))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discrete_dp::solver::DEFAULT_K;

    fn report() -> ComparisonReport {
        let spec = RandomDpSpec {
            num_states: 30,
            num_actions: 4,
            support: 5,
            ..RandomDpSpec::default()
        };
        let options = SolverOptions {
            epsilon: 1e-8,
            max_iter: 10_000,
        };
        compare_representations(&spec, &options, &SolveMethod::all(DEFAULT_K)).unwrap()
    }

    #[test]
    fn one_run_per_method_and_representation() {
        let r = report();
        assert_eq!(r.runs.len(), 9);
        assert_eq!(r.runs_for(SolveMethod::PolicyIteration).count(), 3);
    }

    #[test]
    fn small_random_dp_passes_verification() {
        let r = report();
        r.verify().unwrap();
        for method in SolveMethod::all(DEFAULT_K) {
            let results: Vec<&SolveResult> = r.runs_for(method).map(|run| &run.result).collect();
            assert_eq!(results[0], results[1]);
            assert_eq!(results[1], results[2]);
        }
    }

    #[test]
    fn tampered_policy_is_caught() {
        let mut r = report();
        let last = r.runs.len() - 1;
        r.runs[last].result.policy[0] = (r.runs[last].result.policy[0] + 1) % 4;
        assert!(matches!(r.verify(), Err(Error::RepresentationMismatch(_))));
    }

    #[test]
    fn tampered_iteration_count_is_caught() {
        let mut r = report();
        r.runs[1].result.num_iter += 1;
        assert!(matches!(r.verify(), Err(Error::RepresentationMismatch(_))));
    }
}
