use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use super::grid::BeliefGrid;
use super::tiger::{Action, NUM_ACTIONS};
use crate::discrete_dp::solver::SolveResult;
use crate::error::{Error, Result};
use crate::helper_methods::write_csv_rows;

/// Chosen action and value at one grid point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRow {
    pub index: usize,
    pub belief: f64,
    pub action: Action,
    pub value: f64,
}

/// A change of action between grid index `index - 1` and `index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Threshold {
    pub index: usize,
    pub belief: f64,
    pub from: Action,
    pub to: Action,
}

pub fn policy_table(grid: &BeliefGrid, result: &SolveResult) -> Result<Vec<PolicyRow>> {
    if result.policy.len() != grid.len() {
        return Err(Error::DimensionMismatch {
            what: "policy length",
            expected: grid.len(),
            actual: result.policy.len(),
        });
    }
    if result.values.len() != grid.len() {
        return Err(Error::DimensionMismatch {
            what: "value function length",
            expected: grid.len(),
            actual: result.values.len(),
        });
    }
    grid.iter()
        .zip(result.policy.iter().zip(result.values.iter()))
        .enumerate()
        .map(|(index, (belief, (&a, &value)))| {
            let action = Action::from_index(a).ok_or(Error::DimensionMismatch {
                what: "policy action index",
                expected: NUM_ACTIONS,
                actual: a,
            })?;
            Ok(PolicyRow {
                index,
                belief,
                action,
                value,
            })
        })
        .collect()
}

/// Grid positions where the chosen action changes, in increasing belief order.
pub fn thresholds(table: &[PolicyRow]) -> Vec<Threshold> {
    table
        .iter()
        .tuple_windows()
        .filter(|(prev, next)| prev.action != next.action)
        .map(|(prev, next)| Threshold {
            index: next.index,
            belief: next.belief,
            from: prev.action,
            to: next.action,
        })
        .collect()
}

pub fn write_policy_csv<P: AsRef<Path>>(path: P, table: &[PolicyRow]) -> Result<()> {
    write_csv_rows(path, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discrete_dp::solver::SolveMethod;

    fn result(policy: Vec<usize>) -> SolveResult {
        let n = policy.len();
        SolveResult {
            method: SolveMethod::PolicyIteration,
            policy,
            values: (0..n).map(|i| i as f64).collect(),
            num_iter: 1,
            converged: true,
        }
    }

    #[test]
    fn table_labels_actions() {
        let grid = BeliefGrid::uniform(3).unwrap();
        let table = policy_table(&grid, &result(vec![2, 0, 1])).unwrap();
        assert_eq!(table[0].action, Action::OpenRight);
        assert_eq!(table[1].action, Action::Listen);
        assert_eq!(table[2].action, Action::OpenLeft);
        assert_eq!(table[1].belief, 0.5);
        assert_eq!(table[2].value, 2.0);
    }

    #[test]
    fn table_rejects_mismatched_result() {
        let grid = BeliefGrid::uniform(4).unwrap();
        assert!(matches!(
            policy_table(&grid, &result(vec![0, 0, 0])),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            policy_table(&BeliefGrid::uniform(2).unwrap(), &result(vec![0, 7])),
            Err(Error::DimensionMismatch {
                what: "policy action index",
                expected: 3,
                actual: 7
            })
        ));
    }

    #[test]
    fn thresholds_of_step_policy() {
        let grid = BeliefGrid::uniform(6).unwrap();
        let table = policy_table(&grid, &result(vec![2, 2, 0, 0, 0, 1])).unwrap();
        let t = thresholds(&table);
        assert_eq!(t.len(), 2);
        assert_eq!((t[0].index, t[0].from, t[0].to), (2, Action::OpenRight, Action::Listen));
        assert_eq!((t[1].index, t[1].from, t[1].to), (5, Action::Listen, Action::OpenLeft));
    }

    #[test]
    fn csv_has_one_line_per_grid_point() {
        let grid = BeliefGrid::uniform(3).unwrap();
        let table = policy_table(&grid, &result(vec![2, 0, 1])).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.csv");
        write_policy_csv(&path, &table).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "index,belief,action,value");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("0,0.0,OpenRight,"));
    }
}
