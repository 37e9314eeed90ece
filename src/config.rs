//! Experiment configuration, loadable from JSON. Every field has a default, so a file
//! only needs the values it overrides, e.g.
//!
//! ```json
//! {
//!   "grid_size": 1001,
//!   "noise": { "p_left": 0.1 },
//!   "method": { "name": "modified_policy_iteration", "k": 10 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::belief::observation::NoiseModel;
use crate::belief::tiger::{Payoffs, TigerProblem};
use crate::discrete_dp::solver::{SolveMethod, SolverOptions};
use crate::error::{Error, Result};
use crate::helper_methods::read_json;

pub const DEFAULT_GRID_SIZE: usize = 5001;
pub const DEFAULT_DISCOUNT: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TigerConfig {
    pub grid_size: usize,
    pub discount: f64,
    pub noise: NoiseModel,
    pub payoffs: Payoffs,
    pub method: SolveMethod,
    pub solver: SolverOptions,
}

impl Default for TigerConfig {
    fn default() -> Self {
        TigerConfig {
            grid_size: DEFAULT_GRID_SIZE,
            discount: DEFAULT_DISCOUNT,
            noise: NoiseModel::default(),
            payoffs: Payoffs::default(),
            method: SolveMethod::default(),
            solver: SolverOptions::default(),
        }
    }
}

impl TigerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < 2 {
            return Err(Error::InvalidConfiguration(format!(
                "grid_size must be at least 2, got {}",
                self.grid_size
            )));
        }
        if !(self.discount > 0.0 && self.discount < 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "discount factor {} is outside (0,1)",
                self.discount
            )));
        }
        self.noise.validate()?;
        self.solver.validate()
    }

    pub fn problem(&self) -> Result<TigerProblem> {
        self.validate()?;
        TigerProblem::uniform(self.grid_size, self.noise, self.payoffs, self.discount)
    }
}

pub fn read_tiger_config<P: AsRef<Path>>(path: P) -> Result<TigerConfig> {
    let config: TigerConfig = read_json(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_classic_instance() {
        let c = TigerConfig::default();
        assert_eq!(c.grid_size, 5001);
        assert_eq!(c.discount, 0.95);
        assert_eq!(c.noise, NoiseModel::default());
        assert_eq!(c.payoffs.reward, 10.0);
        assert_eq!(c.payoffs.penalty, -100.0);
        assert_eq!(c.payoffs.cost, -1.0);
        assert_eq!(c.method, SolveMethod::PolicyIteration);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"grid_size": 11, "noise": {{"p_left": 0.1}}, "method": {{"name": "modified_policy_iteration", "k": 4}}}}"#
        )
        .unwrap();
        let c = read_tiger_config(file.path()).unwrap();
        assert_eq!(c.grid_size, 11);
        assert_eq!(c.noise.p_left, 0.1);
        assert_eq!(c.noise.p_right, 0.15);
        assert_eq!(c.method, SolveMethod::ModifiedPolicyIteration { k: 4 });
        assert_eq!(c.discount, 0.95);
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"discount": 1.5}}"#).unwrap();
        assert!(matches!(
            read_tiger_config(file.path()),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            read_tiger_config("/nonexistent/tiger.json"),
            Err(Error::Io(_))
        ));
    }
}
