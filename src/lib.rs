//! Belief-grid discretization of the tiger POMDP into a finite MDP, a dynamic
//! programming solver for state-action pair MDPs, and a harness that checks the solver
//! against dense and sparse encodings of the same transition structure.
//!
//! ```no_run
//! use tigermdp::{SolveMethod, SolverOptions, TigerConfig};
//!
//! let config = TigerConfig::default();
//! let problem = config.problem()?;
//! let dp = problem.descriptor()?;
//! let result = dp.solve(SolveMethod::PolicyIteration, &SolverOptions::default())?;
//! let table = tigermdp::belief::policy::policy_table(&problem.grid, &result)?;
//! # Ok::<(), tigermdp::Error>(())
//! ```

pub mod belief;
pub mod config;
pub mod discrete_dp;
pub mod error;
pub mod helper_methods;
pub mod representations;

pub use belief::grid::BeliefGrid;
pub use belief::observation::{NoiseModel, Observation};
pub use belief::tiger::{Action, Payoffs, TigerProblem};
pub use config::{read_tiger_config, TigerConfig};
pub use discrete_dp::solver::{SolveMethod, SolveResult, SolverOptions};
pub use discrete_dp::DiscreteDp;
pub use error::{Error, Result};
