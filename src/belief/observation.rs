//! Noisy listening model for the two-state tiger problem.
//!
//! A belief `b` is the probability that the tiger sits behind the right door. Listening
//! returns a signal from the side the tiger is on, except that with probability `p_left`
//! (tiger left) or `p_right` (tiger right) the signal comes from the wrong side.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Observation {
    SignalLeft,
    SignalRight,
}

impl Observation {
    pub const ALL: [Observation; 2] = [Observation::SignalLeft, Observation::SignalRight];
}

pub const DEFAULT_NOISE: f64 = 0.15;

/// Wrong-side signal probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseModel {
    pub p_left: f64,
    pub p_right: f64,
}

impl Default for NoiseModel {
    fn default() -> Self {
        NoiseModel {
            p_left: DEFAULT_NOISE,
            p_right: DEFAULT_NOISE,
        }
    }
}

impl NoiseModel {
    pub fn new(p_left: f64, p_right: f64) -> Result<NoiseModel> {
        let noise = NoiseModel { p_left, p_right };
        noise.validate()?;
        Ok(noise)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, p) in [("p_left", self.p_left), ("p_right", self.p_right)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidConfiguration(format!(
                    "noise parameter {} = {} is outside [0,1]",
                    name, p
                )));
            }
        }
        Ok(())
    }

    /// P(observation | b).
    pub fn likelihood(&self, observation: Observation, b: f64) -> f64 {
        match observation {
            Observation::SignalLeft => (1.0 - self.p_left) * (1.0 - b) + self.p_right * b,
            Observation::SignalRight => self.p_left * (1.0 - b) + (1.0 - self.p_right) * b,
        }
    }

    /// Both likelihoods at `b`, in `Observation::ALL` order.
    pub fn likelihoods(&self, b: f64) -> [f64; 2] {
        Observation::ALL.map(|o| self.likelihood(o, b))
    }

    /// Posterior belief after hearing `observation` from prior `b`.
    ///
    /// Fails with `UndefinedUpdate` when the observation has zero likelihood at `b`, which
    /// only happens for noise parameters of exactly 0 or 1.
    pub fn update(&self, b: f64, observation: Observation) -> Result<f64> {
        let evidence = self.likelihood(observation, b);
        if evidence == 0.0 {
            return Err(Error::UndefinedUpdate {
                belief: b,
                observation,
            });
        }
        let joint = match observation {
            Observation::SignalLeft => self.p_right * b,
            Observation::SignalRight => (1.0 - self.p_right) * b,
        };
        Ok(joint / evidence)
    }
}
