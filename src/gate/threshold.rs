//! Adaptive Threshold Gate
//!
//! Scores a signal vector as `signals · weights + bias` and nudges the
//! weights after each verdict. The update is a single reinforcement step,
//! not a training procedure: a run of rejections can close the gate for
//! good, and nothing here tries to prevent that.

use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Default signal dimension
pub const DEFAULT_DIMENSION: usize = 5;

/// Default reinforcement step size
pub const DEFAULT_LEARNING_RATE: f64 = 0.05;

/// Default admission threshold
pub const DEFAULT_THRESHOLD: f64 = 2.0;

pub type SignalVector = Vec<f64>;

/// Weights, bias, learning rate and threshold of the gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateState {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub learning_rate: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone)]
pub struct ThresholdGate {
    state: GateState,
}

impl ThresholdGate {
    /// Gate with explicit weights; the dimension is `weights.len()`
    pub fn with_weights(weights: Vec<f64>, bias: f64, learning_rate: f64, threshold: f64) -> Self {
        Self {
            state: GateState {
                weights,
                bias,
                learning_rate,
                threshold,
            },
        }
    }

    /// Gate with weights and bias drawn from a standard normal distribution
    pub fn from_rng(
        dimension: usize,
        learning_rate: f64,
        threshold: f64,
        rng: &mut dyn RngCore,
    ) -> Self {
        let weights: Vec<f64> = (0..dimension)
            .map(|_| StandardNormal.sample(&mut *rng))
            .collect();
        let bias: f64 = StandardNormal.sample(&mut *rng);
        Self::with_weights(weights, bias, learning_rate, threshold)
    }

    pub fn dimension(&self) -> usize {
        self.state.weights.len()
    }

    pub fn threshold(&self) -> f64 {
        self.state.threshold
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Replace the whole state with an earlier snapshot of the same dimension
    pub fn restore(&mut self, snapshot: GateState) -> Result<()> {
        self.check_dimension(snapshot.weights.len())?;
        self.state = snapshot;
        Ok(())
    }

    pub fn check_dimension(&self, actual: usize) -> Result<()> {
        let expected = self.dimension();
        if actual != expected {
            return Err(EngineError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }

    /// Firing potential for `signals`
    pub fn score(&self, signals: &[f64]) -> Result<f64> {
        self.check_dimension(signals.len())?;
        let dot: f64 = signals
            .iter()
            .zip(&self.state.weights)
            .map(|(s, w)| s * w)
            .sum();
        Ok(dot + self.state.bias)
    }

    /// Whether a potential clears the threshold
    pub fn admits(&self, potential: f64) -> bool {
        potential >= self.state.threshold
    }

    /// One reinforcement step: towards `signals` on admission, away on rejection
    pub fn adjust(&mut self, admitted: bool, signals: &[f64]) -> Result<()> {
        self.check_dimension(signals.len())?;
        let direction = if admitted { 1.0 } else { -1.0 };
        let step = self.state.learning_rate * direction;

        for (w, s) in self.state.weights.iter_mut().zip(signals) {
            *w += step * s;
        }
        self.state.bias += step;
        Ok(())
    }
}
