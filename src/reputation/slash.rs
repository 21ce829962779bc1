//! Slashing Policy
//!
//! A rejected submission halves the offender's stake. When the rejection
//! came from a broken anchor the penalty is scaled up by the invalid-anchor
//! multiplier (0.5 × 1.5 = 75%).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlashPolicy {
    /// Fraction of stake removed per slash
    pub base_penalty: f64,

    /// Applied on top of `base_penalty` when the anchor was invalid
    pub invalid_anchor_multiplier: f64,
}

impl Default for SlashPolicy {
    fn default() -> Self {
        Self {
            base_penalty: 0.5,
            invalid_anchor_multiplier: 1.5,
        }
    }
}

impl SlashPolicy {
    /// Effective fraction of stake to remove, clamped to [0, 1]
    pub fn penalty(&self, anchor_valid: bool) -> f64 {
        let factor = if anchor_valid {
            self.base_penalty
        } else {
            self.base_penalty * self.invalid_anchor_multiplier
        };
        factor.clamp(0.0, 1.0)
    }
}
