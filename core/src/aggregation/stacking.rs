//! Multiplicative stacking of percentage reductions.
//!
//! Independent reductions combine by multiplying the fraction of damage
//! each lets through: 15% and 20% stack to `0.85 * 0.80 = 0.68`, i.e. a
//! 32% reduction, not 35%.

use serde::{Deserialize, Serialize};

use crate::effects::ActiveEffect;

/// Fraction of incoming damage that survives, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MitigationFactor {
    pub physical: f64,
    pub magical: f64,
}

impl Default for MitigationFactor {
    fn default() -> Self {
        Self::NONE
    }
}

/// `1 - pct/100`, floored at zero. Non-positive (and NaN) percentages are no-ops.
#[inline]
fn survival(pct: f32) -> f64 {
    if pct > 0.0 {
        (1.0 - pct as f64 / 100.0).max(0.0)
    } else {
        1.0
    }
}

impl MitigationFactor {
    /// No reduction on either axis.
    pub const NONE: Self = Self {
        physical: 1.0,
        magical: 1.0,
    };

    /// Product of the survival factors of `effects`, per axis.
    pub fn from_effects<'a, I>(effects: I) -> Self
    where
        I: IntoIterator<Item = &'a ActiveEffect>,
    {
        effects.into_iter().fold(Self::NONE, |acc, e| Self {
            physical: acc.physical * survival(e.physical_pct),
            magical: acc.magical * survival(e.magical_pct),
        })
    }

    /// Stack another factor on top of this one.
    pub fn combine(self, other: Self) -> Self {
        Self {
            physical: self.physical * other.physical,
            magical: self.magical * other.magical,
        }
    }

    pub fn reduction(&self) -> Reduction {
        Reduction {
            physical_pct: reduction_pct(self.physical),
            magical_pct: reduction_pct(self.magical),
        }
    }
}

#[inline]
fn reduction_pct(factor: f64) -> f32 {
    if factor >= 1.0 {
        0.0
    } else {
        ((1.0 - factor) * 100.0) as f32
    }
}

/// Displayed damage reduction, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reduction {
    pub physical_pct: f32,
    pub magical_pct: f32,
}
