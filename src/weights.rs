//! Decision weights.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Weights blending cost, SLA risk, and reliability into one action score.
///
/// Raw operator inputs need not sum to 1; call [`Weights::normalize`] before comparing
/// scores produced under different weight settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weights {
    pub w_cost: f64,
    pub w_sla: f64,
    pub w_rel: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            w_cost: 0.35,
            w_sla: 0.45,
            w_rel: 0.15,
        }
    }
}

impl Weights {
    /// Validated constructor: every weight must be finite and `>= 0`.
    pub fn try_new(w_cost: f64, w_sla: f64, w_rel: f64) -> Result<Self> {
        for (name, value) in [("w_cost", w_cost), ("w_sla", w_sla), ("w_rel", w_rel)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidWeight { name, value });
            }
        }
        Ok(Self {
            w_cost,
            w_sla,
            w_rel,
        })
    }

    /// Read `w_cost` / `w_sla` / `w_rel` from a mapping; missing keys keep the default.
    pub fn from_fields(fields: &BTreeMap<String, f64>) -> Result<Self> {
        let d = Self::default();
        let get = |k: &str, fallback: f64| fields.get(k).copied().unwrap_or(fallback);
        Self::try_new(
            get("w_cost", d.w_cost),
            get("w_sla", d.w_sla),
            get("w_rel", d.w_rel),
        )
    }

    pub fn sum(&self) -> f64 {
        self.w_cost + self.w_sla + self.w_rel
    }

    /// Divide each weight by the sum. A non-positive sum leaves the weights untouched.
    pub fn normalize(&mut self) {
        let s = self.sum();
        if s > 0.0 {
            self.w_cost /= s;
            self.w_sla /= s;
            self.w_rel /= s;
        }
    }

    /// Normalized copy (see [`Weights::normalize`]).
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }
}
