//! SLA-violation probability estimation.
//!
//! The default provider is a Monte Carlo estimate: actual arrival is modeled as
//! `Normal(eta, eta * (0.05 + 0.3 * (weather + traffic)))` and the estimate is the
//! fraction of samples that land after the SLA deadline. Higher environmental risk
//! widens the spread, pulling every estimate toward 0.5.
//!
//! Notes:
//! - Randomness always comes from the caller's RNG, so seeding that RNG makes the
//!   estimate reproducible.
//! - Other providers (a trained classifier, a survival curve) plug in through
//!   [`SlaEstimator`]; [`FixedProbability`] covers the "already computed elsewhere" case.

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Default Monte Carlo sample count.
pub const DEFAULT_SAMPLES: usize = 1000;

/// Inputs an SLA-violation estimator sees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlaQuery {
    pub eta: f64,
    pub sla: f64,
    pub risk_weather: f64,
    pub risk_traffic: f64,
}

/// A provider of `P(actual ETA > SLA)`.
pub trait SlaEstimator {
    /// Estimate the violation probability in `[0, 1]`, drawing any randomness from `rng`.
    fn violation_probability<R: Rng + ?Sized>(&self, rng: &mut R, query: &SlaQuery) -> f64;
}

/// Monte Carlo estimator with a fixed sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloEstimator {
    pub samples: usize,
}

impl Default for MonteCarloEstimator {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
        }
    }
}

impl MonteCarloEstimator {
    pub fn with_samples(samples: usize) -> Self {
        Self { samples }
    }
}

impl SlaEstimator for MonteCarloEstimator {
    fn violation_probability<R: Rng + ?Sized>(&self, rng: &mut R, query: &SlaQuery) -> f64 {
        monte_carlo_sla_probability(
            rng,
            query.eta,
            query.sla,
            query.risk_weather,
            query.risk_traffic,
            self.samples,
        )
    }
}

/// A probability supplied from outside (e.g. an offline model).
///
/// The value is clamped to `[0, 1]`; NaN reads as `0.5`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedProbability(pub f64);

impl SlaEstimator for FixedProbability {
    fn violation_probability<R: Rng + ?Sized>(&self, _rng: &mut R, _query: &SlaQuery) -> f64 {
        if self.0.is_nan() {
            0.5
        } else {
            self.0.clamp(0.0, 1.0)
        }
    }
}

/// Arrival-time spread used by the Monte Carlo model.
#[inline]
pub fn eta_std_dev(eta: f64, risk_weather: f64, risk_traffic: f64) -> f64 {
    eta * (0.05 + 0.3 * (risk_weather + risk_traffic))
}

/// Estimate `P(actual ETA > sla)` from `n` normal samples around `eta`.
///
/// Degenerate inputs:
/// - `n == 0` returns `0.0`.
/// - A zero, negative, or non-finite spread collapses the distribution to a point,
///   giving `1.0` if `eta > sla` and `0.0` otherwise.
pub fn monte_carlo_sla_probability<R: Rng + ?Sized>(
    rng: &mut R,
    eta: f64,
    sla: f64,
    risk_weather: f64,
    risk_traffic: f64,
    n: usize,
) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let point = if eta > sla { 1.0 } else { 0.0 };
    let std = eta_std_dev(eta, risk_weather, risk_traffic);
    if !(std.is_finite() && std > 0.0 && eta.is_finite()) {
        return point;
    }
    let Ok(dist) = Normal::new(eta, std) else {
        return point;
    };
    let late = (0..n).filter(|_| dist.sample(&mut *rng) > sla).count();
    late as f64 / n as f64
}
