//! Small numeric helpers shared by the twin and the decision engine.

/// Limit `value` to `[lo, hi]`.
///
/// Unlike [`f64::clamp`] this never panics on a reversed range; `lo` wins.
/// NaN inputs come back as `lo`.
#[inline]
#[must_use]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    lo.max(value.min(hi))
}

/// `value` when present and finite, otherwise `default`.
///
/// This is the safe-lookup policy applied to every telemetry read.
#[inline]
#[must_use]
pub fn finite_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}
