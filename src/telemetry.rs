//! Per-truck telemetry row.
//!
//! A [`Telemetry`] row is built once by whatever loads fleet data and then handed to
//! the twin and the decision engine. Every numeric field is optional: absent, null,
//! and non-finite values resolve to the documented defaults in [`defaults`] at read
//! time, so no consumer ever has to validate a row before using it.

use std::collections::BTreeMap;

use crate::utils::finite_or;

/// Field names used in keyed telemetry records.
pub mod keys {
    pub const SLA_MINUTES: &str = "sla_minutes";
    pub const ETA_MINUTES: &str = "eta_minutes";
    pub const PENALTY_MAD: &str = "penalty_mad";
    pub const REROUTE_COST_MAD: &str = "reroute_cost_mad";
    pub const EXPRESS_COST_MAD: &str = "express_cost_mad";
    pub const TWIN_HEALTH: &str = "twin_health";
    pub const RISK_WEATHER: &str = "risk_weather";
    pub const RISK_TRAFFIC: &str = "risk_traffic";
    pub const RISK_MECH: &str = "risk_mech";
    pub const SLA_VIOLATION_PROB: &str = "sla_violation_prob";
}

/// Fallback values for missing or invalid fields.
pub mod defaults {
    pub const SLA_MINUTES: f64 = 180.0;
    pub const ETA_MINUTES: f64 = 180.0;
    pub const PENALTY_MAD: f64 = 2000.0;
    pub const REROUTE_COST_MAD: f64 = 1200.0;
    pub const EXPRESS_COST_MAD: f64 = 2500.0;
    pub const TWIN_HEALTH: f64 = 100.0;
    pub const RISK_WEATHER: f64 = 0.2;
    pub const RISK_TRAFFIC: f64 = 0.2;
    pub const RISK_MECH: f64 = 0.2;
    pub const SLA_VIOLATION_PROB: f64 = 0.5;
}

/// One truck's telemetry and risk indicators.
///
/// Monetary fields are in MAD; times are in minutes. `attributes` carries
/// descriptive passthrough columns (origin, destination, load type, status) that the
/// core never interprets.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Telemetry {
    pub truck_id: String,
    pub sla_minutes: Option<f64>,
    pub eta_minutes: Option<f64>,
    pub penalty_mad: Option<f64>,
    pub reroute_cost_mad: Option<f64>,
    pub express_cost_mad: Option<f64>,
    pub twin_health: Option<f64>,
    pub risk_weather: Option<f64>,
    pub risk_traffic: Option<f64>,
    pub risk_mech: Option<f64>,
    pub sla_violation_prob: Option<f64>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "BTreeMap::is_empty")
    )]
    pub attributes: BTreeMap<String, String>,
}

impl Telemetry {
    /// An empty row for `truck_id`: every numeric field reads as its default.
    pub fn new(truck_id: impl Into<String>) -> Self {
        Self {
            truck_id: truck_id.into(),
            ..Self::default()
        }
    }

    /// Build a row from a keyed field mapping (see [`keys`]).
    ///
    /// Unknown keys are ignored. A key mapped to `None` is treated as absent.
    pub fn from_fields(
        truck_id: impl Into<String>,
        fields: &BTreeMap<String, Option<f64>>,
    ) -> Self {
        let get = |k: &str| fields.get(k).copied().flatten();
        Self {
            truck_id: truck_id.into(),
            sla_minutes: get(keys::SLA_MINUTES),
            eta_minutes: get(keys::ETA_MINUTES),
            penalty_mad: get(keys::PENALTY_MAD),
            reroute_cost_mad: get(keys::REROUTE_COST_MAD),
            express_cost_mad: get(keys::EXPRESS_COST_MAD),
            twin_health: get(keys::TWIN_HEALTH),
            risk_weather: get(keys::RISK_WEATHER),
            risk_traffic: get(keys::RISK_TRAFFIC),
            risk_mech: get(keys::RISK_MECH),
            sla_violation_prob: get(keys::SLA_VIOLATION_PROB),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach a descriptive passthrough attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Scale the reroute and express fees by `1 + pct / 100` (fuel indexation).
    ///
    /// The scaled values are the resolved fees, so a missing fee is indexed from its
    /// default. Non-finite `pct` leaves the row unchanged.
    pub fn with_fuel_index(mut self, pct: f64) -> Self {
        if !pct.is_finite() {
            return self;
        }
        let factor = 1.0 + pct / 100.0;
        self.reroute_cost_mad = Some(self.reroute_cost() * factor);
        self.express_cost_mad = Some(self.express_cost() * factor);
        self
    }

    pub fn sla(&self) -> f64 {
        finite_or(self.sla_minutes, defaults::SLA_MINUTES)
    }

    pub fn eta(&self) -> f64 {
        finite_or(self.eta_minutes, defaults::ETA_MINUTES)
    }

    /// Late-delivery penalty.
    pub fn penalty(&self) -> f64 {
        finite_or(self.penalty_mad, defaults::PENALTY_MAD)
    }

    pub fn reroute_cost(&self) -> f64 {
        finite_or(self.reroute_cost_mad, defaults::REROUTE_COST_MAD)
    }

    pub fn express_cost(&self) -> f64 {
        finite_or(self.express_cost_mad, defaults::EXPRESS_COST_MAD)
    }

    /// Vehicle health in `[0, 100]` (as reported; not re-clamped here).
    pub fn health(&self) -> f64 {
        finite_or(self.twin_health, defaults::TWIN_HEALTH)
    }

    pub fn risk_weather(&self) -> f64 {
        finite_or(self.risk_weather, defaults::RISK_WEATHER)
    }

    pub fn risk_traffic(&self) -> f64 {
        finite_or(self.risk_traffic, defaults::RISK_TRAFFIC)
    }

    pub fn risk_mech(&self) -> f64 {
        finite_or(self.risk_mech, defaults::RISK_MECH)
    }

    /// Estimated probability that the delivery misses its SLA.
    pub fn violation_prob(&self) -> f64 {
        finite_or(self.sla_violation_prob, defaults::SLA_VIOLATION_PROB)
    }

    /// `true` when the current ETA already exceeds the SLA.
    pub fn is_late(&self) -> bool {
        self.eta() > self.sla()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_row_reads_documented_defaults() {
        let t = Telemetry::new("T-1");
        assert_eq!(t.sla(), 180.0);
        assert_eq!(t.eta(), 180.0);
        assert_eq!(t.penalty(), 2000.0);
        assert_eq!(t.reroute_cost(), 1200.0);
        assert_eq!(t.express_cost(), 2500.0);
        assert_eq!(t.health(), 100.0);
        assert_eq!(t.risk_weather(), 0.2);
        assert_eq!(t.risk_traffic(), 0.2);
        assert_eq!(t.risk_mech(), 0.2);
        assert_eq!(t.violation_prob(), 0.5);
        assert!(!t.is_late());
    }

    #[test]
    fn nan_and_null_fields_fall_back() {
        let mut fields = BTreeMap::new();
        fields.insert(keys::ETA_MINUTES.to_string(), Some(f64::NAN));
        fields.insert(keys::SLA_MINUTES.to_string(), None);
        fields.insert(keys::PENALTY_MAD.to_string(), Some(3500.0));
        fields.insert("dist_km".to_string(), Some(420.0));
        let t = Telemetry::from_fields("T-2", &fields);
        assert_eq!(t.eta(), 180.0);
        assert_eq!(t.sla(), 180.0);
        assert_eq!(t.penalty(), 3500.0);
    }

    #[test]
    fn fuel_index_scales_only_action_fees() {
        let t = Telemetry {
            reroute_cost_mad: Some(1000.0),
            ..Telemetry::new("T-3")
        }
        .with_fuel_index(20.0);
        assert!((t.reroute_cost() - 1200.0).abs() < 1e-9);
        assert!((t.express_cost() - 3000.0).abs() < 1e-9);
        assert_eq!(t.penalty(), 2000.0);
    }

    #[test]
    fn non_finite_fuel_index_is_ignored() {
        let t = Telemetry::new("T-4").with_fuel_index(f64::NAN);
        assert_eq!(t.reroute_cost_mad, None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_with_missing_and_null_fields() {
        let t: Telemetry = serde_json::from_str(
            r#"{"truck_id":"T-5","eta_minutes":240.0,"sla_minutes":null,"attributes":{"origin":"Casablanca"}}"#,
        )
        .unwrap();
        assert_eq!(t.eta(), 240.0);
        assert_eq!(t.sla(), 180.0);
        assert!(t.is_late());
        assert_eq!(t.attributes.get("origin").map(String::as_str), Some("Casablanca"));
    }
}
