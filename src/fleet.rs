//! Driving twins along a route and evaluating whole fleets.
//!
//! The per-truck pipeline:
//!
//! ```text
//! for p in checkpoints:
//!     status = twin.predict_status(p)
//!     if status == INCIDENT_DETECTED:
//!         recommendation = evaluate_actions(twin.snapshot(), weights)
//!         stop
//! ```
//!
//! Trucks are independent, so fleet runs fan out across threads with `rayon`.
//! Cancellation is checked once per truck; a truck that has started always finishes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::action::Action;
use crate::decision::{evaluate_actions, DecisionResult};
use crate::montecarlo::SlaEstimator;
use crate::telemetry::Telemetry;
use crate::twin::{DigitalTwin, Scenario, TickReport};
use crate::weights::Weights;
use crate::{Error, Result};

/// Smallest step [`Checkpoints::uniform`] accepts; finer steps are raised to it.
pub const MIN_CHECKPOINT_STEP: f64 = 0.1;

/// Ordered progress checkpoints (percent of route completed).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Checkpoints(Vec<f64>);

impl Default for Checkpoints {
    /// `0, 20, 40, 60, 80, 100`.
    fn default() -> Self {
        Self::uniform(20.0)
    }
}

impl Checkpoints {
    /// Validate a checkpoint list: non-empty, finite, non-decreasing.
    pub fn new(points: Vec<f64>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidCheckpoints("no checkpoints".to_string()));
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(Error::InvalidCheckpoints(format!("non-finite checkpoint {bad}")));
        }
        if let Some(w) = points.windows(2).find(|w| w[1] < w[0]) {
            return Err(Error::InvalidCheckpoints(format!(
                "checkpoints decrease: {} then {}",
                w[0], w[1]
            )));
        }
        Ok(Self(points))
    }

    /// `0, step, 2*step, ...` up to and including 100 when `step` divides it.
    ///
    /// A non-positive or non-finite step yields just `[0, 100]`. Steps below
    /// [`MIN_CHECKPOINT_STEP`] are raised to it, which bounds the list at 1001 points.
    pub fn uniform(step: f64) -> Self {
        if !(step.is_finite() && step > 0.0) {
            return Self(vec![0.0, 100.0]);
        }
        let step = step.max(MIN_CHECKPOINT_STEP);
        let n = (100.0 / step).floor() as usize;
        Self((0..=n).map(|i| i as f64 * step).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Result of driving one twin along its checkpoints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationOutcome {
    pub truck_id: String,
    /// One report per visited checkpoint, ending at the incident if there was one.
    pub ticks: Vec<TickReport>,
    /// Progress at which the incident was detected.
    pub incident_at: Option<f64>,
    /// Present iff an incident was detected.
    pub recommendation: Option<DecisionResult>,
    /// Telemetry as the twin left it.
    pub telemetry: Telemetry,
}

/// Drive `twin` through `checkpoints`, stopping at the first incident.
pub fn simulate_truck<E: SlaEstimator>(
    twin: &mut DigitalTwin<E>,
    checkpoints: &Checkpoints,
    weights: &Weights,
) -> SimulationOutcome {
    let mut ticks = Vec::with_capacity(checkpoints.as_slice().len());
    let mut incident_at = None;
    let mut recommendation = None;

    for &p in checkpoints.as_slice() {
        let report = twin.predict_status_explain(p);
        let incident = report.status.is_incident();
        ticks.push(report);
        if incident {
            incident_at = Some(p);
            recommendation = Some(evaluate_actions(&twin.snapshot(), weights));
            break;
        }
    }

    SimulationOutcome {
        truck_id: twin.truck_id().to_string(),
        ticks,
        incident_at,
        recommendation,
        telemetry: twin.snapshot(),
    }
}

/// Score every row in parallel. Output order matches `rows`.
pub fn evaluate_fleet(rows: &[Telemetry], weights: &Weights) -> Vec<DecisionResult> {
    rows.par_iter().map(|r| evaluate_actions(r, weights)).collect()
}

/// Outcome of a (possibly cancelled) fleet simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetRun {
    /// Completed trucks, in input order.
    pub outcomes: Vec<SimulationOutcome>,
    /// `true` if some trucks were skipped because `cancel` was raised.
    pub cancelled: bool,
}

impl FleetRun {
    pub fn incidents(&self) -> impl Iterator<Item = &SimulationOutcome> {
        self.outcomes.iter().filter(|o| o.incident_at.is_some())
    }
}

/// Simulate one Monte Carlo twin per row under a shared scenario.
///
/// `cancel` is checked before each truck starts.
pub fn simulate_fleet(
    rows: &[Telemetry],
    scenario: Scenario,
    weights: &Weights,
    checkpoints: &Checkpoints,
    cancel: &AtomicBool,
) -> FleetRun {
    let outcomes: Vec<SimulationOutcome> = rows
        .par_iter()
        .filter_map(|row| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let mut twin = DigitalTwin::new(row.clone(), scenario);
            Some(simulate_truck(&mut twin, checkpoints, weights))
        })
        .collect();

    let cancelled = outcomes.len() < rows.len();
    let incidents = outcomes.iter().filter(|o| o.incident_at.is_some()).count();
    if cancelled {
        warn!(
            completed = outcomes.len(),
            total = rows.len(),
            "fleet simulation cancelled"
        );
    }
    info!(trucks = outcomes.len(), incidents, "fleet simulation finished");

    FleetRun {
        outcomes,
        cancelled,
    }
}

/// Fleet-level KPIs over a batch of recommendations.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetSummary {
    pub trucks: usize,
    pub total_savings: f64,
    pub savings_by_action: BTreeMap<Action, f64>,
    pub actions: BTreeMap<Action, usize>,
    /// Share of trucks with `eta <= sla` before acting.
    pub on_time_before: f64,
    /// Share of trucks with `projected_eta <= sla` after the recommended action.
    pub on_time_after: f64,
}

impl FleetSummary {
    /// Summarize `results`, pairing each with the row it was computed from.
    ///
    /// Extra entries on either side are ignored.
    pub fn from_evaluations(rows: &[Telemetry], results: &[DecisionResult]) -> Self {
        let mut out = Self::default();
        let mut before = 0usize;
        let mut after = 0usize;
        for (row, d) in rows.iter().zip(results) {
            out.trucks += 1;
            out.total_savings += d.savings;
            *out.savings_by_action.entry(d.action).or_insert(0.0) += d.savings;
            *out.actions.entry(d.action).or_insert(0) += 1;
            if row.eta() <= row.sla() {
                before += 1;
            }
            if d.projected_eta <= row.sla() {
                after += 1;
            }
        }
        if out.trucks > 0 {
            out.on_time_before = before as f64 / out.trucks as f64;
            out.on_time_after = after as f64 / out.trucks as f64;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::montecarlo::FixedProbability;

    #[test]
    fn default_checkpoints() {
        assert_eq!(
            Checkpoints::default().as_slice(),
            &[0.0, 20.0, 40.0, 60.0, 80.0, 100.0]
        );
    }

    #[test]
    fn checkpoints_validation() {
        assert!(Checkpoints::new(vec![]).is_err());
        assert!(Checkpoints::new(vec![0.0, f64::NAN]).is_err());
        assert!(matches!(
            Checkpoints::new(vec![0.0, 50.0, 40.0]),
            Err(Error::InvalidCheckpoints(_))
        ));
        assert!(Checkpoints::new(vec![0.0, 50.0, 50.0, 90.0]).is_ok());
        assert_eq!(Checkpoints::uniform(-1.0).as_slice(), &[0.0, 100.0]);
    }

    #[test]
    fn tiny_uniform_steps_are_bounded() {
        for step in [1e-300, 1e-9, f64::MIN_POSITIVE] {
            let cp = Checkpoints::uniform(step);
            assert_eq!(cp.as_slice().len(), 1001);
            assert_eq!(cp.as_slice()[0], 0.0);
            assert!((cp.as_slice()[1000] - 100.0).abs() < 1e-9);
        }
        assert_eq!(Checkpoints::uniform(25.0).as_slice(), &[0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn simulate_truck_stops_at_first_incident() {
        let row = Telemetry {
            twin_health: Some(65.0),
            ..Telemetry::new("TRK-77")
        };
        let mut twin = DigitalTwin::with_estimator(row, Scenario::default(), FixedProbability(0.0));
        let out = simulate_truck(&mut twin, &Checkpoints::default(), &Weights::default());
        assert_eq!(out.incident_at, Some(20.0));
        assert_eq!(out.ticks.len(), 2);
        let rec = out.recommendation.unwrap();
        assert_eq!(rec.sla_violation_prob, 0.0);
        assert_eq!(out.telemetry.sla_violation_prob, Some(0.0));
    }

    #[test]
    fn quiet_truck_has_no_recommendation() {
        let row = Telemetry {
            twin_health: Some(100.0),
            risk_weather: Some(0.0),
            risk_traffic: Some(0.0),
            risk_mech: Some(0.0),
            ..Telemetry::new("TRK-1")
        };
        let mut twin = DigitalTwin::with_estimator(row, Scenario::default(), FixedProbability(0.0));
        let out = simulate_truck(&mut twin, &Checkpoints::default(), &Weights::default());
        assert_eq!(out.incident_at, None);
        assert!(out.recommendation.is_none());
        assert_eq!(out.ticks.len(), 6);
    }

    #[test]
    fn summary_counts_on_time_share() {
        let rows = vec![
            Telemetry {
                eta_minutes: Some(200.0),
                sla_minutes: Some(180.0),
                ..Telemetry::new("a")
            },
            Telemetry {
                eta_minutes: Some(100.0),
                sla_minutes: Some(180.0),
                ..Telemetry::new("b")
            },
        ];
        let results = evaluate_fleet(&rows, &Weights::default().normalized());
        let s = FleetSummary::from_evaluations(&rows, &results);
        assert_eq!(s.trucks, 2);
        assert_eq!(s.on_time_before, 0.5);
        assert_eq!(s.actions.values().sum::<usize>(), 2);
        let total: f64 = results.iter().map(|d| d.savings).sum();
        assert!((s.total_savings - total).abs() < 1e-9);
    }

    #[test]
    fn cancelled_fleet_skips_trucks() {
        let rows: Vec<Telemetry> = (0..8).map(|i| Telemetry::new(format!("TRK-{i}"))).collect();
        let cancel = AtomicBool::new(true);
        let run = simulate_fleet(
            &rows,
            Scenario::default(),
            &Weights::default(),
            &Checkpoints::default(),
            &cancel,
        );
        assert!(run.cancelled);
        assert!(run.outcomes.is_empty());
    }
}
