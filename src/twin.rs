//! Per-truck digital twin with incident detection.
//!
//! A [`DigitalTwin`] owns one truck's evolving health and risk factors. Each tick
//! degrades health and accrues risk with seeded randomness, then (outside the initial
//! observation window) runs incident detection:
//!
//! ```text
//!   combined_risk  = 0.40 * traffic + 0.35 * weather + 0.25 * mech
//!   sla_threshold  = 0.65 + (1 - progress/100) * 0.15     (0.80 -> 0.65)
//!   risk_threshold = 0.55 - (progress/100) * 0.10         (0.55 -> 0.45)
//!
//!   incident iff p_violation > sla_threshold
//!             or combined_risk > risk_threshold
//!             or health < health_floor
//! ```
//!
//! The status machine has two states and one transition: `IN_TRANSIT -> INCIDENT_DETECTED`.
//! Once an incident is detected the twin stops simulating and every later query returns
//! `INCIDENT_DETECTED`.
//!
//! A twin is single-owner: ticks for one truck must be serialized by the driver.
//! Separate twins share nothing and can run on separate threads.

use std::collections::BTreeMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::decision::{evaluate_actions, DecisionResult};
use crate::montecarlo::{MonteCarloEstimator, SlaEstimator, SlaQuery};
use crate::stable_hash::truck_seed;
use crate::telemetry::Telemetry;
use crate::utils::clamp;
use crate::weights::Weights;

/// Detection status reported per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TwinStatus {
    #[default]
    InTransit,
    /// Terminal for the run.
    IncidentDetected,
}

impl TwinStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TwinStatus::InTransit => "IN_TRANSIT",
            TwinStatus::IncidentDetected => "INCIDENT_DETECTED",
        }
    }

    pub fn is_incident(self) -> bool {
        self == TwinStatus::IncidentDetected
    }

    /// One-directional transition: an incident is never cleared.
    #[must_use]
    pub fn advance(self, incident: bool) -> Self {
        match self {
            TwinStatus::IncidentDetected => TwinStatus::IncidentDetected,
            TwinStatus::InTransit if incident => TwinStatus::IncidentDetected,
            TwinStatus::InTransit => TwinStatus::InTransit,
        }
    }
}

impl fmt::Display for TwinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The first detection condition that held on the incident tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IncidentTrigger {
    SlaProbability,
    CombinedRisk,
    LowHealth,
}

/// What-if scenario flags. Fixed for the life of a twin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Scenario {
    /// +0.12 weather risk per tick.
    pub severe_weather: bool,
    /// +0.10 traffic risk per tick.
    pub traffic_peak: bool,
    /// Extra 0.7 health loss per tick.
    pub strike: bool,
}

impl Scenario {
    /// Read `severe_weather` / `traffic_peak` / `strike`; missing flags are `false`.
    pub fn from_flags(flags: &BTreeMap<String, bool>) -> Self {
        let get = |k: &str| flags.get(k).copied().unwrap_or(false);
        Self {
            severe_weather: get("severe_weather"),
            traffic_peak: get("traffic_peak"),
            strike: get("strike"),
        }
    }

    pub fn with_severe_weather(mut self, on: bool) -> Self {
        self.severe_weather = on;
        self
    }

    pub fn with_traffic_peak(mut self, on: bool) -> Self {
        self.traffic_peak = on;
        self
    }

    pub fn with_strike(mut self, on: bool) -> Self {
        self.strike = on;
        self
    }
}

/// Detection tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectionConfig {
    /// Progress (percent) below which ticks only simulate and never detect.
    pub observation_window_pct: f64,
    /// Health strictly below this is an incident.
    pub health_floor: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            observation_window_pct: 10.0,
            health_floor: 70.0,
        }
    }
}

/// Health and risk factors owned by a twin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TwinState {
    /// `[0, 100]`
    pub health: f64,
    pub risk_weather: f64,
    pub risk_traffic: f64,
    pub risk_mech: f64,
}

impl TwinState {
    pub fn from_telemetry(row: &Telemetry) -> Self {
        Self {
            health: row.health(),
            risk_weather: row.risk_weather(),
            risk_traffic: row.risk_traffic(),
            risk_mech: row.risk_mech(),
        }
    }

    /// Blend used only for incident detection.
    pub fn combined_risk(&self) -> f64 {
        combined_risk(self.risk_traffic, self.risk_weather, self.risk_mech)
    }
}

pub fn combined_risk(risk_traffic: f64, risk_weather: f64, risk_mech: f64) -> f64 {
    0.40 * risk_traffic + 0.35 * risk_weather + 0.25 * risk_mech
}

/// SLA-probability threshold at `progress_pct`.
pub fn sla_threshold(progress_pct: f64) -> f64 {
    0.65 + (1.0 - progress_pct / 100.0) * 0.15
}

/// Combined-risk threshold at `progress_pct`.
pub fn risk_threshold(progress_pct: f64) -> f64 {
    0.55 - (progress_pct / 100.0) * 0.10
}

/// Audit record for one `predict_status` call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickReport {
    pub progress_pct: f64,
    pub status: TwinStatus,
    /// `true` when the tick simulated without running detection.
    pub observation_window: bool,
    /// Detection inputs; `None` when detection did not run this tick.
    pub sla_violation_prob: Option<f64>,
    pub combined_risk: Option<f64>,
    pub sla_threshold: Option<f64>,
    pub risk_threshold: Option<f64>,
    /// Set only on the tick that raised the incident.
    pub trigger: Option<IncidentTrigger>,
}

impl TickReport {
    fn bare(progress_pct: f64, status: TwinStatus, observation_window: bool) -> Self {
        Self {
            progress_pct,
            status,
            observation_window,
            sla_violation_prob: None,
            combined_risk: None,
            sla_threshold: None,
            risk_threshold: None,
            trigger: None,
        }
    }
}

/// Stochastic twin of one truck.
///
/// Trajectories are reproducible: the RNG is seeded from the truck identifier, so the
/// same row and scenario always produce the same sequence of states and statuses.
#[derive(Debug, Clone)]
pub struct DigitalTwin<E = MonteCarloEstimator> {
    telemetry: Telemetry,
    scenario: Scenario,
    cfg: DetectionConfig,
    estimator: E,
    state: TwinState,
    status: TwinStatus,
    ticks: u64,
    rng: StdRng,
}

impl DigitalTwin<MonteCarloEstimator> {
    /// Twin using the default Monte Carlo estimator.
    pub fn new(telemetry: Telemetry, scenario: Scenario) -> Self {
        Self::with_estimator(telemetry, scenario, MonteCarloEstimator::default())
    }
}

impl<E: SlaEstimator> DigitalTwin<E> {
    /// Twin consulting `estimator` for the SLA-violation probability.
    pub fn with_estimator(telemetry: Telemetry, scenario: Scenario, estimator: E) -> Self {
        let seed = truck_seed(&telemetry.truck_id);
        Self {
            state: TwinState::from_telemetry(&telemetry),
            telemetry,
            scenario,
            cfg: DetectionConfig::default(),
            estimator,
            status: TwinStatus::InTransit,
            ticks: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_config(mut self, cfg: DetectionConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Replace the identifier-derived seed (e.g. to sample alternative futures).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn truck_id(&self) -> &str {
        &self.telemetry.truck_id
    }

    pub fn status(&self) -> TwinStatus {
        self.status
    }

    pub fn state(&self) -> TwinState {
        self.state
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn config(&self) -> DetectionConfig {
        self.cfg
    }

    /// Number of simulated ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current telemetry, carrying the simulated health/risk and the last probability.
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Owned copy of the current telemetry, for handing to the decision engine.
    pub fn snapshot(&self) -> Telemetry {
        self.telemetry.clone()
    }

    pub fn into_telemetry(self) -> Telemetry {
        self.telemetry
    }

    /// Advance one tick: degrade health, accrue risk, clamp, and write back.
    pub fn step(&mut self) {
        let s = &mut self.state;

        s.health -= self.rng.random_range(0.3..1.0);
        if self.scenario.strike {
            s.health -= 0.7;
        }

        s.risk_traffic += self.rng.random_range(0.01..0.04);
        if self.scenario.traffic_peak {
            s.risk_traffic += 0.10;
        }

        s.risk_weather += self.rng.random_range(0.01..0.04);
        if self.scenario.severe_weather {
            s.risk_weather += 0.12;
        }

        // A degraded vehicle accrues mechanical risk faster.
        s.risk_mech += self.rng.random_range(0.01..0.03);
        if s.health < 75.0 {
            s.risk_mech += 0.05;
        }

        s.health = clamp(s.health, 0.0, 100.0);
        s.risk_traffic = clamp(s.risk_traffic, 0.0, 1.0);
        s.risk_weather = clamp(s.risk_weather, 0.0, 1.0);
        s.risk_mech = clamp(s.risk_mech, 0.0, 1.0);

        self.telemetry.twin_health = Some(s.health);
        self.telemetry.risk_traffic = Some(s.risk_traffic);
        self.telemetry.risk_weather = Some(s.risk_weather);
        self.telemetry.risk_mech = Some(s.risk_mech);
        self.ticks += 1;
    }

    /// Tick at `progress_pct` and return the resulting status.
    pub fn predict_status(&mut self, progress_pct: f64) -> TwinStatus {
        self.predict_status_explain(progress_pct).status
    }

    /// Like [`DigitalTwin::predict_status`], returning the detection inputs as well.
    ///
    /// Non-finite progress is read as `0` (inside the observation window).
    pub fn predict_status_explain(&mut self, progress_pct: f64) -> TickReport {
        if self.status.is_incident() {
            return TickReport::bare(progress_pct, self.status, false);
        }
        let progress = if progress_pct.is_finite() {
            progress_pct
        } else {
            0.0
        };

        self.step();
        if progress < self.cfg.observation_window_pct {
            return TickReport::bare(progress, TwinStatus::InTransit, true);
        }

        let query = SlaQuery {
            eta: self.telemetry.eta(),
            sla: self.telemetry.sla(),
            risk_weather: self.state.risk_weather,
            risk_traffic: self.state.risk_traffic,
        };
        let p = self.estimator.violation_probability(&mut self.rng, &query);
        self.telemetry.sla_violation_prob = Some(p);

        let risk = self.state.combined_risk();
        let sla_thr = sla_threshold(progress);
        let risk_thr = risk_threshold(progress);

        let trigger = if p > sla_thr {
            Some(IncidentTrigger::SlaProbability)
        } else if risk > risk_thr {
            Some(IncidentTrigger::CombinedRisk)
        } else if self.state.health < self.cfg.health_floor {
            Some(IncidentTrigger::LowHealth)
        } else {
            None
        };

        debug!(
            truck_id = %self.telemetry.truck_id,
            progress,
            p_violation = p,
            combined_risk = risk,
            sla_threshold = sla_thr,
            risk_threshold = risk_thr,
            health = self.state.health,
            "twin tick"
        );

        self.status = self.status.advance(trigger.is_some());
        if let Some(t) = trigger {
            info!(
                truck_id = %self.telemetry.truck_id,
                progress,
                trigger = ?t,
                "incident detected"
            );
        }

        TickReport {
            progress_pct: progress,
            status: self.status,
            observation_window: false,
            sla_violation_prob: Some(p),
            combined_risk: Some(risk),
            sla_threshold: Some(sla_thr),
            risk_threshold: Some(risk_thr),
            trigger,
        }
    }

    /// Recommend an action from the twin's current telemetry.
    pub fn recommend(&self, weights: &Weights) -> DecisionResult {
        evaluate_actions(&self.telemetry, weights)
    }
}
