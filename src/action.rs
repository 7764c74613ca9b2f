//! Mitigation actions and their effect/cost/reliability table.
//!
//! Each [`Action`] maps to one row of a static [`ActionProfile`] table, so the decision
//! engine scores every candidate through the same loop instead of branching per action.
//!
//! Effect model (minutes):
//!
//! ```text
//!   WAIT     eta + 60
//!   REROUTE  max(eta * 0.85, eta - 45)
//!   EXPRESS  max(eta * 0.70, eta - 90)
//! ```
//!
//! The `max` picks whichever reduction is *smaller* in magnitude (the later ETA).

use std::fmt;
use std::str::FromStr;

use crate::telemetry::Telemetry;
use crate::utils::clamp;
use crate::Error;

/// One of the three mitigation choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Action {
    Wait,
    Reroute,
    Express,
}

impl Action {
    /// All actions in evaluation order. Score ties resolve to the earlier entry.
    pub const ALL: [Action; 3] = [Action::Wait, Action::Reroute, Action::Express];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Wait => "WAIT",
            Action::Reroute => "REROUTE",
            Action::Express => "EXPRESS",
        }
    }

    /// The table row for this action.
    pub fn profile(self) -> &'static ActionProfile {
        match self {
            Action::Wait => &PROFILES[0],
            Action::Reroute => &PROFILES[1],
            Action::Express => &PROFILES[2],
        }
    }

    /// Projected ETA after taking this action.
    pub fn project_eta(self, eta: f64) -> f64 {
        (self.profile().effect)(eta)
    }

    /// Direct monetary cost of this action for `row`.
    pub fn cost(self, row: &Telemetry) -> f64 {
        (self.profile().cost)(row)
    }

    /// Reliability penalty (higher is worse) of this action for `row`.
    pub fn reliability_penalty(self, row: &Telemetry) -> f64 {
        (self.profile().reliability)(row)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAIT" => Ok(Action::Wait),
            "REROUTE" => Ok(Action::Reroute),
            "EXPRESS" => Ok(Action::Express),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

/// Effect, cost, and reliability functions for one action.
#[derive(Debug, Clone, Copy)]
pub struct ActionProfile {
    pub action: Action,
    pub effect: fn(f64) -> f64,
    pub cost: fn(&Telemetry) -> f64,
    pub reliability: fn(&Telemetry) -> f64,
}

static PROFILES: [ActionProfile; 3] = [
    ActionProfile {
        action: Action::Wait,
        effect: wait_effect,
        cost: wait_cost,
        reliability: wait_reliability,
    },
    ActionProfile {
        action: Action::Reroute,
        effect: reroute_effect,
        cost: reroute_cost,
        reliability: reroute_reliability,
    },
    ActionProfile {
        action: Action::Express,
        effect: express_effect,
        cost: express_cost,
        reliability: express_reliability,
    },
];

fn wait_effect(eta: f64) -> f64 {
    eta + 60.0
}

fn reroute_effect(eta: f64) -> f64 {
    (eta * 0.85).max(eta - 45.0)
}

fn express_effect(eta: f64) -> f64 {
    (eta * 0.70).max(eta - 90.0)
}

// Waiting means eating the full late-delivery penalty.
fn wait_cost(row: &Telemetry) -> f64 {
    row.penalty()
}

fn reroute_cost(row: &Telemetry) -> f64 {
    row.reroute_cost()
}

fn express_cost(row: &Telemetry) -> f64 {
    row.express_cost()
}

fn wait_reliability(row: &Telemetry) -> f64 {
    0.3 * (row.risk_weather() + row.risk_traffic())
}

fn reroute_reliability(row: &Telemetry) -> f64 {
    0.2 * (row.risk_weather() + row.risk_traffic())
}

fn express_reliability(row: &Telemetry) -> f64 {
    let bad_health = 1.0 - clamp(row.health() / 100.0, 0.0, 1.0);
    0.4 * bad_health + 0.2 * row.risk_mech()
}

/// Projected ETA for a textual action label.
///
/// Unrecognized labels return `eta` unchanged.
pub fn project_eta_for_label(eta: f64, label: &str) -> f64 {
    label.parse::<Action>().map_or(eta, |a| a.project_eta(eta))
}
