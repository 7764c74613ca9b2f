//! Weighted multi-criteria action recommendation.
//!
//! For each candidate action (in [`Action::ALL`] order) the engine computes
//!
//! ```text
//!   cost_norm = clamp(cost / max(penalty, 1), 0, 2)
//!   score     = w_cost * cost_norm + w_sla * p_violation + w_rel * reliability_penalty
//!             (+ 0.4 for WAIT when eta already exceeds sla)
//! ```
//!
//! and recommends the action with the strictly smallest score; ties keep the earlier
//! action. The engine is a pure function of its inputs.

use tracing::debug;

use crate::action::Action;
use crate::telemetry::Telemetry;
use crate::utils::{clamp, finite_or};
use crate::weights::Weights;

/// Flat score surcharge on WAIT when the shipment is already late.
pub const LATE_WAIT_PENALTY: f64 = 0.4;

/// Score breakdown for one candidate action.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionScore {
    pub action: Action,
    pub projected_eta: f64,
    pub cost: f64,
    pub cost_norm: f64,
    pub reliability_penalty: f64,
    pub score: f64,
    /// Whether [`LATE_WAIT_PENALTY`] is included in `score`.
    pub late_wait_penalty: bool,
}

/// A recommendation. Computed fresh on every call; nothing is cached.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecisionResult {
    pub action: Action,
    pub projected_eta: f64,
    /// `max(0, penalty - cost(action))`.
    pub savings: f64,
    pub explanation: String,
    pub score: f64,
    /// Probability the scores were computed with.
    pub sla_violation_prob: f64,
    /// Every candidate, in evaluation order.
    pub candidates: Vec<ActionScore>,
}

impl DecisionResult {
    /// Breakdown for `action`.
    pub fn candidate(&self, action: Action) -> Option<&ActionScore> {
        self.candidates.iter().find(|c| c.action == action)
    }
}

/// Score a single action.
pub fn score_action(
    row: &Telemetry,
    weights: &Weights,
    sla_prob: f64,
    action: Action,
) -> ActionScore {
    let penalty = row.penalty();
    let cost = action.cost(row);
    let cost_norm = clamp(cost / penalty.max(1.0), 0.0, 2.0);
    let reliability_penalty = action.reliability_penalty(row);

    let mut score = weights.w_cost * cost_norm
        + weights.w_sla * sla_prob
        + weights.w_rel * reliability_penalty;
    let late_wait_penalty = action == Action::Wait && row.is_late();
    if late_wait_penalty {
        score += LATE_WAIT_PENALTY;
    }

    ActionScore {
        action,
        projected_eta: action.project_eta(row.eta()),
        cost,
        cost_norm,
        reliability_penalty,
        score,
        late_wait_penalty,
    }
}

/// Recommend an action using the row's own `sla_violation_prob`.
pub fn evaluate_actions(row: &Telemetry, weights: &Weights) -> DecisionResult {
    evaluate_actions_with(row, weights, row.violation_prob())
}

/// Recommend an action using an externally supplied violation probability.
///
/// A non-finite `sla_prob` falls back to the row's value (or its default).
pub fn evaluate_actions_with(row: &Telemetry, weights: &Weights, sla_prob: f64) -> DecisionResult {
    let sla_prob = finite_or(Some(sla_prob), row.violation_prob());
    let candidates: Vec<ActionScore> = Action::ALL
        .iter()
        .map(|&a| score_action(row, weights, sla_prob, a))
        .collect();

    let mut best = candidates[0];
    for c in &candidates[1..] {
        if c.score < best.score {
            best = *c;
        }
    }

    let savings = (row.penalty() - best.cost).max(0.0);
    let health = row.health();
    let explanation = explain(best.action, best.projected_eta, sla_prob, health);

    debug!(
        truck_id = %row.truck_id,
        action = %best.action,
        score = best.score,
        savings,
        "decision evaluated"
    );

    DecisionResult {
        action: best.action,
        projected_eta: best.projected_eta,
        savings,
        explanation,
        score: best.score,
        sla_violation_prob: sla_prob,
        candidates,
    }
}

/// Human-readable summary of a recommendation.
pub fn explain(action: Action, projected_eta: f64, sla_prob: f64, health: f64) -> String {
    format!(
        "Action={action}, ETA_after={projected_eta:.1}, P(SLA violation)={sla_prob:.2}, Health={health:.0}"
    )
}
