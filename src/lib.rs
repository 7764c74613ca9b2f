//! `fleet_twin`: per-truck digital twins, SLA risk estimation, and action recommendation.
//!
//! Given a truck's live telemetry and risk indicators, this crate simulates how the
//! shipment evolves, detects when an incident emerges (a likely SLA miss or equipment
//! risk), and recommends one of three mitigating actions with an estimate of the money
//! saved by taking it.
//!
//! The pieces, leaves first:
//!
//! - [`Action`] / [`project_eta_for_label`]: the action-effect model, a static table
//!   mapping each action to its ETA effect, cost, and reliability penalty.
//! - [`monte_carlo_sla_probability`] / [`MonteCarloEstimator`]: `P(actual ETA > SLA)`
//!   under a normal arrival model whose spread widens with weather and traffic risk.
//!   Any other provider plugs in through [`SlaEstimator`].
//! - [`evaluate_actions`]: the decision engine. Pure; scores WAIT, REROUTE, and
//!   EXPRESS and returns a [`DecisionResult`].
//! - [`DigitalTwin`]: owns one truck's evolving state and runs the two-state
//!   incident machine ([`TwinStatus`]).
//! - [`simulate_truck`] / [`simulate_fleet`] / [`evaluate_fleet`]: the driver loop and
//!   fleet-wide batch evaluation.
//!
//! **Goals:**
//! - **Deterministic by default**: a twin's RNG is seeded from its truck id, so the
//!   same row and scenario replay the same trajectory.
//! - **Never fails on data**: missing, null, or NaN telemetry resolves to documented
//!   defaults (see [`telemetry::defaults`]).
//! - **Pure decisions**: the engine reads an explicit [`Telemetry`] snapshot; the twin
//!   hands results over only through that snapshot.
//!
//! **Non-goals:**
//! - No ingestion, persistence, dashboards, or maps.
//! - No trained classifier or survival model; those feed in via [`FixedProbability`]
//!   or a custom [`SlaEstimator`].
//!
//! # Example
//!
//! ```rust
//! use fleet_twin::{simulate_truck, Checkpoints, DigitalTwin, Scenario, Telemetry, Weights};
//!
//! let row = Telemetry {
//!     sla_minutes: Some(180.0),
//!     eta_minutes: Some(210.0),
//!     twin_health: Some(72.0),
//!     ..Telemetry::new("TRK-042")
//! };
//! let mut twin = DigitalTwin::new(row, Scenario::default().with_traffic_peak(true));
//! let weights = Weights::default().normalized();
//!
//! let out = simulate_truck(&mut twin, &Checkpoints::default(), &weights);
//! if let Some(rec) = &out.recommendation {
//!     println!("{} at {:?}%: {}", out.truck_id, out.incident_at, rec.explanation);
//! }
//! ```

#![forbid(unsafe_code)]

mod error;
pub use error::{Error, Result};

mod utils;
pub use utils::*;

pub mod telemetry;
pub use telemetry::Telemetry;

mod weights;
pub use weights::*;

mod action;
pub use action::*;

mod montecarlo;
pub use montecarlo::*;

mod stable_hash;
pub use stable_hash::*;

mod decision;
pub use decision::*;

mod twin;
pub use twin::*;

mod fleet;
pub use fleet::*;
