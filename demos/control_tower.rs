//! Control tower: follow one truck until the twin raises an incident.
//!
//! Simulates a single truck under a what-if scenario, prints each checkpoint, and
//! shows the recommended action at the first incident.
//!
//! Run with:
//!   RUST_LOG=fleet_twin=debug cargo run --example control_tower

use fleet_twin::{simulate_truck, Checkpoints, DigitalTwin, Scenario, Telemetry, Weights};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // -----------------------------------------------------------------
    // 1. A truck on the Casablanca -> Marrakech corridor.
    // -----------------------------------------------------------------
    let row = Telemetry {
        sla_minutes: Some(240.0),
        eta_minutes: Some(225.0),
        penalty_mad: Some(3000.0),
        reroute_cost_mad: Some(1100.0),
        express_cost_mad: Some(2600.0),
        twin_health: Some(82.0),
        risk_weather: Some(0.25),
        risk_traffic: Some(0.30),
        risk_mech: Some(0.15),
        ..Telemetry::new("TRK-0142")
    }
    .with_attribute("origin", "Casablanca")
    .with_attribute("destination", "Marrakech")
    .with_attribute("load_type", "Refrigerated")
    // Operator slider: +10% fuel indexation on reroute/express fees.
    .with_fuel_index(10.0);

    // -----------------------------------------------------------------
    // 2. What-if: rush hour on the A7.
    // -----------------------------------------------------------------
    let scenario = Scenario::default().with_traffic_peak(true);
    let weights = Weights::default().normalized();

    let mut twin = DigitalTwin::new(row, scenario);
    let out = simulate_truck(&mut twin, &Checkpoints::default(), &weights);

    // -----------------------------------------------------------------
    // 3. Report.
    // -----------------------------------------------------------------
    for t in &out.ticks {
        match t.sla_violation_prob {
            Some(p) => println!(
                "{:>5.0}%  {:<18} p_violation={:.2} (thr {:.2})  risk={:.2} (thr {:.2})",
                t.progress_pct,
                t.status,
                p,
                t.sla_threshold.unwrap_or_default(),
                t.combined_risk.unwrap_or_default(),
                t.risk_threshold.unwrap_or_default(),
            ),
            None => println!("{:>5.0}%  {:<18} (observing)", t.progress_pct, t.status),
        }
    }

    match (&out.incident_at, &out.recommendation) {
        (Some(p), Some(rec)) => {
            println!("\nincident at {p:.0}% of route");
            println!("recommendation: {}  (savings {:.0} MAD)", rec.action, rec.savings);
            println!("{}", rec.explanation);
            for c in &rec.candidates {
                println!(
                    "  {:<8} score={:.3} cost={:.0} eta_after={:.1}",
                    c.action, c.score, c.cost, c.projected_eta
                );
            }
        }
        _ => println!("\nroute completed without incident"),
    }
}
