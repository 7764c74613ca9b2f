//! Fleet batch: score every truck and simulate the whole fleet in parallel.
//!
//! Run with:
//!   cargo run --example fleet_batch

use std::sync::atomic::AtomicBool;

use fleet_twin::{
    evaluate_fleet, simulate_fleet, Checkpoints, FleetSummary, Scenario, Telemetry, Weights,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Synthetic fleet: a deterministic spread of on-time, late, and worn trucks.
    let rows: Vec<Telemetry> = (0..40)
        .map(|i| {
            let f = (i % 10) as f64 / 9.0;
            Telemetry {
                sla_minutes: Some(180.0),
                eta_minutes: Some(130.0 + 100.0 * f),
                twin_health: Some(100.0 - 35.0 * f),
                risk_weather: Some(0.05 + 0.3 * f),
                risk_traffic: Some(0.10 + 0.2 * f),
                risk_mech: Some(0.1),
                sla_violation_prob: Some(f),
                ..Telemetry::new(format!("TRK-{i:03}"))
            }
        })
        .collect();

    let weights = Weights::default().normalized();

    // -----------------------------------------------------------------
    // 1. Static evaluation of the current snapshot.
    // -----------------------------------------------------------------
    let results = evaluate_fleet(&rows, &weights);
    let summary = FleetSummary::from_evaluations(&rows, &results);
    println!("trucks:           {}", summary.trucks);
    println!("total savings:    {:.0} MAD", summary.total_savings);
    println!("on time before:   {:.1}%", summary.on_time_before * 100.0);
    println!("on time after:    {:.1}%", summary.on_time_after * 100.0);
    for (action, n) in &summary.actions {
        let saved = summary.savings_by_action.get(action).copied().unwrap_or_default();
        println!("  {action:<8} x{n:<3} saves {saved:.0} MAD");
    }

    // -----------------------------------------------------------------
    // 2. Twin simulation under a severe-weather scenario.
    // -----------------------------------------------------------------
    let cancel = AtomicBool::new(false);
    let run = simulate_fleet(
        &rows,
        Scenario::default().with_severe_weather(true),
        &weights,
        &Checkpoints::default(),
        &cancel,
    );
    println!("\nincidents under severe weather:");
    for o in run.incidents() {
        if let (Some(p), Some(rec)) = (o.incident_at, &o.recommendation) {
            println!("  {} at {p:>3.0}% -> {}", o.truck_id, rec.explanation);
        }
    }
}
