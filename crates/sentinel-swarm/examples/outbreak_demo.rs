//! Walks the default four-village network through a full outbreak:
//! benign reports, rising belief, a neighbor voting round, and finally
//! escalation to the (stubbed) quantum analysis collaborator.
//!
//! Run with: cargo run --example outbreak_demo

use sentinel_swarm::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel_swarm=debug,info".into()),
        )
        .init();

    let swarm = SwarmCoordinator::new(SwarmConfig::default(), Arc::new(NullQuantumAnalysis))?;

    println!("=== Sentinel Swarm Demo ===\n");

    // A benign report barely moves the needle.
    let outcome = swarm
        .process_symptom_report("Thane", vec!["sneezing".to_string()], HashMap::new())
        .await?;
    println!(
        "[Thane] benign report: belief={:.2} risk={} actions={:?}",
        outcome.belief, outcome.risk_level, outcome.actions_taken
    );

    // A stream of high-risk reports pushes Thane up the threshold ladder.
    for round in 1..=4 {
        let outcome = swarm
            .process_symptom_report(
                "Thane",
                vec!["fever".to_string(), "vomiting".to_string(), "rash".to_string()],
                HashMap::new(),
            )
            .await?;
        println!(
            "[Thane] outbreak report {round}: belief={:.2} risk={} actions={:?}",
            outcome.belief, outcome.risk_level, outcome.actions_taken
        );
    }

    // Navi Mumbai borders only Thane; with Thane already raised, its own
    // surge reaches consensus and fires the escalation trigger.
    for round in 1..=6 {
        let outcome = swarm
            .process_symptom_report(
                "Navi Mumbai",
                vec!["fever".to_string(), "diarrhea".to_string()],
                HashMap::new(),
            )
            .await?;
        println!(
            "[Navi Mumbai] outbreak report {round}: belief={:.2} risk={} actions={:?}",
            outcome.belief, outcome.risk_level, outcome.actions_taken
        );
        if let Some(escalation) = outcome.escalation {
            println!(
                "\n>>> escalated to quantum analysis: priority={} analysis={:?}",
                escalation.priority, escalation.analysis
            );
        }
        if !outcome.votes.is_empty() {
            println!(">>> neighbor votes: {:?}", outcome.votes);
        }
    }

    // Network-wide sweep.
    let workflow = swarm.trigger_outbreak_detection_workflow().await?;
    println!(
        "\nworkflow: average_belief={:.2} elevated_agents={} escalated={}",
        workflow.average_belief, workflow.elevated_agents, workflow.escalated
    );

    let status = swarm.get_network_status().await?;
    println!("\n=== Network Status ===");
    for (key, agent) in &status.agents {
        println!(
            "{key}: {} belief={:.2} risk={} reports={} neighbors={:?}",
            agent.name, agent.belief, agent.risk_level, agent.symptom_count, agent.neighbors
        );
    }

    Ok(())
}
