//! Oversight behavior observed through full task runs.

use std::time::Duration;

use crate::fixtures;
use serde_json::Value;
use tether::{ExecutionMode, TaskStatus};

const GENEROUS: Duration = Duration::from_secs(30);

#[tokio::test]
async fn human_led_without_handler_withholds_every_action() {
    let orch = fixtures::orchestrator();
    let task = orch.submit(fixtures::simple_task().mode("human_led")).await;

    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();

    assert_eq!(result.status, TaskStatus::Completed);
    assert_eq!(result.mode, ExecutionMode::HumanLed);
    // Confidence 95 would auto-execute in any other mode; human-led
    // routes everything to approval, and with nobody to approve, no
    // action is taken.
    assert_eq!(
        result.metadata.get("actions_taken").and_then(Value::as_u64),
        Some(0)
    );
    assert_eq!(
        result.metadata.get("actions_held").and_then(Value::as_u64),
        Some(result.resolution_steps.len() as u64)
    );

    let entries = orch.audit_log(Some(&task.id));
    assert!(entries.iter().any(|e| e.event == "approval_requested"));
    assert!(!entries.iter().any(|e| e.event == "action_executed"));
}

#[tokio::test]
async fn human_led_with_approving_handler_takes_actions() {
    let orch = fixtures::approving_orchestrator();
    let task = orch.submit(fixtures::simple_task().mode("human_led")).await;

    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();

    assert_eq!(
        result.metadata.get("actions_taken").and_then(Value::as_u64),
        Some(result.resolution_steps.len() as u64)
    );
    let entries = orch.audit_log(Some(&task.id));
    assert!(entries.iter().any(|e| e.event == "approval_granted"));
    assert!(entries.iter().any(|e| e.event == "action_executed"));
    // Everything was resolved synchronously; nothing is left pending.
    assert_eq!(orch.harness().approvals().pending_count(), 0);
}

#[tokio::test]
async fn rejecting_handler_holds_actions_and_audits_rejections() {
    let orch = fixtures::rejecting_orchestrator();
    let task = orch.submit(fixtures::simple_task().mode("human_led")).await;

    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();

    assert_eq!(
        result.metadata.get("actions_taken").and_then(Value::as_u64),
        Some(0)
    );
    let entries = orch.audit_log(Some(&task.id));
    assert!(entries.iter().any(|e| e.event == "approval_rejected"));
    assert!(!entries.iter().any(|e| e.event == "action_executed"));
}

#[tokio::test]
async fn pending_approvals_are_torn_down_with_the_context() {
    let orch = fixtures::orchestrator();
    let task = orch.submit(fixtures::simple_task().mode("human_led")).await;
    orch.await_result(task.id, Some(GENEROUS)).await.unwrap();

    // Three approval requests were filed during execution; context
    // teardown cleared them from the registry.
    let entries = orch.audit_log(Some(&task.id));
    let requested = entries
        .iter()
        .filter(|e| e.event == "approval_requested")
        .count();
    assert_eq!(requested, 3);
    assert_eq!(orch.harness().approvals().pending_count(), 0);
    // The request history stays in the audit log.
    assert!(entries.iter().any(|e| e.event == "context_cleaned_up"));
}

#[tokio::test]
async fn review_band_actions_are_flagged_for_review() {
    // The micro-swarm playbook runs at confidence 88, inside the
    // execute-review band of the default thresholds.
    let orch = fixtures::orchestrator();
    let task = orch.submit(fixtures::incident_task()).await;

    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();
    assert_eq!(result.mode, ExecutionMode::MicroSwarm);

    let entries = orch.audit_log(Some(&task.id));
    let flagged = entries
        .iter()
        .filter(|e| e.event == "action_flagged_for_review")
        .count();
    assert_eq!(flagged, result.resolution_steps.len());
    // Flagged actions still executed.
    let executed = entries
        .iter()
        .filter(|e| e.event == "action_executed")
        .count();
    assert_eq!(executed, result.resolution_steps.len());
}

#[tokio::test]
async fn every_gated_action_is_audited_with_confidence() {
    let orch = fixtures::orchestrator();
    let task = orch.submit(fixtures::simple_task()).await;
    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();

    let entries = orch.audit_log(Some(&task.id));
    let gated: Vec<_> = entries.iter().filter(|e| e.event == "action_gated").collect();
    assert_eq!(gated.len(), result.resolution_steps.len());
    for entry in gated {
        assert!(entry.attributes.contains_key("action_id"));
        assert!(entry.attributes.contains_key("confidence"));
        assert!(entry.attributes.contains_key("confidence_level"));
    }
}
