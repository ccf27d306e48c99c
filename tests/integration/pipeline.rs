//! End-to-end task lifecycle tests.

use std::time::Duration;

use crate::fixtures;
use tether::{Error, ExecutionMode, Priority, TaskId, TaskSpec, TaskStatus};

const GENEROUS: Duration = Duration::from_secs(30);

#[tokio::test]
async fn simple_task_completes_as_single_agent() {
    let orch = fixtures::orchestrator();
    let task = orch.submit(fixtures::simple_task()).await;

    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();

    assert_eq!(result.status, TaskStatus::Completed);
    assert_eq!(result.mode, ExecutionMode::SingleAgent);
    assert!(result.confidence > 0.0);
    assert!(!result.resolution_steps.is_empty());
    assert!(result.execution_time_ms > 0);
    assert!(result.summary.contains("Password reset request"));
}

#[tokio::test]
async fn incident_task_gets_a_swarm() {
    let orch = fixtures::orchestrator();
    let task = orch.submit(fixtures::incident_task()).await;

    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();

    assert_eq!(result.status, TaskStatus::Completed);
    assert_eq!(result.mode, ExecutionMode::MicroSwarm);
    assert!(result.agents_used.len() >= 2);

    let state = orch.get_state(task.id).await.unwrap();
    let score = state.complexity.expect("complexity recorded");
    assert!(score.domain_count >= 2);
    assert!(score.overall_score >= 4);
}

#[tokio::test]
async fn await_result_unknown_task_is_not_found() {
    let orch = fixtures::orchestrator();
    let err = orch
        .await_result(TaskId::new(), Some(GENEROUS))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TaskNotFound(_)));
}

#[tokio::test]
async fn short_timeout_expires_but_pipeline_survives() {
    let orch = fixtures::orchestrator();
    let task = orch.submit(fixtures::simple_task()).await;

    let err = orch
        .await_result(task.id, Some(Duration::from_millis(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));

    // The timeout only abandoned the wait. The task is still known and
    // still driving toward a terminal status.
    let status = orch.get_status(task.id).await.unwrap();
    assert!(matches!(
        status,
        TaskStatus::Pending
            | TaskStatus::Analyzing
            | TaskStatus::Executing
            | TaskStatus::Completed
    ));

    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();
    assert_eq!(result.status, TaskStatus::Completed);
}

#[tokio::test]
async fn explicit_mode_override_wins_over_recommendation() {
    let orch = fixtures::orchestrator();
    let task = orch
        .submit(fixtures::simple_task().mode("full_swarm"))
        .await;

    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();
    assert_eq!(result.mode, ExecutionMode::FullSwarm);
}

#[tokio::test]
async fn unknown_mode_override_fails_the_task_not_the_process() {
    let orch = fixtures::orchestrator();
    let bad = orch.submit(fixtures::simple_task().mode("warp_speed")).await;
    let good = orch.submit(fixtures::simple_task()).await;

    let failed = orch.await_result(bad.id, Some(GENEROUS)).await.unwrap();
    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(failed.confidence, 0.0);
    assert!(failed.resolution_steps.is_empty());
    assert!(failed.summary.contains("warp_speed"));

    // The concurrently running healthy task is unaffected.
    let completed = orch.await_result(good.id, Some(GENEROUS)).await.unwrap();
    assert_eq!(completed.status, TaskStatus::Completed);
}

#[tokio::test]
async fn critical_priority_is_reflected_in_risk() {
    let orch = fixtures::orchestrator();
    let task = orch
        .submit(
            TaskSpec::new("Routine cleanup")
                .description("tidy up stale sessions")
                .priority(Priority::Critical),
        )
        .await;
    orch.await_result(task.id, Some(GENEROUS)).await.unwrap();

    let state = orch.get_state(task.id).await.unwrap();
    let score = state.complexity.expect("complexity recorded");
    assert!(score.risk_level.is_elevated());
}

#[tokio::test]
async fn concurrent_submissions_all_complete() {
    let orch = fixtures::orchestrator();
    let mut ids = Vec::new();
    for i in 0..5 {
        let task = orch
            .submit(TaskSpec::new(format!("Bulk task {}", i)))
            .await;
        ids.push(task.id);
    }

    for id in ids {
        let result = orch.await_result(id, Some(GENEROUS)).await.unwrap();
        assert_eq!(result.status, TaskStatus::Completed);
    }
}

#[tokio::test]
async fn multiple_waiters_observe_the_same_completion() {
    let orch = std::sync::Arc::new(fixtures::orchestrator());
    let task = orch.submit(fixtures::simple_task()).await;

    let a = {
        let orch = std::sync::Arc::clone(&orch);
        let id = task.id;
        tokio::spawn(async move { orch.await_result(id, Some(GENEROUS)).await })
    };
    let b = {
        let orch = std::sync::Arc::clone(&orch);
        let id = task.id;
        tokio::spawn(async move { orch.await_result(id, Some(GENEROUS)).await })
    };

    let first = a.await.unwrap().unwrap();
    let second = b.await.unwrap().unwrap();
    assert_eq!(first.task_id, second.task_id);
    assert_eq!(first.summary, second.summary);
}

#[tokio::test]
async fn audit_trail_outlives_the_task() {
    let orch = fixtures::orchestrator();
    let task = orch.submit(fixtures::simple_task()).await;
    orch.await_result(task.id, Some(GENEROUS)).await.unwrap();

    // The context is gone; the audit history is not.
    assert!(orch.harness().get_context(&task.id).is_none());
    let entries = orch.audit_log(Some(&task.id));
    let events: Vec<&str> = entries.iter().map(|e| e.event.as_str()).collect();
    assert!(events.contains(&"context_created"));
    assert!(events.contains(&"action_gated"));
    assert!(events.contains(&"action_executed"));
    assert!(events.contains(&"context_cleaned_up"));

    // Insertion order: the context opens before any gating and closes
    // after everything else.
    assert_eq!(events.first(), Some(&"context_created"));
    assert_eq!(events.last(), Some(&"context_cleaned_up"));
}

#[tokio::test]
async fn submitted_task_carries_defaults() {
    let orch = fixtures::orchestrator();
    let task = orch.submit(TaskSpec::default()).await;
    assert_eq!(task.title, "Untitled Task");
    assert_eq!(task.priority, Priority::Medium);

    let result = orch.await_result(task.id, Some(GENEROUS)).await.unwrap();
    assert_eq!(result.status, TaskStatus::Completed);
}
