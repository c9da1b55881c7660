// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the extraction orchestrator: idempotence,
//! duplicate suppression, LLM fallback, retry exhaustion, and the
//! dead-letter path.

use std::sync::Arc;

use satchel_config::{SatchelConfig, load_config_from_str};
use satchel_core::{EventKind, Outcome, RawMessage, RecordStore};
use satchel_pipeline::{Collaborators, Pipeline};
use satchel_store::SqliteRecordStore;
use satchel_test_utils::{FailureMode, MemoryRecordStore, MockCalendar, MockLlm, MockTasks};

fn message(id: &str, text: &str) -> RawMessage {
    RawMessage {
        id: id.into(),
        chat_id: "chat-1".into(),
        sender_id: "sender-1".into(),
        text: text.into(),
        // Wednesday; "friday" resolves two days out.
        received_at: "2026-03-04T12:00:00Z".parse().unwrap(),
    }
}

/// Fast retries so exhaustion tests don't sleep for real.
fn test_config() -> SatchelConfig {
    load_config_from_str(
        r#"
        [retry]
        max_attempts = 2
        backoff_base_ms = 5

        [rate_limit]
        max_per_interval = 100
        "#,
    )
    .unwrap()
}

struct Fixture {
    store: Arc<MemoryRecordStore>,
    calendar: Arc<MockCalendar>,
    tasks: Arc<MockTasks>,
    llm: Arc<MockLlm>,
    pipeline: Pipeline,
}

fn fixture_with(config: SatchelConfig, calendar_mode: FailureMode) -> Fixture {
    let store = Arc::new(MemoryRecordStore::new());
    let calendar = Arc::new(MockCalendar::with_failures(calendar_mode));
    let tasks = Arc::new(MockTasks::new());
    let llm = Arc::new(MockLlm::new());

    let pipeline = Pipeline::new(
        &config,
        Collaborators {
            store: store.clone(),
            llm: Some(llm.clone()),
            calendar: calendar.clone(),
            tasks: tasks.clone(),
        },
    );

    Fixture {
        store,
        calendar,
        tasks,
        llm,
        pipeline,
    }
}

fn fixture() -> Fixture {
    fixture_with(test_config(), FailureMode::Never)
}

#[tokio::test]
async fn processing_twice_is_idempotent() {
    let f = fixture();
    let m = message("m1", "Math exam Friday 2pm");

    assert_eq!(f.pipeline.process(&m).await, Outcome::Dispatched);
    assert_eq!(f.pipeline.process(&m).await, Outcome::DuplicateSkipped);

    assert_eq!(f.store.records().await.len(), 1);
    assert_eq!(f.calendar.created().len(), 1, "no double dispatch");
}

#[tokio::test]
async fn rephrased_message_is_flagged_duplicate() {
    let f = fixture();

    let first = f
        .pipeline
        .process(&message("m1", "Math exam Friday 2pm"))
        .await;
    assert_eq!(first, Outcome::Dispatched);

    let second = f
        .pipeline
        .process(&message("m2", "math exam on friday at 2:00 pm"))
        .await;
    assert_eq!(second, Outcome::DuplicateSkipped);

    assert_eq!(f.store.records().await.len(), 1);
    assert_eq!(f.calendar.created().len(), 1);
}

#[tokio::test]
async fn filtered_message_is_a_noop_success() {
    let f = fixture();

    let outcome = f.pipeline.process(&message("m1", "")).await;
    assert_eq!(outcome, Outcome::Dispatched);

    let outcome = f
        .pipeline
        .process(&message("m2", "Hello, how are you doing?"))
        .await;
    assert_eq!(outcome, Outcome::Dispatched);

    assert!(f.store.records().await.is_empty());
    assert_eq!(f.calendar.call_count(), 0);
    assert_eq!(f.llm.call_count(), 0);
}

#[tokio::test]
async fn llm_fallback_runs_exactly_once_when_pattern_is_empty() {
    let f = fixture();
    f.llm
        .push_response(
            r#"[{"title": "Chemistry homework", "event_type": "assignment",
                 "due_date": "2026-03-10T00:00:00", "confidence": 0.8}]"#,
        )
        .await;

    // School keyword but no recognizable date pattern: the pattern
    // extractor yields nothing and the LLM decides.
    let outcome = f
        .pipeline
        .process(&message("m1", "chemistry homework everyone, soonish"))
        .await;

    assert_eq!(outcome, Outcome::Dispatched);
    assert_eq!(f.llm.call_count(), 1);

    let records = f.store.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, EventKind::Assignment);
    // Assignments get both a calendar event (dated) and a task.
    assert_eq!(f.calendar.created().len(), 1);
    assert_eq!(f.tasks.created().len(), 1);
}

#[tokio::test]
async fn confident_pattern_result_skips_the_llm() {
    let f = fixture();

    let outcome = f
        .pipeline
        .process(&message("m1", "History exam on Friday at 2pm"))
        .await;

    assert_eq!(outcome, Outcome::Dispatched);
    assert_eq!(f.llm.call_count(), 0, "pattern result was confident enough");
}

#[tokio::test]
async fn llm_disabled_in_config_is_never_called() {
    let config = load_config_from_str(
        r#"
        [extraction]
        llm_enabled = false

        [retry]
        backoff_base_ms = 5
        "#,
    )
    .unwrap();
    let f = fixture_with(config, FailureMode::Never);

    let outcome = f
        .pipeline
        .process(&message("m1", "chemistry homework everyone, soonish"))
        .await;

    // No pattern match, no LLM: nothing extracted, no-op success.
    assert_eq!(outcome, Outcome::Dispatched);
    assert_eq!(f.llm.call_count(), 0);
    assert!(f.store.records().await.is_empty());
}

#[tokio::test]
async fn transient_dispatch_failure_is_retried_to_success() {
    let f = fixture_with(test_config(), FailureMode::FirstN(1));

    let outcome = f
        .pipeline
        .process(&message("m1", "Math exam Friday 2pm"))
        .await;

    assert_eq!(outcome, Outcome::Dispatched);
    assert_eq!(f.calendar.call_count(), 2, "one failure, one retry");
    assert_eq!(f.store.records().await.len(), 1);
    assert_eq!(f.store.dead_letter_count().await.unwrap(), 0);
}

#[tokio::test]
async fn exhausted_dispatch_dead_letters_the_message() {
    let f = fixture_with(test_config(), FailureMode::Always);
    let m = message("m1", "Math exam Friday 2pm");

    let outcome = f.pipeline.process(&m).await;
    assert_eq!(outcome, Outcome::DeadLettered);

    // max_attempts = 2: both attempts hit the collaborator.
    assert_eq!(f.calendar.call_count(), 2);

    // Exactly one dead-letter entry, zero processed records.
    assert_eq!(f.store.dead_letter_count().await.unwrap(), 1);
    assert!(f.store.records().await.is_empty());

    let parked = f.store.recent_dead_letters(10).await.unwrap();
    assert_eq!(parked[0].message.id, "m1");
    assert_eq!(parked[0].attempt_count, 2);
    assert!(parked[0].last_error.contains("calendar"));
}

#[tokio::test]
async fn failed_message_can_be_reprocessed_after_recovery() {
    // First run exhausts retries; nothing is recorded, so a replay of the
    // same message against a healthy collaborator succeeds.
    let config = test_config();
    let store = Arc::new(MemoryRecordStore::new());

    let broken = Pipeline::new(
        &config,
        Collaborators {
            store: store.clone(),
            llm: None,
            calendar: Arc::new(MockCalendar::with_failures(FailureMode::Always)),
            tasks: Arc::new(MockTasks::new()),
        },
    );
    let m = message("m1", "Math exam Friday 2pm");
    assert_eq!(broken.process(&m).await, Outcome::DeadLettered);
    assert!(store.records().await.is_empty());

    let healthy = Pipeline::new(
        &config,
        Collaborators {
            store: store.clone(),
            llm: None,
            calendar: Arc::new(MockCalendar::new()),
            tasks: Arc::new(MockTasks::new()),
        },
    );
    assert_eq!(healthy.process(&m).await, Outcome::Dispatched);
    assert_eq!(store.records().await.len(), 1);
}

#[tokio::test]
async fn llm_failure_after_retries_dead_letters() {
    let f = fixture();
    f.llm.push_failure("upstream 503").await;
    f.llm.push_failure("upstream 503").await;

    let outcome = f
        .pipeline
        .process(&message("m1", "chemistry homework everyone, soonish"))
        .await;

    assert_eq!(outcome, Outcome::DeadLettered);
    assert_eq!(f.llm.call_count(), 2, "retried once, then exhausted");
    assert_eq!(f.store.dead_letter_count().await.unwrap(), 1);
}

#[tokio::test]
async fn malformed_llm_output_is_not_an_error() {
    let f = fixture();
    f.llm.push_response("sorry, I can't help with that").await;

    let outcome = f
        .pipeline
        .process(&message("m1", "chemistry homework everyone, soonish"))
        .await;

    // Validation failure degrades to zero candidates: no retry, no
    // dead letter, no dispatch.
    assert_eq!(outcome, Outcome::Dispatched);
    assert_eq!(f.llm.call_count(), 1);
    assert_eq!(f.store.dead_letter_count().await.unwrap(), 0);
    assert!(f.store.records().await.is_empty());
}

#[tokio::test]
async fn rate_limited_sender_is_dropped_silently() {
    let config = load_config_from_str(
        r#"
        [rate_limit]
        max_per_interval = 1
        interval_secs = 3600

        [retry]
        backoff_base_ms = 5
        "#,
    )
    .unwrap();
    let f = fixture_with(config, FailureMode::Never);

    assert_eq!(
        f.pipeline
            .process(&message("m1", "Math exam Friday 2pm"))
            .await,
        Outcome::Dispatched
    );
    // Same sender, over the limit: dropped before any extraction.
    assert_eq!(
        f.pipeline
            .process(&message("m2", "History exam on Monday at 9am"))
            .await,
        Outcome::Dispatched
    );

    assert_eq!(f.store.records().await.len(), 1);
    assert_eq!(f.calendar.created().len(), 1);
}

#[tokio::test]
async fn class_without_assignment_gets_no_task() {
    let f = fixture();

    f.pipeline
        .process(&message("m1", "CS101 lecture tomorrow at 10am in room 205"))
        .await;

    assert_eq!(f.calendar.created().len(), 1);
    assert!(f.tasks.created().is_empty(), "tasks are for assignments only");
}

#[tokio::test]
async fn works_against_the_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pipeline.db");
    let store = Arc::new(
        SqliteRecordStore::open(db_path.to_str().unwrap())
            .await
            .unwrap(),
    );

    let calendar = Arc::new(MockCalendar::new());
    let pipeline = Pipeline::new(
        &test_config(),
        Collaborators {
            store: store.clone(),
            llm: None,
            calendar: calendar.clone(),
            tasks: Arc::new(MockTasks::new()),
        },
    );

    let m = message("m1", "Math assignment due next Monday at 11:59 PM");
    assert_eq!(pipeline.process(&m).await, Outcome::Dispatched);
    assert_eq!(pipeline.process(&m).await, Outcome::DuplicateSkipped);

    // The fingerprint survives in SQLite across pipeline instances.
    let second = Pipeline::new(
        &test_config(),
        Collaborators {
            store: store.clone(),
            llm: None,
            calendar: Arc::new(MockCalendar::new()),
            tasks: Arc::new(MockTasks::new()),
        },
    );
    assert_eq!(
        second.process(&m).await,
        Outcome::DuplicateSkipped,
        "dedup state is durable, not per-pipeline"
    );

    store.close().await.unwrap();
}
