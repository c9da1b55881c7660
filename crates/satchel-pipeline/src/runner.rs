// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded-concurrency intake loop with drain-on-cancel.
//!
//! One task per message, fan-out capped by a semaphore. Cancellation stops
//! admissions immediately but lets in-flight pipeline runs finish their
//! current work: a drain, not an abort.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use satchel_core::RawMessage;

use crate::Pipeline;

/// Drives a [`Pipeline`] from a message channel.
pub struct PipelineRunner {
    pipeline: Arc<Pipeline>,
    max_in_flight: usize,
}

impl PipelineRunner {
    pub fn new(pipeline: Arc<Pipeline>, max_in_flight: usize) -> Self {
        Self {
            pipeline,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Consume messages until the channel closes or `cancel` fires, then
    /// drain in-flight runs before returning.
    pub async fn run(&self, mut rx: mpsc::Receiver<RawMessage>, cancel: CancellationToken) {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut in_flight: JoinSet<()> = JoinSet::new();

        info!(max_in_flight = self.max_in_flight, "pipeline runner started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, no new messages admitted");
                    break;
                }
                // Reap finished runs so the join set doesn't grow unbounded.
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                msg = rx.recv() => {
                    let Some(message) = msg else {
                        debug!("message channel closed");
                        break;
                    };

                    // Back-pressure: wait for a slot, but keep honoring
                    // cancellation while waiting.
                    let permit = tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("shutdown during admission wait, dropping message");
                            break;
                        }
                        permit = semaphore.clone().acquire_owned() => {
                            permit.expect("semaphore never closed")
                        }
                    };

                    let pipeline = self.pipeline.clone();
                    in_flight.spawn(async move {
                        let outcome = pipeline.process(&message).await;
                        debug!(message_id = message.id.as_str(), ?outcome, "run complete");
                        drop(permit);
                    });
                }
            }
        }

        let remaining = in_flight.len();
        if remaining > 0 {
            info!(count = remaining, "draining in-flight pipeline runs");
        }
        while in_flight.join_next().await.is_some() {}
        info!("pipeline runner stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use satchel_config::SatchelConfig;
    use satchel_core::Outcome;
    use satchel_test_utils::{MemoryRecordStore, MockCalendar, MockTasks};

    use crate::Collaborators;

    fn message(id: &str, text: &str) -> RawMessage {
        RawMessage {
            id: id.into(),
            chat_id: "chat-1".into(),
            sender_id: format!("sender-{id}"),
            text: text.into(),
            received_at: "2026-03-04T12:00:00Z".parse().unwrap(),
        }
    }

    fn pipeline(store: Arc<MemoryRecordStore>, calendar: Arc<MockCalendar>) -> Arc<Pipeline> {
        let config = SatchelConfig::default();
        Arc::new(Pipeline::new(
            &config,
            Collaborators {
                store,
                llm: None,
                calendar,
                tasks: Arc::new(MockTasks::new()),
            },
        ))
    }

    #[tokio::test]
    async fn processes_messages_until_channel_closes() {
        let store = Arc::new(MemoryRecordStore::new());
        let calendar = Arc::new(MockCalendar::new());
        let runner = PipelineRunner::new(pipeline(store.clone(), calendar.clone()), 4);

        let (tx, rx) = mpsc::channel(16);
        tx.send(message("m1", "Math exam Friday 2pm")).await.unwrap();
        tx.send(message("m2", "History exam on Monday at 9am"))
            .await
            .unwrap();
        drop(tx);

        runner.run(rx, CancellationToken::new()).await;

        assert_eq!(store.records().await.len(), 2);
        assert_eq!(calendar.created().len(), 2);
    }

    #[tokio::test]
    async fn cancellation_stops_admission_and_drains() {
        let store = Arc::new(MemoryRecordStore::new());
        let calendar = Arc::new(MockCalendar::new());
        let runner = PipelineRunner::new(pipeline(store.clone(), calendar.clone()), 2);

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(16);
        tx.send(message("m1", "Math exam Friday 2pm")).await.unwrap();

        let cancel_clone = cancel.clone();
        let drive = tokio::spawn(async move { runner.run(rx, cancel_clone).await });

        // Give the in-flight message a moment, then shut down.
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        drive.await.unwrap();

        // The admitted message finished before the runner returned.
        assert_eq!(store.records().await.len(), 1);
        drop(tx);
    }

    #[tokio::test]
    async fn duplicate_messages_across_workers_yield_one_record() {
        let store = Arc::new(MemoryRecordStore::new());
        let calendar = Arc::new(MockCalendar::new());
        let p = pipeline(store.clone(), calendar.clone());
        let runner = PipelineRunner::new(p.clone(), 8);

        let (tx, rx) = mpsc::channel(16);
        // Same commitment, different senders racing through the pool.
        for i in 0..4 {
            let mut m = message(&format!("m{i}"), "Math exam Friday 2pm");
            m.sender_id = format!("sender-{i}");
            tx.send(m).await.unwrap();
        }
        drop(tx);

        runner.run(rx, CancellationToken::new()).await;

        assert_eq!(
            store.records().await.len(),
            1,
            "fingerprint uniqueness must hold across concurrent workers"
        );
    }

    #[tokio::test]
    async fn outcome_is_reported_per_message() {
        let store = Arc::new(MemoryRecordStore::new());
        let calendar = Arc::new(MockCalendar::new());
        let p = pipeline(store, calendar);

        let first = p.process(&message("m1", "Math exam Friday 2pm")).await;
        assert_eq!(first, Outcome::Dispatched);

        let second = p.process(&message("m2", "Math exam Friday 2pm")).await;
        assert_eq!(second, Outcome::DuplicateSkipped);
    }
}
