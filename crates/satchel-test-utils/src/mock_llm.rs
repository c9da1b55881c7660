// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM collaborator for deterministic testing.
//!
//! `MockLlm` implements [`LlmClient`] with pre-configured responses,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use satchel_core::{LlmClient, SatchelError};

enum Scripted {
    Respond(String),
    Fail(String),
}

/// A mock LLM client that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue; failures can be interleaved to
/// exercise retry and circuit-breaker paths. When the queue is empty, an
/// empty JSON array is returned.
pub struct MockLlm {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: AtomicU32,
}

impl MockLlm {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: AtomicU32::new(0),
        }
    }

    /// Create a mock pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let mock = Self::new();
        {
            let mut script = mock.script.try_lock().expect("fresh mutex");
            for r in responses {
                script.push_back(Scripted::Respond(r));
            }
        }
        mock
    }

    /// Queue a successful response.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Respond(text.into()));
    }

    /// Queue a transient failure.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Fail(message.into()));
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, SatchelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().await.pop_front() {
            Some(Scripted::Respond(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(SatchelError::ExternalService {
                collaborator: "llm".into(),
                message,
                source: None,
            }),
            None => Ok("[]".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_response_when_script_empty() {
        let llm = MockLlm::new();
        assert_eq!(llm.complete("prompt").await.unwrap(), "[]");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn scripted_responses_in_order() {
        let llm = MockLlm::with_responses(vec!["first".into(), "second".into()]);
        assert_eq!(llm.complete("p").await.unwrap(), "first");
        assert_eq!(llm.complete("p").await.unwrap(), "second");
        assert_eq!(llm.complete("p").await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn scripted_failure_surfaces_as_external_error() {
        let llm = MockLlm::new();
        llm.push_failure("503").await;
        llm.push_response("ok").await;

        assert!(matches!(
            llm.complete("p").await,
            Err(SatchelError::ExternalService { .. })
        ));
        assert_eq!(llm.complete("p").await.unwrap(), "ok");
        assert_eq!(llm.call_count(), 2);
    }
}
