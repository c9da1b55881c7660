// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM collaborator trait.

use async_trait::async_trait;

use crate::error::SatchelError;

/// A language-model collaborator used for fallback extraction.
///
/// Implementations wrap whatever provider the host wires in; the pipeline
/// only sees prompt-in, text-out. Failures surface as
/// [`SatchelError::ExternalService`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a prompt and return the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, SatchelError>;
}
