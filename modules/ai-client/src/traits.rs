use async_trait::async_trait;

use crate::error::Result;

/// A single-shot chat model: one system instruction, one user prompt, one reply.
///
/// Implemented by [`crate::OpenAi`]; callers depend on the trait so tests can
/// swap in a scripted agent.
#[async_trait]
pub trait TextAgent: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
