//! The adapter contract every backend implements.

use crate::api::{Generation, SamplingOptions};
use crate::error::Result;
use async_trait::async_trait;

/// A text-generation backend that answers a batch of prompts.
///
/// Both operations are length- and order-preserving: output `i` is derived
/// solely from prompt `i`. Prompts are processed one at a time, and a failure
/// on any prompt aborts the whole call.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Stable identifier of the backend (e.g. `"http/ollama"`, `"mock/pattern"`).
    fn backend_id(&self) -> &'static str;

    /// Generate one [`Generation`] per prompt, submitting prompts as given.
    async fn generate(
        &self,
        prompts: &[String],
        options: &SamplingOptions,
    ) -> Result<Vec<Generation>>;

    /// Return one completion string per prompt.
    ///
    /// The default delegates to [`generate`](Self::generate) and keeps only the
    /// text. Backends that normalize prompts first override this.
    async fn completions(
        &self,
        prompts: &[String],
        options: &SamplingOptions,
    ) -> Result<Vec<String>> {
        let generations = self.generate(prompts, options).await?;
        Ok(generations.into_iter().map(|g| g.text).collect())
    }
}

/// Strip leading and trailing whitespace from every prompt.
pub(crate) fn strip_prompts(prompts: &[String]) -> Vec<String> {
    prompts.iter().map(|p| p.trim().to_string()).collect()
}
