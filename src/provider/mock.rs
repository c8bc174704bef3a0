use crate::api::{Generation, SamplingOptions};
use crate::error::Result;
use crate::traits::BackendAdapter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

/// Deterministic stand-in backend for tests.
///
/// Replies are derived from the prompt text alone:
///
/// | Prompt contains | Reply |
/// |-----------------|-------|
/// | `"A or B"` | `"Hello [RESULT] A"` |
/// | `"1 and 5"` | `"Hello [RESULT] 5"` |
/// | anything else | `"Response to: " + prompt` |
///
/// The first matching row wins. Sampling options are accepted and ignored.
#[derive(Debug, Default)]
pub struct MockAdapter {
    call_count: AtomicU32,
}

impl MockAdapter {
    pub fn new() -> Self {
        tracing::debug!("Mock backend initialized");
        Self::default()
    }

    /// Number of `generate` calls served so far (including those made through
    /// `completions`).
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The reply the mock gives for a single prompt.
    pub fn reply_for(prompt: &str) -> String {
        if prompt.contains("A or B") {
            "Hello [RESULT] A".to_string()
        } else if prompt.contains("1 and 5") {
            "Hello [RESULT] 5".to_string()
        } else {
            format!("Response to: {}", prompt)
        }
    }
}

#[async_trait]
impl BackendAdapter for MockAdapter {
    fn backend_id(&self) -> &'static str {
        "mock/pattern"
    }

    async fn generate(
        &self,
        prompts: &[String],
        _options: &SamplingOptions,
    ) -> Result<Vec<Generation>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(prompts
            .iter()
            .map(|p| Generation::text(Self::reply_for(p)))
            .collect())
    }

    async fn completions(
        &self,
        prompts: &[String],
        options: &SamplingOptions,
    ) -> Result<Vec<String>> {
        let generations = self.generate(prompts, options).await?;
        Ok(generations.into_iter().map(|g| g.text).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn relative_marker_wins_over_absolute_marker() {
        assert_eq!(
            MockAdapter::reply_for("pick A or B, score 1 and 5"),
            "Hello [RESULT] A"
        );
    }

    #[test]
    fn fallback_echoes_prompt_verbatim() {
        assert_eq!(MockAdapter::reply_for("  hi "), "Response to:   hi ");
        assert_eq!(MockAdapter::reply_for(""), "Response to: ");
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert_eq!(MockAdapter::reply_for("a or b"), "Response to: a or b");
    }

    #[tokio::test]
    async fn completions_agree_with_generate() {
        let mock = MockAdapter::new();
        let batch = prompts(&["Choose A or B", "between 1 and 5", "other"]);
        let opts = SamplingOptions::new().with("temperature", 0.0);

        let generated: Vec<String> = mock
            .generate(&batch, &opts)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.text)
            .collect();
        let completed = mock.completions(&batch, &opts).await.unwrap();

        assert_eq!(generated, completed);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_output() {
        let mock = MockAdapter::new();
        let out = mock
            .completions(&[], &SamplingOptions::default())
            .await
            .unwrap();
        assert!(out.is_empty());
    }
}
