use crate::api::{DEFAULT_DAEMON_URL, Generation, HttpDaemonConfig, SamplingOptions, TokenUsage};
use crate::error::{AdapterError, Result};
use crate::provider::remote_common::{check_http_status, decode_json};
use crate::traits::{BackendAdapter, strip_prompts};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

/// Adapter for a local [Ollama](https://github.com/ollama/ollama) daemon.
///
/// Each prompt becomes one blocking `POST <base>/api/generate` with the fixed
/// payload `{model, prompt, raw: true, stream: false}`. Sampling options are
/// not forwarded. There is no timeout and no retry: a non-2xx status or a
/// reply without a `response` string aborts the batch.
pub struct OllamaAdapter {
    client: Client,
    model: String,
    endpoint: String,
}

impl OllamaAdapter {
    /// Connect to the daemon at [`DEFAULT_DAEMON_URL`].
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_base_url(model, DEFAULT_DAEMON_URL)
    }

    /// Connect to the daemon at `base_url`. A trailing `/` is ignored.
    pub fn with_base_url(model: impl Into<String>, base_url: &str) -> Self {
        let model = model.into();
        let endpoint = format!("{}/api/generate", base_url.trim_end_matches('/'));
        tracing::info!(model = %model, endpoint = %endpoint, "Ollama backend initialized");
        Self {
            client: Client::new(),
            model,
            endpoint,
        }
    }

    /// Validate `config` and connect to its base URL, or the default one.
    pub fn from_config(config: &HttpDaemonConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_base_url(
            config.model.clone(),
            config.base_url.as_deref().unwrap_or(DEFAULT_DAEMON_URL),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST one prompt and return the decoded reply.
    async fn request(&self, prompt: &str) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "raw": true,
                "stream": false,
            }))
            .send()
            .await
            .map_err(|e| AdapterError::Api(e.to_string()))?;

        decode_json("Ollama", check_http_status("Ollama", response).await?).await
    }

    async fn request_all(&self, prompts: &[String]) -> Result<Vec<Generation>> {
        let mut results = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let reply = self.request(prompt).await?;
            results.push(into_generation(reply)?);
        }
        Ok(results)
    }
}

/// Extract the `response` field and token counts from a daemon reply.
fn into_generation(reply: Value) -> Result<Generation> {
    let text = reply
        .get("response")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AdapterError::MalformedResponse("Ollama reply has no 'response' string".to_string())
        })?
        .to_string();

    let prompt_tokens = reply.get("prompt_eval_count").and_then(Value::as_u64);
    let completion_tokens = reply.get("eval_count").and_then(Value::as_u64);
    let usage = match (prompt_tokens, completion_tokens) {
        (None, None) => None,
        (p, c) => {
            let p = p.unwrap_or(0) as usize;
            let c = c.unwrap_or(0) as usize;
            Some(TokenUsage {
                prompt_tokens: p,
                completion_tokens: c,
                total_tokens: p + c,
            })
        }
    };

    Ok(Generation {
        text,
        usage,
        raw: Some(reply),
    })
}

#[async_trait]
impl BackendAdapter for OllamaAdapter {
    fn backend_id(&self) -> &'static str {
        "http/ollama"
    }

    async fn generate(
        &self,
        prompts: &[String],
        options: &SamplingOptions,
    ) -> Result<Vec<Generation>> {
        if !options.is_empty() {
            tracing::debug!(
                model = %self.model,
                "Sampling options are not forwarded to the Ollama daemon"
            );
        }
        self.request_all(prompts).await
    }

    async fn completions(
        &self,
        prompts: &[String],
        options: &SamplingOptions,
    ) -> Result<Vec<String>> {
        let prompts = strip_prompts(prompts);
        let generations = self.generate(&prompts, options).await?;
        Ok(generations.into_iter().map(|g| g.text).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let adapter = OllamaAdapter::with_base_url("m", "http://127.0.0.1:9999/");
        assert_eq!(adapter.endpoint(), "http://127.0.0.1:9999/api/generate");
    }

    #[test]
    fn default_endpoint_is_local_daemon() {
        let adapter = OllamaAdapter::new("prometheus");
        assert_eq!(adapter.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(adapter.model(), "prometheus");
    }

    #[test]
    fn reply_without_response_is_malformed() {
        let err = into_generation(json!({"done": true})).unwrap_err();
        assert!(matches!(err, AdapterError::MalformedResponse(_)));
    }

    #[test]
    fn reply_with_counts_reports_usage() {
        let generation = into_generation(json!({
            "response": "ok",
            "prompt_eval_count": 12,
            "eval_count": 3
        }))
        .unwrap();
        assert_eq!(generation.text, "ok");
        let usage = generation.usage.unwrap();
        assert_eq!(usage.total_tokens, 15);
        assert!(generation.raw.is_some());
    }

    #[test]
    fn reply_without_counts_has_no_usage() {
        let generation = into_generation(json!({"response": "ok"})).unwrap();
        assert!(generation.usage.is_none());
    }
}
