//! Metrics and tracing around adapter calls.
//!
//! [`InstrumentedAdapter`] forwards every call unchanged. It never retries and
//! never applies a timeout; it only records what happened:
//!
//! - `adapter_call.total` counter, labels `alias`, `backend`, `op`, `status`
//! - `adapter_call.duration_seconds` histogram, labels `alias`, `backend`, `op`
//! - `adapter_call.prompts` counter, labels `alias`, `backend`, `op`

use crate::api::{Generation, SamplingOptions};
use crate::error::Result;
use crate::traits::BackendAdapter;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Wrapper around a [`BackendAdapter`] that adds metrics and a tracing span.
pub struct InstrumentedAdapter {
    pub inner: Arc<dyn BackendAdapter>,
    pub alias: String,
}

impl InstrumentedAdapter {
    pub fn new(inner: Arc<dyn BackendAdapter>, alias: impl Into<String>) -> Self {
        Self {
            inner,
            alias: alias.into(),
        }
    }

    fn record<T>(&self, op: &'static str, prompts: usize, start: Instant, res: &Result<T>) {
        let backend = self.inner.backend_id();
        let status = if res.is_ok() { "success" } else { "failure" };

        if let Err(e) = res {
            tracing::warn!(alias = %self.alias, backend, op, error = %e, "Adapter call failed");
        }

        metrics::histogram!(
            "adapter_call.duration_seconds",
            "alias" => self.alias.clone(),
            "backend" => backend,
            "op" => op
        )
        .record(start.elapsed().as_secs_f64());

        metrics::counter!(
            "adapter_call.total",
            "alias" => self.alias.clone(),
            "backend" => backend,
            "op" => op,
            "status" => status
        )
        .increment(1);

        metrics::counter!(
            "adapter_call.prompts",
            "alias" => self.alias.clone(),
            "backend" => backend,
            "op" => op
        )
        .increment(prompts as u64);
    }
}

#[async_trait]
impl BackendAdapter for InstrumentedAdapter {
    fn backend_id(&self) -> &'static str {
        self.inner.backend_id()
    }

    #[tracing::instrument(skip_all, fields(alias = %self.alias, prompts = prompts.len()))]
    async fn generate(
        &self,
        prompts: &[String],
        options: &SamplingOptions,
    ) -> Result<Vec<Generation>> {
        let start = Instant::now();
        let res = self.inner.generate(prompts, options).await;
        self.record("generate", prompts.len(), start, &res);
        res
    }

    #[tracing::instrument(skip_all, fields(alias = %self.alias, prompts = prompts.len()))]
    async fn completions(
        &self,
        prompts: &[String],
        options: &SamplingOptions,
    ) -> Result<Vec<String>> {
        let start = Instant::now();
        let res = self.inner.completions(prompts, options).await;
        self.record("completions", prompts.len(), start, &res);
        res
    }
}
