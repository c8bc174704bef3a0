//! Uniform prompt adapters over local, serverless, HTTP-daemon, and mock
//! text-generation backends, plus a rubric judge built on top of them.
//!
//! # Key concepts
//!
//! - **[`BackendAdapter`](traits::BackendAdapter)**: the one contract every
//!   backend implements: `generate` and `completions` over an ordered batch of
//!   prompts, one output per prompt, in input order.
//! - **Backends**: [`MockAdapter`](provider::MockAdapter) (always available)
//!   and, behind Cargo features, the Ollama daemon adapter, the remote
//!   serverless function adapter, and the in-process mistral.rs engine.
//! - **[`BackendSpec`](api::BackendSpec)**: a declarative catalog entry that
//!   [`build_adapter`](factory::build_adapter) turns into a ready adapter. A
//!   backend missing from the build fails here with
//!   [`AdapterError::Init`](error::AdapterError::Init).
//! - **[`Judge`](judge::Judge)**: absolute (1-5) and relative (A/B) grading with
//!   `[RESULT]` reply parsing.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use judge_relay::api::{BackendSpec, SamplingOptions, catalog_from_str};
//! use judge_relay::factory::{build_adapter, select};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = catalog_from_str(
//!     r#"[{"alias": "judge/ollama", "backend": "http_daemon", "model": "prometheus"}]"#,
//! )?;
//! let adapter = build_adapter(select(&catalog, "judge/ollama")?).await?;
//!
//! let prompts = vec!["Why is the sky blue?".to_string()];
//! let completions = adapter
//!     .completions(&prompts, &SamplingOptions::new().with("temperature", 0.0))
//!     .await?;
//! assert_eq!(completions.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod error;
pub mod factory;
pub mod instrument;
pub mod judge;
pub mod provider;
pub mod traits;
