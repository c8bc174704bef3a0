//! Backend selection: turn a [`BackendSpec`] into a ready adapter.
//!
//! Every backend has exactly one construction path, reached through
//! [`build_adapter`]. Before constructing, the factory checks that the backend
//! was compiled into this build and fails with [`AdapterError::Init`] if not,
//! so a missing dependency surfaces at construction rather than on first use.

use crate::api::{
    BackendConfig, BackendKind, BackendSpec, HttpDaemonConfig, LocalEngineConfig,
    RemoteFunctionConfig,
};
use crate::error::{AdapterError, Result};
use crate::instrument::InstrumentedAdapter;
use crate::provider::MockAdapter;
use crate::traits::BackendAdapter;
use std::sync::Arc;

/// Backends compiled into this build.
pub fn available_backends() -> Vec<BackendKind> {
    [
        BackendKind::Local,
        BackendKind::RemoteFunction,
        BackendKind::HttpDaemon,
        BackendKind::Mock,
    ]
    .into_iter()
    .filter(|kind| check_capability(*kind).is_ok())
    .collect()
}

/// Return `Ok(())` if `kind` can be constructed in this build, or the
/// initialization error naming what is missing.
pub fn check_capability(kind: BackendKind) -> Result<()> {
    let (available, dependency, backend, feature) = match kind {
        BackendKind::Local => (
            cfg!(feature = "backend-mistralrs"),
            "mistralrs",
            "local",
            "backend-mistralrs",
        ),
        BackendKind::RemoteFunction => (
            cfg!(feature = "backend-remote-function"),
            "reqwest",
            "remote_function",
            "backend-remote-function",
        ),
        BackendKind::HttpDaemon => (
            cfg!(feature = "backend-ollama"),
            "reqwest",
            "http_daemon",
            "backend-ollama",
        ),
        BackendKind::Mock => return Ok(()),
    };
    if available {
        Ok(())
    } else {
        Err(AdapterError::Init {
            dependency,
            backend,
            feature,
        })
    }
}

/// Validate `spec`, check the backend is available, construct it, and wrap it
/// in an [`InstrumentedAdapter`] labelled with the spec's alias.
pub async fn build_adapter(spec: &BackendSpec) -> Result<Arc<dyn BackendAdapter>> {
    spec.validate()?;
    check_capability(spec.kind())?;

    let inner: Arc<dyn BackendAdapter> = match &spec.backend {
        BackendConfig::Local(cfg) => build_local(cfg).await?,
        BackendConfig::RemoteFunction(cfg) => build_remote_function(cfg).await?,
        BackendConfig::HttpDaemon(cfg) => build_http_daemon(cfg)?,
        BackendConfig::Mock => Arc::new(MockAdapter::new()),
    };

    tracing::info!(alias = %spec.alias, backend = inner.backend_id(), "Adapter ready");
    Ok(Arc::new(InstrumentedAdapter::new(inner, spec.alias.clone())))
}

/// Find the spec for `alias` in a catalog.
pub fn select<'a>(catalog: &'a [BackendSpec], alias: &str) -> Result<&'a BackendSpec> {
    catalog
        .iter()
        .find(|spec| spec.alias == alias)
        .ok_or_else(|| AdapterError::Config(format!("Alias '{}' not found", alias)))
}

#[cfg(feature = "backend-mistralrs")]
async fn build_local(cfg: &LocalEngineConfig) -> Result<Arc<dyn BackendAdapter>> {
    use crate::provider::LocalEngineAdapter;
    Ok(Arc::new(LocalEngineAdapter::new(cfg.clone()).await?))
}

#[cfg(not(feature = "backend-mistralrs"))]
async fn build_local(_cfg: &LocalEngineConfig) -> Result<Arc<dyn BackendAdapter>> {
    Err(missing(BackendKind::Local))
}

#[cfg(feature = "backend-remote-function")]
async fn build_remote_function(cfg: &RemoteFunctionConfig) -> Result<Arc<dyn BackendAdapter>> {
    use crate::provider::RemoteFunctionAdapter;
    Ok(Arc::new(RemoteFunctionAdapter::from_config(cfg).await?))
}

#[cfg(not(feature = "backend-remote-function"))]
async fn build_remote_function(_cfg: &RemoteFunctionConfig) -> Result<Arc<dyn BackendAdapter>> {
    Err(missing(BackendKind::RemoteFunction))
}

#[cfg(feature = "backend-ollama")]
fn build_http_daemon(cfg: &HttpDaemonConfig) -> Result<Arc<dyn BackendAdapter>> {
    use crate::provider::OllamaAdapter;
    Ok(Arc::new(OllamaAdapter::from_config(cfg)?))
}

#[cfg(not(feature = "backend-ollama"))]
fn build_http_daemon(_cfg: &HttpDaemonConfig) -> Result<Arc<dyn BackendAdapter>> {
    Err(missing(BackendKind::HttpDaemon))
}

#[cfg(not(all(
    feature = "backend-mistralrs",
    feature = "backend-remote-function",
    feature = "backend-ollama"
)))]
fn missing(kind: BackendKind) -> AdapterError {
    check_capability(kind).err().unwrap_or_else(|| {
        AdapterError::Config(format!("Backend '{}' is unexpectedly available", kind))
    })
}
