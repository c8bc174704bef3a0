//! Error types for judge-relay adapters.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Unified error type covering construction, transport, and reply failures.
///
/// No variant is retried anywhere in the crate: a failure on any prompt of a
/// batch aborts the whole batch call.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Invalid or missing configuration (bad alias, bad option value, etc.).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend cannot be constructed because a dependency it needs is not
    /// available in this build.
    #[error(
        "{dependency} is not available, to use the `{backend}` backend build with the `{feature}` feature"
    )]
    Init {
        /// The missing dependency (e.g. `"mistralrs"`, `"reqwest"`).
        dependency: &'static str,
        /// The backend that needed it (e.g. `"local"`).
        backend: &'static str,
        /// The Cargo feature that enables it.
        feature: &'static str,
    },

    /// The remote function was not registered under the given application.
    #[error("{tag} not found in {app}")]
    FunctionNotFound {
        /// The function tag that was looked up.
        tag: String,
        /// The application it was looked up in.
        app: String,
    },

    /// The local engine failed to load the model.
    #[error("Load error: {0}")]
    Load(String),

    /// An HTTP or transport-level failure, including non-2xx statuses.
    #[error("API error: {0}")]
    Api(String),

    /// The backend replied, but the reply lacks an expected field or cannot be
    /// decoded.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An error raised by the local engine while generating.
    #[error("Inference error: {0}")]
    Inference(String),
}

impl AdapterError {
    /// Returns `true` when the error was raised while constructing an adapter
    /// rather than while serving a call.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Init { .. } | Self::FunctionNotFound { .. } | Self::Load(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_error_names_dependency_and_backend() {
        let err = AdapterError::Init {
            dependency: "mistralrs",
            backend: "local",
            feature: "backend-mistralrs",
        };
        let msg = err.to_string();
        assert!(msg.contains("mistralrs"));
        assert!(msg.contains("`local`"));
        assert!(msg.contains("backend-mistralrs"));
        assert!(err.is_construction());
    }

    #[test]
    fn not_found_names_tag_and_app() {
        let err = AdapterError::FunctionNotFound {
            tag: "generate".to_string(),
            app: "prometheus".to_string(),
        };
        assert_eq!(err.to_string(), "generate not found in prometheus");
    }

    #[test]
    fn call_errors_are_not_construction_errors() {
        assert!(!AdapterError::Api("boom".into()).is_construction());
        assert!(!AdapterError::MalformedResponse("x".into()).is_construction());
        assert!(!AdapterError::Inference("x".into()).is_construction());
    }
}
