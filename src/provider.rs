//! Backend adapter implementations.
//!
//! Each network or engine backend is gated behind a Cargo feature. The mock
//! backend is always compiled.
//!
//! | Module | Feature | Backend |
//! |--------|---------|---------|
//! | `mistralrs` | `backend-mistralrs` | [mistral.rs](https://github.com/EricLBuehler/mistral.rs), in process |
//! | `remote_function` | `backend-remote-function` | Serverless GPU function over HTTPS |
//! | `ollama` | `backend-ollama` | [Ollama](https://github.com/ollama/ollama) daemon |
//! | `mock` | always | Deterministic pattern matcher |

pub mod mock;

#[cfg(any(feature = "backend-ollama", feature = "backend-remote-function"))]
pub(crate) mod remote_common;

#[cfg(feature = "backend-mistralrs")]
pub mod mistralrs;

#[cfg(feature = "backend-remote-function")]
pub mod remote_function;

#[cfg(feature = "backend-ollama")]
pub mod ollama;

// Re-exports (same order as module declarations above).
pub use mock::MockAdapter;

#[cfg(feature = "backend-mistralrs")]
pub use self::mistralrs::LocalEngineAdapter;

#[cfg(feature = "backend-remote-function")]
pub use remote_function::{
    FunctionResolver, RemoteFunction, RemoteFunctionAdapter, StaticResolver, WebEndpointResolver,
};

#[cfg(feature = "backend-ollama")]
pub use ollama::OllamaAdapter;
