//! Public API types for configuring backends, sampling, and catalogs.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// The kind of backend an adapter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// In-process inference engine.
    Local,
    /// Remote serverless function addressed by application and tag.
    RemoteFunction,
    /// Local HTTP generation daemon.
    HttpDaemon,
    /// Deterministic pattern-matching stand-in.
    Mock,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::RemoteFunction => write!(f, "remote_function"),
            Self::HttpDaemon => write!(f, "http_daemon"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

/// Open-ended, backend-specific generation parameters.
///
/// Serialized as a plain JSON object. The adapter layer never validates the
/// contents; each backend reads the keys it understands and ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SamplingOptions(Map<String, Value>);

impl SamplingOptions {
    /// An empty set of options; every backend falls back to its defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw value for `key`, as given by the caller.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// `temperature`, if present and numeric.
    pub fn temperature(&self) -> Option<f64> {
        self.get("temperature").and_then(Value::as_f64)
    }

    pub fn top_p(&self) -> Option<f64> {
        self.get("top_p").and_then(Value::as_f64)
    }

    pub fn top_k(&self) -> Option<u64> {
        self.get("top_k").and_then(Value::as_u64)
    }

    /// Maximum tokens to generate. Accepts `max_tokens` or `max_new_tokens`.
    pub fn max_tokens(&self) -> Option<u64> {
        self.get("max_tokens")
            .or_else(|| self.get("max_new_tokens"))
            .and_then(Value::as_u64)
    }
}

impl From<Map<String, Value>> for SamplingOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Token counts for one generation, if the backend reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// The output of one prompt passed through [`BackendAdapter::generate`](crate::traits::BackendAdapter::generate).
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// The completion text.
    pub text: String,
    /// Token usage statistics, if reported by the backend.
    pub usage: Option<TokenUsage>,
    /// The backend-native reply, for backends that produce a JSON document.
    pub raw: Option<Value>,
}

impl Generation {
    /// A generation carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            raw: None,
        }
    }
}

/// Default fraction of GPU memory the local engine may claim.
pub const DEFAULT_GPU_MEMORY_UTILIZATION: f32 = 0.85;
/// Default maximum context length for the local engine.
pub const DEFAULT_MAX_MODEL_LEN: usize = 8192;
/// Default base URL of the HTTP generation daemon.
pub const DEFAULT_DAEMON_URL: &str = "http://localhost:11434";

fn default_num_gpus() -> usize {
    1
}

fn default_dtype() -> String {
    "auto".to_string()
}

fn default_gpu_memory_utilization() -> f32 {
    DEFAULT_GPU_MEMORY_UTILIZATION
}

fn default_max_model_len() -> usize {
    DEFAULT_MAX_MODEL_LEN
}

/// Construction parameters for the in-process inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalEngineConfig {
    /// HuggingFace repo ID or local path of the model.
    pub model: String,
    /// Number of GPUs to use. `0` forces CPU inference.
    #[serde(default = "default_num_gpus")]
    pub num_gpus: usize,
    /// Weight data type: `auto`, `f16`, `bf16`, or `f32`.
    #[serde(default = "default_dtype")]
    pub dtype: String,
    /// Fraction of GPU memory the engine may claim, in `(0, 1]`.
    #[serde(default = "default_gpu_memory_utilization")]
    pub gpu_memory_utilization: f32,
    /// Maximum context length in tokens.
    #[serde(default = "default_max_model_len")]
    pub max_model_len: usize,
    /// Directory for downloaded weights. Exported as `HF_HOME` before loading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<String>,
}

impl LocalEngineConfig {
    /// Config for `model` with the default GPU count, dtype, memory fraction
    /// and context length.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            num_gpus: default_num_gpus(),
            dtype: default_dtype(),
            gpu_memory_utilization: DEFAULT_GPU_MEMORY_UTILIZATION,
            max_model_len: DEFAULT_MAX_MODEL_LEN,
            download_dir: None,
        }
    }

    /// Check the model name, memory fraction, context length and dtype.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AdapterError::Config(
                "Local engine model cannot be empty".to_string(),
            ));
        }
        if !(self.gpu_memory_utilization > 0.0 && self.gpu_memory_utilization <= 1.0) {
            return Err(AdapterError::Config(format!(
                "gpu_memory_utilization must be in (0, 1], got {}",
                self.gpu_memory_utilization
            )));
        }
        if self.max_model_len == 0 {
            return Err(AdapterError::Config(
                "max_model_len must be greater than 0".to_string(),
            ));
        }
        match self.dtype.to_ascii_lowercase().as_str() {
            "auto" | "f16" | "float16" | "half" | "bf16" | "bfloat16" | "f32" | "float32" => {
                Ok(())
            }
            other => Err(AdapterError::Config(format!(
                "Unknown dtype '{}'. Valid types: auto, f16, bf16, f32",
                other
            ))),
        }
    }
}

/// Construction parameters for a remote serverless function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteFunctionConfig {
    /// Application the function is deployed under.
    pub app_name: String,
    /// Function tag within the application.
    pub tag: String,
    /// Workspace that owns the application; used to derive the endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Explicit endpoint template with `{app}` and `{tag}` placeholders.
    /// Takes priority over `workspace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,
}

impl RemoteFunctionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() || self.tag.trim().is_empty() {
            return Err(AdapterError::Config(
                "Remote function needs a non-empty app_name and tag".to_string(),
            ));
        }
        if self.workspace.is_none() && self.url_template.is_none() {
            return Err(AdapterError::Config(format!(
                "Remote function '{}' in '{}' needs either workspace or url_template",
                self.tag, self.app_name
            )));
        }
        Ok(())
    }
}

/// Construction parameters for the HTTP generation daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpDaemonConfig {
    /// Model name as known to the daemon.
    pub model: String,
    /// Daemon base URL. Defaults to [`DEFAULT_DAEMON_URL`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl HttpDaemonConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AdapterError::Config(
                "HTTP daemon model cannot be empty".to_string(),
            ));
        }
        if let Some(url) = &self.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(AdapterError::Config(format!(
                "HTTP daemon base_url '{}' must start with http:// or https://",
                url
            )));
        }
        Ok(())
    }
}

/// Variant-specific construction parameters, tagged by `backend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BackendConfig {
    Local(LocalEngineConfig),
    RemoteFunction(RemoteFunctionConfig),
    HttpDaemon(HttpDaemonConfig),
    Mock,
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Local(_) => BackendKind::Local,
            Self::RemoteFunction(_) => BackendKind::RemoteFunction,
            Self::HttpDaemon(_) => BackendKind::HttpDaemon,
            Self::Mock => BackendKind::Mock,
        }
    }
}

/// Declarative catalog entry mapping a human-readable alias to one backend.
///
/// # Example JSON
///
/// ```json
/// {
///   "alias": "judge/ollama",
///   "backend": "http_daemon",
///   "model": "prometheus-7b-v2.0"
/// }
/// ```
///
/// Keys the selected backend does not understand are rejected, so a misspelt
/// field never silently falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBackendSpec")]
pub struct BackendSpec {
    /// Name used to select this backend. Must contain a `/` separator.
    pub alias: String,
    #[serde(flatten)]
    pub backend: BackendConfig,
}

/// Catalog entry as written, before the variant parameters are checked.
///
/// `flatten` hides unknown keys from `deny_unknown_fields`, so the parameters
/// are collected here and deserialized into the variant struct separately.
#[derive(Deserialize)]
struct RawBackendSpec {
    alias: String,
    backend: BackendKind,
    #[serde(flatten)]
    params: Map<String, Value>,
}

impl TryFrom<RawBackendSpec> for BackendSpec {
    type Error = serde_json::Error;

    fn try_from(raw: RawBackendSpec) -> std::result::Result<Self, Self::Error> {
        use serde::de::Error as _;

        let backend = match raw.backend {
            BackendKind::Local => BackendConfig::Local(serde_json::from_value(raw.params.into())?),
            BackendKind::RemoteFunction => {
                BackendConfig::RemoteFunction(serde_json::from_value(raw.params.into())?)
            }
            BackendKind::HttpDaemon => {
                BackendConfig::HttpDaemon(serde_json::from_value(raw.params.into())?)
            }
            BackendKind::Mock => {
                if let Some(key) = raw.params.keys().next() {
                    return Err(serde_json::Error::custom(format!(
                        "unknown field `{}`, the mock backend takes no parameters",
                        key
                    )));
                }
                BackendConfig::Mock
            }
        };
        Ok(Self {
            alias: raw.alias,
            backend,
        })
    }
}

impl BackendSpec {
    pub fn new(alias: impl Into<String>, backend: BackendConfig) -> Self {
        Self {
            alias: alias.into(),
            backend,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Validate the alias format and the variant's own parameters.
    pub fn validate(&self) -> Result<()> {
        if self.alias.is_empty() {
            return Err(AdapterError::Config("Alias cannot be empty".to_string()));
        }
        if !self.alias.contains('/') {
            return Err(AdapterError::Config(format!(
                "Alias '{}' must be in 'group/name' format",
                self.alias
            )));
        }
        match &self.backend {
            BackendConfig::Local(cfg) => cfg.validate(),
            BackendConfig::RemoteFunction(cfg) => cfg.validate(),
            BackendConfig::HttpDaemon(cfg) => cfg.validate(),
            BackendConfig::Mock => Ok(()),
        }
    }

    /// Parse a single `BackendSpec` from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(s)
            .map_err(|e| AdapterError::Config(format!("Invalid BackendSpec JSON: {}", e)))?;
        spec.validate()?;
        Ok(spec)
    }
}

/// Parse a catalog (array) of `BackendSpec` from a JSON string.
///
/// Aliases must be unique within the catalog.
pub fn catalog_from_str(s: &str) -> Result<Vec<BackendSpec>> {
    let specs: Vec<BackendSpec> = serde_json::from_str(s)
        .map_err(|e| AdapterError::Config(format!("Invalid catalog JSON: {}", e)))?;
    let mut seen = std::collections::HashSet::new();
    for spec in &specs {
        spec.validate()?;
        if !seen.insert(spec.alias.as_str()) {
            return Err(AdapterError::Config(format!(
                "Alias '{}' appears more than once",
                spec.alias
            )));
        }
    }
    Ok(specs)
}

/// Read and parse a catalog from a JSON file.
pub fn catalog_from_file(path: impl AsRef<Path>) -> Result<Vec<BackendSpec>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AdapterError::Config(format!(
            "Failed to read catalog file '{}': {}",
            path.display(),
            e
        ))
    })?;
    catalog_from_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VALID_CATALOG_JSON: &str = r#"[
        {
            "alias": "judge/local",
            "backend": "local",
            "model": "prometheus-eval/prometheus-7b-v2.0",
            "num_gpus": 2,
            "dtype": "bf16"
        },
        {
            "alias": "judge/ollama",
            "backend": "http_daemon",
            "model": "prometheus"
        },
        {
            "alias": "judge/remote",
            "backend": "remote_function",
            "app_name": "prometheus-eval",
            "tag": "generate",
            "workspace": "acme"
        },
        { "alias": "judge/mock", "backend": "mock" }
    ]"#;

    #[test]
    fn catalog_parses_every_variant() {
        let specs = catalog_from_str(VALID_CATALOG_JSON).unwrap();
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[0].kind(), BackendKind::Local);
        assert_eq!(specs[1].kind(), BackendKind::HttpDaemon);
        assert_eq!(specs[2].kind(), BackendKind::RemoteFunction);
        assert_eq!(specs[3].kind(), BackendKind::Mock);
    }

    #[test]
    fn local_engine_defaults_apply() {
        let spec = BackendSpec::from_json_str(
            r#"{"alias":"judge/local","backend":"local","model":"m"}"#,
        )
        .unwrap();
        let BackendConfig::Local(cfg) = spec.backend else {
            panic!("expected local backend");
        };
        assert_eq!(cfg.num_gpus, 1);
        assert_eq!(cfg.dtype, "auto");
        assert_eq!(cfg.gpu_memory_utilization, 0.85);
        assert_eq!(cfg.max_model_len, 8192);
        assert!(cfg.download_dir.is_none());
    }

    #[test]
    fn rejects_alias_without_slash() {
        let err = BackendSpec::from_json_str(r#"{"alias":"mock","backend":"mock"}"#).unwrap_err();
        assert!(err.to_string().contains("group/name"));
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(BackendSpec::from_json_str(r#"{"alias":"a/b","backend":"vllm"}"#).is_err());
    }

    #[test]
    fn rejects_misspelt_local_engine_fields() {
        let err = BackendSpec::from_json_str(
            r#"{"alias":"a/b","backend":"local","model":"m","gpu_memory_utilisation":0.5,"num_gpu":4}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::Config(_)));
        assert!(err.to_string().contains("gpu_memory_utilisation"));
    }

    #[test]
    fn rejects_stray_fields_on_every_variant() {
        for json in [
            r#"{"alias":"a/b","backend":"mock","model":"m"}"#,
            r#"{"alias":"a/b","backend":"http_daemon","model":"m","baseurl":"http://x"}"#,
            r#"{"alias":"a/b","backend":"remote_function","app_name":"a","tag":"t","workspace":"w","app":"a"}"#,
        ] {
            assert!(BackendSpec::from_json_str(json).is_err(), "accepted {json}");
        }
        assert!(catalog_from_str(r#"[{"alias":"a/b","backend":"mock","extra":1}]"#).is_err());
    }

    #[test]
    fn serialized_spec_parses_back() {
        let spec = BackendSpec::new(
            "judge/local",
            BackendConfig::Local(LocalEngineConfig::new("m")),
        );
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(BackendSpec::from_json_str(&json).unwrap(), spec);
    }

    #[test]
    fn rejects_duplicate_aliases() {
        let json = r#"[
            {"alias":"judge/mock","backend":"mock"},
            {"alias":"judge/mock","backend":"mock"}
        ]"#;
        assert!(catalog_from_str(json).is_err());
    }

    #[test]
    fn rejects_out_of_range_memory_fraction() {
        let mut cfg = LocalEngineConfig::new("m");
        cfg.gpu_memory_utilization = 1.5;
        assert!(cfg.validate().is_err());
        cfg.gpu_memory_utilization = 0.0;
        assert!(cfg.validate().is_err());
        cfg.gpu_memory_utilization = 1.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_dtype() {
        let mut cfg = LocalEngineConfig::new("m");
        cfg.dtype = "int3".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn remote_function_needs_an_endpoint_source() {
        let cfg = RemoteFunctionConfig {
            app_name: "app".into(),
            tag: "generate".into(),
            workspace: None,
            url_template: None,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn http_daemon_rejects_non_http_base_url() {
        let cfg = HttpDaemonConfig {
            model: "m".into(),
            base_url: Some("localhost:11434".into()),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn catalog_from_file_reads_and_parses() {
        let path = std::env::temp_dir().join("judge_relay_test_catalog.json");
        std::fs::write(&path, VALID_CATALOG_JSON).unwrap();
        let specs = catalog_from_file(&path).unwrap();
        assert_eq!(specs.len(), 4);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn catalog_from_file_errors_on_missing_file() {
        assert!(catalog_from_file("/nonexistent/path/catalog.json").is_err());
    }

    #[test]
    fn sampling_accessors_read_common_keys() {
        let opts: SamplingOptions = serde_json::from_value(json!({
            "temperature": 0.7,
            "top_p": 0.9,
            "top_k": 40,
            "max_new_tokens": 256,
            "repetition_penalty": 1.03
        }))
        .unwrap();
        assert_eq!(opts.temperature(), Some(0.7));
        assert_eq!(opts.top_p(), Some(0.9));
        assert_eq!(opts.top_k(), Some(40));
        assert_eq!(opts.max_tokens(), Some(256));
        assert_eq!(opts.get("repetition_penalty"), Some(&json!(1.03)));
    }

    #[test]
    fn sampling_max_tokens_prefers_canonical_key() {
        let opts = SamplingOptions::new()
            .with("max_tokens", 10)
            .with("max_new_tokens", 20);
        assert_eq!(opts.max_tokens(), Some(10));
    }
}
