//! Adapter for a remote serverless GPU function addressed by an
//! (application, tag) pair.
//!
//! The callable is resolved exactly once, when the adapter is constructed.
//! Resolution goes through a [`FunctionResolver`]; the crate ships a
//! [`WebEndpointResolver`] that reaches functions deployed as HTTPS web
//! endpoints and a [`StaticResolver`] for in-process tables.

use crate::api::{Generation, RemoteFunctionConfig, SamplingOptions};
use crate::error::{AdapterError, Result};
use crate::provider::remote_common::{check_http_status, decode_json, optional_env};
use crate::traits::BackendAdapter;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// Environment variable holding the endpoint proxy-auth key.
pub const PROXY_KEY_ENV: &str = "MODAL_KEY";
/// Environment variable holding the endpoint proxy-auth secret.
pub const PROXY_SECRET_ENV: &str = "MODAL_SECRET";

/// A resolved remote callable that turns one prompt into one completion.
#[async_trait]
pub trait RemoteFunction: Send + Sync {
    async fn call(&self, prompt: &str) -> Result<String>;
}

/// Looks up remote callables by application name and function tag.
#[async_trait]
pub trait FunctionResolver: Send + Sync {
    /// Resolve the callable. Fails with [`AdapterError::FunctionNotFound`] when
    /// nothing is registered under `(app, tag)`.
    async fn lookup(&self, app: &str, tag: &str) -> Result<Arc<dyn RemoteFunction>>;
}

/// In-memory table of remote callables.
#[derive(Default)]
pub struct StaticResolver {
    functions: HashMap<(String, String), Arc<dyn RemoteFunction>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        app: impl Into<String>,
        tag: impl Into<String>,
        function: Arc<dyn RemoteFunction>,
    ) -> Self {
        self.functions.insert((app.into(), tag.into()), function);
        self
    }
}

#[async_trait]
impl FunctionResolver for StaticResolver {
    async fn lookup(&self, app: &str, tag: &str) -> Result<Arc<dyn RemoteFunction>> {
        self.functions
            .get(&(app.to_string(), tag.to_string()))
            .cloned()
            .ok_or_else(|| AdapterError::FunctionNotFound {
                tag: tag.to_string(),
                app: app.to_string(),
            })
    }
}

#[derive(Clone)]
struct ProxyAuth {
    key: String,
    secret: String,
}

impl ProxyAuth {
    fn from_env() -> Option<Self> {
        Some(Self {
            key: optional_env(PROXY_KEY_ENV)?,
            secret: optional_env(PROXY_SECRET_ENV)?,
        })
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Modal-Key", &self.key)
            .header("Modal-Secret", &self.secret)
    }
}

/// Resolves functions deployed as HTTPS web endpoints.
///
/// The endpoint URL is rendered from a template with `{app}` and `{tag}`
/// placeholders. Lookup probes the URL once; HTTP 404 means the function is
/// not deployed. Any other status proves the endpoint exists (a POST-only
/// endpoint answers a probe with 405).
pub struct WebEndpointResolver {
    client: Client,
    template: String,
    auth: Option<ProxyAuth>,
}

impl WebEndpointResolver {
    /// Resolver for the standard `<workspace>--<app>-<tag>.modal.run` host scheme.
    pub fn for_workspace(workspace: &str) -> Self {
        Self::with_template(format!("https://{}--{{app}}-{{tag}}.modal.run", workspace))
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            template: template.into(),
            auth: ProxyAuth::from_env(),
        }
    }

    pub fn from_config(config: &RemoteFunctionConfig) -> Result<Self> {
        config.validate()?;
        if let Some(template) = &config.url_template {
            return Ok(Self::with_template(template.clone()));
        }
        match &config.workspace {
            Some(workspace) => Ok(Self::for_workspace(workspace)),
            None => Err(AdapterError::Config(format!(
                "Remote function '{}' has no endpoint source",
                config.tag
            ))),
        }
    }

    /// Render the endpoint URL for a function.
    pub fn endpoint_url(&self, app: &str, tag: &str) -> String {
        self.template.replace("{app}", app).replace("{tag}", tag)
    }
}

#[async_trait]
impl FunctionResolver for WebEndpointResolver {
    async fn lookup(&self, app: &str, tag: &str) -> Result<Arc<dyn RemoteFunction>> {
        let url = self.endpoint_url(app, tag);
        let mut probe = self.client.get(&url);
        if let Some(auth) = &self.auth {
            probe = auth.apply(probe);
        }
        let response = probe
            .send()
            .await
            .map_err(|e| AdapterError::Api(format!("probing {}: {}", url, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AdapterError::FunctionNotFound {
                tag: tag.to_string(),
                app: app.to_string(),
            });
        }

        tracing::debug!(app, tag, url = %url, status = %response.status(), "Remote function resolved");
        Ok(Arc::new(WebEndpointFunction {
            client: self.client.clone(),
            url,
            auth: self.auth.clone(),
        }))
    }
}

/// A function reached by `POST {"user_question": <prompt>}`.
struct WebEndpointFunction {
    client: Client,
    url: String,
    auth: Option<ProxyAuth>,
}

#[async_trait]
impl RemoteFunction for WebEndpointFunction {
    async fn call(&self, prompt: &str) -> Result<String> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&json!({ "user_question": prompt }));
        if let Some(auth) = &self.auth {
            request = auth.apply(request);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::Api(e.to_string()))?;

        let reply = decode_json("Remote function", check_http_status("Remote function", response).await?)
            .await?;
        completion_from_reply(reply)
    }
}

/// Accept a bare JSON string, or an object with a `text` or `response` string.
fn completion_from_reply(reply: Value) -> Result<String> {
    match reply {
        Value::String(text) => Ok(text),
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("response"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AdapterError::MalformedResponse(
                    "Remote function reply has no 'text' or 'response' string".to_string(),
                )
            }),
        other => Err(AdapterError::MalformedResponse(format!(
            "Remote function reply must be a string or object, got {}",
            other
        ))),
    }
}

/// Adapter that forwards each prompt to a remote function, one call at a time.
pub struct RemoteFunctionAdapter {
    app_name: String,
    tag: String,
    function: Arc<dyn RemoteFunction>,
}

impl RemoteFunctionAdapter {
    /// Resolve `(app_name, tag)` through `resolver` and hold the callable.
    pub async fn connect(
        app_name: impl Into<String>,
        tag: impl Into<String>,
        resolver: &dyn FunctionResolver,
    ) -> Result<Self> {
        let app_name = app_name.into();
        let tag = tag.into();
        let function = match resolver.lookup(&app_name, &tag).await {
            Ok(function) => function,
            Err(e @ AdapterError::FunctionNotFound { .. }) => {
                tracing::warn!(app = %app_name, tag = %tag, "Remote function not found");
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        tracing::info!(app = %app_name, tag = %tag, "Remote function backend initialized");
        Ok(Self {
            app_name,
            tag,
            function,
        })
    }

    /// Resolve through a [`WebEndpointResolver`] built from `config`.
    pub async fn from_config(config: &RemoteFunctionConfig) -> Result<Self> {
        let resolver = WebEndpointResolver::from_config(config)?;
        Self::connect(config.app_name.clone(), config.tag.clone(), &resolver).await
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

#[async_trait]
impl BackendAdapter for RemoteFunctionAdapter {
    fn backend_id(&self) -> &'static str {
        "remote/function"
    }

    async fn generate(
        &self,
        prompts: &[String],
        _options: &SamplingOptions,
    ) -> Result<Vec<Generation>> {
        let mut results = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let text = self.function.call(prompt).await?;
            results.push(Generation::text(text));
        }
        Ok(results)
    }
}
