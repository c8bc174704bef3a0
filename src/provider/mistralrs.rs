use crate::api::{Generation, LocalEngineConfig, SamplingOptions, TokenUsage};
use crate::error::{AdapterError, Result};
use crate::traits::{BackendAdapter, strip_prompts};
use async_trait::async_trait;
use mistralrs::{
    AutoDeviceMapParams, DeviceMapSetting, MemoryGpuConfig, Model, ModelDType,
    PagedAttentionMetaBuilder, RequestBuilder, TextMessageRole, TextModelBuilder,
};

/// In-process inference backend using the mistral.rs engine.
///
/// The model is loaded once by [`LocalEngineAdapter::new`] and held for the
/// adapter's lifetime. Prompts are submitted one per request; the engine's
/// scheduler batches them internally.
pub struct LocalEngineAdapter {
    model: Model,
    config: LocalEngineConfig,
}

impl LocalEngineAdapter {
    /// Load the model described by `config`.
    pub async fn new(config: LocalEngineConfig) -> Result<Self> {
        config.validate()?;
        Self::init_hf_cache(&config);
        Self::restrict_devices(&config)?;

        tracing::info!(
            model = %config.model,
            num_gpus = config.num_gpus,
            dtype = %config.dtype,
            gpu_memory_utilization = config.gpu_memory_utilization,
            max_model_len = config.max_model_len,
            "Loading local engine model"
        );

        let mut builder = TextModelBuilder::new(&config.model)
            .with_dtype(parse_dtype(&config.dtype)?)
            .with_device_mapping(DeviceMapSetting::Auto(AutoDeviceMapParams::Text {
                max_seq_len: config.max_model_len,
                max_batch_size: AutoDeviceMapParams::DEFAULT_MAX_BATCH_SIZE,
            }))
            .with_logging();

        if config.num_gpus == 0 {
            builder = builder.with_force_cpu();
        } else {
            let utilization = config.gpu_memory_utilization;
            builder = builder
                .with_paged_attn(|| {
                    PagedAttentionMetaBuilder::default()
                        .with_gpu_memory(MemoryGpuConfig::Utilization(utilization))
                        .build()
                })
                .map_err(|e| {
                    AdapterError::Load(format!("Failed to configure paged attention: {}", e))
                })?;
        }

        let model = builder.build().await.map_err(|e| {
            AdapterError::Load(format!("Failed to build mistralrs model '{}': {}", config.model, e))
        })?;

        tracing::info!(model = %config.model, "Local engine model loaded");
        Ok(Self { model, config })
    }

    /// The configuration the model was loaded with.
    pub fn config(&self) -> &LocalEngineConfig {
        &self.config
    }

    /// Limit the automatic device map to the first `num_gpus` devices.
    ///
    /// The engine maps layers over every visible device, so the visible set is
    /// narrowed through `CUDA_VISIBLE_DEVICES` before loading. Like `HF_HOME`
    /// this only affects the first model built in the process.
    fn restrict_devices(config: &LocalEngineConfig) -> Result<()> {
        if cfg!(feature = "gpu-metal") && config.num_gpus > 1 {
            return Err(AdapterError::Config(format!(
                "num_gpus = {} but Metal exposes a single device",
                config.num_gpus
            )));
        }
        let current = std::env::var("CUDA_VISIBLE_DEVICES").ok();
        if let Some(devices) = visible_devices(current.as_deref(), config.num_gpus)? {
            tracing::debug!(devices = %devices, "Restricting visible CUDA devices");
            // SAFETY: same constraint as init_hf_cache, runs before the engine
            // spawns any thread that reads the environment.
            unsafe {
                std::env::set_var("CUDA_VISIBLE_DEVICES", &devices);
            }
        }
        Ok(())
    }

    /// Export the download directory as `HF_HOME` before the first load.
    ///
    /// mistralrs-core captures its HF cache location in a process-global
    /// `OnceLock` during the first model load, so this only has an effect if
    /// it runs before any model in the process is built.
    fn init_hf_cache(config: &LocalEngineConfig) {
        let dir = crate::cache::resolve_download_dir("mistralrs", config);
        // SAFETY: runs before the engine spawns its workers; the OnceLock
        // guarantees only the first initialisation matters.
        unsafe {
            std::env::set_var("HF_HOME", &dir);
        }
    }

    fn build_request(prompt: &str, options: &SamplingOptions) -> RequestBuilder {
        let mut request = RequestBuilder::new().add_message(TextMessageRole::User, prompt);

        let has_sampling = options.temperature().is_some()
            || options.top_p().is_some()
            || options.top_k().is_some()
            || options.max_tokens().is_some();

        if has_sampling {
            if let Some(temp) = options.temperature() {
                request = request.set_sampler_temperature(temp);
            }
            if let Some(top_p) = options.top_p() {
                request = request.set_sampler_topp(top_p);
            }
            if let Some(top_k) = options.top_k() {
                request = request.set_sampler_topk(top_k as usize);
            }
            if let Some(max_tokens) = options.max_tokens() {
                request = request.set_sampler_max_len(max_tokens as usize);
            }
        } else {
            request = request.set_deterministic_sampler();
        }
        request
    }
}

/// Device list exposing exactly `num_gpus` devices, taken from the front of
/// `current` when the caller already narrowed it. `None` for CPU inference.
fn visible_devices(current: Option<&str>, num_gpus: usize) -> Result<Option<String>> {
    if num_gpus == 0 {
        return Ok(None);
    }
    let listed: Vec<&str> = current
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    if listed.is_empty() {
        let all: Vec<String> = (0..num_gpus).map(|i| i.to_string()).collect();
        return Ok(Some(all.join(",")));
    }
    if listed.len() < num_gpus {
        return Err(AdapterError::Config(format!(
            "num_gpus = {} but CUDA_VISIBLE_DEVICES lists only {}",
            num_gpus,
            listed.len()
        )));
    }
    Ok(Some(listed[..num_gpus].join(",")))
}

/// Reject a prompt whose token count exceeds the configured context length.
fn check_context_len(prompt_tokens: usize, max_model_len: usize) -> Result<()> {
    if prompt_tokens > max_model_len {
        return Err(AdapterError::Inference(format!(
            "Prompt has {} tokens, more than max_model_len = {}",
            prompt_tokens, max_model_len
        )));
    }
    Ok(())
}

/// Map a dtype name onto the engine's [`ModelDType`].
fn parse_dtype(s: &str) -> Result<ModelDType> {
    match s.to_ascii_lowercase().as_str() {
        "auto" => Ok(ModelDType::Auto),
        "f16" | "float16" | "half" => Ok(ModelDType::F16),
        "bf16" | "bfloat16" => Ok(ModelDType::BF16),
        "f32" | "float32" => Ok(ModelDType::F32),
        other => Err(AdapterError::Config(format!(
            "Unknown dtype '{}'. Valid types: auto, f16, bf16, f32",
            other
        ))),
    }
}

#[async_trait]
impl BackendAdapter for LocalEngineAdapter {
    fn backend_id(&self) -> &'static str {
        "local/mistralrs"
    }

    async fn generate(
        &self,
        prompts: &[String],
        options: &SamplingOptions,
    ) -> Result<Vec<Generation>> {
        let mut results = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let response = self
                .model
                .send_chat_request(Self::build_request(prompt, options))
                .await
                .map_err(|e| AdapterError::Inference(format!("Generation failed: {}", e)))?;
            check_context_len(response.usage.prompt_tokens, self.config.max_model_len)?;

            let text = response
                .choices
                .first()
                .and_then(|c| c.message.content.as_deref())
                .unwrap_or("")
                .to_string();

            results.push(Generation {
                text,
                usage: Some(TokenUsage {
                    prompt_tokens: response.usage.prompt_tokens,
                    completion_tokens: response.usage.completion_tokens,
                    total_tokens: response.usage.total_tokens,
                }),
                raw: None,
            });
        }
        Ok(results)
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
