//! Generative-model interaction: send the product prompt, get structured copy back.
//!
//! Two backends sit behind the [`ContentModel`] trait:
//!
//! * [`GeminiModel`] — direct REST call to `models/{model}:generateContent`
//!   with a `responseSchema`, so the reply is constrained JSON. This is the
//!   default and needs `GOOGLE_API_KEY`.
//! * [`ProviderModel`] — any edgequake-llm provider (OpenAI, Anthropic,
//!   Ollama, …). These have no schema parameter, so the schema is put in
//!   the system message instead.
//!
//! A call is made exactly once: no retry, no backoff. Upstream failures
//! surface as [`ProdifyError::GenerationFailed`] and shape mismatches as
//! [`ProdifyError::MalformedResponse`].

use crate::config::{AppConfig, API_KEY_ENV};
use crate::error::ProdifyError;
use crate::output::{GeneratedContent, ProductSummary};
use crate::pipeline::postprocess;
use crate::prompts::{build_prompt, response_schema};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Raw text returned by a model plus token accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// A backend able to answer a prompt with JSON matching `schema`.
#[async_trait]
pub trait ContentModel: Send + Sync {
    /// Human-readable backend/model name for logs.
    fn name(&self) -> String;

    async fn complete_json(&self, prompt: &str, schema: &Value) -> Result<ModelReply, ProdifyError>;
}

/// Parsed content plus token usage of the call that produced it.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub content: GeneratedContent,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Generate affiliate copy for `product` with `model`.
///
/// Builds the prompt, calls the model once, strips wrapper noise from the
/// reply, parses it and normalises slug and section HTML.
pub async fn generate_content(
    model: &dyn ContentModel,
    product: &ProductSummary,
    config: &AppConfig,
) -> Result<GenerationResult, ProdifyError> {
    let start = Instant::now();
    let prompt = build_prompt(product, config.system_prompt.as_deref());
    let schema = response_schema();

    info!("Generating content with {}", model.name());
    let reply = model.complete_json(&prompt, &schema).await?;
    let duration_ms = start.elapsed().as_millis() as u64;
    debug!(
        "Model replied with {} chars ({} in / {} out tokens) in {}ms",
        reply.text.len(),
        reply.input_tokens,
        reply.output_tokens,
        duration_ms
    );

    let content = parse_generated_content(&reply.text)?;

    Ok(GenerationResult {
        content,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        duration_ms,
    })
}

/// Parse a model reply into [`GeneratedContent`] and normalise it.
pub fn parse_generated_content(raw: &str) -> Result<GeneratedContent, ProdifyError> {
    let cleaned = postprocess::clean_json_reply(raw);
    let content: GeneratedContent = serde_json::from_str(&cleaned).map_err(|e| {
        warn!("Model reply is not the expected JSON shape: {}", e);
        ProdifyError::MalformedResponse(format!("reply is not valid content JSON: {e}"))
    })?;
    Ok(postprocess::normalize_content(content))
}

/// Pick the backend from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Named provider** (`config.provider_name`) — built by
///    [`ProviderFactory::create_llm_provider`] with `config.model`; the
///    provider reads its own API key variable.
/// 3. **Gemini REST** — requires `GOOGLE_API_KEY`; fails with
///    [`ProdifyError::MissingApiKey`] before any network traffic otherwise.
pub fn resolve_model(
    config: &AppConfig,
    client: reqwest::Client,
) -> Result<Arc<dyn ContentModel>, ProdifyError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderModel::new(Arc::clone(provider), config)));
    }

    if let Some(ref name) = config.provider_name {
        let provider = ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
            ProdifyError::ProviderNotConfigured {
                provider: name.clone(),
                hint: format!("{e}"),
            }
        })?;
        return Ok(Arc::new(ProviderModel::new(provider, config)));
    }

    let api_key = config
        .google_api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ProdifyError::MissingApiKey {
            var: API_KEY_ENV.to_string(),
        })?;

    Ok(Arc::new(GeminiModel::new(client, api_key, config)))
}

// ── Gemini REST backend ──────────────────────────────────────────────────────

/// Direct client for the Gemini `generateContent` endpoint.
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_output_tokens: usize,
}

impl GeminiModel {
    pub fn new(client: reqwest::Client, api_key: String, config: &AppConfig) -> Self {
        Self {
            client,
            api_key,
            endpoint: format!("{}/models/{}:generateContent", config.api_base, config.model),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Request body for one prompt.
    pub fn request_body(&self, prompt: &str, schema: &Value) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        })
    }
}

#[async_trait]
impl ContentModel for GeminiModel {
    fn name(&self) -> String {
        format!("gemini/{}", self.model)
    }

    async fn complete_json(&self, prompt: &str, schema: &Value) -> Result<ModelReply, ProdifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt, schema))
            .send()
            .await
            .map_err(|e| ProdifyError::GenerationFailed {
                status: None,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status, truncate(&body, 500));
            return Err(ProdifyError::GenerationFailed {
                status: Some(status.as_u16()),
                detail: format!("Gemini API returned HTTP {status}"),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProdifyError::MalformedResponse(format!("response is not JSON: {e}")))?;

        parse_gemini_response(body)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt: usize,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates: usize,
}

/// Extract `candidates[0].content.parts[0].text` and token usage.
pub fn parse_gemini_response(body: Value) -> Result<ModelReply, ProdifyError> {
    let parsed: GeminiResponse = serde_json::from_value(body)
        .map_err(|e| ProdifyError::MalformedResponse(format!("unexpected response shape: {e}")))?;

    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            ProdifyError::MalformedResponse("response has no candidates[0].content.parts[0].text".into())
        })?;

    let (input_tokens, output_tokens) = parsed
        .usage
        .map(|u| (u.prompt, u.candidates))
        .unwrap_or_default();

    Ok(ModelReply {
        text,
        input_tokens,
        output_tokens,
    })
}

// ── edgequake-llm backend ────────────────────────────────────────────────────

/// Adapter from an edgequake-llm [`LLMProvider`] to [`ContentModel`].
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AppConfig) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                temperature: Some(config.temperature),
                max_tokens: Some(config.max_output_tokens),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl ContentModel for ProviderModel {
    fn name(&self) -> String {
        format!("edgequake-llm/{}", self.provider.name())
    }

    async fn complete_json(&self, prompt: &str, schema: &Value) -> Result<ModelReply, ProdifyError> {
        let system = format!(
            "Reply with a single JSON object that validates against this JSON schema. \
No prose, no code fences.\n\n{}",
            schema
        );
        let messages = vec![ChatMessage::system(system), ChatMessage::user(prompt)];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| ProdifyError::GenerationFailed {
                status: None,
                detail: format!("{e}"),
            })?;

        Ok(ModelReply {
            text: response.content,
            input_tokens: response.prompt_tokens as usize,
            output_tokens: response.completion_tokens as usize,
        })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
