//! Configuration for the scrape → generate → publish service.
//!
//! Every knob lives in [`AppConfig`], built via [`AppConfigBuilder`] or read
//! from the process environment with [`AppConfig::from_env`]. The same struct
//! drives the library entry points, the HTTP server and the CLI, so a run can
//! be reproduced by copying its environment.

use crate::error::ProdifyError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Desktop Chrome user agent; many shops serve a stripped page to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Service configuration.
///
/// # Example
/// ```rust
/// use prodify::AppConfig;
///
/// let config = AppConfig::builder()
///     .google_api_key("test-key")
///     .temperature(0.5)
///     .public_base_url("https://prodify.test")
///     .build()
///     .unwrap();
/// assert_eq!(config.public_base_url, "https://prodify.test");
/// ```
#[derive(Clone)]
pub struct AppConfig {
    /// Gemini API key. Required only when the Gemini backend is used.
    pub google_api_key: Option<String>,

    /// Model identifier. Default: `gemini-2.5-flash`.
    pub model: String,

    /// Base URL of the Gemini REST API, without trailing slash.
    pub api_base: String,

    /// edgequake-llm provider name (e.g. "openai", "anthropic", "ollama").
    /// When set, generation goes through that provider instead of Gemini.
    pub provider_name: Option<String>,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.8.
    ///
    /// Marketing copy benefits from some variety; values near 0 produce
    /// near-identical pages for similar products.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    pub max_output_tokens: usize,

    /// Custom prompt preamble. If None, uses [`crate::prompts::DEFAULT_INSTRUCTIONS`].
    pub system_prompt: Option<String>,

    /// User-Agent header sent when fetching source pages.
    pub user_agent: String,

    /// Timeout for fetching source pages. None keeps the HTTP client default.
    pub fetch_timeout_secs: Option<u64>,

    /// Public base URL used to build published site links. No trailing slash.
    pub public_base_url: String,

    /// Main domain; any other `{slug}.{main_domain}` host is rewritten to `/{slug}`.
    pub main_domain: String,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// JSON snapshot file for the site store. None keeps sites in memory.
    pub store_path: Option<PathBuf>,

    /// Bearer tokens accepted by the server, as `(token, user_id)` pairs.
    pub api_tokens: Vec<(String, String)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            provider_name: None,
            provider: None,
            temperature: 0.8,
            max_output_tokens: 8192,
            system_prompt: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_secs: None,
            public_base_url: "http://localhost:3000".to_string(),
            main_domain: "localhost:3000".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            store_path: None,
            api_tokens: Vec::new(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("public_base_url", &self.public_base_url)
            .field("main_domain", &self.main_domain)
            .field("bind_addr", &self.bind_addr)
            .field("store_path", &self.store_path)
            .field("api_tokens", &self.api_tokens.len())
            .finish()
    }
}

impl AppConfig {
    /// Create a new builder for `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder {
            config: Self::default(),
        }
    }

    /// Builder seeded with this configuration, for layering overrides.
    pub fn into_builder(self) -> AppConfigBuilder {
        AppConfigBuilder { config: self }
    }

    /// Read configuration from `PRODIFY_*` variables and `GOOGLE_API_KEY`.
    ///
    /// Unset variables keep their defaults; set-but-unparsable ones are an
    /// [`ProdifyError::InvalidConfig`].
    pub fn from_env() -> Result<Self, ProdifyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProdifyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut b = Self::builder();

        if let Some(key) = get(API_KEY_ENV) {
            b = b.google_api_key(key);
        }
        if let Some(model) = get("PRODIFY_MODEL") {
            b = b.model(model);
        }
        if let Some(base) = get("PRODIFY_API_BASE") {
            b = b.api_base(base);
        }
        if let Some(name) = get("PRODIFY_LLM_PROVIDER") {
            b = b.provider_name(name);
        }
        if let Some(t) = get("PRODIFY_TEMPERATURE") {
            b = b.temperature(parse_var("PRODIFY_TEMPERATURE", &t)?);
        }
        if let Some(n) = get("PRODIFY_MAX_TOKENS") {
            b = b.max_output_tokens(parse_var("PRODIFY_MAX_TOKENS", &n)?);
        }
        if let Some(ua) = get("PRODIFY_USER_AGENT") {
            b = b.user_agent(ua);
        }
        if let Some(secs) = get("PRODIFY_FETCH_TIMEOUT") {
            b = b.fetch_timeout_secs(parse_var("PRODIFY_FETCH_TIMEOUT", &secs)?);
        }
        if let Some(u) = get("PRODIFY_PUBLIC_URL") {
            b = b.public_base_url(u);
        }
        if let Some(d) = get("PRODIFY_MAIN_DOMAIN") {
            b = b.main_domain(d);
        }
        if let Some(addr) = get("PRODIFY_BIND") {
            b = b.bind_addr(parse_var("PRODIFY_BIND", &addr)?);
        }
        if let Some(path) = get("PRODIFY_STORE_PATH") {
            b = b.store_path(path);
        }
        if let Some(tokens) = get("PRODIFY_API_TOKENS") {
            b = b.api_tokens(parse_token_table(&tokens)?);
        }

        b.build()
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ProdifyError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ProdifyError::InvalidConfig(format!("{key}={value:?}: {e}")))
}

/// Parse `token:user_id,token2:user_id2`.
pub fn parse_token_table(raw: &str) -> Result<Vec<(String, String)>, ProdifyError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((token, user)) if !token.trim().is_empty() && !user.trim().is_empty() => {
                Ok((token.trim().to_string(), user.trim().to_string()))
            }
            _ => Err(ProdifyError::InvalidConfig(format!(
                "API token entry must be 'token:user_id', got '{entry}'"
            ))),
        })
        .collect()
}

/// Builder for [`AppConfig`].
#[derive(Debug)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn google_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.google_api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.public_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn main_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.main_domain = domain.into().trim().to_lowercase();
        self
    }

    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = Some(path.into());
        self
    }

    pub fn api_tokens(mut self, tokens: Vec<(String, String)>) -> Self {
        self.config.api_tokens = tokens;
        self
    }

    pub fn api_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.config.api_tokens.push((token.into(), user_id.into()));
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AppConfig, ProdifyError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ProdifyError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_output_tokens == 0 {
            return Err(ProdifyError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if url::Url::parse(&c.public_base_url).is_err() {
            return Err(ProdifyError::InvalidConfig(format!(
                "public base URL '{}' is not an absolute URL",
                c.public_base_url
            )));
        }
        if c.main_domain.is_empty() {
            return Err(ProdifyError::InvalidConfig("main domain must not be empty".into()));
        }
        Ok(self.config)
    }
}
