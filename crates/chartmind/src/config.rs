//! Configuration for chart analysis runs
//!
//! Values are layered: defaults, then an optional JSON file, then environment
//! variables, then whatever the caller sets on the builder (CLI flags).

use crate::chart::{ChartRenderer, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::{ChartMindError, Result};
use crate::recommendation::{RecommendationRequester, RequestBuilder};
use chartmind_llm::LLMProvider;
use chartmind_llm::providers::{
    AnthropicProvider, DEFAULT_ANTHROPIC_API_BASE, GeminiConfig, GeminiProvider, OpenAIConfig,
    OpenAIProvider,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Default model, a multimodal Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Language model vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    Gemini,
    OpenAI,
    Anthropic,
}

impl ModelProvider {
    /// Environment variables holding this provider's API key, in lookup order
    pub fn key_variables(&self) -> &'static [&'static str] {
        match self {
            Self::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Self::OpenAI => &["OPENAI_API_KEY"],
            Self::Anthropic => &["ANTHROPIC_API_KEY"],
        }
    }

    /// Model used when none is configured for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => DEFAULT_MODEL,
            Self::OpenAI => "gpt-4o",
            Self::Anthropic => "claude-sonnet-4-5",
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        })
    }
}

impl FromStr for ModelProvider {
    type Err = ChartMindError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(ChartMindError::Config(format!(
                "Unknown model provider '{other}' (expected gemini, openai or anthropic)"
            ))),
        }
    }
}

/// Configuration for chart analysis runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartMindConfig {
    /// Language model vendor
    pub provider: ModelProvider,

    /// Model identifier passed to the provider
    pub model: String,

    /// API key; usually taken from the environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override of the provider's API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// HTTP timeout for a model call; the client default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Cap on the reply length
    pub max_tokens: usize,

    /// Sampling temperature; provider default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Chart size in pixels
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ChartMindConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Gemini,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_base: None,
            request_timeout_secs: None,
            max_tokens: 4096,
            temperature: None,
            chart_width: DEFAULT_WIDTH,
            chart_height: DEFAULT_HEIGHT,
        }
    }
}

impl ChartMindConfig {
    /// Create a new configuration builder
    pub fn builder() -> ChartMindConfigBuilder {
        ChartMindConfigBuilder::default()
    }

    /// Load configuration from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ChartMindError::Config(format!(
                "Failed to read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| ChartMindError::Config(format!("Failed to parse config file: {e}")))
    }

    /// Overlay the `CHARTMIND_*` variables of the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Overlay the `CHARTMIND_*` variables from `lookup`, which maps a
    /// variable name to its value
    ///
    /// API keys are resolved separately by [`Self::with_api_key_from`], once
    /// the provider is final.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(provider) = lookup("CHARTMIND_PROVIDER") {
            self.switch_provider(provider.parse()?);
        }
        if let Some(model) = lookup("CHARTMIND_MODEL") {
            self.model = model;
        }
        if let Some(api_base) = lookup("CHARTMIND_API_BASE") {
            self.api_base = Some(api_base);
        }
        Ok(self)
    }

    /// Take the API key from the process environment if none is set
    pub fn with_api_key_from_env(self) -> Self {
        self.with_api_key_from(|name| std::env::var(name).ok())
    }

    /// Take the API key from the first non-empty key variable of the
    /// configured provider, unless a key is already set
    pub fn with_api_key_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.api_key.is_none() {
            self.api_key = self
                .provider
                .key_variables()
                .iter()
                .find_map(|name| lookup(*name).filter(|v| !v.trim().is_empty()));
        }
        self
    }

    /// Change provider, moving a default model along with it
    fn switch_provider(&mut self, provider: ModelProvider) {
        if provider != self.provider && self.model == self.provider.default_model() {
            self.model = provider.default_model().to_string();
        }
        self.provider = provider;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ChartMindError::Config("model must not be empty".to_string()));
        }

        if self.max_tokens == 0 {
            return Err(ChartMindError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ChartMindError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(t) = self.temperature.filter(|t| !(0.0..=2.0).contains(t)) {
            return Err(ChartMindError::Config(format!(
                "temperature {t} is outside 0.0..=2.0"
            )));
        }

        if self.chart_width < 200 || self.chart_height < 150 {
            return Err(ChartMindError::Config(format!(
                "chart size {}x{} is too small (minimum 200x150)",
                self.chart_width, self.chart_height
            )));
        }

        Ok(())
    }

    /// Chart layout at the configured size
    pub fn chart_layout(&self) -> ChartRenderer {
        ChartRenderer::new(self.chart_width, self.chart_height)
    }

    /// Request builder for the configured model
    pub fn request_builder(&self) -> RequestBuilder {
        RequestBuilder::new(&self.model)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
    }

    /// Instantiate the configured language model provider
    pub fn build_provider(&self) -> Result<Arc<dyn LLMProvider>> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            ChartMindError::Config(format!(
                "No API key for {}; set {}",
                self.provider,
                self.provider.key_variables().join(" or ")
            ))
        })?;
        let timeout = self.request_timeout_secs;

        let provider: Arc<dyn LLMProvider> = match self.provider {
            ModelProvider::Gemini => {
                let mut config = GeminiConfig::new(api_key);
                if let Some(secs) = timeout {
                    config = config.with_timeout(secs);
                }
                if let Some(base) = &self.api_base {
                    config = config.with_api_base(base);
                }
                Arc::new(GeminiProvider::with_config(config)?)
            }
            ModelProvider::OpenAI => {
                let mut config = OpenAIConfig::new(api_key);
                if let Some(secs) = timeout {
                    config = config.with_timeout(secs);
                }
                if let Some(base) = &self.api_base {
                    config = config.with_api_base(base);
                }
                Arc::new(OpenAIProvider::with_config(config)?)
            }
            ModelProvider::Anthropic => Arc::new(AnthropicProvider::with_options(
                api_key,
                self.api_base.as_deref().unwrap_or(DEFAULT_ANTHROPIC_API_BASE),
                timeout,
            )?),
        };
        Ok(provider)
    }

    /// Provider plus request builder, ready for a session
    pub fn build_requester(&self) -> Result<RecommendationRequester> {
        Ok(RecommendationRequester::new(
            self.build_provider()?,
            self.request_builder(),
        ))
    }
}

/// Builder for ChartMindConfig
///
/// Starts from a base configuration (defaults unless given) and applies only
/// the values that were set.
#[derive(Debug, Default)]
pub struct ChartMindConfigBuilder {
    base: Option<ChartMindConfig>,
    provider: Option<ModelProvider>,
    model: Option<String>,
    api_key: Option<String>,
    api_base: Option<String>,
    request_timeout_secs: Option<u64>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    chart_width: Option<u32>,
    chart_height: Option<u32>,
}

impl ChartMindConfigBuilder {
    /// Start from an existing configuration instead of the defaults
    pub fn base(mut self, config: ChartMindConfig) -> Self {
        self.base = Some(config);
        self
    }

    pub fn provider(mut self, provider: ModelProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_width = Some(width);
        self.chart_height = Some(height);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ChartMindConfig> {
        let mut config = self.base.unwrap_or_default();

        if let Some(provider) = self.provider {
            config.switch_provider(provider);
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        config.api_key = self.api_key.or(config.api_key);
        config.api_base = self.api_base.or(config.api_base);
        config.request_timeout_secs = self.request_timeout_secs.or(config.request_timeout_secs);
        config.max_tokens = self.max_tokens.unwrap_or(config.max_tokens);
        config.temperature = self.temperature.or(config.temperature);
        config.chart_width = self.chart_width.unwrap_or(config.chart_width);
        config.chart_height = self.chart_height.unwrap_or(config.chart_height);

        config.validate()?;
        Ok(config)
    }
}
