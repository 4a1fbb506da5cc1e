//! Multimodal request construction

use crate::chart::RenderedChart;
use crate::prompts::analysis_prompt;
use chartmind_llm::{CompletionRequest, Message};

/// Default cap on the length of the model's reply
pub const DEFAULT_MAX_TOKENS: usize = 4096;

/// Builds the single prompt-plus-chart request sent per ticker
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBuilder {
    model: String,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl RequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One user message: the analysis prompt followed by the chart image
    pub fn build(&self, ticker: &str, chart: &RenderedChart) -> CompletionRequest {
        CompletionRequest::builder(&self.model)
            .add_message(Message::user_with_image(
                analysis_prompt(ticker),
                chart.mime_type,
                &chart.bytes,
            ))
            .max_tokens(self.max_tokens)
            .maybe_temperature(self.temperature)
            .build()
    }
}
