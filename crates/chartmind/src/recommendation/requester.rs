//! Sends one chart to the model and parses the reply

use super::{AnalysisResult, RequestBuilder, parse_response};
use crate::chart::RenderedChart;
use crate::error::Result;
use chartmind_llm::{LLMProvider, StopReason};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Turns a rendered chart into a recommendation
///
/// Provider failures are returned as errors. An unusable reply is not an
/// error: it yields an `Error` result carrying the raw text.
pub struct RecommendationRequester {
    provider: Arc<dyn LLMProvider>,
    builder: RequestBuilder,
}

impl RecommendationRequester {
    pub fn new(provider: Arc<dyn LLMProvider>, builder: RequestBuilder) -> Self {
        Self { provider, builder }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.builder.model()
    }

    #[instrument(skip(self, chart), fields(provider = %self.provider.name(), model = %self.builder.model()))]
    pub async fn request(&self, ticker: &str, chart: &RenderedChart) -> Result<AnalysisResult> {
        let request = self.builder.build(ticker, chart);
        debug!(image_bytes = chart.bytes.len(), "Requesting recommendation");

        let response = self.provider.complete(request).await?;
        if response.stop_reason == StopReason::MaxTokens {
            warn!(ticker, "Reply was cut off at the token limit");
        }

        let result = parse_response(ticker, &response.text());
        if result.is_error() {
            warn!(ticker, "Model reply could not be parsed");
        } else {
            info!(ticker, action = %result.action, "Received recommendation");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartMindError;
    use crate::recommendation::test_support::ScriptedProvider;
    use chartmind_llm::LLMError;

    fn chart() -> RenderedChart {
        RenderedChart::png(b"png".to_vec())
    }

    #[tokio::test]
    async fn test_request_parses_reply() {
        let provider = Arc::new(ScriptedProvider::replying(&[
            r#"Sure! {"action": "Buy", "justification": "Higher lows."}"#,
        ]));
        let requester = RecommendationRequester::new(provider.clone(), RequestBuilder::new("test-model"));

        let result = requester.request("AAPL", &chart()).await.unwrap();
        assert_eq!(result, AnalysisResult::new("AAPL", "Buy", "Higher lows."));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "test-model");
        assert!(requests[0].messages[0].has_image());
        assert_eq!(requester.provider_name(), "scripted");
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_data() {
        let provider = Arc::new(ScriptedProvider::replying(&["no idea"]));
        let requester = RecommendationRequester::new(provider, RequestBuilder::new("m"));

        let result = requester.request("MSFT", &chart()).await.unwrap();
        assert!(result.is_error());
        assert!(result.justification.contains("no idea"));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new([Err(LLMError::RateLimitExceeded("quota".to_string()))]));
        let requester = RecommendationRequester::new(provider, RequestBuilder::new("m"));

        let err = requester.request("GOOG", &chart()).await.unwrap_err();
        assert!(matches!(err, ChartMindError::Llm(LLMError::RateLimitExceeded(_))));
    }
}
