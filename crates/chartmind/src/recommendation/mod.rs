//! Chart recommendation: request building, model call, and reply parsing
//!
//! The two stages are connected only by text: [`RequestBuilder`] produces the
//! multimodal request, the provider answers with free-form text, and
//! [`parse_response`] turns that text into an [`AnalysisResult`].

mod parser;
mod request;
mod requester;

pub use parser::{ERROR_ACTION, MISSING_ACTION, MISSING_JUSTIFICATION, ParseError, parse_response};
pub use request::RequestBuilder;
pub use requester::RecommendationRequester;

use serde::{Deserialize, Serialize};

/// Recommendation for one ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: String,
    /// Short label such as `Buy` or `Hold`; `Error` when the reply was unusable
    pub action: String,
    pub justification: String,
}

impl AnalysisResult {
    pub fn new(
        ticker: impl Into<String>,
        action: impl Into<String>,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            action: action.into(),
            justification: justification.into(),
        }
    }

    /// Result standing in for a reply that could not be parsed
    pub fn error(ticker: impl Into<String>, justification: impl Into<String>) -> Self {
        Self::new(ticker, ERROR_ACTION, justification)
    }

    pub fn is_error(&self) -> bool {
        self.action == ERROR_ACTION
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use chartmind_llm::{
        CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, StopReason,
        TokenUsage,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider answering from a fixed script and recording every request
    #[derive(Default)]
    pub struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, LLMError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        pub fn new(replies: impl IntoIterator<Item = Result<String, LLMError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                requests: Mutex::default(),
            }
        }

        pub fn replying(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| Ok((*t).to_string())))
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> chartmind_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            let text = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LLMError::RequestFailed("script exhausted".to_string())))?;

            Ok(CompletionResponse {
                message: Message::assistant(text),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }
}
