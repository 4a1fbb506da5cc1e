//! Multimodal LLM provider abstraction layer for chartmind
//!
//! This crate provides provider-agnostic abstractions for sending a prompt
//! together with an image to a Large Language Model. It includes:
//!
//! - Message types carrying text and base64 image blocks
//! - Completion request/response types
//! - Provider trait for LLM implementations
//! - Concrete provider implementations (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, ImageSource, Message, MessageContent, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(any(feature = "gemini", feature = "openai", feature = "anthropic"))]
pub mod providers;
