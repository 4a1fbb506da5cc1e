//! Message types for LLM communication
//!
//! Messages follow Anthropic's content-block layout: a message carries either
//! plain text or a list of blocks, where a block is text or an inline image.
//! Providers translate this shape into their own wire format.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// System message (handled separately in some providers)
    System,
}

/// Image source for multi-modal content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Base64-encoded image
    Base64 {
        /// Media type (e.g., "image/png")
        media_type: String,
        /// Base64-encoded image data
        data: String,
    },
}

impl ImageSource {
    /// Encode raw image bytes
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::Base64 {
            media_type: media_type.into(),
            data: BASE64.encode(bytes),
        }
    }

    /// Media type of the image
    pub fn media_type(&self) -> &str {
        match self {
            Self::Base64 { media_type, .. } => media_type,
        }
    }

    /// Base64 payload of the image
    pub fn data(&self) -> &str {
        match self {
            Self::Base64 { data, .. } => data,
        }
    }
}

/// Content block in a message (supports multi-modal content)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Image content
    Image {
        /// Image source
        source: ImageSource,
    },
}

/// Message content: either simple text or structured blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create a user message carrying text followed by one image
    pub fn user_with_image(
        text: impl Into<String>,
        media_type: impl Into<String>,
        image: &[u8],
    ) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Blocks(vec![
                ContentBlock::Text { text: text.into() },
                ContentBlock::Image {
                    source: ImageSource::from_bytes(media_type, image),
                },
            ])),
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Content blocks of the message, with plain text wrapped as one block
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match &self.content {
            Some(MessageContent::Text(text)) => vec![ContentBlock::Text { text: text.clone() }],
            Some(MessageContent::Blocks(blocks)) => blocks.clone(),
            None => Vec::new(),
        }
    }

    /// Concatenate every text block of the message
    ///
    /// Models sometimes split one answer across several text parts; they are
    /// joined without separators so the original text is preserved.
    pub fn text(&self) -> String {
        match &self.content {
            Some(MessageContent::Text(s)) => s.clone(),
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::Image { .. } => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    /// Whether the message carries at least one image block
    pub fn has_image(&self) -> bool {
        matches!(
            &self.content,
            Some(MessageContent::Blocks(blocks))
                if blocks.iter().any(|b| matches!(b, ContentBlock::Image { .. }))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");
        assert!(!msg.has_image());
    }

    #[test]
    fn test_user_with_image() {
        let msg = Message::user_with_image("Describe", "image/png", &[0x89, b'P', b'N', b'G']);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Describe");
        assert!(msg.has_image());

        let blocks = msg.blocks();
        assert_eq!(blocks.len(), 2);
        match &blocks[1] {
            ContentBlock::Image { source } => {
                assert_eq!(source.media_type(), "image/png");
                assert_eq!(source.data(), "iVBORw==");
            }
            ContentBlock::Text { .. } => panic!("Expected image block"),
        }
    }

    #[test]
    fn test_text_joins_blocks() {
        let msg = Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![
                ContentBlock::Text {
                    text: "{\"action\": ".to_string(),
                },
                ContentBlock::Text {
                    text: "\"Hold\"}".to_string(),
                },
            ])),
        };
        assert_eq!(msg.text(), "{\"action\": \"Hold\"}");
    }

    #[test]
    fn test_image_block_serialization() {
        let block = ContentBlock::Image {
            source: ImageSource::from_bytes("image/png", b"abc"),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["source"]["type"], "base64");
        assert_eq!(json["source"]["media_type"], "image/png");
        assert_eq!(json["source"]["data"], "YWJj");
    }
}
