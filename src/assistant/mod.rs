//! Assistant: AI text and voice collaborators and the dashboard panels
//! that talk to them.
//!
//! Vendor specifics live behind four narrow traits so adapters can be
//! swapped (or stubbed in tests):
//! - `ReplyGenerator`: message + history → reply text
//! - `SymptomAdvisor`: symptom description → advisory text
//! - `SpeechSynthesizer`: text → audio bytes
//! - `Transcriber`: audio bytes → text

pub mod anthropic;
pub mod chat;
pub mod elevenlabs;
pub mod prompts;
pub mod symptoms;

pub use anthropic::AnthropicClient;
pub use chat::{ChatMessage, ChatPanel, IgnoreReason, QuickAction, SendOutcome};
pub use elevenlabs::ElevenLabsClient;
pub use symptoms::{SymptomOutcome, SymptomPanel};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AssistantError;

/// Who wrote a chat turn. Assistant turns are "system" on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(alias = "assistant")]
    System,
}

/// One prior turn of a conversation, as sent in `conversationHistory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sender: Sender,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::System,
            text: text.into(),
        }
    }
}

#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate a reply to `message` given the prior turns (oldest first).
    async fn generate_reply(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, AssistantError>;
}

#[async_trait]
pub trait SymptomAdvisor: Send + Sync {
    async fn assess_symptoms(&self, symptoms: &str) -> Result<String, AssistantError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`. `voice_id` overrides the configured voice.
    async fn synthesize(&self, text: &str, voice_id: Option<&str>)
    -> Result<Vec<u8>, AssistantError>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, AssistantError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_accepts_wire_sender_names() {
        let turns: Vec<ConversationTurn> = serde_json::from_value(serde_json::json!([
            {"sender": "user", "text": "hi"},
            {"sender": "system", "text": "hello"},
            {"sender": "assistant", "text": "again"},
        ]))
        .unwrap();
        assert_eq!(turns[0], ConversationTurn::user("hi"));
        assert_eq!(turns[1].sender, Sender::System);
        assert_eq!(turns[2].sender, Sender::System);
        assert_eq!(
            serde_json::to_value(&turns[2]).unwrap()["sender"],
            "system"
        );
    }
}
