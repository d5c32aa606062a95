//! Request and response bodies of the assistant functions.

use serde::{Deserialize, Deserializer, Serialize};

use crate::assistant::ConversationTurn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymptomCheckRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub symptoms: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    /// Base64-encoded recording.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub audio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// `null` reads as an empty string, which then fails the "is required" check.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `{response}` returned by chat and symptom-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextResponse {
    pub response: String,
}

/// `{audio}` returned by the speech functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioResponse {
    /// Base64-encoded audio/mpeg.
    pub audio: String,
}

/// `{text}` returned by speech-to-text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// `{error, details?}` returned on any failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::Sender;

    #[test]
    fn chat_request_reads_camel_case_history() {
        let req: ChatRequest = serde_json::from_value(serde_json::json!({
            "message": "hi",
            "conversationHistory": [{"sender": "system", "text": "Hello!"}]
        }))
        .unwrap();
        assert_eq!(req.conversation_history.len(), 1);
        assert_eq!(req.conversation_history[0].sender, Sender::System);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let req: ChatRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.message.is_empty());
        assert!(req.conversation_history.is_empty());

        let req: SpeechRequest =
            serde_json::from_value(serde_json::json!({"message": "hi"})).unwrap();
        assert!(req.voice_id.is_none());

        let req: SymptomCheckRequest =
            serde_json::from_value(serde_json::json!({"symptoms": null})).unwrap();
        assert!(req.symptoms.is_empty());
    }

    #[test]
    fn error_body_omits_empty_details() {
        assert_eq!(
            serde_json::to_value(ErrorBody::new("Message is required")).unwrap(),
            serde_json::json!({"error": "Message is required"})
        );
    }
}
