//! Anthropic Messages API adapter for chat replies and symptom checks.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::prompts;
use super::{ConversationTurn, ReplyGenerator, Sender, SymptomAdvisor};
use crate::config::AnthropicConfig;
use crate::error::AssistantError;

const PROVIDER: &str = "Anthropic";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for `POST /v1/messages`.
pub struct AnthropicClient {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AssistantError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    async fn complete(
        &self,
        model: &str,
        max_tokens: u32,
        system: Option<&str>,
        messages: Vec<ApiMessage>,
    ) -> Result<String, AssistantError> {
        let body = MessagesRequest {
            model,
            max_tokens,
            system,
            messages,
        };

        let resp = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model, "Anthropic API error");
            return Err(AssistantError::Upstream {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse =
            resp.json().await.map_err(|e| AssistantError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;

        first_text(parsed)
    }
}

fn transport_error(e: reqwest::Error) -> AssistantError {
    if e.is_timeout() {
        AssistantError::Timeout {
            provider: PROVIDER.into(),
            timeout: REQUEST_TIMEOUT,
        }
    } else {
        AssistantError::RequestFailed {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        }
    }
}

fn first_text(resp: MessagesResponse) -> Result<String, AssistantError> {
    resp.content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| AssistantError::InvalidResponse {
            provider: PROVIDER.into(),
            reason: "response has no text content".into(),
        })
}

/// Build the alternating user/assistant message list the API requires.
///
/// Leading assistant turns (the greeting) are dropped, empty turns are
/// skipped and consecutive turns from the same side are merged. The new
/// message always ends the list.
fn fold_history(history: &[ConversationTurn], message: &str) -> Vec<ApiMessage> {
    let mut messages: Vec<ApiMessage> = Vec::with_capacity(history.len() + 1);
    let turns = history
        .iter()
        .filter(|turn| !turn.text.trim().is_empty())
        .map(|turn| {
            let role = match turn.sender {
                Sender::User => "user",
                Sender::System => "assistant",
            };
            (role, turn.text.clone())
        })
        .chain(std::iter::once(("user", prompts::chat_message(message))));

    for (role, content) in turns {
        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&content);
                continue;
            }
            None if role == "assistant" => continue,
            _ => {}
        }
        messages.push(ApiMessage { role, content });
    }
    messages
}

#[async_trait]
impl ReplyGenerator for AnthropicClient {
    async fn generate_reply(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, AssistantError> {
        if message.trim().is_empty() {
            return Err(AssistantError::EmptyInput("Message is required"));
        }
        tracing::debug!(
            model = %self.config.chat_model,
            history = history.len(),
            "Generating chat reply"
        );
        self.complete(
            &self.config.chat_model,
            self.config.chat_max_tokens,
            Some(prompts::LYDIA_PERSONA),
            fold_history(history, message),
        )
        .await
    }
}

#[async_trait]
impl SymptomAdvisor for AnthropicClient {
    async fn assess_symptoms(&self, symptoms: &str) -> Result<String, AssistantError> {
        if symptoms.trim().is_empty() {
            return Err(AssistantError::EmptyInput("Symptoms are required"));
        }
        tracing::debug!(model = %self.config.symptom_model, "Assessing symptoms");
        self.complete(
            &self.config.symptom_model,
            self.config.symptom_max_tokens,
            None,
            vec![ApiMessage {
                role: "user",
                content: prompts::symptom_check(symptoms),
            }],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(messages: &[ApiMessage]) -> Vec<&'static str> {
        messages.iter().map(|m| m.role).collect()
    }

    #[test]
    fn fold_without_history_is_single_user_turn() {
        let messages = fold_history(&[], "I have a headache");
        assert_eq!(roles(&messages), vec!["user"]);
        assert_eq!(messages[0].content, "User message: I have a headache");
    }

    #[test]
    fn fold_drops_greeting_and_alternates() {
        let history = vec![
            ConversationTurn::system("Hello! I'm Lydia"),
            ConversationTurn::user("hi"),
            ConversationTurn::system("How can I help?"),
            ConversationTurn::system("Let's check your symptoms."),
        ];
        let messages = fold_history(&history, "my knee hurts");
        assert_eq!(roles(&messages), vec!["user", "assistant", "user"]);
        assert_eq!(
            messages[1].content,
            "How can I help?\n\nLet's check your symptoms."
        );
    }

    #[test]
    fn fold_merges_trailing_user_turn_with_new_message() {
        let history = vec![ConversationTurn::user("first"), ConversationTurn::user("  ")];
        let messages = fold_history(&history, "second");
        assert_eq!(roles(&messages), vec!["user"]);
        assert_eq!(messages[0].content, "first\n\nUser message: second");
    }

    #[test]
    fn first_text_skips_non_text_blocks() {
        let resp: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "Rest and fluids."}
            ]
        }))
        .unwrap();
        assert_eq!(first_text(resp).unwrap(), "Rest and fluids.");

        let empty: MessagesResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            first_text(empty),
            Err(AssistantError::InvalidResponse { .. })
        ));
    }
}
