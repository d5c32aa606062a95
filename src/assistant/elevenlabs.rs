//! ElevenLabs adapter: text-to-speech and speech-to-text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::{SpeechSynthesizer, Transcriber};
use crate::config::VoiceConfig;
use crate::error::AssistantError;

const PROVIDER: &str = "ElevenLabs";
const TRANSCRIPTION_MODEL: &str = "scribe_v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Client for the ElevenLabs speech endpoints.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    config: VoiceConfig,
}

impl ElevenLabsClient {
    pub fn new(config: VoiceConfig) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AssistantError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, AssistantError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "ElevenLabs API error");
        Err(AssistantError::Upstream {
            provider: PROVIDER.into(),
            status: status.as_u16(),
            body,
        })
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

/// File name sent with an upload; the service sniffs the format from it.
fn upload_name(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/mpeg" | "audio/mp3" => "audio.mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "audio.wav",
        "audio/ogg" => "audio.ogg",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "audio.m4a",
        _ => "audio.webm",
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<Vec<u8>, AssistantError> {
        if text.trim().is_empty() {
            return Err(AssistantError::EmptyInput("Message is required"));
        }
        let voice_id = voice_id
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(self.config.voice_id.as_str());
        tracing::debug!(voice_id, chars = text.chars().count(), "Synthesizing speech");

        let body = SpeechRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let resp = self
            .client
            .post(self.api_url(&format!("text-to-speech/{voice_id}")))
            .header("xi-api-key", self.config.api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let bytes = Self::check(resp)
            .await?
            .bytes()
            .await
            .map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Transcriber for ElevenLabsClient {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, AssistantError> {
        if audio.is_empty() {
            return Err(AssistantError::EmptyInput("Audio is required"));
        }

        let part = Part::bytes(audio.to_vec())
            .file_name(upload_name(mime_type))
            .mime_str(mime_type)
            .map_err(|e| AssistantError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("Invalid audio type {mime_type}: {e}"),
            })?;
        let form = Form::new()
            .text("model_id", TRANSCRIPTION_MODEL)
            .part("file", part);

        let resp = self
            .client
            .post(self.api_url("speech-to-text"))
            .header("xi-api-key", self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let parsed: TranscriptionResponse = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;
        Ok(parsed.text.trim().to_string())
    }
}
