//! HTTP endpoints for the assistant functions.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use super::model::{
    AudioResponse, ChatRequest, ErrorBody, SpeechRequest, SymptomCheckRequest, TextResponse,
    TranscriptionRequest, TranscriptionResponse,
};
use crate::assistant::{
    AnthropicClient, ElevenLabsClient, ReplyGenerator, SpeechSynthesizer, SymptomAdvisor,
    Transcriber,
};
use crate::config::AppConfig;
use crate::error::AssistantError;

const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// Collaborators behind the functions. `None` means the vendor key is not
/// configured; the endpoint then answers with an error body.
#[derive(Clone, Default)]
pub struct AppState {
    pub replies: Option<Arc<dyn ReplyGenerator>>,
    pub symptoms: Option<Arc<dyn SymptomAdvisor>>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
}

impl AppState {
    /// Wire the vendor adapters that have keys configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, AssistantError> {
        let mut state = Self::default();
        if let Some(anthropic) = &config.anthropic {
            let client = Arc::new(AnthropicClient::new(anthropic.clone())?);
            state.replies = Some(client.clone());
            state.symptoms = Some(client);
        }
        if let Some(voice) = &config.voice {
            let client = Arc::new(ElevenLabsClient::new(voice.clone())?);
            state.speech = Some(client.clone());
            state.transcriber = Some(client);
        }
        Ok(state)
    }
}

/// Build the functions router: `/functions/v1/*` plus `/health`.
pub fn function_routes(state: AppState) -> Router {
    let functions = Router::new()
        .route("/chat", post(chat))
        .route("/symptom-check", post(symptom_check))
        .route("/eleven-labs-voice", post(eleven_labs_voice))
        .route("/text-to-speech", post(text_to_speech))
        .route("/speech-to-text", post(speech_to_text));

    Router::new()
        .nest("/functions/v1", functions)
        .route("/health", get(health))
        .layer(cors())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

fn error_response(status: StatusCode, body: ErrorBody) -> Response {
    (status, Json(body)).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, ErrorBody::new(message))
}

fn rejected(rejection: JsonRejection) -> Response {
    warn!(error = %rejection, "Malformed request body");
    bad_request(rejection.body_text())
}

fn not_configured(provider: &'static str) -> Response {
    bad_request(AssistantError::NotConfigured { provider }.to_string())
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lydia-functions"
    }))
}

// ── Text ────────────────────────────────────────────────────────────────

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    if req.message.trim().is_empty() {
        return bad_request("Message is required");
    }
    let Some(replies) = state.replies else {
        warn!("Chat requested without an Anthropic key");
        return not_configured("Anthropic");
    };

    info!(
        chars = req.message.chars().count(),
        history = req.conversation_history.len(),
        "Processing chat message"
    );
    match replies
        .generate_reply(&req.message, &req.conversation_history)
        .await
    {
        Ok(response) => Json(TextResponse { response }).into_response(),
        Err(e) => {
            warn!(error = %e, "Chat error");
            bad_request(e.to_string())
        }
    }
}

async fn symptom_check(
    State(state): State<AppState>,
    body: Result<Json<SymptomCheckRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    if req.symptoms.trim().is_empty() {
        return bad_request("Symptoms are required");
    }
    let Some(advisor) = state.symptoms else {
        warn!("Symptom check requested without an Anthropic key");
        return not_configured("Anthropic");
    };

    info!(chars = req.symptoms.chars().count(), "Processing symptoms");
    match advisor.assess_symptoms(&req.symptoms).await {
        Ok(response) => Json(TextResponse { response }).into_response(),
        Err(e) => {
            warn!(error = %e, "Symptom check error");
            bad_request(e.to_string())
        }
    }
}

// ── Voice ───────────────────────────────────────────────────────────────

/// Validate a speech request and pick the synthesizer.
fn speech_for(
    state: &AppState,
    req: &SpeechRequest,
) -> Result<Arc<dyn SpeechSynthesizer>, Response> {
    if req.message.trim().is_empty() {
        return Err(bad_request("Message is required"));
    }
    match &state.speech {
        Some(speech) => Ok(speech.clone()),
        None => {
            warn!("Speech requested without an ElevenLabs key");
            Err(not_configured("ElevenLabs"))
        }
    }
}

async fn eleven_labs_voice(
    State(state): State<AppState>,
    body: Result<Json<SpeechRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    let speech = match speech_for(&state, &req) {
        Ok(speech) => speech,
        Err(resp) => return resp,
    };

    match speech.synthesize(&req.message, req.voice_id.as_deref()).await {
        Ok(audio) => {
            info!(bytes = audio.len(), "Speech synthesized");
            Json(AudioResponse {
                audio: BASE64.encode(audio),
            })
            .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Voice generation error");
            bad_request(e.to_string())
        }
    }
}

/// Same contract as `eleven-labs-voice`, except that an unreachable voice
/// service answers 503.
async fn text_to_speech(
    State(state): State<AppState>,
    body: Result<Json<SpeechRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    let speech = match speech_for(&state, &req) {
        Ok(speech) => speech,
        Err(resp) => return resp,
    };

    match speech.synthesize(&req.message, req.voice_id.as_deref()).await {
        Ok(audio) => {
            info!(bytes = audio.len(), "Speech synthesized");
            Json(AudioResponse {
                audio: BASE64.encode(audio),
            })
            .into_response()
        }
        Err(e) if e.is_unavailable() => {
            warn!(error = %e, "Text-to-speech error");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "Text-to-speech service is unavailable".into(),
                    details: Some(e.to_string()),
                },
            )
        }
        Err(e) => {
            warn!(error = %e, "Text-to-speech error");
            bad_request(e.to_string())
        }
    }
}

async fn speech_to_text(
    State(state): State<AppState>,
    body: Result<Json<TranscriptionRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    if req.audio.trim().is_empty() {
        return bad_request("Audio is required");
    }
    let audio = match BASE64.decode(req.audio.trim()) {
        Ok(audio) => audio,
        Err(e) => {
            warn!(error = %e, "Audio is not valid base64");
            return bad_request("Audio must be base64-encoded");
        }
    };
    let Some(transcriber) = state.transcriber else {
        warn!("Transcription requested without an ElevenLabs key");
        return not_configured("ElevenLabs");
    };

    let mime_type = req.mime_type.as_deref().unwrap_or(DEFAULT_AUDIO_MIME);
    match transcriber.transcribe(&audio, mime_type).await {
        Ok(text) => {
            info!(chars = text.chars().count(), "Audio transcribed");
            Json(TranscriptionResponse { text }).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Transcription error");
            bad_request(e.to_string())
        }
    }
}
