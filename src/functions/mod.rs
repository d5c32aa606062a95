//! Assistant functions: a small JSON-over-HTTP proxy in front of the AI
//! text and voice vendors.
//!
//! Routes (all `POST`, under `/functions/v1`):
//! - `chat`: `{message, conversationHistory?}` → `{response}`
//! - `symptom-check`: `{symptoms}` → `{response}`
//! - `eleven-labs-voice`, `text-to-speech`: `{message, voice_id?}` → `{audio}`
//! - `speech-to-text`: `{audio, mime_type?}` → `{text}`
//!
//! Failures answer `{error}` with status 400 (503 from `text-to-speech` when
//! the voice service cannot be reached).

pub mod model;
pub mod routes;

pub use routes::{AppState, function_routes};
