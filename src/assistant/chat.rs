//! ChatPanel: the dashboard conversation with Lydia.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{ConversationTurn, ReplyGenerator, Sender, SpeechSynthesizer, Transcriber};
use crate::notice::Notice;

pub const GREETING: &str = "Hello! I'm Lydia, your AI health assistant. How can I help you today?";

/// A rendered chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn turn(&self) -> ConversationTurn {
        ConversationTurn {
            sender: self.sender,
            text: self.text.clone(),
        }
    }
}

/// Canned assistant prompts offered as buttons next to the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    SymptomAssessment,
    ScheduleAppointment,
}

impl QuickAction {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::SymptomAssessment => {
                "Let's check your symptoms. Can you describe what you're experiencing?"
            }
            Self::ScheduleAppointment => {
                "I'd be happy to help you schedule an appointment. What type of doctor would you like to see?"
            }
        }
    }
}

/// Why a send did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyInput,
    /// Another send is still waiting for its reply.
    Busy,
    Closed,
}

/// Result of a send.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The user message and the reply were appended. `audio` holds the
    /// spoken reply when voice is on and synthesis worked.
    Replied {
        reply: ChatMessage,
        audio: Option<Vec<u8>>,
    },
    /// Nothing was sent.
    Ignored(IgnoreReason),
    /// The collaborator failed; messages are exactly as before the send.
    Failed(Notice),
    /// The panel was closed while the request was in flight.
    Discarded,
}

#[derive(Debug)]
struct ChatState {
    messages: Vec<ChatMessage>,
    pending: Option<String>,
    muted: bool,
    closed: bool,
    next_id: u64,
}

impl ChatState {
    fn push(&mut self, sender: Sender, text: String) -> ChatMessage {
        let message = ChatMessage {
            id: self.next_id,
            sender,
            text,
            sent_at: Utc::now(),
        };
        self.next_id += 1;
        self.messages.push(message.clone());
        message
    }
}

/// Conversation state plus the collaborators it talks to.
///
/// At most one send is in flight. Messages only change when a reply
/// arrives, so a failed or discarded send leaves them untouched; the
/// in-flight text is exposed through [`ChatPanel::pending`].
pub struct ChatPanel {
    state: RwLock<ChatState>,
    replies: Arc<dyn ReplyGenerator>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl ChatPanel {
    pub fn new(replies: Arc<dyn ReplyGenerator>) -> Self {
        let mut state = ChatState {
            messages: Vec::new(),
            pending: None,
            muted: false,
            closed: false,
            next_id: 1,
        };
        state.push(Sender::System, GREETING.to_string());
        Self {
            state: RwLock::new(state),
            replies,
            speech: None,
            transcriber: None,
        }
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().await.messages.clone()
    }

    /// Text of the send awaiting a reply, if any. Drives the typing
    /// indicator.
    pub async fn pending(&self) -> Option<String> {
        self.state.read().await.pending.clone()
    }

    pub async fn is_pending(&self) -> bool {
        self.state.read().await.pending.is_some()
    }

    pub async fn is_muted(&self) -> bool {
        self.state.read().await.muted
    }

    pub async fn set_muted(&self, muted: bool) {
        self.state.write().await.muted = muted;
    }

    /// Append a canned assistant prompt. Returns `None` once closed.
    pub async fn quick_action(&self, action: QuickAction) -> Option<ChatMessage> {
        let mut state = self.state.write().await;
        if state.closed {
            return None;
        }
        Some(state.push(Sender::System, action.prompt().to_string()))
    }

    /// Stop accepting sends. A reply still in flight resolves to
    /// `SendOutcome::Discarded`.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        state.closed = true;
        state.pending = None;
    }

    /// Send a typed message.
    pub async fn send(&self, input: &str) -> SendOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::Ignored(IgnoreReason::EmptyInput);
        }

        let history: Vec<ConversationTurn> = {
            let mut state = self.state.write().await;
            if state.closed {
                return SendOutcome::Ignored(IgnoreReason::Closed);
            }
            if state.pending.is_some() {
                debug!("Send ignored, reply still pending");
                return SendOutcome::Ignored(IgnoreReason::Busy);
            }
            state.pending = Some(text.to_string());
            state.messages.iter().map(ChatMessage::turn).collect()
        };

        let result = self.replies.generate_reply(text, &history).await;

        let (reply, muted) = {
            let mut state = self.state.write().await;
            if state.closed {
                debug!("Reply arrived after close, discarding");
                return SendOutcome::Discarded;
            }
            state.pending = None;
            match result {
                Ok(reply) => {
                    state.push(Sender::User, text.to_string());
                    (state.push(Sender::System, reply), state.muted)
                }
                Err(e) => {
                    warn!(error = %e, "Chat reply failed");
                    return SendOutcome::Failed(Notice::error(
                        "Error",
                        "There was an error processing your message. Please try again.",
                    ));
                }
            }
        };
        info!(message_id = reply.id, "Chat reply received");

        let audio = match (&self.speech, muted) {
            (Some(speech), false) => match speech.synthesize(&reply.text, None).await {
                Ok(audio) => Some(audio),
                Err(e) => {
                    warn!(error = %e, "Text-to-speech failed, reply shown without audio");
                    None
                }
            },
            _ => None,
        };

        SendOutcome::Replied { reply, audio }
    }

    /// Transcribe a voice recording and send the transcript.
    pub async fn send_voice(&self, audio: &[u8], mime_type: &str) -> SendOutcome {
        let Some(transcriber) = &self.transcriber else {
            return SendOutcome::Failed(Notice::error(
                "Voice recognition not supported",
                "Please type your message instead.",
            ));
        };
        {
            let state = self.state.read().await;
            if state.closed {
                return SendOutcome::Ignored(IgnoreReason::Closed);
            }
            if state.pending.is_some() {
                debug!("Voice input ignored, reply still pending");
                return SendOutcome::Ignored(IgnoreReason::Busy);
            }
        }

        match transcriber.transcribe(audio, mime_type).await {
            Ok(transcript) => self.send(&transcript).await,
            Err(e) => {
                warn!(error = %e, "Transcription failed");
                SendOutcome::Failed(Notice::error(
                    "Voice recognition error",
                    "Please try again or type your message",
                ))
            }
        }
    }
}
