//! Turn orchestration: build the request, call the backend, record the turn
//!
//! A turn is `Idle -> AwaitingBackend -> Idle`. The session is only touched
//! after the backend answers, so a failed call leaves it exactly as it was.

use crate::llm::{
    ContentBlock, ImageSource, LlmError, LlmMessage, LlmRequest, LlmService, MessageRole,
};
use crate::session::{Role, Session};
use std::sync::Arc;
use thiserror::Error;

/// Substrings that mark the user as wrapping up. Matching is
/// case-insensitive containment, not whole-word, so "I know" and "Nope, but
/// what's in the corner?" both count.
pub const CLOSING_KEYWORDS: &[&str] = &[
    "no",
    "nope",
    "nothing",
    "thanks",
    "thank you",
    "bye",
    "goodbye",
    "done",
];

/// Whether the input looks like a closing/farewell message
pub fn is_closing(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CLOSING_KEYWORDS.iter().any(|word| lowered.contains(word))
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy)]
pub struct TurnSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_tokens: 800,
        }
    }
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("Analysis failed: {0}")]
    Backend(#[from] LlmError),
}

/// Assemble the request for one turn: system block, full history replay,
/// then the new user turn. The stored image rides along only when the input
/// is not a closing message.
pub fn build_request(
    session: &Session,
    text: &str,
    system_prompt: &str,
    settings: TurnSettings,
) -> LlmRequest {
    let mut messages: Vec<LlmMessage> = session
        .all_turns()
        .iter()
        .map(|turn| match turn.role {
            Role::User => LlmMessage::user_text(&turn.content),
            Role::Assistant => LlmMessage::assistant_text(&turn.content),
        })
        .collect();

    let mut content = vec![ContentBlock::text(text)];
    if let Some(image) = session.image() {
        if !is_closing(text) {
            content.push(ContentBlock::Image {
                source: ImageSource::Base64 {
                    media_type: image.media_type().to_string(),
                    data: image.as_base64().to_string(),
                },
            });
        }
    }
    messages.push(LlmMessage {
        role: MessageRole::User,
        content,
    });

    LlmRequest {
        system: system_prompt.to_string(),
        messages,
        temperature: Some(settings.temperature),
        max_tokens: Some(settings.max_tokens),
    }
}

/// Drives one user submission through the backend
pub struct ChatOrchestrator {
    llm: Arc<dyn LlmService>,
    system_prompt: String,
    settings: TurnSettings,
}

impl ChatOrchestrator {
    pub fn new(llm: Arc<dyn LlmService>, system_prompt: String, settings: TurnSettings) -> Self {
        Self {
            llm,
            system_prompt,
            settings,
        }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    pub fn settings(&self) -> TurnSettings {
        self.settings
    }

    /// Run one turn. On success both turns are appended (user first) and the
    /// reply is returned; on failure the session is untouched.
    pub async fn handle_user_input(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<String, TurnError> {
        if text.trim().is_empty() {
            return Err(TurnError::EmptyInput);
        }

        let request = build_request(session, text, &self.system_prompt, self.settings);
        let attached_image = request.has_image();

        let response = match self.llm.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    history = session.turn_count(),
                    attached_image,
                    error = %e,
                    "Turn failed, history left unchanged"
                );
                return Err(TurnError::Backend(e));
            }
        };

        let reply = response.text();
        session.append_turn(Role::User, text);
        session.append_turn(Role::Assistant, reply.clone());

        tracing::info!(
            history = session.turn_count(),
            attached_image,
            reply_chars = reply.chars().count(),
            "Turn completed"
        );
        Ok(reply)
    }
}
