//! API request and response types

use super::markdown::render_markdown;
use crate::session::{Role, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: String,
}

/// Full session view used to (re)render the page
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub turns: Vec<TurnView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInfo>,
}

/// One recorded turn. Assistant turns also carry their rendered Markdown.
#[derive(Debug, Serialize)]
pub struct TurnView {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
            content_html: match turn.role {
                Role::Assistant => Some(render_markdown(&turn.content)),
                Role::User => None,
            },
            created_at: turn.created_at,
        }
    }
}

/// The attached image, as the sidebar preview needs it
#[derive(Debug, Serialize)]
pub struct ImageInfo {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// Image upload: base64 of the raw file, optionally as a `data:` URL
#[derive(Debug, Deserialize)]
pub struct UploadImageRequest {
    pub data: String,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response for a completed turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub reply_html: String,
}

impl ChatResponse {
    pub fn new(reply: String) -> Self {
        let reply_html = render_markdown(&reply);
        Self { reply, reply_html }
    }
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Branding and sampling parameters shown in the page
#[derive(Debug, Serialize)]
pub struct AppInfoResponse {
    pub app_name: &'static str,
    pub app_emoji: &'static str,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
