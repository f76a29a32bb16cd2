//! Per-tab chat session: ordered turn history plus a single image slot
//!
//! Nothing here is persisted. A session lives as long as the host keeps it in
//! the [`SessionRegistry`].

mod registry;

pub use registry::{SessionHandle, SessionRegistry};

use crate::upload::ImagePayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the exchange. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Mutable aggregate of turns and the currently attached image
#[derive(Debug, Default)]
pub struct Session {
    turns: Vec<Turn>,
    image: Option<ImagePayload>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_turn(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn::new(role, content));
    }

    /// Replace the image slot wholesale; `None` clears it
    pub fn set_image(&mut self, image: Option<ImagePayload>) {
        self.image = image;
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    /// Drop all turns and the image. Anything already sent to the backend is
    /// unaffected.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.image = None;
    }

    pub fn all_turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(data: &str) -> ImagePayload {
        ImagePayload::from_base64(data)
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(session.is_empty());
        assert!(session.all_turns().is_empty());
        assert!(session.image().is_none());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut session = Session::new();
        session.append_turn(Role::User, "first");
        session.append_turn(Role::Assistant, "second");
        session.append_turn(Role::User, "third");

        let contents: Vec<_> = session
            .all_turns()
            .iter()
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(contents, ["first", "second", "third"]);
        assert_eq!(session.all_turns()[1].role, Role::Assistant);
        assert_eq!(session.turn_count(), 3);
    }

    #[test]
    fn test_second_image_replaces_first() {
        let mut session = Session::new();
        session.set_image(Some(payload("AAAA")));
        session.set_image(Some(payload("BBBB")));
        assert_eq!(session.image().map(ImagePayload::as_base64), Some("BBBB"));

        session.set_image(None);
        assert!(session.image().is_none());
    }

    #[test]
    fn test_reset_clears_turns_and_image() {
        let mut session = Session::new();
        session.append_turn(Role::User, "hello");
        session.set_image(Some(payload("AAAA")));

        session.reset();
        assert!(session.is_empty());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut session = Session::new();
        session.append_turn(Role::User, "hello");
        session.append_turn(Role::Assistant, "hi");
        session.set_image(Some(payload("AAAA")));

        session.reset();
        let once = (session.all_turns().to_vec(), session.image().cloned());
        session.reset();
        let twice = (session.all_turns().to_vec(), session.image().cloned());
        assert_eq!(once, twice);
        assert!(session.is_empty());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
        assert_eq!(serde_json::to_value(Role::Assistant).unwrap(), "assistant");
    }
}
