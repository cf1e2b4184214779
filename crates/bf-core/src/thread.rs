// SPDX-License-Identifier: MIT OR Apache-2.0
//! A linear conversation attached to a Project, used by the Intent Router
//! (C1) to disambiguate follow-up turns.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user.
    User,
    /// The generation pipeline / agent.
    Agent,
}

/// A single turn in a [`Thread`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    /// Who sent this message.
    pub role: Role,
    /// Message body.
    pub content: String,
    /// When the message was recorded.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Construct a user-authored message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Construct an agent-authored message stamped with the current time.
    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// An ordered conversation attached to a single Project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Thread {
    /// Unique identifier.
    pub id: Uuid,
    /// The Project this thread belongs to.
    pub project_id: Uuid,
    /// Ordered messages, oldest first.
    pub messages: Vec<Message>,
}

impl Thread {
    /// Create a new, empty thread for a project.
    pub fn new(project_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            messages: Vec::new(),
        }
    }

    /// Append a message, preserving insertion order.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Whether this thread has any prior messages — the signal the Intent
    /// Router (§4.1) uses to decide whether REFINE is reachable.
    pub fn has_history(&self) -> bool {
        !self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_thread_has_no_history() {
        let t = Thread::new(Uuid::new_v4());
        assert!(!t.has_history());
    }

    #[test]
    fn pushing_a_message_creates_history() {
        let mut t = Thread::new(Uuid::new_v4());
        t.push(Message::user("build me an api"));
        assert!(t.has_history());
        assert_eq!(t.messages.len(), 1);
        assert_eq!(t.messages[0].role, Role::User);
    }

    #[test]
    fn messages_preserve_insertion_order() {
        let mut t = Thread::new(Uuid::new_v4());
        t.push(Message::user("first"));
        t.push(Message::agent("second"));
        t.push(Message::user("third"));
        let contents: Vec<_> = t.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }
}
