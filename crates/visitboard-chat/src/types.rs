use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub name: String,
    pub pass: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub author: String,
    pub text: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTopic {
    pub id: String,
    pub title: String,
    pub author: String,
    pub timestamp: i64,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatTopic {
    pub fn last_activity(&self) -> i64 {
        self.messages
            .last()
            .map(|m| m.timestamp)
            .unwrap_or(self.timestamp)
    }
}
