//! Chat operations over in-memory copies of the users and topics lists.
//!
//! Callers fetch the current list, apply one of these, and save the whole
//! list back.

use chrono::{Local, TimeZone};
use uuid::Uuid;

use crate::error::ChatError;
use crate::types::{now_millis, ChatMessage, ChatTopic, ChatUser};

/// A logged-in chat user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    name: String,
}

impl ChatSession {
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Add a user. Names are unique; neither part may be empty.
pub fn register(users: &mut Vec<ChatUser>, name: &str, pass: &str) -> Result<(), ChatError> {
    if name.is_empty() || pass.is_empty() {
        return Err(ChatError::EmptyCredentials);
    }
    if users.iter().any(|u| u.name == name) {
        return Err(ChatError::UsernameTaken(name.to_string()));
    }

    users.push(ChatUser {
        name: name.to_string(),
        pass: pass.to_string(),
    });
    tracing::info!(user = name, "chat user registered");
    Ok(())
}

pub fn login(users: &[ChatUser], name: &str, pass: &str) -> Result<ChatSession, ChatError> {
    users
        .iter()
        .find(|u| u.name == name && u.pass == pass)
        .map(|u| ChatSession { name: u.name.clone() })
        .ok_or(ChatError::InvalidCredentials)
}

/// Start a topic; it goes to the front of the list.
pub fn create_topic(topics: &mut Vec<ChatTopic>, title: &str, session: &ChatSession) -> Result<ChatTopic, ChatError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ChatError::EmptyTitle);
    }

    let topic = ChatTopic {
        id: new_id(),
        title: title.to_string(),
        author: session.name.clone(),
        timestamp: now_millis(),
        messages: Vec::new(),
    };
    topics.insert(0, topic.clone());
    Ok(topic)
}

/// Append a message to `topic_id`.
///
/// `topics` should be the freshly fetched list, so messages written by
/// others since the last poll survive the save.
pub fn add_message(
    topics: &mut [ChatTopic],
    topic_id: &str,
    session: &ChatSession,
    text: &str,
) -> Result<ChatMessage, ChatError> {
    if text.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }

    let topic = topics
        .iter_mut()
        .find(|t| t.id == topic_id)
        .ok_or_else(|| ChatError::TopicNotFound(topic_id.to_string()))?;

    let message = ChatMessage {
        id: new_id(),
        author: session.name.clone(),
        text: text.to_string(),
        timestamp: now_millis(),
    };
    topic.messages.push(message.clone());
    Ok(message)
}

/// The refreshed copy of `active`, if its messages changed.
pub fn refresh_active<'a>(updated: &'a [ChatTopic], active: &ChatTopic) -> Option<&'a ChatTopic> {
    updated
        .iter()
        .find(|t| t.id == active.id)
        .filter(|t| t.messages != active.messages)
}

/// Keeps the open topic in step with polled topic lists.
#[derive(Debug, Clone)]
pub struct TopicFollower {
    active: ChatTopic,
}

impl TopicFollower {
    pub fn new(active: ChatTopic) -> Self {
        Self { active }
    }

    pub fn active(&self) -> &ChatTopic {
        &self.active
    }

    /// Adopt the refreshed copy of the open topic and return the messages
    /// not seen before. A list without the topic changes nothing.
    pub fn poll(&mut self, updated: &[ChatTopic]) -> Vec<ChatMessage> {
        let Some(fresh) = refresh_active(updated, &self.active) else {
            return Vec::new();
        };
        let unseen = fresh
            .messages
            .iter()
            .filter(|m| !self.active.messages.iter().any(|seen| seen.id == m.id))
            .cloned()
            .collect();
        self.active = fresh.clone();
        unseen
    }
}

/// Local wall-clock `HH:MM` for an epoch-millisecond timestamp.
pub fn format_time(timestamp: i64) -> String {
    match Local.timestamp_millis_opt(timestamp).single() {
        Some(t) => t.format("%H:%M").to_string(),
        None => String::new(),
    }
}
