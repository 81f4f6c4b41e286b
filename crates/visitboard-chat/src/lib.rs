//! Discussion board: registered users, topics and their messages.

pub mod error;
pub mod ops;
pub mod types;

pub use error::ChatError;
pub use ops::{add_message, create_topic, format_time, login, refresh_active, register, ChatSession, TopicFollower};
pub use types::{now_millis, ChatMessage, ChatTopic, ChatUser};
