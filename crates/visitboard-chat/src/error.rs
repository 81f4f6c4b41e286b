use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("User name and password are required")]
    EmptyCredentials,

    #[error("User name {0} is taken")]
    UsernameTaken(String),

    #[error("Wrong user name or password")]
    InvalidCredentials,

    #[error("Topic title is empty")]
    EmptyTitle,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Topic not found: {0}")]
    TopicNotFound(String),
}

impl ChatError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyCredentials => "יש למלא שם משתמש וסיסמה.",
            Self::UsernameTaken(_) => "שם משתמש תפוס",
            Self::InvalidCredentials => "שם משתמש או סיסמה שגויים.",
            Self::EmptyTitle => "יש להזין כותרת לנושא.",
            Self::EmptyMessage => "לא ניתן לשלוח הודעה ריקה.",
            Self::TopicNotFound(_) => "הנושא לא נמצא.",
        }
    }
}
