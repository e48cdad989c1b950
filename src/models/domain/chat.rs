use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Speaker roles as the generative-language service names them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

/// A conversation ready to send upstream: prior turns plus the new prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatPrompt {
    pub subject: String,
    pub history: Vec<ChatTurn>,
    pub message: String,
}

impl From<ChatRole> for TurnRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => TurnRole::User,
            ChatRole::Assistant => TurnRole::Model,
        }
    }
}

impl From<ChatMessage> for ChatTurn {
    fn from(message: ChatMessage) -> Self {
        ChatTurn {
            role: message.role.into(),
            text: message.content,
        }
    }
}
