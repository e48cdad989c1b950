use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    constants::prompts::GENERAL_SUBJECT,
    errors::{AppError, AppResult},
    models::domain::{ChatMessage, ChatPrompt, ChatTurn, TurnRole},
};

/// A generative-language backend that can continue a conversation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn send(&self, prompt: &ChatPrompt) -> AppResult<String>;
}

pub struct ChatService {
    client: Arc<dyn GenerativeClient>,
}

impl ChatService {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self { client }
    }

    /// Splits a message history into upstream history and the new prompt.
    ///
    /// The last message is the prompt. The service requires history to open
    /// with a user turn, so one leading model turn is dropped.
    pub fn build_prompt(subject: &str, messages: Vec<ChatMessage>) -> AppResult<ChatPrompt> {
        let mut turns: Vec<ChatTurn> = messages.into_iter().map(ChatTurn::from).collect();

        let last = turns
            .pop()
            .ok_or_else(|| AppError::ValidationError("messages must not be empty".to_string()))?;
        if last.text.trim().is_empty() {
            return Err(AppError::ValidationError(
                "the last message must have content".to_string(),
            ));
        }

        if turns.first().map(|t| t.role) == Some(TurnRole::Model) {
            turns.remove(0);
        }

        let subject = match subject.trim() {
            "" => GENERAL_SUBJECT.to_string(),
            s => s.to_string(),
        };

        Ok(ChatPrompt {
            subject,
            history: turns,
            message: last.text,
        })
    }

    pub async fn reply(&self, subject: &str, messages: Vec<ChatMessage>) -> AppResult<String> {
        let prompt = Self::build_prompt(subject, messages)?;

        log::info!(
            "Forwarding tutor prompt for subject '{}' with {} prior turns",
            prompt.subject,
            prompt.history.len()
        );

        self.client.send(&prompt).await.map_err(|e| {
            log::error!("Tutor upstream call failed: {}", e);
            match e {
                AppError::UpstreamError(_) => e,
                other => AppError::UpstreamError(other.to_string()),
            }
        })
    }
}
