//! Chat DTOs - Data Transfer Objects per chat

use crate::entities::{Chat, ChatType};
use serde::{Deserialize, Serialize};

/// Riassunto della chat allegato ai promemoria di gruppo
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatDTO {
    pub chat_id: i32,
    pub title: Option<String>,
    pub chat_type: ChatType,
}

impl From<&Chat> for ChatDTO {
    fn from(value: &Chat) -> Self {
        Self {
            chat_id: value.chat_id,
            title: value.title.clone(),
            chat_type: value.chat_type,
        }
    }
}
