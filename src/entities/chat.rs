//! Chat entity - Vista della chat letta dalla directory delle chat

use super::enums::ChatType;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Chat {
    pub chat_id: i32,
    pub title: Option<String>,
    pub chat_type: ChatType,
    /// The single user allowed to delete shared reminders. Private chats have none.
    pub group_admin: Option<i32>,
    pub participants: Vec<i32>,
}

impl Chat {
    pub fn is_participant(&self, user_id: &i32) -> bool {
        self.participants.contains(user_id)
    }
}
