//! WebSocket Event DTOs - Data Transfer Objects per eventi WebSocket

use crate::dtos::ReminderDueDTO;
use serde::{Deserialize, Serialize};

/// Tagged union per eventi WebSocket
/// Serde serializza questo come:
/// { "type": "reminderDue", "data": { ... } }
/// oppure
/// { "type": "error", "data": { "code": ..., "message": ... } }
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data")]
pub enum WsEventDTO {
    #[serde(rename = "reminderDue")]
    ReminderDue(ReminderDueDTO),
    #[serde(rename = "error")]
    Error { code: u16, message: String },
}
