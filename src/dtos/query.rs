//! Query DTOs - Data Transfer Objects per query di ricerca

use serde::{Deserialize, Serialize};

/// Which partition of a chat's reminders the viewer asks for.
/// Anything other than `done` means `active`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Done,
    #[default]
    #[serde(other)]
    Active,
}

/// DTO per query parameters `?status=active|done`
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ReminderStatusQuery {
    #[serde(default)]
    pub status: ReminderStatus,
}
