//! Reminder DTOs - Data Transfer Objects per promemoria

use crate::dtos::{ChatDTO, UserDTO};
use crate::entities::{Chat, Reminder, ReminderKind, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /reminders`.
///
/// Every field is optional at the serde level so that a missing field is
/// reported as a validation error (400) by the service instead of a
/// deserialization rejection.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReminderDTO {
    #[serde(alias = "type")]
    pub kind: Option<ReminderKind>,
    pub chat_id: Option<i32>,
    #[validate(length(max = 120, message = "Title cannot exceed 120 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "Message must be between 1 and 2000 characters"))]
    pub message: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
}

/// DTO per creare un nuovo promemoria nello store (senza id, assegnato dallo store)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateReminderDTO {
    pub kind: ReminderKind,
    pub creator_id: i32,
    pub chat_id: Option<i32>,
    pub title: Option<String>,
    pub message: String,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Single-reminder mutations the store applies atomically.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateReminderDTO {
    /// Move the shared due time and reopen the reminder: clears the legacy
    /// resolution and the done ledger.
    Reschedule { due_at: DateTime<Utc> },
    /// Upsert the user's entry in the snooze ledger. The shared due time is untouched.
    Snooze { user_id: i32, until: DateTime<Utc> },
    /// Legacy resolution by a single user.
    ResolveLegacy { user_id: i32 },
    /// Flip the user's membership in the done ledger and drop any legacy resolution.
    ToggleDone { user_id: i32 },
}

/// Body of `PUT /reminders/{id}/reschedule` and `PUT /reminders/{id}/snooze`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleDTO {
    #[serde(alias = "until")]
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnoozeDTO {
    pub user_id: i32,
    pub until: DateTime<Utc>,
}

/// Reminder as returned to clients, joined with creator and chat.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDTO {
    pub id: i32,
    pub kind: ReminderKind,
    pub creator: UserDTO,
    pub chat: Option<ChatDTO>,
    pub title: Option<String>,
    pub message: String,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_done: bool,
    pub done_by: Option<i32>,
    pub marked_done_by: Vec<i32>,
    pub snoozed_by: Vec<SnoozeDTO>,
    pub remind_again_count: i32,
    pub notification_sent: bool,
}

impl ReminderDTO {
    /// Joins a reminder with its (possibly unresolved) creator and chat.
    /// The done flag is projected here, using the chat's participant count.
    pub fn from_parts(reminder: Reminder, creator: Option<User>, chat: Option<&Chat>) -> Self {
        let participants = chat.map(|c| c.participants.len()).unwrap_or(0);
        let is_done = reminder.is_done(participants);
        let creator = creator
            .map(UserDTO::from)
            .unwrap_or_else(|| UserDTO::unresolved(reminder.creator_id));

        Self {
            id: reminder.reminder_id,
            kind: reminder.kind,
            creator,
            chat: chat.map(ChatDTO::from),
            title: reminder.title,
            message: reminder.message,
            due_at: reminder.due_at,
            created_at: reminder.created_at,
            is_done,
            done_by: reminder.done_by,
            marked_done_by: reminder.marked_done_by.into_iter().collect(),
            snoozed_by: reminder
                .snoozed_by
                .into_iter()
                .map(|(user_id, until)| SnoozeDTO { user_id, until })
                .collect(),
            remind_again_count: reminder.remind_again_count,
            notification_sent: reminder.notification_sent,
        }
    }
}

/// Payload of the `reminderDue` real-time event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDueDTO {
    pub id: i32,
    pub message: String,
    pub due_at: DateTime<Utc>,
    pub kind: ReminderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i32>,
    pub creator_id: i32,
    pub created_by: String,
}

impl ReminderDueDTO {
    pub fn new(reminder: &Reminder, created_by: String) -> Self {
        Self {
            id: reminder.reminder_id,
            message: reminder.message.clone(),
            due_at: reminder.due_at,
            kind: reminder.kind,
            chat_id: reminder.chat_id,
            creator_id: reminder.creator_id,
            created_by,
        }
    }
}
