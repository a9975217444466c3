//! Common repository traits
//!
//! This module defines the interfaces the reminder core depends on: the durable
//! reminder store and the two read-only directories owned by the chat backend.
//! Each trait has a MySQL and an in-memory implementation.

use crate::dtos::{CreateReminderDTO, UpdateReminderDTO};
use crate::entities::{Chat, Reminder, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;

/// Predicates the store knows how to evaluate.
///
/// Results are always ordered by `due_at` ascending, then by id.
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderFilter {
    /// Personal reminders created by `user_id` plus group reminders in `chat_ids`.
    VisibleTo { user_id: i32, chat_ids: Vec<i32> },
    /// Group reminders attached to any of the given chats.
    GroupInChats(Vec<i32>),
    /// Reminders whose notification is still pending and whose due time is at or before `now`,
    /// minus the ones already resolved by the legacy flag or, for personal reminders, by the
    /// done ledger. Group ledger completion depends on the chat size and is left to the caller.
    DueUnsent { now: DateTime<Utc> },
}

impl ReminderFilter {
    pub fn matches(&self, reminder: &Reminder) -> bool {
        use crate::entities::ReminderKind;
        match self {
            ReminderFilter::VisibleTo { user_id, chat_ids } => match reminder.kind {
                ReminderKind::Personal => reminder.creator_id == *user_id,
                ReminderKind::Group => reminder
                    .chat_id
                    .is_some_and(|chat_id| chat_ids.contains(&chat_id)),
            },
            ReminderFilter::GroupInChats(chat_ids) => {
                reminder.kind == ReminderKind::Group
                    && reminder
                        .chat_id
                        .is_some_and(|chat_id| chat_ids.contains(&chat_id))
            }
            ReminderFilter::DueUnsent { now } => {
                !reminder.notification_sent
                    && reminder.due_at <= *now
                    && reminder.done_by.is_none()
                    && !(reminder.kind == ReminderKind::Personal
                        && !reminder.marked_done_by.is_empty())
            }
        }
    }
}

/// Durable record of reminders and their per-user state.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Creates a reminder with lifecycle defaults and a store-assigned id
    ///
    /// # Returns
    /// * `Ok(Reminder)` - Created reminder, empty ledgers, notification not sent
    /// * `Err(sqlx::Error)` - Error during insertion
    async fn create(&self, data: &CreateReminderDTO) -> Result<Reminder, Error>;

    /// Reads a reminder with its done and snooze ledgers
    ///
    /// # Returns
    /// * `Ok(Some(Reminder))` - Reminder found
    /// * `Ok(None)` - No reminder with that id
    async fn read(&self, id: &i32) -> Result<Option<Reminder>, Error>;

    /// Reads every reminder matching `filter`, ordered by due time.
    async fn find_many(&self, filter: &ReminderFilter) -> Result<Vec<Reminder>, Error>;

    /// Applies one mutation atomically with respect to other mutations of the same reminder.
    ///
    /// # Returns
    /// * `Ok(Some(Reminder))` - State after the mutation
    /// * `Ok(None)` - No reminder with that id, nothing written
    async fn update(&self, id: &i32, data: &UpdateReminderDTO) -> Result<Option<Reminder>, Error>;

    /// Compare-and-set of the notification flag from `false` to `true`.
    ///
    /// # Returns
    /// * `Ok(true)` - This call performed the transition
    /// * `Ok(false)` - Already sent, or no such reminder
    async fn mark_sent(&self, id: &i32) -> Result<bool, Error>;

    /// Deletes a reminder and its ledgers
    ///
    /// # Returns
    /// * `Ok(true)` - Deleted by this call
    /// * `Ok(false)` - Nothing to delete
    async fn delete(&self, id: &i32) -> Result<bool, Error>;
}

/// Read-only view over the user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn read(&self, id: &i32) -> Result<Option<User>, Error>;
}

/// Read-only view over chats and their membership.
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    /// Reads a chat together with its participants and group admin.
    async fn read(&self, id: &i32) -> Result<Option<Chat>, Error>;

    /// Ids of every chat the user participates in.
    async fn find_chat_ids_by_user(&self, user_id: &i32) -> Result<Vec<i32>, Error>;
}
