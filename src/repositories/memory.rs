//! In-memory repositories - Store e directory in memoria
//!
//! Usati dal backend `STORE_BACKEND=memory` e da tutti i test. Ogni promemoria vive
//! in una entry di una DashMap: una mutazione tiene il lock della entry per tutta la
//! durata del read-modify-write, quindi due mutazioni sullo stesso promemoria non si
//! intrecciano mai.

use super::{ChatDirectory, ReminderFilter, ReminderStore, UserDirectory};
use crate::dtos::{CreateReminderDTO, UpdateReminderDTO};
use crate::entities::{Chat, Reminder, User};
use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::Error;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::{debug, info, instrument};

// REMINDER STORE
pub struct InMemoryReminderStore {
    reminders: DashMap<i32, Reminder>,
    next_id: AtomicI32,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        Self {
            reminders: DashMap::new(),
            next_id: AtomicI32::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }
}

impl Default for InMemoryReminderStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies a mutation to a reminder the caller holds exclusively.
pub fn apply_update(reminder: &mut Reminder, data: &UpdateReminderDTO) {
    match data {
        UpdateReminderDTO::Reschedule { due_at } => {
            reminder.due_at = *due_at;
            reminder.done_by = None;
            reminder.marked_done_by.clear();
            reminder.remind_again_count += 1;
        }
        UpdateReminderDTO::Snooze { user_id, until } => {
            reminder.snoozed_by.insert(*user_id, *until);
            reminder.remind_again_count += 1;
        }
        UpdateReminderDTO::ResolveLegacy { user_id } => {
            reminder.done_by = Some(*user_id);
        }
        UpdateReminderDTO::ToggleDone { user_id } => {
            if !reminder.marked_done_by.remove(user_id) {
                reminder.marked_done_by.insert(*user_id);
            }
            reminder.done_by = None;
        }
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    #[instrument(skip(self, data), fields(kind = %data.kind, creator_id = %data.creator_id))]
    async fn create(&self, data: &CreateReminderDTO) -> Result<Reminder, Error> {
        let reminder_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let reminder = Reminder {
            reminder_id,
            kind: data.kind,
            creator_id: data.creator_id,
            chat_id: data.chat_id,
            title: data.title.clone(),
            message: data.message.clone(),
            due_at: data.due_at,
            created_at: data.created_at,
            done_by: None,
            marked_done_by: BTreeSet::new(),
            snoozed_by: BTreeMap::new(),
            remind_again_count: 0,
            notification_sent: false,
        };
        self.reminders.insert(reminder_id, reminder.clone());
        info!("Reminder created with id {}", reminder_id);
        Ok(reminder)
    }

    async fn read(&self, id: &i32) -> Result<Option<Reminder>, Error> {
        Ok(self.reminders.get(id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self))]
    async fn find_many(&self, filter: &ReminderFilter) -> Result<Vec<Reminder>, Error> {
        let mut found: Vec<Reminder> = self
            .reminders
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| {
            a.due_at
                .cmp(&b.due_at)
                .then(a.reminder_id.cmp(&b.reminder_id))
        });
        debug!("Found {} reminders", found.len());
        Ok(found)
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn update(&self, id: &i32, data: &UpdateReminderDTO) -> Result<Option<Reminder>, Error> {
        Ok(self.reminders.get_mut(id).map(|mut entry| {
            apply_update(entry.value_mut(), data);
            entry.value().clone()
        }))
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn mark_sent(&self, id: &i32) -> Result<bool, Error> {
        Ok(match self.reminders.get_mut(id) {
            Some(mut entry) if !entry.notification_sent => {
                entry.notification_sent = true;
                true
            }
            _ => false,
        })
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn delete(&self, id: &i32) -> Result<bool, Error> {
        Ok(self.reminders.remove(id).is_some())
    }
}

// USER DIRECTORY
pub struct InMemoryUserDirectory {
    users: DashMap<i32, User>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    pub fn insert(&self, user: User) {
        self.users.insert(user.user_id, user);
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }
}

// CHAT DIRECTORY
pub struct InMemoryChatDirectory {
    chats: DashMap<i32, Chat>,
}

impl InMemoryChatDirectory {
    pub fn new() -> Self {
        Self {
            chats: DashMap::new(),
        }
    }

    pub fn insert(&self, chat: Chat) {
        self.chats.insert(chat.chat_id, chat);
    }

    pub fn remove(&self, chat_id: &i32) {
        self.chats.remove(chat_id);
    }

    pub fn add_participant(&self, chat_id: &i32, user_id: i32) {
        if let Some(mut chat) = self.chats.get_mut(chat_id) {
            if !chat.participants.contains(&user_id) {
                chat.participants.push(user_id);
            }
        }
    }

    pub fn remove_participant(&self, chat_id: &i32, user_id: &i32) {
        if let Some(mut chat) = self.chats.get_mut(chat_id) {
            chat.participants.retain(|id| id != user_id);
        }
    }
}

impl Default for InMemoryChatDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatDirectory for InMemoryChatDirectory {
    async fn read(&self, id: &i32) -> Result<Option<Chat>, Error> {
        Ok(self.chats.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_chat_ids_by_user(&self, user_id: &i32) -> Result<Vec<i32>, Error> {
        let mut ids: Vec<i32> = self
            .chats
            .iter()
            .filter(|entry| entry.is_participant(user_id))
            .map(|entry| entry.chat_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
