//! Reminder entity - Entità promemoria con stato per-utente

use super::enums::ReminderKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reminder {
    pub reminder_id: i32,
    pub kind: ReminderKind,
    pub creator_id: i32,
    // presente solo per i promemoria di gruppo
    pub chat_id: Option<i32>,
    pub title: Option<String>,
    pub message: String,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Legacy single-user resolution, written by the plain mark-done operation.
    pub done_by: Option<i32>,
    /// Per-viewer done ledger.
    pub marked_done_by: BTreeSet<i32>,
    /// Per-viewer snooze ledger: user id -> snoozed until.
    pub snoozed_by: BTreeMap<i32, DateTime<Utc>>,
    pub remind_again_count: i32,
    pub notification_sent: bool,
}

impl Reminder {
    pub fn is_marked_done_by(&self, user_id: &i32) -> bool {
        self.marked_done_by.contains(user_id)
    }

    /// A snooze only counts while its end lies strictly in the future.
    pub fn is_snoozed_for(&self, user_id: &i32, now: DateTime<Utc>) -> bool {
        self.snoozed_by
            .get(user_id)
            .is_some_and(|until| *until > now)
    }

    /// Whether the done ledger alone resolves the reminder.
    ///
    /// `participants` is the size of the group chat and is ignored for
    /// personal reminders. An empty or unresolved group never completes.
    pub fn ledger_complete(&self, participants: usize) -> bool {
        match self.kind {
            ReminderKind::Personal => !self.marked_done_by.is_empty(),
            ReminderKind::Group => participants > 0 && self.marked_done_by.len() >= participants,
        }
    }

    /// Global done flag, derived from the legacy resolution and the ledger.
    pub fn is_done(&self, participants: usize) -> bool {
        self.done_by.is_some() || self.ledger_complete(participants)
    }
}
