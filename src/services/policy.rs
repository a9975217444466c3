//! Authorization policy - Chi può modificare un promemoria
//!
//! Funzioni pure: nessun accesso allo store, la chat (se serve) viene passata dal chiamante.

use crate::core::AppError;
use crate::entities::{Chat, Reminder, ReminderKind, User};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Maps a denial to a 403, logging the reason.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                warn!("Authorization denied: {}", reason);
                Err(AppError::forbidden(reason))
            }
        }
    }
}

fn creator_only(reminder: &Reminder, actor: &User, reason: &'static str) -> Decision {
    if reminder.creator_id == actor.user_id {
        Decision::Allow
    } else {
        Decision::Deny(reason)
    }
}

/// Personal: only the creator. Group: any participant of the chat.
pub fn can_mark_done(reminder: &Reminder, actor: &User, chat: Option<&Chat>) -> Decision {
    match reminder.kind {
        ReminderKind::Personal => creator_only(
            reminder,
            actor,
            "Only the creator can mark a personal reminder as done",
        ),
        ReminderKind::Group => match chat {
            Some(chat) if chat.is_participant(&actor.user_id) => Decision::Allow,
            Some(_) => Decision::Deny("You are not a participant of this chat"),
            None => Decision::Deny("The chat of this reminder no longer exists"),
        },
    }
}

/// Moving the shared due time is reserved to the creator of a personal reminder.
pub fn can_reschedule(reminder: &Reminder, actor: &User) -> Decision {
    match reminder.kind {
        ReminderKind::Personal => {
            creator_only(reminder, actor, "Only the creator can reschedule this reminder")
        }
        ReminderKind::Group => {
            Decision::Deny("Group reminders cannot be rescheduled, snooze them instead")
        }
    }
}

/// Snoozing is per participant and only makes sense for group reminders.
pub fn can_snooze(reminder: &Reminder, actor: &User, chat: Option<&Chat>) -> Decision {
    match reminder.kind {
        ReminderKind::Personal => {
            Decision::Deny("Personal reminders cannot be snoozed, reschedule them instead")
        }
        ReminderKind::Group => match chat {
            Some(chat) if chat.is_participant(&actor.user_id) => Decision::Allow,
            Some(_) => Decision::Deny("You are not a participant of this chat"),
            None => Decision::Deny("The chat of this reminder no longer exists"),
        },
    }
}

/// Personal: the creator. Group: the chat's admin; no admin means nobody.
pub fn can_delete(reminder: &Reminder, actor: &User, chat: Option<&Chat>) -> Decision {
    match reminder.kind {
        ReminderKind::Personal => {
            creator_only(reminder, actor, "Only the creator can delete this reminder")
        }
        ReminderKind::Group => match chat.and_then(|c| c.group_admin) {
            Some(admin) if admin == actor.user_id => Decision::Allow,
            Some(_) => Decision::Deny("Only the group admin can delete this reminder"),
            None => Decision::Deny("This chat has no admin allowed to delete reminders"),
        },
    }
}

/// Personal reminders are visible to their creator, group ones to the chat participants.
/// Used to guard reads and the manual mark-sent endpoint.
pub fn can_view(reminder: &Reminder, actor: &User, chat: Option<&Chat>) -> Decision {
    match reminder.kind {
        ReminderKind::Personal => creator_only(reminder, actor, "This reminder is not yours"),
        ReminderKind::Group => match chat {
            Some(chat) if chat.is_participant(&actor.user_id) => Decision::Allow,
            _ => Decision::Deny("You are not a participant of this chat"),
        },
    }
}
