//! Notification fan-out - Risoluzione dei destinatari e consegna alle sessioni

use crate::dtos::ReminderDueDTO;
use crate::entities::{Chat, Reminder, ReminderKind};
use crate::ws::usermap::{ConnectionRegistry, InternalSignal};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Users a due reminder is delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Users(Vec<i32>),
    /// Group reminder whose chat the directory no longer knows.
    ChatMissing,
}

/// Personal: the creator. Group: every participant of the chat, regardless of
/// their own done or snooze state.
pub fn resolve_audience(reminder: &Reminder, chat: Option<&Chat>) -> Audience {
    match reminder.kind {
        ReminderKind::Personal => Audience::Users(vec![reminder.creator_id]),
        ReminderKind::Group => match chat {
            Some(chat) => Audience::Users(chat.participants.clone()),
            None => Audience::ChatMissing,
        },
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Audience members with at least one live session.
    pub users_reached: usize,
    /// Sessions that accepted the event.
    pub sessions: usize,
}

/// Pushes the event to every live session of every user. Offline users are skipped
/// silently, and each send is non-blocking.
#[instrument(skip(registry, users, payload), fields(reminder_id = payload.id))]
pub fn deliver(
    registry: &dyn ConnectionRegistry,
    users: &[i32],
    payload: Arc<ReminderDueDTO>,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for user_id in users {
        let sessions = registry.deliver(*user_id, InternalSignal::ReminderDue(payload.clone()));
        if sessions > 0 {
            report.users_reached += 1;
            report.sessions += sessions;
        }
    }
    debug!(
        audience = users.len(),
        users_reached = report.users_reached,
        sessions = report.sessions,
        "Reminder fan-out completed"
    );
    report
}
