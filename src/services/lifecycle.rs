//! Reminder lifecycle - Operazioni che modificano i promemoria
//!
//! Ogni operazione carica il promemoria, applica la policy e solo dopo scrive nello store:
//! un rifiuto non lascia mai effetti parziali.

use crate::core::{AppError, AppState};
use crate::dtos::{CreateReminderDTO, NewReminderDTO, ReminderDTO, UpdateReminderDTO};
use crate::entities::{Chat, Reminder, ReminderKind, User};
use crate::services::policy;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Loads a reminder or fails with 404.
pub async fn load_reminder(state: &AppState, id: &i32) -> Result<Reminder, AppError> {
    state.reminders.read(id).await?.ok_or_else(|| {
        warn!("Reminder {} not found", id);
        AppError::not_found("Reminder not found")
    })
}

/// Chat of a group reminder; `None` for personal reminders or a chat the directory no longer knows.
pub async fn load_chat(state: &AppState, reminder: &Reminder) -> Result<Option<Chat>, AppError> {
    match reminder.chat_id {
        Some(chat_id) => Ok(state.chats.read(&chat_id).await?),
        None => Ok(None),
    }
}

/// Joins a reminder with its creator and chat and projects the done flag.
pub async fn enrich(state: &AppState, reminder: Reminder) -> Result<ReminderDTO, AppError> {
    let creator = state.users.read(&reminder.creator_id).await?;
    let chat = load_chat(state, &reminder).await?;
    Ok(ReminderDTO::from_parts(reminder, creator, chat.as_ref()))
}

pub async fn enrich_many(
    state: &AppState,
    reminders: Vec<Reminder>,
) -> Result<Vec<ReminderDTO>, AppError> {
    try_join_all(reminders.into_iter().map(|r| enrich(state, r))).await
}

fn updated_or_missing(updated: Option<Reminder>) -> Result<Reminder, AppError> {
    updated.ok_or_else(|| {
        warn!("Reminder disappeared before the update was applied");
        AppError::not_found("Reminder not found")
    })
}

#[instrument(skip(state, actor, body), fields(user_id = %actor.user_id))]
pub async fn create_reminder(
    state: &AppState,
    actor: &User,
    body: NewReminderDTO,
) -> Result<ReminderDTO, AppError> {
    body.validate()?;

    let message = match body.message {
        Some(message) if !message.trim().is_empty() => message,
        _ => return Err(AppError::bad_request("Message is required")),
    };
    let due_at = body
        .due_at
        .ok_or_else(|| AppError::bad_request("Due date is required"))?;
    let kind = body
        .kind
        .ok_or_else(|| AppError::bad_request("Reminder type must be 'me' or 'us'"))?;

    let chat_id = match kind {
        ReminderKind::Personal => {
            if body.chat_id.is_some() {
                debug!("Ignoring chat id on a personal reminder");
            }
            None
        }
        ReminderKind::Group => {
            let chat_id = body.chat_id.ok_or_else(|| {
                warn!("Group reminder without chat id");
                AppError::bad_request("Chat id is required for group reminders")
            })?;
            let chat = state
                .chats
                .read(&chat_id)
                .await?
                .ok_or_else(|| AppError::not_found("Chat not found"))?;
            if !chat.is_participant(&actor.user_id) {
                warn!(chat_id, "User is not a participant of the chat");
                return Err(AppError::forbidden("You are not a participant of this chat"));
            }
            Some(chat_id)
        }
    };

    let new_reminder = CreateReminderDTO {
        kind,
        creator_id: actor.user_id,
        chat_id,
        title: body.title.filter(|t| !t.trim().is_empty()),
        message,
        due_at,
        created_at: state.clock.now(),
    };
    let reminder = state.reminders.create(&new_reminder).await?;
    info!(reminder_id = reminder.reminder_id, "Reminder created");

    enrich(state, reminder).await
}

/// Moves the due time of a personal reminder and reopens it.
#[instrument(skip(state, actor), fields(reminder_id = %id, user_id = %actor.user_id))]
pub async fn reschedule(
    state: &AppState,
    id: &i32,
    actor: &User,
    due_at: DateTime<Utc>,
) -> Result<ReminderDTO, AppError> {
    let reminder = load_reminder(state, id).await?;
    apply_reschedule(state, reminder, actor, due_at).await
}

/// Hides a group reminder from the actor's active list until `until`.
/// The shared due time is untouched.
#[instrument(skip(state, actor), fields(reminder_id = %id, user_id = %actor.user_id))]
pub async fn snooze(
    state: &AppState,
    id: &i32,
    actor: &User,
    until: DateTime<Utc>,
) -> Result<ReminderDTO, AppError> {
    let reminder = load_reminder(state, id).await?;
    apply_snooze(state, reminder, actor, until).await
}

/// Single entry point behind `PUT /reminders/{id}/reschedule`: reschedule for
/// personal reminders, snooze for group ones.
#[instrument(skip(state, actor), fields(reminder_id = %id, user_id = %actor.user_id))]
pub async fn reschedule_or_snooze(
    state: &AppState,
    id: &i32,
    actor: &User,
    at: DateTime<Utc>,
) -> Result<ReminderDTO, AppError> {
    let reminder = load_reminder(state, id).await?;
    match reminder.kind {
        ReminderKind::Personal => apply_reschedule(state, reminder, actor, at).await,
        ReminderKind::Group => apply_snooze(state, reminder, actor, at).await,
    }
}

async fn apply_reschedule(
    state: &AppState,
    reminder: Reminder,
    actor: &User,
    due_at: DateTime<Utc>,
) -> Result<ReminderDTO, AppError> {
    policy::can_reschedule(&reminder, actor).into_result()?;

    let updated = state
        .reminders
        .update(&reminder.reminder_id, &UpdateReminderDTO::Reschedule { due_at })
        .await?;
    let updated = updated_or_missing(updated)?;
    info!(%due_at, "Reminder rescheduled");

    enrich(state, updated).await
}

async fn apply_snooze(
    state: &AppState,
    reminder: Reminder,
    actor: &User,
    until: DateTime<Utc>,
) -> Result<ReminderDTO, AppError> {
    let chat = load_chat(state, &reminder).await?;
    policy::can_snooze(&reminder, actor, chat.as_ref()).into_result()?;

    let update = UpdateReminderDTO::Snooze {
        user_id: actor.user_id,
        until,
    };
    let updated = state.reminders.update(&reminder.reminder_id, &update).await?;
    let updated = updated_or_missing(updated)?;
    info!(%until, "Reminder snoozed");

    let creator = state.users.read(&updated.creator_id).await?;
    Ok(ReminderDTO::from_parts(updated, creator, chat.as_ref()))
}

/// Legacy resolution: marks the whole reminder done on behalf of the actor.
#[instrument(skip(state, actor), fields(reminder_id = %id, user_id = %actor.user_id))]
pub async fn mark_done(state: &AppState, id: &i32, actor: &User) -> Result<ReminderDTO, AppError> {
    let reminder = load_reminder(state, id).await?;
    let chat = load_chat(state, &reminder).await?;
    policy::can_mark_done(&reminder, actor, chat.as_ref()).into_result()?;

    let update = UpdateReminderDTO::ResolveLegacy {
        user_id: actor.user_id,
    };
    let updated = updated_or_missing(state.reminders.update(id, &update).await?)?;
    info!("Reminder marked as done");

    enrich(state, updated).await
}

/// Flips the actor's entry in the done ledger. Calling it twice restores the previous state.
#[instrument(skip(state, actor), fields(reminder_id = %id, user_id = %actor.user_id))]
pub async fn toggle_done(
    state: &AppState,
    id: &i32,
    actor: &User,
) -> Result<ReminderDTO, AppError> {
    let reminder = load_reminder(state, id).await?;
    let chat = load_chat(state, &reminder).await?;
    policy::can_mark_done(&reminder, actor, chat.as_ref()).into_result()?;

    let update = UpdateReminderDTO::ToggleDone {
        user_id: actor.user_id,
    };
    let updated = updated_or_missing(state.reminders.update(id, &update).await?)?;
    debug!(
        marked = updated.is_marked_done_by(&actor.user_id),
        "Done mark toggled"
    );

    enrich(state, updated).await
}

#[instrument(skip(state, actor), fields(reminder_id = %id, user_id = %actor.user_id))]
pub async fn delete_reminder(state: &AppState, id: &i32, actor: &User) -> Result<(), AppError> {
    let reminder = load_reminder(state, id).await?;

    // se la chat non si risolve non c'è un admin: la policy rifiuta
    let chat = match load_chat(state, &reminder).await {
        Ok(chat) => chat,
        Err(e) => {
            warn!("Could not resolve chat for admin check: {:?}", e);
            None
        }
    };
    policy::can_delete(&reminder, actor, chat.as_ref()).into_result()?;

    if !state.reminders.delete(id).await? {
        warn!("Reminder already deleted");
        return Err(AppError::not_found("Reminder not found"));
    }
    info!("Reminder deleted");
    Ok(())
}

/// Manual notification flag. Idempotent: an already sent reminder is returned unchanged.
#[instrument(skip(state, actor), fields(reminder_id = %id, user_id = %actor.user_id))]
pub async fn mark_sent(state: &AppState, id: &i32, actor: &User) -> Result<ReminderDTO, AppError> {
    let reminder = load_reminder(state, id).await?;
    let chat = load_chat(state, &reminder).await?;
    policy::can_view(&reminder, actor, chat.as_ref()).into_result()?;

    let transitioned = state.reminders.mark_sent(id).await?;
    debug!(transitioned, "Notification flag set");

    let updated = load_reminder(state, id).await?;
    let creator = state.users.read(&updated.creator_id).await?;
    Ok(ReminderDTO::from_parts(updated, creator, chat.as_ref()))
}
