//! Reminder services - Endpoint HTTP dei promemoria

use crate::core::{AppError, AppState};
use crate::dtos::{NewReminderDTO, ReminderDTO, ReminderStatusQuery, RescheduleDTO};
use crate::entities::User;
use crate::repositories::ReminderFilter;
use crate::services::{lifecycle, visibility};
use axum::{
    Extension,
    extract::{Json, Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Un body JSON malformato è un errore di validazione (400), non un 422
fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        warn!("Rejected request body: {}", rejection.body_text());
        AppError::bad_request("Invalid request body").with_details(rejection.body_text())
    })
}

fn required_due_at(body: RescheduleDTO) -> Result<DateTime<Utc>, AppError> {
    body.due_at
        .ok_or_else(|| AppError::bad_request("Due date is required"))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    body: Result<Json<NewReminderDTO>, JsonRejection>,
) -> Result<(StatusCode, Json<ReminderDTO>), AppError> {
    debug!("Creating reminder");
    let body = parse_body(body)?;
    let created = lifecycle::create_reminder(&state, &current_user, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_user_reminders(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<ReminderDTO>>, AppError> {
    // 1. Recuperare le chat dell'utente dalla directory
    // 2. Promemoria personali creati dall'utente + promemoria di gruppo di quelle chat, per scadenza
    // 3. Arricchire con creatore e chat
    let chat_ids = state
        .chats
        .find_chat_ids_by_user(&current_user.user_id)
        .await?;
    let reminders = state
        .reminders
        .find_many(&ReminderFilter::VisibleTo {
            user_id: current_user.user_id,
            chat_ids,
        })
        .await?;

    let dtos = lifecycle::enrich_many(&state, reminders).await?;
    info!("Retrieved {} reminders", dtos.len());
    Ok(Json(dtos))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_public_reminders(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<ReminderDTO>>, AppError> {
    let chat_ids = state
        .chats
        .find_chat_ids_by_user(&current_user.user_id)
        .await?;
    let reminders = state
        .reminders
        .find_many(&ReminderFilter::GroupInChats(chat_ids))
        .await?;

    let dtos = lifecycle::enrich_many(&state, reminders).await?;
    info!("Retrieved {} group reminders", dtos.len());
    Ok(Json(dtos))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_sidebar_reminders(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<ReminderDTO>>, AppError> {
    let chat_ids = state
        .chats
        .find_chat_ids_by_user(&current_user.user_id)
        .await?;
    let reminders = state
        .reminders
        .find_many(&ReminderFilter::VisibleTo {
            user_id: current_user.user_id,
            chat_ids,
        })
        .await?;

    let dtos = lifecycle::enrich_many(&state, reminders).await?;
    Ok(Json(visibility::sidebar_order(dtos)))
}

#[instrument(skip(state, current_user, params), fields(user_id = %current_user.user_id))]
pub async fn list_chat_reminders(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(chat_id): Path<i32>,
    Query(params): Query<ReminderStatusQuery>,
) -> Result<Json<Vec<ReminderDTO>>, AppError> {
    debug!(status = ?params.status, "Listing chat reminders");
    let chat = state
        .chats
        .read(&chat_id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat not found"))?;
    if !chat.is_participant(&current_user.user_id) {
        warn!("User is not a participant of the chat");
        return Err(AppError::forbidden("You are not a participant of this chat"));
    }

    let reminders = state
        .reminders
        .find_many(&ReminderFilter::GroupInChats(vec![chat_id]))
        .await?;
    let visible = visibility::filter_for_viewer(
        reminders,
        &current_user.user_id,
        params.status,
        state.clock.now(),
    );

    let dtos = lifecycle::enrich_many(&state, visible).await?;
    info!("Retrieved {} reminders for chat", dtos.len());
    Ok(Json(dtos))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn mark_reminder_done(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(reminder_id): Path<i32>,
) -> Result<Json<ReminderDTO>, AppError> {
    let updated = lifecycle::mark_done(&state, &reminder_id, &current_user).await?;
    Ok(Json(updated))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn toggle_reminder_done(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(reminder_id): Path<i32>,
) -> Result<Json<ReminderDTO>, AppError> {
    let updated = lifecycle::toggle_done(&state, &reminder_id, &current_user).await?;
    Ok(Json(updated))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn reschedule_reminder(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(reminder_id): Path<i32>,
    body: Result<Json<RescheduleDTO>, JsonRejection>,
) -> Result<Json<ReminderDTO>, AppError> {
    let due_at = required_due_at(parse_body(body)?)?;
    let updated =
        lifecycle::reschedule_or_snooze(&state, &reminder_id, &current_user, due_at).await?;
    Ok(Json(updated))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn snooze_reminder(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(reminder_id): Path<i32>,
    body: Result<Json<RescheduleDTO>, JsonRejection>,
) -> Result<Json<ReminderDTO>, AppError> {
    let until = required_due_at(parse_body(body)?)?;
    let updated = lifecycle::snooze(&state, &reminder_id, &current_user, until).await?;
    Ok(Json(updated))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn mark_reminder_sent(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(reminder_id): Path<i32>,
) -> Result<Json<ReminderDTO>, AppError> {
    let updated = lifecycle::mark_sent(&state, &reminder_id, &current_user).await?;
    Ok(Json(updated))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(reminder_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    lifecycle::delete_reminder(&state, &reminder_id, &current_user).await?;
    Ok(StatusCode::NO_CONTENT)
}
