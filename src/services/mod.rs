//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! - `policy`: chi può modificare un promemoria
//! - `lifecycle`: operazioni di creazione e modifica
//! - `visibility`: cosa vede ciascun utente
//! - `reminder`: gli handler HTTP che mettono insieme i pezzi

pub mod lifecycle;
pub mod policy;
pub mod reminder;
pub mod visibility;

// Re-exports per facilitare l'import
pub use reminder::{
    create_reminder, delete_reminder, list_chat_reminders, list_public_reminders,
    list_sidebar_reminders, list_user_reminders, mark_reminder_done, mark_reminder_sent,
    reschedule_reminder, snooze_reminder, toggle_reminder_done,
};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
