//! Server library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod sweeper;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use core::{AppError, AppState, auth, config};
pub use services::root;
pub use sweeper::{ReminderSweeper, SweepReport};

use axum::{
    Router, middleware,
    routing::{any, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    use core::authentication_middleware;
    use ws::ws_handler;

    Router::new()
        .route("/", get(root))
        .nest("/reminders", configure_reminder_routes(state.clone()))
        .route(
            "/ws",
            any(ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Configura le routes per la gestione dei promemoria
fn configure_reminder_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", post(create_reminder))
        .route("/user", get(list_user_reminders))
        .route("/public", get(list_public_reminders))
        .route("/sidebar", get(list_sidebar_reminders))
        .route("/chat/{chat_id}", get(list_chat_reminders))
        .route("/{reminder_id}", axum::routing::delete(delete_reminder))
        .route("/{reminder_id}/done", put(mark_reminder_done))
        .route("/{reminder_id}/toggle-done", put(toggle_reminder_done))
        .route("/{reminder_id}/reschedule", put(reschedule_reminder))
        .route("/{reminder_id}/snooze", put(snooze_reminder))
        .route("/{reminder_id}/mark-sent", put(mark_reminder_sent))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
