//! WebSocket Module - Gestione WebSocket per le notifiche real-time
//!
//! Questo modulo gestisce le connessioni WebSocket su cui il server spinge gli eventi
//! `reminderDue`. Include:
//! - Gestione upgrade HTTP -> WebSocket
//! - Gestione connessioni (split sender/receiver, una sessione per connessione)
//! - Registro delle sessioni online
//! - Fan-out di un promemoria scaduto verso i suoi destinatari

pub mod connection;
pub mod fanout;
pub mod usermap;

/// Chiusura della connessione dopo questo periodo senza frame dal client (pong inclusi)
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;
/// Ogni quanto il server manda un ping; deve restare sotto il timeout
pub const PING_INTERVAL_SECONDS: u64 = 60;
/// Intervallo minimo tra due frame letti dallo stesso client
pub const RATE_LIMITER_MILLIS: u64 = 10;

/// Keep-alive timings of a websocket session. The client only listens, so the
/// server pings it and the pongs keep the idle timer from expiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub idle_timeout: Duration,
    pub ping_interval: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(TIMEOUT_DURATION_SECONDS),
            ping_interval: Duration::from_secs(PING_INTERVAL_SECONDS),
        }
    }
}

// Re-exports pubblici
pub use connection::handle_socket;
pub use fanout::{Audience, DeliveryReport, deliver, resolve_audience};
pub use usermap::{ConnectionRegistry, InternalSignal, UserMap};

use crate::{AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;

/// Entry point per gestire richieste di upgrade WebSocket
/// Operazioni:
/// 1. Estrarre user_id dall'autenticazione JWT
/// 2. Eseguire upgrade HTTP -> WebSocket
/// 3. Passare la connessione ad handle_socket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Response {
    let user_id = current_user.user_id;

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}
