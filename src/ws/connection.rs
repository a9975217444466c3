//! WebSocket Connection Management - Gestione connessioni WebSocket

use crate::ws::RATE_LIMITER_MILLIS;
use crate::{
    AppState,
    dtos::WsEventDTO,
    ws::usermap::InternalSignal,
};
use axum::body::Bytes;
use axum::extract::ws::Utf8Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Duration;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{error, info, instrument, warn};

#[instrument(skip(ws, state))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user_id: i32) {
    info!("WebSocket connection established");

    // Dividiamo il WebSocket in due metà: sender e receiver
    let (ws_tx, ws_rx) = ws.split();

    // Canale unbounded verso il task di scrittura: chi spedisce non resta mai bloccato
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    // Ogni connessione è una sessione separata nel registro
    let session_id = state.users_online.register_online(user_id, int_tx.clone());
    info!(session_id, "User registered as online");

    let timings = state.ws_timings;
    tokio::spawn(listen_ws(user_id, session_id, ws_rx, int_tx, state, timings.idle_timeout));
    tokio::spawn(write_ws(user_id, ws_tx, int_rx, timings.ping_interval));
}

/// Serializza un evento e lo spedisce come frame di testo
async fn send_event(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    event: &WsEventDTO,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(|e| {
        error!("Failed to serialize event: {:?}", e);
        axum::Error::new(e)
    })?;
    websocket_tx.send(Message::Text(Utf8Bytes::from(json))).await
}

#[instrument(skip(websocket_tx, internal_rx))]
pub async fn write_ws(
    user_id: i32,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
    ping_interval: Duration,
) {
    info!("Write task started");

    let mut ping = interval(ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // il primo tick è immediato
    ping.tick().await;

    loop {
        let signal = tokio::select! {
            signal = internal_rx.recv() => signal,
            _ = ping.tick() => {
                if let Err(e) = websocket_tx.send(Message::Ping(Bytes::new())).await {
                    warn!("Failed to send ping: {:?}", e);
                    break;
                }
                continue;
            }
        };
        let Some(signal) = signal else {
            break;
        };

        let event = match signal {
            InternalSignal::Shutdown => {
                info!("Shutdown signal received");
                break;
            }
            InternalSignal::ReminderDue(payload) => {
                info!(reminder_id = payload.id, "Sending due reminder to client");
                WsEventDTO::ReminderDue((*payload).clone())
            }
            InternalSignal::Error(err_msg) => {
                warn!(error_message = err_msg, "Sending error message to client");
                WsEventDTO::Error {
                    code: 400,
                    message: err_msg.to_string(),
                }
            }
        };

        if let Err(e) = send_event(&mut websocket_tx, &event).await {
            error!("Failed to send event through WebSocket: {:?}", e);
            break;
        }
    }

    let _ = websocket_tx.close().await;
    info!("Write task terminated");
}

#[instrument(skip(websocket_rx, internal_tx, state))]
pub async fn listen_ws(
    user_id: i32,
    session_id: u64,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
    idle_timeout: Duration,
) {
    info!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));

    loop {
        match timeout(idle_timeout, StreamExt::next(&mut websocket_rx)).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(_) | Message::Binary(_) => {
                        // il canale è solo server -> client
                        warn!("Unexpected message from client");
                        let _ = internal_tx
                            .send(InternalSignal::Error("This channel does not accept messages"));
                    }
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout = ?idle_timeout, "Connection timeout");
                break;
            }
        }
    }

    // Cleanup
    info!("Cleaning up connection");
    state.users_online.remove_from_online(&user_id, session_id);
    let _ = internal_tx.send(InternalSignal::Shutdown);
    info!("Listen task terminated");
}
