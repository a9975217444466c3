//! Application State - Stato globale dell'applicazione
//!
//! Contiene lo store dei promemoria, le directory esterne di utenti e chat,
//! il registro delle connessioni WebSocket e l'orologio.

use crate::core::clock::{Clock, SystemClock};
use crate::repositories::{
    ChatDirectory, InMemoryChatDirectory, InMemoryReminderStore, InMemoryUserDirectory,
    MySqlChatDirectory, MySqlReminderStore, MySqlUserDirectory, ReminderStore, UserDirectory,
};
use crate::ws::SessionTimings;
use crate::ws::usermap::UserMap;
use sqlx::MySqlPool;
use std::sync::Arc;

/// Stato globale dell'applicazione condiviso tra tutte le route, i middleware e lo sweeper
pub struct AppState {
    /// Store durevole dei promemoria e dei loro registri per-utente
    pub reminders: Arc<dyn ReminderStore>,

    /// Directory utenti (id -> nome)
    pub users: Arc<dyn UserDirectory>,

    /// Directory chat (id -> partecipanti, tipo, admin)
    pub chats: Arc<dyn ChatDirectory>,

    /// Secret key per JWT token
    pub jwt_secret: String,

    /// Registro concorrente delle sessioni WebSocket attive
    /// Key: user_id, Value: una o più sessioni su cui spedire gli eventi
    pub users_online: Arc<UserMap>,

    /// Sorgente del tempo
    pub clock: Arc<dyn Clock>,

    /// Ping e timeout di inattività delle sessioni WebSocket
    pub ws_timings: SessionTimings,
}

impl AppState {
    /// Crea una nuova istanza di AppState su MySQL, con il pool di connessioni fornito
    /// e la JWT secret.
    pub fn new(pool: MySqlPool, jwt_secret: String) -> Self {
        Self::from_parts(
            Arc::new(MySqlReminderStore::new(pool.clone())),
            Arc::new(MySqlUserDirectory::new(pool.clone())),
            Arc::new(MySqlChatDirectory::new(pool)),
            Arc::new(SystemClock),
            jwt_secret,
        )
    }

    /// AppState interamente in memoria, senza database.
    pub fn in_memory(jwt_secret: String) -> Self {
        Self::from_parts(
            Arc::new(InMemoryReminderStore::new()),
            Arc::new(InMemoryUserDirectory::new()),
            Arc::new(InMemoryChatDirectory::new()),
            Arc::new(SystemClock),
            jwt_secret,
        )
    }

    /// Assembla lo stato da dipendenze già costruite (usato dai test per iniettare fake).
    pub fn from_parts(
        reminders: Arc<dyn ReminderStore>,
        users: Arc<dyn UserDirectory>,
        chats: Arc<dyn ChatDirectory>,
        clock: Arc<dyn Clock>,
        jwt_secret: String,
    ) -> Self {
        Self {
            reminders,
            users,
            chats,
            jwt_secret,
            users_online: Arc::new(UserMap::new()),
            clock,
            ws_timings: SessionTimings::default(),
        }
    }

    /// Sostituisce i tempi di keep-alive delle sessioni WebSocket.
    pub fn with_ws_timings(mut self, ws_timings: SessionTimings) -> Self {
        self.ws_timings = ws_timings;
        self
    }
}
