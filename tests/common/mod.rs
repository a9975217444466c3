#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use reminder_server::core::{AppState, FixedClock};
use reminder_server::entities::{Chat, ChatType, User};
use reminder_server::repositories::{
    InMemoryChatDirectory, InMemoryReminderStore, InMemoryUserDirectory,
};
use reminder_server::ws::SessionTimings;
use std::sync::Arc;

pub const JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";

pub const ALICE: i32 = 1;
pub const BOB: i32 = 2;
pub const CHARLIE: i32 = 3;
pub const DAVE: i32 = 4;

/// Chat di gruppo: admin alice, partecipanti alice, bob, charlie
pub const TEAM_CHAT: i32 = 10;
/// Chat privata tra alice e bob
pub const PRIVATE_CHAT: i32 = 11;

/// Tutto ciò che serve a un test: lo stato condiviso e le handle concrete
/// per popolare le directory e spostare l'orologio.
pub struct TestContext {
    pub state: Arc<AppState>,
    pub reminders: Arc<InMemoryReminderStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub chats: Arc<InMemoryChatDirectory>,
    pub clock: Arc<FixedClock>,
}

/// Istante di partenza dell'orologio in ogni test
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap()
}

/// Crea un AppState in memoria con utenti e chat di esempio
///
/// # Returns
/// TestContext con orologio fermo a `start_time()`
pub fn create_test_context() -> TestContext {
    create_test_context_with_timings(SessionTimings::default())
}

/// Come `create_test_context`, con tempi di keep-alive WebSocket scelti dal test
pub fn create_test_context_with_timings(ws_timings: SessionTimings) -> TestContext {
    let reminders = Arc::new(InMemoryReminderStore::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let chats = Arc::new(InMemoryChatDirectory::new());
    let clock = Arc::new(FixedClock::new(start_time()));

    for (user_id, username) in [(ALICE, "alice"), (BOB, "bob"), (CHARLIE, "charlie"), (DAVE, "dave")] {
        users.insert(User {
            user_id,
            username: username.to_string(),
        });
    }
    chats.insert(Chat {
        chat_id: TEAM_CHAT,
        title: Some("team".to_string()),
        chat_type: ChatType::Group,
        group_admin: Some(ALICE),
        participants: vec![ALICE, BOB, CHARLIE],
    });
    chats.insert(Chat {
        chat_id: PRIVATE_CHAT,
        title: None,
        chat_type: ChatType::Private,
        group_admin: None,
        participants: vec![ALICE, BOB],
    });

    let state = Arc::new(
        AppState::from_parts(
            reminders.clone(),
            users.clone(),
            chats.clone(),
            clock.clone(),
            JWT_SECRET.to_string(),
        )
        .with_ws_timings(ws_timings),
    );

    TestContext {
        state,
        reminders,
        users,
        chats,
        clock,
    }
}

/// Crea un TestServer per i test
///
/// # Arguments
/// * `state` - AppState da utilizzare per il server
///
/// # Returns
/// TestServer configurato e pronto per eseguire richieste
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = reminder_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token per testing
///
/// # Arguments
/// * `user_id` - ID dell'utente per cui generare il token
/// * `username` - Username dell'utente
/// * `jwt_secret` - Secret key per firmare il token
///
/// # Returns
/// Token JWT valido per 24 ore
pub fn create_test_jwt(user_id: i32, username: &str, jwt_secret: &str) -> String {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Claims {
        id: i32,
        username: String,
        exp: usize,
        iat: usize,
    }

    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(24))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        id: user_id,
        username: username.to_string(),
        exp: expiration,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("Failed to create JWT token")
}

/// Valore dell'header Authorization per un utente di esempio
pub fn bearer(user_id: i32) -> String {
    let username = match user_id {
        ALICE => "alice",
        BOB => "bob",
        CHARLIE => "charlie",
        DAVE => "dave",
        _ => "ghost",
    };
    format!("Bearer {}", create_test_jwt(user_id, username, JWT_SECRET))
}
