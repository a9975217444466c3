use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use crate::dtos::ReminderDueDTO;

/// Segnali interni spediti al task di scrittura di una sessione
#[derive(Debug, Clone)]
pub enum InternalSignal {
    Shutdown,
    Error(&'static str),
    ReminderDue(Arc<ReminderDueDTO>),
}

impl InternalSignal {
    fn kind(&self) -> &'static str {
        match self {
            InternalSignal::Shutdown => "Shutdown",
            InternalSignal::Error(_) => "Error",
            InternalSignal::ReminderDue(_) => "ReminderDue",
        }
    }
}

/// Who is currently reachable. The sweeper only depends on this seam, so tests
/// can substitute a recording fake.
pub trait ConnectionRegistry: Send + Sync {
    /// Pushes `signal` to every live session of `user_id`.
    /// Returns how many sessions accepted it; zero when the user is offline.
    fn deliver(&self, user_id: i32, signal: InternalSignal) -> usize;
}

type Session = (u64, UnboundedSender<InternalSignal>);

/// Registro delle sessioni WebSocket: un utente può avere più sessioni aperte
/// (più dispositivi o schede), ognuna con il proprio canale verso il task di scrittura.
pub struct UserMap {
    users_online: DashMap<i32, Vec<Session>>,
    next_session: AtomicU64,
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users_online: DashMap::new(),
            next_session: AtomicU64::new(1),
        }
    }

    /// Registers a new session and returns its id, needed to remove it later.
    #[instrument(skip(self, tx))]
    pub fn register_online(&self, user_id: i32, tx: UnboundedSender<InternalSignal>) -> u64 {
        let session_id = self.next_session.fetch_add(1, Ordering::Relaxed);
        self.users_online
            .entry(user_id)
            .or_default()
            .push((session_id, tx));
        info!(session_id, "Registered session for user {}", user_id);
        info!("Total online users: {}", self.users_online.len());
        session_id
    }

    #[instrument(skip(self))]
    pub fn remove_from_online(&self, user_id: &i32, session_id: u64) {
        info!("Removing session from online");
        if let Some(mut sessions) = self.users_online.get_mut(user_id) {
            sessions.retain(|(id, _)| *id != session_id);
        }
        // l'utente esce dalla mappa solo quando non ha più sessioni
        self.users_online
            .remove_if(user_id, |_, sessions| sessions.is_empty());
    }

    /// Sends `message` to every session of the user, dropping sessions whose
    /// writer has gone away. Never blocks.
    #[instrument(skip(self, message))]
    pub fn send_server_message_if_online(&self, user_id: &i32, message: InternalSignal) -> usize {
        let message_type = message.kind();
        let Some(mut sessions) = self.users_online.get_mut(user_id) else {
            debug!("User {} not online, {} message not sent", user_id, message_type);
            return 0;
        };

        let mut delivered = 0;
        sessions.retain(|(session_id, tx)| match tx.send(message.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(e) => {
                warn!(
                    session_id,
                    "Failed to send {} message to session: {:?}", message_type, e
                );
                false
            }
        });
        drop(sessions);
        self.users_online
            .remove_if(user_id, |_, sessions| sessions.is_empty());

        info!("{} message sent to {} sessions", message_type, delivered);
        delivered
    }

    /// Get the count of online users
    pub fn online_count(&self) -> usize {
        self.users_online.len()
    }

    /// Check if a specific user is online
    pub fn is_user_online(&self, user_id: &i32) -> bool {
        self.users_online.contains_key(user_id)
    }

    pub fn session_count(&self, user_id: &i32) -> usize {
        self.users_online
            .get(user_id)
            .map(|sessions| sessions.len())
            .unwrap_or(0)
    }
}

impl Default for UserMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry for UserMap {
    fn deliver(&self, user_id: i32, signal: InternalSignal) -> usize {
        self.send_server_message_if_online(&user_id, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn second_session_does_not_replace_the_first() {
        let user_map = UserMap::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        user_map.register_online(1, tx1);
        user_map.register_online(1, tx2);

        assert_eq!(user_map.online_count(), 1);
        assert_eq!(user_map.session_count(&1), 2);

        let sent = user_map.send_server_message_if_online(&1, InternalSignal::Error("ping"));
        assert_eq!(sent, 2);
        assert!(matches!(rx1.try_recv(), Ok(InternalSignal::Error("ping"))));
        assert!(matches!(rx2.try_recv(), Ok(InternalSignal::Error("ping"))));
    }

    #[test]
    fn removing_last_session_takes_user_offline() {
        let user_map = UserMap::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let first = user_map.register_online(7, tx1);
        let second = user_map.register_online(7, tx2);

        user_map.remove_from_online(&7, first);
        assert!(user_map.is_user_online(&7));
        assert_eq!(user_map.session_count(&7), 1);

        user_map.remove_from_online(&7, second);
        assert!(!user_map.is_user_online(&7));
    }

    #[test]
    fn closed_sessions_are_pruned_on_delivery() {
        let user_map = UserMap::new();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        user_map.register_online(3, tx_dead);
        user_map.register_online(3, tx_live);
        drop(rx_dead);

        assert_eq!(user_map.deliver(3, InternalSignal::Shutdown), 1);
        assert_eq!(user_map.session_count(&3), 1);
        assert!(matches!(rx_live.try_recv(), Ok(InternalSignal::Shutdown)));
    }

    #[test]
    fn offline_user_receives_nothing() {
        let user_map = UserMap::new();
        assert_eq!(user_map.deliver(42, InternalSignal::Shutdown), 0);
        assert!(!user_map.is_user_online(&42));
    }
}
