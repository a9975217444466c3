//! Reminder sweeper - Task periodico che notifica i promemoria scaduti
//!
//! A ogni tick: cerca i promemoria con scadenza passata e notifica non ancora inviata,
//! consegna l'evento `reminderDue` a tutte le sessioni dei destinatari e segna la notifica
//! come inviata. Un errore su un promemoria non interrompe gli altri.
//!
//! Il flag viene impostato con un compare-and-set dopo la consegna. Con più istanze
//! dello sweeper in parallelo la consegna è at-least-once: due istanze possono
//! consegnare lo stesso promemoria prima che una delle due vinca il compare-and-set.

use crate::core::{AppState, Clock};
use crate::dtos::ReminderDueDTO;
use crate::repositories::{ChatDirectory, ReminderFilter, ReminderStore, UserDirectory};
use crate::ws::{Audience, ConnectionRegistry, deliver, resolve_audience};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, warn};

/// Nome mostrato quando la directory non conosce più il creatore
const UNKNOWN_CREATOR: &str = "Unknown user";

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Candidates returned by the due query.
    pub due: usize,
    /// Reminders this tick delivered and marked sent.
    pub notified: usize,
    /// Sessions that received an event.
    pub sessions: usize,
    /// Candidates left alone: done, rescheduled, or already sent by someone else.
    pub skipped: usize,
    /// Candidates whose processing failed; they are retried on the next tick.
    pub failed: usize,
}

enum Outcome {
    Notified { sessions: usize },
    Skipped,
}

pub struct ReminderSweeper {
    reminders: Arc<dyn ReminderStore>,
    users: Arc<dyn UserDirectory>,
    chats: Arc<dyn ChatDirectory>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl ReminderSweeper {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        users: Arc<dyn UserDirectory>,
        chats: Arc<dyn ChatDirectory>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reminders,
            users,
            chats,
            registry,
            clock,
        }
    }

    /// Sweeper wired to the application's store, directories and session registry.
    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.reminders.clone(),
            state.users.clone(),
            state.chats.clone(),
            state.users_online.clone(),
            state.clock.clone(),
        )
    }

    /// Spawns the recurring task. The first tick runs immediately, and ticks never overlap.
    pub fn start(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        info!("Starting reminder sweeper with interval: {:?}", period);
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let report = self.tick().await;
                if report.due > 0 {
                    info!(
                        due = report.due,
                        notified = report.notified,
                        sessions = report.sessions,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Reminder sweep completed"
                    );
                }
            }
        })
    }

    /// Runs one sweep at the clock's current time.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> SweepReport {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        let due = match self
            .reminders
            .find_many(&ReminderFilter::DueUnsent { now })
            .await
        {
            Ok(due) => due,
            Err(e) => {
                error!("Failed to query due reminders: {:?}", e);
                return report;
            }
        };
        report.due = due.len();
        debug!("Found {} due reminders", report.due);

        for candidate in due {
            let reminder_id = candidate.reminder_id;
            match self.process(reminder_id, now).await {
                Ok(Outcome::Notified { sessions }) => {
                    report.notified += 1;
                    report.sessions += sessions;
                }
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    warn!(reminder_id, "Failed to process due reminder: {:?}", e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    #[instrument(skip(self, now))]
    async fn process(
        &self,
        reminder_id: i32,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Outcome, sqlx::Error> {
        // rilettura: il promemoria può essere cambiato dopo la query dei candidati
        let Some(reminder) = self.reminders.read(&reminder_id).await? else {
            debug!("Reminder deleted before delivery");
            return Ok(Outcome::Skipped);
        };
        if reminder.notification_sent || reminder.due_at > now {
            debug!("Reminder no longer due");
            return Ok(Outcome::Skipped);
        }

        let chat = match reminder.chat_id {
            Some(chat_id) => self.chats.read(&chat_id).await?,
            None => None,
        };
        let participants = chat.as_ref().map(|c| c.participants.len()).unwrap_or(0);
        if reminder.is_done(participants) {
            debug!("Reminder already done, not notifying");
            return Ok(Outcome::Skipped);
        }

        let audience = match resolve_audience(&reminder, chat.as_ref()) {
            Audience::Users(users) => users,
            Audience::ChatMissing => {
                // nessuno potrà mai ricevere questa notifica
                warn!(chat_id = ?reminder.chat_id, "Chat of group reminder not found, nothing to deliver");
                self.reminders.mark_sent(&reminder_id).await?;
                return Ok(Outcome::Skipped);
            }
        };

        let created_by = self
            .users
            .read(&reminder.creator_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| UNKNOWN_CREATOR.to_string());
        let payload = Arc::new(ReminderDueDTO::new(&reminder, created_by));

        let delivery = deliver(self.registry.as_ref(), &audience, payload);

        if !self.reminders.mark_sent(&reminder_id).await? {
            warn!("Notification flag was already set by a concurrent sweep");
        }
        info!(
            audience = audience.len(),
            sessions = delivery.sessions,
            "Due reminder delivered"
        );
        Ok(Outcome::Notified {
            sessions: delivery.sessions,
        })
    }
}
