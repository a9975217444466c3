//! MySqlReminderStore - Repository MySQL per la gestione dei promemoria
//!
//! Tabelle:
//! - `reminders`: un record per promemoria
//! - `reminder_done_marks`: registro "fatto" per-utente, PK (reminder_id, user_id)
//! - `reminder_snoozes`: registro snooze per-utente, PK (reminder_id, user_id)
//!
//! Ogni mutazione apre una transazione e blocca la riga del promemoria con
//! `SELECT ... FOR UPDATE`, così le mutazioni sullo stesso promemoria sono serializzate.

use super::{ReminderFilter, ReminderStore};
use crate::dtos::{CreateReminderDTO, UpdateReminderDTO};
use crate::entities::{Reminder, ReminderKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Error, FromRow, MySql, MySqlPool, QueryBuilder, Transaction};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument};

const SELECT_REMINDERS: &str = r#"
    SELECT
        reminder_id,
        kind,
        creator_id,
        chat_id,
        title,
        message,
        due_at,
        created_at,
        done_by,
        remind_again_count,
        notification_sent
    FROM reminders
"#;

#[derive(Debug, FromRow)]
struct ReminderRow {
    reminder_id: i32,
    kind: String,
    creator_id: i32,
    chat_id: Option<i32>,
    title: Option<String>,
    message: String,
    due_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    done_by: Option<i32>,
    remind_again_count: i32,
    notification_sent: bool,
}

impl ReminderRow {
    fn into_reminder(self) -> Result<Reminder, Error> {
        let kind = self
            .kind
            .parse::<ReminderKind>()
            .map_err(|e| Error::Decode(e.into()))?;
        Ok(Reminder {
            reminder_id: self.reminder_id,
            kind,
            creator_id: self.creator_id,
            chat_id: self.chat_id,
            title: self.title,
            message: self.message,
            due_at: self.due_at,
            created_at: self.created_at,
            done_by: self.done_by,
            marked_done_by: BTreeSet::new(),
            snoozed_by: BTreeMap::new(),
            remind_again_count: self.remind_again_count,
            notification_sent: self.notification_sent,
        })
    }
}

#[derive(Debug, FromRow)]
struct DoneMarkRow {
    reminder_id: i32,
    user_id: i32,
}

#[derive(Debug, FromRow)]
struct SnoozeRow {
    reminder_id: i32,
    user_id: i32,
    snoozed_until: DateTime<Utc>,
}

// REMINDER REPOSITORY
pub struct MySqlReminderStore {
    connection_pool: MySqlPool,
}

impl MySqlReminderStore {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Loads the done and snooze ledgers for a batch of reminder rows.
    async fn hydrate(&self, rows: Vec<ReminderRow>) -> Result<Vec<Reminder>, Error> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut reminders: Vec<Reminder> = rows
            .into_iter()
            .map(ReminderRow::into_reminder)
            .collect::<Result<_, _>>()?;
        let ids: Vec<i32> = reminders.iter().map(|r| r.reminder_id).collect();

        let mut marks_query = QueryBuilder::<MySql>::new(
            "SELECT reminder_id, user_id FROM reminder_done_marks WHERE reminder_id IN (",
        );
        let mut separated = marks_query.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let marks: Vec<DoneMarkRow> = marks_query
            .build_query_as()
            .fetch_all(&self.connection_pool)
            .await?;

        let mut snoozes_query = QueryBuilder::<MySql>::new(
            "SELECT reminder_id, user_id, snoozed_until FROM reminder_snoozes WHERE reminder_id IN (",
        );
        let mut separated = snoozes_query.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let snoozes: Vec<SnoozeRow> = snoozes_query
            .build_query_as()
            .fetch_all(&self.connection_pool)
            .await?;

        let mut by_id: HashMap<i32, &mut Reminder> = reminders
            .iter_mut()
            .map(|r| (r.reminder_id, r))
            .collect();
        for mark in marks {
            if let Some(reminder) = by_id.get_mut(&mark.reminder_id) {
                reminder.marked_done_by.insert(mark.user_id);
            }
        }
        for snooze in snoozes {
            if let Some(reminder) = by_id.get_mut(&snooze.reminder_id) {
                reminder.snoozed_by.insert(snooze.user_id, snooze.snoozed_until);
            }
        }

        Ok(reminders)
    }

    /// Locks the reminder row for the rest of the transaction.
    /// Returns `false` if the reminder does not exist.
    async fn lock_row(tx: &mut Transaction<'_, MySql>, id: &i32) -> Result<bool, Error> {
        let locked: Option<i32> =
            sqlx::query_scalar("SELECT reminder_id FROM reminders WHERE reminder_id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(locked.is_some())
    }
}

#[async_trait]
impl ReminderStore for MySqlReminderStore {
    #[instrument(skip(self, data), fields(kind = %data.kind, creator_id = %data.creator_id))]
    async fn create(&self, data: &CreateReminderDTO) -> Result<Reminder, Error> {
        debug!("Creating new reminder");
        let result = sqlx::query(
            r#"
            INSERT INTO reminders
                (kind, creator_id, chat_id, title, message, due_at, created_at,
                 done_by, remind_again_count, notification_sent)
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL, 0, FALSE)
            "#,
        )
        .bind(data.kind.as_str())
        .bind(data.creator_id)
        .bind(data.chat_id)
        .bind(&data.title)
        .bind(&data.message)
        .bind(data.due_at)
        .bind(data.created_at)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;
        info!("Reminder created with id {}", new_id);

        Ok(Reminder {
            reminder_id: new_id,
            kind: data.kind,
            creator_id: data.creator_id,
            chat_id: data.chat_id,
            title: data.title.clone(),
            message: data.message.clone(),
            due_at: data.due_at,
            created_at: data.created_at,
            done_by: None,
            marked_done_by: BTreeSet::new(),
            snoozed_by: BTreeMap::new(),
            remind_again_count: 0,
            notification_sent: false,
        })
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn read(&self, id: &i32) -> Result<Option<Reminder>, Error> {
        debug!("Reading reminder by id");
        let row: Option<ReminderRow> =
            sqlx::query_as(&format!("{} WHERE reminder_id = ?", SELECT_REMINDERS))
                .bind(id)
                .fetch_optional(&self.connection_pool)
                .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => {
                debug!("Reminder not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_many(&self, filter: &ReminderFilter) -> Result<Vec<Reminder>, Error> {
        let mut query_builder = QueryBuilder::<MySql>::new(SELECT_REMINDERS);

        match filter {
            ReminderFilter::VisibleTo { user_id, chat_ids } => {
                query_builder.push(" WHERE (kind = 'me' AND creator_id = ");
                query_builder.push_bind(*user_id);
                query_builder.push(")");
                if !chat_ids.is_empty() {
                    query_builder.push(" OR (kind = 'us' AND chat_id IN (");
                    let mut separated = query_builder.separated(", ");
                    for chat_id in chat_ids {
                        separated.push_bind(*chat_id);
                    }
                    separated.push_unseparated("))");
                }
            }
            ReminderFilter::GroupInChats(chat_ids) => {
                if chat_ids.is_empty() {
                    return Ok(Vec::new());
                }
                query_builder.push(" WHERE kind = 'us' AND chat_id IN (");
                let mut separated = query_builder.separated(", ");
                for chat_id in chat_ids {
                    separated.push_bind(*chat_id);
                }
                separated.push_unseparated(")");
            }
            ReminderFilter::DueUnsent { now } => {
                query_builder.push(" WHERE notification_sent = FALSE AND done_by IS NULL AND due_at <= ");
                query_builder.push_bind(*now);
                // i personali con almeno un segno nel registro sono già chiusi
                query_builder.push(
                    " AND NOT (kind = 'me' AND EXISTS (SELECT 1 FROM reminder_done_marks m \
                     WHERE m.reminder_id = reminders.reminder_id))",
                );
            }
        }
        query_builder.push(" ORDER BY due_at ASC, reminder_id ASC");

        let rows: Vec<ReminderRow> = query_builder
            .build_query_as()
            .fetch_all(&self.connection_pool)
            .await?;
        debug!("Found {} reminders", rows.len());

        self.hydrate(rows).await
    }

    #[instrument(skip(self, data), fields(reminder_id = %id))]
    async fn update(&self, id: &i32, data: &UpdateReminderDTO) -> Result<Option<Reminder>, Error> {
        let mut tx = self.connection_pool.begin().await?;
        if !Self::lock_row(&mut tx, id).await? {
            debug!("Reminder not found, nothing to update");
            tx.rollback().await?;
            return Ok(None);
        }

        match data {
            UpdateReminderDTO::Reschedule { due_at } => {
                sqlx::query(
                    r#"
                    UPDATE reminders
                    SET due_at = ?, done_by = NULL, remind_again_count = remind_again_count + 1
                    WHERE reminder_id = ?
                    "#,
                )
                .bind(due_at)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                sqlx::query("DELETE FROM reminder_done_marks WHERE reminder_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            UpdateReminderDTO::Snooze { user_id, until } => {
                sqlx::query(
                    r#"
                    INSERT INTO reminder_snoozes (reminder_id, user_id, snoozed_until)
                    VALUES (?, ?, ?)
                    ON DUPLICATE KEY UPDATE snoozed_until = VALUES(snoozed_until)
                    "#,
                )
                .bind(id)
                .bind(user_id)
                .bind(until)
                .execute(&mut *tx)
                .await?;
                sqlx::query(
                    "UPDATE reminders SET remind_again_count = remind_again_count + 1 WHERE reminder_id = ?",
                )
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
            UpdateReminderDTO::ResolveLegacy { user_id } => {
                sqlx::query("UPDATE reminders SET done_by = ? WHERE reminder_id = ?")
                    .bind(user_id)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            UpdateReminderDTO::ToggleDone { user_id } => {
                let removed = sqlx::query(
                    "DELETE FROM reminder_done_marks WHERE reminder_id = ? AND user_id = ?",
                )
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
                if removed == 0 {
                    sqlx::query(
                        "INSERT INTO reminder_done_marks (reminder_id, user_id) VALUES (?, ?)",
                    )
                    .bind(id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
                }
                sqlx::query("UPDATE reminders SET done_by = NULL WHERE reminder_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        info!("Reminder updated successfully");

        self.read(id).await
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn mark_sent(&self, id: &i32) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE reminders SET notification_sent = TRUE WHERE reminder_id = ? AND notification_sent = FALSE",
        )
        .bind(id)
        .execute(&self.connection_pool)
        .await?;

        let transitioned = result.rows_affected() == 1;
        debug!(transitioned, "Notification flag compare-and-set");
        Ok(transitioned)
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn delete(&self, id: &i32) -> Result<bool, Error> {
        debug!("Deleting reminder");
        // i registri per-utente vengono rimossi da ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM reminders WHERE reminder_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Reminder deleted successfully");
        }
        Ok(deleted)
    }
}
