//! MySqlChatDirectory - Lettura di chat e partecipanti
//!
//! Le chat vivono in `chats`, la membership in `userchatmetadata`.
//! L'admin di un gruppo è il membro con ruolo `OWNER`; le chat private non hanno admin.

use super::ChatDirectory;
use crate::entities::{Chat, ChatType};
use async_trait::async_trait;
use sqlx::{Error, FromRow, MySqlPool};
use tracing::{debug, instrument};

#[derive(Debug, FromRow)]
struct ChatRow {
    chat_id: i32,
    title: Option<String>,
    chat_type: String,
}

#[derive(Debug, FromRow)]
struct MemberRow {
    user_id: i32,
    user_role: Option<String>,
}

// CHAT DIRECTORY
pub struct MySqlChatDirectory {
    connection_pool: MySqlPool,
}

impl MySqlChatDirectory {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl ChatDirectory for MySqlChatDirectory {
    #[instrument(skip(self), fields(chat_id = %id))]
    async fn read(&self, id: &i32) -> Result<Option<Chat>, Error> {
        let row: Option<ChatRow> =
            sqlx::query_as("SELECT chat_id, title, chat_type FROM chats WHERE chat_id = ?")
                .bind(id)
                .fetch_optional(&self.connection_pool)
                .await?;

        let Some(row) = row else {
            debug!("Chat not found");
            return Ok(None);
        };
        let chat_type = row
            .chat_type
            .parse::<ChatType>()
            .map_err(|e| Error::Decode(e.into()))?;

        let members: Vec<MemberRow> = sqlx::query_as(
            "SELECT user_id, user_role FROM userchatmetadata WHERE chat_id = ? ORDER BY user_id",
        )
        .bind(id)
        .fetch_all(&self.connection_pool)
        .await?;

        let group_admin = match chat_type {
            ChatType::Group => members
                .iter()
                .find(|m| m.user_role.as_deref() == Some("OWNER"))
                .map(|m| m.user_id),
            ChatType::Private => None,
        };
        debug!("Chat loaded with {} participants", members.len());

        Ok(Some(Chat {
            chat_id: row.chat_id,
            title: row.title,
            chat_type,
            group_admin,
            participants: members.into_iter().map(|m| m.user_id).collect(),
        }))
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn find_chat_ids_by_user(&self, user_id: &i32) -> Result<Vec<i32>, Error> {
        let chat_ids: Vec<i32> = sqlx::query_scalar(
            "SELECT chat_id FROM userchatmetadata WHERE user_id = ? ORDER BY chat_id",
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        debug!("User participates in {} chats", chat_ids.len());
        Ok(chat_ids)
    }
}
