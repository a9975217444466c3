//! MySqlUserDirectory - Lettura degli utenti dalla tabella `users`

use super::UserDirectory;
use crate::entities::User;
use async_trait::async_trait;
use sqlx::{Error, FromRow, MySqlPool};
use tracing::{debug, instrument};

#[derive(Debug, FromRow)]
struct UserRow {
    user_id: i32,
    username: String,
}

// USER DIRECTORY
pub struct MySqlUserDirectory {
    connection_pool: MySqlPool,
}

impl MySqlUserDirectory {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT user_id, username FROM users WHERE user_id = ?")
                .bind(id)
                .fetch_optional(&self.connection_pool)
                .await?;

        if row.is_none() {
            debug!("User not found");
        }

        Ok(row.map(|row| User {
            user_id: row.user_id,
            username: row.username,
        }))
    }
}
