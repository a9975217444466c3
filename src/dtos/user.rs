//! User DTOs - Data Transfer Objects per utenti

use crate::entities::User;
use serde::{Deserialize, Serialize};

// struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserDTO {
    pub id: i32,
    /// `None` when the user directory no longer knows the id.
    pub username: Option<String>,
}

impl UserDTO {
    pub fn unresolved(id: i32) -> Self {
        Self { id, username: None }
    }
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.user_id,
            username: Some(value.username),
        }
    }
}
