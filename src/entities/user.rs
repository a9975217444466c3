//! User entity - Vista dell'utente letta dalla directory utenti

use serde::{Deserialize, Serialize};

/// The slice of a user record this service needs: identity and display name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: i32,
    pub username: String,
}
