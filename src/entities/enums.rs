//! Enumerazioni - Tipi enumerati utilizzati nelle entità

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ********************* ENUMERAZIONI UTILI **********************//

/// Audience of a reminder. The wire and storage values are the short
/// forms used by clients: `me` for a personal reminder, `us` for a group one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    #[serde(rename = "me")]
    Personal,
    #[serde(rename = "us")]
    Group,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::Personal => "me",
            ReminderKind::Group => "us",
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "me" => Ok(ReminderKind::Personal),
            "us" => Ok(ReminderKind::Group),
            other => Err(format!("unknown reminder kind '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatType {
    Group,
    Private,
}

impl FromStr for ChatType {
    type Err = String;

    // nel database il tipo è salvato in maiuscolo
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GROUP" => Ok(ChatType::Group),
            "PRIVATE" => Ok(ChatType::Private),
            other => Err(format!("unknown chat type '{}'", other)),
        }
    }
}
