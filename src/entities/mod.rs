//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene le entità che rappresentano i dati persistiti dallo store dei promemoria
//! e le viste che il servizio legge dalle directory esterne di utenti e chat.

pub mod chat;
pub mod enums;
pub mod reminder;
pub mod user;

// Re-exports per facilitare l'import
pub use chat::Chat;
pub use enums::{ChatType, ReminderKind};
pub use reminder::Reminder;
pub use user::User;
