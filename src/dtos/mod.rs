//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod chat;
pub mod query;
pub mod reminder;
pub mod user;
pub mod ws_event;

pub use chat::ChatDTO;
pub use query::{ReminderStatus, ReminderStatusQuery};
pub use reminder::{
    CreateReminderDTO, NewReminderDTO, ReminderDTO, ReminderDueDTO, RescheduleDTO, SnoozeDTO,
    UpdateReminderDTO,
};
pub use user::UserDTO;
pub use ws_event::WsEventDTO;
