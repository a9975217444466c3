//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Identificazione dell'utente tramite JWT
//! - Configurazione
//! - Orologio iniettabile
//! - Gestione errori
//! - Stato applicazione

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod state;

// Re-exports per facilitare l'import
pub use auth::{Claims, authentication_middleware, decode_jwt};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, StoreBackend};
pub use error::AppError;
pub use state::AppState;
