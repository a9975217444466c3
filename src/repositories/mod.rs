//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Ogni repository espone uno dei trait di `traits` ed esiste in due varianti:
//! MySQL (produzione) e in memoria (backend `memory` e test).

// ************************* NOTA SU SQLX ************************* //

/*
   Le query usano la forma verificata a run-time (`sqlx::query_as::<_, Row>` + `#[derive(FromRow)]`)
   invece delle macro `query!`/`query_as!`: così il crate compila anche senza un database raggiungibile.
   Le colonne enum (es. `kind`, `chat_type`) arrivano come stringhe e vengono convertite con `FromStr`;
   un valore sconosciuto diventa `sqlx::Error::Decode`.

   Ricordati: per INSERT/UPDATE/DELETE usa `.execute`, per le letture
   `.fetch_optional` / `.fetch_one` / `.fetch_all`, e propaga con `await?`.
   Le mutazioni su un promemoria passano da una transazione con `SELECT ... FOR UPDATE`.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod chat;
pub mod memory;
pub mod reminder;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{ChatDirectory, ReminderFilter, ReminderStore, UserDirectory};

// Re-esportazione delle implementazioni
pub use chat::MySqlChatDirectory;
pub use memory::{
    InMemoryChatDirectory, InMemoryReminderStore, InMemoryUserDirectory, apply_update,
};
pub use reminder::MySqlReminderStore;
pub use user::MySqlUserDirectory;
