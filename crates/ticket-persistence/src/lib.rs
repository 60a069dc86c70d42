//! ticket-persistence
//!
//! Backend Postgres (Diesel) para el motor de aprobación: formularios,
//! plantillas, entries, procesos, log de eventos y outbox de correo.
//!
//! Módulos:
//! - `pg`: `PgTicketStore` (repositorios + EventStore) y `PgOutboxMailer`.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgOutboxMailer, PgPool, PgTicketStore, PoolProvider};
