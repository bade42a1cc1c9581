//! Library and study-room management: book lending with overdue fines,
//! room reservations, accounts and study groups, all kept in SQLite.

pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod rooms;
pub mod schedule;
pub mod shell;
pub mod sql;
pub mod store;
pub mod time;
pub mod types;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use ledger::Ledger;
pub use rooms::Registry;
pub use sql::SqliteStore;
