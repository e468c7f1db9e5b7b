//! PostgreSQL backend for the progress store.

mod config;
mod error;
mod schema;
mod store;

pub use config::PgConfig;
pub use error::{PgDaoError, PgResult};
pub use store::PgProgressStore;
