pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::{discover_migrations, run_migrations, Migration};
