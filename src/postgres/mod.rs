// ABOUTME: PostgreSQL destination for migrated tables
// ABOUTME: Connection handling, literal rendering and the DestinationDatabase writer

pub mod connection;
pub mod literal;
pub mod writer;

pub use connection::connect;
pub use writer::PostgresDestination;
