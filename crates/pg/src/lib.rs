//! PostgreSQL integration for gambit.
//!
//! Low-level database connectivity plus the [`Schema`] trait that domain
//! types implement to declare their DDL. Tables are created idempotently at
//! startup via [`ensure`].
//!
//! ## Connectivity
//!
//! - [`db()`] — Establishes a database connection from `DB_URL`
//!
//! ## Serialization
//!
//! - [`Schema`] — Table metadata and DDL generation
//! - [`ensure`] — Executes a schema's DDL and indices
//!
//! ## Table Names
//!
//! Constants for all persistent entities: users, sessions, matches, moves.

use std::sync::Arc;
use tokio_postgres::Client;

/// Table metadata and DDL generation for a persisted domain type.
pub trait Schema {
    /// Table name.
    fn name() -> &'static str;
    /// Idempotent CREATE TABLE statement.
    fn creates() -> &'static str;
    /// Idempotent CREATE INDEX statements, possibly empty.
    fn indices() -> &'static str;
}

/// Establishes a database connection.
///
/// Connects to PostgreSQL using the `DB_URL` environment variable.
/// Returns an `Arc<Client>` suitable for sharing across async tasks.
///
/// # Panics
///
/// Panics if `DB_URL` is not set or if connection fails.
pub async fn db() -> Arc<Client> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let ref url = std::env::var("DB_URL").expect("DB_URL must be set");
    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .expect("database connection failed");
    tokio::spawn(connection);
    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await
        .expect("set client_min_messages");
    Arc::new(client)
}

/// Applies a schema's DDL and indices against the connected database.
pub async fn ensure<S: Schema>(client: &Client) -> Result<(), PgErr> {
    log::debug!("ensuring table {}", S::name());
    client.batch_execute(S::creates()).await?;
    let indices = S::indices();
    if !indices.is_empty() {
        client.batch_execute(indices).await?;
    }
    Ok(())
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for registered user accounts.
#[rustfmt::skip]
pub const USERS:    &str = "users";
/// Table for user authentication sessions.
#[rustfmt::skip]
pub const SESSIONS: &str = "sessions";
/// Table for matches, live and finished.
#[rustfmt::skip]
pub const MATCHES:  &str = "matches";
/// Table for per-match move history.
#[rustfmt::skip]
pub const MOVES:    &str = "moves";
