//! PostgreSQL [`RowClient`] backed by sqlx.
//!
//! Queries run over the simple query protocol, so the server returns every value
//! in its text representation and rows can be rendered without knowing column
//! types. Each fetch opens its own connection on a private current-thread Tokio
//! runtime and closes it before returning.

use crate::config::DbConnection;
use crate::error::{Error, Result};
use crate::io::db::{Row, RowClient};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Connection, Row as _};
use tracing::debug;

/// Blocking PostgreSQL client for [`DatabaseSource`](crate::io::db::DatabaseSource).
#[derive(Clone, Debug)]
pub struct PgClient {
    connection: DbConnection,
}

impl PgClient {
    #[must_use]
    pub fn new(connection: DbConnection) -> Self {
        Self { connection }
    }

    fn options(&self) -> PgConnectOptions {
        let c = &self.connection;
        PgConnectOptions::new()
            .host(&c.host)
            .port(c.port)
            .username(&c.user)
            .password(&c.password)
            .database(&c.dbname)
    }

    async fn fetch(&self, query: &str) -> std::result::Result<Vec<Row>, sqlx::Error> {
        let mut conn = PgConnection::connect_with(&self.options()).await?;
        let rows = sqlx::raw_sql(query).fetch_all(&mut conn).await?;
        let out = rows
            .iter()
            .map(row_texts)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        conn.close().await?;
        Ok(out)
    }
}

fn row_texts(row: &PgRow) -> std::result::Result<Row, sqlx::Error> {
    // Simple-protocol values are text-format, so any column decodes as a string.
    (0..row.len())
        .map(|i| row.try_get_unchecked::<Option<String>, _>(i))
        .collect()
}

impl RowClient for PgClient {
    fn fetch_rows(&self, query: &str) -> Result<Vec<Row>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Connection(format!("failed to start runtime: {e}")))?;
        debug!(endpoint = %self.endpoint(), "connecting");
        runtime
            .block_on(self.fetch(query))
            .map_err(|e| Error::Connection(format!("{}: {e}", self.endpoint())))
    }

    fn endpoint(&self) -> String {
        let c = &self.connection;
        format!("postgres://{}@{}:{}/{}", c.user, c.host, c.port, c.dbname)
    }
}
