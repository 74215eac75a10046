//! Database row source.
//!
//! [`DatabaseSource`] runs its query once per [`read`](ChunkSource::read) through a
//! [`RowClient`] and yields one chunk per row: the row's column texts joined by a
//! single space. `NULL` columns render as the empty string, never as a
//! placeholder word, so a NULL contributes no letters to the statistics.
//!
//! The client is a seam so the same source runs against PostgreSQL
//! ([`PgClient`](crate::io::postgres::PgClient), feature `db-postgres`) or an
//! in-memory fixture in tests.

use crate::error::Result;
use crate::io::source::{Chunk, ChunkSource, Chunks};
use tracing::{debug, error};

/// One result row as column texts.
pub type Row = Vec<Option<String>>;

/// Executes a query and returns every row in text form.
///
/// A failure to connect or execute must be reported as
/// [`Error::Connection`](crate::Error::Connection); no partial rows are returned.
pub trait RowClient: Send + Sync {
    fn fetch_rows(&self, query: &str) -> Result<Vec<Row>>;

    /// Endpoint description for logs (never includes credentials).
    fn endpoint(&self) -> String;
}

/// Chunk source yielding one space-joined chunk per query row.
pub struct DatabaseSource<C> {
    client: C,
    query: String,
}

impl<C: RowClient> DatabaseSource<C> {
    pub fn new(client: C, query: impl Into<String>) -> Self {
        Self {
            client,
            query: query.into(),
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl<C: RowClient> ChunkSource for DatabaseSource<C> {
    fn read(&self) -> Result<Chunks<'_>> {
        let rows = self.client.fetch_rows(&self.query).inspect_err(|e| {
            error!(endpoint = %self.client.endpoint(), error = %e, "query failed");
        })?;
        debug!(endpoint = %self.client.endpoint(), rows = rows.len(), "query returned");
        Ok(Box::new(rows.into_iter().map(|row| Ok(render_row(&row)))))
    }

    fn describe(&self) -> String {
        format!("query on {}", self.client.endpoint())
    }
}

/// Join a row's columns with single spaces.
#[must_use]
pub fn render_row(row: &[Option<String>]) -> Chunk {
    let mut out = String::new();
    for (i, col) in row.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if let Some(text) = col {
            out.push_str(text);
        }
    }
    out
}
