//! Run configuration.
//!
//! Settings come from two layers: an optional TOML config file and the command
//! line. A value present in the file wins; missing values fall back to the command
//! line, then to defaults. [`Config::resolve`] merges and validates both layers
//! into one immutable [`Config`], which is all the rest of the crate sees.
//!
//! ```toml
//! [settings]
//! source = "db"
//! target = "out/report.txt"
//! query = "SELECT name, city FROM customers"
//! workers = 8
//!
//! [database]
//! host = "localhost"
//! port = 5432
//! user = "reader"
//! password = "secret"
//! dbname = "crm"
//!
//! [log]
//! level = "debug"
//! ```

use crate::error::{Error, Result};
use crate::io::file::{FileSource, DEFAULT_CHUNK_SIZE};
use crate::io::sink::FileSink;
use crate::io::source::ChunkSource;
use crate::logging::LogConfig;
use crate::pipeline::{OutputStrategy, Pipeline};
use crate::runner::{CancelToken, Runner};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One layer of optional settings (`[settings]` in the file, or the CLI flags).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `"file"` or `"db"`
    pub source: Option<String>,
    pub input: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub query: Option<String>,
    pub chunk_size: Option<usize>,
    pub workers: Option<usize>,
    pub queue_depth: Option<usize>,
    /// `"reread"` or `"reassemble"`
    pub output: Option<String>,
    pub echo: Option<bool>,
    /// Where to save run metrics as JSON.
    pub metrics: Option<PathBuf>,
}

impl Settings {
    /// Field-wise `self.or(fallback)`.
    #[must_use]
    pub fn or(self, fallback: Settings) -> Settings {
        Settings {
            source: self.source.or(fallback.source),
            input: self.input.or(fallback.input),
            target: self.target.or(fallback.target),
            query: self.query.or(fallback.query),
            chunk_size: self.chunk_size.or(fallback.chunk_size),
            workers: self.workers.or(fallback.workers),
            queue_depth: self.queue_depth.or(fallback.queue_depth),
            output: self.output.or(fallback.output),
            echo: self.echo.or(fallback.echo),
            metrics: self.metrics.or(fallback.metrics),
        }
    }
}

/// PostgreSQL connection parameters.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct DbConnection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub dbname: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

impl fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .finish()
    }
}

/// Parsed config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub settings: Settings,
    pub database: Option<DbConnection>,
    pub log: LogConfig,
}

impl ConfigFile {
    /// # Errors
    ///
    /// [`Error::Configuration`] if the file cannot be read or is not valid TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("failed to read config file '{}': {e}", path.display()))
        })?;
        contents.parse()
    }
}

impl FromStr for ConfigFile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Configuration(format!("failed to parse config: {e}")))
    }
}

/// Where the chunks come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    File { path: PathBuf, chunk_size: usize },
    Db { connection: DbConnection, query: String },
}

impl SourceConfig {
    /// Construct the configured source.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for a database source when the crate was built
    /// without the `db-postgres` feature.
    pub fn build(&self) -> Result<Box<dyn ChunkSource>> {
        match self {
            Self::File { path, chunk_size } => Ok(Box::new(
                FileSource::new(path).with_chunk_size(*chunk_size),
            )),
            #[cfg(feature = "db-postgres")]
            Self::Db { connection, query } => {
                let client = crate::io::postgres::PgClient::new(connection.clone());
                Ok(Box::new(crate::io::db::DatabaseSource::new(
                    client,
                    query.clone(),
                )))
            }
            #[cfg(not(feature = "db-postgres"))]
            Self::Db { .. } => Err(Error::Configuration(
                "database sources require the 'db-postgres' feature".into(),
            )),
        }
    }
}

/// Fully resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: SourceConfig,
    pub target: PathBuf,
    /// `None` uses one worker per core.
    pub workers: Option<usize>,
    pub queue_depth: Option<usize>,
    pub output: OutputStrategy,
    pub echo: bool,
    pub metrics_path: Option<PathBuf>,
    pub log: LogConfig,
}

impl Config {
    /// Merge the file layer over the CLI layer and validate the result.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for an unknown source kind, a missing required
    /// value, or a zero chunk size, worker count or queue depth.
    pub fn resolve(file: Option<ConfigFile>, cli: Settings) -> Result<Config> {
        let (file_settings, database, log) = match file {
            Some(f) => (f.settings, f.database, f.log),
            None => (Settings::default(), None, LogConfig::default()),
        };
        let s = file_settings.or(cli);

        let kind = s
            .source
            .as_deref()
            .ok_or_else(|| Error::Configuration("source must be either 'file' or 'db'".into()))?;
        let source = match kind.trim().to_ascii_lowercase().as_str() {
            "file" => {
                let path = s.input.clone().ok_or_else(|| {
                    Error::Configuration("file source requires an input path".into())
                })?;
                let chunk_size = s.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
                if chunk_size == 0 {
                    return Err(Error::Configuration("chunk_size must be positive".into()));
                }
                SourceConfig::File { path, chunk_size }
            }
            "db" => {
                let connection = database.ok_or_else(|| {
                    Error::Configuration("db source requires a [database] section".into())
                })?;
                let query = s.query.clone().ok_or_else(|| {
                    Error::Configuration("db source requires a query".into())
                })?;
                SourceConfig::Db { connection, query }
            }
            _ => {
                return Err(Error::Configuration(
                    "source must be either 'file' or 'db'".into(),
                ));
            }
        };

        let target = s
            .target
            .ok_or_else(|| Error::Configuration("a target path is required".into()))?;
        if s.workers == Some(0) {
            return Err(Error::Configuration("workers must be positive".into()));
        }
        if s.queue_depth == Some(0) {
            return Err(Error::Configuration("queue_depth must be positive".into()));
        }
        let output = s
            .output
            .as_deref()
            .map(OutputStrategy::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(Config {
            source,
            target,
            workers: s.workers,
            queue_depth: s.queue_depth,
            output,
            echo: s.echo.unwrap_or(true),
            metrics_path: s.metrics,
            log,
        })
    }

    #[must_use]
    pub fn runner(&self, cancel: CancelToken) -> Runner {
        let runner = Runner::parallel(self.workers).with_cancel(cancel);
        match self.queue_depth {
            Some(depth) => runner.with_queue_depth(depth),
            None => runner,
        }
    }

    #[must_use]
    pub fn sink(&self) -> FileSink {
        FileSink::new(&self.target).with_echo(self.echo)
    }

    /// Assemble the pipeline this configuration describes.
    ///
    /// # Errors
    ///
    /// See [`SourceConfig::build`].
    pub fn pipeline(&self, cancel: CancelToken) -> Result<Pipeline> {
        Ok(Pipeline::new(self.source.build()?, self.sink())
            .with_runner(self.runner(cancel))
            .with_output_strategy(self.output))
    }
}
