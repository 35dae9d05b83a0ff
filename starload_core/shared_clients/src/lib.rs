pub mod postgres;
pub mod row;

use crate::postgres::PostgresAdapter;
use async_trait::async_trait;
use common::config::components::connections::{AdapterConnectionDetails, DatabaseAdapterType};
use common::error::diagnostics::DiagnosticMessage;
use std::fmt::Debug;
use thiserror::Error;

pub use row::SqlRow;

#[derive(Debug, Error)]
pub enum DatabaseAdapterError {
    #[error("invalid connection details: {context}")]
    InvalidConnectionError { context: DiagnosticMessage },
    #[error("SQL syntax error: {context}")]
    SyntaxError { context: DiagnosticMessage },
    /// The warehouse refused the statement. `context` carries the raw
    /// server message.
    #[error("statement rejected [{sqlstate}]: {context}")]
    Rejected {
        context: DiagnosticMessage,
        sqlstate: String,
    },
    #[error("unexpected database error: {context}")]
    UnexpectedError { context: DiagnosticMessage },
    #[error("I/O error: {context}")]
    IoError {
        context: DiagnosticMessage,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration error: {context}")]
    ConfigError { context: DiagnosticMessage },
}

impl DatabaseAdapterError {
    #[track_caller]
    pub fn invalid_connection(message: impl Into<String>) -> Self {
        Self::InvalidConnectionError {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::SyntaxError {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn rejected(sqlstate: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            context: DiagnosticMessage::new(message.into()),
            sqlstate: sqlstate.into(),
        }
    }

    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedError {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            context: DiagnosticMessage::new(message.into()),
        }
    }
}

impl From<std::io::Error> for DatabaseAdapterError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        let message = err.to_string();
        DatabaseAdapterError::IoError {
            context: DiagnosticMessage::new(message),
            source: err,
        }
    }
}

/// A single warehouse session.
///
/// `execute` commits each call on its own; there is no transaction spanning
/// two calls.
#[async_trait]
pub trait AsyncDatabaseAdapter: Send + Sync {
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError>;
    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, DatabaseAdapterError>;
    /// Connection description safe to log (no password).
    fn connection(&self) -> String;
}

#[async_trait]
impl<T> AsyncDatabaseAdapter for &mut T
where
    T: AsyncDatabaseAdapter + ?Sized,
{
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError> {
        (**self).execute(sql).await
    }

    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, DatabaseAdapterError> {
        (**self).query(sql).await
    }

    fn connection(&self) -> String {
        (**self).connection()
    }
}

pub type AsyncDbAdapter = Box<dyn AsyncDatabaseAdapter + Send + Sync + 'static>;

pub async fn create_db_adapter(
    conn_details: AdapterConnectionDetails,
) -> Result<AsyncDbAdapter, DatabaseAdapterError> {
    let port = conn_details
        .port_number()
        .map_err(|e| DatabaseAdapterError::config(e.to_string()))?;

    match conn_details.adapter_type {
        DatabaseAdapterType::Postgres | DatabaseAdapterType::Redshift => Ok(Box::new(
            PostgresAdapter::new(
                conn_details.host.as_str(),
                port,
                conn_details.database.as_str(),
                conn_details.user.as_str(),
                conn_details.password.as_str(),
            )
            .await?,
        )),
    }
}
