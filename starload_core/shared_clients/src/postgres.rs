use crate::{AsyncDatabaseAdapter, DatabaseAdapterError, SqlRow};
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, Config, Error, NoTls, SimpleQueryMessage};
use tracing::{debug, error};

impl From<Error> for DatabaseAdapterError {
    #[track_caller]
    fn from(err: Error) -> Self {
        if let Some(e) = err.as_db_error() {
            match e.code() {
                &SqlState::CONNECTION_DOES_NOT_EXIST
                | &SqlState::CONNECTION_FAILURE
                | &SqlState::SQLCLIENT_UNABLE_TO_ESTABLISH_SQLCONNECTION
                | &SqlState::INVALID_PASSWORD
                | &SqlState::INVALID_AUTHORIZATION_SPECIFICATION => {
                    DatabaseAdapterError::invalid_connection(e.to_string())
                }
                &SqlState::SYNTAX_ERROR => DatabaseAdapterError::syntax(e.to_string()),
                &SqlState::IO_ERROR => DatabaseAdapterError::IoError {
                    context: common::error::DiagnosticMessage::new(e.to_string()),
                    source: std::io::Error::new(ErrorKind::Other, e.to_string()),
                },
                code => DatabaseAdapterError::rejected(code.code(), e.to_string()),
            }
        } else {
            DatabaseAdapterError::unexpected(err.to_string())
        }
    }
}

/// Warehouse session over the Postgres wire protocol (Postgres or Redshift).
pub struct PostgresAdapter {
    client: Client,
    description: String,
    _driver: tokio::task::JoinHandle<()>,
}

impl PostgresAdapter {
    /// Connect and spawn the connection driver in the background.
    pub async fn new(
        host: &str,
        port: u16,
        db: &str,
        user: &str,
        password: &str,
    ) -> Result<Self, DatabaseAdapterError> {
        let mut config = Config::new();
        config
            .host(host)
            .port(port)
            .dbname(db)
            .user(user)
            .password(password)
            .application_name("starload");

        let description = format!("host={} port={} dbname={} user={}", host, port, db, user);
        debug!("connecting to {}", description);

        let (client, connection) = config.connect(NoTls).await.map_err(|e| {
            if e.as_db_error().is_some() {
                DatabaseAdapterError::from(e)
            } else {
                DatabaseAdapterError::invalid_connection(format!("{}: {}", description, e))
            }
        })?;
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("warehouse connection closed: {e}");
            }
        });

        Ok(Self {
            client,
            description,
            _driver: driver,
        })
    }
}

#[async_trait]
impl AsyncDatabaseAdapter for PostgresAdapter {
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError> {
        let tx = self.client.transaction().await?;
        tx.batch_execute(sql).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, DatabaseAdapterError> {
        let messages = self.client.simple_query(sql).await?;
        let rows = messages
            .into_iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(
                    (0..row.len())
                        .map(|idx| row.get(idx).map(str::to_string))
                        .collect::<SqlRow>(),
                ),
                _ => None,
            })
            .collect();
        Ok(rows)
    }

    fn connection(&self) -> String {
        self.description.clone()
    }
}
