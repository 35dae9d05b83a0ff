use catalog::{Phase, StatementDescriptor, Table};
use common::diag;
use common::error::diagnostics::DiagnosticMessage;
use shared_clients::DatabaseAdapterError;
use std::error::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("connection failed: {context}")]
    FailedToConnect {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
    #[error("execution failed: {context}")]
    FailedToExecute {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
    /// A catalog statement was refused by the warehouse. The remaining
    /// statements of the run are not attempted.
    #[error("{phase} of {target} failed: {context}")]
    StatementFailed {
        context: DiagnosticMessage,
        phase: Phase,
        target: Table,
        #[source]
        source: DatabaseAdapterError,
    },
    #[error("illegal run state transition: {context}")]
    IllegalTransition { context: DiagnosticMessage },
    #[error("unexpected error: {context}")]
    UnexpectedError {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
    #[error("configuration error: {context}")]
    ConfigError {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
    #[error("I/O error: {context}")]
    IoError {
        context: DiagnosticMessage,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutorError {
    #[track_caller]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            context: DiagnosticMessage::new(message.into()),
            source: None,
        }
    }

    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedError {
            context: DiagnosticMessage::new(message.into()),
            source: None,
        }
    }

    #[track_caller]
    pub fn illegal_transition(message: impl Into<String>) -> Self {
        Self::IllegalTransition {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    /// Wrap an adapter failure with the statement that caused it. The
    /// warehouse message is kept verbatim in both the context and the source.
    #[track_caller]
    pub fn statement_failed(statement: &StatementDescriptor, source: DatabaseAdapterError) -> Self {
        Self::StatementFailed {
            context: DiagnosticMessage::new(source.to_string()),
            phase: statement.phase(),
            target: statement.target,
            source,
        }
    }

    /// The failing table, for statement failures.
    pub fn failed_target(&self) -> Option<Table> {
        match self {
            ExecutorError::StatementFailed { target, .. } => Some(*target),
            _ => None,
        }
    }
}

impl From<DatabaseAdapterError> for ExecutorError {
    #[track_caller]
    fn from(value: DatabaseAdapterError) -> Self {
        match value {
            DatabaseAdapterError::InvalidConnectionError { context } => {
                ExecutorError::FailedToConnect {
                    context,
                    source: None,
                }
            }
            DatabaseAdapterError::SyntaxError { context } => ExecutorError::FailedToExecute {
                context,
                source: None,
            },
            DatabaseAdapterError::Rejected { context, sqlstate } => {
                ExecutorError::FailedToExecute {
                    context: DiagnosticMessage::new(format!("[{}] {}", sqlstate, context.message())),
                    source: None,
                }
            }
            DatabaseAdapterError::UnexpectedError { context } => ExecutorError::UnexpectedError {
                context,
                source: None,
            },
            DatabaseAdapterError::IoError { context, source } => {
                ExecutorError::IoError { context, source }
            }
            DatabaseAdapterError::ConfigError { context } => ExecutorError::ConfigError {
                context,
                source: None,
            },
        }
    }
}

impl From<std::io::Error> for ExecutorError {
    #[track_caller]
    fn from(value: std::io::Error) -> Self {
        ExecutorError::IoError {
            context: DiagnosticMessage::new(value.to_string()),
            source: value,
        }
    }
}

impl From<serde_json::Error> for ExecutorError {
    #[track_caller]
    fn from(value: serde_json::Error) -> Self {
        ExecutorError::UnexpectedError {
            context: diag!("failed to serialise run report: {}", value),
            source: Some(Box::new(value)),
        }
    }
}
