pub mod diagnostics;
pub use crate::config::error::ConfigError;
pub use diagnostics::DiagnosticMessage;

use std::error::Error as StdError;
use thiserror::Error;

/// Top level error surfaced by the `starload` binary.
///
/// Each variant names the stage that failed; the inner cause (warehouse
/// error text included) is kept as the source.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("initialisation failed: {context}")]
    Init {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("compile failed: {context}")]
    Compile {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("run failed: {context}")]
    Run {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("quality check failed: {context}")]
    Check { context: DiagnosticMessage },
}

impl LoaderError {
    #[track_caller]
    pub fn init<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        LoaderError::Init {
            context: DiagnosticMessage::new(err.to_string()),
            source: Some(Box::new(err)),
        }
    }

    #[track_caller]
    pub fn compile<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        LoaderError::Compile {
            context: DiagnosticMessage::new(err.to_string()),
            source: Some(Box::new(err)),
        }
    }

    #[track_caller]
    pub fn run<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        LoaderError::Run {
            context: DiagnosticMessage::new(err.to_string()),
            source: Some(Box::new(err)),
        }
    }

    #[track_caller]
    pub fn check(message: impl Into<String>) -> Self {
        LoaderError::Check {
            context: DiagnosticMessage::new(message.into()),
        }
    }
}
