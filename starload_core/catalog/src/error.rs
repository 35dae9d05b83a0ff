use common::error::diagnostics::DiagnosticMessage;
use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("template error: {context}")]
    Template {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("unsupported by dialect: {context}")]
    UnsupportedDialect { context: DiagnosticMessage },
    #[error("invalid statement catalog: {context}")]
    Invalid { context: DiagnosticMessage },
}

impl CatalogError {
    #[track_caller]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedDialect {
            context: DiagnosticMessage::new(message.into()),
        }
    }
}

impl From<minijinja::Error> for CatalogError {
    #[track_caller]
    fn from(err: minijinja::Error) -> Self {
        let message = err.to_string();
        CatalogError::Template {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }
}
