use std::{borrow::Cow, fmt, panic::Location};

/// Error message paired with the source location that raised it.
///
/// Constructors are `#[track_caller]`, so building one inside a helper such
/// as `ConfigError::not_found` records the helper's caller rather than the
/// helper itself. Use [`diag!`] for `format!`-style construction.
#[derive(Clone, Debug)]
pub struct DiagnosticMessage {
    message: Cow<'static, str>,
    location: &'static Location<'static>,
}

impl DiagnosticMessage {
    #[track_caller]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

/// `diag!("table {} missing", name)` builds a [`DiagnosticMessage`] at the
/// call site.
#[macro_export]
macro_rules! diag {
    ($msg:literal $(,)?) => {
        $crate::error::diagnostics::DiagnosticMessage::new($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::diagnostics::DiagnosticMessage::new(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_call_site() {
        let msg = DiagnosticMessage::new("boom");
        assert_eq!(msg.message(), "boom");
        assert!(msg.location().file().ends_with("diagnostics.rs"));
        assert!(msg.to_string().starts_with("boom (at "));
    }

    #[test]
    fn diag_macro_formats() {
        let msg = diag!("missing table {}", "dim_users");
        assert_eq!(msg.message(), "missing table dim_users");
    }
}
