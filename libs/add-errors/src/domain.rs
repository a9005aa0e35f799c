//! Domain errors raised by service implementations

use std::fmt;

use crate::item::ErrorItem;

/// An internal error value carrying a human message plus zero or more
/// structured sub-errors.
///
/// Distinct from transport-level failures (decode errors, missing auth
/// context, RPC status errors) and from opaque unknown errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    message: String,
    errors: Vec<ErrorItem>,
}

impl DomainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorItem>) -> Self {
        self.errors = errors;
        self
    }

    #[must_use]
    pub fn with_error(mut self, item: ErrorItem) -> Self {
        self.errors.push(item);
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn errors(&self) -> &[ErrorItem] {
        &self.errors
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            return f.write_str(&self.message);
        }
        let mut first = true;
        for item in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(&item.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_message() {
        let err = DomainError::new("integer overflow").with_error(ErrorItem::new("a + b"));
        assert_eq!(err.to_string(), "integer overflow");
    }

    #[test]
    fn display_joins_details_without_message() {
        let err = DomainError::new("")
            .with_error(ErrorItem::new("a is required").with_field("a"))
            .with_error(ErrorItem::new("b is required").with_field("b"));
        assert_eq!(err.to_string(), "a is required; b is required");
    }

    #[test]
    fn builder_keeps_order() {
        let err = DomainError::new("invalid")
            .with_errors(vec![ErrorItem::new("one"), ErrorItem::new("two")]);
        let messages: Vec<&str> = err.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["one", "two"]);
    }
}
