//! Error types crossing the adapter boundary.
//!
//! Two coordinate systems meet here. The external grammar engine reports
//! [`EngineError`] values whose positions are byte offsets local to the
//! fragment it was handed. The host receives [`EmbedError`] values whose
//! positions are character offsets into the full original query text. The
//! translator stack in [`crate::translate`] performs the rewrite.
//!
//! Structural invariant violations (installing a translator with an
//! out-of-range offset, uninstalling without a matching install, touching a
//! released scope) are not represented as error values: they indicate
//! corrupted control flow in the integration and surface as panics that
//! abort the parse attempt.

use crate::diag::{Diag, QueryText};
use miette::Report;
use std::fmt;

/// Error raised by a grammar engine while parsing one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A syntax error at a byte offset local to the fragment being parsed.
    Syntax {
        /// Byte offset from the start of the fragment.
        local_offset: usize,
        /// Human-readable description of the failure.
        message: String,
    },
    /// Cooperative cancellation. Carries no position and is never rewritten.
    Cancelled,
}

impl EngineError {
    /// Creates a syntax error at a fragment-local byte offset.
    pub fn syntax(local_offset: usize, message: impl Into<String>) -> Self {
        EngineError::Syntax {
            local_offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Syntax {
                local_offset,
                message,
            } => write!(f, "syntax error at fragment offset {local_offset}: {message}"),
            EngineError::Cancelled => write!(f, "parse cancelled"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Host-facing error for an embedded sub-language parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedError {
    /// A syntax error positioned in the root query text.
    Syntax {
        /// Character offset into the full original query.
        position: usize,
        /// Human-readable description of the failure.
        message: String,
    },
    /// The parse was cancelled before completion.
    Cancelled,
}

impl EmbedError {
    /// Returns the translated position, if this error carries one.
    pub fn position(&self) -> Option<usize> {
        match self {
            EmbedError::Syntax { position, .. } => Some(*position),
            EmbedError::Cancelled => None,
        }
    }

    /// Converts this error into the internal diagnostic model.
    pub fn to_diag(&self) -> Diag {
        match self {
            EmbedError::Syntax { position, message } => Diag::error(message.clone())
                .with_position(*position, "here")
                .with_code("syntax::fragment"),
            EmbedError::Cancelled => Diag::error("query cancelled").with_code("cancelled"),
        }
    }

    /// Renders this error as a miette report against the root query text.
    pub fn to_report(&self, source: &QueryText) -> Report {
        self.to_diag().into_report(source)
    }
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedError::Syntax { position, message } => {
                write!(f, "syntax error at position {position}: {message}")
            }
            EmbedError::Cancelled => write!(f, "query cancelled"),
        }
    }
}

impl std::error::Error for EmbedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_display() {
        let err = EngineError::syntax(3, "expected ')'");
        assert_eq!(err.to_string(), "syntax error at fragment offset 3: expected ')'");
        assert_eq!(EngineError::Cancelled.to_string(), "parse cancelled");
    }

    #[test]
    fn embed_error_display_and_position() {
        let err = EmbedError::Syntax {
            position: 13,
            message: "expected ')'".into(),
        };
        assert_eq!(err.to_string(), "syntax error at position 13: expected ')'");
        assert_eq!(err.position(), Some(13));
        assert_eq!(EmbedError::Cancelled.position(), None);
    }

    #[test]
    fn embed_error_to_diag_carries_translated_position() {
        let err = EmbedError::Syntax {
            position: 13,
            message: "unexpected token".into(),
        };
        let diag = err.to_diag();
        assert_eq!(diag.position, Some(13));
        assert_eq!(diag.message, "unexpected token");
        assert_eq!(diag.code.as_deref(), Some("syntax::fragment"));
    }

    #[test]
    fn cancelled_to_diag_has_no_position() {
        let diag = EmbedError::Cancelled.to_diag();
        assert_eq!(diag.position, None);
        assert_eq!(diag.code.as_deref(), Some("cancelled"));
    }

    #[test]
    fn to_report_renders_against_query() {
        let source = QueryText::new("SELECT * FROM g MATCH (a]-(b)");
        let err = EmbedError::Syntax {
            position: 24,
            message: "expected ')' to close a node pattern".into(),
        };
        let report = err.to_report(&source);
        assert_eq!(report.to_string(), "expected ')' to close a node pattern");
    }
}
