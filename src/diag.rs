//! Diagnostic model for errors surfaced against the root query text.
//!
//! Embedded-fragment errors always report positions relative to the original
//! top-level query, so the diagnostic model here is built around a shared
//! [`QueryText`] and character offsets into it. Rendering goes through miette
//! so the host can show the error with full source context.

use miette::{Diagnostic, LabeledSpan, Report, Severity};
use std::fmt;
use std::sync::Arc;

/// A byte span into source text.
pub type Span = std::ops::Range<usize>;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagSeverity {
    /// A fatal error that prevents further processing.
    Error,
    /// A warning about potentially problematic code.
    Warning,
    /// An informational note or advice.
    Note,
}

impl fmt::Display for DiagSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagSeverity::Error => write!(f, "error"),
            DiagSeverity::Warning => write!(f, "warning"),
            DiagSeverity::Note => write!(f, "note"),
        }
    }
}

/// Shared, read-only view of the full original query text.
///
/// Every scope in a parse holds the same `QueryText`; cloning shares the
/// underlying buffer rather than copying it. Positions exchanged with the
/// host are character offsets, while the grammar engine and miette work in
/// bytes, so the character/byte conversions live here.
#[derive(Debug, Clone)]
pub struct QueryText {
    text: Arc<str>,
    name: Option<Arc<str>>,
}

impl QueryText {
    /// Creates a query text view from the full top-level query string.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            name: None,
        }
    }

    /// Creates a query text view with a display name for diagnostics.
    pub fn with_name(text: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            name: Some(name.into()),
        }
    }

    /// Returns the query string.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Length of the query in bytes.
    pub fn len_bytes(&self) -> usize {
        self.text.len()
    }

    /// Length of the query in characters.
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Converts a character offset to the byte offset of the same position.
    ///
    /// Offsets past the end clamp to the end of the text.
    pub fn char_to_byte(&self, char_offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    /// Converts a byte offset to the number of characters before it.
    pub fn byte_to_char(&self, byte_offset: usize) -> usize {
        self.chars_in(0, byte_offset)
    }

    /// Counts the characters contained in the byte window
    /// `byte_start..byte_start + byte_len`.
    ///
    /// Tolerates windows that do not land on character boundaries or run past
    /// the end of the text: a character is counted when its first byte falls
    /// inside the window.
    pub fn chars_in(&self, byte_start: usize, byte_len: usize) -> usize {
        let end = byte_start.saturating_add(byte_len);
        self.text
            .char_indices()
            .filter(|(idx, _)| *idx >= byte_start && *idx < end)
            .count()
    }

    /// Returns the substring covered by `span`, clamping out-of-range or
    /// mid-character endpoints to the nearest valid boundary.
    pub fn slice(&self, span: Span) -> &str {
        let start = self.floor_boundary(span.start);
        let end = self.floor_boundary(span.end).max(start);
        &self.text[start..end]
    }

    fn floor_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

/// A structured diagnostic anchored to one position in the root query.
///
/// Unlike multi-label compiler diagnostics, embedded-fragment errors carry at
/// most one interesting location: the translated position of the failure in
/// the original query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    /// The severity level of this diagnostic.
    pub severity: DiagSeverity,
    /// The main diagnostic message.
    pub message: String,
    /// Character offset into the root query text, if known.
    pub position: Option<usize>,
    /// Label text shown at `position`.
    pub label: Option<String>,
    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,
    /// Optional diagnostic code (e.g. "syntax::fragment").
    pub code: Option<String>,
}

impl Diag {
    /// Creates a new diagnostic with the given severity and message.
    pub fn new(severity: DiagSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            position: None,
            label: None,
            help: None,
            code: None,
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagSeverity::Error, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagSeverity::Warning, message)
    }

    /// Creates a new note diagnostic.
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(DiagSeverity::Note, message)
    }

    /// Anchors this diagnostic at a character position in the root query.
    pub fn with_position(mut self, position: usize, label: impl Into<String>) -> Self {
        self.position = Some(position);
        self.label = Some(label.into());
        self
    }

    /// Sets the help text for this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Sets the diagnostic code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Renders this diagnostic as a miette report against the query text.
    ///
    /// The stored character position is converted to the byte span miette
    /// expects, covering the single character at that position.
    pub fn into_report(self, source: &QueryText) -> Report {
        let labels = match self.position {
            Some(position) => {
                let start = source.char_to_byte(position);
                let width = source.as_str()[start..]
                    .chars()
                    .next()
                    .map(char::len_utf8)
                    .unwrap_or(0);
                vec![LabeledSpan::new_primary_with_span(
                    self.label.clone(),
                    (start, width),
                )]
            }
            None => Vec::new(),
        };

        let rendered = RenderedDiag {
            message: self.message,
            severity: match self.severity {
                DiagSeverity::Error => Severity::Error,
                DiagSeverity::Warning => Severity::Warning,
                DiagSeverity::Note => Severity::Advice,
            },
            code: self.code,
            help: self.help,
            labels,
        };

        let report = Report::new(rendered);
        match source.name() {
            Some(name) => report.with_source_code(miette::NamedSource::new(
                name,
                source.as_str().to_string(),
            )),
            None => report.with_source_code(source.as_str().to_string()),
        }
    }
}

/// The concrete type handed to miette for rendering.
#[derive(Debug)]
struct RenderedDiag {
    message: String,
    severity: Severity,
    code: Option<String>,
    help: Option<String>,
    labels: Vec<LabeledSpan>,
}

impl fmt::Display for RenderedDiag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RenderedDiag {}

impl Diagnostic for RenderedDiag {
    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.code
            .as_ref()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            None
        } else {
            Some(Box::new(self.labels.clone().into_iter()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_display() {
        assert_eq!(DiagSeverity::Error.to_string(), "error");
        assert_eq!(DiagSeverity::Warning.to_string(), "warning");
        assert_eq!(DiagSeverity::Note.to_string(), "note");
    }

    #[test]
    fn query_text_shares_buffer_on_clone() {
        let text = QueryText::new("MATCH (n) RETURN n");
        let copy = text.clone();
        assert_eq!(text.as_str(), copy.as_str());
        assert!(std::ptr::eq(text.as_str(), copy.as_str()));
    }

    #[test]
    fn char_byte_roundtrip_ascii() {
        let text = QueryText::new("SELECT 1");
        assert_eq!(text.len_chars(), 8);
        assert_eq!(text.char_to_byte(0), 0);
        assert_eq!(text.char_to_byte(7), 7);
        assert_eq!(text.char_to_byte(8), 8);
        assert_eq!(text.char_to_byte(99), 8);
        assert_eq!(text.byte_to_char(7), 7);
    }

    #[test]
    fn char_byte_conversion_multibyte() {
        // "é" is two bytes, "日" is three.
        let text = QueryText::new("aé日b");
        assert_eq!(text.len_bytes(), 7);
        assert_eq!(text.len_chars(), 4);
        assert_eq!(text.char_to_byte(1), 1);
        assert_eq!(text.char_to_byte(2), 3);
        assert_eq!(text.char_to_byte(3), 6);
        assert_eq!(text.byte_to_char(6), 3);
    }

    #[test]
    fn chars_in_counts_characters_not_bytes() {
        let text = QueryText::new("aé日b");
        assert_eq!(text.chars_in(0, 7), 4);
        assert_eq!(text.chars_in(1, 5), 2);
        assert_eq!(text.chars_in(0, 0), 0);
    }

    #[test]
    fn chars_in_tolerates_mid_character_windows() {
        let text = QueryText::new("aé日b");
        // Window ends in the middle of "日": its first byte is outside.
        assert_eq!(text.chars_in(0, 4), 2);
        // Window starting past the end counts nothing.
        assert_eq!(text.chars_in(20, 5), 0);
    }

    #[test]
    fn slice_clamps_to_boundaries() {
        let text = QueryText::new("aé日b");
        assert_eq!(text.slice(0..3), "aé");
        assert_eq!(text.slice(0..4), "aé");
        assert_eq!(text.slice(3..100), "日b");
        assert_eq!(text.slice(5..2), "");
    }

    #[test]
    fn diag_builder() {
        let diag = Diag::error("syntax error")
            .with_position(13, "here")
            .with_help("check the pattern syntax")
            .with_code("syntax::fragment");

        assert_eq!(diag.severity, DiagSeverity::Error);
        assert_eq!(diag.position, Some(13));
        assert_eq!(diag.label.as_deref(), Some("here"));
        assert_eq!(diag.help.as_deref(), Some("check the pattern syntax"));
        assert_eq!(diag.code.as_deref(), Some("syntax::fragment"));
    }

    #[test]
    fn into_report_renders_message() {
        let source = QueryText::with_name("MATCH (n RETURN n", "query.sql");
        let diag = Diag::error("expected ')' to close a node pattern").with_position(9, "here");

        let report = diag.into_report(&source);
        assert_eq!(report.to_string(), "expected ')' to close a node pattern");
    }

    #[test]
    fn into_report_survives_position_past_end() {
        let source = QueryText::new("short");
        let diag = Diag::error("unexpected end of fragment").with_position(50, "here");

        let report = diag.into_report(&source);
        assert_eq!(report.to_string(), "unexpected end of fragment");
    }

    #[test]
    fn into_report_without_position() {
        let source = QueryText::new("SELECT 1");
        let report = Diag::error("query cancelled").into_report(&source);
        assert_eq!(report.to_string(), "query cancelled");
    }
}
