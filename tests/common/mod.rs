//! Shared test helpers for the integration suites.

use gql_embed::engine::PatternBinding;
use gql_embed::{EmbeddedParser, GraphContext, NullHooks, QueryText, Span};
use std::sync::Arc;

/// Builds a per-query parser over `sql` with no host namespace.
pub fn pattern_parser(sql: &str) -> EmbeddedParser<PatternBinding> {
    EmbeddedParser::new(
        QueryText::new(sql),
        Arc::new(NullHooks),
        Arc::new(GraphContext::new("g")),
    )
}

/// Byte span of the first occurrence of `needle` in `sql`.
pub fn span_of(sql: &str, needle: &str) -> Span {
    let start = sql.find(needle).expect("needle not found in query");
    start..start + needle.len()
}
