//! Reference grammar engine for linear path patterns.
//!
//! The adapter treats the sub-language grammar as an external service behind
//! [`crate::GrammarEngine`]. This module supplies a small built-in
//! implementation of that service (a logos-based lexer and a
//! recursive-descent reducer for comma-separated path patterns such as
//! `(a:Person)-[k:knows]->(b)`) so the crate is usable standalone and the
//! scope/translator machinery is exercised end to end. Hosts with their own
//! generated grammars implement [`crate::GrammarEngine`] instead.

mod ast;
mod lexer;
mod pattern;

pub use ast::{
    EdgeDirection, EdgePattern, NodePattern, PathElement, PathPattern, PatternBinding,
};
pub use lexer::{PatternToken, SpannedToken, tokenize};
pub use pattern::PatternEngine;
