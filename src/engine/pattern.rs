//! Reduction of a token stream into path patterns.
//!
//! This is the bundled stand-in for the external grammar service: a small
//! recursive-descent reducer that resolves every name through the scope it
//! was handed. Named elements are looked up first so a repeated alias is a
//! reference to the existing binding; unnamed elements get a deterministic
//! anonymous alias. Syntax only: no pattern semantics are checked here.

use crate::adapter::{GrammarEngine, ScopeHandle};
use crate::diag::Span;
use crate::error::EngineError;
use crate::scope::ANON_ALIAS_PREFIX;
use smol_str::SmolStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::ast::{
    EdgeDirection, EdgePattern, NodePattern, PathElement, PathPattern, PatternBinding,
};
use super::lexer::{PatternToken, SpannedToken, tokenize};

/// Reference engine parsing comma-separated linear path patterns.
#[derive(Debug, Default)]
pub struct PatternEngine {
    cancel: Option<Arc<AtomicBool>>,
}

impl PatternEngine {
    /// Creates an engine without cancellation support.
    pub fn new() -> Self {
        Self { cancel: None }
    }

    /// Creates an engine that checks `flag` between elements and surfaces
    /// [`EngineError::Cancelled`] once it is set.
    pub fn with_cancel_flag(flag: Arc<AtomicBool>) -> Self {
        Self { cancel: Some(flag) }
    }
}

impl GrammarEngine<PatternBinding> for PatternEngine {
    type Output = Vec<PathPattern>;

    fn run(
        &self,
        fragment: &str,
        scope: &mut ScopeHandle<'_, PatternBinding>,
    ) -> Result<Vec<PathPattern>, EngineError> {
        let tokens = tokenize(fragment)?;
        if tokens.is_empty() {
            return Err(EngineError::syntax(0, "empty graph pattern"));
        }

        let mut parser = PatternParser {
            tokens: &tokens,
            pos: 0,
            end: fragment.len(),
            cancel: self.cancel.as_deref(),
        };

        let mut paths = vec![parser.parse_path(scope)?];
        while parser.consume_comma() {
            paths.push(parser.parse_path(scope)?);
        }
        if let Some(extra) = parser.current() {
            return Err(EngineError::syntax(
                extra.span.start,
                "expected ',' or end of pattern",
            ));
        }
        Ok(paths)
    }
}

/// What an already-bound alias refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Node,
    Edge,
}

fn bound_kind(scope: &ScopeHandle<'_, PatternBinding>, name: &str) -> Option<ElementKind> {
    scope.lookup(name).map(|binding| match binding {
        PatternBinding::Node { .. } => ElementKind::Node,
        PatternBinding::Edge { .. } => ElementKind::Edge,
    })
}

struct PatternParser<'t> {
    tokens: &'t [SpannedToken],
    pos: usize,
    /// Byte length of the fragment, used for errors at end of input.
    end: usize,
    cancel: Option<&'t AtomicBool>,
}

impl PatternParser<'_> {
    fn current(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn error_here(&self, message: &str) -> EngineError {
        let offset = self.current().map(|t| t.span.start).unwrap_or(self.end);
        EngineError::syntax(offset, message)
    }

    fn check_cancelled(&self) -> Result<(), EngineError> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(EngineError::Cancelled),
            _ => Ok(()),
        }
    }

    fn consume_comma(&mut self) -> bool {
        if matches!(
            self.current().map(|t| &t.token),
            Some(PatternToken::Comma)
        ) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_edge_start(&self) -> bool {
        matches!(
            self.current().map(|t| &t.token),
            Some(PatternToken::Dash | PatternToken::ArrowLeft | PatternToken::ArrowRight)
        )
    }

    fn parse_path(
        &mut self,
        scope: &mut ScopeHandle<'_, PatternBinding>,
    ) -> Result<PathPattern, EngineError> {
        self.check_cancelled()?;
        let first = self.parse_node(scope)?;
        let start = first.span.start;
        let mut end = first.span.end;
        let mut elements = vec![PathElement::Node(first)];

        while self.at_edge_start() {
            self.check_cancelled()?;
            let edge = self.parse_edge(scope)?;
            end = edge.span.end;
            elements.push(PathElement::Edge(edge));

            let node = self.parse_node(scope)?;
            end = node.span.end;
            elements.push(PathElement::Node(node));
        }

        Ok(PathPattern {
            elements,
            span: start..end,
        })
    }

    fn parse_node(
        &mut self,
        scope: &mut ScopeHandle<'_, PatternBinding>,
    ) -> Result<NodePattern, EngineError> {
        let open = match self.current() {
            Some(t) if matches!(t.token, PatternToken::LParen) => {
                let span = t.span.clone();
                self.pos += 1;
                span
            }
            _ => return Err(self.error_here("expected '(' to open a node pattern")),
        };

        let alias = self.consume_identifier();
        let label = self.parse_label()?;

        let close = match self.current() {
            Some(t) if matches!(t.token, PatternToken::RParen) => {
                let span = t.span.clone();
                self.pos += 1;
                span
            }
            _ => return Err(self.error_here("expected ')' to close a node pattern")),
        };
        let span = open.start..close.end;

        match alias {
            Some((name, alias_span)) => match bound_kind(scope, &name) {
                Some(ElementKind::Node) => Ok(NodePattern {
                    alias: name,
                    label,
                    anonymous: false,
                    span,
                }),
                Some(ElementKind::Edge) => Err(EngineError::syntax(
                    alias_span.start,
                    format!("variable '{name}' is already bound to an edge pattern"),
                )),
                None => {
                    scope.bind(
                        name.clone(),
                        PatternBinding::Node {
                            declared_at: span.clone(),
                        },
                    );
                    Ok(NodePattern {
                        alias: name,
                        label,
                        anonymous: false,
                        span,
                    })
                }
            },
            None => {
                let alias = scope.fresh_alias(ANON_ALIAS_PREFIX);
                scope.bind(
                    alias.clone(),
                    PatternBinding::Node {
                        declared_at: span.clone(),
                    },
                );
                Ok(NodePattern {
                    alias,
                    label,
                    anonymous: true,
                    span,
                })
            }
        }
    }

    fn parse_edge(
        &mut self,
        scope: &mut ScopeHandle<'_, PatternBinding>,
    ) -> Result<EdgePattern, EngineError> {
        let Some(first) = self.current().cloned() else {
            return Err(self.error_here("expected an edge pattern"));
        };
        let start = first.span.start;

        match first.token {
            PatternToken::ArrowRight => {
                self.pos += 1;
                self.finish_edge(scope, None, None, EdgeDirection::Right, start..first.span.end)
            }
            PatternToken::ArrowLeft => {
                self.pos += 1;
                if self.consume_lbracket() {
                    let (alias, label) = self.parse_edge_filler()?;
                    let dash = match self.current() {
                        Some(t) if matches!(t.token, PatternToken::Dash) => {
                            let span = t.span.clone();
                            self.pos += 1;
                            span
                        }
                        _ => return Err(self.error_here("expected '-' after edge pattern")),
                    };
                    self.finish_edge(scope, alias, label, EdgeDirection::Left, start..dash.end)
                } else {
                    self.finish_edge(scope, None, None, EdgeDirection::Left, start..first.span.end)
                }
            }
            PatternToken::Dash => {
                self.pos += 1;
                if self.consume_lbracket() {
                    let (alias, label) = self.parse_edge_filler()?;
                    let (direction, close) = match self.current() {
                        Some(t) if matches!(t.token, PatternToken::ArrowRight) => {
                            let span = t.span.clone();
                            self.pos += 1;
                            (EdgeDirection::Right, span)
                        }
                        Some(t) if matches!(t.token, PatternToken::Dash) => {
                            let span = t.span.clone();
                            self.pos += 1;
                            (EdgeDirection::Undirected, span)
                        }
                        _ => return Err(self.error_here("expected '->' or '-' after edge pattern")),
                    };
                    self.finish_edge(scope, alias, label, direction, start..close.end)
                } else {
                    self.finish_edge(
                        scope,
                        None,
                        None,
                        EdgeDirection::Undirected,
                        start..first.span.end,
                    )
                }
            }
            _ => Err(EngineError::syntax(
                start,
                "expected '-', '->' or '<-' to continue the path",
            )),
        }
    }

    /// Parses the bracketed edge filler after `[`, consuming through `]`.
    fn parse_edge_filler(
        &mut self,
    ) -> Result<(Option<(SmolStr, Span)>, Option<SmolStr>), EngineError> {
        let alias = self.consume_identifier();
        let label = self.parse_label()?;
        match self.current() {
            Some(t) if matches!(t.token, PatternToken::RBracket) => {
                self.pos += 1;
                Ok((alias, label))
            }
            _ => Err(self.error_here("expected ']' to close an edge pattern")),
        }
    }

    fn finish_edge(
        &mut self,
        scope: &mut ScopeHandle<'_, PatternBinding>,
        alias: Option<(SmolStr, Span)>,
        label: Option<SmolStr>,
        direction: EdgeDirection,
        span: Span,
    ) -> Result<EdgePattern, EngineError> {
        match alias {
            Some((name, alias_span)) => match bound_kind(scope, &name) {
                Some(ElementKind::Edge) => Ok(EdgePattern {
                    alias: name,
                    label,
                    direction,
                    anonymous: false,
                    span,
                }),
                Some(ElementKind::Node) => Err(EngineError::syntax(
                    alias_span.start,
                    format!("variable '{name}' is already bound to a node pattern"),
                )),
                None => {
                    scope.bind(
                        name.clone(),
                        PatternBinding::Edge {
                            declared_at: span.clone(),
                        },
                    );
                    Ok(EdgePattern {
                        alias: name,
                        label,
                        direction,
                        anonymous: false,
                        span,
                    })
                }
            },
            None => {
                let alias = scope.fresh_alias(ANON_ALIAS_PREFIX);
                scope.bind(
                    alias.clone(),
                    PatternBinding::Edge {
                        declared_at: span.clone(),
                    },
                );
                Ok(EdgePattern {
                    alias,
                    label,
                    direction,
                    anonymous: true,
                    span,
                })
            }
        }
    }

    fn parse_label(&mut self) -> Result<Option<SmolStr>, EngineError> {
        if !matches!(
            self.current().map(|t| &t.token),
            Some(PatternToken::Colon)
        ) {
            return Ok(None);
        }
        self.pos += 1;
        match self.current() {
            Some(t) => match &t.token {
                PatternToken::Identifier(name) | PatternToken::QuotedName(name) => {
                    let name = name.clone();
                    self.pos += 1;
                    Ok(Some(name))
                }
                _ => Err(self.error_here("expected a label name after ':'")),
            },
            None => Err(self.error_here("expected a label name after ':'")),
        }
    }

    fn consume_identifier(&mut self) -> Option<(SmolStr, Span)> {
        match self.current() {
            Some(t) => match &t.token {
                PatternToken::Identifier(name) => {
                    let pair = (name.clone(), t.span.clone());
                    self.pos += 1;
                    Some(pair)
                }
                _ => None,
            },
            None => None,
        }
    }

    fn consume_lbracket(&mut self) -> bool {
        if matches!(
            self.current().map(|t| &t.token),
            Some(PatternToken::LBracket)
        ) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}
