//! Fragment representation produced by the reference pattern engine.
//!
//! Spans are byte ranges local to the fragment, matching the positions the
//! engine reports in errors; the host relates them to the root text through
//! the scope's fragment offset.

use crate::diag::Span;
use smol_str::SmolStr;

/// A linear path pattern: nodes alternating with edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    /// Pattern elements in source order, starting and ending with a node.
    pub elements: Vec<PathElement>,
    /// Fragment-local span covering the whole path.
    pub span: Span,
}

/// One element of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement {
    Node(NodePattern),
    Edge(EdgePattern),
}

/// A node pattern such as `(a:Person)` or `()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePattern {
    /// The element variable, system-generated when the user left it out.
    pub alias: SmolStr,
    /// Optional label constraint.
    pub label: Option<SmolStr>,
    /// Whether `alias` was generated rather than written by the user.
    pub anonymous: bool,
    /// Fragment-local span of the node pattern.
    pub span: Span,
}

/// Traversal direction of an edge pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// `<-[..]-`
    Left,
    /// `-[..]->`
    Right,
    /// `-[..]-`
    Undirected,
}

/// An edge pattern such as `-[e:knows]->` or `<-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePattern {
    /// The element variable, system-generated when the user left it out.
    pub alias: SmolStr,
    /// Optional label constraint.
    pub label: Option<SmolStr>,
    /// Traversal direction.
    pub direction: EdgeDirection,
    /// Whether `alias` was generated rather than written by the user.
    pub anonymous: bool,
    /// Fragment-local span of the edge pattern.
    pub span: Span,
}

/// Referent the reference engine binds for each pattern element.
///
/// Hosts running their own grammar engines choose their own referent type;
/// this one records only what the element was and where it was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternBinding {
    /// The alias names a node pattern.
    Node {
        /// Fragment-local span of the declaring element.
        declared_at: Span,
    },
    /// The alias names an edge pattern.
    Edge {
        /// Fragment-local span of the declaring element.
        declared_at: Span,
    },
}
