//! Lexical analysis for the path pattern fragment grammar.

use crate::diag::Span;
use crate::error::EngineError;
use logos::Logos;
use smol_str::SmolStr;

/// Tokens of the path pattern sub-language.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum PatternToken {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("->")]
    ArrowRight,

    #[token("<-")]
    ArrowLeft,

    #[token("-")]
    Dash,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    /// A bare identifier: element variable or label name.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| SmolStr::new(lex.slice()))]
    Identifier(SmolStr),

    /// A backquoted name, for labels that are not lexical identifiers.
    #[regex(r"`[^`]*`", |lex| {
        let quoted = lex.slice();
        SmolStr::new(&quoted[1..quoted.len() - 1])
    })]
    QuotedName(SmolStr),
}

/// A token with its byte span local to the fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: PatternToken,
    pub span: Span,
}

/// Tokenizes a fragment, failing on the first unrecognized character.
///
/// The error offset is local to the fragment, as the adapter expects.
pub fn tokenize(fragment: &str) -> Result<Vec<SpannedToken>, EngineError> {
    let mut lexer = PatternToken::lexer(fragment);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) => {
                return Err(EngineError::syntax(
                    span.start,
                    format!(
                        "unrecognized character {:?} in graph pattern",
                        &fragment[span.clone()]
                    ),
                ));
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(fragment: &str) -> Vec<PatternToken> {
        tokenize(fragment)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn tokenizes_node_and_edge_punctuation() {
        assert_eq!(
            kinds("(a)-[e]->(b)"),
            vec![
                PatternToken::LParen,
                PatternToken::Identifier("a".into()),
                PatternToken::RParen,
                PatternToken::Dash,
                PatternToken::LBracket,
                PatternToken::Identifier("e".into()),
                PatternToken::RBracket,
                PatternToken::ArrowRight,
                PatternToken::LParen,
                PatternToken::Identifier("b".into()),
                PatternToken::RParen,
            ]
        );
    }

    #[test]
    fn arrow_takes_precedence_over_dash() {
        assert_eq!(kinds("->"), vec![PatternToken::ArrowRight]);
        assert_eq!(kinds("<-"), vec![PatternToken::ArrowLeft]);
        // A lone '>' is not part of the grammar, so a split arrow fails.
        assert_eq!(tokenize("- >").unwrap_err(), EngineError::syntax(2, "unrecognized character \">\" in graph pattern"));
    }

    #[test]
    fn quoted_names_strip_backquotes() {
        assert_eq!(
            kinds("`has friend`"),
            vec![PatternToken::QuotedName("has friend".into())]
        );
    }

    #[test]
    fn whitespace_is_skipped_but_spans_stay_local() {
        let tokens = tokenize("  (n)").unwrap();
        assert_eq!(tokens[0].span, 2..3);
        assert_eq!(tokens[1].span, 3..4);
    }

    #[test]
    fn unrecognized_character_reports_local_offset() {
        let err = tokenize("(a) @").unwrap_err();
        assert_eq!(
            err,
            EngineError::syntax(4, "unrecognized character \"@\" in graph pattern")
        );
    }
}
