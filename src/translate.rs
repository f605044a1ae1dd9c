//! Error-position translation for embedded fragments.
//!
//! While a fragment is being parsed, a translator frame is installed for its
//! scope. A syntax error raised by the grammar engine carries a byte offset
//! local to the fragment; the active frame rewrites it into a character
//! position in the root query text, counting characters across the fragment
//! prefix so multibyte text translates correctly. Cancellation signals carry
//! no position and pass through unmodified.
//!
//! Frames form a per-parse stack with strict LIFO discipline matching scope
//! nesting: installing pushes, uninstalling pops and restores whatever frame
//! was active before, possibly none. Uninstall must run on every exit path,
//! which [`TranslatorGuard`] guarantees. An uninstall without a matching
//! install means the caller's control flow is corrupted and panics rather
//! than returning an error.
//!
//! Frames store the fragment's offset as an absolute position in the root
//! text. Nested fragments still compose additively the way nested-handler
//! stacks do: each adapter level rewrites a bubbling error exactly once,
//! relative to its own enclosing text (see
//! [`crate::adapter::ScopeHandle::parse_nested`]), and the outermost level
//! produces the root-relative position.

use crate::diag::QueryText;
use crate::error::{EmbedError, EngineError};
use crate::scope::ScopeId;
use tracing::debug;

/// One installed translator: the scope it covers and where that scope's
/// fragment begins in the root text.
#[derive(Debug, Clone)]
pub struct TranslatorFrame {
    scope: ScopeId,
    source: QueryText,
    offset_chars: usize,
    offset_bytes: usize,
}

impl TranslatorFrame {
    /// The scope this translator was installed for.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Character offset of the fragment start in the root text.
    pub fn fragment_offset(&self) -> usize {
        self.offset_chars
    }

    /// Byte offset of the fragment start in the root text.
    pub fn fragment_byte_offset(&self) -> usize {
        self.offset_bytes
    }

    /// Rewrites a fragment-local byte offset into a character position in
    /// the root text.
    pub fn translate_local(&self, local_offset: usize) -> usize {
        self.offset_chars + self.source.chars_in(self.offset_bytes, local_offset)
    }
}

/// Per-parse stack of installed translator frames, most recent active.
///
/// Owned by the call frame performing the parse, never process-global, so
/// concurrent queries cannot interfere with each other's frames.
#[derive(Debug, Default)]
pub struct Translators {
    frames: Vec<TranslatorFrame>,
}

impl Translators {
    /// Creates an empty translator stack.
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Pushes a translator frame for `scope`, whose fragment begins at
    /// character `fragment_offset` in `source`.
    ///
    /// Panics if the offset lies outside the text: that is a precondition
    /// violation in the integration, not a user-facing error.
    pub fn install(&mut self, scope: ScopeId, source: &QueryText, fragment_offset: usize) {
        assert!(
            fragment_offset <= source.len_chars(),
            "fragment offset {fragment_offset} is outside the query text ({} chars)",
            source.len_chars()
        );
        debug!(
            scope = scope.as_usize(),
            offset = fragment_offset,
            depth = self.frames.len(),
            "install position translator"
        );
        let offset_bytes = source.char_to_byte(fragment_offset);
        self.frames.push(TranslatorFrame {
            scope,
            source: source.clone(),
            offset_chars: fragment_offset,
            offset_bytes,
        });
    }

    /// Pops the most recent frame, restoring the previously active one.
    ///
    /// Panics if no frame is installed: an unbalanced uninstall indicates
    /// corrupted control flow in the caller.
    pub fn uninstall(&mut self) {
        let frame = self
            .frames
            .pop()
            .expect("translator uninstalled without a matching install");
        debug!(
            scope = frame.scope.as_usize(),
            depth = self.frames.len(),
            "uninstall position translator"
        );
    }

    /// Installs a frame and returns a guard that uninstalls it on drop,
    /// covering every exit path of the enclosing region.
    pub fn install_guard(
        &mut self,
        scope: ScopeId,
        source: &QueryText,
        fragment_offset: usize,
    ) -> TranslatorGuard<'_> {
        self.install(scope, source, fragment_offset);
        TranslatorGuard { stack: self }
    }

    /// The currently active frame, if any.
    pub fn active(&self) -> Option<&TranslatorFrame> {
        self.frames.last()
    }

    /// Number of installed frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Rewrites an engine error through the active frame.
    ///
    /// Syntax errors get their local offset translated to a root-relative
    /// character position; cancellation passes through with no position
    /// added or altered. Panics if no frame is installed.
    pub fn translate(&self, err: EngineError) -> EmbedError {
        match err {
            EngineError::Cancelled => EmbedError::Cancelled,
            EngineError::Syntax {
                local_offset,
                message,
            } => {
                let frame = self
                    .active()
                    .expect("error translated with no translator installed");
                EmbedError::Syntax {
                    position: frame.translate_local(local_offset),
                    message,
                }
            }
        }
    }
}

/// RAII handle for one installed translator frame.
///
/// Dropping the guard uninstalls the frame, so early returns and error
/// propagation cannot leave the stack unbalanced.
#[derive(Debug)]
pub struct TranslatorGuard<'a> {
    stack: &'a mut Translators,
}

impl TranslatorGuard<'_> {
    /// Rewrites an engine error through the frame this guard installed.
    pub fn translate(&self, err: EngineError) -> EmbedError {
        self.stack.translate(err)
    }

    /// The frame this guard installed.
    pub fn frame(&self) -> &TranslatorFrame {
        self.stack
            .active()
            .expect("guard outlived its translator frame")
    }
}

impl Drop for TranslatorGuard<'_> {
    fn drop(&mut self) {
        self.stack.uninstall();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(id: usize) -> ScopeId {
        // Frames only record the id; no scope arena is needed here.
        let mut scopes: crate::scope::ScopeStack<()> = crate::scope::ScopeStack::new();
        let mut last = scopes.push_root(
            QueryText::new("x"),
            std::sync::Arc::new(crate::scope::NullHooks),
            std::sync::Arc::new(crate::scope::GraphContext::new("g")),
        );
        for _ in 0..id {
            last = scopes.push_child(last);
        }
        last
    }

    fn text_of_len(len: usize) -> QueryText {
        QueryText::new("q".repeat(len))
    }

    #[test]
    fn single_level_translation() {
        let source = text_of_len(50);
        let mut translators = Translators::new();
        translators.install(scope(0), &source, 10);

        let err = translators.translate(EngineError::syntax(3, "unexpected token"));
        assert_eq!(
            err,
            EmbedError::Syntax {
                position: 13,
                message: "unexpected token".into()
            }
        );
        translators.uninstall();
    }

    #[test]
    fn translation_counts_characters_not_bytes() {
        // Fragment starts after "où " (3 chars, 4 bytes). A local error 4
        // bytes into the fragment sits after "éé" (2 chars, 4 bytes), so the
        // reported position is 3 + 2, not 3 + 4.
        let source = QueryText::new("où ééxyz");
        let mut translators = Translators::new();
        translators.install(scope(0), &source, 3);

        let err = translators.translate(EngineError::syntax(4, "boom"));
        assert_eq!(err.position(), Some(5));
        translators.uninstall();
    }

    #[test]
    fn cancellation_passes_through_unmodified() {
        let source = text_of_len(20);
        let mut translators = Translators::new();
        translators.install(scope(0), &source, 5);

        assert_eq!(
            translators.translate(EngineError::Cancelled),
            EmbedError::Cancelled
        );
        translators.uninstall();
    }

    #[test]
    fn lifo_restores_previous_frame() {
        let source = text_of_len(50);
        let mut translators = Translators::new();
        assert_eq!(translators.depth(), 0);

        let parent = scope(0);
        let child = scope(1);
        translators.install(parent, &source, 10);
        translators.install(child, &source, 14);
        assert_eq!(translators.active().unwrap().scope(), child);

        translators.uninstall();
        assert_eq!(translators.active().unwrap().scope(), parent);
        assert_eq!(translators.active().unwrap().fragment_offset(), 10);

        translators.uninstall();
        assert!(translators.active().is_none());
        assert_eq!(translators.depth(), 0);
    }

    #[test]
    fn guard_uninstalls_on_drop() {
        let source = text_of_len(10);
        let mut translators = Translators::new();
        {
            let guard = translators.install_guard(scope(0), &source, 2);
            assert_eq!(guard.frame().fragment_offset(), 2);
        }
        assert_eq!(translators.depth(), 0);
    }

    #[test]
    fn install_at_text_end_is_allowed() {
        let source = text_of_len(10);
        let mut translators = Translators::new();
        translators.install(scope(0), &source, 10);
        let err = translators.translate(EngineError::syntax(0, "eof"));
        assert_eq!(err.position(), Some(10));
        translators.uninstall();
    }

    #[test]
    #[should_panic(expected = "outside the query text")]
    fn install_past_text_end_panics() {
        let source = text_of_len(10);
        let mut translators = Translators::new();
        translators.install(scope(0), &source, 11);
    }

    #[test]
    #[should_panic(expected = "without a matching install")]
    fn unbalanced_uninstall_panics() {
        let mut translators = Translators::new();
        translators.uninstall();
    }
}
