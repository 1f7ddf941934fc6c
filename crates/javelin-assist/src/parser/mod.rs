//! Recursive-descent parser over the assist token stream.
//!
//! The parser never fails: unexpected tokens are reported as [`ParseError`]s and
//! handled by the recovery controller, and the focus token is turned into a
//! marker by the [`MarkerInjector`] wherever the grammar position allows it.

mod decl;
mod expr;
mod stmt;
mod types;

use javelin_syntax::ast::{Block, CompilationUnit, Ident, QualifiedName};
use javelin_syntax::{ParseError, ParseMode, SyntaxKind, TextRange, Token};

use crate::builder::Synthesized;
use crate::marker::{AssistKind, MarkerInjector, PlacedMarker};
use crate::recovery::{self, Expected, RecoveryAction};
use crate::scanner::AssistTokens;
use crate::scope::ScopeStack;

pub(crate) struct ParseConfig {
    pub(crate) assist: AssistKind,
    pub(crate) mode: ParseMode,
    /// Offset that a body must contain to be parsed in [`ParseMode::Method`].
    pub(crate) focus_offset: usize,
    pub(crate) max_depth: usize,
}

pub(crate) struct ParseOutput {
    pub(crate) unit: CompilationUnit,
    pub(crate) errors: Vec<ParseError>,
    pub(crate) synthesized: Synthesized,
    pub(crate) placed: Option<PlacedMarker>,
}

pub(crate) fn parse(source: &str, tokens: AssistTokens, config: ParseConfig) -> ParseOutput {
    let mut parser = Parser::new(source, tokens, config);
    let unit = parser.parse_compilation_unit();
    tracing::trace!(
        target: "javelin.recovery",
        errors = parser.errors.len(),
        virtual_tokens = parser.synthesized.virtual_tokens,
        discarded = parser.synthesized.discarded_tokens,
        "parse finished"
    );
    ParseOutput {
        unit,
        errors: parser.errors,
        synthesized: parser.synthesized,
        placed: parser.marker.into_placed(),
    }
}

pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    mode: ParseMode,
    focus_offset: usize,
    marker: MarkerInjector,
    scopes: ScopeStack,
    synthesized: Synthesized,
    errors: Vec<ParseError>,
    /// Nesting level of the construct being parsed.
    depth: usize,
    /// Deepest level reached by the tree built since the last
    /// [`Parser::start_height`]. Chains built in loops raise it explicitly.
    peak: usize,
    max_depth: usize,
    /// Set by close-and-promote; code blocks unwind until a type body clears it.
    promoting: bool,
    /// Index of a `new` token that directly follows `throw`.
    throw_new: Option<usize>,
    /// Set while parsing syntax that is not kept in the tree, and while parsing a
    /// type whose selection belongs to the enclosing allocation.
    suppress_markers: bool,
    /// `case` labels: `x -> ...` is a rule arrow there, not a lambda.
    in_case_label: bool,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: AssistTokens, config: ParseConfig) -> Self {
        let AssistTokens { mut tokens, focus } = tokens;
        if tokens.last().map_or(true, |t| t.kind != SyntaxKind::Eof) {
            tokens.push(Token::new(SyntaxKind::Eof, TextRange::empty(source.len())));
        }
        Parser {
            source,
            tokens,
            pos: 0,
            mode: config.mode,
            focus_offset: config.focus_offset,
            marker: MarkerInjector::new(config.assist, focus),
            scopes: ScopeStack::new(),
            synthesized: Synthesized::default(),
            errors: Vec::new(),
            depth: 0,
            peak: 0,
            max_depth: config.max_depth,
            promoting: false,
            throw_new: None,
            suppress_markers: false,
            in_case_label: false,
        }
    }

    // --- Token cursor ---

    fn token(&self) -> Token {
        self.nth_token(0)
    }

    fn nth_token(&self, n: usize) -> Token {
        let last = self.tokens.len() - 1;
        self.tokens[(self.pos + n).min(last)]
    }

    fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.nth_token(n).kind
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    fn at_ident(&self) -> bool {
        self.current().is_identifier_like()
    }

    fn at_eof(&self) -> bool {
        self.at(SyntaxKind::Eof)
    }

    fn bump(&mut self) -> Token {
        let tok = self.token();
        if tok.kind != SyntaxKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn text(&self, tok: Token) -> &'a str {
        tok.text(self.source)
    }

    fn current_text(&self) -> &'a str {
        self.text(self.token())
    }

    /// Start offset of the current token.
    fn start(&self) -> usize {
        self.token().range.start as usize
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> usize {
        match self.pos.checked_sub(1) {
            Some(idx) => self.tokens[idx].range.end as usize,
            None => 0,
        }
    }

    fn range_from(&self, start: usize) -> TextRange {
        TextRange::new(start, self.prev_end().max(start))
    }

    /// Whether `a` ends exactly where `b` starts.
    fn adjacent(&self, a: usize, b: usize) -> bool {
        self.nth_token(a).range.end == self.nth_token(b).range.start
    }

    // --- Marker plumbing ---

    fn at_focus(&self) -> bool {
        !self.suppress_markers && self.marker.is_focus(self.pos)
    }

    fn nth_is_focus(&self, n: usize) -> bool {
        !self.suppress_markers && self.marker.is_focus(self.pos + n)
    }

    /// Run `f` with marker placement disabled.
    fn muted<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.suppress_markers, true);
        let out = f(self);
        self.suppress_markers = saved;
        out
    }

    /// The focus token inside a code body, where it can always start an
    /// expression statement.
    fn at_statement_focus(&self) -> bool {
        self.at_focus() && self.scopes.current().is_code()
    }

    // --- Errors & recovery ---

    fn error_here(&mut self, message: impl Into<String>) {
        let range = self.token().range;
        self.errors.push(ParseError {
            message: message.into(),
            range,
        });
    }

    fn expect(&mut self, kind: SyntaxKind, message: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.recover(Expected::Token(kind), message);
        false
    }

    fn recover(&mut self, expected: Expected, message: &str) -> RecoveryAction {
        let found = self.current();
        let action = recovery::decide(expected, found, self.scopes.current());
        self.error_here(message);
        tracing::debug!(
            target: "javelin.recovery",
            ?action,
            ?found,
            offset = self.start(),
            scope = ?self.scopes.current(),
            "{message}"
        );
        match action {
            RecoveryAction::InsertVirtualToken => self.synthesized.virtual_tokens += 1,
            RecoveryAction::DiscardToSync => self.discard_to_sync(expected),
            RecoveryAction::CloseAndPromote => {
                self.promoting = true;
                self.synthesized.promotions += 1;
            }
        }
        action
    }

    /// Skip to the next synchronization point for `expected`. A `;` is consumed
    /// and ends the discard. Unless a token was expected, the first token is
    /// always discarded.
    fn discard_to_sync(&mut self, expected: Expected) {
        let mut consumed = 0usize;
        while !self.at_eof() {
            let kind = self.current();
            if kind == SyntaxKind::Semicolon && expected != Expected::Member {
                self.discard_one();
                return;
            }
            let may_stop = consumed > 0 || matches!(expected, Expected::Token(_));
            if may_stop && (recovery::is_sync_point(expected, kind) || self.at_statement_focus()) {
                return;
            }
            self.discard_one();
            consumed += 1;
        }
    }

    fn discard_one(&mut self) {
        if self.at_focus() {
            tracing::trace!(target: "javelin.marker", "focus token discarded during recovery");
        }
        self.bump();
        self.synthesized.discarded_tokens += 1;
    }

    /// Enter a nested construct. Returns `false` when the depth limit is hit, in
    /// which case the caller must consume a token (or give up) and return.
    fn enter(&mut self) -> bool {
        self.depth += 1;
        self.peak = self.peak.max(self.depth);
        if self.depth > self.max_depth {
            self.error_here("nesting too deep");
            return false;
        }
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Start measuring the height of a subtree rooted at the current level.
    /// Returns the previous peak for [`Parser::finish_height`].
    fn start_height(&mut self) -> usize {
        std::mem::replace(&mut self.peak, self.depth)
    }

    /// Levels below the current one reached since the peak was last reset.
    fn height(&self) -> usize {
        self.peak.saturating_sub(self.depth)
    }

    fn finish_height(&mut self, saved: usize, height: usize) {
        self.peak = saved.max(self.depth + height);
    }

    /// Whether a node can be wrapped around a subtree of `height` at the
    /// current level. Left-nested chains (`a + b + c`, `a.b().c()`) grow in
    /// loops rather than by recursion and stop here.
    fn can_wrap(&mut self, height: usize) -> bool {
        if self.depth + height + 1 > self.max_depth {
            self.error_here("nesting too deep");
            return false;
        }
        true
    }

    // --- Bodies ---

    /// Whether the body starting at the current `{` should be parsed statement by
    /// statement.
    fn should_parse_body(&self) -> bool {
        match (self.marker.assist(), self.mode) {
            (AssistKind::Completion, ParseMode::Diet) => false,
            _ => self.body_contains_focus(),
        }
    }

    fn body_contains_focus(&self) -> bool {
        let open = self.token();
        if open.kind != SyntaxKind::LBrace {
            return false;
        }
        let close_start = match self.matching_brace(self.pos) {
            Some(idx) => self.tokens[idx].range.start as usize,
            None => usize::MAX,
        };
        (open.range.start as usize) < self.focus_offset && self.focus_offset <= close_start
    }

    fn matching_brace(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (idx, tok) in self.tokens.iter().enumerate().skip(open) {
            match tok.kind {
                SyntaxKind::LBrace => depth += 1,
                SyntaxKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Skip a `{ ... }` body by brace matching.
    fn skip_body(&mut self) -> Block {
        let start = self.start();
        match self.matching_brace(self.pos) {
            Some(close) => self.pos = close + 1,
            None => self.pos = self.tokens.len() - 1,
        }
        Block {
            stmts: Vec::new(),
            skipped: true,
            range: self.range_from(start),
        }
    }

    // --- Names ---

    fn ident(&mut self) -> Ident {
        let tok = self.bump();
        Ident::new(self.text(tok))
    }

    fn expect_ident(&mut self, message: &str) -> Option<Ident> {
        if self.at_ident() {
            Some(self.ident())
        } else {
            self.recover(Expected::Token(SyntaxKind::Identifier), message);
            None
        }
    }

    /// `a.b.c` without marker handling; used for annotation names and labels.
    fn plain_qualified_name(&mut self) -> QualifiedName {
        let start = self.start();
        let mut segments = Vec::new();
        if self.at_ident() {
            segments.push(self.ident());
        }
        while self.at(SyntaxKind::Dot) && self.nth(1).is_identifier_like() {
            self.bump();
            segments.push(self.ident());
        }
        QualifiedName {
            segments,
            range: self.range_from(start),
        }
    }
}
