use javelin_syntax::ast::{
    Block, CatchClause, DeclName, Expr, ExprKind, LocalVar, Modifiers, Resource, Stmt,
    StmtKind, SwitchGroup, SwitchLabel, TypeRef,
};
use javelin_syntax::{ensure_stack, print_type, SyntaxKind, TextRange};

use super::Parser;
use crate::builder;
use crate::marker::Position;
use crate::recovery::Expected;
use crate::scope::{LocalOrigin, ScopeKind};

/// The parsed parts of a `switch`, shared by statements and expressions.
struct SwitchParts {
    selector: Expr,
    groups: Vec<SwitchGroup>,
    /// `false` when the input ended inside the block.
    closed: bool,
    /// The marker was placed inside a `case` label.
    marker_in_label: bool,
}

impl<'a> Parser<'a> {
    /// `{ statements }`. Pushes a frame of `scope` when given; otherwise the
    /// statements live in the caller's frame.
    pub(super) fn parse_block(&mut self, scope: Option<ScopeKind>) -> Block {
        self.parse_block_closed(scope).0
    }

    /// Like [`Parser::parse_block`], also reporting whether the `}` was found.
    fn parse_block_closed(&mut self, scope: Option<ScopeKind>) -> (Block, bool) {
        let start = self.start();
        self.expect(SyntaxKind::LBrace, "expected `{`");
        if let Some(kind) = scope {
            self.scopes.push(kind);
        }
        let stmts = self.parse_block_statements();
        if let Some(kind) = scope {
            self.scopes.pop(kind);
        }
        let closed = if self.promoting {
            false
        } else {
            self.expect(SyntaxKind::RBrace, "expected `}` to close the block")
        };
        let block = Block {
            stmts,
            skipped: false,
            range: self.range_from(start),
        };
        (block, closed)
    }

    fn parse_block_statements(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.at(SyntaxKind::RBrace) && !self.at_eof() && !self.promoting {
            let before = self.pos;
            self.parse_statement_into(&mut stmts);
            if self.pos == before && !self.promoting {
                self.discard_one();
            }
        }
        stmts
    }

    /// Parse one statement. Local variable declarations with several declarators
    /// produce one statement per declarator.
    pub(super) fn parse_statement_into(&mut self, out: &mut Vec<Stmt>) {
        ensure_stack(|| {
            if self.enter() {
                self.parse_statement_inner(out);
            } else {
                self.discard_one();
            }
            self.leave();
        });
    }

    fn parse_statement_inner(&mut self, out: &mut Vec<Stmt>) {
        let start = self.start();
        let kind = self.current();
        if kind.is_member_only_keyword() {
            self.recover(Expected::Statement, "unexpected member declaration inside a body");
            return;
        }

        let stmt = match kind {
            SyntaxKind::LBrace => StmtKind::Block(self.parse_block(Some(ScopeKind::Block))),
            SyntaxKind::Semicolon => {
                self.bump();
                StmtKind::Empty
            }
            SyntaxKind::IfKw => self.parse_if(),
            SyntaxKind::WhileKw => {
                self.bump();
                let cond = self.parse_paren_condition();
                let body = Box::new(self.parse_embedded_statement());
                StmtKind::While { cond, body }
            }
            SyntaxKind::DoKw => {
                self.bump();
                let body = Box::new(self.parse_embedded_statement());
                self.expect(SyntaxKind::WhileKw, "expected `while` after `do` body");
                let cond = self.parse_paren_condition();
                self.expect(SyntaxKind::Semicolon, "expected `;` after `do`-`while`");
                StmtKind::DoWhile { body, cond }
            }
            SyntaxKind::ForKw => self.parse_for(),
            SyntaxKind::SwitchKw => {
                let parts = self.parse_switch();
                if parts.closed || parts.marker_in_label {
                    StmtKind::Switch {
                        selector: parts.selector,
                        groups: parts.groups,
                    }
                } else {
                    let stmts = parts.groups.into_iter().flat_map(|group| group.stmts).collect();
                    out.push(builder::anonymous_block(stmts, &mut self.synthesized));
                    return;
                }
            }
            SyntaxKind::TryKw => match self.parse_try() {
                Ok(stmt) => stmt,
                Err(stmts) => {
                    out.push(builder::anonymous_block(stmts, &mut self.synthesized));
                    return;
                }
            },
            SyntaxKind::ReturnKw => {
                self.bump();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expression())
                };
                self.expect_semicolon();
                StmtKind::Return(value)
            }
            SyntaxKind::ThrowKw => {
                self.bump();
                if self.at(SyntaxKind::NewKw) {
                    self.throw_new = Some(self.pos);
                }
                let value = self.parse_expression();
                self.expect_semicolon();
                StmtKind::Throw(value)
            }
            SyntaxKind::BreakKw | SyntaxKind::ContinueKw => {
                self.bump();
                let label = if self.at_ident() { Some(self.ident()) } else { None };
                self.expect_semicolon();
                if kind == SyntaxKind::BreakKw {
                    StmtKind::Break(label)
                } else {
                    StmtKind::Continue(label)
                }
            }
            SyntaxKind::AssertKw => {
                self.bump();
                let cond = self.parse_expression();
                let message = if self.eat(SyntaxKind::Colon) {
                    Some(self.parse_expression())
                } else {
                    None
                };
                self.expect_semicolon();
                StmtKind::Assert { cond, message }
            }
            SyntaxKind::SynchronizedKw => {
                self.bump();
                let lock = self.parse_paren_condition();
                let body = self.parse_block(Some(ScopeKind::Block));
                StmtKind::Synchronized { lock, body }
            }
            SyntaxKind::YieldKw if !self.at_focus() && self.at_yield_statement() => {
                self.bump();
                let value = self.parse_expression();
                self.expect_semicolon();
                StmtKind::Yield(value)
            }
            _ if self.at_local_type_start() => {
                let modifiers = self.parse_modifiers();
                match self.parse_type_decl(start, modifiers) {
                    Some(decl) => StmtKind::LocalType(Box::new(decl)),
                    None => return,
                }
            }
            _ if self.at_ident() && self.nth(1) == SyntaxKind::Colon && !self.at_focus() => {
                let label = self.ident();
                self.bump();
                let body = Box::new(self.parse_embedded_statement());
                StmtKind::Labeled { label, body }
            }
            _ if self.at_local_var_decl_start() => {
                let modifiers = self.parse_modifiers();
                let ty = self.parse_local_type();
                self.parse_declarators(start, modifiers, ty, out);
                self.expect(
                    SyntaxKind::Semicolon,
                    "expected `;` after local variable declaration",
                );
                return;
            }
            _ => {
                let before = self.pos;
                let expr = self.parse_expression();
                if self.pos == before {
                    self.recover(Expected::Statement, "expected a statement");
                    return;
                }
                self.expect_semicolon();
                StmtKind::Expr(expr)
            }
        };
        out.push(Stmt {
            kind: stmt,
            range: self.range_from(start),
        });
    }

    /// `yield` not used as a plain identifier (`yield = 1`, `yield.x`).
    fn at_yield_statement(&self) -> bool {
        !matches!(
            self.nth(1),
            SyntaxKind::Eq
                | SyntaxKind::Dot
                | SyntaxKind::LBracket
                | SyntaxKind::PlusPlus
                | SyntaxKind::MinusMinus
                | SyntaxKind::Semicolon
        )
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current(),
            SyntaxKind::Semicolon | SyntaxKind::RBrace | SyntaxKind::Eof
        )
    }

    fn expect_semicolon(&mut self) {
        self.expect(SyntaxKind::Semicolon, "expected `;`");
    }

    /// A statement nested in `if`, loops and labels. A missing statement yields `;`.
    fn parse_embedded_statement(&mut self) -> Stmt {
        if self.at_eof() || self.at(SyntaxKind::RBrace) || self.promoting {
            return Stmt {
                kind: StmtKind::Empty,
                range: TextRange::NONE,
            };
        }
        let mut out = Vec::new();
        self.parse_statement_into(&mut out);
        match out.len() {
            0 => Stmt {
                kind: StmtKind::Empty,
                range: TextRange::NONE,
            },
            1 => out.remove(0),
            _ => Stmt {
                kind: StmtKind::Block(Block {
                    stmts: out,
                    skipped: false,
                    range: TextRange::NONE,
                }),
                range: TextRange::NONE,
            },
        }
    }

    fn parse_paren_condition(&mut self) -> Expr {
        self.expect(SyntaxKind::LParen, "expected `(`");
        let cond = self.parse_expression();
        self.expect(SyntaxKind::RParen, "expected `)`");
        cond
    }

    fn parse_if(&mut self) -> StmtKind {
        self.bump();
        let cond = self.parse_paren_condition();
        let then_branch = Box::new(self.parse_embedded_statement());
        let else_branch = if self.eat(SyntaxKind::ElseKw) {
            Some(Box::new(self.parse_embedded_statement()))
        } else {
            None
        };
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        }
    }

    /// `var` or an explicit type at the start of a local declaration.
    fn parse_local_type(&mut self) -> TypeRef {
        if self.at(SyntaxKind::VarKw) && self.nth(1).is_identifier_like() {
            let tok = self.bump();
            return TypeRef::simple("var", tok.range);
        }
        self.parse_type(Position::Type)
    }

    /// Declarators after a local variable type, each pushed as its own statement.
    fn parse_declarators(
        &mut self,
        start: usize,
        modifiers: Modifiers,
        ty: TypeRef,
        out: &mut Vec<Stmt>,
    ) {
        loop {
            let decl_start = self.start();
            let name = self.parse_decl_name(Position::LocalName);
            let ty = self.parse_array_dims(ty.clone(), decl_start);
            let init = if self.eat(SyntaxKind::Eq) {
                Some(self.parse_var_init())
            } else {
                None
            };
            if let Some(local) = name.as_str() {
                let printed = print_type(&ty);
                self.scopes.declare(local, Some(printed), LocalOrigin::Local);
            }
            out.push(Stmt {
                kind: StmtKind::LocalVar(LocalVar {
                    modifiers: modifiers.clone(),
                    ty,
                    name,
                    init,
                }),
                range: self.range_from(start),
            });

            if !self.eat(SyntaxKind::Comma) {
                return;
            }
        }
    }

    fn parse_for(&mut self) -> StmtKind {
        self.bump();
        self.expect(SyntaxKind::LParen, "expected `(` after `for`");
        self.scopes.push(ScopeKind::Block);
        let kind = self.parse_for_rest();
        self.scopes.pop(ScopeKind::Block);
        kind
    }

    fn parse_for_rest(&mut self) -> StmtKind {
        let mut init = Vec::new();
        if self.at_local_var_decl_start() {
            let start = self.start();
            let modifiers = self.parse_modifiers();
            let ty = self.parse_local_type();
            if self.nth(1) == SyntaxKind::Colon && self.at_ident() {
                let name = DeclName::Named(self.ident());
                self.bump();
                let iterable = self.parse_expression();
                self.expect(SyntaxKind::RParen, "expected `)` after the `for` header");
                if let Some(local) = name.as_str() {
                    let printed = print_type(&ty);
                    self.scopes.declare(local, Some(printed), LocalOrigin::Local);
                }
                let body = Box::new(self.parse_embedded_statement());
                return StmtKind::ForEach {
                    var: LocalVar {
                        modifiers,
                        ty,
                        name,
                        init: None,
                    },
                    iterable,
                    body,
                };
            }
            self.parse_declarators(start, modifiers, ty, &mut init);
        } else if !self.at(SyntaxKind::Semicolon) {
            self.parse_expression_list(&mut init);
        }
        self.expect(SyntaxKind::Semicolon, "expected `;` in the `for` header");

        let cond = if self.at(SyntaxKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression())
        };
        self.expect(SyntaxKind::Semicolon, "expected `;` in the `for` header");

        let mut updates = Vec::new();
        if !self.at(SyntaxKind::RParen) {
            self.parse_expression_list(&mut updates);
        }
        self.expect(SyntaxKind::RParen, "expected `)` after the `for` header");
        let body = Box::new(self.parse_embedded_statement());
        StmtKind::For {
            init,
            cond,
            update: updates
                .into_iter()
                .filter_map(|stmt| match stmt.kind {
                    StmtKind::Expr(expr) => Some(expr),
                    _ => None,
                })
                .collect(),
            body,
        }
    }

    fn parse_expression_list(&mut self, out: &mut Vec<Stmt>) {
        loop {
            let start = self.start();
            let before = self.pos;
            let expr = self.parse_expression();
            if self.pos == before {
                return;
            }
            out.push(Stmt {
                kind: StmtKind::Expr(expr),
                range: self.range_from(start),
            });
            if !self.eat(SyntaxKind::Comma) {
                return;
            }
        }
    }

    // --- switch ---

    fn parse_switch(&mut self) -> SwitchParts {
        self.bump();
        let selector = self.parse_paren_condition();
        let mut parts = SwitchParts {
            selector,
            groups: Vec::new(),
            closed: true,
            marker_in_label: false,
        };
        if !self.at(SyntaxKind::LBrace) {
            self.expect(SyntaxKind::LBrace, "expected `{` after the switch selector");
            return parts;
        }
        self.bump();
        self.scopes.push(ScopeKind::Switch);
        while !self.at(SyntaxKind::RBrace) && !self.at_eof() && !self.promoting {
            let before = self.pos;
            let group = self.parse_switch_group(&mut parts.marker_in_label);
            parts.groups.push(group);
            if self.pos == before {
                self.discard_one();
            }
        }
        self.scopes.pop(ScopeKind::Switch);
        parts.closed = if self.promoting {
            false
        } else {
            self.expect(SyntaxKind::RBrace, "expected `}` to close the switch")
        };
        parts
    }

    fn at_switch_label(&self) -> bool {
        self.at(SyntaxKind::CaseKw)
            || (self.at(SyntaxKind::DefaultKw)
                && matches!(self.nth(1), SyntaxKind::Colon | SyntaxKind::Arrow))
    }

    fn parse_switch_group(&mut self, marker_in_label: &mut bool) -> SwitchGroup {
        let mut group = SwitchGroup {
            labels: Vec::new(),
            arrow: false,
            stmts: Vec::new(),
        };
        while self.at_switch_label() {
            let was_placed = self.marker.is_placed();
            if self.eat(SyntaxKind::CaseKw) {
                self.in_case_label = true;
                let mut exprs = Vec::new();
                loop {
                    let before = self.pos;
                    exprs.push(self.parse_expression());
                    if self.pos == before || !self.eat(SyntaxKind::Comma) {
                        break;
                    }
                }
                self.in_case_label = false;
                group.labels.push(SwitchLabel::Case(exprs));
            } else {
                self.bump();
                group.labels.push(SwitchLabel::Default);
            }
            if !was_placed && self.marker.is_placed() {
                *marker_in_label = true;
            }
            if self.eat(SyntaxKind::Arrow) {
                group.arrow = true;
                break;
            }
            self.expect(SyntaxKind::Colon, "expected `:` or `->` after the case label");
        }

        if group.arrow {
            self.parse_statement_into(&mut group.stmts);
            return group;
        }
        while !self.at_switch_label()
            && !self.at(SyntaxKind::RBrace)
            && !self.at_eof()
            && !self.promoting
        {
            let before = self.pos;
            self.parse_statement_into(&mut group.stmts);
            if self.pos == before && !self.promoting {
                self.discard_one();
            }
        }
        group
    }

    /// `switch` in expression position.
    pub(super) fn parse_switch_expression(&mut self) -> ExprKind {
        let parts = self.parse_switch();
        ExprKind::Switch {
            selector: Box::new(parts.selector),
            groups: parts.groups,
        }
    }

    // --- try ---

    /// Parse a `try` statement. `Err` carries the body statements when the
    /// statement has to become a plain block: the input ended inside the
    /// `try` block, or it has neither catches, `finally` nor resources.
    fn parse_try(&mut self) -> Result<StmtKind, Vec<Stmt>> {
        self.bump();
        self.scopes.push(ScopeKind::Try);
        let mut resources = Vec::new();
        if self.eat(SyntaxKind::LParen) {
            while !self.at(SyntaxKind::RParen) && !self.at_eof() {
                let before = self.pos;
                resources.push(self.parse_resource());
                if self.pos == before || !self.eat(SyntaxKind::Semicolon) {
                    break;
                }
            }
            self.expect(SyntaxKind::RParen, "expected `)` after resources");
        }
        let (body, body_closed) = if self.at(SyntaxKind::LBrace) {
            self.parse_block_closed(None)
        } else {
            self.expect(SyntaxKind::LBrace, "expected `{` after `try`");
            (Block::default(), true)
        };
        self.scopes.pop(ScopeKind::Try);

        let mut catches = Vec::new();
        while body_closed && self.at(SyntaxKind::CatchKw) {
            catches.push(self.parse_catch());
        }
        let finally = if body_closed && self.eat(SyntaxKind::FinallyKw) {
            Some(self.parse_block(Some(ScopeKind::Block)))
        } else {
            None
        };

        let incomplete = catches.is_empty() && finally.is_none() && resources.is_empty();
        if !body_closed || incomplete {
            return Err(body.stmts);
        }
        Ok(StmtKind::Try {
            resources,
            body,
            catches,
            finally,
        })
    }

    fn parse_resource(&mut self) -> Resource {
        if !self.at_local_var_decl_start() {
            return Resource::Expr(self.parse_expression());
        }
        let modifiers = self.parse_modifiers();
        let ty = self.parse_local_type();
        let name = self.parse_decl_name(Position::LocalName);
        let init = if self.expect(SyntaxKind::Eq, "expected `=` in resource declaration") {
            Some(self.parse_expression())
        } else {
            None
        };
        if let Some(local) = name.as_str() {
            let printed = print_type(&ty);
            self.scopes.declare(local, Some(printed), LocalOrigin::Resource);
        }
        Resource::Decl(LocalVar {
            modifiers,
            ty,
            name,
            init,
        })
    }

    fn parse_catch(&mut self) -> CatchClause {
        self.bump();
        self.expect(SyntaxKind::LParen, "expected `(` after `catch`");
        self.scopes.push(ScopeKind::Catch);
        self.muted(Self::parse_modifiers);
        let mut types = Vec::new();
        loop {
            let before = self.pos;
            types.push(self.parse_type(Position::Exception));
            if self.pos == before || !self.eat(SyntaxKind::Pipe) {
                break;
            }
        }
        let name = self.parse_decl_name(Position::ArgumentName);
        if let Some(local) = name.as_str() {
            let printed = types.iter().map(print_type).collect::<Vec<_>>().join(" | ");
            self.scopes.declare(local, Some(printed), LocalOrigin::CatchParameter);
        }
        self.expect(SyntaxKind::RParen, "expected `)` after the catch parameter");
        let body = if self.at(SyntaxKind::LBrace) {
            self.parse_block(None)
        } else {
            self.expect(SyntaxKind::LBrace, "expected `{` after `catch`");
            Block::default()
        };
        self.scopes.pop(ScopeKind::Catch);
        CatchClause { types, name, body }
    }
}
