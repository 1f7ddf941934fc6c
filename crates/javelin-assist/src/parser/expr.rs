use javelin_syntax::ast::{
    AssignOp, BinaryOp, DeclKind, Expr, ExprKind, Ident, LambdaBody, LambdaParam, MarkerPayload, PostfixOp,
    TypeRef, TypeSegment, UnaryOp,
};
use javelin_syntax::{ensure_stack, print_type, SyntaxKind, TextRange, Token};

use super::Parser;
use crate::marker::{AssistKind, Position};
use crate::scope::{LocalOrigin, ScopeKind};

#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Assign(AssignOp),
    InstanceOf,
    Conditional,
}

/// Returns (left_bp, right_bp). Larger binds tighter.
fn infix_binding_power(op: Infix) -> (u8, u8) {
    use BinaryOp::*;
    match op {
        Infix::Binary(Mul | Div | Rem) => (70, 71),
        Infix::Binary(Add | Sub) => (60, 61),
        Infix::Binary(Shl | Shr | UShr) => (55, 56),
        Infix::Binary(Less | LessEq | Greater | GreaterEq) | Infix::InstanceOf => (50, 51),
        Infix::Binary(Eq | NotEq) => (45, 46),
        Infix::Binary(And) => (40, 41),
        Infix::Binary(Xor) => (39, 40),
        Infix::Binary(Or) => (38, 39),
        Infix::Binary(AndAnd) => (30, 31),
        Infix::Binary(OrOr) => (20, 21),
        // Right-associative.
        Infix::Conditional => (10, 9),
        Infix::Assign(_) => (1, 0),
    }
}

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> Expr {
        self.parse_expr_bp(0)
    }

    /// The right-hand side of `=` in a declaration: an array initializer or an expression.
    pub(super) fn parse_var_init(&mut self) -> Expr {
        if self.at(SyntaxKind::LBrace) {
            self.parse_array_init()
        } else {
            self.parse_expression()
        }
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        ensure_stack(|| self.parse_expr_bp_guarded(min_bp))
    }

    fn parse_expr_bp_guarded(&mut self, min_bp: u8) -> Expr {
        if !self.enter() {
            self.leave();
            let range = self.token().range;
            self.discard_one();
            return Expr::missing(range);
        }
        let saved_peak = self.start_height();
        let start = self.start();
        let mut lhs = self.parse_unary();
        let mut height = self.height();
        while let Some((op, width)) = self.infix_op() {
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp || !self.can_wrap(height) {
                break;
            }
            self.peak = self.depth;
            for _ in 0..width {
                self.bump();
            }
            let kind = match op {
                Infix::Binary(op) => ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(self.parse_expr_bp(r_bp)),
                },
                Infix::Assign(op) => ExprKind::Assign {
                    op,
                    target: Box::new(lhs),
                    value: Box::new(self.parse_expr_bp(r_bp)),
                },
                Infix::InstanceOf => {
                    self.eat(SyntaxKind::FinalKw);
                    let ty = self.parse_type(Position::Type);
                    let binding = if self.at_ident() && !self.at_focus() {
                        let name = self.ident();
                        let printed = print_type(&ty);
                        self.scopes.declare(&name, Some(printed), LocalOrigin::PatternBinding);
                        Some(name)
                    } else {
                        None
                    };
                    ExprKind::InstanceOf {
                        expr: Box::new(lhs),
                        ty,
                        binding,
                    }
                }
                Infix::Conditional => {
                    let then_expr = self.parse_expr_bp(0);
                    self.expect(SyntaxKind::Colon, "expected `:` in conditional expression");
                    let else_expr = self.parse_expr_bp(r_bp);
                    ExprKind::Conditional {
                        cond: Box::new(lhs),
                        then_expr: Box::new(then_expr),
                        else_expr: Box::new(else_expr),
                    }
                }
            };
            lhs = Expr::new(kind, self.range_from(start));
            height = (height + 1).max(self.height());
        }
        self.finish_height(saved_peak, height);
        self.leave();
        lhs
    }

    /// The infix operator at the cursor and how many tokens it spans. Shift
    /// operators are composed from adjacent `>` tokens.
    fn infix_op(&self) -> Option<(Infix, usize)> {
        use SyntaxKind as K;
        let op = match self.current() {
            K::Star => Infix::Binary(BinaryOp::Mul),
            K::Slash => Infix::Binary(BinaryOp::Div),
            K::Percent => Infix::Binary(BinaryOp::Rem),
            K::Plus => Infix::Binary(BinaryOp::Add),
            K::Minus => Infix::Binary(BinaryOp::Sub),
            K::LeftShift => Infix::Binary(BinaryOp::Shl),
            K::Less => Infix::Binary(BinaryOp::Less),
            K::LessEq => Infix::Binary(BinaryOp::LessEq),
            K::GreaterEq => Infix::Binary(BinaryOp::GreaterEq),
            K::Greater => return Some(self.greater_op()),
            K::InstanceofKw => Infix::InstanceOf,
            K::EqEq => Infix::Binary(BinaryOp::Eq),
            K::BangEq => Infix::Binary(BinaryOp::NotEq),
            K::Amp => Infix::Binary(BinaryOp::And),
            K::Caret => Infix::Binary(BinaryOp::Xor),
            K::Pipe => Infix::Binary(BinaryOp::Or),
            K::AmpAmp => Infix::Binary(BinaryOp::AndAnd),
            K::PipePipe => Infix::Binary(BinaryOp::OrOr),
            K::Question => Infix::Conditional,
            K::Eq => Infix::Assign(AssignOp::Assign),
            K::PlusEq => Infix::Assign(AssignOp::Add),
            K::MinusEq => Infix::Assign(AssignOp::Sub),
            K::StarEq => Infix::Assign(AssignOp::Mul),
            K::SlashEq => Infix::Assign(AssignOp::Div),
            K::PercentEq => Infix::Assign(AssignOp::Rem),
            K::AmpEq => Infix::Assign(AssignOp::And),
            K::PipeEq => Infix::Assign(AssignOp::Or),
            K::CaretEq => Infix::Assign(AssignOp::Xor),
            K::LeftShiftEq => Infix::Assign(AssignOp::Shl),
            _ => return None,
        };
        Some((op, 1))
    }

    fn greater_op(&self) -> (Infix, usize) {
        if self.adjacent(0, 1) {
            let third_adjacent = self.adjacent(1, 2);
            match (self.nth(1), self.nth(2)) {
                (SyntaxKind::Greater, SyntaxKind::Greater) if third_adjacent => {
                    return (Infix::Binary(BinaryOp::UShr), 3)
                }
                (SyntaxKind::Greater, SyntaxKind::GreaterEq) if third_adjacent => {
                    return (Infix::Assign(AssignOp::UShr), 3)
                }
                (SyntaxKind::Greater, _) => return (Infix::Binary(BinaryOp::Shr), 2),
                (SyntaxKind::GreaterEq, _) => return (Infix::Assign(AssignOp::Shr), 2),
                _ => {}
            }
        }
        (Infix::Binary(BinaryOp::Greater), 1)
    }

    fn parse_unary(&mut self) -> Expr {
        let start = self.start();
        let op = match self.current() {
            SyntaxKind::Plus => Some(UnaryOp::Plus),
            SyntaxKind::Minus => Some(UnaryOp::Minus),
            SyntaxKind::Bang => Some(UnaryOp::Not),
            SyntaxKind::Tilde => Some(UnaryOp::BitNot),
            SyntaxKind::PlusPlus => Some(UnaryOp::PreInc),
            SyntaxKind::MinusMinus => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary_operand();
            return Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                self.range_from(start),
            );
        }
        if self.at_lambda_start() {
            return self.parse_lambda();
        }
        if self.at_cast() {
            self.bump();
            let ty = self.parse_type(Position::Type);
            while self.eat(SyntaxKind::Amp) {
                self.muted(|p| p.parse_type(Position::Type));
            }
            self.expect(SyntaxKind::RParen, "expected `)` after the cast type");
            let operand = self.parse_unary_operand();
            return Expr::new(
                ExprKind::Cast {
                    ty,
                    expr: Box::new(operand),
                },
                self.range_from(start),
            );
        }
        let primary = self.parse_primary();
        self.parse_postfix(primary, start)
    }

    fn parse_unary_operand(&mut self) -> Expr {
        if !self.enter() {
            self.leave();
            let range = self.token().range;
            self.discard_one();
            return Expr::missing(range);
        }
        let saved_peak = self.start_height();
        let operand = self.parse_unary();
        let height = self.height();
        self.finish_height(saved_peak, height);
        self.leave();
        operand
    }

    fn parse_primary(&mut self) -> Expr {
        let start = self.start();
        let kind = match self.current() {
            kind if kind.is_literal() => {
                let tok = self.bump();
                ExprKind::Literal(Ident::new(self.text(tok)))
            }
            kind if kind.is_identifier_like() => return self.parse_name_chain(),
            SyntaxKind::ThisKw | SyntaxKind::SuperKw => {
                let tok = self.bump();
                if self.at(SyntaxKind::LParen) {
                    ExprKind::Call {
                        receiver: None,
                        type_args: Vec::new(),
                        name: Ident::new(self.text(tok)),
                        args: self.parse_arguments(),
                    }
                } else if tok.kind == SyntaxKind::ThisKw {
                    ExprKind::This { qualifier: None }
                } else {
                    ExprKind::Super { qualifier: None }
                }
            }
            SyntaxKind::NewKw => return self.parse_new(None, start),
            SyntaxKind::LParen => {
                self.bump();
                let inner = self.parse_expression();
                self.expect(SyntaxKind::RParen, "expected `)`");
                ExprKind::Paren(Box::new(inner))
            }
            SyntaxKind::LBrace => return self.parse_array_init(),
            SyntaxKind::SwitchKw => self.parse_switch_expression(),
            kind if kind.is_primitive_type() || kind == SyntaxKind::VoidKw => {
                let ty = self.parse_type(Position::Type);
                if self.at(SyntaxKind::Dot) && self.nth(1) == SyntaxKind::ClassKw {
                    self.bump();
                    self.bump();
                    ExprKind::ClassLit(ty)
                } else {
                    ExprKind::TypeExpr(ty)
                }
            }
            _ => {
                self.error_here("expected an expression");
                return Expr::missing(TextRange::empty(start));
            }
        };
        Expr::new(kind, self.range_from(start))
    }

    /// `a.b.c`; stops before `.class`, `.this`, `.new` and `.<T>`.
    fn parse_name_chain(&mut self) -> Expr {
        let start = self.start();
        let mut segments: Vec<Ident> = Vec::new();
        loop {
            if self.at_focus() {
                return self.name_marker(start, segments);
            }
            segments.push(self.ident());
            if self.at(SyntaxKind::Dot) && self.nth(1).is_identifier_like() {
                self.bump();
                continue;
            }
            break;
        }
        Expr::new(ExprKind::Name(segments), self.range_from(start))
    }

    /// The focus token as the last segment of a name chain.
    fn name_marker(&mut self, start: usize, qualifier: Vec<Ident>) -> Expr {
        let tok = self.bump();
        let text = self.text(tok);
        let selection = self.marker.assist() == AssistKind::Selection;

        if selection && self.at(SyntaxKind::LParen) {
            let receiver_range = TextRange::new(start, tok.range.start as usize);
            let receiver = (!qualifier.is_empty())
                .then(|| Box::new(Expr::new(ExprKind::Name(qualifier.clone()), receiver_range)));
            let args = self.parse_arguments();
            let payload = MarkerPayload::Call {
                receiver: receiver.clone(),
                name: Ident::new(text),
                args: args.clone(),
            };
            let range = self.range_from(start);
            return match self.marker.place(Position::MessageSend, payload, text, range, tok.range, &self.scopes) {
                Some(marker) => Expr::new(ExprKind::Marker(marker), range),
                None => Expr::new(
                    ExprKind::Call {
                        receiver,
                        type_args: Vec::new(),
                        name: Ident::new(text),
                        args,
                    },
                    range,
                ),
            };
        }

        let range = self.range_from(start);
        let replaced = if selection { tok.range } else { range };
        let payload = MarkerPayload::Name {
            qualifier: qualifier.clone(),
        };
        match self.marker.place(Position::Name, payload, text, range, replaced, &self.scopes) {
            Some(marker) => Expr::new(ExprKind::Marker(marker), range),
            None => {
                let mut segments = qualifier;
                segments.push(Ident::new(text));
                Expr::new(ExprKind::Name(segments), range)
            }
        }
    }

    /// The focus token after `.` on a receiver that is not a plain name.
    fn member_marker(&mut self, receiver: Expr, start: usize) -> Expr {
        let tok = self.bump();
        let text = self.text(tok);
        let placed = if self.marker.assist() == AssistKind::Selection && self.at(SyntaxKind::LParen) {
            let args = self.parse_arguments();
            let payload = MarkerPayload::Call {
                receiver: Some(Box::new(receiver.clone())),
                name: Ident::new(text),
                args,
            };
            let range = self.range_from(start);
            self.marker.place(Position::MessageSend, payload, text, range, tok.range, &self.scopes)
        } else {
            let payload = MarkerPayload::Receiver(Box::new(receiver.clone()));
            let range = self.range_from(start);
            // Completion replaces the whole chain, selection the member name.
            let replaced = match self.marker.assist() {
                AssistKind::Completion => range,
                AssistKind::Selection => tok.range,
            };
            self.marker.place(Position::MemberAccess, payload, text, range, replaced, &self.scopes)
        };
        let kind = match placed {
            Some(marker) => ExprKind::Marker(marker),
            None => ExprKind::FieldAccess {
                receiver: Box::new(receiver),
                name: Ident::new(text),
            },
        };
        Expr::new(kind, self.range_from(start))
    }

    /// Completion on an empty argument slot of a call or allocation: the empty
    /// focus token sits right behind `(` or `,`.
    fn at_empty_argument_focus(&self) -> bool {
        self.marker.assist() == AssistKind::Completion
            && self.at_focus()
            && self.token().range.is_empty()
    }

    fn at_postfix_start(&self) -> bool {
        matches!(
            self.current(),
            SyntaxKind::Dot
                | SyntaxKind::LParen
                | SyntaxKind::LBracket
                | SyntaxKind::PlusPlus
                | SyntaxKind::MinusMinus
                | SyntaxKind::DoubleColon
        )
    }

    fn parse_postfix(&mut self, mut expr: Expr, start: usize) -> Expr {
        let mut height = self.height();
        let mut first = true;
        loop {
            // Every pass that did not break wrapped `expr` in one more node.
            if !first {
                height = (height + 1).max(self.height());
            }
            first = false;
            if !self.at_postfix_start() || !self.can_wrap(height) {
                break;
            }
            self.peak = self.depth;
            let kind = match self.current() {
                SyntaxKind::Dot => match self.nth(1) {
                    SyntaxKind::NewKw => {
                        self.bump();
                        expr = self.parse_new(Some(expr), start);
                        continue;
                    }
                    SyntaxKind::ThisKw | SyntaxKind::SuperKw => {
                        self.bump();
                        let tok = self.bump();
                        let qualifier = match &expr.kind {
                            ExprKind::Name(segments) => Some(segments.clone()),
                            _ => None,
                        };
                        if tok.kind == SyntaxKind::ThisKw {
                            ExprKind::This { qualifier }
                        } else {
                            ExprKind::Super { qualifier }
                        }
                    }
                    SyntaxKind::ClassKw => {
                        self.bump();
                        self.bump();
                        ExprKind::ClassLit(expr_as_type(expr))
                    }
                    SyntaxKind::Less => {
                        self.bump();
                        let type_args = self.parse_type_args();
                        let Some(name) = self.expect_ident("expected a method name") else {
                            break;
                        };
                        let args = if self.at(SyntaxKind::LParen) {
                            self.parse_arguments()
                        } else {
                            self.expect(SyntaxKind::LParen, "expected `(` after a generic method name");
                            Vec::new()
                        };
                        ExprKind::Call {
                            receiver: Some(Box::new(expr)),
                            type_args,
                            name,
                            args,
                        }
                    }
                    _ => {
                        self.bump();
                        if self.at_focus() {
                            expr = self.member_marker(expr, start);
                            continue;
                        }
                        if !self.at_ident() {
                            self.error_here("expected a member name after `.`");
                            break;
                        }
                        ExprKind::FieldAccess {
                            receiver: Box::new(expr),
                            name: self.ident(),
                        }
                    }
                },
                SyntaxKind::LParen => {
                    let range = expr.range;
                    let (receiver, name) = match expr.kind {
                        ExprKind::Name(mut segments) if !segments.is_empty() => {
                            let name = segments.pop().unwrap_or_default();
                            let receiver = (!segments.is_empty())
                                .then(|| Box::new(Expr::new(ExprKind::Name(segments), range)));
                            (receiver, name)
                        }
                        ExprKind::FieldAccess { receiver, name } => (Some(receiver), name),
                        kind => {
                            expr = Expr::new(kind, range);
                            break;
                        }
                    };
                    let (args, focus) = self.parse_arguments_to_focus();
                    if let Some(tok) = focus {
                        let payload = MarkerPayload::Call {
                            receiver: receiver.clone(),
                            name: name.clone(),
                            args: args.clone(),
                        };
                        let range = self.range_from(start);
                        let caret = TextRange::empty(tok.range.start as usize);
                        expr = match self.marker.place(Position::MessageSend, payload, "", range, caret, &self.scopes) {
                            Some(marker) => Expr::new(ExprKind::Marker(marker), range),
                            None => Expr::new(
                                ExprKind::Call {
                                    receiver,
                                    type_args: Vec::new(),
                                    name,
                                    args,
                                },
                                range,
                            ),
                        };
                        continue;
                    }
                    ExprKind::Call {
                        receiver,
                        type_args: Vec::new(),
                        name,
                        args,
                    }
                }
                SyntaxKind::LBracket if self.nth(1) == SyntaxKind::RBracket => {
                    let ty = self.parse_array_dims(expr_as_type(expr), start);
                    ExprKind::TypeExpr(ty)
                }
                SyntaxKind::LBracket => {
                    self.bump();
                    let index = self.parse_expression();
                    self.expect(SyntaxKind::RBracket, "expected `]`");
                    ExprKind::ArrayAccess {
                        array: Box::new(expr),
                        index: Box::new(index),
                    }
                }
                SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => {
                    let op = if self.bump().kind == SyntaxKind::PlusPlus {
                        PostfixOp::Inc
                    } else {
                        PostfixOp::Dec
                    };
                    ExprKind::Postfix {
                        op,
                        operand: Box::new(expr),
                    }
                }
                SyntaxKind::DoubleColon => {
                    self.bump();
                    if self.at_focus() {
                        let tok = self.bump();
                        let text = self.text(tok);
                        let range = self.range_from(start);
                        let replaced = match self.marker.assist() {
                            AssistKind::Completion => range,
                            AssistKind::Selection => tok.range,
                        };
                        let payload = MarkerPayload::Receiver(Box::new(expr.clone()));
                        expr = match self.marker.place(
                            Position::ReferenceExpression,
                            payload,
                            text,
                            range,
                            replaced,
                            &self.scopes,
                        ) {
                            Some(marker) => Expr::new(ExprKind::Marker(marker), range),
                            None => Expr::new(
                                ExprKind::MethodRef {
                                    receiver: Box::new(expr),
                                    name: Ident::new(text),
                                },
                                range,
                            ),
                        };
                        continue;
                    }
                    let name = if self.eat(SyntaxKind::NewKw) {
                        Ident::new("new")
                    } else if self.at_ident() {
                        self.ident()
                    } else {
                        self.error_here("expected a method name after `::`");
                        break;
                    };
                    ExprKind::MethodRef {
                        receiver: Box::new(expr),
                        name,
                    }
                }
                _ => break,
            };
            expr = Expr::new(kind, self.range_from(start));
        }
        self.peak = self.depth + height;
        expr
    }

    /// `( args )` at the current `(`.
    pub(super) fn parse_arguments(&mut self) -> Vec<Expr> {
        self.bump();
        let mut args = Vec::new();
        self.parse_argument_list(&mut args, false);
        args
    }

    /// Like [`Parser::parse_arguments`], but an empty argument slot holding the
    /// focus ends the list. The focus token is returned along with the
    /// arguments before it.
    fn parse_arguments_to_focus(&mut self) -> (Vec<Expr>, Option<Token>) {
        self.bump();
        let mut args = Vec::new();
        let focus = self.parse_argument_list(&mut args, true);
        (args, focus)
    }

    fn parse_argument_list(&mut self, args: &mut Vec<Expr>, stop_at_focus: bool) -> Option<Token> {
        while !self.at(SyntaxKind::RParen) && !self.at_eof() {
            if stop_at_focus && self.at_empty_argument_focus() {
                let tok = self.bump();
                self.expect(SyntaxKind::RParen, "expected `)` to close the argument list");
                return Some(tok);
            }
            let before = self.pos;
            let arg = self.parse_expression();
            if self.pos == before {
                break;
            }
            args.push(arg);
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, "expected `)` to close the argument list");
        None
    }

    fn parse_array_init(&mut self) -> Expr {
        let start = self.start();
        let items = self.parse_array_init_items();
        Expr::new(ExprKind::ArrayInit(items), self.range_from(start))
    }

    fn parse_array_init_items(&mut self) -> Vec<Expr> {
        ensure_stack(|| {
            let items = if self.enter() {
                self.parse_array_init_items_guarded()
            } else {
                self.discard_one();
                Vec::new()
            };
            self.leave();
            items
        })
    }

    fn parse_array_init_items_guarded(&mut self) -> Vec<Expr> {
        self.bump();
        let mut items = Vec::new();
        while !self.at(SyntaxKind::RBrace) && !self.at_eof() {
            let before = self.pos;
            let item = self.parse_var_init();
            if self.pos == before {
                break;
            }
            items.push(item);
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::RBrace, "expected `}` to close the array initializer");
        items
    }

    /// The focus token among the top-level segments of the type following `new`,
    /// when selecting.
    fn focus_in_allocated_type(&self) -> Option<Token> {
        if self.marker.assist() != AssistKind::Selection {
            return None;
        }
        let mut depth = 0usize;
        let mut i = 0;
        loop {
            match self.nth(i) {
                SyntaxKind::Less => depth += 1,
                SyntaxKind::Greater => depth = depth.saturating_sub(1),
                SyntaxKind::Dot | SyntaxKind::Comma | SyntaxKind::Question => {}
                kind if kind.is_identifier_like() => {
                    if depth == 0 && self.nth_is_focus(i) {
                        return Some(self.nth_token(i));
                    }
                }
                _ => return None,
            }
            i += 1;
        }
    }

    /// `new T(args) [body]`, `new T[n]...` or `new T[]{...}`, optionally
    /// qualified by `outer.`.
    fn parse_new(&mut self, outer: Option<Expr>, start: usize) -> Expr {
        let position = if self.throw_new == Some(self.pos) {
            Position::Exception
        } else {
            Position::Type
        };
        self.bump();
        if self.at(SyntaxKind::Less) {
            self.muted(Self::parse_type_args);
        }

        let selected = self.focus_in_allocated_type();
        let ty = if selected.is_some() {
            self.muted(|p| p.parse_type(position))
        } else {
            self.parse_type(position)
        };

        let is_array_type = matches!(ty, TypeRef::Array { .. });
        if self.at(SyntaxKind::LBracket) || (is_array_type && self.at(SyntaxKind::LBrace)) {
            return self.parse_new_array(ty, start);
        }

        let args = if self.at(SyntaxKind::LParen) {
            let (args, focus) = self.parse_arguments_to_focus();
            if let Some(tok) = focus {
                let payload = MarkerPayload::Allocation {
                    ty: Box::new(ty.clone()),
                    args: args.clone(),
                };
                let range = self.range_from(start);
                let caret = TextRange::empty(tok.range.start as usize);
                if let Some(marker) = self.marker.place(Position::Allocation, payload, "", range, caret, &self.scopes) {
                    return Expr::new(ExprKind::Marker(marker), range);
                }
            }
            args
        } else {
            if !matches!(ty, TypeRef::Marker(_)) {
                self.expect(SyntaxKind::LParen, "expected `(` after the allocated type");
            }
            Vec::new()
        };

        if let Some(tok) = selected {
            let payload = MarkerPayload::Allocation {
                ty: Box::new(ty.clone()),
                args: args.clone(),
            };
            let text = self.text(tok);
            let range = self.range_from(start);
            if let Some(marker) = self.marker.place(Position::Allocation, payload, text, range, tok.range, &self.scopes) {
                if self.at(SyntaxKind::LBrace) {
                    self.parse_class_body(DeclKind::Class, "");
                }
                return Expr::new(ExprKind::Marker(marker), self.range_from(start));
            }
        }

        let body = if self.at(SyntaxKind::LBrace) {
            Some(self.parse_class_body(DeclKind::Class, ""))
        } else {
            None
        };
        Expr::new(
            ExprKind::New {
                outer: outer.map(Box::new),
                ty,
                args,
                body,
            },
            self.range_from(start),
        )
    }

    fn parse_new_array(&mut self, ty: TypeRef, start: usize) -> Expr {
        let (elem, mut dims) = match ty {
            TypeRef::Array { elem, dims, .. } => (*elem, vec![None; dims as usize]),
            other => (other, Vec::new()),
        };
        while self.at(SyntaxKind::LBracket) {
            self.bump();
            if self.eat(SyntaxKind::RBracket) {
                dims.push(None);
                continue;
            }
            dims.push(Some(self.parse_expression()));
            self.expect(SyntaxKind::RBracket, "expected `]`");
        }
        let init = if self.at(SyntaxKind::LBrace) {
            Some(self.parse_array_init_items())
        } else {
            None
        };
        Expr::new(ExprKind::NewArray { elem, dims, init }, self.range_from(start))
    }

    fn parse_lambda(&mut self) -> Expr {
        let start = self.start();
        self.scopes.push(ScopeKind::Lambda);
        let mut params = Vec::new();
        if self.at_ident() {
            let name = self.ident();
            self.scopes.declare(&name, None, LocalOrigin::LambdaParameter);
            params.push(LambdaParam { ty: None, name });
        } else {
            self.bump();
            while !self.at(SyntaxKind::RParen) && !self.at_eof() {
                let before = self.pos;
                let param = if self.at_ident()
                    && matches!(self.nth(1), SyntaxKind::Comma | SyntaxKind::RParen)
                {
                    LambdaParam {
                        ty: None,
                        name: self.ident(),
                    }
                } else {
                    self.muted(Self::parse_modifiers);
                    let ty = self.parse_type(Position::Type);
                    self.eat(SyntaxKind::Ellipsis);
                    let name = if self.at_ident() {
                        self.ident()
                    } else {
                        self.error_here("expected a lambda parameter name");
                        Ident::default()
                    };
                    LambdaParam { ty: Some(ty), name }
                };
                let printed = param.ty.as_ref().map(print_type);
                self.scopes.declare(&param.name, printed, LocalOrigin::LambdaParameter);
                params.push(param);
                if self.pos == before || !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(SyntaxKind::RParen, "expected `)` after lambda parameters");
        }
        self.expect(SyntaxKind::Arrow, "expected `->`");
        let body = if self.at(SyntaxKind::LBrace) {
            LambdaBody::Block(self.parse_block(None))
        } else {
            LambdaBody::Expr(Box::new(self.parse_expression()))
        };
        self.scopes.pop(ScopeKind::Lambda);
        Expr::new(ExprKind::Lambda { params, body }, self.range_from(start))
    }
}

/// Reinterpret a name expression as the type it spells (`a.B.class`, `B[]::new`).
fn expr_as_type(expr: Expr) -> TypeRef {
    match expr.kind {
        ExprKind::Name(segments) => TypeRef::Named {
            segments: segments
                .into_iter()
                .map(|name| TypeSegment { name, args: None })
                .collect(),
            range: expr.range,
        },
        ExprKind::TypeExpr(ty) => ty,
        _ => TypeRef::Missing,
    }
}
