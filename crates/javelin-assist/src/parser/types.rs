use javelin_syntax::ast::{
    Ident, MarkerPayload, TypeParam, TypeRef, TypeSegment, WildcardBoundKind,
};
use javelin_syntax::{ensure_stack, SyntaxKind};

use super::Parser;
use crate::marker::{AssistKind, Position};

impl<'a> Parser<'a> {
    /// Parse a type. A focus token inside it becomes a marker of `position`'s kind.
    pub(super) fn parse_type(&mut self, position: Position) -> TypeRef {
        let start = self.start();
        while self.at(SyntaxKind::At) && self.nth(1) != SyntaxKind::InterfaceKw {
            // Type annotations are not kept.
            self.muted(Self::parse_annotation);
        }

        let ty = if self.current().is_primitive_type() || self.at(SyntaxKind::VoidKw) {
            let tok = self.bump();
            TypeRef::Primitive {
                name: Ident::new(self.text(tok)),
                range: tok.range,
            }
        } else if self.at_ident() {
            self.parse_class_type(position)
        } else {
            self.error_here("expected a type");
            return TypeRef::Missing;
        };

        if matches!(ty, TypeRef::Marker(_)) && self.marker.assist() == AssistKind::Completion {
            return ty;
        }
        self.parse_array_dims(ty, start)
    }

    /// Wrap `ty` in an array type for each `[]` pair that follows.
    pub(super) fn parse_array_dims(&mut self, ty: TypeRef, start: usize) -> TypeRef {
        let mut dims = 0;
        while self.at(SyntaxKind::LBracket) && self.nth(1) == SyntaxKind::RBracket {
            self.bump();
            self.bump();
            dims += 1;
        }
        if dims == 0 {
            return ty;
        }
        TypeRef::Array {
            elem: Box::new(ty),
            dims,
            range: self.range_from(start),
        }
    }

    fn parse_class_type(&mut self, position: Position) -> TypeRef {
        let start = self.start();
        let mut segments: Vec<TypeSegment> = Vec::new();
        loop {
            let focused = self.at_focus();
            let tok = self.bump();
            let name = Ident::new(self.text(tok));

            if focused && self.marker.assist() == AssistKind::Completion {
                let qualifier = segments.iter().map(|seg| seg.name.clone()).collect();
                let range = self.range_from(start);
                if let Some(marker) = self.marker.place(
                    position,
                    MarkerPayload::Name { qualifier },
                    &name,
                    range,
                    range,
                    &self.scopes,
                ) {
                    return TypeRef::Marker(marker);
                }
            }

            let args = if self.at(SyntaxKind::Less) {
                Some(self.parse_type_args())
            } else {
                None
            };
            segments.push(TypeSegment { name, args });

            if focused {
                let selected = TypeRef::Named {
                    segments: segments.clone(),
                    range: self.range_from(start),
                };
                let range = self.range_from(start);
                let text = self.text(tok);
                if let Some(marker) = self.marker.place(
                    position,
                    MarkerPayload::Type(Box::new(selected)),
                    text,
                    range,
                    tok.range,
                    &self.scopes,
                ) {
                    // Trailing segments belong to the selected type's members.
                    while self.at(SyntaxKind::Dot) && self.nth(1).is_identifier_like() {
                        self.bump();
                        self.bump();
                        if self.at(SyntaxKind::Less) {
                            self.parse_type_args();
                        }
                    }
                    return TypeRef::Marker(marker);
                }
            }

            if self.at(SyntaxKind::Dot) && self.nth(1).is_identifier_like() {
                self.bump();
                continue;
            }
            break;
        }
        TypeRef::Named {
            segments,
            range: self.range_from(start),
        }
    }

    /// `<...>` after a type name. An empty list is the diamond.
    pub(super) fn parse_type_args(&mut self) -> Vec<TypeRef> {
        ensure_stack(|| {
            let args = if self.enter() {
                self.parse_type_args_guarded()
            } else {
                self.discard_one();
                Vec::new()
            };
            self.leave();
            args
        })
    }

    fn parse_type_args_guarded(&mut self) -> Vec<TypeRef> {
        self.bump();
        let mut args = Vec::new();
        if self.eat(SyntaxKind::Greater) {
            return args;
        }
        loop {
            let before = self.pos;
            if self.at(SyntaxKind::Question) {
                args.push(self.parse_wildcard());
            } else {
                args.push(self.parse_type(Position::Type));
            }
            if self.pos == before || !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::Greater, "expected `>` to close type arguments");
        args
    }

    fn parse_wildcard(&mut self) -> TypeRef {
        let start = self.start();
        self.bump();
        let kind = if self.eat(SyntaxKind::ExtendsKw) {
            Some(WildcardBoundKind::Extends)
        } else if self.eat(SyntaxKind::SuperKw) {
            Some(WildcardBoundKind::Super)
        } else {
            None
        };
        let bound = kind.map(|kind| (kind, Box::new(self.parse_type(Position::Type))));
        TypeRef::Wildcard {
            bound,
            range: self.range_from(start),
        }
    }

    /// `<T extends A & B, U>` on a declaration.
    pub(super) fn parse_type_params(&mut self) -> Vec<TypeParam> {
        self.bump();
        let mut params = Vec::new();
        loop {
            while self.at(SyntaxKind::At) {
                self.muted(Self::parse_annotation);
            }
            let Some(name) = self.expect_ident("expected type parameter name") else {
                break;
            };
            let mut bounds = Vec::new();
            if self.eat(SyntaxKind::ExtendsKw) {
                loop {
                    bounds.push(self.parse_type(Position::Type));
                    if !self.eat(SyntaxKind::Amp) {
                        break;
                    }
                }
            }
            params.push(TypeParam { name, bounds });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::Greater, "expected `>` to close type parameters");
        params
    }

    // --- Lookahead ---

    /// Index just past a type starting at lookahead `i`, or `None` if the tokens
    /// there do not form a type.
    pub(super) fn skip_type(&self, mut i: usize) -> Option<usize> {
        let first = self.nth(i);
        if first.is_primitive_type() || first == SyntaxKind::VoidKw {
            i += 1;
        } else if first.is_identifier_like() {
            i += 1;
            loop {
                if self.nth(i) == SyntaxKind::Less {
                    i = self.skip_type_args(i)?;
                }
                if self.nth(i) == SyntaxKind::Dot && self.nth(i + 1).is_identifier_like() {
                    i += 2;
                    continue;
                }
                break;
            }
        } else {
            return None;
        }
        while self.nth(i) == SyntaxKind::LBracket && self.nth(i + 1) == SyntaxKind::RBracket {
            i += 2;
        }
        Some(i)
    }

    fn skip_type_args(&self, mut i: usize) -> Option<usize> {
        let mut depth = 0usize;
        loop {
            match self.nth(i) {
                SyntaxKind::Less => depth += 1,
                SyntaxKind::Greater => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                SyntaxKind::Comma
                | SyntaxKind::Dot
                | SyntaxKind::Question
                | SyntaxKind::Amp
                | SyntaxKind::LBracket
                | SyntaxKind::RBracket
                | SyntaxKind::ExtendsKw
                | SyntaxKind::SuperKw => {}
                kind if kind.is_identifier_like() || kind.is_primitive_type() => {}
                _ => return None,
            }
            i += 1;
        }
    }

    /// Index just past an annotation starting at lookahead `i` (on the `@`).
    fn skip_annotation(&self, mut i: usize) -> usize {
        i += 1;
        if self.nth(i).is_identifier_like() {
            i += 1;
        }
        while self.nth(i) == SyntaxKind::Dot && self.nth(i + 1).is_identifier_like() {
            i += 2;
        }
        if self.nth(i) == SyntaxKind::LParen {
            if let Some(close) = self.skip_parens(i) {
                return close;
            }
        }
        i
    }

    /// Index just past the `)` matching the `(` at lookahead `i`.
    fn skip_parens(&self, mut i: usize) -> Option<usize> {
        let mut depth = 0usize;
        loop {
            match self.nth(i) {
                SyntaxKind::LParen => depth += 1,
                SyntaxKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                SyntaxKind::Eof => return None,
                _ => {}
            }
            i += 1;
        }
    }

    /// Index past leading `final` and annotations, and whether any were seen.
    fn skip_local_modifiers(&self) -> (usize, bool) {
        let mut i = 0;
        let mut seen = false;
        loop {
            match self.nth(i) {
                SyntaxKind::FinalKw => i += 1,
                SyntaxKind::At if self.nth(i + 1) != SyntaxKind::InterfaceKw => {
                    i = self.skip_annotation(i);
                }
                _ => return (i, seen),
            }
            seen = true;
        }
    }

    pub(super) fn at_local_var_decl_start(&self) -> bool {
        let (i, had_modifiers) = self.skip_local_modifiers();
        if had_modifiers {
            return !self.at_local_type_start();
        }
        if self.nth(i) == SyntaxKind::VarKw && self.nth(i + 1).is_identifier_like() {
            return true;
        }
        match self.skip_type(i) {
            Some(after) => self.nth(after).is_identifier_like(),
            None => false,
        }
    }

    pub(super) fn at_local_type_start(&self) -> bool {
        let mut i = 0;
        loop {
            match self.nth(i) {
                SyntaxKind::FinalKw | SyntaxKind::AbstractKw | SyntaxKind::StrictfpKw => i += 1,
                SyntaxKind::At if self.nth(i + 1) != SyntaxKind::InterfaceKw => {
                    i = self.skip_annotation(i);
                }
                _ => break,
            }
        }
        match self.nth(i) {
            SyntaxKind::ClassKw | SyntaxKind::InterfaceKw | SyntaxKind::EnumKw => true,
            SyntaxKind::RecordKw => {
                self.nth(i + 1).is_identifier_like()
                    && matches!(self.nth(i + 2), SyntaxKind::LParen | SyntaxKind::Less)
            }
            _ => false,
        }
    }

    /// `x ->` or `( ... ) ->` at the current position.
    pub(super) fn at_lambda_start(&self) -> bool {
        if self.in_case_label {
            return false;
        }
        if self.at_ident() {
            return self.nth(1) == SyntaxKind::Arrow;
        }
        if !self.at(SyntaxKind::LParen) {
            return false;
        }
        match self.skip_parens(0) {
            Some(after) => self.nth(after) == SyntaxKind::Arrow,
            None => false,
        }
    }

    /// `(Type) operand` at the current `(`.
    pub(super) fn at_cast(&self) -> bool {
        if !self.at(SyntaxKind::LParen) {
            return false;
        }
        let primitive = self.nth(1).is_primitive_type();
        let Some(mut after) = self.skip_type(1) else {
            return false;
        };
        while self.nth(after) == SyntaxKind::Amp {
            match self.skip_type(after + 1) {
                Some(next) => after = next,
                None => return false,
            }
        }
        if self.nth(after) != SyntaxKind::RParen {
            return false;
        }
        if primitive {
            return true;
        }
        let operand = self.nth(after + 1);
        operand.is_identifier_like()
            || operand.is_literal()
            || matches!(
                operand,
                SyntaxKind::LParen
                    | SyntaxKind::ThisKw
                    | SyntaxKind::SuperKw
                    | SyntaxKind::NewKw
                    | SyntaxKind::Bang
                    | SyntaxKind::Tilde
                    | SyntaxKind::SwitchKw
            )
    }
}
