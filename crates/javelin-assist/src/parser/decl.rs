use javelin_syntax::ast::{
    Annotation, Block, CompilationUnit, DeclKind, DeclName, EnumConstant, FieldDecl, Ident,
    ImportDecl, Initializer, MarkerPayload, Member, MethodDecl, MethodKind, Modifier, Modifiers,
    NameOrMarker, PackageDecl, Param, QualifiedName, TypeDecl, TypeParam, TypeRef,
};
use javelin_syntax::{ensure_stack, print_type, SyntaxKind, TextRange};

use super::Parser;
use crate::builder;
use crate::marker::Position;
use crate::recovery::Expected;
use crate::scope::{LocalOrigin, ScopeKind};

/// Result of one top-level declaration attempt.
enum TopLevel {
    Type(TypeDecl),
    /// A keyword fragment typed where the declaration keyword belongs.
    KeywordImport(ImportDecl),
    Nothing,
}

impl<'a> Parser<'a> {
    pub(super) fn parse_compilation_unit(&mut self) -> CompilationUnit {
        let mut unit = CompilationUnit::default();
        if self.at(SyntaxKind::PackageKw) {
            unit.package = Some(self.parse_package());
        }

        while !self.at_eof() {
            if self.at(SyntaxKind::ImportKw) {
                unit.imports.push(self.parse_import());
                continue;
            }
            if self.eat(SyntaxKind::Semicolon) {
                continue;
            }

            let before = self.pos;
            let fragment_allowed = unit.types.is_empty();
            match self.parse_top_level(fragment_allowed) {
                TopLevel::Type(decl) => unit.types.push(decl),
                TopLevel::KeywordImport(import) => unit.imports.push(import),
                TopLevel::Nothing => {}
            }
            if self.pos == before {
                self.discard_one();
            }
        }

        unit.range = TextRange::new(0, self.source.len());
        unit
    }

    fn parse_package(&mut self) -> PackageDecl {
        let start = self.start();
        self.bump();
        let (name, _) = self.parse_name_or_marker(Position::Package, false);
        self.expect(SyntaxKind::Semicolon, "expected `;` after package declaration");
        PackageDecl {
            name,
            range: self.range_from(start),
        }
    }

    fn parse_import(&mut self) -> ImportDecl {
        let start = self.start();
        self.bump();
        let is_static = self.eat(SyntaxKind::StaticKw);
        let (name, on_demand) = self.parse_name_or_marker(Position::Import, true);
        self.expect(SyntaxKind::Semicolon, "expected `;` after import");
        ImportDecl {
            is_static,
            name,
            on_demand,
            range: self.range_from(start),
        }
    }

    /// A dotted name in a package or import declaration.
    fn parse_name_or_marker(&mut self, position: Position, allow_star: bool) -> (NameOrMarker, bool) {
        let start = self.start();
        let mut segments: Vec<Ident> = Vec::new();
        let mut on_demand = false;
        loop {
            if self.at_focus() {
                let tok = self.bump();
                let text = self.text(tok);
                let range = self.range_from(start);
                let payload = MarkerPayload::Name {
                    qualifier: segments.clone(),
                };
                if let Some(marker) =
                    self.marker.place(position, payload, text, range, range, &self.scopes)
                {
                    return (NameOrMarker::Marker(marker), false);
                }
                segments.push(Ident::new(text));
            } else if self.at_ident() {
                segments.push(self.ident());
            } else {
                self.error_here("expected a name");
                break;
            }

            if !self.at(SyntaxKind::Dot) {
                break;
            }
            if allow_star && self.nth(1) == SyntaxKind::Star {
                self.bump();
                self.bump();
                on_demand = true;
                break;
            }
            if !self.nth(1).is_identifier_like() {
                break;
            }
            self.bump();
        }
        let name = QualifiedName {
            segments,
            range: self.range_from(start),
        };
        (NameOrMarker::Name(name), on_demand)
    }

    fn parse_top_level(&mut self, fragment_allowed: bool) -> TopLevel {
        let start = self.start();
        if self.at_focus() {
            return self.keyword_fragment(fragment_allowed);
        }
        if !self.at_type_decl_start() {
            self.recover(Expected::TypeDecl, "expected a type declaration");
            return TopLevel::Nothing;
        }
        let modifiers = self.parse_modifiers();
        if self.at_focus() {
            // Modifiers typed before an incomplete declaration keyword are dropped.
            return self.keyword_fragment(fragment_allowed);
        }
        match self.parse_type_decl(start, modifiers) {
            Some(decl) => TopLevel::Type(decl),
            None => TopLevel::Nothing,
        }
    }

    fn keyword_fragment(&mut self, fragment_allowed: bool) -> TopLevel {
        if !fragment_allowed {
            self.recover(Expected::TypeDecl, "unexpected identifier after type declaration");
            return TopLevel::Nothing;
        }
        let tok = self.bump();
        let text = self.text(tok);
        let payload = MarkerPayload::Name {
            qualifier: Vec::new(),
        };
        match self.marker.place(Position::Keyword, payload, text, tok.range, tok.range, &self.scopes) {
            Some(marker) => TopLevel::KeywordImport(builder::keyword_import(marker, &mut self.synthesized)),
            None => TopLevel::Nothing,
        }
    }

    fn at_type_decl_start(&self) -> bool {
        let kind = self.current();
        kind.is_modifier_keyword()
            || kind == SyntaxKind::At
            || self.at_decl_keyword(0)
    }

    /// `class`, `interface`, `enum`, `@interface` or `record Name` at lookahead `n`.
    fn at_decl_keyword(&self, n: usize) -> bool {
        match self.nth(n) {
            SyntaxKind::ClassKw | SyntaxKind::InterfaceKw | SyntaxKind::EnumKw => true,
            SyntaxKind::At => self.nth(n + 1) == SyntaxKind::InterfaceKw,
            SyntaxKind::RecordKw => {
                self.nth(n + 1).is_identifier_like()
                    && matches!(self.nth(n + 2), SyntaxKind::LParen | SyntaxKind::Less)
            }
            _ => false,
        }
    }

    /// Parse a class, interface, enum, record or annotation type after its
    /// modifiers. Returns `None` (after recovery) when no declaration keyword follows.
    pub(super) fn parse_type_decl(&mut self, start: usize, modifiers: Modifiers) -> Option<TypeDecl> {
        let kind = match self.current() {
            SyntaxKind::ClassKw => DeclKind::Class,
            SyntaxKind::InterfaceKw => DeclKind::Interface,
            SyntaxKind::EnumKw => DeclKind::Enum,
            SyntaxKind::RecordKw if self.at_decl_keyword(0) => DeclKind::Record,
            SyntaxKind::At if self.nth(1) == SyntaxKind::InterfaceKw => {
                self.bump();
                DeclKind::Annotation
            }
            _ => {
                self.recover(
                    Expected::TypeDecl,
                    "expected `class`, `interface`, `enum` or `record`",
                );
                return None;
            }
        };
        self.bump();

        let name = if self.at_ident() {
            self.ident()
        } else {
            self.recover(Expected::Token(SyntaxKind::Identifier), "expected a type name");
            Ident::default()
        };
        let type_params = if self.at(SyntaxKind::Less) {
            self.parse_type_params()
        } else {
            Vec::new()
        };
        let record_components = if kind == DeclKind::Record && self.at(SyntaxKind::LParen) {
            self.parse_params(None)
        } else {
            Vec::new()
        };

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        if let Some(slot) = self.header_keyword() {
            match kind {
                DeclKind::Class | DeclKind::Interface => extends.push(slot),
                _ => implements.push(slot),
            }
        }
        if self.eat(SyntaxKind::ExtendsKw) {
            self.parse_type_list(&mut extends, Position::Type);
        }
        if kind == DeclKind::Class {
            if let Some(slot) = self.header_keyword() {
                implements.push(slot);
            }
        }
        if self.eat(SyntaxKind::ImplementsKw) {
            self.parse_type_list(&mut implements, Position::Type);
        }
        let mut permits = Vec::new();
        if self.eat(SyntaxKind::PermitsKw) {
            self.parse_type_list(&mut permits, Position::Type);
        }

        let members = self.parse_class_body(kind, &name);
        let mut decl = TypeDecl {
            kind,
            modifiers,
            name,
            type_params,
            record_components,
            extends,
            implements,
            permits,
            members,
            range: self.range_from(start),
        };
        builder::complete_type(&mut decl, &mut self.synthesized);
        Some(decl)
    }

    /// A keyword fragment typed in a class header slot (`class X ext|`).
    fn header_keyword(&mut self) -> Option<TypeRef> {
        if !self.at_focus() {
            return None;
        }
        let tok = self.token();
        let text = self.text(tok);
        let payload = MarkerPayload::Name {
            qualifier: Vec::new(),
        };
        let marker = self
            .marker
            .place(Position::Keyword, payload, text, tok.range, tok.range, &self.scopes)?;
        self.bump();
        Some(TypeRef::Marker(marker))
    }

    pub(super) fn parse_type_list(&mut self, out: &mut Vec<TypeRef>, position: Position) {
        loop {
            let before = self.pos;
            out.push(self.parse_type(position));
            if self.pos == before || !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
    }

    pub(super) fn parse_modifiers(&mut self) -> Modifiers {
        let start = self.start();
        let mut modifiers = Modifiers::default();
        loop {
            let keyword = match self.current() {
                SyntaxKind::At if self.nth(1) != SyntaxKind::InterfaceKw => {
                    modifiers.annotations.push(self.parse_annotation());
                    continue;
                }
                SyntaxKind::PublicKw => Modifier::Public,
                SyntaxKind::ProtectedKw => Modifier::Protected,
                SyntaxKind::PrivateKw => Modifier::Private,
                SyntaxKind::StaticKw => Modifier::Static,
                SyntaxKind::AbstractKw => Modifier::Abstract,
                SyntaxKind::FinalKw => Modifier::Final,
                SyntaxKind::NativeKw => Modifier::Native,
                SyntaxKind::SynchronizedKw if self.nth(1) != SyntaxKind::LParen => {
                    Modifier::Synchronized
                }
                SyntaxKind::TransientKw => Modifier::Transient,
                SyntaxKind::VolatileKw => Modifier::Volatile,
                SyntaxKind::StrictfpKw => Modifier::Strictfp,
                SyntaxKind::DefaultKw => Modifier::Default,
                SyntaxKind::SealedKw | SyntaxKind::NonSealedKw
                    if self.nth(1).is_modifier_keyword() || self.at_decl_keyword(1) =>
                {
                    if self.at(SyntaxKind::SealedKw) {
                        Modifier::Sealed
                    } else {
                        Modifier::NonSealed
                    }
                }
                _ => break,
            };
            self.bump();
            modifiers.keywords.push(keyword);
        }
        modifiers.range = self.range_from(start);
        modifiers
    }

    pub(super) fn parse_annotation(&mut self) -> Annotation {
        let start = self.start();
        self.bump();
        if self.at_focus() {
            tracing::trace!(target: "javelin.marker", "no completion for annotation names");
        }
        let name = self.plain_qualified_name();
        let args = if self.at(SyntaxKind::LParen) {
            Some(self.parse_arguments())
        } else {
            None
        };
        Annotation {
            name,
            args,
            range: self.range_from(start),
        }
    }

    // --- Class bodies ---

    pub(super) fn parse_class_body(&mut self, kind: DeclKind, name: &str) -> Vec<Member> {
        ensure_stack(|| {
            let members = if self.enter() {
                self.parse_class_body_guarded(kind, name)
            } else {
                self.discard_one();
                Vec::new()
            };
            self.leave();
            members
        })
    }

    fn parse_class_body_guarded(&mut self, kind: DeclKind, name: &str) -> Vec<Member> {
        let mut members = Vec::new();
        if !self.expect(SyntaxKind::LBrace, "expected `{` to open the type body") && self.at_eof() {
            return members;
        }
        self.scopes.push(ScopeKind::Type);
        if kind == DeclKind::Enum {
            self.parse_enum_constants(&mut members);
        }
        while !self.at(SyntaxKind::RBrace) && !self.at_eof() {
            self.promoting = false;
            let before = self.pos;
            self.parse_member(kind, name, &mut members);
            if self.pos == before {
                self.recover(Expected::Member, "expected a class member");
                if self.pos == before {
                    self.discard_one();
                }
            }
        }
        self.promoting = false;
        self.scopes.pop(ScopeKind::Type);
        self.expect(SyntaxKind::RBrace, "expected `}` to close the type body");
        members
    }

    fn parse_enum_constants(&mut self, members: &mut Vec<Member>) {
        loop {
            if self.eat(SyntaxKind::Semicolon) || self.at(SyntaxKind::RBrace) || self.at_eof() {
                return;
            }
            let start = self.start();
            while self.at(SyntaxKind::At) {
                self.muted(Self::parse_annotation);
            }
            if !self.at_ident() || self.at_focus() {
                return;
            }
            let name = self.ident();
            let args = if self.at(SyntaxKind::LParen) {
                Some(self.parse_arguments())
            } else {
                None
            };
            let body = if self.at(SyntaxKind::LBrace) {
                Some(self.parse_class_body(DeclKind::Class, ""))
            } else {
                None
            };
            members.push(Member::EnumConstant(EnumConstant {
                name,
                args,
                body,
                range: self.range_from(start),
            }));
            if !self.eat(SyntaxKind::Comma) {
                self.eat(SyntaxKind::Semicolon);
                return;
            }
        }
    }

    fn parse_member(&mut self, kind: DeclKind, class_name: &str, members: &mut Vec<Member>) {
        let start = self.start();
        if self.eat(SyntaxKind::Semicolon) {
            return;
        }
        if self.at(SyntaxKind::LBrace) {
            members.push(Member::Initializer(self.parse_initializer(false, start)));
            return;
        }
        if self.at(SyntaxKind::StaticKw) && self.nth(1) == SyntaxKind::LBrace {
            self.bump();
            members.push(Member::Initializer(self.parse_initializer(true, start)));
            return;
        }

        let placed_before = self.marker.is_placed();
        let modifiers = self.parse_modifiers();
        if self.at_decl_keyword(0) {
            if let Some(decl) = self.parse_type_decl(start, modifiers) {
                members.push(Member::Type(decl));
            }
            return;
        }

        let type_params = if self.at(SyntaxKind::Less) {
            self.parse_type_params()
        } else {
            Vec::new()
        };

        let constructor_like = self.at_ident()
            && (self.nth(1) == SyntaxKind::LParen
                || (kind == DeclKind::Record
                    && self.nth(1) == SyntaxKind::LBrace
                    && self.current_text() == class_name));
        if constructor_like {
            let method = self.parse_method_rest(start, modifiers, type_params, None);
            members.push(Member::Method(method));
            return;
        }

        if !self.at_ident() && !self.current().is_primitive_type() && !self.at(SyntaxKind::VoidKw) {
            if !modifiers.is_empty() || !type_params.is_empty() {
                self.recover(Expected::Member, "expected a member after modifiers");
            }
            if !placed_before && self.marker.is_placed() {
                // The marker is in an annotation argument; keep the dangling modifiers.
                members.push(Member::Field(FieldDecl {
                    modifiers,
                    ty: TypeRef::Missing,
                    name: DeclName::Missing,
                    init: None,
                    range: self.range_from(start),
                }));
            }
            return;
        }

        let ty = self.parse_type(Position::Type);
        if self.at_ident() && self.nth(1) == SyntaxKind::LParen {
            let method = self.parse_method_rest(start, modifiers, type_params, Some(ty));
            members.push(Member::Method(method));
            return;
        }
        self.parse_field_declarators(start, modifiers, ty, members);
    }

    fn parse_initializer(&mut self, is_static: bool, start: usize) -> Initializer {
        self.scopes.push(ScopeKind::Initializer);
        let body = self.parse_body();
        self.scopes.pop(ScopeKind::Initializer);
        Initializer {
            is_static,
            body,
            range: self.range_from(start),
        }
    }

    /// A method or initializer body: parsed, or skipped by brace matching.
    fn parse_body(&mut self) -> Block {
        if self.should_parse_body() {
            self.parse_block(None)
        } else {
            self.skip_body()
        }
    }

    fn parse_method_rest(
        &mut self,
        start: usize,
        modifiers: Modifiers,
        type_params: Vec<TypeParam>,
        return_ty: Option<TypeRef>,
    ) -> MethodDecl {
        let kind = if return_ty.is_some() {
            MethodKind::Method
        } else {
            MethodKind::Constructor
        };
        let name = self.ident();
        self.scopes.push(ScopeKind::Method);
        let params = if self.at(SyntaxKind::LParen) {
            self.parse_params(Some(LocalOrigin::Parameter))
        } else {
            Vec::new()
        };
        while self.at(SyntaxKind::LBracket) && self.nth(1) == SyntaxKind::RBracket {
            self.bump();
            self.bump();
        }
        let mut throws = Vec::new();
        if self.eat(SyntaxKind::ThrowsKw) {
            self.parse_type_list(&mut throws, Position::Exception);
        }
        let default_value = if self.eat(SyntaxKind::DefaultKw) {
            Some(self.parse_var_init())
        } else {
            None
        };
        let body = if self.at(SyntaxKind::LBrace) {
            Some(self.parse_body())
        } else {
            self.expect(SyntaxKind::Semicolon, "expected a method body or `;`");
            None
        };
        self.scopes.pop(ScopeKind::Method);
        MethodDecl {
            kind,
            modifiers,
            type_params,
            return_ty,
            name,
            params,
            throws,
            default_value,
            body,
            range: self.range_from(start),
        }
    }

    /// `( [param {, param}] )`. Parameters are declared with `origin` when given.
    pub(super) fn parse_params(&mut self, origin: Option<LocalOrigin>) -> Vec<Param> {
        self.bump();
        let mut params = Vec::new();
        while !self.at(SyntaxKind::RParen) && !self.at_eof() {
            let start = self.start();
            let modifiers = self.parse_modifiers();
            let before = self.pos;
            let mut ty = self.parse_type(Position::Type);
            if self.pos == before {
                break;
            }
            let varargs = self.eat(SyntaxKind::Ellipsis);
            let name = if self.at(SyntaxKind::ThisKw) {
                self.bump();
                DeclName::Named(Ident::new("this"))
            } else {
                self.parse_decl_name(Position::ArgumentName)
            };
            ty = self.parse_array_dims(ty, start);
            if let (Some(origin), Some(local)) = (origin, name.as_str()) {
                let printed = print_type(&ty);
                self.scopes.declare(local, Some(printed), origin);
            }
            params.push(Param {
                modifiers,
                ty,
                varargs,
                name,
                range: self.range_from(start),
            });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, "expected `)` to close the parameter list");
        params
    }

    /// A declared name; the focus token here becomes a name marker of `position`.
    pub(super) fn parse_decl_name(&mut self, position: Position) -> DeclName {
        if self.at_focus() {
            let tok = self.bump();
            let text = self.text(tok);
            let payload = MarkerPayload::Name {
                qualifier: Vec::new(),
            };
            return match self.marker.place(position, payload, text, tok.range, tok.range, &self.scopes) {
                Some(marker) => DeclName::Marker(marker),
                None => DeclName::Named(Ident::new(text)),
            };
        }
        if self.at_ident() {
            return DeclName::Named(self.ident());
        }
        self.error_here("expected a name");
        DeclName::Missing
    }

    fn parse_field_declarators(
        &mut self,
        start: usize,
        modifiers: Modifiers,
        ty: TypeRef,
        members: &mut Vec<Member>,
    ) {
        loop {
            let decl_start = self.start();
            let name = self.parse_decl_name(Position::FieldName);
            let ty = self.parse_array_dims(ty.clone(), decl_start);
            let init = if self.eat(SyntaxKind::Eq) {
                Some(self.parse_var_init())
            } else {
                None
            };
            members.push(Member::Field(FieldDecl {
                modifiers: modifiers.clone(),
                ty,
                name,
                init,
                range: self.range_from(start),
            }));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::Semicolon, "expected `;` after field declaration");
    }
}
