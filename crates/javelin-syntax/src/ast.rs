//! Owned syntax tree produced by the assist parser.
//!
//! Every node records the source range it was parsed from. Nodes invented during
//! recovery (default constructors, `<clinit>`, import wrappers, anonymous blocks)
//! carry [`TextRange::NONE`].

use smol_str::SmolStr;

use crate::TextRange;

pub type Ident = SmolStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompilationUnit {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub segments: Vec<Ident>,
    pub range: TextRange,
}

impl QualifiedName {
    pub fn dotted(&self) -> String {
        join_dotted(&self.segments)
    }
}

pub(crate) fn join_dotted(segments: &[Ident]) -> String {
    let mut out = String::new();
    for (idx, seg) in segments.iter().enumerate() {
        if idx > 0 {
            out.push('.');
        }
        out.push_str(seg);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameOrMarker {
    Name(QualifiedName),
    Marker(Marker),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub name: NameOrMarker,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub is_static: bool,
    pub name: NameOrMarker,
    pub on_demand: bool,
    pub range: TextRange,
}

// --- Markers ---

/// The kind of a completion or selection marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    CompleteOnName,
    CompleteOnMemberAccess,
    CompleteOnMessageSend,
    CompleteOnAllocationExpression,
    CompleteOnType,
    CompleteOnException,
    CompleteOnKeyword,
    CompleteOnImport,
    CompleteOnPackage,
    CompletionOnReferenceExpressionName,
    CompleteOnFieldName,
    CompleteOnLocalName,
    CompleteOnArgumentName,
    SelectOnName,
    SelectOnType,
    SelectOnMessageSend,
    SelectOnAllocationExpression,
    SelectOnFieldReference,
    SelectOnReferenceExpressionName,
}

impl MarkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::CompleteOnName => "CompleteOnName",
            MarkerKind::CompleteOnMemberAccess => "CompleteOnMemberAccess",
            MarkerKind::CompleteOnMessageSend => "CompleteOnMessageSend",
            MarkerKind::CompleteOnAllocationExpression => "CompleteOnAllocationExpression",
            MarkerKind::CompleteOnType => "CompleteOnType",
            MarkerKind::CompleteOnException => "CompleteOnException",
            MarkerKind::CompleteOnKeyword => "CompleteOnKeyword",
            MarkerKind::CompleteOnImport => "CompleteOnImport",
            MarkerKind::CompleteOnPackage => "CompleteOnPackage",
            MarkerKind::CompletionOnReferenceExpressionName => {
                "CompletionOnReferenceExpressionName"
            }
            MarkerKind::CompleteOnFieldName => "CompleteOnFieldName",
            MarkerKind::CompleteOnLocalName => "CompleteOnLocalName",
            MarkerKind::CompleteOnArgumentName => "CompleteOnArgumentName",
            MarkerKind::SelectOnName => "SelectOnName",
            MarkerKind::SelectOnType => "SelectOnType",
            MarkerKind::SelectOnMessageSend => "SelectOnMessageSend",
            MarkerKind::SelectOnAllocationExpression => "SelectOnAllocationExpression",
            MarkerKind::SelectOnFieldReference => "SelectOnFieldReference",
            MarkerKind::SelectOnReferenceExpressionName => "SelectOnReferenceExpressionName",
        }
    }

    pub fn is_selection(self) -> bool {
        matches!(
            self,
            MarkerKind::SelectOnName
                | MarkerKind::SelectOnType
                | MarkerKind::SelectOnMessageSend
                | MarkerKind::SelectOnAllocationExpression
                | MarkerKind::SelectOnFieldReference
                | MarkerKind::SelectOnReferenceExpressionName
        )
    }

    /// Marker kinds whose receiver is separated by `::` rather than `.`.
    pub fn is_reference_expression(self) -> bool {
        matches!(
            self,
            MarkerKind::CompletionOnReferenceExpressionName
                | MarkerKind::SelectOnReferenceExpressionName
        )
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a marker wraps besides its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerPayload {
    /// `a.b.<identifier>`; the qualifier may be empty.
    Name { qualifier: Vec<Ident> },
    /// `<receiver>.<identifier>` or `<receiver>::<identifier>`.
    Receiver(Box<Expr>),
    /// `[<receiver>.]<name>(<args>)`. `name` differs from the marker identifier
    /// when completing on the empty argument list.
    Call {
        receiver: Option<Box<Expr>>,
        name: Ident,
        args: Vec<Expr>,
    },
    /// `new <ty>(<args>)`.
    Allocation {
        ty: Box<TypeRef>,
        args: Vec<Expr>,
    },
    /// A complete type reference, type arguments included.
    Type(Box<TypeRef>),
}

/// The single node flagging where the caret or selection is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub payload: MarkerPayload,
    /// Text typed so far (completion) or the selected identifier (selection).
    pub identifier: Ident,
    pub range: TextRange,
}

// --- Declarations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    Default,
    Sealed,
    NonSealed,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Native => "native",
            Modifier::Synchronized => "synchronized",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Default => "default",
            Modifier::Sealed => "sealed",
            Modifier::NonSealed => "non-sealed",
        }
    }

    pub fn is_visibility(self) -> bool {
        matches!(self, Modifier::Public | Modifier::Protected | Modifier::Private)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: QualifiedName,
    /// `None` for a marker annotation, `Some` (possibly empty) when parenthesized.
    pub args: Option<Vec<Expr>>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub annotations: Vec<Annotation>,
    pub keywords: Vec<Modifier>,
    pub range: TextRange,
}

impl Modifiers {
    pub fn contains(&self, modifier: Modifier) -> bool {
        self.keywords.contains(&modifier)
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.keywords.is_empty()
    }

    pub fn visibility(&self) -> Option<Modifier> {
        self.keywords.iter().copied().find(|m| m.is_visibility())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Class => "class",
            DeclKind::Interface => "interface",
            DeclKind::Enum => "enum",
            DeclKind::Record => "record",
            DeclKind::Annotation => "@interface",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: Ident,
    pub bounds: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: DeclKind,
    pub modifiers: Modifiers,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub record_components: Vec<Param>,
    pub extends: Vec<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub permits: Vec<TypeRef>,
    /// Source order, with synthesized members inserted at the front.
    pub members: Vec<Member>,
    pub range: TextRange,
}

impl TypeDecl {
    pub fn constructors(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) if method.kind == MethodKind::Constructor => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn member_types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Type(ty) => Some(ty),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Type(TypeDecl),
    Field(FieldDecl),
    Initializer(Initializer),
    EnumConstant(EnumConstant),
    Method(MethodDecl),
}

/// A declared name that may be missing or hold the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclName {
    Named(Ident),
    Marker(Marker),
    Missing,
}

impl DeclName {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DeclName::Named(name) => Some(name),
            DeclName::Marker(marker) => Some(&marker.identifier),
            DeclName::Missing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub name: DeclName,
    pub init: Option<Expr>,
    pub range: TextRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Constructor,
    ClassInit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub kind: MethodKind,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    /// `None` for constructors and `<clinit>`.
    pub return_ty: Option<TypeRef>,
    pub name: Ident,
    pub params: Vec<Param>,
    pub throws: Vec<TypeRef>,
    /// An annotation element default (`String value() default "x";`).
    pub default_value: Option<Expr>,
    pub body: Option<Block>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub varargs: bool,
    pub name: DeclName,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initializer {
    pub is_static: bool,
    pub body: Block,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: Ident,
    pub args: Option<Vec<Expr>>,
    pub body: Option<Vec<Member>>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Set when the body was skipped by brace matching and `stmts` is empty.
    pub skipped: bool,
    pub range: TextRange,
}

// --- Statements ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVar {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub name: DeclName,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchLabel {
    Case(Vec<Expr>),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchGroup {
    pub labels: Vec<SwitchLabel>,
    pub arrow: bool,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Decl(LocalVar),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    pub types: Vec<TypeRef>,
    pub name: DeclName,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    LocalVar(LocalVar),
    Expr(Expr),
    Block(Block),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Vec<Stmt>,
        cond: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    ForEach {
        var: LocalVar,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Switch {
        selector: Expr,
        groups: Vec<SwitchGroup>,
    },
    Try {
        resources: Vec<Resource>,
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Yield(Expr),
    Break(Option<Ident>),
    Continue(Option<Ident>),
    Assert {
        cond: Expr,
        message: Option<Expr>,
    },
    Synchronized {
        lock: Expr,
        body: Block,
    },
    Labeled {
        label: Ident,
        body: Box<Stmt>,
    },
    LocalType(Box<TypeDecl>),
    Empty,
}

// --- Expressions ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: TextRange,
}

impl Expr {
    pub fn new(kind: ExprKind, range: TextRange) -> Self {
        Expr { kind, range }
    }

    pub fn missing(range: TextRange) -> Self {
        Expr::new(ExprKind::Missing, range)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreInc,
    PreDec,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc => "++",
            UnaryOp::PreDec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostfixOp {
    Inc,
    Dec,
}

impl PostfixOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PostfixOp::Inc => "++",
            PostfixOp::Dec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    OrOr,
    AndAnd,
    Or,
    Xor,
    And,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::OrOr => "||",
            BinaryOp::AndAnd => "&&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::And => "&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::UShr => ">>>=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaParam {
    pub ty: Option<TypeRef>,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Literal(SmolStr),
    /// A simple or qualified name, `a` or `a.b.c`.
    Name(Vec<Ident>),
    FieldAccess {
        receiver: Box<Expr>,
        name: Ident,
    },
    Call {
        receiver: Option<Box<Expr>>,
        type_args: Vec<TypeRef>,
        name: Ident,
        args: Vec<Expr>,
    },
    New {
        outer: Option<Box<Expr>>,
        ty: TypeRef,
        args: Vec<Expr>,
        body: Option<Vec<Member>>,
    },
    NewArray {
        elem: TypeRef,
        dims: Vec<Option<Expr>>,
        init: Option<Vec<Expr>>,
    },
    ArrayInit(Vec<Expr>),
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Postfix {
        op: PostfixOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    InstanceOf {
        expr: Box<Expr>,
        ty: TypeRef,
        binding: Option<Ident>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },
    Paren(Box<Expr>),
    Lambda {
        params: Vec<LambdaParam>,
        body: LambdaBody,
    },
    MethodRef {
        receiver: Box<Expr>,
        name: Ident,
    },
    This {
        qualifier: Option<Vec<Ident>>,
    },
    Super {
        qualifier: Option<Vec<Ident>>,
    },
    ClassLit(TypeRef),
    /// A type in expression position, e.g. the receiver of `int[]::new`.
    TypeExpr(TypeRef),
    Switch {
        selector: Box<Expr>,
        groups: Vec<SwitchGroup>,
    },
    Marker(Marker),
    Missing,
}

// --- Types ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSegment {
    pub name: Ident,
    /// `None` without type arguments, `Some(vec![])` for the diamond `<>`.
    pub args: Option<Vec<TypeRef>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardBoundKind {
    Extends,
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Primitive {
        name: Ident,
        range: TextRange,
    },
    Named {
        segments: Vec<TypeSegment>,
        range: TextRange,
    },
    Array {
        elem: Box<TypeRef>,
        dims: u32,
        range: TextRange,
    },
    Wildcard {
        bound: Option<(WildcardBoundKind, Box<TypeRef>)>,
        range: TextRange,
    },
    Marker(Marker),
    Missing,
}

impl TypeRef {
    pub fn range(&self) -> TextRange {
        match self {
            TypeRef::Primitive { range, .. }
            | TypeRef::Named { range, .. }
            | TypeRef::Array { range, .. }
            | TypeRef::Wildcard { range, .. } => *range,
            TypeRef::Marker(marker) => marker.range,
            TypeRef::Missing => TextRange::NONE,
        }
    }

    pub fn simple(name: impl Into<Ident>, range: TextRange) -> Self {
        TypeRef::Named {
            segments: vec![TypeSegment {
                name: name.into(),
                args: None,
            }],
            range,
        }
    }
}

// --- Marker search ---

/// The node directly enclosing the marker, borrowed from the tree.
#[derive(Debug, Clone, Copy)]
pub enum ParentRef<'a> {
    Expr(&'a Expr),
    Stmt(&'a Stmt),
    Field(&'a FieldDecl),
}

/// Locate the marker in `unit`, if one was placed.
pub fn find_marker(unit: &CompilationUnit) -> Option<&Marker> {
    match search::unit(unit) {
        search::Found::Miss => None,
        search::Found::Open(marker) | search::Found::Closed(marker, _) => Some(marker),
    }
}

/// Locate the innermost node around the marker that can act as its parent: the
/// closest enclosing expression, or else a local/field declaration whose
/// initializer is the marker, or a `return`/`throw`/`yield` statement.
pub fn find_marker_parent(unit: &CompilationUnit) -> Option<ParentRef<'_>> {
    match search::unit(unit) {
        search::Found::Closed(_, parent) => parent,
        _ => None,
    }
}

mod search {
    use super::*;

    pub(super) enum Found<'a> {
        Miss,
        /// Marker found, parent not decided yet.
        Open(&'a Marker),
        Closed(&'a Marker, Option<ParentRef<'a>>),
    }

    impl<'a> Found<'a> {
        fn or_else(self, f: impl FnOnce() -> Found<'a>) -> Found<'a> {
            match self {
                Found::Miss => f(),
                found => found,
            }
        }

        fn parent(self, parent: ParentRef<'a>) -> Found<'a> {
            match self {
                Found::Open(marker) => Found::Closed(marker, Some(parent)),
                found => found,
            }
        }

        fn close(self) -> Found<'a> {
            match self {
                Found::Open(marker) => Found::Closed(marker, None),
                found => found,
            }
        }
    }

    fn first<'a, T: 'a>(
        items: impl IntoIterator<Item = &'a T>,
        mut f: impl FnMut(&'a T) -> Found<'a>,
    ) -> Found<'a> {
        for item in items {
            let found = f(item);
            if !matches!(found, Found::Miss) {
                return found;
            }
        }
        Found::Miss
    }

    fn name_or_marker(name: &NameOrMarker) -> Found<'_> {
        match name {
            NameOrMarker::Marker(marker) => Found::Closed(marker, None),
            NameOrMarker::Name(_) => Found::Miss,
        }
    }

    fn decl_name(name: &DeclName) -> Found<'_> {
        match name {
            DeclName::Marker(marker) => Found::Open(marker),
            _ => Found::Miss,
        }
    }

    pub(super) fn unit(unit: &CompilationUnit) -> Found<'_> {
        unit.package
            .as_ref()
            .map_or(Found::Miss, |pkg| name_or_marker(&pkg.name))
            .or_else(|| first(&unit.imports, |import| name_or_marker(&import.name)))
            .or_else(|| first(&unit.types, type_decl))
    }

    fn type_decl(decl: &TypeDecl) -> Found<'_> {
        crate::ensure_stack(|| type_decl_inner(decl))
    }

    fn type_decl_inner(decl: &TypeDecl) -> Found<'_> {
        first(&decl.type_params, type_param)
            .or_else(|| first(&decl.record_components, param))
            .or_else(|| first(&decl.extends, ty))
            .or_else(|| first(&decl.implements, ty))
            .or_else(|| first(&decl.permits, ty))
            .or_else(|| modifiers(&decl.modifiers))
            .close()
            .or_else(|| members(&decl.members))
    }

    /// Annotation arguments are searched like any other marker-closing position.
    fn modifiers(modifiers: &Modifiers) -> Found<'_> {
        first(&modifiers.annotations, |annotation| {
            annotation
                .args
                .as_ref()
                .map_or(Found::Miss, |args| first(args, expr).close())
        })
    }

    fn type_param(param: &TypeParam) -> Found<'_> {
        first(&param.bounds, ty)
    }

    fn members(members: &[Member]) -> Found<'_> {
        first(members, member)
    }

    fn member(member: &Member) -> Found<'_> {
        match member {
            Member::Type(decl) => type_decl(decl),
            Member::Field(field) => modifiers(&field.modifiers)
                .or_else(|| ty(&field.ty))
                .or_else(|| decl_name(&field.name))
                .close()
                .or_else(|| {
                    field
                        .init
                        .as_ref()
                        .map_or(Found::Miss, |init| expr(init).parent(ParentRef::Field(field)))
                }),
            Member::Initializer(init) => block(&init.body),
            Member::EnumConstant(constant) => constant
                .args
                .as_ref()
                .map_or(Found::Miss, |args| first(args, expr).close())
                .or_else(|| constant.body.as_deref().map_or(Found::Miss, members)),
            Member::Method(method) => modifiers(&method.modifiers)
                .or_else(|| first(&method.type_params, type_param))
                .or_else(|| method.return_ty.as_ref().map_or(Found::Miss, ty))
                .or_else(|| first(&method.params, param))
                .or_else(|| first(&method.throws, ty))
                .or_else(|| method.default_value.as_ref().map_or(Found::Miss, expr))
                .close()
                .or_else(|| method.body.as_ref().map_or(Found::Miss, block)),
        }
    }

    fn param(param: &Param) -> Found<'_> {
        modifiers(&param.modifiers)
            .or_else(|| ty(&param.ty))
            .or_else(|| decl_name(&param.name))
    }

    fn block(block: &Block) -> Found<'_> {
        first(&block.stmts, stmt)
    }

    fn local_var(var: &LocalVar) -> Found<'_> {
        modifiers(&var.modifiers)
            .or_else(|| ty(&var.ty))
            .or_else(|| decl_name(&var.name))
    }

    fn stmt(s: &Stmt) -> Found<'_> {
        crate::ensure_stack(|| stmt_inner(s))
    }

    fn stmt_inner(s: &Stmt) -> Found<'_> {
        let found = match &s.kind {
            StmtKind::LocalVar(var) => local_var(var).close().or_else(|| {
                var.init
                    .as_ref()
                    .map_or(Found::Miss, |init| expr(init).parent(ParentRef::Stmt(s)))
            }),
            StmtKind::Expr(e) => expr(e),
            StmtKind::Block(b) => block(b),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => expr(cond)
                .close()
                .or_else(|| stmt(then_branch))
                .or_else(|| else_branch.as_deref().map_or(Found::Miss, stmt)),
            StmtKind::While { cond, body } => expr(cond).close().or_else(|| stmt(body)),
            StmtKind::DoWhile { body, cond } => stmt(body).or_else(|| expr(cond)),
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => first(init, stmt)
                .or_else(|| cond.as_ref().map_or(Found::Miss, expr))
                .or_else(|| first(update, expr))
                .close()
                .or_else(|| stmt(body)),
            StmtKind::ForEach {
                var,
                iterable,
                body,
            } => local_var(var)
                .or_else(|| expr(iterable))
                .close()
                .or_else(|| stmt(body)),
            StmtKind::Switch { selector, groups } => {
                expr(selector).close().or_else(|| switch_groups(groups))
            }
            StmtKind::Try {
                resources,
                body,
                catches,
                finally,
            } => first(resources, |resource| match resource {
                Resource::Decl(var) => local_var(var)
                    .or_else(|| var.init.as_ref().map_or(Found::Miss, expr)),
                Resource::Expr(e) => expr(e),
            })
            .close()
            .or_else(|| block(body))
            .or_else(|| {
                first(catches, |catch| {
                    first(&catch.types, ty)
                        .or_else(|| decl_name(&catch.name))
                        .close()
                        .or_else(|| block(&catch.body))
                })
            })
            .or_else(|| finally.as_ref().map_or(Found::Miss, block)),
            StmtKind::Return(value) => value
                .as_ref()
                .map_or(Found::Miss, |e| expr(e).parent(ParentRef::Stmt(s))),
            StmtKind::Throw(e) | StmtKind::Yield(e) => expr(e).parent(ParentRef::Stmt(s)),
            StmtKind::Assert { cond, message } => {
                expr(cond).or_else(|| message.as_ref().map_or(Found::Miss, expr))
            }
            StmtKind::Synchronized { lock, body } => expr(lock).close().or_else(|| block(body)),
            StmtKind::Labeled { body, .. } => stmt(body),
            StmtKind::LocalType(decl) => type_decl(decl),
            StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Empty => Found::Miss,
        };
        found.close()
    }

    fn switch_groups(groups: &[SwitchGroup]) -> Found<'_> {
        first(groups, |group| {
            first(&group.labels, |label| match label {
                SwitchLabel::Case(exprs) => first(exprs, expr).close(),
                SwitchLabel::Default => Found::Miss,
            })
            .or_else(|| first(&group.stmts, stmt))
        })
    }

    fn ty(t: &TypeRef) -> Found<'_> {
        match t {
            TypeRef::Marker(marker) => Found::Open(marker),
            TypeRef::Named { segments, .. } => first(segments, |seg| {
                seg.args.as_ref().map_or(Found::Miss, |args| first(args, ty))
            }),
            TypeRef::Array { elem, .. } => ty(elem),
            TypeRef::Wildcard { bound, .. } => {
                bound.as_ref().map_or(Found::Miss, |(_, bound)| ty(bound))
            }
            TypeRef::Primitive { .. } | TypeRef::Missing => Found::Miss,
        }
    }

    fn expr(e: &Expr) -> Found<'_> {
        crate::ensure_stack(|| expr_inner(e))
    }

    fn expr_inner(e: &Expr) -> Found<'_> {
        let inner = match &e.kind {
            ExprKind::Marker(marker) => return Found::Open(marker),
            // Parentheses are transparent for parent lookup.
            ExprKind::Paren(inner) => return expr(inner),
            ExprKind::Lambda { params, body } => {
                let found = first(params, |p| p.ty.as_ref().map_or(Found::Miss, ty)).close();
                return found.or_else(|| match body {
                    LambdaBody::Expr(body) => expr(body).parent(ParentRef::Expr(e)),
                    LambdaBody::Block(b) => block(b),
                });
            }
            ExprKind::New {
                outer,
                ty: new_ty,
                args,
                body,
            } => {
                let found = outer
                    .as_deref()
                    .map_or(Found::Miss, expr)
                    .or_else(|| ty(new_ty))
                    .or_else(|| first(args, expr))
                    .parent(ParentRef::Expr(e));
                return found.or_else(|| body.as_deref().map_or(Found::Miss, members));
            }
            ExprKind::Literal(_)
            | ExprKind::Name(_)
            | ExprKind::This { .. }
            | ExprKind::Super { .. }
            | ExprKind::Missing => Found::Miss,
            ExprKind::FieldAccess { receiver, .. } => expr(receiver),
            ExprKind::Call {
                receiver,
                type_args,
                args,
                ..
            } => receiver
                .as_deref()
                .map_or(Found::Miss, expr)
                .or_else(|| first(type_args, ty))
                .or_else(|| first(args, expr)),
            ExprKind::NewArray { elem, dims, init } => ty(elem)
                .or_else(|| first(dims, |dim| dim.as_ref().map_or(Found::Miss, expr)))
                .or_else(|| init.as_ref().map_or(Found::Miss, |init| first(init, expr))),
            ExprKind::ArrayInit(items) => first(items, expr),
            ExprKind::ArrayAccess { array, index } => expr(array).or_else(|| expr(index)),
            ExprKind::Unary { operand, .. } | ExprKind::Postfix { operand, .. } => expr(operand),
            ExprKind::Binary { lhs, rhs, .. } => expr(lhs).or_else(|| expr(rhs)),
            ExprKind::InstanceOf { expr: inner, ty: t, .. } => expr(inner).or_else(|| ty(t)),
            ExprKind::Assign { target, value, .. } => expr(target).or_else(|| expr(value)),
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => expr(cond)
                .or_else(|| expr(then_expr))
                .or_else(|| expr(else_expr)),
            ExprKind::Cast { ty: t, expr: inner } => ty(t).or_else(|| expr(inner)),
            ExprKind::MethodRef { receiver, .. } => expr(receiver),
            ExprKind::ClassLit(t) | ExprKind::TypeExpr(t) => ty(t),
            ExprKind::Switch { selector, groups } => expr(selector).or_else(|| switch_groups(groups)),
        };
        inner.parent(ParentRef::Expr(e))
    }
}
