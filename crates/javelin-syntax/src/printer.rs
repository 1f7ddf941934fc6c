//! Canonical display form of the syntax tree.
//!
//! The layout is fixed: two-space indentation, one member or statement per line,
//! and parentheses only where the source had them. Two trees print the same
//! exactly when they have the same shape.

use crate::ast::*;
use crate::ensure_stack;

pub fn print_unit(unit: &CompilationUnit) -> String {
    let mut p = Printer::default();
    p.unit(unit);
    p.out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut p = Printer::default();
    p.expr(expr, 0);
    p.out
}

pub fn print_stmt(stmt: &Stmt) -> String {
    let mut p = Printer::default();
    p.stmt(stmt, 0);
    p.out
}

pub fn print_field(field: &FieldDecl) -> String {
    let mut p = Printer::default();
    p.field(field, 0);
    p.out
}

pub fn print_type(ty: &TypeRef) -> String {
    let mut p = Printer::default();
    p.type_ref(ty);
    p.out
}

pub fn print_marker(marker: &Marker) -> String {
    let mut p = Printer::default();
    p.marker(marker);
    p.out
}

pub fn print_parent(parent: ParentRef<'_>) -> String {
    match parent {
        ParentRef::Expr(expr) => print_expr(expr),
        ParentRef::Stmt(stmt) => print_stmt(stmt),
        ParentRef::Field(field) => print_field(field),
    }
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push_str("  ");
        }
    }

    fn newline(&mut self, level: usize) {
        self.out.push('\n');
        self.indent(level);
    }

    fn comma_separated<T>(&mut self, items: &[T], mut f: impl FnMut(&mut Self, &T)) {
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.push(", ");
            }
            f(self, item);
        }
    }

    fn unit(&mut self, unit: &CompilationUnit) {
        if let Some(pkg) = &unit.package {
            self.push("package ");
            self.name_or_marker(&pkg.name);
            self.push(";\n");
        }
        for import in &unit.imports {
            self.push("import ");
            if import.is_static {
                self.push("static ");
            }
            self.name_or_marker(&import.name);
            if import.on_demand {
                self.push(".*");
            }
            self.push(";\n");
        }
        for decl in &unit.types {
            self.type_decl(decl, 0);
            self.push("\n");
        }
    }

    fn name_or_marker(&mut self, name: &NameOrMarker) {
        match name {
            NameOrMarker::Name(name) => self.push(&name.dotted()),
            NameOrMarker::Marker(marker) => self.marker(marker),
        }
    }

    fn modifiers(&mut self, modifiers: &Modifiers) {
        for annotation in &modifiers.annotations {
            self.annotation(annotation);
            self.push(" ");
        }
        for keyword in &modifiers.keywords {
            self.push(keyword.as_str());
            self.push(" ");
        }
    }

    fn annotation(&mut self, annotation: &Annotation) {
        self.push("@");
        self.push(&annotation.name.dotted());
        if let Some(args) = &annotation.args {
            self.push("(");
            self.comma_separated(args, |p, arg| p.expr(arg, 0));
            self.push(")");
        }
    }

    fn type_params(&mut self, params: &[TypeParam]) {
        if params.is_empty() {
            return;
        }
        self.push("<");
        self.comma_separated(params, |p, param| {
            p.push(&param.name);
            for (idx, bound) in param.bounds.iter().enumerate() {
                p.push(if idx == 0 { " extends " } else { " & " });
                p.type_ref(bound);
            }
        });
        self.push(">");
    }

    fn type_decl(&mut self, decl: &TypeDecl, level: usize) {
        ensure_stack(|| self.type_decl_inner(decl, level));
    }

    fn type_decl_inner(&mut self, decl: &TypeDecl, level: usize) {
        self.indent(level);
        self.modifiers(&decl.modifiers);
        self.push(decl.kind.keyword());
        self.push(" ");
        self.push(&decl.name);
        self.type_params(&decl.type_params);
        if decl.kind == DeclKind::Record {
            self.push("(");
            self.comma_separated(&decl.record_components, |p, param| p.param(param));
            self.push(")");
        }
        if !decl.extends.is_empty() {
            self.push(" extends ");
            self.comma_separated(&decl.extends, |p, ty| p.type_ref(ty));
        }
        if !decl.implements.is_empty() {
            self.push(" implements ");
            self.comma_separated(&decl.implements, |p, ty| p.type_ref(ty));
        }
        if !decl.permits.is_empty() {
            self.push(" permits ");
            self.comma_separated(&decl.permits, |p, ty| p.type_ref(ty));
        }
        self.push(" {");
        self.members(&decl.members, level + 1);
        self.newline(level);
        self.push("}");
    }

    /// Member types first, then fields and initializers, then methods; source
    /// order within each group.
    fn members(&mut self, members: &[Member], level: usize) {
        let rank = |member: &Member| match member {
            Member::Type(_) => 0,
            Member::EnumConstant(_) | Member::Field(_) | Member::Initializer(_) => 1,
            Member::Method(_) => 2,
        };
        for group in 0..3 {
            for member in members.iter().filter(|m| rank(*m) == group) {
                self.push("\n");
                self.member(member, level);
            }
        }
    }

    fn member(&mut self, member: &Member, level: usize) {
        match member {
            Member::Type(decl) => self.type_decl(decl, level),
            Member::Field(field) => self.field(field, level),
            Member::Initializer(init) => {
                self.indent(level);
                if init.is_static {
                    self.push("static ");
                }
                self.block(&init.body, level);
            }
            Member::EnumConstant(constant) => {
                self.indent(level);
                self.push(&constant.name);
                if let Some(args) = &constant.args {
                    self.push("(");
                    self.comma_separated(args, |p, arg| p.expr(arg, level));
                    self.push(")");
                }
                if let Some(body) = &constant.body {
                    self.push(" {");
                    self.members(body, level + 1);
                    self.newline(level);
                    self.push("}");
                }
                self.push(",");
            }
            Member::Method(method) => self.method(method, level),
        }
    }

    fn field(&mut self, field: &FieldDecl, level: usize) {
        self.indent(level);
        self.modifiers(&field.modifiers);
        self.type_ref(&field.ty);
        self.decl_name(&field.name);
        if let Some(init) = &field.init {
            self.push(" = ");
            self.expr(init, level);
        }
        self.push(";");
    }

    fn decl_name(&mut self, name: &DeclName) {
        match name {
            DeclName::Named(name) => {
                self.push(" ");
                self.push(name);
            }
            DeclName::Marker(marker) => {
                self.push(" ");
                self.marker(marker);
            }
            DeclName::Missing => {}
        }
    }

    fn method(&mut self, method: &MethodDecl, level: usize) {
        self.indent(level);
        self.modifiers(&method.modifiers);
        if !method.type_params.is_empty() {
            self.type_params(&method.type_params);
            self.push(" ");
        }
        if let Some(ret) = &method.return_ty {
            self.type_ref(ret);
            self.push(" ");
        }
        self.push(&method.name);
        self.push("(");
        self.comma_separated(&method.params, |p, param| p.param(param));
        self.push(")");
        if !method.throws.is_empty() {
            self.push(" throws ");
            self.comma_separated(&method.throws, |p, ty| p.type_ref(ty));
        }
        if let Some(default) = &method.default_value {
            self.push(" default ");
            self.expr(default, level);
        }
        match &method.body {
            Some(body) => {
                self.push(" ");
                self.block(body, level);
            }
            None => self.push(";"),
        }
    }

    fn param(&mut self, param: &Param) {
        self.modifiers(&param.modifiers);
        self.type_ref(&param.ty);
        if param.varargs {
            self.push("...");
        }
        self.decl_name(&param.name);
    }

    /// `{`, statements at `level + 1`, then `}` at `level`. The opening brace is
    /// written at the current position.
    fn block(&mut self, block: &Block, level: usize) {
        self.push("{");
        for stmt in &block.stmts {
            self.push("\n");
            self.stmt(stmt, level + 1);
        }
        self.newline(level);
        self.push("}");
    }

    fn local_var(&mut self, var: &LocalVar, level: usize) {
        self.modifiers(&var.modifiers);
        self.type_ref(&var.ty);
        self.decl_name(&var.name);
        if let Some(init) = &var.init {
            self.push(" = ");
            self.expr(init, level);
        }
    }

    /// Statement body of a control construct, one level deeper on its own line.
    fn nested(&mut self, body: &Stmt, level: usize) {
        self.push("\n");
        self.stmt(body, level + 1);
    }

    fn stmt(&mut self, stmt: &Stmt, level: usize) {
        ensure_stack(|| self.stmt_inner(stmt, level));
    }

    fn stmt_inner(&mut self, stmt: &Stmt, level: usize) {
        if let StmtKind::LocalType(decl) = &stmt.kind {
            self.type_decl(decl, level);
            return;
        }
        self.indent(level);
        match &stmt.kind {
            StmtKind::LocalVar(var) => {
                self.local_var(var, level);
                self.push(";");
            }
            StmtKind::Expr(expr) => {
                self.expr(expr, level);
                self.push(";");
            }
            StmtKind::Block(block) => self.block(block, level),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.push("if (");
                self.expr(cond, level);
                self.push(")");
                self.nested(then_branch, level);
                if let Some(else_branch) = else_branch {
                    self.newline(level);
                    self.push("else");
                    self.nested(else_branch, level);
                }
            }
            StmtKind::While { cond, body } => {
                self.push("while (");
                self.expr(cond, level);
                self.push(")");
                self.nested(body, level);
            }
            StmtKind::DoWhile { body, cond } => {
                self.push("do");
                self.nested(body, level);
                self.newline(level);
                self.push("while (");
                self.expr(cond, level);
                self.push(");");
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => {
                self.push("for (");
                self.comma_separated(init, |p, s| p.inline_stmt(s, level));
                self.push("; ");
                if let Some(cond) = cond {
                    self.expr(cond, level);
                }
                self.push("; ");
                self.comma_separated(update, |p, e| p.expr(e, level));
                self.push(")");
                self.nested(body, level);
            }
            StmtKind::ForEach {
                var,
                iterable,
                body,
            } => {
                self.push("for (");
                self.local_var(var, level);
                self.push(" : ");
                self.expr(iterable, level);
                self.push(")");
                self.nested(body, level);
            }
            StmtKind::Switch { selector, groups } => self.switch(selector, groups, level),
            StmtKind::Try {
                resources,
                body,
                catches,
                finally,
            } => {
                self.push("try ");
                if !resources.is_empty() {
                    self.push("(");
                    for (idx, resource) in resources.iter().enumerate() {
                        if idx > 0 {
                            self.push("; ");
                        }
                        match resource {
                            Resource::Decl(var) => self.local_var(var, level),
                            Resource::Expr(expr) => self.expr(expr, level),
                        }
                    }
                    self.push(") ");
                }
                self.block(body, level);
                for catch in catches {
                    self.push(" catch (");
                    for (idx, ty) in catch.types.iter().enumerate() {
                        if idx > 0 {
                            self.push(" | ");
                        }
                        self.type_ref(ty);
                    }
                    self.decl_name(&catch.name);
                    self.push(") ");
                    self.block(&catch.body, level);
                }
                if let Some(finally) = finally {
                    self.push(" finally ");
                    self.block(finally, level);
                }
            }
            StmtKind::Return(value) => {
                self.push("return");
                if let Some(value) = value {
                    self.push(" ");
                    self.expr(value, level);
                }
                self.push(";");
            }
            StmtKind::Throw(expr) => {
                self.push("throw ");
                self.expr(expr, level);
                self.push(";");
            }
            StmtKind::Yield(expr) => {
                self.push("yield ");
                self.expr(expr, level);
                self.push(";");
            }
            StmtKind::Break(label) | StmtKind::Continue(label) => {
                self.push(if matches!(stmt.kind, StmtKind::Break(_)) {
                    "break"
                } else {
                    "continue"
                });
                if let Some(label) = label {
                    self.push(" ");
                    self.push(label);
                }
                self.push(";");
            }
            StmtKind::Assert { cond, message } => {
                self.push("assert ");
                self.expr(cond, level);
                if let Some(message) = message {
                    self.push(" : ");
                    self.expr(message, level);
                }
                self.push(";");
            }
            StmtKind::Synchronized { lock, body } => {
                self.push("synchronized (");
                self.expr(lock, level);
                self.push(") ");
                self.block(body, level);
            }
            StmtKind::Labeled { label, body } => {
                self.push(label);
                self.push(":\n");
                self.stmt(body, level);
            }
            StmtKind::LocalType(_) => {}
            StmtKind::Empty => self.push(";"),
        }
    }

    /// `for` header element: a declaration or expression without the `;`.
    fn inline_stmt(&mut self, stmt: &Stmt, level: usize) {
        match &stmt.kind {
            StmtKind::LocalVar(var) => self.local_var(var, level),
            StmtKind::Expr(expr) => self.expr(expr, level),
            _ => {}
        }
    }

    fn type_ref(&mut self, ty: &TypeRef) {
        ensure_stack(|| self.type_ref_inner(ty));
    }

    fn type_ref_inner(&mut self, ty: &TypeRef) {
        match ty {
            TypeRef::Primitive { name, .. } => self.push(name),
            TypeRef::Named { segments, .. } => {
                for (idx, seg) in segments.iter().enumerate() {
                    if idx > 0 {
                        self.push(".");
                    }
                    self.push(&seg.name);
                    if let Some(args) = &seg.args {
                        self.push("<");
                        self.comma_separated(args, |p, arg| p.type_ref(arg));
                        self.push(">");
                    }
                }
            }
            TypeRef::Array { elem, dims, .. } => {
                self.type_ref(elem);
                for _ in 0..*dims {
                    self.push("[]");
                }
            }
            TypeRef::Wildcard { bound, .. } => {
                self.push("?");
                if let Some((kind, bound)) = bound {
                    self.push(match kind {
                        WildcardBoundKind::Extends => " extends ",
                        WildcardBoundKind::Super => " super ",
                    });
                    self.type_ref(bound);
                }
            }
            TypeRef::Marker(marker) => self.marker(marker),
            TypeRef::Missing => self.push("$missing$"),
        }
    }

    fn marker(&mut self, marker: &Marker) {
        self.push("<");
        self.push(marker.kind.as_str());
        self.push(":");
        match &marker.payload {
            MarkerPayload::Name { qualifier } => {
                for seg in qualifier {
                    self.push(seg);
                    self.push(".");
                }
                self.push(&marker.identifier);
            }
            MarkerPayload::Receiver(receiver) => {
                self.expr(receiver, 0);
                self.push(if marker.kind.is_reference_expression() {
                    "::"
                } else {
                    "."
                });
                self.push(&marker.identifier);
            }
            MarkerPayload::Call {
                receiver,
                name,
                args,
            } => {
                if let Some(receiver) = receiver {
                    self.expr(receiver, 0);
                    self.push(".");
                }
                self.push(name);
                self.push("(");
                self.comma_separated(args, |p, arg| p.expr(arg, 0));
                self.push(")");
            }
            MarkerPayload::Allocation { ty, args } => {
                self.push("new ");
                self.type_ref(ty);
                self.push("(");
                self.comma_separated(args, |p, arg| p.expr(arg, 0));
                self.push(")");
            }
            MarkerPayload::Type(ty) => self.type_ref(ty),
        }
        self.push(">");
    }

    fn qualifier(&mut self, qualifier: &Option<Vec<Ident>>) {
        if let Some(segments) = qualifier {
            for seg in segments {
                self.push(seg);
                self.push(".");
            }
        }
    }

    /// `level` is the indentation of the line the expression starts on; lambda
    /// and anonymous class bodies are laid out relative to it.
    fn expr(&mut self, expr: &Expr, level: usize) {
        ensure_stack(|| self.expr_inner(expr, level));
    }

    fn expr_inner(&mut self, expr: &Expr, level: usize) {
        match &expr.kind {
            ExprKind::Literal(text) => self.push(text),
            ExprKind::Name(segments) => self.push(&join_dotted(segments)),
            ExprKind::FieldAccess { receiver, name } => {
                self.expr(receiver, level);
                self.push(".");
                self.push(name);
            }
            ExprKind::Call {
                receiver,
                type_args,
                name,
                args,
            } => {
                if let Some(receiver) = receiver {
                    self.expr(receiver, level);
                    self.push(".");
                }
                if !type_args.is_empty() {
                    self.push("<");
                    self.comma_separated(type_args, |p, ty| p.type_ref(ty));
                    self.push(">");
                }
                self.push(name);
                self.push("(");
                self.comma_separated(args, |p, arg| p.expr(arg, level));
                self.push(")");
            }
            ExprKind::New {
                outer,
                ty,
                args,
                body,
            } => {
                if let Some(outer) = outer {
                    self.expr(outer, level);
                    self.push(".");
                }
                self.push("new ");
                self.type_ref(ty);
                self.push("(");
                self.comma_separated(args, |p, arg| p.expr(arg, level));
                self.push(")");
                if let Some(body) = body {
                    self.push(" {");
                    self.members(body, level + 1);
                    self.newline(level);
                    self.push("}");
                }
            }
            ExprKind::NewArray { elem, dims, init } => {
                self.push("new ");
                self.type_ref(elem);
                for dim in dims {
                    self.push("[");
                    if let Some(dim) = dim {
                        self.expr(dim, level);
                    }
                    self.push("]");
                }
                if let Some(init) = init {
                    self.array_init(init, level);
                }
            }
            ExprKind::ArrayInit(items) => self.array_init(items, level),
            ExprKind::ArrayAccess { array, index } => {
                self.expr(array, level);
                self.push("[");
                self.expr(index, level);
                self.push("]");
            }
            ExprKind::Unary { op, operand } => {
                self.push(op.as_str());
                self.expr(operand, level);
            }
            ExprKind::Postfix { op, operand } => {
                self.expr(operand, level);
                self.push(op.as_str());
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.expr(lhs, level);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(rhs, level);
            }
            ExprKind::InstanceOf {
                expr: inner,
                ty,
                binding,
            } => {
                self.expr(inner, level);
                self.push(" instanceof ");
                self.type_ref(ty);
                if let Some(binding) = binding {
                    self.push(" ");
                    self.push(binding);
                }
            }
            ExprKind::Assign { op, target, value } => {
                self.expr(target, level);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(value, level);
            }
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.expr(cond, level);
                self.push(" ? ");
                self.expr(then_expr, level);
                self.push(" : ");
                self.expr(else_expr, level);
            }
            ExprKind::Cast { ty, expr: inner } => {
                self.push("(");
                self.type_ref(ty);
                self.push(") ");
                self.expr(inner, level);
            }
            ExprKind::Paren(inner) => {
                self.push("(");
                self.expr(inner, level);
                self.push(")");
            }
            ExprKind::Lambda { params, body } => {
                self.push("(");
                self.comma_separated(params, |p, param| {
                    match &param.ty {
                        Some(ty) => p.type_ref(ty),
                        None => p.push("<no type>"),
                    }
                    p.push(" ");
                    p.push(&param.name);
                });
                self.push(") -> ");
                match body {
                    LambdaBody::Expr(body) => self.expr(body, level),
                    LambdaBody::Block(block) => self.block(block, level),
                }
            }
            ExprKind::MethodRef { receiver, name } => {
                self.expr(receiver, level);
                self.push("::");
                self.push(name);
            }
            ExprKind::This { qualifier } => {
                self.qualifier(qualifier);
                self.push("this");
            }
            ExprKind::Super { qualifier } => {
                self.qualifier(qualifier);
                self.push("super");
            }
            ExprKind::ClassLit(ty) => {
                self.type_ref(ty);
                self.push(".class");
            }
            ExprKind::TypeExpr(ty) => self.type_ref(ty),
            ExprKind::Switch { selector, groups } => self.switch(selector, groups, level),
            ExprKind::Marker(marker) => self.marker(marker),
            ExprKind::Missing => self.push("$missing$"),
        }
    }

    fn switch(&mut self, selector: &Expr, groups: &[SwitchGroup], level: usize) {
        self.push("switch (");
        self.expr(selector, level);
        self.push(") {");
        for group in groups {
            for label in &group.labels {
                self.newline(level + 1);
                match label {
                    SwitchLabel::Case(exprs) => {
                        self.push("case ");
                        self.comma_separated(exprs, |p, e| p.expr(e, level + 1));
                    }
                    SwitchLabel::Default => self.push("default"),
                }
                self.push(if group.arrow { " ->" } else { " :" });
            }
            for stmt in &group.stmts {
                self.push("\n");
                self.stmt(stmt, level + 2);
            }
        }
        self.newline(level);
        self.push("}");
    }

    fn array_init(&mut self, items: &[Expr], level: usize) {
        self.push("{");
        self.comma_separated(items, |p, item| p.expr(item, level));
        self.push("}");
    }
}
