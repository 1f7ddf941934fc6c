//! Declarations the parser invents while reducing: default constructors,
//! `<clinit>`, the keyword import wrapper and anonymous recovery blocks.

use javelin_syntax::ast::{
    Block, DeclKind, ImportDecl, Marker, Member, MethodDecl, MethodKind, Modifier, Modifiers,
    NameOrMarker, Stmt, StmtKind, TypeDecl,
};
use javelin_syntax::TextRange;
use serde::Serialize;

/// Counts of recovery synthesis performed during one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Synthesized {
    pub default_constructors: u32,
    pub clinits: u32,
    /// A bare top-level keyword fragment was wrapped as an import.
    pub keyword_import: bool,
    /// Unclosed `switch`/`try` statements turned into plain blocks.
    pub anonymous_blocks: u32,
    pub virtual_tokens: u32,
    pub discarded_tokens: u32,
    /// Method-level constructs closed so a member keyword could start a new member.
    pub promotions: u32,
}

/// Finish a type declaration once its body has been reduced.
pub(crate) fn complete_type(decl: &mut TypeDecl, synthesized: &mut Synthesized) {
    let needs_constructor = matches!(decl.kind, DeclKind::Class | DeclKind::Enum)
        && decl.constructors().next().is_none();

    let has_static_state = decl.members.iter().any(|member| match member {
        Member::Field(field) => field.modifiers.contains(Modifier::Static),
        Member::Initializer(init) => init.is_static,
        _ => false,
    });
    let needs_clinit = match decl.kind {
        DeclKind::Enum => true,
        DeclKind::Interface | DeclKind::Annotation => decl.fields().next().is_some(),
        DeclKind::Class | DeclKind::Record => has_static_state,
    };

    if needs_constructor {
        let keywords = if decl.kind == DeclKind::Enum {
            vec![Modifier::Private]
        } else {
            decl.modifiers.visibility().into_iter().collect()
        };
        let ctor = synthetic_method(MethodKind::Constructor, decl.name.clone(), keywords);
        decl.members.insert(0, Member::Method(ctor));
        synthesized.default_constructors += 1;
    }
    if needs_clinit {
        let clinit = synthetic_method(MethodKind::ClassInit, "<clinit>".into(), Vec::new());
        decl.members.insert(0, Member::Method(clinit));
        synthesized.clinits += 1;
    }
}

fn synthetic_method(kind: MethodKind, name: smol_str::SmolStr, keywords: Vec<Modifier>) -> MethodDecl {
    MethodDecl {
        kind,
        modifiers: Modifiers {
            keywords,
            ..Modifiers::default()
        },
        type_params: Vec::new(),
        return_ty: None,
        name,
        params: Vec::new(),
        throws: Vec::new(),
        default_value: None,
        body: Some(Block::default()),
        range: TextRange::NONE,
    }
}

/// A keyword fragment typed where a top-level declaration should start.
pub(crate) fn keyword_import(marker: Marker, synthesized: &mut Synthesized) -> ImportDecl {
    synthesized.keyword_import = true;
    ImportDecl {
        is_static: false,
        name: NameOrMarker::Marker(marker),
        on_demand: false,
        range: TextRange::NONE,
    }
}

/// Replacement for a `switch` or `try` that cannot be closed.
pub(crate) fn anonymous_block(stmts: Vec<Stmt>, synthesized: &mut Synthesized) -> Stmt {
    synthesized.anonymous_blocks += 1;
    Stmt {
        kind: StmtKind::Block(Block {
            stmts,
            skipped: false,
            range: TextRange::NONE,
        }),
        range: TextRange::NONE,
    }
}
