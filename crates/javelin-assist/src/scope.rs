use serde::Serialize;

/// Kind of a lexical frame on the scope stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    CompilationUnit,
    Type,
    Method,
    Initializer,
    Block,
    Lambda,
    Switch,
    Try,
    Catch,
}

impl ScopeKind {
    /// Frames whose contents are statements rather than declarations.
    pub fn is_code(self) -> bool {
        !matches!(self, ScopeKind::CompilationUnit | ScopeKind::Type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalOrigin {
    Parameter,
    Local,
    LambdaParameter,
    CatchParameter,
    Resource,
    PatternBinding,
}

/// A local variable in scope at the marker, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleLocal {
    pub name: String,
    /// Declared type as written, `None` for inferred lambda parameters.
    pub ty: Option<String>,
    pub origin: LocalOrigin,
    /// Frame the local was declared in.
    pub scope: ScopeKind,
}

#[derive(Debug)]
struct Frame {
    kind: ScopeKind,
    locals: Vec<VisibleLocal>,
}

/// Stack of lexical frames maintained alongside the parse.
///
/// The root `CompilationUnit` frame is never popped.
#[derive(Debug)]
pub(crate) struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        ScopeStack {
            frames: vec![Frame {
                kind: ScopeKind::CompilationUnit,
                locals: Vec::new(),
            }],
        }
    }

    pub(crate) fn push(&mut self, kind: ScopeKind) {
        self.frames.push(Frame {
            kind,
            locals: Vec::new(),
        });
    }

    pub(crate) fn pop(&mut self, kind: ScopeKind) {
        debug_assert_eq!(self.current(), kind, "unbalanced scope stack");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub(crate) fn current(&self) -> ScopeKind {
        self.frames
            .last()
            .map_or(ScopeKind::CompilationUnit, |frame| frame.kind)
    }

    pub(crate) fn declare(&mut self, name: &str, ty: Option<String>, origin: LocalOrigin) {
        if name.is_empty() {
            return;
        }
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        let scope = frame.kind;
        frame.locals.push(VisibleLocal {
            name: name.to_string(),
            ty,
            origin,
            scope,
        });
    }

    /// Locals visible from the innermost frame. Shadowed names are reported once,
    /// for the innermost declaration.
    pub(crate) fn visible_locals(&self) -> Vec<VisibleLocal> {
        let mut out: Vec<VisibleLocal> = Vec::new();
        for frame in self.frames.iter().rev() {
            for local in frame.locals.iter().rev() {
                if !out.iter().any(|seen| seen.name == local.name) {
                    out.push(local.clone());
                }
            }
        }
        out
    }
}
