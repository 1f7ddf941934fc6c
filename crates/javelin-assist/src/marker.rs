//! Placement of the single completion or selection marker.

use javelin_syntax::ast::{Marker, MarkerKind, MarkerPayload};
use javelin_syntax::TextRange;
use smol_str::SmolStr;

use crate::scope::{ScopeKind, ScopeStack, VisibleLocal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssistKind {
    Completion,
    Selection,
}

/// Grammar position in which the focus token was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// Start of a top-level declaration, or a class header slot.
    Keyword,
    Package,
    Import,
    Type,
    /// A type that must be a `Throwable`: `throws`, `catch (`, `throw new`.
    Exception,
    Name,
    MemberAccess,
    ReferenceExpression,
    MessageSend,
    Allocation,
    FieldName,
    LocalName,
    ArgumentName,
}

/// Recorded when the marker is placed.
#[derive(Debug, Clone)]
pub(crate) struct PlacedMarker {
    pub(crate) kind: MarkerKind,
    pub(crate) identifier: SmolStr,
    pub(crate) replaced: TextRange,
    pub(crate) scope: ScopeKind,
    pub(crate) visible_locals: Vec<VisibleLocal>,
}

/// Decides whether the token under the parser becomes the marker, and of
/// which kind. At most one marker is placed per parse.
pub(crate) struct MarkerInjector {
    assist: AssistKind,
    focus: Option<usize>,
    placed: Option<PlacedMarker>,
}

impl MarkerInjector {
    pub(crate) fn new(assist: AssistKind, focus: Option<usize>) -> Self {
        MarkerInjector {
            assist,
            focus,
            placed: None,
        }
    }

    pub(crate) fn assist(&self) -> AssistKind {
        self.assist
    }

    /// Whether the token at `index` is the focus token and no marker exists yet.
    pub(crate) fn is_focus(&self, index: usize) -> bool {
        self.placed.is_none() && self.focus == Some(index)
    }

    pub(crate) fn is_placed(&self) -> bool {
        self.placed.is_some()
    }

    pub(crate) fn kind_for(&self, position: Position) -> Option<MarkerKind> {
        use MarkerKind::*;
        match self.assist {
            AssistKind::Completion => Some(match position {
                Position::Keyword => CompleteOnKeyword,
                Position::Package => CompleteOnPackage,
                Position::Import => CompleteOnImport,
                Position::Type => CompleteOnType,
                Position::Exception => CompleteOnException,
                Position::Name => CompleteOnName,
                Position::MemberAccess => CompleteOnMemberAccess,
                Position::ReferenceExpression => CompletionOnReferenceExpressionName,
                Position::MessageSend => CompleteOnMessageSend,
                Position::Allocation => CompleteOnAllocationExpression,
                Position::FieldName => CompleteOnFieldName,
                Position::LocalName => CompleteOnLocalName,
                Position::ArgumentName => CompleteOnArgumentName,
            }),
            AssistKind::Selection => match position {
                Position::Type | Position::Exception => Some(SelectOnType),
                Position::Name => Some(SelectOnName),
                Position::MemberAccess => Some(SelectOnFieldReference),
                Position::ReferenceExpression => Some(SelectOnReferenceExpressionName),
                Position::MessageSend => Some(SelectOnMessageSend),
                Position::Allocation => Some(SelectOnAllocationExpression),
                Position::Keyword
                | Position::Package
                | Position::Import
                | Position::FieldName
                | Position::LocalName
                | Position::ArgumentName => None,
            },
        }
    }

    /// Build the marker for `position`. Returns `None` when a marker already
    /// exists or when this assist has no marker for the position.
    pub(crate) fn place(
        &mut self,
        position: Position,
        payload: MarkerPayload,
        identifier: &str,
        range: TextRange,
        replaced: TextRange,
        scopes: &ScopeStack,
    ) -> Option<Marker> {
        if self.placed.is_some() {
            return None;
        }
        let kind = self.kind_for(position)?;
        let identifier = SmolStr::new(identifier);
        tracing::trace!(
            target: "javelin.marker",
            kind = kind.as_str(),
            identifier = %identifier,
            start = replaced.start,
            end = replaced.end,
            "placed marker"
        );
        self.placed = Some(PlacedMarker {
            kind,
            identifier: identifier.clone(),
            replaced,
            scope: scopes.current(),
            visible_locals: scopes.visible_locals(),
        });
        Some(Marker {
            kind,
            payload,
            identifier,
            range,
        })
    }

    pub(crate) fn into_placed(self) -> Option<PlacedMarker> {
        self.placed
    }
}
