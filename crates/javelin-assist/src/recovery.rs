//! Error-recovery decisions.
//!
//! Every action either consumes at least one token or closes a construct, so the
//! parse always terminates.

use javelin_syntax::SyntaxKind;
use serde::Serialize;

use crate::scope::ScopeKind;

/// What the parser was looking for when it hit an unexpected token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expected {
    Token(SyntaxKind),
    Statement,
    Member,
    TypeDecl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Pretend the expected token was present. Used at end of input and in
    /// front of a closing delimiter.
    InsertVirtualToken,
    /// Skip tokens up to the next synchronization point for the context.
    DiscardToSync,
    /// Close the enclosing method-level constructs and resume at class-body level.
    CloseAndPromote,
}

pub(crate) fn decide(expected: Expected, found: SyntaxKind, scope: ScopeKind) -> RecoveryAction {
    if found == SyntaxKind::Eof {
        return RecoveryAction::InsertVirtualToken;
    }
    if scope.is_code() && found.is_member_only_keyword() {
        return RecoveryAction::CloseAndPromote;
    }
    match expected {
        Expected::Token(kind) => {
            if is_closing_delimiter(found) && found != kind {
                RecoveryAction::InsertVirtualToken
            } else if kind == SyntaxKind::Semicolon {
                if found.is_statement_keyword() || found == SyntaxKind::LBrace {
                    RecoveryAction::InsertVirtualToken
                } else {
                    RecoveryAction::DiscardToSync
                }
            } else {
                RecoveryAction::InsertVirtualToken
            }
        }
        Expected::Statement | Expected::Member | Expected::TypeDecl => {
            RecoveryAction::DiscardToSync
        }
    }
}

pub(crate) fn is_closing_delimiter(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::RBrace | SyntaxKind::RParen | SyntaxKind::RBracket
    )
}

/// Tokens at which discarding stops without consuming the token. A `;` is
/// consumed and ends the discard (see `Parser::discard_to_sync`).
pub(crate) fn is_sync_point(expected: Expected, kind: SyntaxKind) -> bool {
    match expected {
        Expected::Token(_) | Expected::Statement => {
            kind == SyntaxKind::RBrace
                || kind == SyntaxKind::LBrace
                || kind.is_statement_keyword()
                || kind.is_member_only_keyword()
        }
        Expected::Member => {
            kind == SyntaxKind::RBrace
                || kind.is_modifier_keyword()
                || kind.is_primitive_type()
                || matches!(
                    kind,
                    SyntaxKind::ClassKw
                        | SyntaxKind::InterfaceKw
                        | SyntaxKind::EnumKw
                        | SyntaxKind::VoidKw
                        | SyntaxKind::At
                        | SyntaxKind::Less
                )
        }
        Expected::TypeDecl => {
            kind.is_modifier_keyword()
                || matches!(
                    kind,
                    SyntaxKind::PackageKw
                        | SyntaxKind::ImportKw
                        | SyntaxKind::ClassKw
                        | SyntaxKind::InterfaceKw
                        | SyntaxKind::EnumKw
                        | SyntaxKind::RecordKw
                        | SyntaxKind::At
                )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_input_always_inserts() {
        for expected in [
            Expected::Token(SyntaxKind::RBrace),
            Expected::Statement,
            Expected::Member,
            Expected::TypeDecl,
        ] {
            assert_eq!(
                decide(expected, SyntaxKind::Eof, ScopeKind::Block),
                RecoveryAction::InsertVirtualToken
            );
        }
    }

    #[test]
    fn member_keyword_in_body_promotes() {
        assert_eq!(
            decide(Expected::Statement, SyntaxKind::PublicKw, ScopeKind::Method),
            RecoveryAction::CloseAndPromote
        );
        assert_eq!(
            decide(Expected::Member, SyntaxKind::PublicKw, ScopeKind::Type),
            RecoveryAction::DiscardToSync
        );
    }

    #[test]
    fn closing_delimiter_gets_virtual_token() {
        assert_eq!(
            decide(
                Expected::Token(SyntaxKind::Semicolon),
                SyntaxKind::RBrace,
                ScopeKind::Block
            ),
            RecoveryAction::InsertVirtualToken
        );
        assert_eq!(
            decide(
                Expected::Token(SyntaxKind::Semicolon),
                SyntaxKind::Identifier,
                ScopeKind::Block
            ),
            RecoveryAction::DiscardToSync
        );
    }
}
