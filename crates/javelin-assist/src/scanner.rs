//! Token streams for the assist parser.
//!
//! Completion cuts the stream at the caret: the identifier being typed becomes the
//! last real token (its range truncated to the caret) and nothing after the caret
//! is seen. Selection keeps the whole stream and only remembers which identifier
//! is selected.

use javelin_syntax::{Lexer, SyntaxKind, TextRange, Token};

/// Trivia-free tokens ending in `Eof`, plus the index of the focus token.
#[derive(Debug)]
pub(crate) struct AssistTokens {
    pub(crate) tokens: Vec<Token>,
    pub(crate) focus: Option<usize>,
}

pub(crate) fn completion_tokens(source: &str, caret: usize) -> AssistTokens {
    let mut tokens = Vec::new();
    let mut focus = None;

    for token in Lexer::new(source) {
        let start = token.range.start as usize;
        let end = token.range.end as usize;

        if token.kind == SyntaxKind::Eof || start >= caret {
            // The caret sits between tokens: complete on an empty identifier.
            focus = Some(tokens.len());
            tokens.push(Token::new(SyntaxKind::Identifier, TextRange::empty(caret)));
            break;
        }
        if end < caret {
            if !token.kind.is_trivia() {
                tokens.push(token);
            }
            continue;
        }

        // start < caret <= end
        match token.kind {
            kind if kind.is_identifier_like() || kind.is_keyword() => {
                focus = Some(tokens.len());
                tokens.push(Token::new(SyntaxKind::Identifier, TextRange::new(start, caret)));
                break;
            }
            SyntaxKind::Whitespace => {
                if end == caret {
                    continue;
                }
                focus = Some(tokens.len());
                tokens.push(Token::new(SyntaxKind::Identifier, TextRange::empty(caret)));
                break;
            }
            SyntaxKind::BlockComment | SyntaxKind::DocComment
                if end == caret && is_closed_comment(token.text(source)) =>
            {
                continue;
            }
            // Inside a comment or an unterminated literal: nothing to complete.
            SyntaxKind::LineComment
            | SyntaxKind::BlockComment
            | SyntaxKind::DocComment
            | SyntaxKind::Error => break,
            _ if end == caret => tokens.push(token),
            // The caret splits a literal or an operator.
            _ => break,
        }
    }

    tokens.push(Token::new(SyntaxKind::Eof, TextRange::empty(caret)));
    AssistTokens { tokens, focus }
}

fn is_closed_comment(text: &str) -> bool {
    text.len() >= 4 && text.ends_with("*/")
}

pub(crate) fn selection_tokens(source: &str, start: usize, end: usize) -> AssistTokens {
    let (start, end) = trim_selection(source, start, end);
    let mut tokens = Vec::new();
    let mut focus = None;

    for token in Lexer::new(source) {
        if token.kind.is_trivia() {
            continue;
        }
        let tok_start = token.range.start as usize;
        let tok_end = token.range.end as usize;
        if focus.is_none()
            && token.kind.is_identifier_like()
            && tok_start <= start
            && end <= tok_end
        {
            focus = Some(tokens.len());
        }
        tokens.push(token);
    }

    AssistTokens { tokens, focus }
}

/// The whole stream with no focus, for skeleton dumps.
pub(crate) fn source_tokens(source: &str) -> AssistTokens {
    let tokens = Lexer::new(source)
        .filter(|token| !token.kind.is_trivia())
        .collect();
    AssistTokens {
        tokens,
        focus: None,
    }
}

/// Drop surrounding whitespace from a non-empty selection.
fn trim_selection(source: &str, start: usize, end: usize) -> (usize, usize) {
    if start == end {
        return (start, end);
    }
    let selected = &source[start..end];
    let trimmed_start = selected.trim_start();
    let new_start = start + (selected.len() - trimmed_start.len());
    let new_end = new_start + trimmed_start.trim_end().len();
    if new_start == new_end {
        return (start, end);
    }
    (new_start, new_end)
}
