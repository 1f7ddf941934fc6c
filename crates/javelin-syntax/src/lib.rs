//! Syntax primitives shared by the Javelin assist parser.
//!
//! This crate provides:
//! - [`lex`] / [`Lexer`]: a Java tokenizer that can restart from any byte offset.
//! - [`ast`]: an owned syntax tree whose nodes may carry a completion or selection
//!   [`ast::Marker`].
//! - [`print_unit`] and friends: the canonical display form used by clients and tests.

pub mod ast;
mod lexer;
mod printer;
mod stack;
mod syntax_kind;

pub use lexer::{lex, Lexer, Token};
pub use printer::{
    print_expr, print_field, print_marker, print_parent, print_stmt, print_type, print_unit,
};
pub use stack::ensure_stack;
pub use syntax_kind::{SyntaxKind, KEYWORDS};

use serde::{Deserialize, Serialize};

/// A half-open byte range within a source file (`start..end`).
///
/// Nodes invented during recovery carry [`TextRange::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    /// Sentinel for nodes that have no source text.
    pub const NONE: TextRange = TextRange {
        start: u32::MAX,
        end: u32::MAX,
    };

    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    #[inline]
    pub fn empty(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn contains(self, other: TextRange) -> bool {
        !self.is_none() && !other.is_none() && self.start <= other.start && other.end <= self.end
    }

    /// Smallest range covering both; `NONE` ranges are ignored.
    pub fn cover(self, other: TextRange) -> TextRange {
        match (self.is_none(), other.is_none()) {
            (true, _) => other,
            (_, true) => self,
            _ => TextRange {
                start: self.start.min(other.start),
                end: self.end.max(other.end),
            },
        }
    }

    pub fn as_usize(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl Default for TextRange {
    fn default() -> Self {
        TextRange::NONE
    }
}

/// A recoverable syntax error. The assist parser records these and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

/// How much of a compilation unit the assist parser looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Skip every method and initializer body by brace matching. Field initializers
    /// are still parsed.
    #[default]
    Diet,
    /// Like `Diet`, but the body containing the focus offset is parsed in full.
    Method,
}

impl std::str::FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diet" => Ok(ParseMode::Diet),
            "method" => Ok(ParseMode::Method),
            other => Err(format!("unknown parse mode `{other}` (expected `diet` or `method`)")),
        }
    }
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ParseMode::Diet => "diet",
            ParseMode::Method => "method",
        })
    }
}

#[cfg(test)]
mod tests;
