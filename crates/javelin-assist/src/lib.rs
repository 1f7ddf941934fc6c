//! Completion and selection parsing for Java sources.
//!
//! Both entry points reparse the whole compilation unit with a recovering parser.
//! The token under the caret (or the selected identifier) is turned into a single
//! marker node, e.g. `<CompleteOnName:list.si>`:
//!
//! ```
//! use javelin_assist::parse_for_completion;
//! use javelin_syntax::ParseMode;
//!
//! let source = "class A { void f() { list.si } }";
//! let caret = source.find("si").unwrap() + 2;
//! let result = parse_for_completion(source, caret, ParseMode::Method).unwrap();
//! assert_eq!(result.marker_string(), "<CompleteOnName:list.si>");
//! assert_eq!(result.replaced_source(), Some("list.si"));
//! ```
//!
//! Parsing never fails on malformed input; recovery decisions are recorded as
//! [`javelin_syntax::ParseError`]s on the result and logged under the
//! `javelin.recovery` tracing target.

mod api;
mod builder;
mod marker;
mod parser;
mod recovery;
mod scanner;
mod scope;


pub use api::{
    parse_for_completion, parse_for_completion_with_options, parse_for_selection,
    parse_for_selection_with_options, parse_skeleton, AssistError, AssistOptions, AssistResult,
    AssistSummary, CompletionResult, SelectionResult, DEFAULT_MAX_DEPTH, NONE,
};
pub use builder::Synthesized;
pub use javelin_syntax::ast::MarkerKind;
pub use javelin_syntax::{ParseError, ParseMode, TextRange};
pub use recovery::RecoveryAction;
pub use scope::{LocalOrigin, ScopeKind, VisibleLocal};
