use javelin_syntax::ast::{find_marker, find_marker_parent, CompilationUnit, MarkerKind};
use javelin_syntax::{print_marker, print_parent, print_unit, ParseError, ParseMode, TextRange};
use serde::Serialize;
use thiserror::Error;

use crate::builder::Synthesized;
use crate::marker::{AssistKind, PlacedMarker};
use crate::parser::{self, ParseConfig, ParseOutput};
use crate::scanner;
use crate::scope::{ScopeKind, VisibleLocal};

/// Placeholder printed when there is no marker or no parent.
pub const NONE: &str = "<NONE>";

pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssistOptions {
    /// Body handling for completion. Selection always parses the body holding
    /// the selection.
    pub mode: ParseMode,
    /// Nesting limit for statements and expressions.
    pub max_depth: usize,
}

impl Default for AssistOptions {
    fn default() -> Self {
        AssistOptions {
            mode: ParseMode::Diet,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssistError {
    #[error("offset {offset} is past the end of the source ({len} bytes)")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("offset {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },
    #[error("selection start {start} is after its end {end}")]
    InvertedSelection { start: usize, end: usize },
    #[error("source of {len} bytes is too large")]
    SourceTooLarge { len: usize },
}

/// Outcome of one completion or selection parse.
#[derive(Debug, Clone)]
pub struct AssistResult {
    unit: CompilationUnit,
    placed: Option<PlacedMarker>,
    replaced_source: Option<String>,
    errors: Vec<ParseError>,
    synthesized: Synthesized,
}

pub type CompletionResult = AssistResult;
pub type SelectionResult = AssistResult;

impl AssistResult {
    fn new(source: &str, output: ParseOutput) -> Self {
        let replaced_source = output.placed.as_ref().and_then(|placed| {
            source
                .get(placed.replaced.as_usize())
                .map(str::to_owned)
        });
        AssistResult {
            unit: output.unit,
            placed: output.placed,
            replaced_source,
            errors: output.errors,
            synthesized: output.synthesized,
        }
    }

    /// The marker in display form, e.g. `<CompleteOnName:a.b>`, or `<NONE>`.
    pub fn marker_string(&self) -> String {
        find_marker(&self.unit).map_or_else(|| NONE.to_owned(), print_marker)
    }

    /// The node directly enclosing the marker in display form, or `<NONE>`.
    pub fn parent_string(&self) -> String {
        find_marker_parent(&self.unit).map_or_else(|| NONE.to_owned(), print_parent)
    }

    /// The whole recovered compilation unit in display form.
    pub fn unit_string(&self) -> String {
        print_unit(&self.unit)
    }

    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    pub fn marker_kind(&self) -> Option<MarkerKind> {
        self.placed.as_ref().map(|placed| placed.kind)
    }

    /// Text typed before the caret (completion) or the selected identifier.
    pub fn identifier(&self) -> Option<&str> {
        self.placed.as_ref().map(|placed| placed.identifier.as_str())
    }

    /// Source range a completion proposal replaces, or the selected identifier.
    pub fn replaced_range(&self) -> Option<TextRange> {
        self.placed.as_ref().map(|placed| placed.replaced)
    }

    pub fn replaced_source(&self) -> Option<&str> {
        self.replaced_source.as_deref()
    }

    /// Innermost lexical frame at the marker.
    pub fn scope(&self) -> Option<ScopeKind> {
        self.placed.as_ref().map(|placed| placed.scope)
    }

    /// Locals in scope at the marker, innermost first.
    pub fn visible_locals(&self) -> &[VisibleLocal] {
        self.placed
            .as_ref()
            .map_or(&[], |placed| placed.visible_locals.as_slice())
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn synthesized(&self) -> &Synthesized {
        &self.synthesized
    }

    pub fn summary(&self) -> AssistSummary {
        AssistSummary {
            marker: self.marker_string(),
            parent: self.parent_string(),
            unit: self.unit_string(),
            identifier: self.identifier().map(str::to_owned),
            replaced: self.replaced_range(),
            replaced_source: self.replaced_source.clone(),
            scope: self.scope(),
            visible_locals: self.visible_locals().to_vec(),
            errors: self.errors.clone(),
            synthesized: self.synthesized.clone(),
        }
    }
}

/// Serializable view of an [`AssistResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistSummary {
    pub marker: String,
    pub parent: String,
    pub unit: String,
    pub identifier: Option<String>,
    pub replaced: Option<TextRange>,
    pub replaced_source: Option<String>,
    pub scope: Option<ScopeKind>,
    pub visible_locals: Vec<VisibleLocal>,
    pub errors: Vec<ParseError>,
    pub synthesized: Synthesized,
}

fn check_source(source: &str) -> Result<(), AssistError> {
    if source.len() >= u32::MAX as usize {
        return Err(AssistError::SourceTooLarge { len: source.len() });
    }
    Ok(())
}

fn check_offset(source: &str, offset: usize) -> Result<(), AssistError> {
    if offset > source.len() {
        return Err(AssistError::OffsetOutOfBounds {
            offset,
            len: source.len(),
        });
    }
    if !source.is_char_boundary(offset) {
        return Err(AssistError::NotCharBoundary { offset });
    }
    Ok(())
}

/// Parse `source` for completion at `caret` (a byte offset).
pub fn parse_for_completion(
    source: &str,
    caret: usize,
    mode: ParseMode,
) -> Result<CompletionResult, AssistError> {
    let options = AssistOptions {
        mode,
        ..AssistOptions::default()
    };
    parse_for_completion_with_options(source, caret, options)
}

pub fn parse_for_completion_with_options(
    source: &str,
    caret: usize,
    options: AssistOptions,
) -> Result<CompletionResult, AssistError> {
    check_source(source)?;
    check_offset(source, caret)?;
    let _span = tracing::debug_span!(
        target: "javelin.assist",
        "parse_for_completion",
        caret,
        mode = %options.mode
    )
    .entered();

    let tokens = scanner::completion_tokens(source, caret);
    let output = parser::parse(
        source,
        tokens,
        ParseConfig {
            assist: AssistKind::Completion,
            mode: options.mode,
            focus_offset: caret,
            max_depth: options.max_depth,
        },
    );
    let result = AssistResult::new(source, output);
    tracing::debug!(
        target: "javelin.assist",
        marker = ?result.marker_kind(),
        errors = result.errors.len(),
        "completion parse done"
    );
    Ok(result)
}

/// Diet-parse `source` without a caret: the declaration skeleton with every
/// method and initializer body skipped.
pub fn parse_skeleton(source: &str, options: AssistOptions) -> Result<AssistResult, AssistError> {
    check_source(source)?;
    let _span = tracing::debug_span!(target: "javelin.assist", "parse_skeleton").entered();

    let output = parser::parse(
        source,
        scanner::source_tokens(source),
        ParseConfig {
            assist: AssistKind::Completion,
            mode: ParseMode::Diet,
            focus_offset: source.len(),
            max_depth: options.max_depth,
        },
    );
    Ok(AssistResult::new(source, output))
}

/// Parse `source` for selection of the identifier in `start..end`.
pub fn parse_for_selection(
    source: &str,
    start: usize,
    end: usize,
) -> Result<SelectionResult, AssistError> {
    parse_for_selection_with_options(source, start, end, AssistOptions::default())
}

pub fn parse_for_selection_with_options(
    source: &str,
    start: usize,
    end: usize,
    options: AssistOptions,
) -> Result<SelectionResult, AssistError> {
    check_source(source)?;
    check_offset(source, start)?;
    check_offset(source, end)?;
    if start > end {
        return Err(AssistError::InvertedSelection { start, end });
    }
    let _span =
        tracing::debug_span!(target: "javelin.assist", "parse_for_selection", start, end).entered();

    let tokens = scanner::selection_tokens(source, start, end);
    let focus_offset = tokens
        .focus
        .map_or(start, |idx| tokens.tokens[idx].range.end as usize);
    let output = parser::parse(
        source,
        tokens,
        ParseConfig {
            assist: AssistKind::Selection,
            mode: ParseMode::Method,
            focus_offset,
            max_depth: options.max_depth,
        },
    );
    let result = AssistResult::new(source, output);
    tracing::debug!(
        target: "javelin.assist",
        marker = ?result.marker_kind(),
        errors = result.errors.len(),
        "selection parse done"
    );
    Ok(result)
}
