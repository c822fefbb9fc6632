//! Compile-time errors.
//!
//! Everything that can go wrong happens before a [`Template`](crate::Template)
//! exists: an unclosed tag in the lexer, or a malformed block structure in
//! the parser. Rendering itself never fails.
//!
//! Errors carry byte spans as miette labels but not the source text, so a
//! caller that wants a rich report attaches it:
//!
//! ```ignore
//! let err = Template::compile(src).unwrap_err();
//! let report = miette::Report::new(err).with_source_code(src.to_string());
//! ```

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub type Result<T, E = TemplateError> = std::result::Result<T, E>;

/// All template errors
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnclosedTag(#[from] UnclosedTagError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

impl TemplateError {
    /// Byte offset in the template source where the problem starts.
    pub fn offset(&self) -> usize {
        match self {
            TemplateError::UnclosedTag(e) => e.offset,
            TemplateError::Parse(e) => e.span().offset(),
        }
    }
}

/// A `{{` or `{{{` opener with no matching closer.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("Unclosed {kind} at position {offset}")]
#[diagnostic(
    code(shimmybars::syntax::unclosed),
    help("Add `{close_delim}` to close this {kind}")
)]
pub struct UnclosedTagError {
    /// `"tag"` or `"triple-stash tag"`
    pub kind: &'static str,
    /// The closing delimiter that was never found
    pub close_delim: &'static str,
    /// Byte offset of the opener
    pub offset: usize,
    #[label("opened here")]
    pub span: SourceSpan,
}

impl UnclosedTagError {
    pub(crate) fn tag(offset: usize) -> Self {
        Self {
            kind: "tag",
            close_delim: "}}",
            offset,
            span: (offset, 2).into(),
        }
    }

    pub(crate) fn triple_stash(offset: usize) -> Self {
        Self {
            kind: "triple-stash tag",
            close_delim: "}}}",
            offset,
            span: (offset, 3).into(),
        }
    }
}

/// Structural errors found while building the tree.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A token that cannot start a statement, e.g. a `{{/each}}` that closes
    /// nothing or closes the wrong block.
    #[error("Unexpected {found}")]
    #[diagnostic(code(shimmybars::parse::unexpected))]
    UnexpectedToken {
        found: String,
        #[label("not expected here")]
        span: SourceSpan,
    },

    #[error("Unclosed block `{block}`")]
    #[diagnostic(
        code(shimmybars::parse::unclosed_block),
        help("Add `{{{{/{block}}}}}` to close this block")
    )]
    UnclosedBlock {
        block: String,
        #[label("opened here")]
        span: SourceSpan,
    },

    #[error("Unknown block `{block}`")]
    #[diagnostic(
        code(shimmybars::parse::unknown_block),
        help("Supported blocks: if, each")
    )]
    UnknownBlock {
        block: String,
        #[label("unknown block")]
        span: SourceSpan,
    },

    #[error("Blocks nested deeper than {limit}")]
    #[diagnostic(code(shimmybars::parse::too_deep))]
    TooDeep {
        limit: usize,
        #[label("limit exceeded here")]
        span: SourceSpan,
    },
}

impl ParseError {
    pub fn span(&self) -> SourceSpan {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnclosedBlock { span, .. }
            | ParseError::UnknownBlock { span, .. }
            | ParseError::TooDeep { span, .. } => *span,
        }
    }
}
