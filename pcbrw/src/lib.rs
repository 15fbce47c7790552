#![doc = include_str!("lib.md")]

use core::fmt::{Display, Formatter};
use std::error;

pub mod board;
pub mod element;
pub mod parse;
pub mod plugin;
pub mod primitives;
pub mod source;
pub mod testing;
pub mod token;
pub mod write;

pub use crate::board::Board;
pub use crate::element::Element;
pub use crate::parse::Parser;
pub use crate::plugin::Plugin;
pub use crate::source::Origin;

// error handling
// ----

/// The classification of a [`PcbError`].
///
/// One flat set of kinds is shared by every layer of the library, from the
/// byte source up to the plugin driver. The three `Argument*` kinds describe
/// caller mistakes (a value out of range, a token of the wrong shape) and
/// never cross a public boundary unchanged; see [`ErrorKind::rethrown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A bug inside the library or its caller, rethrown across a boundary.
    Internal,
    /// An internal invariant did not hold.
    Assertion,
    /// A numeric value fell below its permitted range.
    Underflow,
    /// A numeric value exceeded its permitted range.
    Overflow,
    /// The element nesting depth cap was exceeded.
    Recursion,
    /// An operation on the underlying byte stream failed.
    Io,
    /// The end of the input was reached.
    Eof,
    /// A statement ended where a value was expected.
    EndOfStatement,
    /// An element ended where a value was expected.
    EndOfElement,
    /// The input ended in the middle of a token, statement or element.
    Truncated,
    /// The input violates the element grammar.
    Syntax,
    /// An operation was attempted in the wrong life-cycle state.
    InvalidState,
    /// An argument was outside its permitted range.
    ArgumentRange,
    /// An argument had the wrong shape for its type.
    ArgumentFormat,
    /// An argument was missing a required part.
    ArgumentIncomplete,
    /// The plugin input file was not given or could not be opened.
    InputMissing,
    /// The plugin input file could not be parsed.
    InputSyntax,
    /// A required plugin command line flag was not given.
    FlagsMissing,
    /// A plugin command line flag could not be parsed.
    FlagsSyntax,
}

impl ErrorKind {
    /// Short lower-case name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Internal => "internal",
            ErrorKind::Assertion => "assertion",
            ErrorKind::Underflow => "underflow",
            ErrorKind::Overflow => "overflow",
            ErrorKind::Recursion => "recursion",
            ErrorKind::Io => "input/output",
            ErrorKind::Eof => "end of file",
            ErrorKind::EndOfStatement => "end of statement",
            ErrorKind::EndOfElement => "end of element",
            ErrorKind::Truncated => "truncated",
            ErrorKind::Syntax => "syntax",
            ErrorKind::InvalidState => "state invalid",
            ErrorKind::ArgumentRange => "argument range",
            ErrorKind::ArgumentFormat => "argument format",
            ErrorKind::ArgumentIncomplete => "argument incomplete",
            ErrorKind::InputMissing => "plugin input missing",
            ErrorKind::InputSyntax => "plugin input syntax",
            ErrorKind::FlagsMissing => "plugin flags missing",
            ErrorKind::FlagsSyntax => "plugin flags syntax",
        }
    }

    /// The kind an error reports once it crosses a public boundary.
    ///
    /// Argument-shape kinds describe a bug in the calling code, not bad
    /// input; letting them escape unchanged would blur that line, so they
    /// surface as [`ErrorKind::Internal`]. Every other kind crosses as is.
    pub fn rethrown(self) -> ErrorKind {
        match self {
            ErrorKind::ArgumentRange
            | ErrorKind::ArgumentFormat
            | ErrorKind::ArgumentIncomplete => ErrorKind::Internal,
            ErrorKind::Internal
            | ErrorKind::Assertion
            | ErrorKind::Underflow
            | ErrorKind::Overflow
            | ErrorKind::Recursion
            | ErrorKind::Io
            | ErrorKind::Eof
            | ErrorKind::EndOfStatement
            | ErrorKind::EndOfElement
            | ErrorKind::Truncated
            | ErrorKind::Syntax
            | ErrorKind::InvalidState
            | ErrorKind::InputMissing
            | ErrorKind::InputSyntax
            | ErrorKind::FlagsMissing
            | ErrorKind::FlagsSyntax => self,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any error produced by this library.
///
/// Carries the [`ErrorKind`] classification, an optional position in the
/// input being parsed, and a context message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcbError {
    kind: ErrorKind,
    origin: Option<Origin>,
    source_name: Option<String>,
    context: String,
}

impl PcbError {
    /// Creates an error without an input position.
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> PcbError {
        PcbError {
            kind,
            origin: None,
            source_name: None,
            context: context.into(),
        }
    }

    /// Creates an error pointing at a position in the input.
    pub fn at(kind: ErrorKind, origin: Origin, context: impl Into<String>) -> PcbError {
        PcbError {
            kind,
            origin: Some(origin),
            source_name: None,
            context: context.into(),
        }
    }

    /// The error classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The input position this error points at, if any.
    pub fn origin(&self) -> Option<Origin> {
        self.origin
    }

    /// The name of the input (usually a file path) this error points at.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// The context message.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Attaches the name of the input the error occurred in, unless one is
    /// already recorded.
    #[must_use]
    pub fn in_source(mut self, name: Option<&str>) -> PcbError {
        if self.source_name.is_none() {
            self.source_name = name.map(str::to_owned);
        }
        self
    }

    /// Applies the boundary [rethrow policy](ErrorKind::rethrown) to this
    /// error, keeping origin and context.
    #[must_use]
    pub fn rethrow(mut self) -> PcbError {
        self.kind = self.kind.rethrown();
        self
    }
}

impl Display for PcbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} error", self.kind)?;
        match (&self.source_name, self.origin) {
            (Some(name), Some(origin)) => write!(f, " [{name}:{origin}]")?,
            (Some(name), None) => write!(f, " [{name}]")?,
            (None, Some(origin)) => write!(f, " [{origin}]")?,
            (None, None) => {}
        }
        if !self.context.is_empty() {
            write!(f, ": {}", self.context)?;
        }
        Ok(())
    }
}

impl error::Error for PcbError {}

impl From<std::io::Error> for PcbError {
    fn from(err: std::io::Error) -> Self {
        PcbError::new(ErrorKind::Io, err.to_string())
    }
}
