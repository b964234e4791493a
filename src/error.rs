//! Error types for the PostScript library.
//!
//! PostScript programs fail with one of a fixed set of named error kinds
//! (`typecheck`, `stackunderflow`, ...). Those kinds are part of the language:
//! programs can install handlers for them in `errordict`, and callers of the
//! library observe the kind of whatever error finally escaped.

/// Result type alias for PostScript library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can escape to callers of the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A PostScript error that was not handled by `errordict`.
    #[error("{0}")]
    Interpreter(#[from] PostScriptError),

    /// IO error while reading input.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a kinded `invalidfont` error.
    pub fn invalid_font(message: impl Into<String>) -> Self {
        Error::Interpreter(PostScriptError::new(ErrorKind::InvalidFont, message))
    }

    /// The PostScript error kind, if this is a kinded error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Interpreter(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// A kinded PostScript error: one of the standard error names plus a
/// human-readable message naming at least the operator that raised it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PostScriptError {
    /// The standard error name.
    pub kind: ErrorKind,
    /// Human-readable context, e.g. `"div: division by zero"`.
    pub message: String,
}

impl PostScriptError {
    /// Create a new kinded error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        PostScriptError {
            kind,
            message: message.into(),
        }
    }
}

/// The standard PostScript error names.
///
/// `Display` renders the spelling used as a key in `errordict`: all lower
/// case except `VMerror`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // the names are the documentation
pub enum ErrorKind {
    ConfigurationError,
    DictFull,
    DictStackOverflow,
    DictStackUnderflow,
    ExecStackOverflow,
    HandleError,
    Interrupt,
    InvalidAccess,
    InvalidExit,
    InvalidFileAccess,
    InvalidFont,
    InvalidRestore,
    IoError,
    LimitCheck,
    NoCurrentPoint,
    RangeCheck,
    StackOverflow,
    StackUnderflow,
    SyntaxError,
    Timeout,
    TypeCheck,
    Undefined,
    UndefinedFilename,
    UndefinedResource,
    UndefinedResult,
    UnmatchedMark,
    Unregistered,
    VmError,
}

impl ErrorKind {
    /// The `errordict` key for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::ConfigurationError => "configurationerror",
            ErrorKind::DictFull => "dictfull",
            ErrorKind::DictStackOverflow => "dictstackoverflow",
            ErrorKind::DictStackUnderflow => "dictstackunderflow",
            ErrorKind::ExecStackOverflow => "execstackoverflow",
            ErrorKind::HandleError => "handleerror",
            ErrorKind::Interrupt => "interrupt",
            ErrorKind::InvalidAccess => "invalidaccess",
            ErrorKind::InvalidExit => "invalidexit",
            ErrorKind::InvalidFileAccess => "invalidfileaccess",
            ErrorKind::InvalidFont => "invalidfont",
            ErrorKind::InvalidRestore => "invalidrestore",
            ErrorKind::IoError => "ioerror",
            ErrorKind::LimitCheck => "limitcheck",
            ErrorKind::NoCurrentPoint => "nocurrentpoint",
            ErrorKind::RangeCheck => "rangecheck",
            ErrorKind::StackOverflow => "stackoverflow",
            ErrorKind::StackUnderflow => "stackunderflow",
            ErrorKind::SyntaxError => "syntaxerror",
            ErrorKind::Timeout => "timeout",
            ErrorKind::TypeCheck => "typecheck",
            ErrorKind::Undefined => "undefined",
            ErrorKind::UndefinedFilename => "undefinedfilename",
            ErrorKind::UndefinedResource => "undefinedresource",
            ErrorKind::UndefinedResult => "undefinedresult",
            ErrorKind::UnmatchedMark => "unmatchedmark",
            ErrorKind::Unregistered => "unregistered",
            ErrorKind::VmError => "VMerror",
        }
    }

    /// All standard error kinds.
    pub fn all() -> &'static [ErrorKind] {
        &[
            ErrorKind::ConfigurationError,
            ErrorKind::DictFull,
            ErrorKind::DictStackOverflow,
            ErrorKind::DictStackUnderflow,
            ErrorKind::ExecStackOverflow,
            ErrorKind::HandleError,
            ErrorKind::Interrupt,
            ErrorKind::InvalidAccess,
            ErrorKind::InvalidExit,
            ErrorKind::InvalidFileAccess,
            ErrorKind::InvalidFont,
            ErrorKind::InvalidRestore,
            ErrorKind::IoError,
            ErrorKind::LimitCheck,
            ErrorKind::NoCurrentPoint,
            ErrorKind::RangeCheck,
            ErrorKind::StackOverflow,
            ErrorKind::StackUnderflow,
            ErrorKind::SyntaxError,
            ErrorKind::Timeout,
            ErrorKind::TypeCheck,
            ErrorKind::Undefined,
            ErrorKind::UndefinedFilename,
            ErrorKind::UndefinedResource,
            ErrorKind::UndefinedResult,
            ErrorKind::UnmatchedMark,
            ErrorKind::Unregistered,
            ErrorKind::VmError,
        ]
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Crate-internal control flow for operator execution.
///
/// `exit` and `stop` are not errors in the PostScript sense: they unwind to
/// the nearest enclosing construct that consumes them and never pass through
/// `errordict`. Kinded errors do.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Interrupted {
    /// A kinded PostScript error, subject to `errordict` routing.
    Error(PostScriptError),
    /// The `exit` sentinel, consumed by the nearest enclosing loop.
    Exit,
    /// The `stop` sentinel, consumed by error handlers and `repeat`.
    Stop,
}

/// Result of executing a single built-in operator.
pub(crate) type OpResult = std::result::Result<(), Interrupted>;

impl From<PostScriptError> for Interrupted {
    fn from(e: PostScriptError) -> Self {
        Interrupted::Error(e)
    }
}

/// Shorthand constructor used throughout the operator implementations.
pub(crate) fn ps_error(kind: ErrorKind, message: impl Into<String>) -> Interrupted {
    Interrupted::Error(PostScriptError::new(kind, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_names() {
        assert_eq!(ErrorKind::TypeCheck.name(), "typecheck");
        assert_eq!(ErrorKind::StackUnderflow.name(), "stackunderflow");
        assert_eq!(ErrorKind::VmError.name(), "VMerror");
        assert_eq!(ErrorKind::UndefinedResult.name(), "undefinedresult");
    }

    #[test]
    fn test_error_kind_names_unique() {
        use std::collections::HashSet;
        let names: HashSet<_> = ErrorKind::all().iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), 28);
    }

    #[test]
    fn test_postscript_error_display() {
        let err = PostScriptError::new(ErrorKind::RangeCheck, "roll: j out of range");
        let msg = format!("{}", err);
        assert!(msg.contains("rangecheck"));
        assert!(msg.contains("roll"));
    }

    #[test]
    fn test_error_kind_accessor() {
        let err: Error = PostScriptError::new(ErrorKind::Undefined, "foo").into();
        assert_eq!(err.kind(), Some(ErrorKind::Undefined));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
