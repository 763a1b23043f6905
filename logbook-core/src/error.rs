//! Error kinds for the dispatch engine (spec.md §7).
//!
//! Contract violations (`StackMisuse`, `HeavyInitTooLate`, `NoActiveException`)
//! are programmer errors and are raised as panics at their call sites rather
//! than returned here — spec.md §7 calls these out as "fatal
//! (abort-or-raise, never silently absorbed)". Only the two kinds a caller
//! can legitimately run into at runtime (`UnknownLevel`, `FormatError`) are
//! `Result` values, following `tracing-core`'s own split between panicking
//! invariants (`assert!` in `dispatch.rs`) and `Result`-returning parse
//! errors (`ParseLevelError`).

use std::fmt;

/// A level name (or value) that doesn't name one of the seven fixed levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownLevel {
    what: UnknownLevelKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum UnknownLevelKind {
    Name(String),
    Value(i32),
}

impl UnknownLevel {
    pub(crate) fn name(name: &str) -> Self {
        UnknownLevel {
            what: UnknownLevelKind::Name(name.to_owned()),
        }
    }

    pub(crate) fn value(value: i32) -> Self {
        UnknownLevel {
            what: UnknownLevelKind::Value(value),
        }
    }
}

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.what {
            UnknownLevelKind::Name(name) => write!(f, "unknown level name {:?}", name),
            UnknownLevelKind::Value(value) => write!(f, "unknown level value {}", value),
        }
    }
}

impl std::error::Error for UnknownLevel {}

/// A record's `msg` template could not be formatted with the provided `args`
/// and `kwargs` (spec.md §4.2, `message` derivation rule).
#[derive(Debug)]
pub struct FormatError {
    msg: String,
    args_debug: String,
    kwargs_debug: String,
    filename: Option<String>,
    lineno: Option<u32>,
    cause: FormatCause,
}

#[derive(Debug)]
pub(crate) enum FormatCause {
    MissingPositional { index: usize },
    MissingNamed { name: String },
    UnexpectedCloseBrace,
    UnterminatedPlaceholder,
}

impl FormatError {
    pub(crate) fn new(
        msg: impl Into<String>,
        args_debug: impl Into<String>,
        kwargs_debug: impl Into<String>,
        filename: Option<String>,
        lineno: Option<u32>,
        cause: FormatCause,
    ) -> Self {
        FormatError {
            msg: msg.into(),
            args_debug: args_debug.into(),
            kwargs_debug: kwargs_debug.into(),
            filename,
            lineno,
            cause,
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match &self.cause {
            FormatCause::MissingPositional { index } => {
                format!("missing positional argument {}", index)
            }
            FormatCause::MissingNamed { name } => format!("missing keyword argument {:?}", name),
            FormatCause::UnexpectedCloseBrace => "unmatched '}' in template".to_owned(),
            FormatCause::UnterminatedPlaceholder => "unterminated '{' in template".to_owned(),
        };
        write!(
            f,
            "could not format message with provided arguments: {}\n  msg={:?}\n  args={}\n  kwargs={}\n  happened in file {}, line {}",
            reason,
            self.msg,
            self.args_debug,
            self.kwargs_debug,
            self.filename.as_deref().unwrap_or("<unknown>"),
            self.lineno.map(|l| l.to_string()).unwrap_or_else(|| "?".to_owned()),
        )
    }
}

impl std::error::Error for FormatError {}

#[track_caller]
pub(crate) fn stack_misuse(message: &str) -> ! {
    panic!("logbook: stack misuse: {}", message);
}

#[track_caller]
pub(crate) fn heavy_init_too_late() -> ! {
    panic!("logbook: heavy_init is no longer possible: record is late");
}
