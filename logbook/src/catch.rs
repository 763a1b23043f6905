//! The exception-to-record catcher (spec.md §4.7, §9 "Rust-specific
//! adaptations" #2).
//!
//! Python's `with logger.catch_exceptions():` absorbs *any* exception raised
//! in the block. The closest untyped "any failure" primitive in Rust is a
//! panic, so [`catch_exceptions`] wraps a closure in
//! `std::panic::catch_unwind`, stashes the payload where [`Logger::exception`]
//! can find it, and calls `exception()` on the caller's behalf. [`catch_err`]
//! is an additive convenience for the more idiomatic Rust shape of a
//! `Result`-returning closure, where the failure is already a typed value and
//! needs no ambient "current exception" state at all.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::panic::{self, UnwindSafe};

use logbook_core::{CallSite, ExcInfo, ERROR};

use crate::logger::Logger;

thread_local! {
    /// The exception presently being unwound through [`catch_exceptions`],
    /// consulted by [`Logger::exception`] the way the original pulls from
    /// `sys.exc_info()`. Scoped to the thread running the catch, matching
    /// spec.md §4.2's "accessing thread-scoped fields off-thread is the
    /// caller's mistake" stance.
    static CURRENT_EXCEPTION: RefCell<Option<ExcInfo>> = RefCell::new(None);
}

pub(crate) fn take_current_exception() -> Option<ExcInfo> {
    CURRENT_EXCEPTION.with(|cell| cell.borrow_mut().take())
}

/// `exception()` called with no failure in flight is a contract violation
/// (spec.md §7 `NoActiveException`) — fatal, never silently absorbed.
#[track_caller]
pub(crate) fn no_active_exception() -> ExcInfo {
    panic!("logbook: exception() called with no exception being handled");
}

/// Runs `f`, absorbing any panic into a single ERROR record via
/// `logger.exception()` rather than letting it propagate (spec.md §4.7, §9,
/// testable property 9). Returns `Some(value)` on success, `None` if a panic
/// was caught. If `msg` is `None`, the record's message defaults to
/// `"Uncaught exception occurred"`, matching the original's
/// `catch_exceptions()` with no explicit args.
pub fn catch_exceptions<F, R>(logger: &Logger, frame: Option<CallSite>, msg: Option<&str>, f: F) -> Option<R>
where
    F: FnOnce() -> R + UnwindSafe,
{
    match panic::catch_unwind(f) {
        Ok(value) => Some(value),
        Err(payload) => {
            let exc_info = ExcInfo::from_panic_payload(payload.as_ref());
            CURRENT_EXCEPTION.with(|cell| *cell.borrow_mut() = Some(exc_info));
            logger.exception(
                frame,
                msg.unwrap_or("Uncaught exception occurred").to_owned(),
                Vec::new(),
                BTreeMap::new(),
            );
            CURRENT_EXCEPTION.with(|cell| *cell.borrow_mut() = None);
            None
        }
    }
}

/// Logs and absorbs the `Err` side of a `Result`-returning closure — the
/// common "log and keep going" shape idiomatic Rust error handling actually
/// takes, supplementing [`catch_exceptions`] rather than replacing it (spec.md
/// §9 Rust-specific adaptation #2: "the spec's testable property 9 only
/// requires that *some* route from failure to an absorbed ERROR record
/// exists").
pub fn catch_err<F, R, E>(logger: &Logger, frame: Option<CallSite>, msg: impl Into<String>, f: F) -> Option<R>
where
    F: FnOnce() -> Result<R, E>,
    E: std::error::Error,
{
    match f() {
        Ok(value) => Some(value),
        Err(err) => {
            let exc_info = ExcInfo::capture(&err);
            logger.log_with_exc_info(ERROR, frame, msg, Vec::new(), BTreeMap::new(), exc_info);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingHandler;
    use logbook_core::StackedObject;
    use std::sync::Arc;

    #[test]
    fn catch_exceptions_absorbs_panic_and_logs_error() {
        let logger = Logger::new("app");
        let handler = RecordingHandler::new(logbook_core::DEBUG);
        logger.dispatcher().add_handler(handler.clone());

        let result: Option<()> = catch_exceptions(&logger, None, None, || panic!("boom"));
        assert!(result.is_none());

        let seen = handler.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "Uncaught exception occurred");
        assert_eq!(seen[0].1, logbook_core::ERROR);
    }

    #[test]
    fn catch_exceptions_returns_value_on_success() {
        let logger = Logger::new("app");
        let result = catch_exceptions(&logger, None, None, || 42);
        assert_eq!(result, Some(42));
    }

    #[test]
    fn custom_message_overrides_default() {
        let logger = Logger::new("app");
        let handler = RecordingHandler::new(logbook_core::DEBUG);
        logger.dispatcher().add_handler(handler.clone());

        let _: Option<()> = catch_exceptions(&logger, None, Some("custom failure"), || panic!("x"));
        assert_eq!(handler.seen()[0].0, "custom failure");
    }

    #[test]
    fn catch_err_absorbs_result_err_and_logs_error() {
        let logger = Logger::new("app");
        let handler = RecordingHandler::new(logbook_core::DEBUG);
        logger.dispatcher().add_handler(handler.clone());

        let outcome: Option<u32> = catch_err(&logger, None, "parse failed", || "nope".parse::<u32>());
        assert!(outcome.is_none());
        assert_eq!(handler.seen()[0].0, "parse failed");
    }

    #[test]
    fn catch_err_returns_ok_value() {
        let logger = Logger::new("app");
        let outcome = catch_err(&logger, None, "parse failed", || "7".parse::<u32>());
        assert_eq!(outcome, Some(7));
    }

    #[test]
    fn exception_without_a_catch_scope_panics() {
        let logger = Logger::new("app");
        let handler: Arc<RecordingHandler> = RecordingHandler::new(logbook_core::DEBUG);
        logger.dispatcher().add_handler(handler);
        let result = panic::catch_unwind(AssertUnwindSafe(|| logger.exception(None, "oops", vec![], BTreeMap::new())));
        assert!(result.is_err());
    }

    use std::panic::AssertUnwindSafe;
}
