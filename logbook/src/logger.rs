//! `Logger`: a thin façade over [`RecordDispatcher`] with level-named
//! convenience entry points (spec.md §4.8).

use std::collections::BTreeMap;
use std::sync::Arc;

use logbook_core::{CallSite, Extra, LoggerGroup, RecordDispatcher};
use logbook_core::{CRITICAL, DEBUG, ERROR, INFO, NOTICE, WARNING};
use logbook_core::{ExcInfo, Level};
use serde_json::Value;

use crate::catch::{self, no_active_exception};

/// A named, level-gated entry point onto a [`RecordDispatcher`]. Every
/// convenience method here checks `level >= self.level()` (group-reflected,
/// via the dispatcher) before allocating a record at all — `Logger` adds no
/// state of its own beyond the dispatcher it wraps.
pub struct Logger {
    dispatcher: Arc<RecordDispatcher>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Logger {
            dispatcher: RecordDispatcher::new(name),
        }
    }

    pub fn from_dispatcher(dispatcher: Arc<RecordDispatcher>) -> Self {
        Logger { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<RecordDispatcher> {
        &self.dispatcher
    }

    pub fn name(&self) -> &str {
        &self.dispatcher.name
    }

    pub fn level(&self) -> Level {
        self.dispatcher.level()
    }

    pub fn set_level(&self, level: Level) {
        self.dispatcher.set_level(level);
    }

    pub fn disabled(&self) -> bool {
        self.dispatcher.disabled()
    }

    pub fn set_disabled(&self, disabled: Option<bool>) {
        self.dispatcher.set_disabled(disabled);
    }

    pub fn group(&self) -> Option<Arc<LoggerGroup>> {
        self.dispatcher.group()
    }

    /// `log(level, ...)`: the general entry point the seven named
    /// convenience methods below all delegate to.
    pub fn log(
        &self,
        level: Level,
        frame: Option<CallSite>,
        msg: impl Into<String>,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
    ) {
        if level < self.level() {
            return;
        }
        self.dispatcher
            .make_record_and_handle(level, msg, args, kwargs, None, Extra::new(), frame);
    }

    /// Like [`Logger::log`] but with an explicit `exc_info`, bypassing the
    /// "pull from the ambient current failure" rule [`Logger::exception`]
    /// follows. Used by [`crate::catch::catch_err`] to log a typed
    /// `Result::Err` directly, without needing a current-exception scope.
    pub fn log_with_exc_info(
        &self,
        level: Level,
        frame: Option<CallSite>,
        msg: impl Into<String>,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
        exc_info: ExcInfo,
    ) {
        if level < self.level() {
            return;
        }
        self.dispatcher
            .make_record_and_handle(level, msg, args, kwargs, Some(exc_info), Extra::new(), frame);
    }

    pub fn debug(&self, frame: Option<CallSite>, msg: impl Into<String>, args: Vec<Value>, kwargs: BTreeMap<String, Value>) {
        self.log(DEBUG, frame, msg, args, kwargs);
    }

    pub fn info(&self, frame: Option<CallSite>, msg: impl Into<String>, args: Vec<Value>, kwargs: BTreeMap<String, Value>) {
        self.log(INFO, frame, msg, args, kwargs);
    }

    pub fn notice(&self, frame: Option<CallSite>, msg: impl Into<String>, args: Vec<Value>, kwargs: BTreeMap<String, Value>) {
        self.log(NOTICE, frame, msg, args, kwargs);
    }

    pub fn warn(&self, frame: Option<CallSite>, msg: impl Into<String>, args: Vec<Value>, kwargs: BTreeMap<String, Value>) {
        self.log(WARNING, frame, msg, args, kwargs);
    }

    /// Alias of [`Logger::warn`], supplemented from
    /// `original_source/logbook/base.py`'s `LoggerMixin.warning`.
    pub fn warning(&self, frame: Option<CallSite>, msg: impl Into<String>, args: Vec<Value>, kwargs: BTreeMap<String, Value>) {
        self.warn(frame, msg, args, kwargs);
    }

    pub fn error(&self, frame: Option<CallSite>, msg: impl Into<String>, args: Vec<Value>, kwargs: BTreeMap<String, Value>) {
        self.log(ERROR, frame, msg, args, kwargs);
    }

    pub fn critical(&self, frame: Option<CallSite>, msg: impl Into<String>, args: Vec<Value>, kwargs: BTreeMap<String, Value>) {
        self.log(CRITICAL, frame, msg, args, kwargs);
    }

    /// `error` with `exc_info` auto-supplied from the current failure
    /// (spec.md §4.8). The "current failure" is whatever
    /// [`crate::catch::catch_exceptions`] is presently unwinding through;
    /// calling this with none active is a `NoActiveException` contract
    /// violation and panics.
    pub fn exception(&self, frame: Option<CallSite>, msg: impl Into<String>, args: Vec<Value>, kwargs: BTreeMap<String, Value>) {
        if ERROR < self.level() {
            return;
        }
        let exc_info = catch::take_current_exception().unwrap_or_else(|| no_active_exception());
        self.dispatcher
            .make_record_and_handle(ERROR, msg, args, kwargs, Some(exc_info), Extra::new(), frame);
    }

    /// A scoped guard that absorbs any panic raised in `f` into a single
    /// ERROR record, rather than letting it unwind past this call (spec.md
    /// §4.7 `catch_exceptions`, §9 Rust-specific adaptation #2). Delegates to
    /// [`crate::catch::catch_exceptions`].
    pub fn catch_exceptions<F, R>(&self, frame: Option<CallSite>, msg: Option<&str>, f: F) -> Option<R>
    where
        F: std::panic::UnwindSafe + FnOnce() -> R,
    {
        catch::catch_exceptions(self, frame, msg, f)
    }

    /// Logs and absorbs the `Err` side of a `Result`-returning closure — the
    /// idiomatic-Rust sibling of [`Logger::catch_exceptions`]. Delegates to
    /// [`crate::catch::catch_err`].
    pub fn catch_err<F, R, E>(&self, frame: Option<CallSite>, msg: impl Into<String>, f: F) -> Option<R>
    where
        F: FnOnce() -> Result<R, E>,
        E: std::error::Error,
    {
        catch::catch_err(self, frame, msg, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingHandler;
    use logbook_core::{DEBUG, INFO};

    #[test]
    fn logger_with_notset_level_inherits_from_its_group() {
        // S1: logger at NOTSET in a group at INFO; debug is dropped, info is
        // delivered with the expected channel and message.
        let group = LoggerGroup::new();
        group.set_level(INFO);
        let logger = Logger::new("app");
        group.add_logger(Arc::clone(logger.dispatcher()));

        let handler = RecordingHandler::new(DEBUG);
        logger.dispatcher().add_handler(handler.clone());

        logger.debug(None, "x", vec![], BTreeMap::new());
        assert!(handler.seen().is_empty());

        logger.info(None, "x", vec![], BTreeMap::new());
        assert_eq!(handler.seen(), vec![("x".to_owned(), INFO)]);
    }

    #[test]
    fn log_checks_level_before_allocating_a_record() {
        let logger = Logger::new("app");
        logger.set_level(logbook_core::ERROR);
        let handler = RecordingHandler::new(DEBUG);
        logger.dispatcher().add_handler(handler.clone());

        logger.warn(None, "should be skipped", vec![], BTreeMap::new());
        assert!(handler.seen().is_empty());

        logger.critical(None, "should land", vec![], BTreeMap::new());
        assert_eq!(handler.seen().len(), 1);
    }

    #[test]
    fn warning_is_an_alias_of_warn() {
        let logger = Logger::new("app");
        let handler = RecordingHandler::new(DEBUG);
        logger.dispatcher().add_handler(handler.clone());

        logger.warning(None, "careful", vec![], BTreeMap::new());
        assert_eq!(handler.seen(), vec![("careful".to_owned(), logbook_core::WARNING)]);
    }

    #[test]
    fn catch_exceptions_method_absorbs_panic() {
        let logger = Logger::new("app");
        let handler = RecordingHandler::new(DEBUG);
        logger.dispatcher().add_handler(handler.clone());

        let result: Option<()> = logger.catch_exceptions(None, None, || panic!("boom"));
        assert!(result.is_none());
        assert_eq!(handler.seen()[0].1, logbook_core::ERROR);
    }

    #[test]
    fn catch_err_method_absorbs_result_err() {
        let logger = Logger::new("app");
        let handler = RecordingHandler::new(DEBUG);
        logger.dispatcher().add_handler(handler.clone());

        let outcome: Option<u32> = logger.catch_err(None, "bad int", || "x".parse::<u32>());
        assert!(outcome.is_none());
        assert_eq!(handler.seen()[0].0, "bad int");
    }
}
