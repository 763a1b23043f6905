//! Application-level logging built on `logbook-core`: the [`Logger`] façade,
//! scoped context binding (`bind_thread`/`bind_application`, [`NestedSetup`]),
//! the exception-to-record catcher, and call-site capturing macros.
//!
//! This crate is the thin layer spec.md §4.7-§4.8 describes — C1-C6 (levels,
//! records, the context-object registry, processors, handlers, dispatch)
//! live in `logbook-core`; this crate adds nothing to the dispatch engine
//! itself, only convenient ways to drive it from application code.

mod catch;
mod logger;
#[macro_use]
mod macros;
mod scoped;

pub use catch::{catch_err, catch_exceptions};
pub use logger::Logger;
pub use scoped::{bind_application, bind_thread, ApplicationBinding, NestedSetup, ThreadBinding};

pub use logbook_core::{
    CallSite, ExcInfo, Extra, Handler, Level, LoggerGroup, LogRecord, Processor, RecordDispatcher,
    StackedObject, CRITICAL, DEBUG, ERROR, INFO, NOTICE, NOTSET, WARNING,
};

/// Re-exported purely so the `debug!`/`info!`/... macros can name
/// `$crate::export::Value` without requiring callers to depend on
/// `serde_json` themselves.
#[doc(hidden)]
pub mod export {
    pub use serde_json::Value;
}
