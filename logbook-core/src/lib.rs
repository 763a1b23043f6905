//! Core primitives for a structured logging library: severity levels, the
//! lazily-initialised [`LogRecord`], the dual-scope [`ContextObject`][stacked]
//! registry that backs [`Processor`] and [`Handler`], and [`RecordDispatcher`]
//! — the handler dispatch engine everything else in this crate exists to
//! feed.
//!
//! This crate intentionally ships no concrete handlers, no formatters, and
//! no configuration loading; it only defines the contract ([`Handler`])
//! those live against and the engine that drives it. Application-facing
//! loggers, scoped context binding, and the exception-to-record catcher
//! live in the `logbook` crate built on top of this one.
//!
//! [stacked]: context::StackedObject

pub mod context;
pub mod dispatcher;
pub mod error;
mod format;
pub mod group;
pub mod handler;
pub mod level;
pub mod processor;
pub mod record;

pub use context::{ContextRegistry, StackedObject};
pub use dispatcher::{dispatch_record, RecordDispatcher};
pub use error::{FormatError, UnknownLevel};
pub use group::LoggerGroup;
pub use handler::{Blackhole, Handler};
pub use level::{Level, CRITICAL, DEBUG, ERROR, INFO, NOTICE, NOTSET, WARNING};
pub use processor::Processor;
pub use record::{CallSite, ExcInfo, Extra, LogRecord};
