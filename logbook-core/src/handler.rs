//! The `Handler` contract (spec.md §6.3): an external collaborator the core
//! dispatches to but never constructs. Concrete handlers (file, stream,
//! syslog, network, mail, test) are out of scope here — only the contract
//! and the blackhole sentinel live in this crate.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::context::{ContextRegistry, StackedObject};
use crate::level::{Level, NOTSET};
use crate::record::LogRecord;

/// Anything `RecordDispatcher::call_handlers` can dispatch to. A handler is
/// itself a context object: it can be pushed onto the application or thread
/// stack and discovered by dispatch the same way a [`crate::processor::Processor`]
/// is.
pub trait Handler: Send + Sync {
    /// Records below this level are skipped (spec.md §6.3).
    fn level(&self) -> Level {
        NOTSET
    }

    /// If true, reaching this handler in traversal order terminates
    /// dispatch immediately with no further work, not even `heavy_init`
    /// (spec.md §4.5 step 2, testable property 3).
    fn blackhole(&self) -> bool {
        false
    }

    /// A per-handler veto. `false` skips only this handler; dispatch
    /// continues to the next one. The default accepts everything, standing
    /// in for the original's "no filter installed" case.
    fn filter(&self, _record: &mut LogRecord) -> bool {
        true
    }

    /// Whether a successful [`Handler::handle`] lets dispatch continue to
    /// further handlers. `false` terminates traversal on success (spec.md
    /// §4.5 step 5, testable property 4).
    fn bubble(&self) -> bool {
        true
    }

    /// Delivers the record. Returns whether it was accepted. May set
    /// `record.keep_open = true` to take ownership past dispatch.
    fn handle(&self, record: &mut LogRecord) -> bool;
}

fn registry() -> &'static ContextRegistry<dyn Handler> {
    static REGISTRY: Lazy<ContextRegistry<dyn Handler>> = Lazy::new(ContextRegistry::new);
    &REGISTRY
}

/// Handlers visible to the calling thread, most recently pushed first
/// (spec.md §4.5 `call_handlers` step (b)).
pub fn iter_context_objects() -> Vec<Arc<dyn Handler>> {
    registry().iter_current_thread()
}

impl StackedObject for Arc<dyn Handler> {
    fn push_thread(&self) {
        registry().push_thread(Arc::clone(self));
    }

    fn pop_thread(&self) {
        registry().pop_thread(self);
    }

    fn push_application(&self) {
        registry().push_application(Arc::clone(self));
    }

    fn pop_application(&self) {
        registry().pop_application(self);
    }
}

/// A sentinel handler whose presence aborts dispatch without delivering
/// (spec.md glossary "Blackhole"). Grounded in `tracing-core`'s
/// `NoCollector`, which plays the same "there is deliberately nothing here"
/// role for its own dispatcher slot.
pub struct Blackhole;

impl Handler for Blackhole {
    fn blackhole(&self) -> bool {
        true
    }

    fn handle(&self, _record: &mut LogRecord) -> bool {
        false
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingHandler;
    use super::*;
    use crate::level::{ERROR, INFO};

    #[test]
    fn blackhole_rejects_everything() {
        let blackhole = Blackhole;
        assert!(blackhole.blackhole());
        let mut record = LogRecord::new("app", ERROR, "x");
        assert!(!blackhole.handle(&mut record));
    }

    #[test]
    fn pushed_handler_is_visible_via_context_objects() {
        let handler: Arc<dyn Handler> = RecordingHandler::new(INFO);
        handler.push_thread();
        let visible = iter_context_objects();
        assert!(visible.iter().any(|h| Arc::ptr_eq(h, &handler)));
        handler.pop_thread();
    }
}
