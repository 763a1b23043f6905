//! `Processor`: a context object whose job is to mutate records as they
//! pass through dispatch (spec.md §4.4).

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::context::{ContextRegistry, StackedObject};
use crate::record::LogRecord;

/// Wraps a callback invoked on every record visible to the processor's
/// scope. Processors typically set `record.extra[k] = v`; nothing stops
/// them mutating anything else on the record.
pub struct Processor {
    callback: Box<dyn Fn(&mut LogRecord) + Send + Sync>,
}

impl Processor {
    pub fn new(callback: impl Fn(&mut LogRecord) + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Processor {
            callback: Box::new(callback),
        })
    }

    pub fn process(&self, record: &mut LogRecord) {
        (self.callback)(record);
    }

    fn registry() -> &'static ContextRegistry<Processor> {
        static REGISTRY: Lazy<ContextRegistry<Processor>> = Lazy::new(ContextRegistry::new);
        &REGISTRY
    }

    /// Processors visible to the calling thread, most recently pushed
    /// first, combining the application and thread scopes (spec.md §4.5
    /// `process_record`).
    pub fn iter_context_objects() -> Vec<Arc<Processor>> {
        Self::registry().iter_current_thread()
    }
}

impl StackedObject for Arc<Processor> {
    fn push_thread(&self) {
        Processor::registry().push_thread(Arc::clone(self));
    }

    fn pop_thread(&self) {
        Processor::registry().pop_thread(self);
    }

    fn push_application(&self) {
        Processor::registry().push_application(Arc::clone(self));
    }

    fn pop_application(&self) {
        Processor::registry().pop_application(self);
    }
}
