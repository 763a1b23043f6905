//! `RecordDispatcher`: level gating, record construction, the processor
//! chain, and the handler chain with filter/bubble/blackhole semantics
//! (spec.md §4.5 — "the heart of the core").

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::group::LoggerGroup;
use crate::handler::{self, Handler};
use crate::level::{Level, NOTSET};
use crate::processor::Processor;
use crate::record::{CallSite, ExcInfo, Extra, LogRecord};

pub struct RecordDispatcher {
    pub name: String,

    /// If true, records built by [`RecordDispatcher::make_record_and_handle`]
    /// do not carry a weak reference back to this dispatcher. Supplemented
    /// from `original_source/logbook/base.py`; spec.md §4.5 mentions it only
    /// in passing.
    pub suppress_dispatcher: bool,

    handlers: Mutex<Vec<Arc<dyn Handler>>>,
    group: Mutex<Option<Weak<LoggerGroup>>>,
    level: Mutex<Level>,
    disabled: Mutex<Option<bool>>,
}

impl RecordDispatcher {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(RecordDispatcher {
            name: name.into(),
            suppress_dispatcher: false,
            handlers: Mutex::new(Vec::new()),
            group: Mutex::new(None),
            level: Mutex::new(NOTSET),
            disabled: Mutex::new(None),
        })
    }

    pub fn with_suppress_dispatcher(name: impl Into<String>, suppress_dispatcher: bool) -> Arc<Self> {
        Arc::new(RecordDispatcher {
            name: name.into(),
            suppress_dispatcher,
            handlers: Mutex::new(Vec::new()),
            group: Mutex::new(None),
            level: Mutex::new(NOTSET),
            disabled: Mutex::new(None),
        })
    }

    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.handlers.lock().unwrap().push(handler);
    }

    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers.lock().unwrap().clone()
    }

    pub fn group(&self) -> Option<Arc<LoggerGroup>> {
        self.group.lock().unwrap().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_group(&self, group: Option<Weak<LoggerGroup>>) {
        *self.group.lock().unwrap() = group;
    }

    /// The local override, or `NOTSET` if none is set — the sentinel spec.md
    /// §3 uses for "inherit from group".
    pub fn local_level(&self) -> Level {
        *self.level.lock().unwrap()
    }

    /// Setting `NOTSET` clears the override and resumes inheriting from the
    /// group, matching the original's double use of the same sentinel
    /// value for "unset" and the literal level `NOTSET`.
    pub fn set_level(&self, level: Level) {
        *self.level.lock().unwrap() = level;
    }

    /// Group-reflected effective level (spec.md §3 "group-reflected
    /// attribute"): the local override if set, else the group's level if a
    /// group is attached, else `NOTSET`.
    pub fn level(&self) -> Level {
        let local = self.local_level();
        if local != NOTSET {
            return local;
        }
        match self.group() {
            Some(group) => group.level(),
            None => NOTSET,
        }
    }

    pub fn local_disabled(&self) -> Option<bool> {
        *self.disabled.lock().unwrap()
    }

    pub fn set_disabled(&self, disabled: Option<bool>) {
        *self.disabled.lock().unwrap() = disabled;
    }

    /// Group-reflected effective `disabled` flag.
    pub fn disabled(&self) -> bool {
        if let Some(local) = self.local_disabled() {
            return local;
        }
        match self.group() {
            Some(group) => group.disabled(),
            None => false,
        }
    }

    /// If not disabled and the record clears the effective level threshold,
    /// runs it through [`RecordDispatcher::call_handlers`] (spec.md §4.5).
    pub fn handle(&self, record: &mut LogRecord) {
        if self.disabled() {
            return;
        }
        if record.level < self.level() {
            return;
        }
        self.call_handlers(record);
    }

    /// Builds a record from raw inputs and immediately dispatches it,
    /// closing it afterwards unless a handler claimed ownership via
    /// `keep_open` (spec.md §4.5).
    #[allow(clippy::too_many_arguments)]
    pub fn make_record_and_handle(
        self: &Arc<Self>,
        level: Level,
        msg: impl Into<String>,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
        exc_info: Option<ExcInfo>,
        extra: Extra,
        frame: Option<CallSite>,
    ) {
        let mut record = LogRecord::new(self.name.clone(), level, msg)
            .with_args(args)
            .with_kwargs(kwargs)
            .with_extra(extra);
        if let Some(exc_info) = exc_info {
            record = record.with_exc_info(exc_info);
        }
        if let Some(frame) = frame {
            record = record.with_frame(frame);
        }
        if !self.suppress_dispatcher {
            record = record.with_dispatcher(Arc::downgrade(self));
        }

        self.handle(&mut record);

        if record.keep_open {
            record.mark_late();
        } else {
            record.close();
        }
    }

    /// Runs the group's processor (if any) then every `Processor` visible
    /// to the calling thread (spec.md §4.5).
    pub fn process_record(&self, record: &mut LogRecord) {
        if let Some(group) = self.group() {
            group.process_record(record);
        }
        for processor in Processor::iter_context_objects() {
            processor.process(record);
        }
    }

    /// The handler traversal at the heart of dispatch (spec.md §4.5). Walks
    /// this dispatcher's directly-attached handlers, then every `Handler`
    /// context object visible to the calling thread, applying level
    /// gating, the single-shot heavy-init/process-record step, per-handler
    /// filters, and bubble/blackhole termination.
    pub fn call_handlers(&self, record: &mut LogRecord) {
        let mut initialized = false;

        let local_handlers = self.handlers();
        let context_handlers = handler::iter_context_objects();

        for h in local_handlers.iter().chain(context_handlers.iter()) {
            if record.level < h.level() {
                continue;
            }
            if h.blackhole() {
                return;
            }
            if !initialized {
                record.heavy_init();
                self.process_record(record);
                initialized = true;
            }
            if !h.filter(record) {
                continue;
            }
            let accepted = h.handle(record);
            if accepted && !h.bubble() {
                return;
            }
        }
    }
}

fn default_dispatcher() -> &'static Arc<RecordDispatcher> {
    static DEFAULT_DISPATCHER: Lazy<Arc<RecordDispatcher>> = Lazy::new(|| RecordDispatcher::new("dispatch_record"));
    &DEFAULT_DISPATCHER
}

/// Hands a fully-formed record to the handler stack without going through a
/// `Logger` at all. Supplemented from `original_source/logbook/base.py`'s
/// module-level `dispatch_record`/`_default_dispatcher`; distinct from the
/// top-level convenience logger spec.md §1 excludes, since no level-named
/// entry points or default handler wiring are involved here.
pub fn dispatch_record(record: &mut LogRecord) {
    default_dispatcher().handle(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::RecordingHandler;
    use crate::level::{CRITICAL, DEBUG, ERROR, INFO};
    use crate::processor::Processor;
    use serde_json::json;

    #[test]
    fn level_gating_skips_records_below_threshold() {
        let dispatcher = RecordDispatcher::new("app");
        dispatcher.set_level(INFO);
        let recorder = RecordingHandler::new(DEBUG);
        dispatcher.add_handler(recorder.clone());

        dispatcher.make_record_and_handle(DEBUG, "x", vec![], BTreeMap::new(), None, Extra::new(), None);
        assert!(recorder.seen().is_empty());

        dispatcher.make_record_and_handle(INFO, "x", vec![], BTreeMap::new(), None, Extra::new(), None);
        assert_eq!(recorder.seen(), vec!["x".to_owned()]);
    }

    #[test]
    fn blackhole_short_circuits_before_heavy_init() {
        let dispatcher = RecordDispatcher::new("app");
        let blackhole: Arc<dyn Handler> = Arc::new(crate::handler::Blackhole);
        let recorder = RecordingHandler::new(DEBUG);
        dispatcher.add_handler(blackhole);
        dispatcher.add_handler(recorder.clone());

        dispatcher.make_record_and_handle(ERROR, "gone", vec![], BTreeMap::new(), None, Extra::new(), None);
        assert!(recorder.seen().is_empty());
    }

    #[test]
    fn blackhole_leaves_record_never_heavy_initialized() {
        // Testable property 3: a leading blackhole means heavy_init never
        // runs at all, not merely that downstream handlers see nothing.
        let dispatcher = RecordDispatcher::new("app");
        let blackhole: Arc<dyn Handler> = Arc::new(crate::handler::Blackhole);
        dispatcher.add_handler(blackhole);

        let mut record = LogRecord::new("app", CRITICAL, "gone");
        dispatcher.call_handlers(&mut record);
        assert!(!record.heavy_initialized());
    }

    /// A handler whose filter rejects every record, used to assert that a
    /// filtered-out handler doesn't terminate dispatch (testable property 4).
    struct FilteringOut;

    impl Handler for FilteringOut {
        fn filter(&self, _record: &mut LogRecord) -> bool {
            false
        }

        fn handle(&self, _record: &mut LogRecord) -> bool {
            panic!("handle must not be called when filter returns false");
        }
    }

    #[test]
    fn filtered_out_handler_does_not_terminate_dispatch() {
        let dispatcher = RecordDispatcher::new("app");
        let filtered: Arc<dyn Handler> = Arc::new(FilteringOut);
        let downstream = RecordingHandler::new(DEBUG);
        dispatcher.add_handler(filtered);
        dispatcher.add_handler(downstream.clone());

        dispatcher.make_record_and_handle(ERROR, "e", vec![], BTreeMap::new(), None, Extra::new(), None);
        assert_eq!(downstream.seen(), vec!["e".to_owned()]);
    }

    #[test]
    fn bubbling_handler_lets_downstream_handlers_see_the_record() {
        // S3's other half: a bubbling handler never terminates traversal,
        // even though it accepted the record.
        let dispatcher = RecordDispatcher::new("app");
        let first = RecordingHandler::with_bubble(DEBUG, true);
        let second = RecordingHandler::with_bubble(DEBUG, true);
        dispatcher.add_handler(first.clone());
        dispatcher.add_handler(second.clone());

        dispatcher.make_record_and_handle(INFO, "i", vec![], BTreeMap::new(), None, Extra::new(), None);
        assert_eq!(first.seen(), vec!["i".to_owned()]);
        assert_eq!(second.seen(), vec!["i".to_owned()]);
    }

    #[test]
    fn non_bubbling_handler_terminates_traversal() {
        let dispatcher = RecordDispatcher::new("app");
        let terminator = RecordingHandler::with_bubble(DEBUG, false);
        let downstream = RecordingHandler::new(DEBUG);
        dispatcher.add_handler(terminator.clone());
        dispatcher.add_handler(downstream.clone());

        dispatcher.make_record_and_handle(ERROR, "e", vec![], BTreeMap::new(), None, Extra::new(), None);
        assert_eq!(terminator.seen(), vec!["e".to_owned()]);
        assert!(downstream.seen().is_empty());
    }

    #[test]
    fn processor_mutates_record_before_handlers_see_it() {
        let dispatcher = RecordDispatcher::new("app");
        let processor = Processor::new(|record: &mut LogRecord| {
            record.extra.insert("ip", json!("127.0.0.1"));
        });
        let recorder = RecordingHandler::new(DEBUG);
        dispatcher.add_handler(recorder.clone());

        use crate::context::StackedObject;
        processor.push_thread();
        dispatcher.make_record_and_handle(ERROR, "boom", vec![], BTreeMap::new(), None, Extra::new(), None);
        processor.pop_thread();

        assert_eq!(recorder.seen(), vec!["boom".to_owned()]);
    }

    #[test]
    fn s3_context_handler_stack_respects_level_and_bubble() {
        // Spec.md §8 scenario S3, adapted to both handlers living on the
        // current thread's scope (rather than one on the process-wide
        // application scope) so this test doesn't race other tests in this
        // binary that share the same process-wide Handler registry: handler
        // A (level=INFO, bubble=true) pushed first, handler B (level=ERROR,
        // bubble=false) pushed after — B is more recent and so is tried
        // first by `iter_current_thread`. An error record is terminated at B
        // without reaching A; an info record is filtered out of B by level
        // and reaches A.
        use crate::context::StackedObject;

        let dispatcher = RecordDispatcher::new("app");
        let a = RecordingHandler::with_bubble(INFO, true);
        let b = RecordingHandler::with_bubble(ERROR, false);
        let a_dyn: Arc<dyn Handler> = a.clone();
        let b_dyn: Arc<dyn Handler> = b.clone();
        a_dyn.push_thread();
        b_dyn.push_thread();

        dispatcher.make_record_and_handle(ERROR, "e", vec![], BTreeMap::new(), None, Extra::new(), None);
        dispatcher.make_record_and_handle(INFO, "i", vec![], BTreeMap::new(), None, Extra::new(), None);

        b_dyn.pop_thread();
        a_dyn.pop_thread();

        assert_eq!(b.seen(), vec!["e".to_owned()]);
        assert_eq!(a.seen(), vec!["i".to_owned()]);
    }

    #[test]
    fn dispatch_record_bypasses_any_named_dispatcher() {
        // No handlers are attached to the process-wide default dispatcher in
        // this test, so this only exercises that the bypass path runs to
        // completion without a `Logger` or a named dispatcher in sight.
        let mut record = LogRecord::new("anywhere", ERROR, "standalone");
        dispatch_record(&mut record);
    }
}
