//! `LoggerGroup`: a shared fallback for `level`/`disabled` across a set of
//! dispatchers, plus a group-wide processing hook (spec.md §4.6).

use std::sync::{Arc, Mutex};

use crate::dispatcher::RecordDispatcher;
use crate::error::stack_misuse;
use crate::level::{Level, NOTSET};
use crate::record::LogRecord;

pub struct LoggerGroup {
    dispatchers: Mutex<Vec<Arc<RecordDispatcher>>>,
    level: Mutex<Level>,
    disabled: Mutex<bool>,
    processor: Mutex<Option<Box<dyn Fn(&mut LogRecord) + Send + Sync>>>,
}

impl LoggerGroup {
    pub fn new() -> Arc<Self> {
        Arc::new(LoggerGroup {
            dispatchers: Mutex::new(Vec::new()),
            level: Mutex::new(NOTSET),
            disabled: Mutex::new(false),
            processor: Mutex::new(None),
        })
    }

    /// Adds `dispatcher` to this group. Ownership is mutually exclusive
    /// (spec.md §3): a dispatcher already owned by a (live) group is a
    /// `StackMisuse`-equivalent contract violation.
    pub fn add_logger(self: &Arc<Self>, dispatcher: Arc<RecordDispatcher>) {
        if dispatcher.group().is_some() {
            stack_misuse("add_logger called on a dispatcher that already belongs to a group");
        }
        dispatcher.set_group(Some(Arc::downgrade(self)));
        self.dispatchers.lock().unwrap().push(dispatcher);
    }

    pub fn remove_logger(&self, dispatcher: &Arc<RecordDispatcher>) {
        let mut dispatchers = self.dispatchers.lock().unwrap();
        let before = dispatchers.len();
        dispatchers.retain(|d| !Arc::ptr_eq(d, dispatcher));
        if dispatchers.len() != before {
            dispatcher.set_group(None);
        }
    }

    pub fn dispatchers(&self) -> Vec<Arc<RecordDispatcher>> {
        self.dispatchers.lock().unwrap().clone()
    }

    pub fn level(&self) -> Level {
        *self.level.lock().unwrap()
    }

    pub fn set_level(&self, level: Level) {
        *self.level.lock().unwrap() = level;
    }

    pub fn disabled(&self) -> bool {
        *self.disabled.lock().unwrap()
    }

    pub fn set_disabled(&self, disabled: bool) {
        *self.disabled.lock().unwrap() = disabled;
    }

    pub fn set_processor(&self, processor: impl Fn(&mut LogRecord) + Send + Sync + 'static) {
        *self.processor.lock().unwrap() = Some(Box::new(processor));
    }

    pub fn clear_processor(&self) {
        *self.processor.lock().unwrap() = None;
    }

    pub fn process_record(&self, record: &mut LogRecord) {
        if let Some(processor) = self.processor.lock().unwrap().as_ref() {
            processor(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{ERROR, INFO, WARNING};

    #[test]
    fn member_dispatcher_inherits_group_level_until_overridden() {
        let group = LoggerGroup::new();
        group.set_level(INFO);
        let dispatcher = RecordDispatcher::new("child");
        group.add_logger(dispatcher.clone());

        assert_eq!(dispatcher.level(), INFO);

        dispatcher.set_level(ERROR);
        assert_eq!(dispatcher.level(), ERROR);

        dispatcher.set_level(crate::level::NOTSET);
        assert_eq!(dispatcher.level(), INFO);

        group.set_level(WARNING);
        assert_eq!(dispatcher.level(), WARNING);
    }

    #[test]
    #[should_panic(expected = "already belongs to a group")]
    fn adding_an_already_owned_dispatcher_panics() {
        let group_a = LoggerGroup::new();
        let group_b = LoggerGroup::new();
        let dispatcher = RecordDispatcher::new("child");
        group_a.add_logger(dispatcher.clone());
        group_b.add_logger(dispatcher);
    }

    #[test]
    fn remove_logger_clears_back_pointer() {
        let group = LoggerGroup::new();
        let dispatcher = RecordDispatcher::new("child");
        group.add_logger(dispatcher.clone());
        group.remove_logger(&dispatcher);
        assert!(dispatcher.group().is_none());
    }
}
