//! Dual-scope context object registry (spec.md §3, §4.3, §9).
//!
//! Every concrete kind of context object (`Processor`, `Handler`) owns its
//! *own* registry instance — "class-keyed" in spec terms, which here just
//! means `processor.rs` and `handler.rs` each declare their own
//! `static REGISTRY: Lazy<ContextRegistry<...>>`, rather than one registry
//! shared and keyed by a type id. A registry tracks a process-wide
//! application stack and a per-thread stack, both timestamped by one shared
//! monotonic sequence counter, plus a per-thread cache of the merged
//! iteration order.
//!
//! True thread-local storage (`thread_local!`) isn't used for the thread
//! stacks: a push/pop on thread A must be able to invalidate thread B's
//! cached iteration order (an application-scope push clears every thread's
//! cache), which requires a structure reachable from any thread. A
//! `Mutex`-guarded map keyed by `ThreadId` gets the same externally
//! observable behaviour spec.md §5 asks for — the lock is held only across
//! the stack mutation and cache touch, never across a handler call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use crate::error::stack_misuse;

/// Per-thread iteration caches are cleared outright once they'd hold more
/// than this many entries, rather than evicted LRU-style (spec.md §9: "clear
/// on overflow rather than LRU - simpler and rarely exercised").
const CACHE_CAP: usize = 256;

struct RegistryState<X: ?Sized> {
    app_stack: Vec<(u64, Arc<X>)>,
    thread_stacks: HashMap<ThreadId, Vec<(u64, Arc<X>)>>,
    sequence: u64,
    cache: HashMap<ThreadId, Vec<Arc<X>>>,
}

impl<X: ?Sized> RegistryState<X> {
    fn next_seq(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// One class's dual-scope stack registry. `X` is the context object kind
/// (e.g. `Processor`, or `dyn Handler`); items are stored as `Arc<X>` since
/// the same object may simultaneously sit in a registry and be held by
/// whatever code pushed it.
pub struct ContextRegistry<X: ?Sized> {
    state: Mutex<RegistryState<X>>,
}

impl<X: ?Sized> Default for ContextRegistry<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: ?Sized> ContextRegistry<X> {
    pub fn new() -> Self {
        ContextRegistry {
            state: Mutex::new(RegistryState {
                app_stack: Vec::new(),
                thread_stacks: HashMap::new(),
                sequence: 0,
                cache: HashMap::new(),
            }),
        }
    }

    pub fn push_thread(&self, item: Arc<X>) {
        let tid = thread::current().id();
        let mut state = self.state.lock().unwrap();
        state.cache.remove(&tid);
        let seq = state.next_seq();
        state.thread_stacks.entry(tid).or_default().push((seq, item));
    }

    /// Pops the top of the current thread's stack, asserting it is `item`
    /// (spec.md §4.3 "assert it is self"; a mismatch or empty stack is a
    /// `StackMisuse` contract violation, spec.md §7).
    pub fn pop_thread(&self, item: &Arc<X>) {
        let tid = thread::current().id();
        let mut state = self.state.lock().unwrap();
        state.cache.remove(&tid);
        let popped = state.thread_stacks.get_mut(&tid).and_then(|stack| stack.pop());
        match popped {
            Some((_, top)) if Arc::ptr_eq(&top, item) => {}
            Some(_) => stack_misuse("popped context object does not match the top of the thread stack"),
            None => stack_misuse("pop_thread called on an empty thread stack"),
        }
    }

    pub fn push_application(&self, item: Arc<X>) {
        let mut state = self.state.lock().unwrap();
        let seq = state.next_seq();
        state.app_stack.push((seq, item));
        state.cache.clear();
    }

    pub fn pop_application(&self, item: &Arc<X>) {
        let mut state = self.state.lock().unwrap();
        let popped = state.app_stack.pop();
        match popped {
            Some((_, top)) if Arc::ptr_eq(&top, item) => {}
            Some(_) => stack_misuse("popped context object does not match the top of the application stack"),
            None => stack_misuse("pop_application called on an empty application stack"),
        }
        state.cache.clear();
    }

    /// The merged application + current-thread stacks, most recently pushed
    /// first, serving the cache when present (spec.md §4.3, testable
    /// property 5 and 6).
    pub fn iter_current_thread(&self) -> Vec<Arc<X>> {
        let tid = thread::current().id();
        let mut state = self.state.lock().unwrap();
        if let Some(cached) = state.cache.get(&tid) {
            return cached.clone();
        }
        let mut combined: Vec<(u64, Arc<X>)> = state.app_stack.clone();
        if let Some(thread_stack) = state.thread_stacks.get(&tid) {
            combined.extend(thread_stack.iter().cloned());
        }
        combined.sort_by(|a, b| b.0.cmp(&a.0));
        let result: Vec<Arc<X>> = combined.into_iter().map(|(_, item)| item).collect();
        if state.cache.len() >= CACHE_CAP {
            state.cache.clear();
        }
        state.cache.insert(tid, result.clone());
        result
    }
}

/// The scoped push/pop interface shared by every concrete context object
/// kind (spec.md §4.7, §6.4). `bind_thread`/`bind_application` (in the
/// `logbook` crate) and [`NestedSetup`] operate purely in terms of this
/// trait.
pub trait StackedObject {
    fn push_thread(&self);
    fn pop_thread(&self);
    fn push_application(&self);
    fn pop_application(&self);
}
