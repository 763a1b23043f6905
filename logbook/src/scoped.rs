//! Scoped binding of context objects: `bind_thread`/`bind_application`
//! guards and [`NestedSetup`] (spec.md §4.7, §6.4).

use logbook_core::StackedObject;

/// Holds `object` pushed on the current thread's stack for the scope of
/// this guard; pops it on drop, covering every exit path including an
/// unwind (spec.md §4.7 "acquire on entry, release on all exit paths
/// including failures").
pub struct ThreadBinding<'a, T: StackedObject> {
    object: &'a T,
}

impl<'a, T: StackedObject> ThreadBinding<'a, T> {
    pub fn new(object: &'a T) -> Self {
        object.push_thread();
        ThreadBinding { object }
    }
}

impl<'a, T: StackedObject> Drop for ThreadBinding<'a, T> {
    fn drop(&mut self) {
        self.object.pop_thread();
    }
}

/// Same as [`ThreadBinding`] but for the process-wide application scope.
pub struct ApplicationBinding<'a, T: StackedObject> {
    object: &'a T,
}

impl<'a, T: StackedObject> ApplicationBinding<'a, T> {
    pub fn new(object: &'a T) -> Self {
        object.push_application();
        ApplicationBinding { object }
    }
}

impl<'a, T: StackedObject> Drop for ApplicationBinding<'a, T> {
    fn drop(&mut self) {
        self.object.pop_application();
    }
}

pub fn bind_thread<T: StackedObject>(object: &T) -> ThreadBinding<'_, T> {
    ThreadBinding::new(object)
}

pub fn bind_application<T: StackedObject>(object: &T) -> ApplicationBinding<'_, T> {
    ApplicationBinding::new(object)
}

/// A [`StackedObject`] composed of an ordered list of other stacked
/// objects. Pushes them in order; pops in reverse (spec.md §6.4).
pub struct NestedSetup {
    objects: Vec<Box<dyn StackedObject>>,
}

impl NestedSetup {
    pub fn new(objects: Vec<Box<dyn StackedObject>>) -> Self {
        NestedSetup { objects }
    }
}

impl StackedObject for NestedSetup {
    fn push_thread(&self) {
        for object in &self.objects {
            object.push_thread();
        }
    }

    fn pop_thread(&self) {
        for object in self.objects.iter().rev() {
            object.pop_thread();
        }
    }

    fn push_application(&self) {
        for object in &self.objects {
            object.push_application();
        }
    }

    fn pop_application(&self) {
        for object in self.objects.iter().rev() {
            object.pop_application();
        }
    }
}
