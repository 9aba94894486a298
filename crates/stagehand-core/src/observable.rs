//! Single-writer observable values.
//!
//! An [`ObservableValue`] is owned by exactly one writer. Everyone else gets an
//! [`ObservableReader`], which can read the current value and subscribe to
//! changes but never write. Subscribers are notified synchronously, in
//! registration order, and only when the value actually changes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

type Observer<T> = Rc<dyn Fn(&T) + 'static>;

struct ObservableInner<T> {
    value: RefCell<T>,
    observers: RefCell<SmallVec<[(u64, Observer<T>); 4]>>,
    next_observer_id: Cell<u64>,
}

impl<T: Clone + PartialEq + 'static> ObservableInner<T> {
    fn subscribe(this: &Rc<Self>, observer: impl Fn(&T) + 'static) -> Subscription {
        let id = this.next_observer_id.get();
        this.next_observer_id.set(id + 1);
        this.observers.borrow_mut().push((id, Rc::new(observer)));
        let weak: Weak<Self> = Rc::downgrade(this);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.observers.borrow_mut().retain(|(entry, _)| *entry != id);
            }
        })
    }
}

/// Writable side of an observable value.
pub struct ObservableValue<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T: Clone + PartialEq + 'static> ObservableValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                observers: RefCell::new(SmallVec::new()),
                next_observer_id: Cell::new(1),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Stores `value` and notifies subscribers if it differs from the current one.
    ///
    /// Returns whether the value changed. Observers run after the value is
    /// stored and without any internal borrow held, so they may read the value
    /// or subscribe and unsubscribe freely.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        let observers: SmallVec<[Observer<T>; 4]> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(&value);
        }
        true
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        ObservableInner::subscribe(&self.inner, observer)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    pub fn reader(&self) -> ObservableReader<T> {
        ObservableReader {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("value", &*self.inner.value.borrow())
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

/// Read-only side of an observable value.
pub struct ObservableReader<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for ObservableReader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> ObservableReader<T> {
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        ObservableInner::subscribe(&self.inner, observer)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableReader")
            .field(&*self.inner.value.borrow())
            .finish()
    }
}

/// Unsubscribes its observer when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + 'static>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/observable_tests.rs"]
mod tests;
