//! Engine observers.
//!
//! Hosts register callbacks that run synchronously after any state-affecting
//! operation. Registration returns a stable handle for unregistration.
//! Delivery is never re-entrant: a notice raised while callbacks are running
//! is queued and delivered after the current round.

use std::collections::VecDeque;

use rill_value::StreamId;

/// A state transition worth telling the host about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The navigation cursor or execution frontier moved.
    Stepped,
    /// Play/pause toggled.
    PlayChanged(bool),
    /// An external stream received a value.
    StreamChanged(StreamId),
    PassStarted(u32),
    PassEnded(u32),
    /// The pass halted on an exception value.
    Halted(u32),
    /// The engine was torn down.
    Stopped,
}

/// Stable registration handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

type Callback = Box<dyn FnMut(&Notice)>;

/// Subscriber list with queued, non-re-entrant delivery.
#[derive(Default)]
pub struct ObserverRegistry {
    next: u64,
    subscribers: Vec<(ObserverHandle, Callback)>,
    delivering: bool,
    queued: VecDeque<Notice>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        ObserverRegistry::default()
    }

    /// Register a callback; the handle unregisters it.
    pub fn observe(&mut self, callback: Callback) -> ObserverHandle {
        let handle = ObserverHandle(self.next);
        self.next += 1;
        self.subscribers.push((handle, callback));
        handle
    }

    /// Unregister. Returns whether the handle was registered.
    pub fn ignore(&mut self, handle: ObserverHandle) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(h, _)| *h != handle);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver a notice to every subscriber.
    ///
    /// Notices raised during delivery queue behind the current one.
    pub fn notify(&mut self, notice: Notice) {
        self.queued.push_back(notice);
        if self.delivering {
            return;
        }
        self.delivering = true;
        while let Some(next) = self.queued.pop_front() {
            for (_, callback) in &mut self.subscribers {
                callback(&next);
            }
        }
        self.delivering = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_observe_and_ignore() {
        let seen = Rc::new(RefCell::new(0));
        let mut registry = ObserverRegistry::new();
        let seen2 = seen.clone();
        let handle = registry.observe(Box::new(move |_| *seen2.borrow_mut() += 1));

        registry.notify(Notice::Stepped);
        assert_eq!(*seen.borrow(), 1);

        assert!(registry.ignore(handle));
        registry.notify(Notice::Stepped);
        assert_eq!(*seen.borrow(), 1);

        assert!(!registry.ignore(handle));
    }

    #[test]
    fn test_handles_are_stable_across_unregistration() {
        let mut registry = ObserverRegistry::new();
        let a = registry.observe(Box::new(|_| {}));
        let b = registry.observe(Box::new(|_| {}));
        assert!(registry.ignore(a));
        assert!(registry.ignore(b));
        assert_ne!(a, b);
    }
}
