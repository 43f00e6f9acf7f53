//! Change notification for [`DatasetStore`](crate::domain::store::DatasetStore).

use crate::domain::dataset::Dataset;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A dataset was loaded from tabular input, replacing any previous one.
    Loaded(Arc<Dataset>),
    /// The live dataset was replaced by an update, merge, drop or clear.
    Updated(Arc<Dataset>),
    /// The sorted symbol list differs from the one before the mutation.
    SymbolsChanged(Vec<String>),
    /// A mutation failed; the previous state is still in place.
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Registry of subscribed callbacks, invoked in subscription order.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn emit(&mut self, event: &StoreEvent) {
        for (_, listener) in self.entries.iter_mut() {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emits_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();

        let first = Rc::clone(&log);
        listeners.subscribe(move |_| first.borrow_mut().push("first"));
        let second = Rc::clone(&log);
        listeners.subscribe(move |_| second.borrow_mut().push("second"));

        listeners.emit(&StoreEvent::Error("boom".into()));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut listeners = Listeners::default();
        let c = Rc::clone(&count);
        let id = listeners.subscribe(move |_| *c.borrow_mut() += 1);

        listeners.emit(&StoreEvent::SymbolsChanged(vec![]));
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(&StoreEvent::SymbolsChanged(vec![]));

        assert_eq!(*count.borrow(), 1);
        assert!(listeners.is_empty());
    }
}
