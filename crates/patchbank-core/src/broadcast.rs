//! Listener registry for state-change notifications.

/// Token returned by [`ChangeBroadcaster::add_listener`], used to
/// unregister later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn() + Send + Sync>;

/// Fan-out point for "state changed" notifications.
///
/// Listeners run synchronously on the calling thread, in registration
/// order. The broadcaster itself carries no payload; observers re-read
/// the state they care about when called.
#[derive(Default)]
pub struct ChangeBroadcaster {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and return its removal token.
    pub fn add_listener(&mut self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` when the token was already
    /// removed or never belonged to this broadcaster.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Invoke every registered listener.
    pub fn send_change_message(&self) {
        for (_, listener) in &self.listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut bc = ChangeBroadcaster::new();
        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            bc.add_listener(move || order.lock().unwrap().push(tag));
        }
        bc.send_change_message();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_listener() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut bc = ChangeBroadcaster::new();
        let hits_a = Arc::clone(&hits);
        let id = bc.add_listener(move || {
            hits_a.fetch_add(1, Ordering::SeqCst);
        });

        bc.send_change_message();
        assert!(bc.remove_listener(id));
        bc.send_change_message();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!bc.remove_listener(id));
    }

    #[test]
    fn test_send_with_no_listeners_is_noop() {
        ChangeBroadcaster::new().send_change_message();
    }
}
