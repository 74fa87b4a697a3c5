use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::{Principal, SessionState};

/// Callback invoked with the new value on every session change.
pub type SessionCallback = Arc<dyn Fn(Option<&Principal>) + Send + Sync>;

/// Identifier of a registered subscriber, unique per store.
pub type SubscriberId = u64;

struct Register {
    value: Option<Principal>,
    /// Bumped on every `set`.
    generation: u64,
    /// Last generation delivered to every subscriber.
    delivered: u64,
    delivering: bool,
    next_subscriber_id: SubscriberId,
    subscribers: Vec<(SubscriberId, SessionCallback)>,
}

struct Shared {
    register: Mutex<Register>,
    watch: watch::Sender<Option<Principal>>,
}

impl Shared {
    /// The register only holds plain data, so a poisoned lock still contains
    /// the last complete write.
    fn lock(&self) -> MutexGuard<'_, Register> {
        self.register.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the principal currently signed in to this client, or none.
///
/// The store is an explicitly constructed handle: clone it and pass it to
/// whatever needs identity state. Every `set` replaces the value atomically
/// and fans the new value out to subscribers in call order.
#[derive(Clone)]
pub struct SessionStore {
    shared: Arc<Shared>,
}

impl SessionStore {
    /// Creates an anonymous store.
    pub fn new() -> Self {
        Self::with_initial(None)
    }

    /// Creates a store holding `initial`, e.g. what an authenticator reports
    /// synchronously at startup.
    pub fn with_initial(initial: Option<Principal>) -> Self {
        let (sender, _) = watch::channel(initial.clone());
        SessionStore {
            shared: Arc::new(Shared {
                register: Mutex::new(Register {
                    value: initial,
                    generation: 0,
                    delivered: 0,
                    delivering: false,
                    next_subscriber_id: 1,
                    subscribers: Vec::new(),
                }),
                watch: sender,
            }),
        }
    }

    /// Returns a copy of the principal currently held.
    pub fn current(&self) -> Option<Principal> {
        self.shared.lock().value.clone()
    }

    /// Returns the current value as a [`SessionState`].
    pub fn state(&self) -> SessionState {
        self.current().into()
    }

    /// Replaces the held principal unconditionally and notifies subscribers.
    ///
    /// Notifications are delivered on the calling thread before `set`
    /// returns. A `set` issued from inside a callback (or from another thread
    /// while a delivery round is running) supersedes the running round: no
    /// subscriber receives the older value after the newer one was set.
    pub fn set(&self, principal: Option<Principal>) {
        {
            let mut register = self.shared.lock();
            log_transition(register.value.as_ref(), principal.as_ref());
            register.value = principal.clone();
            register.generation += 1;
            self.shared.watch.send_replace(principal);
            if register.delivering {
                return;
            }
            register.delivering = true;
        }
        self.deliver();
    }

    /// Registers `callback` for every subsequent change.
    ///
    /// The current value is not replayed. Dropping the returned
    /// [`Subscription`] unsubscribes.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Principal>) + Send + Sync + 'static,
    {
        let mut register = self.shared.lock();
        let id = register.next_subscriber_id;
        register.next_subscriber_id += 1;
        let callback: SessionCallback = Arc::new(callback);
        register.subscribers.push((id, callback));
        debug!("Registered session subscriber {}", id);
        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Returns a receiver that always holds the latest value. Intermediate
    /// values may be coalesced when the receiver lags.
    pub fn watch(&self) -> watch::Receiver<Option<Principal>> {
        self.shared.watch.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    /// Returns a handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakSessionStore {
        WeakSessionStore {
            shared: Arc::downgrade(&self.shared),
        }
    }

    fn deliver(&self) {
        let _guard = DeliveryGuard {
            shared: &self.shared,
        };
        loop {
            let (generation, value, ids) = {
                let mut register = self.shared.lock();
                if register.generation == register.delivered {
                    register.delivering = false;
                    return;
                }
                let ids: Vec<SubscriberId> =
                    register.subscribers.iter().map(|(id, _)| *id).collect();
                (register.generation, register.value.clone(), ids)
            };

            let mut superseded = false;
            for id in ids {
                let callback = {
                    let register = self.shared.lock();
                    if register.generation != generation {
                        superseded = true;
                        break;
                    }
                    match register.subscribers.iter().find(|(sid, _)| *sid == id) {
                        Some((_, callback)) => callback.clone(),
                        // unsubscribed during this round
                        None => continue,
                    }
                };
                callback(value.as_ref());
            }

            if !superseded {
                let mut register = self.shared.lock();
                if register.generation == generation {
                    register.delivered = generation;
                }
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let register = self.shared.lock();
        f.debug_struct("SessionStore")
            .field("value", &register.value)
            .field("subscribers", &register.subscribers.len())
            .finish()
    }
}

/// Clears the delivering flag when a callback panics, so later `set` calls
/// still start a delivery round.
struct DeliveryGuard<'a> {
    shared: &'a Shared,
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.shared.lock().delivering = false;
        }
    }
}

fn log_transition(previous: Option<&Principal>, next: Option<&Principal>) {
    match (previous, next) {
        (None, Some(p)) => info!(uid = %p.uid, "Session signed in"),
        (Some(p), None) => info!(uid = %p.uid, "Session signed out"),
        (Some(old), Some(new)) if old.uid != new.uid => {
            info!(previous_uid = %old.uid, uid = %new.uid, "Session switched account")
        }
        (Some(p), Some(_)) => debug!(uid = %p.uid, "Session principal refreshed"),
        (None, None) => debug!("Session remains anonymous"),
    }
}

/// Handle returned by [`SessionStore::subscribe`]. Unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes the callback"]
pub struct Subscription {
    id: SubscriberId,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Removes the callback. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.lock().subscribers.retain(|(id, _)| *id != self.id);
            debug!("Removed session subscriber {}", self.id);
        }
    }
}

/// Non-owning handle to a [`SessionStore`].
#[derive(Clone)]
pub struct WeakSessionStore {
    shared: Weak<Shared>,
}

impl WeakSessionStore {
    pub fn upgrade(&self) -> Option<SessionStore> {
        self.shared.upgrade().map(|shared| SessionStore { shared })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;

    fn recorder() -> (Arc<Mutex<Vec<Option<String>>>>, impl Fn(Option<&Principal>) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback = move |p: Option<&Principal>| {
            sink.lock().unwrap().push(p.map(|p| p.uid.clone()));
        };
        (seen, callback)
    }

    #[test]
    fn test_new_store_is_anonymous() {
        let store = SessionStore::new();
        assert_eq!(store.current(), None);
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_initial_value_is_returned_before_any_set() {
        let store = SessionStore::with_initial(Some(Principal::new("boot")));
        assert_eq!(store.current(), Some(Principal::new("boot")));
    }

    #[test]
    fn test_sign_in_sign_out_switch_sequence() {
        let store = SessionStore::new();

        store.set(Some(Principal::new("u1")));
        assert_eq!(store.current(), Some(Principal::new("u1")));

        store.set(None);
        assert_eq!(store.current(), None);

        store.set(Some(Principal::new("u2")));
        assert_eq!(store.current(), Some(Principal::new("u2")));
    }

    #[test]
    fn test_set_returns_value_untransformed() {
        let store = SessionStore::new();
        let principal = Principal::new("u1")
            .with_display_name("User One")
            .with_email("u1@example.com")
            .with_provider_id("google.com");
        store.set(Some(principal.clone()));
        assert_eq!(store.current(), Some(principal));
    }

    #[test]
    fn test_sign_out_is_absolute() {
        let store = SessionStore::with_initial(Some(Principal::new("boot")));
        store.set(Some(Principal::new("u1")));
        store.set(Some(Principal::new("u2")));
        store.set(None);
        assert_eq!(store.current(), None);
        store.set(None);
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_subscribers_receive_values_in_order() {
        let store = SessionStore::new();
        let (seen, callback) = recorder();
        let _subscription = store.subscribe(callback);

        store.set(Some(Principal::new("u1")));
        store.set(None);
        store.set(Some(Principal::new("u2")));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("u1".to_string()), None, Some("u2".to_string())]
        );
    }

    #[test]
    fn test_subscribe_does_not_replay_current_value() {
        let store = SessionStore::with_initial(Some(Principal::new("boot")));
        let (seen, callback) = recorder();
        let _subscription = store.subscribe(callback);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dropping_subscription_stops_notifications() {
        let store = SessionStore::new();
        let (seen, callback) = recorder();
        let subscription = store.subscribe(callback);
        assert_eq!(store.subscriber_count(), 1);

        store.set(Some(Principal::new("u1")));
        subscription.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);
        store.set(Some(Principal::new("u2")));

        assert_eq!(*seen.lock().unwrap(), vec![Some("u1".to_string())]);
    }

    #[test]
    fn test_callback_can_read_current_value() {
        let store = SessionStore::new();
        let reader = store.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = store.subscribe(move |p| {
            // the register must already hold the delivered value
            assert_eq!(reader.current().as_ref(), p);
            sink.lock().unwrap().push(p.cloned());
        });

        store.set(Some(Principal::new("u1")));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reentrant_set_supersedes_stale_round() {
        let store = SessionStore::new();
        let writer = store.clone();

        let (first_seen, first_record) = recorder();
        let _first = store.subscribe(move |p| {
            first_record(p);
            if p.map(|p| p.uid.as_str()) == Some("u1") {
                writer.set(Some(Principal::new("u2")));
            }
        });
        let (second_seen, second_record) = recorder();
        let _second = store.subscribe(second_record);

        store.set(Some(Principal::new("u1")));

        assert_eq!(store.current(), Some(Principal::new("u2")));
        assert_eq!(
            *first_seen.lock().unwrap(),
            vec![Some("u1".to_string()), Some("u2".to_string())]
        );
        // The u1 round was abandoned before reaching the second subscriber.
        assert_eq!(*second_seen.lock().unwrap(), vec![Some("u2".to_string())]);
    }

    #[test]
    fn test_unsubscribe_from_inside_callback() {
        let store = SessionStore::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot_in_callback = slot.clone();
        let count = Arc::new(Mutex::new(0));
        let count_in_callback = count.clone();

        let subscription = store.subscribe(move |_| {
            *count_in_callback.lock().unwrap() += 1;
            slot_in_callback.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(subscription);

        store.set(Some(Principal::new("u1")));
        store.set(Some(Principal::new("u2")));

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_ordered_sets_from_two_threads_leave_last_value() {
        let store = SessionStore::new();

        let first = store.clone();
        thread::spawn(move || first.set(Some(Principal::new("p1"))))
            .join()
            .unwrap();
        let second = store.clone();
        thread::spawn(move || second.set(Some(Principal::new("p2"))))
            .join()
            .unwrap();

        assert_eq!(store.current(), Some(Principal::new("p2")));
    }

    #[test]
    fn test_concurrent_sets_never_tear_or_invent_values() {
        let store = SessionStore::new();
        let (seen, callback) = recorder();
        let _subscription = store.subscribe(callback);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let uid = format!("t{}-{}", t, i);
                        store.set(Some(Principal::new(uid.clone()).with_email(uid)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let current = store.current().expect("a principal must be set");
        assert_eq!(current.email.as_deref(), Some(current.uid.as_str()));

        // Each thread's values must reach the subscriber in that thread's order.
        let seen = seen.lock().unwrap();
        for t in 0..8 {
            let prefix = format!("t{}-", t);
            let indices: Vec<u32> = seen
                .iter()
                .flatten()
                .filter_map(|uid| uid.strip_prefix(&prefix))
                .map(|i| i.parse().unwrap())
                .collect();
            assert!(indices.windows(2).all(|w| w[0] < w[1]), "out of order: {:?}", indices);
        }
    }

    #[tokio::test]
    async fn test_watch_receiver_tracks_latest_value() {
        let store = SessionStore::new();
        let mut receiver = store.watch();
        assert_eq!(*receiver.borrow(), None);

        store.set(Some(Principal::new("u1")));
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), Some(Principal::new("u1")));

        store.set(Some(Principal::new("u2")));
        store.set(None);
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), None);
    }

    #[test]
    fn test_weak_handle_does_not_keep_store_alive() {
        let store = SessionStore::new();
        let weak = store.downgrade();
        assert!(weak.upgrade().is_some());
        drop(store);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_subscription_outliving_store_is_harmless() {
        let store = SessionStore::new();
        let subscription = store.subscribe(|_| {});
        drop(store);
        drop(subscription);
    }
}
