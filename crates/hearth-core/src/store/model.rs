use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::identity::{ItemKey, ModelId};
use crate::models::ModelItem;

pub type SharedModel<T> = Rc<RefCell<Model<T>>>;

/// Change notifications from a [`Model`], delivered synchronously and in
/// subscription order before the mutating call returns. By the time the
/// mutator regains control, every observer has seen the event.
///
/// Callbacks run while the source model is mutably borrowed; an observer must
/// not call back into the source from inside a notification.
pub trait ModelObserver<T: ModelItem> {
    fn source_item_set(&self, source: &ModelId, key: &ItemKey, item: &Rc<T>, existed: bool);
    fn source_item_removed(&self, source: &ModelId, key: &ItemKey);
    fn source_cleared(&self, source: &ModelId);
}

/// Handle returned by [`Model::subscribe`]; pass it back to
/// [`Model::unsubscribe`] to detach early. Observers are held weakly, so a
/// dropped observer is pruned automatically on the next notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

#[derive(Debug)]
struct ObserverSlot<T: ModelItem> {
    id: u64,
    observer: Weak<dyn ModelObserver<T>>,
}

/// An ordered, uniquely-keyed collection of items with change notification.
///
/// Iteration follows insertion order; callers wanting a display order sort
/// explicitly via [`Model::sorted_items`]. Keys are unique within one model
/// only, different models may reuse the same key for unrelated items.
#[derive(Debug)]
pub struct Model<T: ModelItem> {
    id: ModelId,
    entries: IndexMap<ItemKey, Rc<T>>,
    observers: Vec<ObserverSlot<T>>,
    next_observer_id: u64,
}

impl<T: ModelItem> Model<T> {
    pub fn new(id: ModelId) -> Self {
        Self {
            id,
            entries: IndexMap::new(),
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }

    pub fn shared(id: ModelId) -> SharedModel<T> {
        Rc::new(RefCell::new(Self::new(id)))
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }

    /// Insert or replace. Observers receive the same event either way, with
    /// `existed` telling apart insertion from update.
    pub fn insert(&mut self, key: ItemKey, item: Rc<T>) {
        let existed = self.entries.insert(key.clone(), Rc::clone(&item)).is_some();
        let id = self.id.clone();
        self.notify(|observer| observer.source_item_set(&id, &key, &item, existed));
    }

    /// Remove `key` if present. Absent keys are a silent no-op: no event.
    pub fn remove(&mut self, key: &ItemKey) -> Option<Rc<T>> {
        let removed = self.entries.shift_remove(key)?;
        let id = self.id.clone();
        self.notify(|observer| observer.source_item_removed(&id, key));
        Some(removed)
    }

    /// Remove everything, emitting a single cleared event rather than one
    /// removal per entry, so whole-scope teardown stays cheap downstream.
    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        let id = self.id.clone();
        self.notify(|observer| observer.source_cleared(&id));
    }

    pub fn get(&self, key: &ItemKey) -> Option<&Rc<T>> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &ItemKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &Rc<T>)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.entries.keys()
    }

    /// Items sorted by their own ordering, for display.
    pub fn sorted_items(&self) -> Vec<Rc<T>> {
        let mut items: Vec<Rc<T>> = self.entries.values().cloned().collect();
        items.sort();
        items
    }

    /// Attach an observer. Events are delivered in subscription order.
    pub fn subscribe<O>(&mut self, observer: &Rc<O>) -> Subscription
    where
        O: ModelObserver<T> + 'static,
    {
        let id = self.next_observer_id;
        self.next_observer_id += 1;
        let weak = Rc::downgrade(observer);
        let observer: Weak<dyn ModelObserver<T>> = weak;
        self.observers.push(ObserverSlot { id, observer });
        Subscription(id)
    }

    pub fn unsubscribe(&mut self, subscription: &Subscription) {
        self.observers.retain(|slot| slot.id != subscription.0);
    }

    fn notify(&mut self, event: impl Fn(&dyn ModelObserver<T>)) {
        self.observers
            .retain(|slot| slot.observer.strong_count() > 0);
        // Upgrade first so an observer dropped by an earlier callback in the
        // same delivery round stays alive until it has been notified.
        let live: Vec<Rc<dyn ModelObserver<T>>> = self
            .observers
            .iter()
            .filter_map(|slot| slot.observer.upgrade())
            .collect();
        for observer in live {
            event(observer.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Item, ItemKind};

    struct Recorder {
        log: RefCell<Vec<String>>,
        tag: &'static str,
    }

    impl Recorder {
        fn new(tag: &'static str) -> Rc<Self> {
            Rc::new(Self {
                log: RefCell::new(Vec::new()),
                tag,
            })
        }
    }

    impl ModelObserver<Item> for Recorder {
        fn source_item_set(&self, _source: &ModelId, key: &ItemKey, _item: &Rc<Item>, existed: bool) {
            self.log
                .borrow_mut()
                .push(format!("{} set {key} existed={existed}", self.tag));
        }

        fn source_item_removed(&self, _source: &ModelId, key: &ItemKey) {
            self.log.borrow_mut().push(format!("{} removed {key}", self.tag));
        }

        fn source_cleared(&self, _source: &ModelId) {
            self.log.borrow_mut().push(format!("{} cleared", self.tag));
        }
    }

    fn account_item(user_id: &str) -> Rc<Item> {
        Rc::new(Item::Account(Account::new(user_id)))
    }

    fn accounts_model() -> Model<Item> {
        Model::new(ModelId::of(ItemKind::Account))
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut model = accounts_model();
        model.insert(ItemKey::id("@c:x"), account_item("@c:x"));
        model.insert(ItemKey::id("@a:x"), account_item("@a:x"));
        model.insert(ItemKey::id("@b:x"), account_item("@b:x"));

        let keys: Vec<String> = model.keys().map(ToString::to_string).collect();
        assert_eq!(keys, ["@c:x", "@a:x", "@b:x"]);

        let sorted: Vec<String> = model
            .sorted_items()
            .iter()
            .map(|item| match item.as_ref() {
                Item::Account(account) => account.user_id.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(sorted, ["@a:x", "@b:x", "@c:x"]);
    }

    #[test]
    fn replace_keeps_position_and_reports_update() {
        let mut model = accounts_model();
        let recorder = Recorder::new("r");
        model.subscribe(&recorder);

        model.insert(ItemKey::id("@a:x"), account_item("@a:x"));
        model.insert(ItemKey::id("@a:x"), account_item("@a:x"));

        assert_eq!(model.len(), 1);
        assert_eq!(
            *recorder.log.borrow(),
            ["r set @a:x existed=false", "r set @a:x existed=true"]
        );
    }

    #[test]
    fn remove_of_absent_key_emits_nothing() {
        let mut model = accounts_model();
        let recorder = Recorder::new("r");
        model.subscribe(&recorder);

        assert!(model.remove(&ItemKey::id("@ghost:x")).is_none());
        assert!(recorder.log.borrow().is_empty());
    }

    #[test]
    fn clear_emits_one_event() {
        let mut model = accounts_model();
        let recorder = Recorder::new("r");
        model.insert(ItemKey::id("@a:x"), account_item("@a:x"));
        model.insert(ItemKey::id("@b:x"), account_item("@b:x"));
        model.subscribe(&recorder);

        model.clear();
        model.clear(); // already empty, no second event

        assert_eq!(*recorder.log.borrow(), ["r cleared"]);
        assert!(model.is_empty());
    }

    #[test]
    fn observers_run_in_subscription_order() {
        let mut model = accounts_model();
        let shared_log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        struct Tap {
            tag: &'static str,
            log: Rc<RefCell<Vec<&'static str>>>,
        }
        impl ModelObserver<Item> for Tap {
            fn source_item_set(&self, _: &ModelId, _: &ItemKey, _: &Rc<Item>, _: bool) {
                self.log.borrow_mut().push(self.tag);
            }
            fn source_item_removed(&self, _: &ModelId, _: &ItemKey) {}
            fn source_cleared(&self, _: &ModelId) {}
        }

        let tap_a = Rc::new(Tap {
            tag: "a",
            log: shared_log.clone(),
        });
        let tap_b = Rc::new(Tap {
            tag: "b",
            log: shared_log.clone(),
        });
        model.subscribe(&tap_a);
        model.subscribe(&tap_b);

        model.insert(ItemKey::id("@a:x"), account_item("@a:x"));
        assert_eq!(*shared_log.borrow(), ["a", "b"]);
    }

    #[test]
    fn unsubscribe_detaches_and_dropped_observers_are_pruned() {
        let mut model = accounts_model();
        let kept = Recorder::new("kept");
        let detached = Recorder::new("detached");
        let dropped = Recorder::new("dropped");

        model.subscribe(&kept);
        let sub = model.subscribe(&detached);
        model.subscribe(&dropped);

        model.unsubscribe(&sub);
        drop(dropped);

        model.insert(ItemKey::id("@a:x"), account_item("@a:x"));

        assert_eq!(kept.log.borrow().len(), 1);
        assert!(detached.log.borrow().is_empty());
    }
}
