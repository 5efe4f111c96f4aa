use std::cell::RefCell;
use std::rc::Rc;

use super::identity::{ItemKey, ModelId};
use super::model::{Model, ModelObserver, SharedModel, Subscription};
use super::registry::ModelStore;
use crate::models::ModelItem;

/// A derived view: a [`Model`] that mirrors a filtered union of other
/// collections under composite `(source identity, original key)` keys.
///
/// Construction replays the current contents of every collection in the
/// registry and subscribes to each of them; the `accept` predicate is
/// re-evaluated per event against the source's identity, so its cost must
/// stay an identity comparison. Collections created after construction are
/// not observed unless the owner wires them in with [`ModelProxy::attach`].
///
/// The inner model is itself a collection, so a proxy can serve as the
/// source of another proxy.
pub struct ModelProxy<T: ModelItem> {
    model: SharedModel<T>,
    accept: Box<dyn Fn(&ModelId) -> bool>,
    subscriptions: RefCell<Vec<(SharedModel<T>, Subscription)>>,
}

impl<T: ModelItem> ModelProxy<T> {
    pub fn new(
        id: ModelId,
        accept: impl Fn(&ModelId) -> bool + 'static,
        store: &ModelStore<T>,
    ) -> Rc<Self> {
        let proxy = Self::standalone(id, accept);
        for (_, source) in store.models() {
            proxy.attach(&source);
        }
        proxy
    }

    /// A view mirroring every collection in the registry.
    pub fn accept_all(id: ModelId, store: &ModelStore<T>) -> Rc<Self> {
        Self::new(id, |_| true, store)
    }

    /// A view with no initial sources; wire them in with [`ModelProxy::attach`].
    /// Used to layer one view on another.
    pub fn standalone(id: ModelId, accept: impl Fn(&ModelId) -> bool + 'static) -> Rc<Self> {
        Rc::new(Self {
            model: Model::shared(id),
            accept: Box::new(accept),
            subscriptions: RefCell::new(Vec::new()),
        })
    }

    /// Replay `source`'s current contents and subscribe to its mutations.
    /// Attaching the same collection twice is a no-op.
    pub fn attach(self: &Rc<Self>, source: &SharedModel<T>) {
        if Rc::ptr_eq(source, &self.model) {
            return;
        }
        if self
            .subscriptions
            .borrow()
            .iter()
            .any(|(existing, _)| Rc::ptr_eq(existing, source))
        {
            return;
        }

        {
            let src = source.borrow();
            if (self.accept)(src.id()) {
                for (key, item) in src.iter() {
                    self.model.borrow_mut().insert(
                        ItemKey::sourced(src.id().clone(), key.clone()),
                        Rc::clone(item),
                    );
                }
            }
        }

        let subscription = source.borrow_mut().subscribe(self);
        self.subscriptions
            .borrow_mut()
            .push((Rc::clone(source), subscription));
    }

    /// Unsubscribe from every source. The mirrored contents stay in place;
    /// only future mutations stop arriving.
    pub fn detach_all(&self) {
        let subscriptions: Vec<(SharedModel<T>, Subscription)> =
            self.subscriptions.borrow_mut().drain(..).collect();
        for (source, subscription) in subscriptions {
            source.borrow_mut().unsubscribe(&subscription);
        }
    }

    pub fn model(&self) -> &SharedModel<T> {
        &self.model
    }

    pub fn id(&self) -> ModelId {
        self.model.borrow().id().clone()
    }

    pub fn len(&self) -> usize {
        self.model.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.borrow().is_empty()
    }

    pub fn sorted_items(&self) -> Vec<Rc<T>> {
        self.model.borrow().sorted_items()
    }
}

impl<T: ModelItem> ModelObserver<T> for ModelProxy<T> {
    fn source_item_set(&self, source: &ModelId, key: &ItemKey, item: &Rc<T>, _existed: bool) {
        if (self.accept)(source) {
            self.model.borrow_mut().insert(
                ItemKey::sourced(source.clone(), key.clone()),
                Rc::clone(item),
            );
        }
    }

    fn source_item_removed(&self, source: &ModelId, key: &ItemKey) {
        if (self.accept)(source) {
            let composite = ItemKey::sourced(source.clone(), key.clone());
            if self.model.borrow_mut().remove(&composite).is_none() {
                // A removal for a key that was never mirrored means the
                // propagation chain itself is broken.
                debug_assert!(false, "removal of unmirrored key {composite}");
                tracing::error!(%source, key = %composite, "consistency violation: removal of unmirrored key");
            }
        }
    }

    fn source_cleared(&self, source: &ModelId) {
        if (self.accept)(source) {
            let stale: Vec<ItemKey> = self
                .model
                .borrow()
                .keys()
                .filter(|key| key.source() == Some(source))
                .cloned()
                .collect();
            let mut model = self.model.borrow_mut();
            for key in stale {
                model.remove(&key);
            }
        }
    }
}
