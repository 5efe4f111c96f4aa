use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use super::identity::{ModelId, ModelShape};
use super::model::{Model, SharedModel};
use crate::errors::CoreError;
use crate::models::{ItemKind, ModelItem};

/// Typed registry of keyed collections, addressed by [`ModelId`].
///
/// The set of legal shapes is fixed at construction; collections themselves
/// are created empty on first access. The registry is plainly owned by its
/// coordinator, there is no ambient global instance.
pub struct ModelStore<T: ModelItem> {
    allowed: HashSet<ModelShape>,
    models: RefCell<IndexMap<ModelId, SharedModel<T>>>,
}

impl<T: ModelItem> ModelStore<T> {
    pub fn new(allowed: impl IntoIterator<Item = ModelShape>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            models: RefCell::new(IndexMap::new()),
        }
    }

    /// The collection for `id`, created empty on first access. Fails with
    /// [`CoreError::InvalidIdentity`] when `id`'s shape was never declared.
    pub fn get(&self, id: &ModelId) -> Result<SharedModel<T>, CoreError> {
        if !self.allowed.contains(&id.shape()) {
            return Err(CoreError::InvalidIdentity {
                shape: id.shape().to_string(),
            });
        }
        let mut models = self.models.borrow_mut();
        let model = models
            .entry(id.clone())
            .or_insert_with(|| Model::shared(id.clone()));
        Ok(Rc::clone(model))
    }

    /// All collections, in creation order.
    pub fn models(&self) -> Vec<(ModelId, SharedModel<T>)> {
        self.models
            .borrow()
            .iter()
            .map(|(id, model)| (id.clone(), Rc::clone(model)))
            .collect()
    }

    /// Collections of one kind, regardless of scope.
    pub fn models_of(&self, kind: ItemKind) -> Vec<(ModelId, SharedModel<T>)> {
        self.models
            .borrow()
            .iter()
            .filter(|(id, _)| id.kind == kind)
            .map(|(id, model)| (id.clone(), Rc::clone(model)))
            .collect()
    }

    /// Tear down every collection whose first scope is `scope` (e.g. all
    /// collections of a removed account). Each one is cleared after removal
    /// from the registry, so derived views drop their mirrored entries.
    pub fn discard_scope(&self, scope: &str) {
        let victims: Vec<SharedModel<T>> = {
            let mut models = self.models.borrow_mut();
            let ids: Vec<ModelId> = models
                .keys()
                .filter(|id| id.first_scope() == Some(scope))
                .cloned()
                .collect();
            ids.iter()
                .filter_map(|id| models.shift_remove(id))
                .collect()
        };
        // Clearing outside the map borrow: observers may re-enter the store.
        for model in victims {
            model.borrow_mut().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, Room};
    use crate::store::identity::ItemKey;

    fn store() -> ModelStore<Item> {
        ModelStore::new([
            ModelShape::new(ItemKind::Account, 0),
            ModelShape::new(ItemKind::Room, 1),
        ])
    }

    #[test]
    fn undeclared_shape_is_rejected() {
        let store = store();

        // room collections take exactly one scope
        let err = store.get(&ModelId::of(ItemKind::Room)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidIdentity { .. }));

        let err = store
            .get(&ModelId::of(ItemKind::Member).scoped("@a:x").scoped("!r:x"))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidIdentity { .. }));
    }

    #[test]
    fn declared_shape_creates_empty_collection_once() {
        let store = store();
        let id = ModelId::of(ItemKind::Room).scoped("acc1");

        let first = store.get(&id).unwrap();
        assert!(first.borrow().is_empty());

        let second = store.get(&id).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn models_of_filters_by_kind() {
        let store = store();
        store.get(&ModelId::of(ItemKind::Account)).unwrap();
        store.get(&ModelId::of(ItemKind::Room).scoped("@a:x")).unwrap();
        store.get(&ModelId::of(ItemKind::Room).scoped("@b:x")).unwrap();

        assert_eq!(store.models().len(), 3);
        assert_eq!(store.models_of(ItemKind::Room).len(), 2);
    }

    #[test]
    fn discard_scope_clears_then_drops() {
        let store = store();
        let rooms_a = store.get(&ModelId::of(ItemKind::Room).scoped("@a:x")).unwrap();
        let rooms_b = store.get(&ModelId::of(ItemKind::Room).scoped("@b:x")).unwrap();
        rooms_a.borrow_mut().insert(
            ItemKey::id("!r:x"),
            Rc::new(Item::Room(Room::new("!r:x", "General"))),
        );
        rooms_b.borrow_mut().insert(
            ItemKey::id("!s:x"),
            Rc::new(Item::Room(Room::new("!s:x", "Other"))),
        );

        store.discard_scope("@a:x");

        assert!(rooms_a.borrow().is_empty());
        let remaining = store.models_of(ItemKind::Room);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0.first_scope(), Some("@b:x"));
        assert_eq!(rooms_b.borrow().len(), 1);
    }
}
