use std::fmt;

use crate::models::ItemKind;

/// Identity of one keyed collection: what kind of entity, under which scope.
///
/// Examples: `ModelId::of(ItemKind::Account)` is "the logged-in accounts";
/// `ModelId::of(ItemKind::Room).scoped("@alice:example.org")` is "the rooms
/// of @alice:example.org".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    pub kind: ItemKind,
    pub scopes: Vec<String>,
}

impl ModelId {
    pub fn of(kind: ItemKind) -> Self {
        Self {
            kind,
            scopes: Vec::new(),
        }
    }

    pub fn scoped(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// The shape this identity instantiates: type tag plus scope arity.
    pub fn shape(&self) -> ModelShape {
        ModelShape {
            kind: self.kind,
            arity: self.scopes.len(),
        }
    }

    pub fn first_scope(&self) -> Option<&str> {
        self.scopes.first().map(String::as_str)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for scope in &self.scopes {
            write!(f, "/{scope}")?;
        }
        Ok(())
    }
}

/// A legal collection form, declared at startup. Requesting a collection
/// whose shape was never declared fails with `InvalidIdentity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelShape {
    pub kind: ItemKind,
    pub arity: usize,
}

impl ModelShape {
    pub fn new(kind: ItemKind, arity: usize) -> Self {
        Self { kind, arity }
    }
}

impl fmt::Display for ModelShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.arity)
    }
}

/// Key of one item within a collection.
///
/// Source collections use plain string ids. Derived views key mirrored
/// entries by (source identity, original key), which nests naturally when a
/// view is itself the source of another view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Id(String),
    Sourced { source: ModelId, key: Box<ItemKey> },
}

impl ItemKey {
    pub fn id(value: impl Into<String>) -> Self {
        ItemKey::Id(value.into())
    }

    pub fn sourced(source: ModelId, key: ItemKey) -> Self {
        ItemKey::Sourced {
            source,
            key: Box::new(key),
        }
    }

    /// The source identity component of a mirrored key, if any.
    pub fn source(&self) -> Option<&ModelId> {
        match self {
            ItemKey::Id(_) => None,
            ItemKey::Sourced { source, .. } => Some(source),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Id(id) => f.write_str(id),
            ItemKey::Sourced { source, key } => write!(f, "{source}/{key}"),
        }
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        ItemKey::id(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_counts_scopes() {
        let id = ModelId::of(ItemKind::Member)
            .scoped("@alice:example.org")
            .scoped("!room:example.org");

        assert_eq!(id.shape(), ModelShape::new(ItemKind::Member, 2));
        assert_eq!(id.first_scope(), Some("@alice:example.org"));
    }

    #[test]
    fn display_forms() {
        let id = ModelId::of(ItemKind::Room).scoped("@alice:example.org");
        assert_eq!(id.to_string(), "room/@alice:example.org");

        let key = ItemKey::sourced(id, ItemKey::id("!room:example.org"));
        assert_eq!(key.to_string(), "room/@alice:example.org/!room:example.org");
    }
}
