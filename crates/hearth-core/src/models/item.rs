use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::{Account, Device, Member, Room, RoomEvent, Upload};

/// The closed set of entity kinds the store knows about. Doubles as the type
/// tag of a collection identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Account,
    Device,
    Room,
    Member,
    Event,
    Upload,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Account => "account",
            ItemKind::Device => "device",
            ItemKind::Room => "room",
            ItemKind::Member => "member",
            ItemKind::Event => "event",
            ItemKind::Upload => "upload",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability required of anything held in a keyed collection: deterministic
/// ordering for display, and a serialization view for the UI layer. The store
/// never inspects anything else about an item.
pub trait ModelItem: Clone + Ord + 'static {
    fn kind(&self) -> ItemKind;
    fn serialized(&self) -> Value;
}

/// Tagged union of every storable entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Item {
    Account(Account),
    Device(Device),
    Room(Room),
    Member(Member),
    Event(RoomEvent),
    Upload(Upload),
}

impl ModelItem for Item {
    fn kind(&self) -> ItemKind {
        match self {
            Item::Account(_) => ItemKind::Account,
            Item::Device(_) => ItemKind::Device,
            Item::Room(_) => ItemKind::Room,
            Item::Member(_) => ItemKind::Member,
            Item::Event(_) => ItemKind::Event,
            Item::Upload(_) => ItemKind::Upload,
        }
    }

    fn serialized(&self) -> Value {
        let serialized = match self {
            Item::Account(inner) => serde_json::to_value(inner),
            Item::Device(inner) => serde_json::to_value(inner),
            Item::Room(inner) => serde_json::to_value(inner),
            Item::Member(inner) => serde_json::to_value(inner),
            Item::Event(inner) => serde_json::to_value(inner),
            Item::Upload(inner) => serde_json::to_value(inner),
        };
        serialized.unwrap_or(Value::Null)
    }
}
