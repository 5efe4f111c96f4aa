pub mod account;
pub mod device;
pub mod item;
pub mod member;
pub mod room;
pub mod room_event;
pub mod upload;

pub use account::Account;
pub use device::Device;
pub use item::{Item, ItemKind, ModelItem};
pub use member::Member;
pub use room::Room;
pub use room_event::RoomEvent;
pub use upload::{Upload, UploadStatus};
