pub mod identity;
pub mod model;
pub mod proxy;
pub mod registry;

pub use identity::{ItemKey, ModelId, ModelShape};
pub use model::{Model, ModelObserver, SharedModel, Subscription};
pub use proxy::ModelProxy;
pub use registry::ModelStore;
