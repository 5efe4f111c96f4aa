pub mod backend;
pub mod config;
pub mod errors;
pub mod gate;
pub mod logging;
pub mod models;
pub mod session;
pub mod store;
pub mod user_files;

pub use backend::{Backend, MainPaneRow, ResumeOutcome, DEFAULT_HOMESERVER};
pub use config::CoreConfig;
pub use errors::{CoreError, Result};
