// Core domain layer
pub mod config;
pub mod interfaces;
pub mod merge;
pub mod models;
pub mod plugin;
pub mod services;
pub mod target_config;

pub use config::*;
pub use interfaces::*;
pub use merge::{deep_merge, merge, Deferred, DeferredField, DEFERRED_FIELDS, NO_EXTERNAL};
pub use models::*;
pub use plugin::*;
pub use services::*;
pub use target_config::*;
