// dualbuild - client + SSR production builds on top of an external bundler

pub mod cli;
pub mod core;
pub mod infrastructure;
pub mod plugins;
pub mod utils;

pub use crate::core::{BuildResult, Bundler, DualBuildService};
pub use crate::utils::{DualBuildError, Result};
