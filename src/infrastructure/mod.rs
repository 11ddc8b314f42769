// Infrastructure layer
pub mod file_system;
pub mod process_bundler;
pub mod vendor_resolver;

pub use file_system::*;
pub use process_bundler::*;
pub use vendor_resolver::*;
