// Built-in plugins attached to the client and server configs

pub mod bundle_analyzer;
pub mod external;
pub mod omit_api_routes;
pub mod remove_unused_imports;

pub use bundle_analyzer::BundleAnalyzerPlugin;
pub use external::ExternalPlugin;
pub use omit_api_routes::OmitApiRoutesPlugin;
pub use remove_unused_imports::RemoveUnusedImportsPlugin;
