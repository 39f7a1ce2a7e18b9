pub mod cache;
pub mod notifier;
pub mod query_loader;
pub mod scholars_api;
