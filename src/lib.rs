/// Scholar Results Proxy Library
///
/// Exposes the service modules so the binary and the integration tests can
/// build the same router.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod results;
pub mod server;

pub use context::AppContext;
