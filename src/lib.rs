//! Flare Resolver
//!
//! Discovery-backed dynamic name resolution for gRPC clients: a per-schema
//! snapshot cache fed by a push-based discovery source, fanned out to every
//! client channel watching a logical server name.

pub mod config;
pub mod discovery;
pub mod error;
pub mod resolver;
pub mod telemetry;

// Re-exports
pub use config::{BuilderOptions, ResolverConfig};
pub use discovery::{
    Address, AddressList, DiscoveryCallback, DiscoveryFeed, FeedOptions, ManualFeed, ServerName,
    ServiceRecord, Target, dial_target,
};
pub use error::{ErrorCode, ResolverError, Result};
pub use resolver::{
    AddressSink, BalanceChannelSink, DiscoveryBuilder, DiscoverySummary, FnSink, SchemaRegistry,
    SideIndices, Watcher,
};
pub use telemetry::{init_json_tracing, init_tracing};
