//! 基于服务发现的动态名称解析
//!
//! 数据流：feed → `DiscoveryBuilder::on_discovery` → 替换缓存 → 异步扇出 →
//! 每个受影响的 `Watcher` 重新读取缓存并推送给 sink

pub mod builder;
pub mod index;
pub mod registry;
pub mod sink;
pub mod watcher;

pub use builder::{DiscoveryBuilder, DiscoverySummary};
pub use index::SideIndices;
pub use registry::SchemaRegistry;
pub use sink::{AddressSink, BalanceChannelSink, FnSink};
pub use watcher::Watcher;
