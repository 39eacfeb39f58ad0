//! 服务发现数据模块
//!
//! 定义服务发现源（feed）的订阅接口、快照记录以及拨号目标格式

pub mod feed;
pub mod record;
pub mod target;

pub use feed::{DiscoveryCallback, DiscoveryFeed, FeedOptions, ManualFeed};
pub use record::{
    Address, AddressList, META_GRPC_CLASS, RECORD_TYPE_GRPC, ServerName, ServiceRecord,
};
pub use target::{Target, dial_target};
