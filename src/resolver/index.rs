//! 服务发现附属索引
//!
//! 由同一批发现快照派生，供与名称解析无关的查询使用：
//! - 存活索引：`(schema, 服务名)` → 最近一次出现在快照中的时间
//! - 类名索引：gRPC 服务类名 → 拨号目标 `schema:///服务名`
//!
//! 两个索引只增不删（条目在服务从快照消失后仍然保留）

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// 附属索引，在同一个 `SchemaRegistry` 的所有 builder 之间共享
#[derive(Debug, Default)]
pub struct SideIndices {
    liveness: DashMap<String, DateTime<Utc>>,
    class_targets: DashMap<String, String>,
}

fn liveness_key(schema: &str, server_name: &str) -> String {
    format!("{}:{}", schema, server_name)
}

impl SideIndices {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark_discovered(&self, schema: &str, server_name: &str, at: DateTime<Utc>) {
        self.liveness.insert(liveness_key(schema, server_name), at);
    }

    pub(crate) fn map_class(&self, class_name: &str, dial_target: &str) {
        self.class_targets
            .insert(class_name.to_string(), dial_target.to_string());
    }

    /// 该服务名是否曾在 schema 的快照中出现过
    pub fn has_been_discovered(&self, schema: &str, server_name: &str) -> bool {
        self.liveness
            .contains_key(&liveness_key(schema, server_name))
    }

    /// 最近一次出现在快照中的时间
    pub fn last_seen(&self, schema: &str, server_name: &str) -> Option<DateTime<Utc>> {
        self.liveness
            .get(&liveness_key(schema, server_name))
            .map(|entry| *entry.value())
    }

    /// 根据 gRPC 服务类名查找拨号目标
    pub fn lookup_dial_target(&self, class_name: &str) -> Option<String> {
        self.class_targets
            .get(class_name)
            .map(|entry| entry.value().clone())
    }
}
