//! 服务发现记录定义
//!
//! feed 每次回调推送的是完整快照（不是增量），由若干 `ServiceRecord` 组成

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::error::{ResolverError, Result};

/// 默认记录类型（gRPC 服务）
pub const RECORD_TYPE_GRPC: &str = "grpc";

/// 元数据中携带 gRPC 服务类名列表的键
pub const META_GRPC_CLASS: &str = "grpc-class";

/// 服务发现记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceRecord {
    /// 主机地址
    pub host: String,

    /// 端口
    pub port: u16,

    /// 编码后的服务名（`{record_type}:{logical_name}:{instance_id}`）
    pub service_name: String,

    /// 元数据
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ServiceRecord {
    /// 创建新的服务发现记录
    pub fn new(host: impl Into<String>, port: u16, service_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            service_name: service_name.into(),
            metadata: HashMap::new(),
        }
    }

    /// 添加元数据
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// 设置 gRPC 服务类名列表（写入 `grpc-class` 元数据，分号分隔）
    pub fn with_classes<I, S>(self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = classes
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(";");
        self.with_meta(META_GRPC_CLASS, joined)
    }

    /// 解码服务名
    pub fn server_name(&self) -> Result<ServerName> {
        ServerName::parse(&self.service_name)
    }

    /// 记录对应的地址
    pub fn address(&self) -> Address {
        Address::new(self.host.clone(), self.port)
    }

    /// 从 JSON 解码一个完整快照
    pub fn snapshot_from_json(bytes: &[u8]) -> Result<Vec<ServiceRecord>> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// 解码后的服务名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerName {
    /// 记录类型（如 grpc、grpc-web）
    pub record_type: String,

    /// 逻辑服务名，用于地址分组
    pub logical_name: String,

    /// 实例 ID
    pub instance_id: String,
}

impl ServerName {
    /// 编码为 `{record_type}:{logical_name}:{instance_id}`
    pub fn encode(record_type: &str, logical_name: &str, instance_id: &str) -> String {
        format!("{}:{}:{}", record_type, logical_name, instance_id)
    }

    /// 解码服务名
    ///
    /// 类型和逻辑名必须非空；实例 ID 取剩余部分，可以为空或包含 `:`
    pub fn parse(encoded: &str) -> Result<Self> {
        let mut parts = encoded.splitn(3, ':');
        let (Some(record_type), Some(logical_name), Some(instance_id)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(ResolverError::invalid_server_name(
                encoded,
                "expected {type}:{name}:{id}",
            ));
        };

        if record_type.is_empty() {
            return Err(ResolverError::invalid_server_name(encoded, "empty record type"));
        }
        if logical_name.is_empty() {
            return Err(ResolverError::invalid_server_name(encoded, "empty logical name"));
        }

        Ok(Self {
            record_type: record_type.to_string(),
            logical_name: logical_name.to_string(),
            instance_id: instance_id.to_string(),
        })
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.record_type, self.logical_name, self.instance_id)
    }
}

/// 服务端点地址
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    pub host: String,
    pub port: u16,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// 转换为 gRPC URI
    pub fn to_grpc_uri(&self) -> String {
        format!("http://{}", self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// 某个逻辑服务名在某个 schema 下的地址集合
///
/// 每次服务发现事件整体替换，不做增量合并；重复的 `host:port` 只保留一份
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressList(BTreeSet<Address>);

impl AddressList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Address) -> bool {
        self.0.insert(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.0.iter()
    }

    /// 地址字符串列表（`host:port`），有序
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|a| a.to_string()).collect()
    }
}

impl FromIterator<Address> for AddressList {
    fn from_iter<T: IntoIterator<Item = Address>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for AddressList {
    type Item = Address;
    type IntoIter = std::collections::btree_set::IntoIter<Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a Address;
    type IntoIter = std::collections::btree_set::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
