//! 拨号目标（`schema://authority/endpoint`）

use std::fmt;

use crate::error::{ResolverError, Result};

/// 构造拨号目标 `"{schema}:///{server_name}"`
pub fn dial_target(schema: &str, server_name: &str) -> String {
    format!("{}:///{}", schema, server_name)
}

/// 解析后的拨号目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub schema: String,
    pub authority: String,
    /// 路径去掉前导 `/` 后的部分，即逻辑服务名
    pub endpoint: String,
}

impl Target {
    /// 解析拨号目标
    pub fn parse(target: &str) -> Result<Self> {
        let (schema, rest) = target
            .split_once("://")
            .ok_or_else(|| ResolverError::invalid_target(target, "missing \"://\""))?;
        if schema.is_empty() {
            return Err(ResolverError::invalid_target(target, "empty schema"));
        }

        let (authority, endpoint) = rest
            .split_once('/')
            .ok_or_else(|| ResolverError::invalid_target(target, "missing path"))?;
        if endpoint.is_empty() {
            return Err(ResolverError::invalid_target(target, "empty server name"));
        }

        Ok(Self {
            schema: schema.to_string(),
            authority: authority.to_string(),
            endpoint: endpoint.to_string(),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.schema, self.authority, self.endpoint)
    }
}
