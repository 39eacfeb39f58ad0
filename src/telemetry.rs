//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::error::{ResolverError, Result};

fn env_filter(default_filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| ResolverError::config(format!("invalid log filter {}: {}", default_filter, e)))
}

/// 安装 fmt 日志订阅者，`RUST_LOG` 优先于 `default_filter`
///
/// 重复调用返回错误，调用方可以忽略
pub fn init_tracing(default_filter: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter)?)
        .with_target(true)
        .try_init()
        .map_err(|e| ResolverError::config(format!("tracing init failed: {}", e)))
}

/// 安装 JSON 格式的日志订阅者
pub fn init_json_tracing(default_filter: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(default_filter)?)
        .try_init()
        .map_err(|e| ResolverError::config(format!("tracing init failed: {}", e)))
}
