//! 解析器统一错误类型

use super::code::ErrorCode;
use thiserror::Error;

/// 名称解析子系统错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// 参数非法（空 schema 等）
    #[error("参数非法: {0}")]
    InvalidArgument(String),

    /// schema 已注册（重复注册属于正常情况）
    #[error("schema {schema} has registered")]
    AlreadyRegistered { schema: String },

    /// schema 未注册
    #[error("schema {schema} is not registered")]
    UnknownSchema { schema: String },

    /// 服务名称无法解码
    #[error("parse server name {name} failed: {reason}")]
    InvalidServerName { name: String, reason: String },

    /// 拨号目标格式错误
    #[error("invalid dial target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// 服务发现源订阅失败
    #[error("discovery feed error: {0}")]
    Feed(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl ResolverError {
    /// 创建参数非法错误
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        ResolverError::InvalidArgument(reason.into())
    }

    /// 创建 feed 错误
    pub fn feed(reason: impl Into<String>) -> Self {
        ResolverError::Feed(reason.into())
    }

    /// 创建配置错误
    pub fn config(reason: impl Into<String>) -> Self {
        ResolverError::Config(reason.into())
    }

    /// 创建服务名称解码错误
    pub fn invalid_server_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolverError::InvalidServerName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// 创建拨号目标错误
    pub fn invalid_target(target: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolverError::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolverError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            ResolverError::AlreadyRegistered { .. } => ErrorCode::SchemaAlreadyRegistered,
            ResolverError::UnknownSchema { .. } => ErrorCode::SchemaNotFound,
            ResolverError::InvalidServerName { .. } => ErrorCode::ServerNameInvalid,
            ResolverError::InvalidTarget { .. } => ErrorCode::TargetInvalid,
            ResolverError::Feed(_) => ErrorCode::FeedStartFailed,
            ResolverError::Config(_) => ErrorCode::ConfigInvalid,
        }
    }

    /// 是否为重复注册
    pub fn is_already_registered(&self) -> bool {
        matches!(self, ResolverError::AlreadyRegistered { .. })
    }

    /// 判断是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ResolverError>;
