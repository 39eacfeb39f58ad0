//! 错误代码定义
//!
//! 错误代码按类别分组，每个类别占用1000个代码范围：
//! - 1000-1999: 配置相关错误
//! - 2000-2999: 注册相关错误
//! - 3000-3999: 服务发现相关错误
//! - 4000-4999: 名称解析相关错误

use serde::{Deserialize, Serialize};
use std::fmt;

/// 解析器错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 配置相关错误 (1000-1999)
    // ============================================================
    InvalidArgument = 1000,
    ConfigInvalid = 1001,

    // ============================================================
    // 注册相关错误 (2000-2999)
    // ============================================================
    SchemaAlreadyRegistered = 2000,
    SchemaNotFound = 2001,

    // ============================================================
    // 服务发现相关错误 (3000-3999)
    // ============================================================
    FeedStartFailed = 3000,
    ServerNameInvalid = 3001,

    // ============================================================
    // 名称解析相关错误 (4000-4999)
    // ============================================================
    TargetInvalid = 4000,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取数值代码
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 从数值代码转换
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            1000 => Some(ErrorCode::InvalidArgument),
            1001 => Some(ErrorCode::ConfigInvalid),
            2000 => Some(ErrorCode::SchemaAlreadyRegistered),
            2001 => Some(ErrorCode::SchemaNotFound),
            3000 => Some(ErrorCode::FeedStartFailed),
            3001 => Some(ErrorCode::ServerNameInvalid),
            4000 => Some(ErrorCode::TargetInvalid),
            _ => None,
        }
    }

    /// 获取字符串形式
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
            ErrorCode::SchemaAlreadyRegistered => "SCHEMA_ALREADY_REGISTERED",
            ErrorCode::SchemaNotFound => "SCHEMA_NOT_FOUND",
            ErrorCode::FeedStartFailed => "FEED_START_FAILED",
            ErrorCode::ServerNameInvalid => "SERVER_NAME_INVALID",
            ErrorCode::TargetInvalid => "TARGET_INVALID",
        }
    }

    /// 判断是否为可重试的错误
    ///
    /// 解析层本身不做重试，仅 feed 启动失败交由调用方决定是否重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::FeedStartFailed)
    }
}
