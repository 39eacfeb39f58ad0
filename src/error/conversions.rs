//! 错误类型转换实现
//!
//! 提供各种错误类型之间的转换

use super::ResolverError;
use std::io;
use tonic::Status;

impl From<io::Error> for ResolverError {
    fn from(err: io::Error) -> Self {
        ResolverError::config(format!("IO 错误: {}", err))
    }
}

impl From<toml::de::Error> for ResolverError {
    fn from(err: toml::de::Error) -> Self {
        ResolverError::config(format!("TOML 解析错误: {}", err))
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(err: serde_json::Error) -> Self {
        ResolverError::feed(format!("JSON 反序列化错误: {}", err))
    }
}

impl From<ResolverError> for Status {
    fn from(err: ResolverError) -> Self {
        let message = err.to_string();
        match err {
            ResolverError::AlreadyRegistered { .. } => Status::already_exists(message),
            ResolverError::UnknownSchema { .. } => Status::not_found(message),
            ResolverError::InvalidArgument(_)
            | ResolverError::InvalidServerName { .. }
            | ResolverError::InvalidTarget { .. } => Status::invalid_argument(message),
            ResolverError::Feed(_) => Status::unavailable(message),
            ResolverError::Config(_) => Status::failed_precondition(message),
        }
    }
}
