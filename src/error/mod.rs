//! 错误处理模块
//!
//! 提供统一的错误类型、错误代码分类和到 gRPC Status 的转换

pub mod code;
pub mod conversions;
pub mod resolver_error;

pub use code::ErrorCode;
pub use resolver_error::{ResolverError, Result};
