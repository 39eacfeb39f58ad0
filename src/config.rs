use serde::{Deserialize, Serialize};

use crate::discovery::{FeedOptions, META_GRPC_CLASS, RECORD_TYPE_GRPC};
use crate::error::{ResolverError, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// 需要注册的 schema 列表（共享同一个 feed）
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default = "default_record_type")]
    pub record_type: String,
    #[serde(default = "default_class_meta_key")]
    pub class_meta_key: String,
    #[serde(default = "default_class_separator")]
    pub class_separator: char,
}

fn default_record_type() -> String {
    RECORD_TYPE_GRPC.to_string()
}

fn default_class_meta_key() -> String {
    META_GRPC_CLASS.to_string()
}

fn default_class_separator() -> char {
    ';'
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            schemas: Vec::new(),
            record_type: default_record_type(),
            class_meta_key: default_class_meta_key(),
            class_separator: default_class_separator(),
        }
    }
}

impl ResolverConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ResolverConfig = toml::from_str(content)?;
        if config.record_type.is_empty() {
            return Err(ResolverError::config("record_type must not be empty"));
        }
        Ok(config)
    }

    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            record_type: self.record_type.clone(),
            class_meta_key: self.class_meta_key.clone(),
            class_separator: self.class_separator,
        }
    }
}

/// 单个 schema 的 builder 选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderOptions {
    pub record_type: String,
    pub class_meta_key: String,
    pub class_separator: char,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        ResolverConfig::default().builder_options()
    }
}

impl BuilderOptions {
    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions::with_record_type(self.record_type.clone())
    }
}
