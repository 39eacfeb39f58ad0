//! Schema 注册表
//!
//! schema 与 builder 一一对应：每个 schema 只有一个 builder，也只订阅一次 feed。
//! 注册表由应用启动代码显式创建并传递给使用方，不使用全局变量。
//!
//! 注意：同一个 feed 被多个 schema 共享时，feed 需要支持多次 `start`

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{BuilderOptions, ResolverConfig};
use crate::discovery::{DiscoveryFeed, Target};
use crate::error::{ResolverError, Result};
use crate::resolver::builder::DiscoveryBuilder;
use crate::resolver::index::SideIndices;
use crate::resolver::sink::AddressSink;
use crate::resolver::watcher::Watcher;

/// Schema 注册表
pub struct SchemaRegistry {
    builders: Mutex<HashMap<String, Arc<DiscoveryBuilder>>>,
    indices: Arc<SideIndices>,
    options: BuilderOptions,
}

impl SchemaRegistry {
    /// 使用默认选项创建注册表
    pub fn new() -> Self {
        Self::with_options(BuilderOptions::default())
    }

    /// 使用指定 builder 选项创建注册表
    pub fn with_options(options: BuilderOptions) -> Self {
        Self {
            builders: Mutex::new(HashMap::new()),
            indices: Arc::new(SideIndices::new()),
            options,
        }
    }

    /// 从配置创建注册表（不注册 schema，见 `register_schemas`）
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::with_options(config.builder_options())
    }

    /// 注册 schema 并返回新建的 builder
    ///
    /// 已注册时返回 `AlreadyRegistered`，原有 builder 及其 feed 订阅不受影响；
    /// 创建失败时注册表保持原状
    pub fn register(
        &self,
        schema: &str,
        feed: Arc<dyn DiscoveryFeed>,
    ) -> Result<Arc<DiscoveryBuilder>> {
        let mut builders = self.builders.lock();

        if builders.contains_key(schema) {
            warn!(schema = %schema, "Schema has already been registered");
            return Err(ResolverError::AlreadyRegistered {
                schema: schema.to_string(),
            });
        }

        let builder =
            DiscoveryBuilder::start(schema, feed, self.options.clone(), Arc::clone(&self.indices))?;
        builders.insert(schema.to_string(), Arc::clone(&builder));

        info!(schema = %schema, "✅ Schema registered");
        Ok(builder)
    }

    /// 注册入口：只关心是否成功
    pub fn register_schema(&self, feed: Arc<dyn DiscoveryFeed>, schema: &str) -> Result<()> {
        self.register(schema, feed).map(|_| ())
    }

    /// 批量注册配置中的所有 schema
    ///
    /// 单个 schema 注册失败只记录日志；返回本次新注册的数量
    pub fn register_schemas(
        &self,
        config: &ResolverConfig,
        feed: Arc<dyn DiscoveryFeed>,
    ) -> Result<usize> {
        if config.schemas.is_empty() {
            return Err(ResolverError::config("no schema configured"));
        }

        let mut registered = 0;
        for schema in &config.schemas {
            match self.register(schema, Arc::clone(&feed)) {
                Ok(_) => registered += 1,
                Err(e) => {
                    error!(schema = %schema, error = %e, "Register schema failed");
                }
            }
        }
        Ok(registered)
    }

    /// 获取 schema 对应的 builder
    pub fn builder(&self, schema: &str) -> Option<Arc<DiscoveryBuilder>> {
        self.builders.lock().get(schema).cloned()
    }

    /// 已注册的 schema（有序）
    pub fn schemas(&self) -> Vec<String> {
        let mut schemas: Vec<String> = self.builders.lock().keys().cloned().collect();
        schemas.sort();
        schemas
    }

    /// 按拨号目标（`schema:///name`）创建 watcher
    pub fn build(&self, target: &str, sink: Arc<dyn AddressSink>) -> Result<Watcher> {
        let parsed = Target::parse(target)?;
        let builder = self
            .builder(&parsed.schema)
            .ok_or_else(|| ResolverError::UnknownSchema {
                schema: parsed.schema.clone(),
            })?;
        Ok(builder.build(&parsed.endpoint, sink))
    }

    pub fn indices(&self) -> &Arc<SideIndices> {
        &self.indices
    }

    /// 根据 gRPC 服务类名查找拨号目标
    pub fn lookup_dial_target(&self, class_name: &str) -> Option<String> {
        self.indices.lookup_dial_target(class_name)
    }

    /// 该服务名是否曾在 schema 的快照中出现过
    pub fn has_been_discovered(&self, schema: &str, server_name: &str) -> bool {
        self.indices.has_been_discovered(schema, server_name)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
