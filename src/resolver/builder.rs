//! 单个 schema 的解析器 builder
//!
//! 持有该 schema 的 feed 订阅，维护两份相互独立加锁的状态：
//! - 快照缓存：逻辑服务名 → 地址集合，每次发现事件整体替换
//! - watcher 登记表：逻辑服务名 → watcher 集合
//!
//! 任何 sink 推送都发生在两把锁之外

use chrono::Utc;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

use crate::config::BuilderOptions;
use crate::discovery::{
    AddressList, DiscoveryCallback, DiscoveryFeed, ServiceRecord, Target, dial_target,
};
use crate::error::{ResolverError, Result};
use crate::resolver::index::SideIndices;
use crate::resolver::sink::AddressSink;
use crate::resolver::watcher::{Watcher, WatcherShared};

type Snapshot = Arc<HashMap<String, AddressList>>;

/// 一次发现事件的处理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoverySummary {
    /// 快照中的记录数
    pub records: usize,
    /// 服务名解码失败而跳过的记录数
    pub skipped: usize,
    /// 新缓存中的逻辑服务名数
    pub servers: usize,
}

/// 单个 schema 的解析器 builder
pub struct DiscoveryBuilder {
    schema: String,
    options: BuilderOptions,
    feed: Arc<dyn DiscoveryFeed>,
    indices: Arc<SideIndices>,
    cache: RwLock<Snapshot>,
    watchers: RwLock<HashMap<String, HashMap<u64, Weak<WatcherShared>>>>,
    next_watcher_id: AtomicU64,
}

/// schema 会出现在拨号目标 `schema:///name` 中
fn validate_schema(schema: &str) -> Result<()> {
    if schema.is_empty() {
        return Err(ResolverError::invalid_argument("schema must not be empty"));
    }
    if schema
        .chars()
        .any(|c| c == ':' || c == '/' || c.is_whitespace())
    {
        return Err(ResolverError::invalid_argument(format!(
            "schema {} contains ':', '/' or whitespace",
            schema
        )));
    }
    Ok(())
}

impl DiscoveryBuilder {
    /// 创建 builder 并订阅 feed
    ///
    /// 订阅失败时 builder 直接丢弃，不留下任何状态
    pub(crate) fn start(
        schema: &str,
        feed: Arc<dyn DiscoveryFeed>,
        options: BuilderOptions,
        indices: Arc<SideIndices>,
    ) -> Result<Arc<Self>> {
        validate_schema(schema)?;

        let builder = Arc::new(Self {
            schema: schema.to_string(),
            options,
            feed,
            indices,
            cache: RwLock::new(Arc::new(HashMap::new())),
            watchers: RwLock::new(HashMap::new()),
            next_watcher_id: AtomicU64::new(1),
        });

        // 回调只持有 Weak，feed 与 builder 之间不形成引用环
        let weak = Arc::downgrade(&builder);
        let callback: DiscoveryCallback = Arc::new(move |records: &[ServiceRecord]| {
            if let Some(builder) = weak.upgrade() {
                builder.on_discovery(records);
            }
        });

        if let Err(e) = builder
            .feed
            .start(callback, builder.options.feed_options())
        {
            error!(schema = %schema, error = %e, "Failed to start discovery feed");
            return Err(e);
        }

        info!(
            schema = %schema,
            record_type = %builder.options.record_type,
            "Discovery builder started"
        );
        Ok(builder)
    }

    /// 对应 transport 解析扩展的 scheme，即注册时的 schema
    pub fn scheme(&self) -> &str {
        &self.schema
    }

    /// 为逻辑服务名创建 watcher
    ///
    /// 先登记再推送当前缓存（可能为空），推送期间持有该 watcher 的推送锁：
    /// 与之并发的发现事件要么已体现在首次推送中，要么随后会刷新到这个 watcher
    pub fn build(self: &Arc<Self>, server_name: &str, sink: Arc<dyn AddressSink>) -> Watcher {
        let id = self.next_watcher_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new(WatcherShared {
            id,
            schema: self.schema.clone(),
            server_name: server_name.to_string(),
            builder: Arc::downgrade(self),
            push_lock: ReentrantMutex::new(()),
            sink: Mutex::new(Some(sink)),
        });

        {
            let _push = shared.push_lock.lock();

            self.watchers
                .write()
                .entry(server_name.to_string())
                .or_default()
                .insert(id, Arc::downgrade(&shared));

            let addresses = self.resolve(server_name);
            if let Some(sink) = shared.current_sink() {
                sink.update_state(&addresses);
            }

            debug!(
                schema = %self.schema,
                server_name = %server_name,
                watcher_id = id,
                addresses = addresses.len(),
                "Watcher built"
            );
        }

        Watcher::new(shared)
    }

    /// 按拨号目标创建 watcher（路径去掉前导 `/` 即服务名）
    pub fn build_target(
        self: &Arc<Self>,
        target: &str,
        sink: Arc<dyn AddressSink>,
    ) -> Result<Watcher> {
        let parsed = Target::parse(target)?;
        if parsed.schema != self.schema {
            return Err(ResolverError::invalid_target(
                target,
                format!("schema mismatch, expected {}", self.schema),
            ));
        }
        Ok(self.build(&parsed.endpoint, sink))
    }

    /// feed 回调：用新快照整体替换缓存，并异步通知受影响的 watcher
    pub fn on_discovery(self: &Arc<Self>, records: &[ServiceRecord]) -> DiscoverySummary {
        let now = Utc::now();
        let mut snapshot: HashMap<String, AddressList> = HashMap::new();
        let mut skipped = 0;

        for record in records {
            let name = match record.server_name() {
                Ok(name) => name.logical_name,
                Err(e) => {
                    error!(
                        schema = %self.schema,
                        service_name = %record.service_name,
                        error = %e,
                        "Failed to parse server name, record skipped"
                    );
                    skipped += 1;
                    continue;
                }
            };

            snapshot
                .entry(name.clone())
                .or_default()
                .insert(record.address());

            self.indices.mark_discovered(&self.schema, &name, now);

            if let Some(classes) = record.metadata.get(&self.options.class_meta_key) {
                let target = dial_target(&self.schema, &name);
                for class in classes
                    .split(self.options.class_separator)
                    .map(str::trim)
                    .filter(|class| !class.is_empty())
                {
                    self.indices.map_class(class, &target);
                }
            }
        }

        let snapshot = Arc::new(snapshot);
        let previous = std::mem::replace(&mut *self.cache.write(), Arc::clone(&snapshot));

        let summary = DiscoverySummary {
            records: records.len(),
            skipped,
            servers: snapshot.len(),
        };
        debug!(
            schema = %self.schema,
            records = summary.records,
            skipped = summary.skipped,
            servers = summary.servers,
            "Discovery snapshot applied"
        );

        let affected: HashSet<String> = previous
            .keys()
            .chain(snapshot.keys())
            .cloned()
            .collect();
        self.spawn_fan_out(affected);

        summary
    }

    /// 在独立任务中刷新 watcher，不阻塞 feed
    fn spawn_fan_out(self: &Arc<Self>, affected: HashSet<String>) {
        if affected.is_empty() {
            return;
        }

        let builder = Arc::clone(self);
        let task = move || {
            builder.fan_out(&affected);
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(task);
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name(format!("resolver-fanout-{}", self.schema))
                    .spawn(task);
                if let Err(e) = spawned {
                    warn!(schema = %self.schema, error = %e, "Failed to spawn fan-out thread");
                }
            }
        }
    }

    /// 刷新登记在受影响服务名下的所有 watcher，返回实际推送的数量
    pub(crate) fn fan_out(&self, affected: &HashSet<String>) -> usize {
        let targets: Vec<Arc<WatcherShared>> = {
            let watchers = self.watchers.read();
            affected
                .iter()
                .filter_map(|name| watchers.get(name))
                .flat_map(|set| set.values().filter_map(Weak::upgrade))
                .collect()
        };

        let refreshed = targets.iter().filter(|watcher| watcher.refresh()).count();
        debug!(
            schema = %self.schema,
            watchers = targets.len(),
            refreshed,
            "Fan-out finished"
        );
        refreshed
    }

    /// 读取缓存，不存在时返回空集合
    pub fn resolve(&self, server_name: &str) -> AddressList {
        self.cache
            .read()
            .get(server_name)
            .cloned()
            .unwrap_or_default()
    }

    /// 从登记表移除 watcher，集合为空时删除该服务名条目（缓存不受影响）
    pub(crate) fn watcher_closed(&self, server_name: &str, watcher_id: u64) {
        let mut watchers = self.watchers.write();
        if let Some(set) = watchers.get_mut(server_name) {
            set.remove(&watcher_id);
            if set.is_empty() {
                watchers.remove(server_name);
            }
        }
    }

    /// 某服务名下登记的 watcher 数量
    pub fn watcher_count(&self, server_name: &str) -> usize {
        self.watchers
            .read()
            .get(server_name)
            .map(|set| set.len())
            .unwrap_or(0)
    }

    /// 登记表中的服务名（有序）
    pub fn watched_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.watchers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// 缓存中的服务名（有序）
    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for DiscoveryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryBuilder")
            .field("schema", &self.schema)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
