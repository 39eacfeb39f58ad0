//! Watcher：一个客户端通道对某个逻辑服务名的绑定
//!
//! 状态机：`Active → Closed`（单向，关闭后不再推送）

use parking_lot::{Mutex, ReentrantMutex};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::resolver::builder::DiscoveryBuilder;
use crate::resolver::sink::AddressSink;

/// watcher 的共享状态
///
/// builder 的登记表只持有 `Weak`，生命周期由 `Watcher` 句柄决定
pub(crate) struct WatcherShared {
    pub(crate) id: u64,
    pub(crate) schema: String,
    pub(crate) server_name: String,
    pub(crate) builder: Weak<DiscoveryBuilder>,
    /// 串行化推送与关闭；可重入，sink 在推送中回调本 watcher 不会死锁
    pub(crate) push_lock: ReentrantMutex<()>,
    /// `None` 表示已关闭，只在取出或替换 sink 时短暂加锁
    pub(crate) sink: Mutex<Option<Arc<dyn AddressSink>>>,
}

impl WatcherShared {
    /// 从 builder 缓存重新读取并推送，已关闭时返回 false
    pub(crate) fn refresh(&self) -> bool {
        let _push = self.push_lock.lock();
        let Some(sink) = self.current_sink() else {
            return false;
        };
        let Some(builder) = self.builder.upgrade() else {
            return false;
        };

        let addresses = builder.resolve(&self.server_name);
        sink.update_state(&addresses);
        true
    }

    pub(crate) fn current_sink(&self) -> Option<Arc<dyn AddressSink>> {
        self.sink.lock().clone()
    }

    /// 释放 sink，返回是否由本次调用完成关闭
    ///
    /// 等待其他线程上进行中的推送结束；同一线程上的重入调用直接完成
    fn release(&self) -> bool {
        let _push = self.push_lock.lock();
        let sink = self.sink.lock().take();
        sink.is_some()
    }

    fn is_closed(&self) -> bool {
        self.sink.lock().is_none()
    }
}

/// 客户端通道持有的 watcher 句柄
///
/// drop 时自动关闭
pub struct Watcher {
    shared: Arc<WatcherShared>,
}

impl Watcher {
    pub(crate) fn new(shared: Arc<WatcherShared>) -> Self {
        Self { shared }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn schema(&self) -> &str {
        &self.shared.schema
    }

    pub fn server_name(&self) -> &str {
        &self.shared.server_name
    }

    /// 重新读取 builder 缓存并推送给 sink
    ///
    /// 不会访问 feed；关闭后为空操作，返回 false
    pub fn refresh(&self) -> bool {
        self.shared.refresh()
    }

    /// 手动触发解析（transport 层的 "resolve now"），效果与 `refresh` 相同
    pub fn resolve_now(&self) -> bool {
        self.refresh()
    }

    /// 关闭 watcher 并从 builder 登记表中移除，可重复调用
    pub fn close(&self) {
        if !self.shared.release() {
            return;
        }

        if let Some(builder) = self.shared.builder.upgrade() {
            builder.watcher_closed(&self.shared.server_name, self.shared.id);
        }

        debug!(
            schema = %self.shared.schema,
            server_name = %self.shared.server_name,
            watcher_id = self.shared.id,
            "Watcher closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.shared.id)
            .field("schema", &self.shared.schema)
            .field("server_name", &self.shared.server_name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
