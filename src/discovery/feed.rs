//! 服务发现源抽象
//!
//! feed 负责轮询、存储、选主等所有与发现数据来源相关的工作，
//! 解析层只通过回调接收完整快照

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::discovery::record::{ServerName, ServiceRecord};
use crate::error::{ResolverError, Result};

/// 快照回调，每次传入一个完整快照
pub type DiscoveryCallback = Arc<dyn Fn(&[ServiceRecord]) + Send + Sync>;

/// 订阅选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedOptions {
    /// 只订阅该类型的记录（None 表示全部）
    pub record_type: Option<String>,
}

impl FeedOptions {
    pub fn with_record_type(record_type: impl Into<String>) -> Self {
        Self {
            record_type: Some(record_type.into()),
        }
    }
}

/// 服务发现源
///
/// 同一个订阅的回调必须串行投递；不同订阅之间没有顺序要求
pub trait DiscoveryFeed: Send + Sync {
    /// 注册回调并开始投递快照
    fn start(&self, callback: DiscoveryCallback, options: FeedOptions) -> Result<()>;
}

struct Subscription {
    callback: DiscoveryCallback,
    options: FeedOptions,
}

/// 进程内服务发现源
///
/// 由调用方通过 `publish` 手动推送快照，适用于测试以及自行管理数据来源的场景
pub struct ManualFeed {
    subscriptions: Mutex<Vec<Arc<Subscription>>>,
    /// 串行化同一个 feed 的投递
    publish_lock: Mutex<()>,
    max_subscriptions: Option<usize>,
}

impl ManualFeed {
    /// 创建允许多次订阅的 feed
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            publish_lock: Mutex::new(()),
            max_subscriptions: None,
        }
    }

    /// 创建只允许一次订阅的 feed，第二次 `start` 返回错误
    pub fn single_subscriber() -> Self {
        Self {
            max_subscriptions: Some(1),
            ..Self::new()
        }
    }

    /// 当前订阅数
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// 向所有订阅者推送一个完整快照
    pub fn publish(&self, records: &[ServiceRecord]) {
        let _serial = self.publish_lock.lock();
        let subscriptions: Vec<_> = self.subscriptions.lock().clone();

        debug!(
            records = records.len(),
            subscriptions = subscriptions.len(),
            "Publishing discovery snapshot"
        );

        for subscription in subscriptions {
            match subscription.options.record_type.as_deref() {
                None => (subscription.callback)(records),
                Some(record_type) => {
                    let filtered: Vec<ServiceRecord> = records
                        .iter()
                        .filter(|record| match ServerName::parse(&record.service_name) {
                            Ok(name) => name.record_type == record_type,
                            // 交给订阅方记录解码失败
                            Err(_) => true,
                        })
                        .cloned()
                        .collect();
                    (subscription.callback)(&filtered);
                }
            }
        }
    }
}

impl Default for ManualFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryFeed for ManualFeed {
    fn start(&self, callback: DiscoveryCallback, options: FeedOptions) -> Result<()> {
        let mut subscriptions = self.subscriptions.lock();
        if let Some(max) = self.max_subscriptions {
            if subscriptions.len() >= max {
                return Err(ResolverError::feed(format!(
                    "feed supports at most {} subscription(s)",
                    max
                )));
            }
        }
        subscriptions.push(Arc::new(Subscription { callback, options }));
        Ok(())
    }
}
