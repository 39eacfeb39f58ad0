//! 地址推送目标
//!
//! watcher 在创建时以及每次刷新时同步调用 `update_state`。
//! sink 的失败由 sink 自己处理（记录日志），不会反馈给解析层

use parking_lot::Mutex;
use std::collections::BTreeSet;
use tokio::sync::{mpsc, watch};
use tonic::transport::channel::Change;
use tonic::transport::{Channel, Endpoint};
use tracing::warn;

use crate::discovery::{Address, AddressList};

/// 地址推送目标（对应客户端通道内部的负载均衡状态）
///
/// `update_state` 中可以再调用 builder 或正在推送的 watcher
/// （创建新的 watcher、`resolve_now`、`close`），推送会在同一线程上重入；
/// sink 自身因此也要允许重入，不能在持有自己的锁时回调 watcher
pub trait AddressSink: Send + Sync {
    /// 推送最新的完整地址集合
    fn update_state(&self, addresses: &AddressList);
}

/// 推送到 `watch` 通道，接收方总能读到最新的地址集合
impl AddressSink for watch::Sender<AddressList> {
    fn update_state(&self, addresses: &AddressList) {
        self.send_replace(addresses.clone());
    }
}

/// 闭包适配器
pub struct FnSink<F>(pub F);

impl<F> AddressSink for FnSink<F>
where
    F: Fn(&AddressList) + Send + Sync,
{
    fn update_state(&self, addresses: &AddressList) {
        (self.0)(addresses)
    }
}

/// tonic balance channel 适配器
///
/// 对比前后两次地址集合，转换为 insert/remove 事件发送给
/// `Channel::balance_channel` 返回的 sender
pub struct BalanceChannelSink {
    tx: mpsc::Sender<Change<Address, Endpoint>>,
    /// 已成功发送给 balance channel 的地址
    current: Mutex<BTreeSet<Address>>,
}

impl BalanceChannelSink {
    pub fn new(tx: mpsc::Sender<Change<Address, Endpoint>>) -> Self {
        Self {
            tx,
            current: Mutex::new(BTreeSet::new()),
        }
    }

    /// 创建 balance channel 以及对应的 sink（需要在 tokio runtime 中调用）
    pub fn channel(capacity: usize) -> (Channel, Self) {
        let (channel, tx) = Channel::balance_channel(capacity);
        (channel, Self::new(tx))
    }

    /// 当前已下发的地址
    pub fn endpoints(&self) -> Vec<Address> {
        self.current.lock().iter().cloned().collect()
    }
}

impl AddressSink for BalanceChannelSink {
    fn update_state(&self, addresses: &AddressList) {
        let mut current = self.current.lock();

        let removed: Vec<Address> = current
            .iter()
            .filter(|address| !addresses.contains(address))
            .cloned()
            .collect();
        for address in removed {
            match self.tx.try_send(Change::Remove(address.clone())) {
                Ok(()) => {
                    current.remove(&address);
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "Failed to remove endpoint from balance channel");
                }
            }
        }

        for address in addresses.iter() {
            if current.contains(address) {
                continue;
            }
            let endpoint = match Endpoint::from_shared(address.to_grpc_uri()) {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    warn!(address = %address, error = %e, "Invalid endpoint address");
                    continue;
                }
            };
            match self.tx.try_send(Change::Insert(address.clone(), endpoint)) {
                Ok(()) => {
                    current.insert(address.clone());
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "Failed to insert endpoint into balance channel");
                }
            }
        }
    }
}
