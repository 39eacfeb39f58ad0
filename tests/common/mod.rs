//! 测试公共工具
#![allow(dead_code)]

use flare_resolver::{Address, AddressList, AddressSink, ServerName, ServiceRecord};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::{Duration, sleep, timeout};

/// 记录所有推送的 sink
#[derive(Default)]
pub struct RecordingSink {
    pushes: Mutex<Vec<AddressList>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pushes(&self) -> Vec<AddressList> {
        self.pushes.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.pushes.lock().len()
    }

    pub fn last(&self) -> Option<AddressList> {
        self.pushes.lock().last().cloned()
    }
}

impl AddressSink for RecordingSink {
    fn update_state(&self, addresses: &AddressList) {
        self.pushes.lock().push(addresses.clone());
    }
}

/// 创建 grpc 类型的发现记录
pub fn grpc_record(host: &str, port: u16, server_name: &str, instance_id: &str) -> ServiceRecord {
    ServiceRecord::new(host, port, ServerName::encode("grpc", server_name, instance_id))
}

pub fn addrs(pairs: &[(&str, u16)]) -> AddressList {
    pairs
        .iter()
        .map(|(host, port)| Address::new(*host, *port))
        .collect()
}

/// 轮询直到条件成立，最多等待 5 秒
pub async fn wait_until<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

/// 等待一段时间，用于确认某件事没有发生
pub async fn settle() {
    sleep(Duration::from_millis(100)).await;
}
