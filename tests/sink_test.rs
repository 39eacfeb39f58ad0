//! sink 适配器测试

mod common;

use common::{addrs, grpc_record};
use flare_resolver::{
    Address, AddressList, BalanceChannelSink, FnSink, ManualFeed, SchemaRegistry,
    AddressSink,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, timeout};
use tonic::transport::channel::Change;

fn recv_change(rx: &mut mpsc::Receiver<Change<Address, tonic::transport::Endpoint>>) -> String {
    match rx.try_recv().expect("expected a change") {
        Change::Insert(address, _) => format!("+{}", address),
        Change::Remove(address) => format!("-{}", address),
    }
}

/// 测试：watch 通道作为 sink
#[tokio::test]
async fn test_watch_sink_receives_updates() {
    let registry = SchemaRegistry::new();
    let feed = Arc::new(ManualFeed::new());
    let builder = registry.register("sch", feed.clone()).unwrap();

    let (tx, mut rx) = watch::channel(AddressList::new());
    let _watcher = builder.build("svc", Arc::new(tx));
    assert!(rx.borrow_and_update().is_empty());

    feed.publish(&[grpc_record("10.0.0.1", 9000, "svc", "1")]);

    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("Timed out waiting for update")
        .unwrap();
    assert_eq!(*rx.borrow(), addrs(&[("10.0.0.1", 9000)]));
}

/// 测试：闭包 sink
#[tokio::test]
async fn test_fn_sink() {
    let registry = SchemaRegistry::new();
    let builder = registry
        .register("sch", Arc::new(ManualFeed::new()))
        .unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let watcher = builder.build(
        "svc",
        Arc::new(FnSink(move |_: &AddressList| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    );
    watcher.refresh();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// 测试：balance sink 将地址变化转换为 insert/remove
#[tokio::test]
async fn test_balance_sink_diffs_address_lists() {
    let (tx, mut rx) = mpsc::channel(16);
    let sink = BalanceChannelSink::new(tx);

    sink.update_state(&addrs(&[("10.0.0.1", 9000), ("10.0.0.2", 9000)]));
    assert_eq!(recv_change(&mut rx), "+10.0.0.1:9000");
    assert_eq!(recv_change(&mut rx), "+10.0.0.2:9000");

    sink.update_state(&addrs(&[("10.0.0.2", 9000), ("10.0.0.3", 9000)]));
    assert_eq!(recv_change(&mut rx), "-10.0.0.1:9000");
    assert_eq!(recv_change(&mut rx), "+10.0.0.3:9000");
    assert!(rx.try_recv().is_err());

    sink.update_state(&AddressList::new());
    assert_eq!(recv_change(&mut rx), "-10.0.0.2:9000");
    assert_eq!(recv_change(&mut rx), "-10.0.0.3:9000");
    assert!(sink.endpoints().is_empty());
}

/// 测试：通道已满时只记录成功下发的地址，下次推送补齐
#[tokio::test]
async fn test_balance_sink_retries_unsent_addresses_on_next_push() {
    let (tx, mut rx) = mpsc::channel(1);
    let sink = BalanceChannelSink::new(tx);
    let all = addrs(&[("10.0.0.1", 9000), ("10.0.0.2", 9000)]);

    sink.update_state(&all);
    assert_eq!(sink.endpoints(), vec![Address::new("10.0.0.1", 9000)]);
    assert_eq!(recv_change(&mut rx), "+10.0.0.1:9000");

    sink.update_state(&all);
    assert_eq!(recv_change(&mut rx), "+10.0.0.2:9000");
    assert_eq!(sink.endpoints().len(), 2);
}

/// 测试：watcher 驱动 tonic balance channel
#[tokio::test]
async fn test_balance_channel_sink_with_watcher() {
    let registry = SchemaRegistry::new();
    let feed = Arc::new(ManualFeed::new());
    let builder = registry.register("sch", feed.clone()).unwrap();

    let (_channel, sink) = BalanceChannelSink::channel(16);
    let sink = Arc::new(sink);
    let watcher = builder.build("svc", sink.clone());

    feed.publish(&[grpc_record("127.0.0.1", 50051, "svc", "1")]);
    watcher.resolve_now();

    assert_eq!(sink.endpoints(), vec![Address::new("127.0.0.1", 50051)]);
}
