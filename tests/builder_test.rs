//! builder 缓存与扇出测试

mod common;

use common::{RecordingSink, addrs, grpc_record, wait_until};
use flare_resolver::{
    AddressList, AddressSink, DiscoveryBuilder, FnSink, ManualFeed, ResolverError,
    SchemaRegistry, ServiceRecord, Watcher,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

fn setup(schema: &str) -> (SchemaRegistry, Arc<ManualFeed>, Arc<DiscoveryBuilder>) {
    let registry = SchemaRegistry::new();
    let feed = Arc::new(ManualFeed::new());
    let builder = registry
        .register(schema, feed.clone())
        .expect("Failed to register schema");
    (registry, feed, builder)
}

/// 测试：发现事件之前创建的 watcher 只收到一次空推送
#[tokio::test]
async fn test_fresh_watcher_gets_single_empty_push() {
    let (_registry, _feed, builder) = setup("sch");
    let sink = RecordingSink::new();

    let watcher = builder.build("svc", sink.clone());

    assert_eq!(sink.pushes(), vec![AddressList::new()]);
    assert_eq!(builder.watcher_count("svc"), 1);
    assert_eq!(watcher.server_name(), "svc");
    assert_eq!(watcher.schema(), "sch");
}

/// 测试：新快照整体替换旧快照
#[tokio::test]
async fn test_snapshot_replaces_cache_wholesale() {
    let (_registry, feed, builder) = setup("sch");

    feed.publish(&[
        grpc_record("10.0.0.1", 9000, "svc-a", "1"),
        grpc_record("10.0.0.2", 9000, "svc-a", "2"),
        grpc_record("10.0.0.3", 9000, "svc-b", "1"),
    ]);
    assert_eq!(
        builder.resolve("svc-a"),
        addrs(&[("10.0.0.1", 9000), ("10.0.0.2", 9000)])
    );

    feed.publish(&[grpc_record("10.0.0.4", 9001, "svc-b", "2")]);

    assert!(builder.resolve("svc-a").is_empty());
    assert_eq!(builder.resolve("svc-b"), addrs(&[("10.0.0.4", 9001)]));
    assert_eq!(builder.cached_names(), vec!["svc-b".to_string()]);
}

/// 测试：解码失败的记录被跳过，其余记录正常处理
#[tokio::test]
async fn test_malformed_record_is_skipped() {
    let (_registry, _feed, builder) = setup("sch");

    let summary = builder.on_discovery(&[
        ServiceRecord::new("10.0.0.9", 9000, "not-an-encoded-name"),
        grpc_record("10.0.0.1", 9000, "svc", "1"),
        ServiceRecord::new("10.0.0.8", 9000, "grpc::2"),
    ]);

    assert_eq!(summary.records, 3);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.servers, 1);
    assert_eq!(builder.resolve("svc"), addrs(&[("10.0.0.1", 9000)]));
}

/// 测试：服务从快照消失后 watcher 收到空集合
#[tokio::test]
async fn test_empty_snapshot_is_propagated() {
    let (_registry, feed, builder) = setup("sch");
    let sink = RecordingSink::new();
    let _watcher = builder.build("svc", sink.clone());

    feed.publish(&[
        grpc_record("10.0.0.1", 9000, "svc", "1"),
        grpc_record("10.0.0.2", 9000, "svc", "2"),
    ]);
    let expected = addrs(&[("10.0.0.1", 9000), ("10.0.0.2", 9000)]);
    assert!(wait_until(|| sink.last() == Some(expected.clone())).await);

    feed.publish(&[grpc_record("10.0.0.3", 9000, "other", "1")]);
    assert!(wait_until(|| sink.last() == Some(AddressList::new())).await);
}

/// 测试：发现事件之后创建的 watcher 首次推送即为缓存内容
#[tokio::test]
async fn test_build_after_discovery_pushes_cached_snapshot() {
    let (_registry, feed, builder) = setup("sch");
    feed.publish(&[grpc_record("10.0.0.1", 9000, "svc", "1")]);

    let sink = RecordingSink::new();
    let _watcher = builder.build("svc", sink.clone());

    assert_eq!(sink.pushes()[0], addrs(&[("10.0.0.1", 9000)]));
}

/// 测试：相同的 host:port 只保留一份
#[tokio::test]
async fn test_duplicate_addresses_collapse() {
    let (_registry, _feed, builder) = setup("sch");

    builder.on_discovery(&[
        grpc_record("10.0.0.1", 9000, "svc", "1"),
        grpc_record("10.0.0.1", 9000, "svc", "2"),
    ]);

    assert_eq!(builder.resolve("svc").len(), 1);
}

/// 测试：按拨号目标创建 watcher
#[tokio::test]
async fn test_build_target() {
    let (_registry, feed, builder) = setup("sch");
    feed.publish(&[grpc_record("10.0.0.1", 9000, "svc", "1")]);

    let sink = RecordingSink::new();
    let watcher = builder
        .build_target("sch:///svc", sink.clone())
        .expect("Failed to build target");
    assert_eq!(watcher.server_name(), "svc");
    assert_eq!(sink.last(), Some(addrs(&[("10.0.0.1", 9000)])));

    let err = builder
        .build_target("other:///svc", RecordingSink::new())
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidTarget { .. }));
    assert_eq!(builder.scheme(), "sch");
}

/// 测试：sink 在推送中再调用 builder 不会死锁
#[tokio::test]
async fn test_reentrant_sink_does_not_deadlock() {
    struct ReentrantSink {
        builder: OnceLock<Arc<DiscoveryBuilder>>,
        fired: AtomicBool,
        nested: Mutex<Vec<Watcher>>,
    }

    impl AddressSink for ReentrantSink {
        fn update_state(&self, addresses: &AddressList) {
            if addresses.is_empty() || self.fired.swap(true, Ordering::SeqCst) {
                return;
            }
            if let Some(builder) = self.builder.get() {
                let _ = builder.resolve("svc");
                let watcher = builder.build("nested", Arc::new(FnSink(|_: &AddressList| {})));
                self.nested.lock().push(watcher);
            }
        }
    }

    let (_registry, feed, builder) = setup("sch");
    let sink = Arc::new(ReentrantSink {
        builder: OnceLock::new(),
        fired: AtomicBool::new(false),
        nested: Mutex::new(Vec::new()),
    });
    let _ = sink.builder.set(builder.clone());
    let _watcher = builder.build("svc", sink.clone());

    feed.publish(&[grpc_record("10.0.0.1", 9000, "svc", "1")]);

    assert!(wait_until(|| builder.watcher_count("nested") == 1).await);
    assert_eq!(sink.nested.lock().len(), 1);
}

/// 测试：没有 tokio runtime 时扇出在独立线程中完成
#[test]
fn test_fan_out_without_runtime() {
    let (_registry, feed, builder) = setup("sch");
    let sink = RecordingSink::new();
    let _watcher = builder.build("svc", sink.clone());

    feed.publish(&[grpc_record("10.0.0.1", 9000, "svc", "1")]);

    let expected = addrs(&[("10.0.0.1", 9000)]);
    assert!(tokio_test::block_on(wait_until(|| {
        sink.last() == Some(expected.clone())
    })));
    assert_eq!(sink.count(), 2);
}
