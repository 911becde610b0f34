use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use streamdex_dispatch::{DispatchError, Dispatcher, Operation};
use streamdex_sink::{
    BackendCall, ClusterInfo, IndexSettings, MemoryBackend, SearchBackend, SinkError, SinkResult,
};
use streamdex_types::{
    AttributeMap, ChangeEvent, Document, EventKind, MappingEntry, SchemaMapping, TaggedValue,
};

const ORDERS_ARN: &str =
    "arn:aws:dynamodb:us-east-1:123456789012:table/Orders/stream/2024-01-01T00:00:00.000";

fn s(text: &str) -> TaggedValue {
    TaggedValue::String(text.into())
}

fn n(text: &str) -> TaggedValue {
    TaggedValue::Number(text.into())
}

fn order_keys(pk: &str, sk: &str) -> AttributeMap {
    AttributeMap::new().with("pk", s(pk)).with("sk", n(sk))
}

fn order_image(pk: &str, sk: &str, total: &str) -> AttributeMap {
    order_keys(pk, sk).with("total", n(total))
}

fn insert(pk: &str, sk: &str, total: &str) -> ChangeEvent {
    ChangeEvent::created(ORDERS_ARN, order_keys(pk, sk), order_image(pk, sk, total))
}

fn memory(name: &str) -> (MemoryBackend, Arc<dyn SearchBackend>) {
    let backend = MemoryBackend::new(name);
    let handle: Arc<dyn SearchBackend> = Arc::new(backend.clone());
    (backend, handle)
}

/// Answers index checks with an error, accepts everything else.
struct BrokenIndexCheck;

#[async_trait]
impl SearchBackend for BrokenIndexCheck {
    fn name(&self) -> &str {
        "broken"
    }

    async fn write_document(&self, _: &str, _: &str, _: &Document) -> SinkResult<()> {
        Ok(())
    }

    async fn delete_document(&self, _: &str, _: &str) -> SinkResult<()> {
        Ok(())
    }

    async fn index_exists(&self, _: &str) -> SinkResult<bool> {
        Err(SinkError::Status {
            status: 403,
            body: "forbidden".into(),
        })
    }

    async fn create_index(&self, _: &str, _: &IndexSettings) -> SinkResult<()> {
        Ok(())
    }

    async fn cluster_info(&self) -> SinkResult<ClusterInfo> {
        Err(SinkError::Rejected("unavailable".into()))
    }
}

// ── Planning ────────────────────────────────────────────────────

#[test]
fn plan_insert_is_upsert_of_decoded_image() {
    let dispatcher = Dispatcher::new(None);
    let op = dispatcher.plan(&insert("A", "1", "9.99")).unwrap();

    let mut document = Document::new();
    document.insert("pk".into(), json!("A"));
    document.insert("sk".into(), json!(1));
    document.insert("total".into(), json!(9.99));
    assert_eq!(
        op,
        Operation::Upsert {
            index: "orders".into(),
            id: "A|1".into(),
            document,
        }
    );
}

#[test]
fn plan_remove_is_delete() {
    let dispatcher = Dispatcher::new(None);
    let event = ChangeEvent::deleted(ORDERS_ARN, AttributeMap::new().with("id", n("42")));
    assert_eq!(
        dispatcher.plan(&event).unwrap(),
        Operation::Delete {
            index: "orders".into(),
            id: "42".into(),
        }
    );
}

#[test]
fn plan_uses_mapping() {
    let mapping = SchemaMapping::new().with("orders", MappingEntry::composite("pk", "sk"));
    let dispatcher = Dispatcher::new(Some(Arc::new(mapping)));
    let event = ChangeEvent::deleted(
        ORDERS_ARN,
        AttributeMap::new().with("sk", n("1")).with("pk", s("A")),
    );
    assert_eq!(dispatcher.plan(&event).unwrap().id(), "A|1");
}

#[test]
fn plan_modify_without_image_fails() {
    let dispatcher = Dispatcher::new(None);
    let event = ChangeEvent::new(EventKind::Updated, ORDERS_ARN, order_keys("A", "1"), None);
    let err = dispatcher.plan(&event).unwrap_err();
    assert!(matches!(err, DispatchError::MissingNewImage(EventKind::Updated)));
}

#[test]
fn plan_bad_locator_fails() {
    let dispatcher = Dispatcher::new(None);
    let event = ChangeEvent::deleted("not-a-locator", order_keys("A", "1"));
    assert!(matches!(
        dispatcher.plan(&event).unwrap_err(),
        DispatchError::MalformedLocator(_)
    ));
}

#[test]
fn plan_keeps_wide_numeric_keys_apart() {
    let dispatcher = Dispatcher::new(None);
    let remove = |digits: &str| {
        ChangeEvent::deleted(ORDERS_ARN, AttributeMap::new().with("id", n(digits)))
    };
    let first = dispatcher.plan(&remove("123456789012345678901")).unwrap();
    let second = dispatcher.plan(&remove("123456789012345678902")).unwrap();
    assert_eq!(first.id(), "123456789012345678901");
    assert_ne!(first.id(), second.id());
}

// ── Index creation ──────────────────────────────────────────────

#[tokio::test]
async fn upsert_creates_missing_index_first() {
    let (store, handle) = memory("es");
    let dispatcher = Dispatcher::new(None).with_backend(handle);

    let outcome = dispatcher
        .dispatch_event(&insert("A", "1", "5"))
        .await
        .unwrap();
    assert!(outcome.is_acknowledged());

    let calls = store.calls().await;
    assert_eq!(calls[0], BackendCall::IndexExists { index: "orders".into() });
    assert_eq!(calls[1], BackendCall::CreateIndex { index: "orders".into() });
    assert!(matches!(calls[2], BackendCall::Write { ref id, .. } if id == "A|1"));
}

#[tokio::test]
async fn existing_index_is_checked_on_every_upsert() {
    let (store, handle) = memory("es");
    let dispatcher = Dispatcher::new(None).with_backend(handle);

    dispatcher.dispatch_batch(&[insert("A", "1", "5"), insert("B", "2", "6")]).await;

    let calls = store.calls().await;
    let checks = calls
        .iter()
        .filter(|c| matches!(c, BackendCall::IndexExists { .. }))
        .count();
    let creates = calls
        .iter()
        .filter(|c| matches!(c, BackendCall::CreateIndex { .. }))
        .count();
    assert_eq!(checks, 2);
    assert_eq!(creates, 1);
}

#[tokio::test]
async fn delete_skips_index_check() {
    let (store, handle) = memory("es");
    let dispatcher = Dispatcher::new(None).with_backend(handle);

    dispatcher
        .dispatch_event(&ChangeEvent::deleted(ORDERS_ARN, order_keys("A", "1")))
        .await
        .unwrap();

    assert_eq!(
        store.calls().await,
        vec![BackendCall::Delete {
            index: "orders".into(),
            id: "A|1".into(),
        }]
    );
}

#[tokio::test]
async fn backend_without_index_creation_writes_directly() {
    let store = MemoryBackend::new("os").without_index_creation();
    let dispatcher = Dispatcher::new(None).with_backend(Arc::new(store.clone()));

    dispatcher
        .dispatch_event(&insert("A", "1", "5"))
        .await
        .unwrap();

    let calls = store.calls().await;
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], BackendCall::Write { .. }));
}

#[tokio::test]
async fn failed_index_check_is_a_backend_failure() {
    let (store, handle) = memory("healthy");
    let dispatcher = Dispatcher::new(None)
        .with_backend(Arc::new(BrokenIndexCheck))
        .with_backend(handle);

    let report = dispatcher.dispatch_batch(&[insert("A", "1", "5")]).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].backend.as_deref(), Some("broken"));
    assert_eq!(store.document_count().await, 1);
}

// ── Failure isolation ───────────────────────────────────────────

#[tokio::test]
async fn bad_event_does_not_stop_the_batch() {
    let (store, handle) = memory("es");
    let dispatcher = Dispatcher::new(None).with_backend(handle);

    let bad = ChangeEvent::created(
        ORDERS_ARN,
        order_keys("B", "2"),
        order_keys("B", "2").with("total", n("twelve")),
    )
    .with_event_id("evt-2");
    let events = [insert("A", "1", "5"), bad, insert("C", "3", "7")];

    let report = dispatcher.dispatch_batch(&events).await;

    assert_eq!(report.total, 3);
    assert_eq!(report.acknowledged, 2);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.position, 1);
    assert_eq!(failure.event_id.as_deref(), Some("evt-2"));
    assert_eq!(failure.backend, None);
    assert!(matches!(failure.error, DispatchError::Decode(_)));

    assert!(store.document("orders", "A|1").await.is_some());
    assert!(store.document("orders", "B|2").await.is_none());
    assert!(store.document("orders", "C|3").await.is_some());
}

#[tokio::test]
async fn failing_backend_does_not_block_the_next() {
    let failing = MemoryBackend::rejecting("A");
    let (healthy, handle) = memory("B");
    let dispatcher = Dispatcher::new(None)
        .with_backend(Arc::new(failing.clone()))
        .with_backend(handle);

    let report = dispatcher.dispatch_batch(&[insert("A", "1", "5")]).await;

    assert_eq!(report.total, 1);
    assert_eq!(report.acknowledged, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].backend.as_deref(), Some("A"));
    assert!(matches!(
        report.failures[0].error,
        DispatchError::Backend { ref backend, source: SinkError::Rejected(_) } if backend == "A"
    ));
    assert_eq!(failing.mutations().await.len(), 1);
    assert!(healthy.document("orders", "A|1").await.is_some());
}

#[tokio::test]
async fn every_failing_backend_is_reported() {
    let dispatcher = Dispatcher::new(None)
        .with_backend(Arc::new(MemoryBackend::rejecting("A")))
        .with_backend(Arc::new(MemoryBackend::rejecting("B")));

    let report = dispatcher
        .dispatch_batch(&[insert("A", "1", "5"), insert("B", "2", "6")])
        .await;

    assert_eq!(report.failures.len(), 4);
    assert_eq!(report.failed_positions(), vec![0, 1]);
    let backends: Vec<_> = report
        .failures
        .iter()
        .filter_map(|f| f.backend.as_deref())
        .collect();
    assert_eq!(backends, vec!["A", "B", "A", "B"]);
}

#[tokio::test]
async fn no_backends_acknowledges_everything() {
    let dispatcher = Dispatcher::new(None);
    let report = dispatcher.dispatch_batch(&[insert("A", "1", "5")]).await;
    assert_eq!(report.acknowledged, 1);
    assert!(report.is_clean());
}

// ── End to end ──────────────────────────────────────────────────

#[tokio::test]
async fn remove_deletes_from_every_backend() {
    let (first, first_handle) = memory("es");
    let (second, second_handle) = memory("os");
    let dispatcher = Dispatcher::new(None)
        .with_backend(first_handle)
        .with_backend(second_handle);

    let event = ChangeEvent::deleted(
        "arn:aws:dynamodb:us-east-1:1:table/Users/stream/2024",
        AttributeMap::new().with("id", n("42")),
    );
    let report = dispatcher.dispatch_batch(&[event]).await;
    assert!(report.is_clean());

    let expected = vec![BackendCall::Delete {
        index: "users".into(),
        id: "42".into(),
    }];
    assert_eq!(first.calls().await, expected);
    assert_eq!(second.calls().await, expected);
}

#[tokio::test]
async fn modify_replaces_whole_document() {
    let (store, handle) = memory("es");
    let dispatcher = Dispatcher::new(None).with_backend(handle);

    let first = ChangeEvent::created(
        ORDERS_ARN,
        order_keys("A", "1"),
        order_image("A", "1", "5").with("note", s("gift")),
    );
    let second = ChangeEvent::updated(ORDERS_ARN, order_keys("A", "1"), order_image("A", "1", "6"));
    dispatcher.dispatch_batch(&[first, second]).await;

    let document = store.document("orders", "A|1").await.unwrap();
    assert_eq!(document.get("total"), Some(&json!(6)));
    assert!(document.get("note").is_none());
}

// ── Raw records ─────────────────────────────────────────────────

#[tokio::test]
async fn records_with_parse_errors_are_isolated() {
    let (store, handle) = memory("es");
    let dispatcher = Dispatcher::new(None).with_backend(handle);

    let records = vec![
        json!({
            "eventID": "1",
            "eventName": "INSERT",
            "eventSourceARN": ORDERS_ARN,
            "dynamodb": {
                "Keys": {"pk": {"S": "A"}, "sk": {"N": "1"}},
                "NewImage": {"pk": {"S": "A"}, "sk": {"N": "1"}, "_id": {"S": "x"}}
            }
        }),
        json!({
            "eventID": "2",
            "eventName": "TRUNCATE",
            "eventSourceARN": ORDERS_ARN,
            "dynamodb": {"Keys": {"pk": {"S": "B"}}}
        }),
        json!({
            "eventID": "3",
            "eventName": "REMOVE",
            "eventSourceARN": ORDERS_ARN,
            "dynamodb": {"Keys": {"pk": {"S": "A"}, "sk": {"N": "1"}}}
        }),
    ];

    let report = dispatcher.dispatch_records(&records).await;

    assert_eq!(report.total, 3);
    assert_eq!(report.acknowledged, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].position, 1);
    assert_eq!(report.failures[0].event_id.as_deref(), Some("2"));
    assert!(matches!(report.failures[0].error, DispatchError::Record(_)));

    let written = store.mutations().await;
    assert_eq!(written.len(), 2);
    match &written[0] {
        BackendCall::Write { document, .. } => {
            assert_eq!(document.get("__id"), Some(&json!("x")));
        }
        other => panic!("expected write, got {other:?}"),
    }
    assert_eq!(store.document_count().await, 0);
}
