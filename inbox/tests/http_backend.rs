#![cfg(feature = "http")]

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::oneshot;

use inbox::{
    ChangeRecord, FlushOutcome, HttpBackend, Inbox, InboxConfig, InboxError, MemoryBackend,
    Message, MessageBackend, View,
};

const COOKIE: &str = "session=admin";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == COOKIE)
}

async fn list(
    State(store): State<Arc<MemoryBackend>>,
    Path(view): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Message>>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let view: View = view.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    let messages = store
        .fetch(view)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(messages))
}

async fn put_many(
    State(store): State<Arc<MemoryBackend>>,
    headers: HeaderMap,
    Json(records): Json<Vec<ChangeRecord>>,
) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    match store.put_many(&records).await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Serve `store` under `/api` on an ephemeral port
async fn start_api(store: Arc<MemoryBackend>) -> (String, oneshot::Sender<()>) {
    let app = Router::new()
        .route("/api/messages/putMany", put(put_many))
        .route("/api/messages/:view", get(list))
        .with_state(store);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind api");
    let addr = listener.local_addr().expect("api addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });
    tokio::spawn(async move {
        let _ = server.await;
    });

    (format!("http://{}/api", addr), shutdown_tx)
}

fn seeded() -> Arc<MemoryBackend> {
    let store = MemoryBackend::new();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    for id in 1..=3 {
        store.insert(Message::new(
            id,
            "Visitor",
            "visitor@example.com",
            "Hello",
            "Loved the gallery",
            start + chrono::Duration::days(id),
        ));
    }
    Arc::new(store)
}

fn config(api_url: String, cookie: Option<&str>) -> InboxConfig {
    InboxConfig {
        api_url,
        auth_cookie: cookie.map(str::to_string),
        ..Default::default()
    }
}

#[test_log::test(tokio::test)]
async fn inbox_syncs_through_http_api() {
    let store = seeded();
    let (url, shutdown) = start_api(store.clone()).await;
    let backend = Arc::new(HttpBackend::new(&config(url, Some(COOKIE))).unwrap());

    let (inbox, _events) = Inbox::new(backend, InboxConfig::default());
    assert_eq!(inbox.load().await.unwrap(), 3);
    assert_eq!(inbox.snapshot().item_ids(), vec![3, 2, 1]);

    inbox.set_archived(&[2], true);
    inbox.set_deleted(&[1], true);
    assert_eq!(inbox.flush_now().await.unwrap(), FlushOutcome::Flushed(2));
    let batches = store.batches();
    assert_eq!(batches.len(), 1);
    let deleted = &batches[0][0];
    assert_eq!(deleted.id, 1);
    assert_eq!(deleted.is_deleted, Some(true));
    assert!(matches!(deleted.deleted_date, Some(Some(_))));
    assert_eq!(
        batches[0][1],
        ChangeRecord {
            id: 2,
            is_archived: Some(true),
            ..Default::default()
        }
    );
    assert!(store.get(1).unwrap().deleted_date.is_some());

    assert_eq!(inbox.switch_view(View::Deleted).await.unwrap(), 1);
    inbox.delete_forever(&[1]);
    inbox.close().await.unwrap();
    assert!(store.get(1).is_none());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn rejected_request_maps_to_status_error() {
    let store = seeded();
    let (url, shutdown) = start_api(store.clone()).await;
    let backend = HttpBackend::new(&config(url, None)).unwrap();

    let err = backend.fetch(View::Regular).await.unwrap_err();
    assert!(matches!(err, InboxError::Status { status: 401, .. }));

    let records = vec![ChangeRecord {
        id: 1,
        is_read: Some(true),
        ..Default::default()
    }];
    let err = backend.put_many(&records).await.unwrap_err();
    assert!(matches!(err, InboxError::Status { status: 401, .. }));
    assert!(store.batches().is_empty());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn server_failure_keeps_batch_pending() {
    let store = seeded();
    let (url, shutdown) = start_api(store.clone()).await;
    let backend = Arc::new(HttpBackend::new(&config(url, Some(COOKIE))).unwrap());
    let (inbox, _events) = Inbox::new(backend, InboxConfig::default());
    inbox.load().await.unwrap();

    store.set_failing(true);
    inbox.set_read(&[3], true);
    let err = inbox.flush_now().await.unwrap_err();
    assert!(matches!(err, InboxError::Status { status: 500, .. }));
    assert_eq!(inbox.snapshot().pending_changes, 1);
    assert!(!store.get(3).unwrap().is_read);

    store.set_failing(false);
    assert_eq!(inbox.flush_now().await.unwrap(), FlushOutcome::Flushed(1));
    assert!(store.get(3).unwrap().is_read);

    let _ = shutdown.send(());
}
