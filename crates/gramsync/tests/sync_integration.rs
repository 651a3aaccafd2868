//! Integration tests for sync and comment relay.
//!
//! A fake Graph API implements the public `HttpTransport` trait and serves an
//! account from memory with real cursor pagination, so the service runs
//! unmodified against an in-memory SQLite database.
//!
//! Key scenarios tested:
//! - Full imports are idempotent and independent of page size
//! - A failing request anywhere rolls back the whole sync
//! - Malformed items are skipped without failing the batch
//! - Comment relay maps missing posts and remote rejections correctly

#![cfg(all(feature = "sqlite", feature = "migrate"))]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gramsync::http::{HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use gramsync::store::{comments, posts};
use gramsync::sync::{InstagramService, ProgressCallback, SyncError, SyncProgress};
use gramsync::{GraphClient, InstagramError, connect_and_migrate};
use serde_json::{Value, json};
use url::Url;

const BASE: &str = "https://graph.fake/v25.0";

/// Maximum time any operation should take in tests.
/// If exceeded, the pagination walk is probably looping.
const OP_TIMEOUT: Duration = Duration::from_secs(10);

// ─── Fake Graph API ────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeAccount {
    media: Vec<Value>,
    comments: Vec<(String, Vec<Value>)>,
    /// Fail with a transport error when this path is requested.
    fail_on: Option<String>,
    /// Reject comment writes with this Graph error message.
    reject_writes: Option<String>,
    next_comment_id: u32,
    requests: Vec<String>,
}

#[derive(Clone, Default)]
struct FakeGraph {
    account: Arc<Mutex<FakeAccount>>,
    /// Page size used when the request has no `limit`.
    default_limit: usize,
}

impl FakeGraph {
    fn new(default_limit: usize) -> Self {
        Self {
            account: Arc::default(),
            default_limit,
        }
    }

    fn with_posts(self, count: usize, comments_per_post: usize) -> Self {
        {
            let mut account = self.account.lock().unwrap();
            for i in 0..count {
                let id = format!("media_{i}");
                account.media.push(media(&id, i));
                let comments = (0..comments_per_post)
                    .map(|c| comment(&format!("{id}_c{c}")))
                    .collect();
                account.comments.push((id, comments));
            }
        }
        self
    }

    fn edit(&self, f: impl FnOnce(&mut FakeAccount)) {
        f(&mut self.account.lock().unwrap());
    }

    fn requests(&self) -> Vec<String> {
        self.account.lock().unwrap().requests.clone()
    }

    fn page(&self, items: &[Value], url: &Url) -> Value {
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let param = |name: &str| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());

        assert_eq!(param("access_token").as_deref(), Some("tok"), "token on {url}");
        let after: usize = param("after").and_then(|a| a.parse().ok()).unwrap_or(0);
        let limit: usize = param("limit")
            .and_then(|l| l.parse().ok())
            .unwrap_or(self.default_limit);

        let end = (after + limit).min(items.len());
        let data = items[after.min(end)..end].to_vec();
        let mut body = json!({ "data": data });
        if end < items.len() {
            let mut next = url.clone();
            next.query_pairs_mut()
                .clear()
                .append_pair("access_token", "tok")
                .append_pair("limit", &limit.to_string())
                .append_pair("after", &end.to_string());
            body["paging"] = json!({ "next": next.as_str() });
        }
        body
    }
}

fn media(id: &str, day: usize) -> Value {
    json!({
        "id": id,
        "caption": format!("caption of {id}"),
        "media_url": format!("https://cdn.fake/{id}.jpg"),
        "permalink": format!("https://www.instagram.com/p/{id}/"),
        "timestamp": format!("2026-01-{:02}T10:00:00+0000", day % 28 + 1),
    })
}

fn comment(id: &str) -> Value {
    json!({
        "id": id,
        "text": format!("text of {id}"),
        "username": "visitor",
        "timestamp": "2026-02-01T09:30:00+0000",
    })
}

fn json_response(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: body.to_string().into_bytes(),
    }
}

#[async_trait]
impl HttpTransport for FakeGraph {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = Url::parse(&request.url).map_err(|e| HttpError::Transport(e.to_string()))?;
        let path = url
            .path()
            .strip_prefix("/v25.0/")
            .unwrap_or(url.path())
            .to_string();

        let mut account = self.account.lock().unwrap();
        account.requests.push(format!("{} {}", request.method.as_str(), path));

        if account.fail_on.as_deref() == Some(path.as_str()) {
            return Err(HttpError::Transport("connection reset by peer".to_string()));
        }

        match (request.method, path.as_str()) {
            (HttpMethod::Get, "me/media") => Ok(json_response(200, self.page(&account.media, &url))),
            (HttpMethod::Get, p) => {
                let media_id = p.trim_end_matches("/comments");
                let items = account
                    .comments
                    .iter()
                    .find(|(id, _)| id == media_id)
                    .map(|(_, items)| items.clone())
                    .unwrap_or_default();
                Ok(json_response(200, self.page(&items, &url)))
            }
            (HttpMethod::Post, _) => {
                if let Some(message) = account.reject_writes.clone() {
                    return Ok(json_response(
                        400,
                        json!({"error": {"message": message, "type": "IGApiException", "code": 100}}),
                    ));
                }
                let body = String::from_utf8_lossy(&request.body).into_owned();
                assert!(body.starts_with("message="), "unexpected body {body}");
                account.next_comment_id += 1;
                Ok(json_response(
                    200,
                    json!({"id": format!("ig_comment_{}", account.next_comment_id)}),
                ))
            }
        }
    }
}

async fn service(graph: &FakeGraph) -> InstagramService {
    let db = connect_and_migrate("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    let client = GraphClient::new_with_transport(BASE, "tok", Arc::new(graph.clone()));
    InstagramService::new(db, client)
}

async fn sync(service: &InstagramService) -> Result<usize, SyncError> {
    tokio::time::timeout(OP_TIMEOUT, service.sync_all_posts())
        .await
        .expect("sync should not hang")
}

// ─── Bulk Sync ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sync_imports_every_post_and_comment() {
    let graph = FakeGraph::new(25).with_posts(120, 3);
    let service = service(&graph).await;

    assert_eq!(sync(&service).await.unwrap(), 120);
    assert_eq!(posts::count(service.db()).await.unwrap(), 120);
    assert_eq!(comments::count(service.db()).await.unwrap(), 360);

    // Media is requested with the fixed projection and a page size of 50.
    let media_requests = graph
        .requests()
        .iter()
        .filter(|r| r.as_str() == "GET me/media")
        .count();
    assert_eq!(media_requests, 3);
}

#[tokio::test]
async fn test_comment_count_is_independent_of_page_size() {
    for page_size in [1, 2, 7, 100] {
        let graph = FakeGraph::new(page_size).with_posts(4, 9);
        let service = service(&graph).await;

        sync(&service).await.unwrap();
        assert_eq!(
            comments::count(service.db()).await.unwrap(),
            36,
            "page_size={page_size}"
        );
    }
}

#[tokio::test]
async fn test_resync_is_idempotent() {
    let graph = FakeGraph::new(10).with_posts(30, 2);
    let service = service(&graph).await;

    sync(&service).await.unwrap();
    let before = posts::find_by_ig_id(service.db(), "media_7")
        .await
        .unwrap()
        .unwrap();

    graph.edit(|account| account.media[7]["caption"] = json!("edited caption"));
    sync(&service).await.unwrap();

    assert_eq!(posts::count(service.db()).await.unwrap(), 30);
    assert_eq!(comments::count(service.db()).await.unwrap(), 60);

    let after = posts::find_by_ig_id(service.db(), "media_7")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.caption, "edited caption");
    assert_eq!(after.db_created_at, before.db_created_at);
}

#[tokio::test]
async fn test_failure_on_kth_post_rolls_back_everything() {
    let graph = FakeGraph::new(10).with_posts(20, 2);
    graph.edit(|account| account.fail_on = Some("media_12/comments".to_string()));
    let service = service(&graph).await;

    let err = sync(&service).await.expect_err("comment walk fails");
    assert!(matches!(
        err,
        SyncError::Transport(InstagramError::Http(_))
    ));

    assert_eq!(posts::count(service.db()).await.unwrap(), 0);
    assert_eq!(comments::count(service.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_sync_keeps_previous_import() {
    let graph = FakeGraph::new(10).with_posts(5, 1);
    let service = service(&graph).await;
    sync(&service).await.unwrap();

    graph.edit(|account| {
        account.media[0]["caption"] = json!("never committed");
        account.fail_on = Some("media_3/comments".to_string());
    });
    assert!(sync(&service).await.is_err());

    let first = posts::find_by_ig_id(service.db(), "media_0")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.caption, "caption of media_0");
    assert_eq!(posts::count(service.db()).await.unwrap(), 5);
}

#[tokio::test]
async fn test_malformed_items_are_skipped() {
    let graph = FakeGraph::new(50).with_posts(6, 2);
    graph.edit(|account| {
        account.media[2].as_object_mut().unwrap().remove("timestamp");
        account.media[4]["media_url"] = json!("not a url");
        account.comments[0].1[1]["text"] = json!("");
    });
    let service = service(&graph).await;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let callback: ProgressCallback = Box::new(move |event| sink.lock().unwrap().push(event));

    let summary = tokio::time::timeout(
        OP_TIMEOUT,
        service.sync_all_posts_with_progress(Some(&callback)),
    )
    .await
    .expect("sync should not hang")
    .expect("malformed items do not fail the sync");

    assert_eq!(summary.posts, 4);
    assert_eq!(summary.comments, 7);
    assert_eq!(summary.skipped, 3);
    assert!(posts::find_by_ig_id(service.db(), "media_2").await.unwrap().is_none());

    // Skipped posts never have their comments fetched.
    assert!(!graph.requests().contains(&"GET media_2/comments".to_string()));

    let skips = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, SyncProgress::ItemSkipped { .. }))
        .count();
    assert_eq!(skips, 3);
}

// ─── Comment Relay ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_relay_to_unknown_post_is_not_found() {
    let graph = FakeGraph::new(10);
    let service = service(&graph).await;

    let err = service.add_comment(9999, "hello").await.expect_err("no post");
    assert!(matches!(err, SyncError::NotFound { .. }));
    assert_eq!(err.status_code(), 404);
    assert!(graph.requests().is_empty());
}

#[tokio::test]
async fn test_relay_rejected_by_instagram_leaves_store_unchanged() {
    let graph = FakeGraph::new(10).with_posts(1, 1);
    let service = service(&graph).await;
    sync(&service).await.unwrap();
    let post = posts::find_by_ig_id(service.db(), "media_0")
        .await
        .unwrap()
        .unwrap();

    graph.edit(|account| account.reject_writes = Some("Media not found or deleted".to_string()));
    let err = service
        .add_comment(post.id, "hello")
        .await
        .expect_err("write is rejected");

    match err {
        SyncError::Validation { message } => {
            assert!(message.contains("Media not found or deleted"), "{message}")
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(comments::count(service.db()).await.unwrap(), 1);
    assert_eq!(
        posts::find_by_id(service.db(), post.id).await.unwrap(),
        Some(post)
    );
}

#[tokio::test]
async fn test_relayed_comment_is_stored_under_post() {
    let graph = FakeGraph::new(10).with_posts(2, 0);
    let service = service(&graph).await;
    sync(&service).await.unwrap();
    let post = posts::find_by_ig_id(service.db(), "media_1")
        .await
        .unwrap()
        .unwrap();

    let saved = service.add_comment(post.id, "hello").await.expect("relay");

    assert_eq!(saved.ig_id, "ig_comment_1");
    assert_eq!(saved.text, "hello");
    assert_eq!(saved.username, "me");
    assert_eq!(saved.post_id, post.id);
    assert_eq!(
        graph.requests().last().map(String::as_str),
        Some("POST media_1/comments")
    );

    let stored = comments::find_by_post(service.db(), post.id).await.unwrap();
    assert_eq!(stored, vec![saved]);
}
