//! Bulk sync and comment relay against one Instagram account.

use std::pin::pin;
use std::sync::Arc;

use chrono::Utc;
use futures::TryStreamExt;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};

use super::error::SyncError;
use super::mapper::{UpsertOutcome, upsert_comment, upsert_post};
use super::progress::{ItemKind, ProgressCallback, SyncProgress, emit};
use super::types::{COMMENT_MAX_LEN, LOCAL_AUTHOR, MEDIA_PATH, SyncSummary};
use crate::entity::{comment, post};
use crate::instagram::{
    COMMENT_FIELDS, CreatedObject, GraphClient, InstagramError, MEDIA_FIELDS, MEDIA_PAGE_SIZE,
    fields_param,
};
use crate::store::{comments, posts};

/// Keeps the local store in step with an Instagram account.
///
/// The client is injected at construction; the service holds no other state
/// between calls. Clones share the same connection.
#[derive(Debug, Clone)]
pub struct InstagramService {
    db: Arc<DatabaseConnection>,
    client: GraphClient,
    author: String,
}

impl InstagramService {
    pub fn new(db: impl Into<Arc<DatabaseConnection>>, client: GraphClient) -> Self {
        Self {
            db: db.into(),
            client,
            author: LOCAL_AUTHOR.to_string(),
        }
    }

    /// Username recorded on comments relayed through [`add_comment`](Self::add_comment).
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Import every post of the account and every comment under it.
    ///
    /// Returns the number of posts upserted. See
    /// [`sync_all_posts_with_progress`](Self::sync_all_posts_with_progress).
    pub async fn sync_all_posts(&self) -> Result<usize, SyncError> {
        let summary = self.sync_all_posts_with_progress(None).await?;
        Ok(summary.posts)
    }

    /// Import every post and comment inside one transaction.
    ///
    /// Malformed items are skipped and counted. Any Graph API or database
    /// error rolls back everything written by this call.
    pub async fn sync_all_posts_with_progress(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<SyncSummary, SyncError> {
        let txn = self.db.begin().await?;

        match self.sync_into(&txn, on_progress).await {
            Ok(summary) => {
                txn.commit().await?;
                tracing::info!(
                    posts = summary.posts,
                    comments = summary.comments,
                    skipped = summary.skipped,
                    "Sync committed"
                );
                emit(
                    on_progress,
                    SyncProgress::SyncComplete {
                        posts: summary.posts,
                        comments: summary.comments,
                        skipped: summary.skipped,
                    },
                );
                Ok(summary)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                tracing::warn!(error = %err, "Sync aborted, nothing committed");
                emit(
                    on_progress,
                    SyncProgress::SyncAborted {
                        error: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    async fn sync_into<C: ConnectionTrait>(
        &self,
        conn: &C,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<SyncSummary, SyncError> {
        let mut summary = SyncSummary::default();
        let params = vec![
            ("fields".to_string(), fields_param(MEDIA_FIELDS)),
            ("limit".to_string(), MEDIA_PAGE_SIZE.to_string()),
        ];

        emit(
            on_progress,
            SyncProgress::FetchingPosts {
                page_size: MEDIA_PAGE_SIZE,
            },
        );

        let mut media = pin!(self.client.fetch_pages(Some(MEDIA_PATH.to_string()), params));
        while let Some(raw) = media.try_next().await? {
            let saved = match upsert_post(conn, &raw).await? {
                UpsertOutcome::Saved(saved) => saved,
                UpsertOutcome::Skipped { ig_id, reason } => {
                    summary.skipped += 1;
                    report_skip(on_progress, ItemKind::Post, ig_id, reason);
                    continue;
                }
            };

            summary.posts += 1;
            let comments = self.sync_comments(conn, &saved, &mut summary, on_progress).await?;
            summary.comments += comments;

            tracing::debug!(ig_id = %saved.ig_id, comments, "Post synced");
            emit(
                on_progress,
                SyncProgress::PostSynced {
                    ig_id: saved.ig_id.clone(),
                    comments,
                    total_so_far: summary.posts,
                },
            );
        }

        Ok(summary)
    }

    /// Upsert every comment of `post`, returning how many were saved.
    async fn sync_comments<C: ConnectionTrait>(
        &self,
        conn: &C,
        post: &post::Model,
        summary: &mut SyncSummary,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<usize, SyncError> {
        let params = vec![("fields".to_string(), fields_param(COMMENT_FIELDS))];
        let mut saved = 0;

        let mut items = pin!(self.client.fetch_pages(Some(post.comments_path()), params));
        while let Some(raw) = items.try_next().await? {
            match upsert_comment(conn, post, &raw).await? {
                UpsertOutcome::Saved(_) => saved += 1,
                UpsertOutcome::Skipped { ig_id, reason } => {
                    summary.skipped += 1;
                    report_skip(on_progress, ItemKind::Comment, ig_id, reason);
                }
            }
        }

        Ok(saved)
    }

    /// Post a comment under a local post and record it locally.
    ///
    /// The post is looked up by its local key. Nothing is sent when it does
    /// not exist. A rejected write leaves the store untouched and comes back
    /// as [`SyncError::Validation`] carrying the Instagram message.
    pub async fn add_comment(&self, post_id: i32, text: &str) -> Result<comment::Model, SyncError> {
        self.add_comment_with_progress(post_id, text, None).await
    }

    /// [`add_comment`](Self::add_comment) with a `CommentRelayed` event on success.
    pub async fn add_comment_with_progress(
        &self,
        post_id: i32,
        text: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<comment::Model, SyncError> {
        let text = validate_comment_text(text)?;

        let post = posts::find_by_id(self.db.as_ref(), post_id)
            .await?
            .ok_or_else(|| SyncError::post_not_found(post_id))?;

        let form = [("message".to_string(), text.to_string())];
        let created = self
            .client
            .post(&post.comments_path(), &form)
            .await
            .and_then(|body| serde_json::from_value::<CreatedObject>(body).map_err(Into::into))
            .map_err(|e| {
                tracing::warn!(post = %post.ig_id, error = %e, "Instagram rejected comment");
                SyncError::validation(relay_error_message(&e))
            })?;

        let saved = comments::insert(
            self.db.as_ref(),
            post.id,
            comment::ActiveModel {
                ig_id: Set(created.id),
                text: Set(text.to_string()),
                username: Set(self.author.clone()),
                timestamp: Set(Utc::now().fixed_offset()),
                ..Default::default()
            },
        )
        .await?;

        tracing::info!(post = %post.ig_id, comment = %saved.ig_id, "Comment relayed");
        emit(
            on_progress,
            SyncProgress::CommentRelayed {
                post_ig_id: post.ig_id,
                comment_ig_id: saved.ig_id.clone(),
            },
        );
        Ok(saved)
    }
}

fn report_skip(
    on_progress: Option<&ProgressCallback>,
    kind: ItemKind,
    ig_id: Option<String>,
    reason: String,
) {
    tracing::warn!(%kind, ig_id = ?ig_id, %reason, "Skipping malformed item");
    emit(on_progress, SyncProgress::ItemSkipped { kind, ig_id, reason });
}

fn validate_comment_text(text: &str) -> Result<&str, SyncError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SyncError::validation("Comment text must not be empty"));
    }
    if text.chars().count() > COMMENT_MAX_LEN {
        return Err(SyncError::validation(format!(
            "Comment text must be at most {} characters",
            COMMENT_MAX_LEN
        )));
    }
    Ok(text)
}

fn relay_error_message(err: &InstagramError) -> String {
    match err {
        InstagramError::Api { message, .. } => format!("Instagram error: {}", message),
        other => format!("Instagram error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_text_is_trimmed_and_bounded() {
        assert_eq!(validate_comment_text("  hello \n").unwrap(), "hello");
        assert!(matches!(
            validate_comment_text("   "),
            Err(SyncError::Validation { .. })
        ));
        assert!(validate_comment_text(&"a".repeat(COMMENT_MAX_LEN)).is_ok());
        assert!(validate_comment_text(&"a".repeat(COMMENT_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn relay_errors_carry_the_remote_message() {
        let api = InstagramError::Api {
            status: 400,
            message: "Media not found or deleted".to_string(),
        };
        assert_eq!(
            relay_error_message(&api),
            "Instagram error: Media not found or deleted"
        );
        let http = InstagramError::Http("connection reset".to_string());
        assert!(relay_error_message(&http).contains("connection reset"));
    }

    #[cfg(all(feature = "sqlite", feature = "migrate"))]
    mod db {
        use std::sync::{Arc, Mutex};

        use serde_json::{Value, json};

        use super::*;
        use crate::connect_and_migrate;
        use crate::http::{HttpMethod, MockTransport};

        const BASE: &str = "https://graph.test/v25.0";
        const MEDIA_URL: &str = "https://graph.test/v25.0/me/media?fields=id%2Ccaption%2Cmedia_url%2Cpermalink%2Ctimestamp&limit=50&access_token=tok";

        fn comments_url(ig_id: &str) -> String {
            format!("{BASE}/{ig_id}/comments?fields=id%2Ctext%2Cusername%2Ctimestamp&access_token=tok")
        }

        fn relay_url(ig_id: &str) -> String {
            format!("{BASE}/{ig_id}/comments?access_token=tok")
        }

        fn media(id: &str, day: u32) -> Value {
            json!({
                "id": id,
                "caption": format!("caption {id}"),
                "media_url": format!("https://cdn.test/{id}.jpg"),
                "permalink": format!("https://www.instagram.com/p/{id}/"),
                "timestamp": format!("2026-01-{day:02}T12:00:00+0000")
            })
        }

        fn remote_comment(id: &str) -> Value {
            json!({
                "id": id,
                "text": format!("text {id}"),
                "username": "alice",
                "timestamp": "2026-01-20T08:00:00+0000"
            })
        }

        async fn service(transport: &MockTransport) -> InstagramService {
            let db = connect_and_migrate("sqlite::memory:").await.unwrap();
            let client = GraphClient::new_with_transport(BASE, "tok", Arc::new(transport.clone()));
            InstagramService::new(db, client)
        }

        fn script_account(transport: &MockTransport) {
            let next = format!("{BASE}/me/media?after=cursor1&limit=50&access_token=tok");
            transport.push_json(
                HttpMethod::Get,
                MEDIA_URL,
                200,
                json!({"data": [media("p1", 3), media("p2", 2)], "paging": {"next": next}}),
            );
            transport.push_json(HttpMethod::Get, next, 200, json!({"data": [media("p3", 1)]}));
            transport.push_json(
                HttpMethod::Get,
                comments_url("p1"),
                200,
                json!({"data": [remote_comment("c1"), remote_comment("c2")]}),
            );
            transport.push_json(HttpMethod::Get, comments_url("p2"), 200, json!({"data": []}));
            transport.push_json(
                HttpMethod::Get,
                comments_url("p3"),
                200,
                json!({"data": [remote_comment("c3")]}),
            );
        }

        #[tokio::test]
        async fn sync_imports_posts_and_comments() {
            let transport = MockTransport::new();
            script_account(&transport);
            let service = service(&transport).await;

            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&events);
            let callback: ProgressCallback = Box::new(move |e| sink.lock().unwrap().push(e));

            let summary = service
                .sync_all_posts_with_progress(Some(&callback))
                .await
                .expect("sync");

            assert_eq!(
                summary,
                SyncSummary {
                    posts: 3,
                    comments: 3,
                    skipped: 0
                }
            );
            assert_eq!(posts::count(service.db()).await.unwrap(), 3);
            assert_eq!(comments::count(service.db()).await.unwrap(), 3);

            let p1 = posts::find_by_ig_id(service.db(), "p1").await.unwrap().unwrap();
            assert_eq!(comments::find_by_post(service.db(), p1.id).await.unwrap().len(), 2);

            let events = events.lock().unwrap();
            assert!(matches!(events.first(), Some(SyncProgress::FetchingPosts { page_size: 50 })));
            assert!(matches!(
                events.last(),
                Some(SyncProgress::SyncComplete { posts: 3, comments: 3, skipped: 0 })
            ));
        }

        #[tokio::test]
        async fn sync_twice_is_idempotent() {
            let transport = MockTransport::new();
            script_account(&transport);
            script_account(&transport);
            let service = service(&transport).await;

            assert_eq!(service.sync_all_posts().await.unwrap(), 3);
            let first_ids: Vec<i32> = posts::list(service.db(), Default::default())
                .await
                .unwrap()
                .items
                .iter()
                .map(|p| p.post.id)
                .collect();

            assert_eq!(service.sync_all_posts().await.unwrap(), 3);
            let second_ids: Vec<i32> = posts::list(service.db(), Default::default())
                .await
                .unwrap()
                .items
                .iter()
                .map(|p| p.post.id)
                .collect();

            assert_eq!(first_ids, second_ids);
            assert_eq!(posts::count(service.db()).await.unwrap(), 3);
            assert_eq!(comments::count(service.db()).await.unwrap(), 3);
        }

        #[tokio::test]
        async fn transport_failure_rolls_back_everything() {
            let transport = MockTransport::new();
            let next = format!("{BASE}/me/media?after=cursor1&limit=50&access_token=tok");
            transport.push_json(
                HttpMethod::Get,
                MEDIA_URL,
                200,
                json!({"data": [media("p1", 3)], "paging": {"next": next}}),
            );
            transport.push_json(
                HttpMethod::Get,
                comments_url("p1"),
                200,
                json!({"data": [remote_comment("c1")]}),
            );
            transport.push_failure(HttpMethod::Get, next, "connection reset by peer");
            let service = service(&transport).await;

            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&events);
            let callback: ProgressCallback = Box::new(move |e| sink.lock().unwrap().push(e));

            let err = service
                .sync_all_posts_with_progress(Some(&callback))
                .await
                .expect_err("second page fails");
            assert!(matches!(err, SyncError::Transport(InstagramError::Http(_))));
            assert_eq!(err.status_code(), 502);

            assert_eq!(posts::count(service.db()).await.unwrap(), 0);
            assert_eq!(comments::count(service.db()).await.unwrap(), 0);
            assert!(matches!(
                events.lock().unwrap().last(),
                Some(SyncProgress::SyncAborted { .. })
            ));
        }

        #[tokio::test]
        async fn malformed_items_are_skipped() {
            let transport = MockTransport::new();
            transport.push_json(
                HttpMethod::Get,
                MEDIA_URL,
                200,
                json!({"data": [
                    media("p1", 3),
                    {"caption": "no id", "timestamp": "2026-01-02T00:00:00+0000"},
                    media("p2", 1)
                ]}),
            );
            transport.push_json(
                HttpMethod::Get,
                comments_url("p1"),
                200,
                json!({"data": [remote_comment("c1"), {"id": "c_bad", "text": "no author"}]}),
            );
            transport.push_json(HttpMethod::Get, comments_url("p2"), 200, json!({"data": []}));
            let service = service(&transport).await;

            let summary = service
                .sync_all_posts_with_progress(None)
                .await
                .expect("skips do not fail the sync");

            assert_eq!(summary.posts, 2);
            assert_eq!(summary.comments, 1);
            assert_eq!(summary.skipped, 2);
            assert_eq!(posts::count(service.db()).await.unwrap(), 2);
            assert!(comments::find_by_ig_id(service.db(), "c_bad").await.unwrap().is_none());
        }

        async fn seed_post(service: &InstagramService) -> post::Model {
            crate::sync::mapper::upsert_post(service.db(), &media("ig_post_1", 5))
                .await
                .unwrap()
                .saved()
                .unwrap()
        }

        #[tokio::test]
        async fn add_comment_to_missing_post_is_not_found() {
            let transport = MockTransport::new();
            let service = service(&transport).await;

            let err = service.add_comment(9999, "hello").await.expect_err("no post");
            assert!(matches!(err, SyncError::NotFound { .. }));
            assert!(err.to_string().contains("9999"));
            assert!(transport.requests().is_empty());
            assert_eq!(comments::count(service.db()).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn add_comment_rejected_remotely_is_validation_error() {
            let transport = MockTransport::new();
            transport.push_json(
                HttpMethod::Post,
                relay_url("ig_post_1"),
                400,
                json!({"error": {"message": "Media not found or deleted", "code": 100}}),
            );
            let service = service(&transport).await;
            let post = seed_post(&service).await;

            let err = service
                .add_comment(post.id, "hello")
                .await
                .expect_err("remote rejects");
            match &err {
                SyncError::Validation { message } => {
                    assert!(message.contains("Media not found or deleted"))
                }
                other => panic!("expected validation error, got {other:?}"),
            }
            assert_eq!(err.status_code(), 400);
            assert_eq!(comments::count(service.db()).await.unwrap(), 0);
            assert_eq!(
                posts::find_by_id(service.db(), post.id).await.unwrap(),
                Some(post)
            );
        }

        #[tokio::test]
        async fn add_comment_stores_remote_id() {
            let transport = MockTransport::new();
            transport.push_json(
                HttpMethod::Post,
                relay_url("ig_post_1"),
                200,
                json!({"id": "ig_comment_999"}),
            );
            let service = service(&transport).await.with_author("operator");
            let post = seed_post(&service).await;

            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&events);
            let callback: ProgressCallback = Box::new(move |e| sink.lock().unwrap().push(e));

            let saved = service
                .add_comment_with_progress(post.id, "hello", Some(&callback))
                .await
                .expect("relay");

            assert_eq!(saved.ig_id, "ig_comment_999");
            assert_eq!(saved.text, "hello");
            assert_eq!(saved.post_id, post.id);
            assert_eq!(saved.username, "operator");

            let sent = transport.requests();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].body, b"message=hello");
            assert!(matches!(
                events.lock().unwrap().as_slice(),
                [SyncProgress::CommentRelayed { comment_ig_id, .. }] if comment_ig_id == "ig_comment_999"
            ));
        }

        #[tokio::test]
        async fn add_comment_rejects_blank_text_without_calling_out() {
            let transport = MockTransport::new();
            let service = service(&transport).await;
            let post = seed_post(&service).await;

            let err = service.add_comment(post.id, "  ").await.expect_err("blank");
            assert!(matches!(err, SyncError::Validation { .. }));
            assert!(transport.requests().is_empty());
        }

        #[tokio::test]
        async fn add_comment_without_id_in_response_is_rejected() {
            let transport = MockTransport::new();
            transport.push_json(HttpMethod::Post, relay_url("ig_post_1"), 200, json!({"ok": true}));
            let service = service(&transport).await;
            let post = seed_post(&service).await;

            let err = service.add_comment(post.id, "hello").await.expect_err("no id");
            assert!(matches!(err, SyncError::Validation { .. }));
            assert_eq!(comments::count(service.db()).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn add_comment_accepts_numeric_remote_id() {
            let transport = MockTransport::new();
            transport.push_json(
                HttpMethod::Post,
                relay_url("ig_post_1"),
                200,
                json!({"id": 17890012345678901_u64}),
            );
            let service = service(&transport).await;
            let post = seed_post(&service).await;

            let saved = service.add_comment(post.id, "hello").await.expect("relay");
            assert_eq!(saved.ig_id, "17890012345678901");
            assert_eq!(comments::count(service.db()).await.unwrap(), 1);
        }

        #[tokio::test]
        async fn clones_share_one_connection() {
            let transport = MockTransport::new();
            script_account(&transport);
            let service = service(&transport).await;
            let worker = service.clone();

            assert_eq!(worker.sync_all_posts().await.unwrap(), 3);
            assert_eq!(posts::count(service.db()).await.unwrap(), 3);
            assert_eq!(comments::count(service.db()).await.unwrap(), 3);
        }
    }
}
