//! Cursor pagination over Graph API collections.
//!
//! Graph collections return `{"data": [...], "paging": {"next": "<absolute url>"}}`.
//! The walker follows `paging.next` until it disappears and yields every
//! item on the way as one lazy stream.

use futures::stream::{self, Stream, TryStreamExt};
use serde_json::Value;

use super::client::GraphClient;
use super::error::InstagramError;
use super::types::GraphPage;

/// Where the walker goes next.
struct PageCursor {
    path: Option<String>,
    params: Vec<(String, String)>,
    page: u32,
}

impl GraphClient {
    /// Walk every page of the collection at `path`, yielding raw items.
    ///
    /// `params` are sent with the first request only: continuation links
    /// already encode them. A `None` path yields nothing. Errors from the
    /// client end the stream after being yielded once; there is no retry.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let items = client.fetch_pages(Some("me/media".into()), params);
    /// let mut items = std::pin::pin!(items);
    /// while let Some(item) = items.try_next().await? {
    ///     // ...
    /// }
    /// ```
    pub fn fetch_pages(
        &self,
        path: Option<String>,
        params: Vec<(String, String)>,
    ) -> impl Stream<Item = Result<Value, InstagramError>> + '_ {
        let cursor = PageCursor {
            path,
            params,
            page: 1,
        };

        stream::try_unfold(cursor, move |cursor| self.next_page(cursor))
            .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
            .try_flatten()
    }

    async fn next_page(
        &self,
        cursor: PageCursor,
    ) -> Result<Option<(Vec<Value>, PageCursor)>, InstagramError> {
        let Some(path) = cursor.path else {
            return Ok(None);
        };

        let body = self.get(&path, &cursor.params).await?;
        let page: GraphPage = serde_json::from_value(body)?;

        let next = page
            .next_link()
            .map(|link| self.relative_path(link).to_string());
        let items = page.into_items();

        tracing::debug!(
            page = cursor.page,
            count = items.len(),
            has_next = next.is_some(),
            "Fetched page"
        );

        Ok(Some((
            items,
            PageCursor {
                path: next,
                params: Vec::new(),
                page: cursor.page + 1,
            },
        )))
    }
}
