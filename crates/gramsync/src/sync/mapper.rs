//! Mapping raw Graph API items onto local entities.
//!
//! A malformed item never fails the batch: it comes back as
//! [`UpsertOutcome::Skipped`] with a reason. Only database errors are fatal.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{ConnectionTrait, Set};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::entity::comment::{self, USERNAME_MAX_LEN};
use crate::entity::post::{self, IG_ID_MAX_LEN, URL_MAX_LEN};
use crate::instagram::types::remote_id;
use crate::store::{self, StoreError, comments, posts};

/// Media item as returned for the `MEDIA_FIELDS` projection.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePost {
    #[serde(default, deserialize_with = "remote_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Comment item as returned for the `COMMENT_FIELDS` projection.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteComment {
    #[serde(default, deserialize_with = "remote_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Result of mapping one remote item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome<T> {
    /// The item was valid and is now stored.
    Saved(T),
    /// The item was malformed and nothing was written.
    Skipped {
        /// Remote ID when the item carried a usable one.
        ig_id: Option<String>,
        reason: String,
    },
}

impl<T> UpsertOutcome<T> {
    pub fn saved(self) -> Option<T> {
        match self {
            UpsertOutcome::Saved(value) => Some(value),
            UpsertOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, UpsertOutcome::Skipped { .. })
    }
}

/// A validation failure for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalid {
    pub ig_id: Option<String>,
    pub reason: String,
}

impl Invalid {
    fn new(ig_id: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            ig_id: ig_id.map(str::to_string),
            reason: reason.into(),
        }
    }
}

/// Parse a Graph API timestamp.
///
/// The API sends `2026-01-01T00:00:00+0000`; RFC 3339 is accepted as well.
pub fn parse_graph_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

fn validate_id(raw: Option<&str>) -> Result<String, Invalid> {
    let id = raw.map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(Invalid::new(None, "missing id"));
    }
    if id.chars().count() > IG_ID_MAX_LEN {
        return Err(Invalid::new(
            None,
            format!("id longer than {} characters", IG_ID_MAX_LEN),
        ));
    }
    Ok(id.to_string())
}

fn validate_timestamp(ig_id: &str, raw: Option<&str>) -> Result<DateTime<FixedOffset>, Invalid> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Invalid::new(Some(ig_id), "missing timestamp"))?;
    // Stored in UTC so text-backed columns sort chronologically.
    parse_graph_timestamp(raw)
        .map(|dt| dt.with_timezone(&Utc).fixed_offset())
        .ok_or_else(|| Invalid::new(Some(ig_id), format!("invalid timestamp '{}'", raw)))
}

/// Blank URLs are stored as NULL.
fn validate_url(ig_id: &str, field: &str, raw: Option<&str>) -> Result<Option<String>, Invalid> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if raw.chars().count() > URL_MAX_LEN {
        return Err(Invalid::new(
            Some(ig_id),
            format!("{} longer than {} characters", field, URL_MAX_LEN),
        ));
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Some(raw.to_string())),
        _ => Err(Invalid::new(
            Some(ig_id),
            format!("{} is not a valid URL", field),
        )),
    }
}

fn required_text(ig_id: &str, field: &str, raw: Option<&str>) -> Result<String, Invalid> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Invalid::new(Some(ig_id), format!("missing {}", field)))
}

impl RemotePost {
    /// Check the item against the `posts` schema and build an active model.
    pub fn validate(&self) -> Result<post::ActiveModel, Invalid> {
        let ig_id = validate_id(self.id.as_deref())?;
        let timestamp = validate_timestamp(&ig_id, self.timestamp.as_deref())?;
        let media_url = validate_url(&ig_id, "media_url", self.media_url.as_deref())?;
        let permalink = validate_url(&ig_id, "permalink", self.permalink.as_deref())?;

        Ok(post::ActiveModel {
            ig_id: Set(ig_id),
            caption: Set(self.caption.clone().unwrap_or_default()),
            media_url: Set(media_url),
            permalink: Set(permalink),
            timestamp: Set(timestamp),
            ..Default::default()
        })
    }
}

impl RemoteComment {
    /// Check the item against the `comments` schema and build an active model.
    ///
    /// The owning post is attached by the store.
    pub fn validate(&self) -> Result<comment::ActiveModel, Invalid> {
        let ig_id = validate_id(self.id.as_deref())?;
        let text = required_text(&ig_id, "text", self.text.as_deref())?;
        let username = required_text(&ig_id, "username", self.username.as_deref())?;
        if username.chars().count() > USERNAME_MAX_LEN {
            return Err(Invalid::new(
                Some(&ig_id),
                format!("username longer than {} characters", USERNAME_MAX_LEN),
            ));
        }
        let timestamp = validate_timestamp(&ig_id, self.timestamp.as_deref())?;

        Ok(comment::ActiveModel {
            ig_id: Set(ig_id),
            text: Set(text),
            username: Set(username),
            timestamp: Set(timestamp),
            ..Default::default()
        })
    }
}

/// The item's `id` for log output, even when the item is otherwise unusable.
fn raw_id(raw: &Value) -> Option<String> {
    match raw.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode<T: for<'de> Deserialize<'de>>(raw: &Value) -> Result<T, Invalid> {
    if !raw.is_object() {
        return Err(Invalid::new(None, "item is not an object"));
    }
    T::deserialize(raw).map_err(|e| Invalid::new(raw_id(raw).as_deref(), e.to_string()))
}

fn skipped<T>(invalid: Invalid) -> UpsertOutcome<T> {
    UpsertOutcome::Skipped {
        ig_id: invalid.ig_id,
        reason: invalid.reason,
    }
}

/// Validate a raw media item and upsert it by `ig_id`.
pub async fn upsert_post<C: ConnectionTrait>(
    conn: &C,
    raw: &Value,
) -> store::Result<UpsertOutcome<post::Model>> {
    let model = match decode::<RemotePost>(raw).and_then(|item| item.validate()) {
        Ok(model) => model,
        Err(invalid) => return Ok(skipped(invalid)),
    };

    match posts::upsert(conn, model).await {
        Ok(saved) => Ok(UpsertOutcome::Saved(saved)),
        Err(StoreError::InvalidInput { message }) => Ok(UpsertOutcome::Skipped {
            ig_id: raw_id(raw),
            reason: message,
        }),
        Err(e) => Err(e),
    }
}

/// Validate a raw comment item and upsert it under `post` by `ig_id`.
pub async fn upsert_comment<C: ConnectionTrait>(
    conn: &C,
    post: &post::Model,
    raw: &Value,
) -> store::Result<UpsertOutcome<comment::Model>> {
    let model = match decode::<RemoteComment>(raw).and_then(|item| item.validate()) {
        Ok(model) => model,
        Err(invalid) => return Ok(skipped(invalid)),
    };

    match comments::upsert(conn, post.id, model).await {
        Ok(saved) => Ok(UpsertOutcome::Saved(saved)),
        Err(StoreError::InvalidInput { message }) => Ok(UpsertOutcome::Skipped {
            ig_id: raw_id(raw),
            reason: message,
        }),
        Err(e) => Err(e),
    }
}
