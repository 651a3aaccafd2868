//! Wire types for Instagram Graph API responses.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Fields requested for every media item.
pub const MEDIA_FIELDS: &[&str] = &["id", "caption", "media_url", "permalink", "timestamp"];

/// Fields requested for every comment.
pub const COMMENT_FIELDS: &[&str] = &["id", "text", "username", "timestamp"];

/// Page size used when walking the account's media.
pub const MEDIA_PAGE_SIZE: u32 = 50;

/// Join a field projection into the comma-separated `fields` parameter.
pub fn fields_param(fields: &[&str]) -> String {
    fields.join(",")
}

/// One page of a paginated Graph API collection.
///
/// Items are kept as raw JSON: validation happens per item in the sync
/// mapper so one malformed record cannot fail the whole page.
#[derive(Debug, Default, Deserialize)]
pub struct GraphPage {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

impl GraphPage {
    /// The continuation link, if the API reported one.
    pub fn next_link(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }

    pub fn into_items(self) -> Vec<Value> {
        self.data.unwrap_or_default()
    }
}

/// Response body of a create call (`POST {id}/comments`).
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedObject {
    #[serde(deserialize_with = "required_remote_id")]
    pub id: String,
}

/// Graph IDs are strings, but numeric IDs are accepted too.
pub(crate) fn remote_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number for id, got {other}"
        ))),
    }
}

fn required_remote_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    remote_id(deserializer)?.ok_or_else(|| serde::de::Error::custom("id is null"))
}
