//! Instagram Graph API client.
//!
//! # Example
//!
//! ```ignore
//! use gramsync::instagram::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, GraphClient};
//!
//! let client = GraphClient::new(DEFAULT_BASE_URL, &token, DEFAULT_TIMEOUT)?;
//! let created = client.post("17900000000000000/comments", &form).await?;
//! ```

mod client;
pub mod error;
mod pagination;
pub mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, GraphClient, Params};
pub use error::InstagramError;
pub use types::{
    COMMENT_FIELDS, CreatedObject, GraphPage, MEDIA_FIELDS, MEDIA_PAGE_SIZE, fields_param,
};
