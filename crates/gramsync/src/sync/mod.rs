//! Instagram sync and comment relay.
//!
//! # Module Structure
//!
//! - [`mapper`] - Raw Graph items to entities: `upsert_post()`, `upsert_comment()`
//! - [`service`] - `InstagramService`: bulk sync and comment relay
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//!
//! # Example
//!
//! ```ignore
//! use gramsync::instagram::{GraphClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
//! use gramsync::sync::InstagramService;
//!
//! let client = GraphClient::new(DEFAULT_BASE_URL, &token, DEFAULT_TIMEOUT)?;
//! let service = InstagramService::new(db, client);
//! let synced = service.sync_all_posts().await?;
//! println!("Synced {} posts", synced);
//! ```

mod error;
pub mod mapper;
mod progress;
mod service;
mod types;

pub use error::SyncError;
pub use mapper::{RemoteComment, RemotePost, UpsertOutcome, upsert_comment, upsert_post};
pub use progress::{ItemKind, ProgressCallback, SyncProgress, emit};
pub use service::InstagramService;
pub use types::{COMMENT_MAX_LEN, LOCAL_AUTHOR, MEDIA_PATH, SyncSummary};
