//! Gramsync - Instagram posts and comments, mirrored into a local database.
//!
//! This library walks an Instagram account through the Graph API, upserts
//! every post and comment into SQLite or PostgreSQL in one transaction, and
//! relays new comments back to Instagram.
//!
//! # Features
//!
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//! - `sqlite` / `postgres` - Database backends.
//!
//! # Example
//!
//! ```ignore
//! use gramsync::{connect_and_migrate, GraphClient, InstagramService};
//! use gramsync::instagram::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
//!
//! let db = connect_and_migrate("sqlite://gramsync.db?mode=rwc").await?;
//! let client = GraphClient::new(DEFAULT_BASE_URL, &token, DEFAULT_TIMEOUT)?;
//! let service = InstagramService::new(db, client);
//!
//! let synced = service.sync_all_posts().await?;
//! let comment = service.add_comment(1, "Thanks!").await?;
//! ```

pub mod db;
pub mod entity;
pub mod http;
pub mod instagram;
pub mod store;
pub mod sync;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use instagram::{GraphClient, InstagramError};
pub use store::StoreError;
pub use sync::{InstagramService, SyncError, SyncSummary};
