//! Persistence operations for posts and comments.
//!
//! Every function is generic over [`sea_orm::ConnectionTrait`], so the same
//! calls run on a plain connection or inside the sync transaction.

pub mod comments;
mod errors;
pub mod posts;
mod query;

pub use errors::{Result, StoreError};
pub use posts::PostWithComments;
pub use query::{DEFAULT_PER_PAGE, MAX_PER_PAGE, PaginatedResult, Pagination};
