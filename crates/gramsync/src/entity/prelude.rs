//! Common re-exports for convenient entity usage.

pub use super::comment::{
    ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as Comment,
    Model as CommentModel,
};
pub use super::post::{
    ActiveModel as PostActiveModel, Column as PostColumn, Entity as Post, Model as PostModel,
};
