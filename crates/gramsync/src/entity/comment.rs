//! Comment entity - a comment under a mirrored post.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum length of a comment author's username.
pub const USERNAME_MAX_LEN: usize = 100;

/// Comment model. Deleted together with its post.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Instagram comment ID. Natural key for upserts.
    #[sea_orm(unique, indexed)]
    pub ig_id: String,

    /// Owning post (local key).
    pub post_id: i32,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    /// Author username.
    pub username: String,

    /// When the comment was made on Instagram.
    pub timestamp: DateTimeWithTimeZone,

    pub db_created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
