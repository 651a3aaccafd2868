//! Post entity - an Instagram media item mirrored locally.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum length of a remote identifier.
pub const IG_ID_MAX_LEN: usize = 100;

/// Maximum length of `media_url` and `permalink`.
pub const URL_MAX_LEN: usize = 1000;

/// Post model. Listed newest first by remote `timestamp`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    /// Local primary key.
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Instagram media ID. Natural key for upserts.
    #[sea_orm(unique, indexed)]
    pub ig_id: String,

    /// Caption text; empty when the media has none.
    #[sea_orm(column_type = "Text")]
    pub caption: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub media_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub permalink: Option<String>,

    /// When the media was published on Instagram.
    pub timestamp: DateTimeWithTimeZone,

    /// When the row was first inserted.
    pub db_created_at: DateTimeWithTimeZone,

    /// When the row was last written by a sync.
    pub db_updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A post has many comments.
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Graph API path for this post's comment edge.
    pub fn comments_path(&self) -> String {
        format!("{}/comments", self.ig_id)
    }
}
