use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entity::comment::{ActiveModel, Column, Entity as Comment, Model};

use super::errors::{Result, StoreError};
use super::posts::required_active_value;

/// Find a comment by its Instagram comment ID.
pub async fn find_by_ig_id<C: ConnectionTrait>(conn: &C, ig_id: &str) -> Result<Option<Model>> {
    Comment::find()
        .filter(Column::IgId.eq(ig_id))
        .one(conn)
        .await
        .map_err(StoreError::from)
}

/// Comments of one post, newest first.
pub async fn find_by_post<C: ConnectionTrait>(conn: &C, post_id: i32) -> Result<Vec<Model>> {
    Comment::find()
        .filter(Column::PostId.eq(post_id))
        .order_by_desc(Column::Timestamp)
        .order_by_desc(Column::Id)
        .all(conn)
        .await
        .map_err(StoreError::from)
}

/// Insert a new comment under `post_id`.
///
/// # Errors
/// Returns `StoreError::Database` if the insert fails (e.g., duplicate `ig_id`
/// or a missing post).
pub async fn insert<C: ConnectionTrait>(conn: &C, post_id: i32, model: ActiveModel) -> Result<Model> {
    let mut insert_model = model;
    insert_model.id = ActiveValue::NotSet;
    insert_model.post_id = Set(post_id);
    if insert_model.db_created_at.is_not_set() {
        insert_model.db_created_at = Set(Utc::now().fixed_offset());
    }
    insert_model.insert(conn).await.map_err(StoreError::from)
}

/// Insert or update a comment by its natural key (`ig_id`).
///
/// The comment is (re)attached to `post_id`. An existing row keeps its local
/// id and `db_created_at`.
pub async fn upsert<C: ConnectionTrait>(conn: &C, post_id: i32, model: ActiveModel) -> Result<Model> {
    let ig_id = required_active_value("ig_id", &model.ig_id)?;

    match find_by_ig_id(conn, &ig_id).await? {
        Some(existing) => {
            let mut update_model = model;
            update_model.id = Set(existing.id);
            update_model.post_id = Set(post_id);
            update_model.db_created_at = ActiveValue::NotSet;
            update_model.update(conn).await.map_err(StoreError::from)
        }
        None => insert(conn, post_id, model).await,
    }
}

/// Count all comments.
pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<u64> {
    Comment::find().count(conn).await.map_err(StoreError::from)
}
