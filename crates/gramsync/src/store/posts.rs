use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::entity::comment::{self, Model as CommentModel};
use crate::entity::post::{ActiveModel, Column, Entity as Post, Model};

use super::errors::{Result, StoreError};
use super::query::{PaginatedResult, Pagination};

/// A post together with its comments, newest comment first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: Model,
    pub comments: Vec<CommentModel>,
}

/// Find a post by its local primary key.
pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: i32) -> Result<Option<Model>> {
    Post::find_by_id(id)
        .one(conn)
        .await
        .map_err(StoreError::from)
}

/// Find a post by its Instagram media ID.
pub async fn find_by_ig_id<C: ConnectionTrait>(conn: &C, ig_id: &str) -> Result<Option<Model>> {
    Post::find()
        .filter(Column::IgId.eq(ig_id))
        .one(conn)
        .await
        .map_err(StoreError::from)
}

/// Insert or update a post by its natural key (`ig_id`).
///
/// An existing row keeps its local id and `db_created_at`; every other
/// column set on `model` is overwritten and `db_updated_at` is refreshed.
pub async fn upsert<C: ConnectionTrait>(conn: &C, model: ActiveModel) -> Result<Model> {
    let ig_id = required_active_value("ig_id", &model.ig_id)?;
    let now = Utc::now().fixed_offset();

    match find_by_ig_id(conn, &ig_id).await? {
        Some(existing) => {
            let mut update_model = model;
            update_model.id = Set(existing.id);
            update_model.db_created_at = ActiveValue::NotSet;
            update_model.db_updated_at = Set(now);
            update_model.update(conn).await.map_err(StoreError::from)
        }
        None => {
            let mut insert_model = model;
            insert_model.id = ActiveValue::NotSet;
            insert_model.db_created_at = Set(now);
            insert_model.db_updated_at = Set(now);
            insert_model.insert(conn).await.map_err(StoreError::from)
        }
    }
}

pub(super) fn required_active_value<T: Clone + Into<sea_orm::Value>>(
    field: &str,
    value: &ActiveValue<T>,
) -> Result<T> {
    match value {
        ActiveValue::Set(value) | ActiveValue::Unchanged(value) => Ok(value.clone()),
        ActiveValue::NotSet => Err(StoreError::InvalidInput {
            message: format!("Missing required field: {}", field),
        }),
    }
}

/// Count all posts.
pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<u64> {
    Post::find().count(conn).await.map_err(StoreError::from)
}

/// Delete a post by its local key. Its comments go with it.
///
/// Returns the number of posts deleted (0 or 1).
pub async fn delete<C: ConnectionTrait>(conn: &C, id: i32) -> Result<u64> {
    let result = Post::delete_by_id(id).exec(conn).await?;
    Ok(result.rows_affected)
}

/// List posts newest first, each with its comments.
pub async fn list<C: ConnectionTrait>(
    conn: &C,
    pagination: Pagination,
) -> Result<PaginatedResult<PostWithComments>> {
    if pagination.offset().is_none() {
        return Err(StoreError::InvalidInput {
            message: format!(
                "Page {} is out of range for {} posts per page",
                pagination.page, pagination.per_page
            ),
        });
    }

    let paginator = Post::find()
        .order_by_desc(Column::Timestamp)
        .order_by_desc(Column::Id)
        .paginate(conn, pagination.per_page);

    let total = paginator.num_items().await?;
    let total_pages = paginator.num_pages().await?;
    let posts = paginator.fetch_page(pagination.page).await?;

    let comments = posts.load_many(comment::Entity, conn).await?;
    let items = posts
        .into_iter()
        .zip(comments)
        .map(|(post, mut comments)| {
            comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
            PostWithComments { post, comments }
        })
        .collect();

    Ok(PaginatedResult {
        items,
        total,
        page: pagination.page,
        per_page: pagination.per_page,
        total_pages,
    })
}
