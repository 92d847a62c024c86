use postboard_core::domain::posts::{NewPost, Post, PostChanges};
use postboard_core::store::PostFilter;
use postboard_core::types::page::Page;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

pub async fn insert_post(pool: &PgPool, post: &NewPost) -> Result<Post, PostsRepoError> {
    let row = sqlx::query(
        r#"
        INSERT INTO posts (post_text, attachment, done, blocked, user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, post_text, attachment, done, blocked, user_id, created_at, updated_at
        "#,
    )
    .bind(&post.text)
    .bind(&post.attachment)
    .bind(post.done)
    .bind(post.blocked)
    .bind(post.user_id)
    .fetch_one(pool)
    .await?;
    Ok(map_post(&row)?)
}

pub async fn find_post(pool: &PgPool, post_id: i64) -> Result<Option<Post>, PostsRepoError> {
    let row = sqlx::query(
        r#"
        SELECT id, post_text, attachment, done, blocked, user_id, created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(map_post).transpose()?)
}

pub async fn list_posts(
    pool: &PgPool,
    filter: &PostFilter,
    page: Page,
) -> Result<Vec<Post>, PostsRepoError> {
    let rows = sqlx::query(
        r#"
        SELECT id, post_text, attachment, done, blocked, user_id, created_at, updated_at
        FROM posts
        WHERE ($1::BIGINT IS NULL OR user_id = $1)
          AND ($2::BOOLEAN IS NULL OR blocked = $2)
        ORDER BY created_at ASC, id ASC
        OFFSET $3
        LIMIT $4
        "#,
    )
    .bind(filter.user_id)
    .bind(filter.blocked)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;
    let mut posts = Vec::with_capacity(rows.len());
    for row in &rows {
        posts.push(map_post(row)?);
    }
    Ok(posts)
}

pub async fn update_post(
    pool: &PgPool,
    post_id: i64,
    user_id: i64,
    changes: &PostChanges,
) -> Result<Option<Post>, PostsRepoError> {
    let row = sqlx::query(
        r#"
        UPDATE posts
        SET post_text = $3,
            attachment = $4,
            done = $5,
            blocked = $6,
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING id, post_text, attachment, done, blocked, user_id, created_at, updated_at
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(&changes.text)
    .bind(&changes.attachment)
    .bind(changes.done)
    .bind(changes.blocked)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(map_post).transpose()?)
}

pub async fn delete_post(
    pool: &PgPool,
    post_id: i64,
    user_id: i64,
) -> Result<Option<Post>, PostsRepoError> {
    let row = sqlx::query(
        r#"
        DELETE FROM posts
        WHERE id = $1 AND user_id = $2
        RETURNING id, post_text, attachment, done, blocked, user_id, created_at, updated_at
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(map_post).transpose()?)
}

fn map_post(row: &PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        text: row.try_get("post_text")?,
        attachment: row.try_get("attachment")?,
        done: row.try_get("done")?,
        blocked: row.try_get("blocked")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
