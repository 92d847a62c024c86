use postboard_core::domain::comments::{Comment, CommentChanges, CommentKey, NewComment};
use postboard_core::store::CommentFilter;
use postboard_core::types::page::Page;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommentsRepoError {
    #[error("post {0} does not exist")]
    MissingPost(i64),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

const FOREIGN_KEY_VIOLATION: &str = "23503";

pub async fn insert_comment(
    pool: &PgPool,
    comment: &NewComment,
) -> Result<Comment, CommentsRepoError> {
    let row = sqlx::query(
        r#"
        INSERT INTO comments (
            comment_text,
            done,
            blocked,
            auto_reply_flag,
            auto_reply_time,
            user_id,
            post_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, comment_text, done, blocked, auto_reply_flag, auto_reply_time,
                  user_id, post_id, created_at, updated_at
        "#,
    )
    .bind(&comment.text)
    .bind(comment.done)
    .bind(comment.blocked)
    .bind(comment.auto_reply_flag)
    .bind(comment.auto_reply_time)
    .bind(comment.user_id)
    .bind(comment.post_id)
    .fetch_one(pool)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            CommentsRepoError::MissingPost(comment.post_id)
        }
        other => CommentsRepoError::Sqlx(other),
    })?;
    Ok(map_comment(&row)?)
}

pub async fn find_comment(
    pool: &PgPool,
    post_id: i64,
    comment_id: i64,
) -> Result<Option<Comment>, CommentsRepoError> {
    let row = sqlx::query(
        r#"
        SELECT id, comment_text, done, blocked, auto_reply_flag, auto_reply_time,
               user_id, post_id, created_at, updated_at
        FROM comments
        WHERE id = $1 AND post_id = $2
        "#,
    )
    .bind(comment_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(map_comment).transpose()?)
}

pub async fn list_comments(
    pool: &PgPool,
    filter: &CommentFilter,
    page: Option<Page>,
) -> Result<Vec<Comment>, CommentsRepoError> {
    let (offset, limit) = match page {
        Some(page) => (page.skip, Some(page.limit)),
        None => (0, None),
    };
    let rows = sqlx::query(
        r#"
        SELECT id, comment_text, done, blocked, auto_reply_flag, auto_reply_time,
               user_id, post_id, created_at, updated_at
        FROM comments
        WHERE ($1::BIGINT IS NULL OR post_id = $1)
          AND ($2::BIGINT IS NULL OR user_id = $2)
          AND ($3::BOOLEAN IS NULL OR blocked = $3)
          AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
          AND ($5::TIMESTAMPTZ IS NULL OR created_at < $5)
          AND ($6::BIGINT[] IS NULL OR post_id = ANY($6))
        ORDER BY created_at ASC, id ASC
        OFFSET $7
        LIMIT $8
        "#,
    )
    .bind(filter.post_id)
    .bind(filter.user_id)
    .bind(filter.blocked)
    .bind(filter.created_from)
    .bind(filter.created_before)
    .bind(filter.post_ids.as_deref())
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    let mut comments = Vec::with_capacity(rows.len());
    for row in &rows {
        comments.push(map_comment(row)?);
    }
    Ok(comments)
}

pub async fn update_comment(
    pool: &PgPool,
    key: CommentKey,
    changes: &CommentChanges,
) -> Result<Option<Comment>, CommentsRepoError> {
    let row = sqlx::query(
        r#"
        UPDATE comments
        SET comment_text = $4,
            done = $5,
            blocked = $6,
            updated_at = now()
        WHERE id = $1 AND post_id = $2 AND user_id = $3
        RETURNING id, comment_text, done, blocked, auto_reply_flag, auto_reply_time,
                  user_id, post_id, created_at, updated_at
        "#,
    )
    .bind(key.comment_id)
    .bind(key.post_id)
    .bind(key.user_id)
    .bind(&changes.text)
    .bind(changes.done)
    .bind(changes.blocked)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(map_comment).transpose()?)
}

pub async fn delete_comment(
    pool: &PgPool,
    key: CommentKey,
) -> Result<Option<Comment>, CommentsRepoError> {
    let row = sqlx::query(
        r#"
        DELETE FROM comments
        WHERE id = $1 AND post_id = $2 AND user_id = $3
        RETURNING id, comment_text, done, blocked, auto_reply_flag, auto_reply_time,
                  user_id, post_id, created_at, updated_at
        "#,
    )
    .bind(key.comment_id)
    .bind(key.post_id)
    .bind(key.user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(map_comment).transpose()?)
}

fn map_comment(row: &PgRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        text: row.try_get("comment_text")?,
        done: row.try_get("done")?,
        blocked: row.try_get("blocked")?,
        user_id: row.try_get("user_id")?,
        post_id: row.try_get("post_id")?,
        auto_reply_flag: row.try_get("auto_reply_flag")?,
        auto_reply_time: row.try_get("auto_reply_time")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
