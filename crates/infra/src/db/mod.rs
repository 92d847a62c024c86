pub mod comments_repo;
pub mod migrations;
pub mod pool;
pub mod posts_repo;
pub mod store;

pub use comments_repo::{
    delete_comment, find_comment, insert_comment, list_comments, update_comment,
    CommentsRepoError,
};
pub use migrations::run_migrations;
pub use pool::{connect_lazy, DbPool, DbPoolError};
pub use posts_repo::{delete_post, find_post, insert_post, list_posts, update_post, PostsRepoError};
pub use store::PgStore;
