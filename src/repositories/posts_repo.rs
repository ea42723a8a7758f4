use async_trait::async_trait;
use tracing::{debug, instrument};
use validator::Validate;

use crate::{
    models::{
        posts::{NewPost, Post, POSTS_COLLECTION},
        query::FeedOrder,
    },
    Result,
};

use super::{subscription::Subscription, PostgresRepo};

#[async_trait]
pub trait PostsRepository: Send + Sync {
    /// Writes `post` under its own id; the store assigns `createdAt`.
    async fn create_post(&self, post: &NewPost) -> Result<Post>;
    async fn list_posts(&self, order: FeedOrder) -> Result<Vec<Post>>;
    /// Opens a live query over the whole collection. The first snapshot is
    /// delivered immediately, then one after every write.
    async fn subscribe_posts(&self, order: FeedOrder) -> Result<Subscription>;
}

#[async_trait]
impl PostsRepository for PostgresRepo {
    #[instrument(skip(self, post), fields(post_id = %post.id, username = %post.username))]
    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        post.validate()?;

        let created = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, image, caption, username)
            VALUES ($1, $2, $3, $4)
            RETURNING id, image, caption, username, created_at
            "#,
        )
        .bind(post.id)
        .bind(&post.image)
        .bind(&post.caption)
        .bind(&post.username)
        .fetch_one(&self.pool)
        .await?;

        self.changes.publish(POSTS_COLLECTION, created.id).await;

        Ok(created)
    }

    #[instrument(skip(self))]
    async fn list_posts(&self, order: FeedOrder) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT id, image, caption, username, created_at FROM posts {}",
            order.order_by_clause()
        );

        let posts = sqlx::query_as::<_, Post>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    #[instrument(skip(self))]
    async fn subscribe_posts(&self, order: FeedOrder) -> Result<Subscription> {
        // Listen before the first read so a write landing in between is not missed.
        let changes = self.changes.subscribe(POSTS_COLLECTION).await;

        let repo = self.clone();
        let subscription = Subscription::refreshing(changes, self.snapshot_buffer, move || {
            let repo = repo.clone();
            async move { repo.list_posts(order).await }
        })
        .await?;
        debug!("posts subscription opened");

        Ok(subscription)
    }
}
