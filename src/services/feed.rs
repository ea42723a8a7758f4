use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    models::{
        feed::{FeedView, Thumbnail},
        posts::Post,
        query::FeedOrder,
        users::CurrentUser,
    },
    repositories::{posts_repo::PostsRepository, subscription::Subscription},
    Result,
};

/// Live view of the current user's posts.
///
/// Each delivery from the store replaces the whole working set; the view is
/// derived from scratch every time.
pub struct FeedViewer {
    user: CurrentUser,
    posts_repo: Arc<dyn PostsRepository>,
    subscription: Option<Subscription>,
    posts: Vec<Post>,
    loading: bool,
}

impl FeedViewer {
    pub fn new(user: CurrentUser, posts_repo: Arc<dyn PostsRepository>) -> Self {
        Self {
            user,
            posts_repo,
            subscription: None,
            posts: Vec::new(),
            loading: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    #[instrument(skip(self), fields(username = %self.user.username))]
    pub async fn activate(&mut self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }

        self.loading = true;
        let subscription = match self
            .posts_repo
            .subscribe_posts(FeedOrder::newest_first())
            .await
        {
            Ok(subscription) => subscription,
            Err(err) => {
                self.loading = false;
                return Err(err);
            }
        };
        self.subscription = Some(subscription);
        debug!("feed subscription established");

        Ok(())
    }

    /// Releases the subscription. Nothing is delivered afterwards.
    pub fn deactivate(&mut self) {
        if self.subscription.take().is_some() {
            debug!(username = %self.user.username, "feed subscription released");
        }
        self.loading = false;
    }

    /// Waits for the next snapshot and returns the view derived from it.
    pub async fn next_view(&mut self) -> Option<FeedView> {
        let snapshot = self.subscription.as_mut()?.next_snapshot().await?;
        self.apply_snapshot(snapshot);
        Some(self.view())
    }

    pub fn apply_snapshot(&mut self, snapshot: Vec<Post>) {
        debug!(records = snapshot.len(), "feed snapshot delivered");
        self.posts = snapshot;
        self.loading = false;
    }

    pub fn view(&self) -> FeedView {
        let thumbnails: Vec<Thumbnail> = self
            .posts
            .iter()
            .filter(|post| post.username == self.user.username)
            .map(|post| Thumbnail {
                id: post.id,
                image: post.image.clone(),
            })
            .collect();

        FeedView {
            username: self.user.username.clone(),
            fullname: self.user.fullname.clone(),
            post_count: thumbnails.len(),
            thumbnails,
            loading: self.loading,
        }
    }
}
