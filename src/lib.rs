use std::sync::Arc;

use config::Config;
use models::users::CurrentUser;
use repositories::posts_repo::PostsRepository;
use services::{
    composer::PostComposer, feed::FeedViewer, notifications::NotificationHub,
    preview::MediaDecoder,
};
use storage::ObjectStorage;

pub use self::errors::{Error, Result};

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub posts_repo: Arc<dyn PostsRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub decoder: Arc<dyn MediaDecoder>,
    pub notifications: NotificationHub,
}

impl AppState {
    /// A fresh composer bound to `user`; nothing carries over between calls.
    pub fn composer_for(&self, user: &CurrentUser) -> PostComposer {
        PostComposer::new(
            user.clone(),
            self.storage.clone(),
            self.posts_repo.clone(),
            self.notifications.for_user(user),
            self.decoder.clone(),
        )
    }

    pub fn feed_for(&self, user: &CurrentUser) -> FeedViewer {
        FeedViewer::new(user.clone(), self.posts_repo.clone())
    }
}
