pub mod feed;
pub mod notifications;
pub mod posts;
