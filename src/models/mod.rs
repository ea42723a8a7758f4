pub mod feed;
pub mod media;
pub mod notification;
pub mod posts;
pub mod query;
pub mod response;
pub mod users;
