pub mod composer;
pub mod feed;
pub mod notifications;
pub mod preview;
