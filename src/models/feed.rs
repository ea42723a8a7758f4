use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    pub id: Uuid,
    pub image: String,
}

/// What the profile page renders for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedView {
    pub username: String,
    pub fullname: String,
    #[serde(rename = "postCount")]
    pub post_count: usize,
    pub thumbnails: Vec<Thumbnail>,
    pub loading: bool,
}
