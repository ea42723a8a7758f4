use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const POSTS_COLLECTION: &str = "posts";

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub image: String,
    pub caption: String,
    pub username: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A post as built by the composer, before the store assigns `createdAt`.
#[derive(Debug, Deserialize, Serialize, Validate, Clone, PartialEq)]
pub struct NewPost {
    pub id: Uuid,
    #[validate(length(min = 1, message = "Image locator is required"))]
    pub image: String,
    pub caption: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
}

impl NewPost {
    pub fn new(image: String, caption: String, username: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            image,
            caption,
            username,
        }
    }

    pub fn into_post(self, created_at: DateTime<Utc>) -> Post {
        Post {
            id: self.id,
            image: self.image,
            caption: self.caption,
            username: self.username,
            created_at,
        }
    }
}
