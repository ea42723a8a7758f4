use serde::{Deserialize, Serialize};

/// The signed-in user, as supplied by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    pub fullname: String,
}

impl CurrentUser {
    pub fn new(username: impl Into<String>, fullname: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            fullname: fullname.into(),
        }
    }
}
