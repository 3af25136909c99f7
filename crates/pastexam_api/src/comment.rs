use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: i64,
    pub commenter_id: String,
    pub content: String,
    /// ISO-8601, как отдаёт бэкенд
    pub comment_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub commenter_id: String,
    pub content: String,
}

impl NewComment {
    pub fn new(commenter_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            commenter_id: commenter_id.into(),
            content: content.into(),
        }
    }
}
