use crate::domain::entities::user::UserSummary;
use crate::domain::value_objects::{CommentId, Votable, Vote, VoteTally};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment and its replies, as served by `GET /comment/post/{postId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub user_vote: Option<Vote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub children: Vec<Comment>,
}

impl Comment {
    /// Builds the local stand-in shown while a create request is in flight.
    pub fn placeholder(
        post_id: i64,
        parent_id: Option<i64>,
        author: UserSummary,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CommentId::placeholder(),
            post_id,
            parent_id,
            content: content.into(),
            user: Some(author),
            upvotes: 0,
            downvotes: 0,
            user_vote: None,
            created_at: now,
            updated_at: now,
            children: Vec::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.id.is_pending()
    }

    pub fn edit(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.updated_at = Utc::now();
    }
}

impl Votable for Comment {
    fn tally(&self) -> VoteTally {
        VoteTally::new(self.upvotes, self.downvotes, self.user_vote)
    }

    fn set_tally(&mut self, tally: VoteTally) {
        self.upvotes = tally.upvotes;
        self.downvotes = tally.downvotes;
        self.user_vote = tally.user_vote;
    }
}
