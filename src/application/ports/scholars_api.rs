use crate::domain::entities::{Comment, CommunityDraft, CommunityUpdate, PostDraft};
use crate::domain::value_objects::Vote;
use crate::shared::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// Body of `POST /post`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(flatten)]
    pub draft: PostDraft,
    pub community_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn endpoint(self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Reject => "reject",
        }
    }
}

/// Write side of the backend.
///
/// Failures carry the backend's error payload so the caller can show its
/// `message` and `info` verbatim.
#[async_trait]
pub trait ScholarsApi: Send + Sync {
    async fn vote_post(&self, post_id: i64, vote: Vote) -> Result<(), ApiError>;
    async fn vote_comment(&self, comment_id: i64, vote: Vote) -> Result<(), ApiError>;
    async fn create_comment(&self, post_id: i64, comment: NewComment)
    -> Result<Option<Comment>, ApiError>;
    async fn edit_comment(&self, comment_id: i64, content: &str) -> Result<(), ApiError>;
    async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError>;
    async fn join_community(&self, community_id: i64) -> Result<(), ApiError>;
    async fn leave_community(&self, community_id: i64) -> Result<(), ApiError>;
    async fn update_community(
        &self,
        community_id: i64,
        update: &CommunityUpdate,
    ) -> Result<(), ApiError>;
    async fn add_friend(&self, user_id: i64) -> Result<(), ApiError>;
    async fn remove_friend(&self, user_id: i64) -> Result<(), ApiError>;
    async fn review_post(&self, post_id: i64, decision: ReviewDecision) -> Result<(), ApiError>;
    async fn create_post(&self, post: &NewPost) -> Result<(), ApiError>;
    async fn edit_post(&self, post_id: i64, draft: &PostDraft) -> Result<(), ApiError>;
    async fn delete_post(&self, post_id: i64) -> Result<(), ApiError>;
    async fn create_community(&self, community: &CommunityDraft) -> Result<(), ApiError>;
    async fn delete_community(&self, community_id: i64) -> Result<(), ApiError>;
    async fn update_display_name(&self, user_id: i64, display_name: &str)
    -> Result<(), ApiError>;
}
