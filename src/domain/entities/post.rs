use crate::domain::entities::user::UserSummary;
use crate::domain::value_objects::{Votable, Vote, VoteTally};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub community_id: Option<i64>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub user_vote: Option<Vote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            content: content.into(),
            image: None,
            community_id: None,
            user: None,
            is_pinned: false,
            upvotes: 0,
            downvotes: 0,
            user_vote: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copies the edited form fields onto the post.
    pub fn apply_draft(&mut self, draft: &PostDraft) {
        self.title = draft.title.trim().to_string();
        self.content = draft.content.clone();
        self.image = draft.image.clone();
        self.updated_at = Utc::now();
    }
}

/// Fields of the create and edit post forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        let title = self.title.trim().chars().count();
        if title < 3 {
            return Err("Title must be at least 3 characters".to_string());
        }
        if title > 100 {
            return Err("Title must be less than 100 characters".to_string());
        }
        let content = self.content.trim().chars().count();
        if content < 10 {
            return Err("Content must be at least 10 characters".to_string());
        }
        if content > 10_000 {
            return Err("Content must be less than 10000 characters".to_string());
        }
        match &self.image {
            Some(image) if !is_http_url(image) => Err("Must be a valid URL".to_string()),
            _ => Ok(()),
        }
    }
}

/// `http://` or `https://` followed by at least one character.
pub(crate) fn is_http_url(value: &str) -> bool {
    value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty())
}

impl Votable for Post {
    fn tally(&self) -> VoteTally {
        VoteTally::new(self.upvotes, self.downvotes, self.user_vote)
    }

    fn set_tally(&mut self, tally: VoteTally) {
        self.upvotes = tally.upvotes;
        self.downvotes = tally.downvotes;
        self.user_vote = tally.user_vote;
    }
}
