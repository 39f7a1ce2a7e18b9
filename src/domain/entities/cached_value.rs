use crate::domain::entities::{Comment, Community, Post, UserSummary};
use serde::{Deserialize, Serialize};

/// Value stored under a cache key: a single item or a list/forest of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "data")]
pub enum CachedValue {
    Post(Post),
    Posts(Vec<Post>),
    Comment(Comment),
    Comments(Vec<Comment>),
    Community(Community),
    Communities(Vec<Community>),
    User(UserSummary),
    Users(Vec<UserSummary>),
}

impl CachedValue {
    pub fn as_comments(&self) -> Option<&[Comment]> {
        match self {
            CachedValue::Comments(comments) => Some(comments),
            _ => None,
        }
    }

    pub fn as_posts(&self) -> Option<&[Post]> {
        match self {
            CachedValue::Posts(posts) => Some(posts),
            _ => None,
        }
    }

    pub fn as_post(&self) -> Option<&Post> {
        match self {
            CachedValue::Post(post) => Some(post),
            _ => None,
        }
    }

    pub fn as_community(&self) -> Option<&Community> {
        match self {
            CachedValue::Community(community) => Some(community),
            _ => None,
        }
    }

    pub fn as_communities(&self) -> Option<&[Community]> {
        match self {
            CachedValue::Communities(communities) => Some(communities),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserSummary> {
        match self {
            CachedValue::User(user) => Some(user),
            _ => None,
        }
    }
}
