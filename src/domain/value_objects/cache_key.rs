use std::fmt;

/// Identifies one logical piece of server-derived state held in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// Home feed of relevant posts.
    PostFeed,
    Post(i64),
    CommunityPosts(i64),
    UserPosts(i64),
    PendingPosts,
    /// Comment forest of a post.
    Comments(i64),
    Community(i64),
    /// Community directory; an empty query lists every community.
    Communities(String),
    /// Communities the signed-in user belongs to.
    MyCommunities,
    UserProfile(i64),
    Friends,
}

impl CacheKey {
    pub fn communities(query: impl Into<String>) -> Self {
        CacheKey::Communities(query.into().trim().to_string())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::PostFeed => write!(f, "posts"),
            CacheKey::Post(id) => write!(f, "post:{id}"),
            CacheKey::CommunityPosts(id) => write!(f, "posts:community:{id}"),
            CacheKey::UserPosts(id) => write!(f, "posts:user:{id}"),
            CacheKey::PendingPosts => write!(f, "pending-posts"),
            CacheKey::Comments(post_id) => write!(f, "comments:{post_id}"),
            CacheKey::Community(id) => write!(f, "community:{id}"),
            CacheKey::Communities(query) => write!(f, "communities:{query}"),
            CacheKey::MyCommunities => write!(f, "my-communities"),
            CacheKey::UserProfile(id) => write!(f, "user:{id}"),
            CacheKey::Friends => write!(f, "friends"),
        }
    }
}
