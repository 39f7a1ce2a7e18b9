use crate::application::ports::query_loader::QueryLoader;
use crate::application::ports::scholars_api::{NewComment, NewPost, ReviewDecision, ScholarsApi};
use crate::domain::entities::{
    CachedValue, Comment, Community, CommunityDraft, CommunityUpdate, Post, PostDraft, UserSummary,
};
use crate::domain::value_objects::{CacheKey, Vote};
use crate::shared::config::ApiConfig;
use crate::shared::error::{
    ApiError, AppError, DEFAULT_ERROR_MESSAGE, DEFAULT_ERROR_NAME,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    name: Option<String>,
    message: Option<String>,
    info: Option<Value>,
}

#[derive(Deserialize)]
struct PostEnvelope {
    post: Post,
}

#[derive(Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Deserialize)]
struct CommentEnvelope {
    #[serde(default)]
    comment: Option<Comment>,
}

#[derive(Deserialize)]
struct CommentsEnvelope {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Deserialize)]
struct CommunityEnvelope {
    community: Community,
}

#[derive(Deserialize)]
struct CommunitiesEnvelope {
    #[serde(default)]
    communities: Vec<Community>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: UserSummary,
}

#[derive(Deserialize)]
struct FriendsEnvelope {
    #[serde(default)]
    friends: Vec<UserSummary>,
}

/// REST client for the Scholars backend.
#[derive(Clone)]
pub struct ScholarsHttpClient {
    client: reqwest::Client,
    base: Url,
    auth_token: Option<String>,
}

impl ScholarsHttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            AppError::ConfigurationError(format!("invalid API base url {}: {e}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(AppError::ConfigurationError(format!(
                "API base url cannot carry paths: {}",
                config.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            base,
            auth_token: config.auth_token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!(%method, %url, "api request");
        let builder = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "api request failed before a response arrived");
            ApiError::default().with_info(e.to_string())
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = Self::parse_error(status, &body);
        if error.is_unauthorized() {
            warn!(name = %error.name, "api rejected credentials");
        }
        Err(error)
    }

    /// Builds an [`ApiError`] from an error response body, filling in the
    /// backend's defaults for missing fields.
    pub fn parse_error(status: u16, body: &str) -> ApiError {
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
        let error = envelope.error.unwrap_or_default();
        ApiError {
            status,
            name: error.name.unwrap_or_else(|| DEFAULT_ERROR_NAME.to_string()),
            message: error
                .message
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            info: error.info.and_then(|info| match info {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            }),
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder).await.map(|_| ())
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, AppError> {
        let response = self.send(self.request(Method::GET, segments)).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ScholarsApi for ScholarsHttpClient {
    async fn vote_post(&self, post_id: i64, vote: Vote) -> Result<(), ApiError> {
        let id = post_id.to_string();
        self.execute(self.request(Method::POST, &["post", vote.endpoint(), &id]))
            .await
    }

    async fn vote_comment(&self, comment_id: i64, vote: Vote) -> Result<(), ApiError> {
        let id = comment_id.to_string();
        self.execute(self.request(Method::POST, &["comment", vote.endpoint(), &id]))
            .await
    }

    async fn create_comment(
        &self,
        post_id: i64,
        comment: NewComment,
    ) -> Result<Option<Comment>, ApiError> {
        let id = post_id.to_string();
        let response = self
            .send(self.request(Method::POST, &["comment", &id]).json(&comment))
            .await?;
        // The committed node is optional; reconciliation fills the gap.
        let envelope = response.json::<CommentEnvelope>().await.ok();
        Ok(envelope.and_then(|e| e.comment))
    }

    async fn edit_comment(&self, comment_id: i64, content: &str) -> Result<(), ApiError> {
        let id = comment_id.to_string();
        self.execute(
            self.request(Method::PATCH, &["comment", &id])
                .json(&json!({ "content": content })),
        )
        .await
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        let id = comment_id.to_string();
        self.execute(self.request(Method::DELETE, &["comment", &id]))
            .await
    }

    async fn join_community(&self, community_id: i64) -> Result<(), ApiError> {
        let id = community_id.to_string();
        self.execute(self.request(Method::POST, &["community", "join", &id]))
            .await
    }

    async fn leave_community(&self, community_id: i64) -> Result<(), ApiError> {
        let id = community_id.to_string();
        self.execute(self.request(Method::POST, &["community", "leave", &id]))
            .await
    }

    async fn update_community(
        &self,
        community_id: i64,
        update: &CommunityUpdate,
    ) -> Result<(), ApiError> {
        let id = community_id.to_string();
        self.execute(self.request(Method::PUT, &["community", &id]).json(update))
            .await
    }

    async fn add_friend(&self, user_id: i64) -> Result<(), ApiError> {
        let id = user_id.to_string();
        self.execute(self.request(Method::POST, &["user", "friends", &id]))
            .await
    }

    async fn remove_friend(&self, user_id: i64) -> Result<(), ApiError> {
        let id = user_id.to_string();
        self.execute(self.request(Method::DELETE, &["user", "friends", &id]))
            .await
    }

    async fn review_post(&self, post_id: i64, decision: ReviewDecision) -> Result<(), ApiError> {
        let id = post_id.to_string();
        self.execute(self.request(Method::PATCH, &["post", decision.endpoint(), &id]))
            .await
    }

    async fn create_post(&self, post: &NewPost) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, &["post"]).json(post))
            .await
    }

    async fn edit_post(&self, post_id: i64, draft: &PostDraft) -> Result<(), ApiError> {
        let id = post_id.to_string();
        self.execute(self.request(Method::PATCH, &["post", &id]).json(draft))
            .await
    }

    async fn delete_post(&self, post_id: i64) -> Result<(), ApiError> {
        let id = post_id.to_string();
        self.execute(self.request(Method::DELETE, &["post", &id]))
            .await
    }

    async fn create_community(&self, community: &CommunityDraft) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, &["community"]).json(community))
            .await
    }

    async fn delete_community(&self, community_id: i64) -> Result<(), ApiError> {
        let id = community_id.to_string();
        self.execute(self.request(Method::DELETE, &["community", &id]))
            .await
    }

    async fn update_display_name(
        &self,
        user_id: i64,
        display_name: &str,
    ) -> Result<(), ApiError> {
        let id = user_id.to_string();
        self.execute(
            self.request(Method::PATCH, &["user", &id])
                .json(&json!({ "displayName": display_name })),
        )
        .await
    }
}

#[async_trait]
impl QueryLoader for ScholarsHttpClient {
    async fn load(&self, key: &CacheKey) -> Result<CachedValue, AppError> {
        let value = match key {
            CacheKey::PostFeed => {
                let body: PostsEnvelope = self.get_json(&["post", "relevant"]).await?;
                CachedValue::Posts(body.posts)
            }
            CacheKey::Post(id) => {
                let body: PostEnvelope = self.get_json(&["post", &id.to_string()]).await?;
                CachedValue::Post(body.post)
            }
            CacheKey::CommunityPosts(id) => {
                let body: PostsEnvelope = self
                    .get_json(&["post", "community", &id.to_string()])
                    .await?;
                CachedValue::Posts(body.posts)
            }
            CacheKey::UserPosts(id) => {
                let body: PostsEnvelope =
                    self.get_json(&["post", "user", &id.to_string()]).await?;
                CachedValue::Posts(body.posts)
            }
            CacheKey::PendingPosts => {
                let body: PostsEnvelope = self.get_json(&["post", "pending"]).await?;
                CachedValue::Posts(body.posts)
            }
            CacheKey::Comments(post_id) => {
                let body: CommentsEnvelope = self
                    .get_json(&["comment", "post", &post_id.to_string()])
                    .await?;
                CachedValue::Comments(body.comments)
            }
            CacheKey::Community(id) => {
                let body: CommunityEnvelope = self
                    .get_json(&["community", "id", &id.to_string()])
                    .await?;
                CachedValue::Community(body.community)
            }
            CacheKey::Communities(query) => {
                let body: CommunitiesEnvelope = if query.is_empty() {
                    self.get_json(&["community"]).await?
                } else {
                    self.get_json(&["community", "name", query]).await?
                };
                CachedValue::Communities(body.communities)
            }
            CacheKey::MyCommunities => {
                let body: CommunitiesEnvelope =
                    self.get_json(&["user", "communities"]).await?;
                CachedValue::Communities(body.communities)
            }
            CacheKey::UserProfile(id) => {
                let body: UserEnvelope =
                    self.get_json(&["user", "id", &id.to_string()]).await?;
                CachedValue::User(body.user)
            }
            CacheKey::Friends => {
                let body: FriendsEnvelope = self.get_json(&["user", "friends"]).await?;
                CachedValue::Users(body.friends)
            }
        };
        Ok(value)
    }
}
