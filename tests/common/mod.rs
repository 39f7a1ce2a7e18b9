#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use scholars_lib::AppConfig;
use scholars_lib::application::ports::notifier::{Notification, Notifier};
use scholars_lib::application::ports::query_loader::QueryLoader;
use scholars_lib::application::ports::scholars_api::{
    NewComment, NewPost, ReviewDecision, ScholarsApi,
};
use scholars_lib::domain::entities::{
    CachedValue, Comment, CommunityDraft, CommunityUpdate, Post, PostDraft, UserSummary,
};
use scholars_lib::domain::value_objects::{CacheKey, CommentId, Vote};
use scholars_lib::shared::error::{ApiError, AppError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, watch};

/// Backend fake that records every call and answers from a script.
#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<String>>,
    failures: Mutex<Vec<ApiError>>,
    created: Mutex<Option<Comment>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl RecordingApi {
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// The next request fails with `error`.
    pub async fn fail_next(&self, error: ApiError) {
        self.failures.lock().await.push(error);
    }

    pub async fn respond_with_comment(&self, comment: Comment) {
        *self.created.lock().await = Some(comment);
    }

    /// Holds the next request until the returned gate is notified.
    pub async fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().await = Some(gate.clone());
        gate
    }

    async fn record(&self, call: String) -> Result<(), ApiError> {
        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.calls.lock().await.push(call);
        let mut failures = self.failures.lock().await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.remove(0))
        }
    }
}

#[async_trait]
impl ScholarsApi for RecordingApi {
    async fn vote_post(&self, post_id: i64, vote: Vote) -> Result<(), ApiError> {
        self.record(format!("POST /post/{}/{post_id}", vote.endpoint()))
            .await
    }

    async fn vote_comment(&self, comment_id: i64, vote: Vote) -> Result<(), ApiError> {
        self.record(format!("POST /comment/{}/{comment_id}", vote.endpoint()))
            .await
    }

    async fn create_comment(
        &self,
        post_id: i64,
        comment: NewComment,
    ) -> Result<Option<Comment>, ApiError> {
        self.record(format!("POST /comment/{post_id} {}", comment.content))
            .await?;
        Ok(self.created.lock().await.take())
    }

    async fn edit_comment(&self, comment_id: i64, content: &str) -> Result<(), ApiError> {
        self.record(format!("PATCH /comment/{comment_id} {content}"))
            .await
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        self.record(format!("DELETE /comment/{comment_id}")).await
    }

    async fn join_community(&self, community_id: i64) -> Result<(), ApiError> {
        self.record(format!("POST /community/join/{community_id}"))
            .await
    }

    async fn leave_community(&self, community_id: i64) -> Result<(), ApiError> {
        self.record(format!("POST /community/leave/{community_id}"))
            .await
    }

    async fn update_community(
        &self,
        community_id: i64,
        _update: &CommunityUpdate,
    ) -> Result<(), ApiError> {
        self.record(format!("PUT /community/{community_id}")).await
    }

    async fn add_friend(&self, user_id: i64) -> Result<(), ApiError> {
        self.record(format!("POST /user/friends/{user_id}")).await
    }

    async fn remove_friend(&self, user_id: i64) -> Result<(), ApiError> {
        self.record(format!("DELETE /user/friends/{user_id}")).await
    }

    async fn review_post(&self, post_id: i64, decision: ReviewDecision) -> Result<(), ApiError> {
        self.record(format!("PATCH /post/{}/{post_id}", decision.endpoint()))
            .await
    }

    async fn create_post(&self, post: &NewPost) -> Result<(), ApiError> {
        self.record(format!("POST /post {}", post.draft.title)).await
    }

    async fn edit_post(&self, post_id: i64, draft: &PostDraft) -> Result<(), ApiError> {
        self.record(format!("PATCH /post/{post_id} {}", draft.title))
            .await
    }

    async fn delete_post(&self, post_id: i64) -> Result<(), ApiError> {
        self.record(format!("DELETE /post/{post_id}")).await
    }

    async fn create_community(&self, community: &CommunityDraft) -> Result<(), ApiError> {
        self.record(format!("POST /community {}", community.name))
            .await
    }

    async fn delete_community(&self, community_id: i64) -> Result<(), ApiError> {
        self.record(format!("DELETE /community/{community_id}")).await
    }

    async fn update_display_name(&self, user_id: i64, display_name: &str) -> Result<(), ApiError> {
        self.record(format!("PATCH /user/{user_id} {display_name}"))
            .await
    }
}

/// Read side fake: serves whatever the test put on the "server".
pub struct FakeServer {
    values: Mutex<HashMap<CacheKey, CachedValue>>,
    loads: Mutex<Vec<CacheKey>>,
    open: watch::Sender<bool>,
}

impl Default for FakeServer {
    fn default() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            loads: Mutex::new(Vec::new()),
            open: watch::Sender::new(true),
        }
    }
}

impl FakeServer {
    pub async fn put(&self, key: CacheKey, value: CachedValue) {
        self.values.lock().await.insert(key, value);
    }

    pub async fn loads_of(&self, key: &CacheKey) -> usize {
        self.loads.lock().await.iter().filter(|k| *k == key).count()
    }

    /// Loads block until [`FakeServer::release`] is called.
    pub fn hold(&self) {
        self.open.send_replace(false);
    }

    pub fn release(&self) {
        self.open.send_replace(true);
    }
}

#[async_trait]
impl QueryLoader for FakeServer {
    async fn load(&self, key: &CacheKey) -> Result<CachedValue, AppError> {
        self.loads.lock().await.push(key.clone());
        let mut open = self.open.subscribe();
        if open.wait_for(|open| *open).await.is_err() {
            return Err(AppError::Internal("server gone".into()));
        }
        self.values
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(key.to_string()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub async fn seen(&self) -> Vec<Notification> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.seen.lock().await.push(notification);
    }
}

pub struct Harness {
    pub state: scholars_lib::AppState,
    pub api: Arc<RecordingApi>,
    pub server: Arc<FakeServer>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    let api = Arc::new(RecordingApi::default());
    let server = Arc::new(FakeServer::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = scholars_lib::AppState::with_ports(
        AppConfig::default(),
        api.clone(),
        server.clone(),
        notifier.clone(),
    );
    Harness {
        state,
        api,
        server,
        notifier,
    }
}

pub fn author() -> UserSummary {
    UserSummary::new(1, "ada")
}

pub fn post(id: i64, upvotes: i64, downvotes: i64, user_vote: Option<Vote>) -> Post {
    let mut post = Post::new(id, format!("post {id}"), "body");
    post.upvotes = upvotes;
    post.downvotes = downvotes;
    post.user_vote = user_vote;
    post.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    post.updated_at = post.created_at;
    post
}

pub fn comment(id: i64, children: Vec<Comment>) -> Comment {
    let mut comment = Comment::placeholder(10, None, author(), format!("comment {id}"));
    comment.id = CommentId::Committed(id);
    comment.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    comment.updated_at = comment.created_at;
    comment.children = children;
    comment
}

/// 1 ─┬─ 2 ─── 3
///    └─ 4
/// 5
pub fn thread() -> Vec<Comment> {
    vec![
        comment(1, vec![comment(2, vec![comment(3, vec![])]), comment(4, vec![])]),
        comment(5, vec![]),
    ]
}
