use super::optimistic_mutation::{
    MutationOutcome, MutationPlan, OptimisticMutator, Reconcile, map_entry,
};
use crate::application::ports::scholars_api::{NewPost, ScholarsApi};
use crate::domain::entities::{CachedValue, PostDraft};
use crate::domain::value_objects::CacheKey;
use crate::shared::error::AppError;
use std::sync::Arc;

/// Post authoring. Drafts are checked against the form rules before anything
/// reaches the cache or the backend.
pub struct PostService {
    mutator: Arc<OptimisticMutator>,
    api: Arc<dyn ScholarsApi>,
}

impl PostService {
    pub fn new(mutator: Arc<OptimisticMutator>, api: Arc<dyn ScholarsApi>) -> Self {
        Self { mutator, api }
    }

    /// Publishes a post in a community; the community's post list is
    /// refreshed once the server accepts it.
    pub async fn create_post(
        &self,
        community_id: i64,
        draft: PostDraft,
    ) -> Result<MutationOutcome<()>, AppError> {
        draft.validate().map_err(AppError::InvalidInput)?;

        let plan = MutationPlan::new(CacheKey::CommunityPosts(community_id), "Failed to create post")
            .with_success("Post created successfully")
            .reconcile(Reconcile::OnSuccess);

        let api = Arc::clone(&self.api);
        let post = NewPost {
            draft,
            community_id,
        };
        Ok(self
            .mutator
            .execute(plan, async move { api.create_post(&post).await })
            .await)
    }

    /// Rewrites the cached post with the edited fields, then refreshes it and
    /// the community's post list on success.
    pub async fn edit_post(
        &self,
        community_id: i64,
        post_id: i64,
        draft: PostDraft,
    ) -> Result<MutationOutcome<()>, AppError> {
        draft.validate().map_err(AppError::InvalidInput)?;

        let edited = draft.clone();
        let plan = MutationPlan::new(CacheKey::Post(post_id), "Failed to update post")
            .with_rewrite(map_entry(move |value| match value {
                CachedValue::Post(mut post) if post.id == post_id => {
                    post.apply_draft(&edited);
                    CachedValue::Post(post)
                }
                other => other,
            }))
            .with_success("Post updated successfully")
            .reconcile(Reconcile::OnSuccess)
            .also_invalidate(CacheKey::CommunityPosts(community_id));

        let api = Arc::clone(&self.api);
        Ok(self
            .mutator
            .execute(plan, async move { api.edit_post(post_id, &draft).await })
            .await)
    }

    /// Drops the post from the community's post list until the server answers.
    pub async fn delete_post(&self, community_id: i64, post_id: i64) -> MutationOutcome<()> {
        let plan = MutationPlan::new(CacheKey::CommunityPosts(community_id), "Failed to delete post")
            .with_rewrite(map_entry(move |value| match value {
                CachedValue::Posts(mut posts) => {
                    posts.retain(|post| post.id != post_id);
                    CachedValue::Posts(posts)
                }
                other => other,
            }))
            .with_success("Post deleted successfully")
            .reconcile(Reconcile::OnSuccess);

        let api = Arc::clone(&self.api);
        self.mutator
            .execute(plan, async move { api.delete_post(post_id).await })
            .await
    }
}
