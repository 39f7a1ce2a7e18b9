use super::optimistic_mutation::{MutationOutcome, MutationPlan, OptimisticMutator, Reconcile};
use crate::application::ports::notifier::{Notification, NotificationLevel};
use crate::application::ports::scholars_api::{ReviewDecision, ScholarsApi};
use crate::domain::value_objects::CacheKey;
use std::sync::Arc;

pub struct ModerationService {
    mutator: Arc<OptimisticMutator>,
    api: Arc<dyn ScholarsApi>,
}

impl ModerationService {
    pub fn new(mutator: Arc<OptimisticMutator>, api: Arc<dyn ScholarsApi>) -> Self {
        Self { mutator, api }
    }

    /// Approves or rejects a post waiting in the moderation queue.
    pub async fn review_post(&self, post_id: i64, decision: ReviewDecision) -> MutationOutcome<()> {
        let (title, description, failure) = match decision {
            ReviewDecision::Approve => (
                "Post approved",
                "The post has been approved.",
                "Failed to approve post",
            ),
            ReviewDecision::Reject => (
                "Post rejected",
                "The post has been rejected.",
                "Failed to reject post",
            ),
        };

        let plan = MutationPlan::new(CacheKey::PendingPosts, failure)
            .with_success_notification(Notification {
                level: NotificationLevel::Success,
                title: title.to_string(),
                description: description.to_string(),
            })
            .reconcile(Reconcile::OnSuccess);

        let api = Arc::clone(&self.api);
        self.mutator
            .execute(plan, async move { api.review_post(post_id, decision).await })
            .await
    }
}
