use super::optimistic_mutation::{MutationOutcome, MutationPlan, OptimisticMutator, Reconcile};
use crate::application::ports::scholars_api::ScholarsApi;
use crate::domain::value_objects::CacheKey;
use std::sync::Arc;

/// Friend list changes. The list is refreshed from the server on success;
/// nothing is rewritten speculatively. Sending a request also refreshes the
/// other user's profile, which shows the friendship state.
pub struct FriendService {
    mutator: Arc<OptimisticMutator>,
    api: Arc<dyn ScholarsApi>,
}

impl FriendService {
    pub fn new(mutator: Arc<OptimisticMutator>, api: Arc<dyn ScholarsApi>) -> Self {
        Self { mutator, api }
    }

    pub async fn add_friend(&self, user_id: i64) -> MutationOutcome<()> {
        let plan = MutationPlan::new(CacheKey::Friends, "Failed to send friend request")
            .with_success("Friend request sent successfully")
            .reconcile(Reconcile::OnSuccess)
            .also_invalidate(CacheKey::UserProfile(user_id));

        let api = Arc::clone(&self.api);
        self.mutator
            .execute(plan, async move { api.add_friend(user_id).await })
            .await
    }

    pub async fn remove_friend(&self, user_id: i64) -> MutationOutcome<()> {
        let plan = MutationPlan::new(CacheKey::Friends, "Failed to remove friend")
            .with_success("Friend removed successfully")
            .reconcile(Reconcile::OnSuccess);

        let api = Arc::clone(&self.api);
        self.mutator
            .execute(plan, async move { api.remove_friend(user_id).await })
            .await
    }
}
