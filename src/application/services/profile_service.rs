use super::optimistic_mutation::{
    MutationOutcome, MutationPlan, OptimisticMutator, Reconcile, map_entry,
};
use crate::application::ports::scholars_api::ScholarsApi;
use crate::domain::entities::CachedValue;
use crate::domain::value_objects::CacheKey;
use crate::shared::error::AppError;
use std::sync::Arc;

pub struct ProfileService {
    mutator: Arc<OptimisticMutator>,
    api: Arc<dyn ScholarsApi>,
}

impl ProfileService {
    pub fn new(mutator: Arc<OptimisticMutator>, api: Arc<dyn ScholarsApi>) -> Self {
        Self { mutator, api }
    }

    pub async fn update_display_name(
        &self,
        user_id: i64,
        display_name: &str,
    ) -> Result<MutationOutcome<()>, AppError> {
        let display_name = display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(AppError::InvalidInput("display name is empty".into()));
        }

        let shown = display_name.clone();
        let plan = MutationPlan::new(CacheKey::UserProfile(user_id), "Failed to update display name")
            .with_rewrite(map_entry(move |value| match value {
                CachedValue::User(mut user) if user.id == user_id => {
                    user.display_name = Some(shown);
                    CachedValue::User(user)
                }
                other => other,
            }))
            .with_success("Display name updated successfully")
            .reconcile(Reconcile::OnSuccess);

        let api = Arc::clone(&self.api);
        Ok(self
            .mutator
            .execute(plan, async move {
                api.update_display_name(user_id, &display_name).await
            })
            .await)
    }
}
