use super::optimistic_mutation::{
    MutationOutcome, MutationPlan, OptimisticMutator, Reconcile, map_entry,
};
use crate::application::ports::scholars_api::ScholarsApi;
use crate::domain::entities::{CachedValue, CommunityDraft, CommunityUpdate, UserSummary};
use crate::domain::value_objects::CacheKey;
use crate::shared::error::AppError;
use std::sync::Arc;

pub struct CommunityService {
    mutator: Arc<OptimisticMutator>,
    api: Arc<dyn ScholarsApi>,
}

impl CommunityService {
    pub fn new(mutator: Arc<OptimisticMutator>, api: Arc<dyn ScholarsApi>) -> Self {
        Self { mutator, api }
    }

    /// Joins or leaves a community shown under `key`.
    ///
    /// A detail entry also gains or loses `viewer` in its member list; a
    /// directory entry only has its flag and count adjusted.
    pub async fn set_membership(
        &self,
        key: CacheKey,
        community_id: i64,
        join: bool,
        viewer: Option<UserSummary>,
    ) -> Result<MutationOutcome<()>, AppError> {
        let (success, failure) = if join {
            ("Community joined successfully", "Failed to join community")
        } else {
            ("Community left successfully", "Failed to leave community")
        };

        let plan = MutationPlan::new(key, failure)
            .with_rewrite(map_entry(move |value| {
                apply_membership(value, community_id, join, viewer.as_ref())
            }))
            .with_success(success)
            .also_invalidate(CacheKey::MyCommunities);

        let api = Arc::clone(&self.api);
        Ok(self
            .mutator
            .execute(plan, async move {
                if join {
                    api.join_community(community_id).await
                } else {
                    api.leave_community(community_id).await
                }
            })
            .await)
    }

    pub async fn update_community(
        &self,
        community_id: i64,
        update: CommunityUpdate,
    ) -> Result<MutationOutcome<()>, AppError> {
        if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(AppError::InvalidInput("community name is empty".into()));
        }

        let edited = update.clone();
        let plan = MutationPlan::new(CacheKey::Community(community_id), "Failed to update community")
            .with_rewrite(map_entry(move |value| match value {
                CachedValue::Community(mut community) if community.id == community_id => {
                    community.apply_update(&edited);
                    CachedValue::Community(community)
                }
                other => other,
            }))
            .with_success("Community updated successfully");

        let api = Arc::clone(&self.api);
        Ok(self
            .mutator
            .execute(plan, async move {
                api.update_community(community_id, &update).await
            })
            .await)
    }

    /// Creates a community; the directory is refreshed once the server
    /// accepts it.
    pub async fn create_community(
        &self,
        draft: CommunityDraft,
    ) -> Result<MutationOutcome<()>, AppError> {
        draft.validate().map_err(AppError::InvalidInput)?;

        let plan = MutationPlan::new(CacheKey::communities(""), "Failed to create community")
            .with_success("Community created successfully")
            .reconcile(Reconcile::OnSuccess);

        let api = Arc::clone(&self.api);
        Ok(self
            .mutator
            .execute(plan, async move { api.create_community(&draft).await })
            .await)
    }

    /// Removes a community from the directory until the server answers.
    pub async fn delete_community(&self, community_id: i64) -> MutationOutcome<()> {
        let plan = MutationPlan::new(CacheKey::communities(""), "Failed to delete community")
            .with_rewrite(map_entry(move |value| match value {
                CachedValue::Communities(mut communities) => {
                    communities.retain(|community| community.id != community_id);
                    CachedValue::Communities(communities)
                }
                other => other,
            }))
            .with_success("Community deleted successfully")
            .reconcile(Reconcile::OnSuccess)
            .also_invalidate(CacheKey::MyCommunities);

        let api = Arc::clone(&self.api);
        self.mutator
            .execute(plan, async move { api.delete_community(community_id).await })
            .await
    }
}

fn apply_membership(
    value: CachedValue,
    community_id: i64,
    join: bool,
    viewer: Option<&UserSummary>,
) -> CachedValue {
    match value {
        CachedValue::Community(mut community) if community.id == community_id => {
            if join {
                community.join(viewer);
            } else {
                community.leave(viewer);
            }
            CachedValue::Community(community)
        }
        CachedValue::Communities(mut communities) => {
            if let Some(community) = communities.iter_mut().find(|c| c.id == community_id) {
                community.set_membership_flag(join);
            }
            CachedValue::Communities(communities)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::cache::QueryCache;
    use crate::application::services::optimistic_mutation::MutationState;
    use crate::application::services::test_support::{
        MockApi, MockLoader, MockNotify, offline_cache, quiet_notifier,
    };
    use crate::domain::entities::Community;
    use crate::infrastructure::cache::MemoryQueryCache;
    use crate::shared::error::ApiError;
    use mockall::predicate::*;

    fn community(id: i64, members: i64, is_member: bool) -> Community {
        let mut community = Community::new(id, format!("c{id}"));
        community.member_count = members;
        community.is_member = is_member;
        community
    }

    #[tokio::test]
    async fn test_join_detail_adds_viewer() {
        let cache = offline_cache();
        cache
            .set(CacheKey::Community(3), CachedValue::Community(community(3, 10, false)))
            .await;

        let mut api = MockApi::new();
        api.expect_join_community()
            .with(eq(3))
            .times(1)
            .returning(|_| Ok(()));
        api.expect_leave_community().never();

        let mut notifier = MockNotify::new();
        notifier
            .expect_notify()
            .withf(|n| n.description == "Community joined successfully")
            .times(1)
            .return_const(());

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), Arc::new(notifier)));
        let service = CommunityService::new(mutator, Arc::new(api));
        let viewer = UserSummary::new(42, "ada");
        service
            .set_membership(CacheKey::Community(3), 3, true, Some(viewer.clone()))
            .await
            .unwrap();

        let value = cache.get(&CacheKey::Community(3)).await.unwrap();
        let detail = value.as_community().unwrap();
        assert!(detail.is_member);
        assert_eq!(detail.member_count, 11);
        assert_eq!(detail.members, vec![viewer]);
    }

    #[tokio::test]
    async fn test_leave_from_directory_adjusts_flag_and_count() {
        let cache = offline_cache();
        let key = CacheKey::communities("");
        cache
            .set(
                key.clone(),
                CachedValue::Communities(vec![community(1, 4, true), community(2, 7, true)]),
            )
            .await;

        let mut api = MockApi::new();
        api.expect_leave_community()
            .with(eq(2))
            .times(1)
            .returning(|_| Ok(()));

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), quiet_notifier()));
        let service = CommunityService::new(mutator, Arc::new(api));
        service.set_membership(key.clone(), 2, false, None).await.unwrap();

        let value = cache.get(&key).await.unwrap();
        let listed = value.as_communities().unwrap();
        assert_eq!((listed[0].is_member, listed[0].member_count), (true, 4));
        assert_eq!((listed[1].is_member, listed[1].member_count), (false, 6));
    }

    #[tokio::test]
    async fn test_failed_join_rolls_back_members() {
        let cache = offline_cache();
        let before = CachedValue::Community(community(3, 10, false));
        cache.set(CacheKey::Community(3), before.clone()).await;

        let mut api = MockApi::new();
        api.expect_join_community().times(1).returning(|_| {
            Err(ApiError::new(403, "FORBIDDEN", "Private community").with_info("Ask an admin"))
        });

        let mut notifier = MockNotify::new();
        notifier
            .expect_notify()
            .withf(|n| n.title == "Private community" && n.description == "Ask an admin")
            .times(1)
            .return_const(());

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), Arc::new(notifier)));
        let service = CommunityService::new(mutator, Arc::new(api));
        let outcome = service
            .set_membership(CacheKey::Community(3), 3, true, Some(UserSummary::new(1, "u")))
            .await
            .unwrap();

        assert_eq!(outcome.state, MutationState::RolledBack);
        assert_eq!(cache.get(&CacheKey::Community(3)).await, Some(before));
    }

    #[tokio::test]
    async fn test_update_merges_edited_fields() {
        let cache = offline_cache();
        let mut original = community(5, 1, true);
        original.description = Some("old".into());
        original.tags = vec!["math".into()];
        cache
            .set(CacheKey::Community(5), CachedValue::Community(original))
            .await;

        let update = CommunityUpdate {
            description: Some("new".into()),
            ..Default::default()
        };
        let mut api = MockApi::new();
        api.expect_update_community()
            .withf(|id, update| *id == 5 && update.description.as_deref() == Some("new"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), quiet_notifier()));
        let service = CommunityService::new(mutator, Arc::new(api));
        service.update_community(5, update).await.unwrap();

        let value = cache.get(&CacheKey::Community(5)).await.unwrap();
        let detail = value.as_community().unwrap();
        assert_eq!(detail.description.as_deref(), Some("new"));
        assert_eq!(detail.tags, vec!["math".to_string()]);
        assert_eq!(detail.name, "c5");
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let mut api = MockApi::new();
        api.expect_update_community().never();
        let mutator = Arc::new(OptimisticMutator::new(offline_cache(), quiet_notifier()));
        let service = CommunityService::new(mutator, Arc::new(api));

        let update = CommunityUpdate {
            name: Some(" ".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_community(5, update).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_membership_change_refreshes_my_communities() {
        let mut loader = MockLoader::new();
        loader
            .expect_load()
            .with(eq(CacheKey::Community(3)))
            .times(1)
            .returning(|_| Ok(CachedValue::Community(community(3, 11, true))));
        loader
            .expect_load()
            .with(eq(CacheKey::MyCommunities))
            .times(1)
            .returning(|_| Ok(CachedValue::Communities(vec![community(3, 11, true)])));
        let cache = Arc::new(MemoryQueryCache::new(Arc::new(loader), 60));
        cache
            .set(CacheKey::Community(3), CachedValue::Community(community(3, 10, false)))
            .await;

        let mut api = MockApi::new();
        api.expect_join_community().times(1).returning(|_| Ok(()));

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), quiet_notifier()));
        CommunityService::new(mutator, Arc::new(api))
            .set_membership(CacheKey::Community(3), 3, true, None)
            .await
            .unwrap();

        cache.settle(&CacheKey::Community(3)).await;
        cache.settle(&CacheKey::MyCommunities).await;
        let mine = cache.get(&CacheKey::MyCommunities).await.unwrap();
        assert_eq!(mine.as_communities().unwrap()[0].id, 3);
    }

    #[tokio::test]
    async fn test_create_community_refreshes_directory() {
        let mut loader = MockLoader::new();
        loader
            .expect_load()
            .with(eq(CacheKey::communities("")))
            .times(1)
            .returning(|_| Ok(CachedValue::Communities(vec![community(9, 1, true)])));
        let cache = Arc::new(MemoryQueryCache::new(Arc::new(loader), 60));

        let mut api = MockApi::new();
        api.expect_create_community()
            .withf(|draft| draft.name == "Robotics" && draft.tags == ["hardware", "ai"])
            .times(1)
            .returning(|_| Ok(()));
        let mut notifier = MockNotify::new();
        notifier
            .expect_notify()
            .withf(|n| n.description == "Community created successfully")
            .times(1)
            .return_const(());

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), Arc::new(notifier)));
        let outcome = CommunityService::new(mutator, Arc::new(api))
            .create_community(CommunityDraft::new(
                "Robotics",
                "Build and break robots",
                "hardware, ai",
            ))
            .await
            .unwrap();
        assert!(outcome.is_committed());

        cache.settle(&CacheKey::communities("")).await;
        let listed = cache.get(&CacheKey::communities("")).await.unwrap();
        assert_eq!(listed.as_communities().unwrap()[0].id, 9);
    }

    #[tokio::test]
    async fn test_create_community_rejects_short_description() {
        let mut api = MockApi::new();
        api.expect_create_community().never();
        let mutator = Arc::new(OptimisticMutator::new(offline_cache(), quiet_notifier()));

        let result = CommunityService::new(mutator, Arc::new(api))
            .create_community(CommunityDraft::new("Robotics", "Robots", ""))
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_community_listed() {
        let mut loader = MockLoader::new();
        loader.expect_load().never();
        let cache = Arc::new(MemoryQueryCache::new(Arc::new(loader), 60));
        let key = CacheKey::communities("");
        let before = CachedValue::Communities(vec![community(1, 4, true), community(2, 7, true)]);
        cache.set(key.clone(), before.clone()).await;

        let mut api = MockApi::new();
        api.expect_delete_community()
            .with(eq(2))
            .times(1)
            .returning(|_| Err(ApiError::new(403, "FORBIDDEN", "Only the owner can delete")));
        let mut notifier = MockNotify::new();
        notifier
            .expect_notify()
            .withf(|n| {
                n.title == "Only the owner can delete" && n.description == "Failed to delete community"
            })
            .times(1)
            .return_const(());

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), Arc::new(notifier)));
        let outcome = CommunityService::new(mutator, Arc::new(api))
            .delete_community(2)
            .await;

        assert_eq!(outcome.state, MutationState::RolledBack);
        assert_eq!(cache.get(&key).await, Some(before));
    }

    #[tokio::test]
    async fn test_delete_community_drops_it_from_directory() {
        let cache = offline_cache();
        let key = CacheKey::communities("");
        cache
            .set(
                key.clone(),
                CachedValue::Communities(vec![community(1, 4, true), community(2, 7, true)]),
            )
            .await;

        let mut api = MockApi::new();
        api.expect_delete_community()
            .with(eq(2))
            .times(1)
            .returning(|_| Ok(()));

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), quiet_notifier()));
        CommunityService::new(mutator, Arc::new(api))
            .delete_community(2)
            .await;

        let value = cache.get(&key).await.unwrap();
        let ids: Vec<i64> = value.as_communities().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
