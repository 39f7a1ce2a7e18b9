use super::optimistic_mutation::{MutationOutcome, MutationPlan, OptimisticMutator, map_entry};
use crate::application::ports::scholars_api::ScholarsApi;
use crate::domain::comment_tree::{TreeOp, rewrite_tree};
use crate::domain::entities::CachedValue;
use crate::domain::value_objects::{CacheKey, CommentId, Votable, Vote};
use crate::shared::error::AppError;
use std::sync::Arc;

pub struct VoteService {
    mutator: Arc<OptimisticMutator>,
    api: Arc<dyn ScholarsApi>,
}

impl VoteService {
    pub fn new(mutator: Arc<OptimisticMutator>, api: Arc<dyn ScholarsApi>) -> Self {
        Self { mutator, api }
    }

    /// Votes on a post shown under `key`, which may hold the post itself or a
    /// list containing it.
    pub async fn vote_post(
        &self,
        key: CacheKey,
        post_id: i64,
        vote: Vote,
    ) -> Result<MutationOutcome<()>, AppError> {
        let plan = MutationPlan::new(key, "Failed to vote").with_rewrite(map_entry(move |value| {
            apply_post_vote(value, post_id, vote)
        }));

        let api = Arc::clone(&self.api);
        Ok(self
            .mutator
            .execute(plan, async move { api.vote_post(post_id, vote).await })
            .await)
    }

    /// Votes on a comment shown under `key`, which may hold the comment itself
    /// or a comment forest containing it.
    pub async fn vote_comment(
        &self,
        key: CacheKey,
        comment_id: CommentId,
        vote: Vote,
    ) -> Result<MutationOutcome<()>, AppError> {
        let server_id = comment_id.server_id().ok_or_else(|| {
            AppError::InvalidInput(format!("cannot vote on unsaved comment {comment_id}"))
        })?;

        let plan = MutationPlan::new(key, "Failed to vote").with_rewrite(map_entry(move |value| {
            apply_comment_vote(value, comment_id, vote)
        }));

        let api = Arc::clone(&self.api);
        Ok(self
            .mutator
            .execute(plan, async move { api.vote_comment(server_id, vote).await })
            .await)
    }
}

fn apply_post_vote(value: CachedValue, post_id: i64, vote: Vote) -> CachedValue {
    match value {
        CachedValue::Post(mut post) if post.id == post_id => {
            post.cast_vote(vote);
            CachedValue::Post(post)
        }
        CachedValue::Posts(mut posts) => {
            if let Some(post) = posts.iter_mut().find(|p| p.id == post_id) {
                post.cast_vote(vote);
            }
            CachedValue::Posts(posts)
        }
        other => other,
    }
}

fn apply_comment_vote(value: CachedValue, comment_id: CommentId, vote: Vote) -> CachedValue {
    match value {
        CachedValue::Comment(mut comment) if comment.id == comment_id => {
            comment.cast_vote(vote);
            CachedValue::Comment(comment)
        }
        CachedValue::Comments(forest) => CachedValue::Comments(rewrite_tree(
            &forest,
            &comment_id,
            TreeOp::update(move |mut comment| {
                comment.cast_vote(vote);
                comment
            }),
        )),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::cache::QueryCache;
    use crate::application::services::optimistic_mutation::MutationState;
    use crate::application::services::test_support::{
        MockApi, MockNotify, offline_cache, quiet_notifier,
    };
    use crate::domain::entities::{Comment, Post, UserSummary};
    use crate::domain::value_objects::VoteTally;
    use crate::shared::error::ApiError;
    use mockall::predicate::*;

    fn post(id: i64, up: i64, down: i64, vote: Option<Vote>) -> Post {
        let mut post = Post::new(id, format!("p{id}"), "");
        post.set_tally(VoteTally::new(up, down, vote));
        post
    }

    fn comment(id: i64, children: Vec<Comment>) -> Comment {
        let mut comment = Comment::placeholder(1, None, UserSummary::new(1, "u"), "c");
        comment.id = CommentId::Committed(id);
        comment.children = children;
        comment
    }

    #[tokio::test]
    async fn test_vote_post_in_feed_rewrites_only_target() {
        let cache = offline_cache();
        cache
            .set(
                CacheKey::PostFeed,
                CachedValue::Posts(vec![post(1, 5, 2, Some(Vote::Up)), post(2, 0, 0, None)]),
            )
            .await;

        let mut api = MockApi::new();
        api.expect_vote_post()
            .with(eq(1), eq(Vote::Down))
            .times(1)
            .returning(|_, _| Ok(()));

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), quiet_notifier()));
        let service = VoteService::new(mutator, Arc::new(api));
        let outcome = service
            .vote_post(CacheKey::PostFeed, 1, Vote::Down)
            .await
            .unwrap();

        assert_eq!(outcome.state, MutationState::Committed);
        let value = cache.get(&CacheKey::PostFeed).await.unwrap();
        let posts = value.as_posts().unwrap();
        assert_eq!(posts[0].tally(), VoteTally::new(4, 3, Some(Vote::Down)));
        assert_eq!(posts[1].tally(), VoteTally::default());
    }

    #[tokio::test]
    async fn test_failed_post_vote_rolls_back() {
        let cache = offline_cache();
        let before = CachedValue::Post(post(7, 2, 0, None));
        cache.set(CacheKey::Post(7), before.clone()).await;

        let mut api = MockApi::new();
        api.expect_vote_post()
            .times(1)
            .returning(|_, _| Err(ApiError::new(500, "INTERNAL_SERVER_ERROR", "boom")));

        let mut notifier = MockNotify::new();
        notifier
            .expect_notify()
            .withf(|n| n.title == "boom" && n.description == "Failed to vote")
            .times(1)
            .return_const(());

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), Arc::new(notifier)));
        let service = VoteService::new(mutator, Arc::new(api));
        let outcome = service
            .vote_post(CacheKey::Post(7), 7, Vote::Up)
            .await
            .unwrap();

        assert_eq!(outcome.state, MutationState::RolledBack);
        assert_eq!(cache.get(&CacheKey::Post(7)).await, Some(before));
    }

    #[tokio::test]
    async fn test_vote_comment_deep_in_forest() {
        let cache = offline_cache();
        let key = CacheKey::Comments(1);
        cache
            .set(
                key.clone(),
                CachedValue::Comments(vec![comment(1, vec![comment(2, vec![comment(3, vec![])])])]),
            )
            .await;

        let mut api = MockApi::new();
        api.expect_vote_comment()
            .with(eq(3), eq(Vote::Up))
            .times(1)
            .returning(|_, _| Ok(()));

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), quiet_notifier()));
        let service = VoteService::new(mutator, Arc::new(api));
        service
            .vote_comment(key.clone(), CommentId::Committed(3), Vote::Up)
            .await
            .unwrap();

        let value = cache.get(&key).await.unwrap();
        let leaf = &value.as_comments().unwrap()[0].children[0].children[0];
        assert_eq!(leaf.tally(), VoteTally::new(1, 0, Some(Vote::Up)));
    }

    #[tokio::test]
    async fn test_vote_comment_on_single_comment_entry() {
        let cache = offline_cache();
        let key = CacheKey::Comments(1);
        let mut target = comment(4, vec![comment(5, vec![])]);
        target.set_tally(VoteTally::new(3, 1, Some(Vote::Down)));
        cache.set(key.clone(), CachedValue::Comment(target)).await;

        let mut api = MockApi::new();
        api.expect_vote_comment()
            .with(eq(4), eq(Vote::Up))
            .times(1)
            .returning(|_, _| Ok(()));

        let mutator = Arc::new(OptimisticMutator::new(cache.clone(), quiet_notifier()));
        let service = VoteService::new(mutator, Arc::new(api));
        service
            .vote_comment(key.clone(), CommentId::Committed(4), Vote::Up)
            .await
            .unwrap();

        let Some(CachedValue::Comment(voted)) = cache.get(&key).await else {
            panic!("expected a single comment entry");
        };
        assert_eq!(voted.tally(), VoteTally::new(4, 0, Some(Vote::Up)));
        assert_eq!(voted.children[0].tally(), VoteTally::default());
    }

    #[test]
    fn vote_on_other_comment_entry_is_a_no_op() {
        let value = CachedValue::Comment(comment(4, vec![]));
        assert_eq!(
            apply_comment_vote(value.clone(), CommentId::Committed(5), Vote::Up),
            value
        );
    }

    #[tokio::test]
    async fn test_vote_on_pending_comment_is_rejected() {
        let mut api = MockApi::new();
        api.expect_vote_comment().never();

        let mutator = Arc::new(OptimisticMutator::new(offline_cache(), quiet_notifier()));
        let service = VoteService::new(mutator, Arc::new(api));
        let result = service
            .vote_comment(CacheKey::Comments(1), CommentId::placeholder(), Vote::Up)
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn vote_on_other_post_entry_is_a_no_op() {
        let value = CachedValue::Post(post(1, 1, 1, None));
        assert_eq!(apply_post_vote(value.clone(), 2, Vote::Up), value);
    }
}
