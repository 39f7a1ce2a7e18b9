use super::optimistic_mutation::{MutationOutcome, MutationPlan, OptimisticMutator, map_entry};
use crate::application::ports::cache::CacheUpdater;
use crate::application::ports::scholars_api::{NewComment, ScholarsApi};
use crate::domain::comment_tree::{TreeOp, prepend_root, replace_placeholder, rewrite_tree};
use crate::domain::entities::{CachedValue, Comment, UserSummary};
use crate::domain::value_objects::{CacheKey, CommentId};
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::debug;

pub struct CommentService {
    mutator: Arc<OptimisticMutator>,
    api: Arc<dyn ScholarsApi>,
}

impl CommentService {
    pub fn new(mutator: Arc<OptimisticMutator>, api: Arc<dyn ScholarsApi>) -> Self {
        Self { mutator, api }
    }

    /// Posts a comment, or a reply when `parent` is given.
    ///
    /// A placeholder with a pending id is shown immediately and swapped for
    /// the server's node once the request commits.
    pub async fn create_comment(
        &self,
        post_id: i64,
        author: UserSummary,
        content: &str,
        parent: Option<CommentId>,
    ) -> Result<MutationOutcome<Option<Comment>>, AppError> {
        let content = non_empty(content)?;
        let parent_id = match parent {
            Some(id) => Some(id.server_id().ok_or_else(|| {
                AppError::InvalidInput(format!("cannot reply to unsaved comment {id}"))
            })?),
            None => None,
        };

        let placeholder = Comment::placeholder(post_id, parent_id, author, content.clone());
        let CommentId::Pending(local_id) = placeholder.id else {
            return Err(AppError::Internal("placeholder without a local id".into()));
        };
        debug!(post_id, %local_id, ?parent_id, "creating comment");

        let (success, failure) = match parent {
            Some(_) => ("Reply posted successfully", "Failed to post reply"),
            None => ("Comment created successfully", "Failed to create comment"),
        };

        let plan = MutationPlan::new(CacheKey::Comments(post_id), failure)
            .with_rewrite(move |value| insert_placeholder(value, parent, placeholder))
            .on_commit(move |committed: &Option<Comment>| {
                let committed = committed.clone()?;
                let updater: CacheUpdater = Box::new(map_entry(move |value| match value {
                    CachedValue::Comments(forest) => {
                        CachedValue::Comments(replace_placeholder(&forest, local_id, committed))
                    }
                    other => other,
                }));
                Some(updater)
            })
            .with_success(success);

        let api = Arc::clone(&self.api);
        let body = NewComment { content, parent_id };
        Ok(self
            .mutator
            .execute(plan, async move { api.create_comment(post_id, body).await })
            .await)
    }

    pub async fn edit_comment(
        &self,
        post_id: i64,
        comment_id: CommentId,
        content: &str,
    ) -> Result<MutationOutcome<()>, AppError> {
        let content = non_empty(content)?;
        let server_id = committed_id(comment_id)?;

        let edited = content.clone();
        let plan = MutationPlan::new(CacheKey::Comments(post_id), "Failed to edit comment")
            .with_rewrite(map_entry(move |value| {
                rewrite_comments(
                    value,
                    &comment_id,
                    TreeOp::update(move |mut comment| {
                        comment.edit(edited);
                        comment
                    }),
                )
            }))
            .with_success("Comment updated successfully");

        let api = Arc::clone(&self.api);
        Ok(self
            .mutator
            .execute(plan, async move { api.edit_comment(server_id, &content).await })
            .await)
    }

    /// Deletes a comment together with all of its replies.
    pub async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: CommentId,
    ) -> Result<MutationOutcome<()>, AppError> {
        let server_id = committed_id(comment_id)?;

        let plan = MutationPlan::new(CacheKey::Comments(post_id), "Failed to delete comment")
            .with_rewrite(map_entry(move |value| {
                rewrite_comments(value, &comment_id, TreeOp::Remove)
            }))
            .with_success("Comment deleted successfully");

        let api = Arc::clone(&self.api);
        Ok(self
            .mutator
            .execute(plan, async move { api.delete_comment(server_id).await })
            .await)
    }
}

fn non_empty(content: &str) -> Result<String, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput("comment content is empty".into()));
    }
    Ok(content.to_string())
}

fn committed_id(id: CommentId) -> Result<i64, AppError> {
    id.server_id()
        .ok_or_else(|| AppError::InvalidInput(format!("comment {id} is not saved yet")))
}

fn rewrite_comments(value: CachedValue, target: &CommentId, op: TreeOp) -> CachedValue {
    match value {
        CachedValue::Comments(forest) => CachedValue::Comments(rewrite_tree(&forest, target, op)),
        other => other,
    }
}

fn insert_placeholder(
    value: Option<CachedValue>,
    parent: Option<CommentId>,
    placeholder: Comment,
) -> Option<CachedValue> {
    match (value, parent) {
        (Some(CachedValue::Comments(forest)), None) => {
            Some(CachedValue::Comments(prepend_root(&forest, placeholder)))
        }
        (Some(CachedValue::Comments(forest)), Some(parent)) => Some(CachedValue::Comments(
            rewrite_tree(&forest, &parent, TreeOp::InsertChild(placeholder)),
        )),
        // first comment on a post whose thread was never loaded
        (None, None) => Some(CachedValue::Comments(vec![placeholder])),
        (value, _) => value,
    }
}
