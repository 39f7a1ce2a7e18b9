//! Optimistic mutation lifecycle shared by every write the client performs.
//!
//! A mutation cancels in-flight refreshes of its cache key, snapshots the
//! entry, applies a speculative rewrite, awaits the request, restores the
//! snapshot on failure and finally invalidates the key so the entry is
//! reconciled with the server.

use crate::application::ports::cache::{CacheUpdater, QueryCache};
use crate::application::ports::notifier::{Notification, Notifier};
use crate::domain::entities::CachedValue;
use crate::domain::value_objects::CacheKey;
use crate::shared::error::ApiError;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Pending,
    Committed,
    RolledBack,
    Reconciling,
}

impl MutationState {
    fn can_transition_to(self, next: MutationState) -> bool {
        use MutationState::*;
        matches!(
            (self, next),
            (Idle, Pending)
                | (Pending, Committed)
                | (Pending, RolledBack)
                | (Committed, Reconciling)
                | (RolledBack, Reconciling)
                | (Committed, Idle)
                | (RolledBack, Idle)
                | (Reconciling, Idle)
        )
    }
}

/// When the mutated key is invalidated after the request settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    Always,
    OnSuccess,
}

/// Pre-mutation state of the affected entry, held until the request settles.
#[derive(Debug)]
pub struct PendingMutationContext {
    key: CacheKey,
    snapshot: Option<CachedValue>,
    rewritten: bool,
}

impl PendingMutationContext {
    pub fn snapshot(&self) -> Option<&CachedValue> {
        self.snapshot.as_ref()
    }
}

type CommitHook<T> = Box<dyn FnOnce(&T) -> Option<CacheUpdater> + Send>;

/// Everything the orchestrator needs to run one mutation besides the request.
pub struct MutationPlan<T = ()> {
    key: CacheKey,
    rewrite: Option<CacheUpdater>,
    on_commit: Option<CommitHook<T>>,
    success: Option<Notification>,
    failure_message: String,
    reconcile: Reconcile,
    /// Keys that show the same data in another shape; invalidated with `key`.
    related: Vec<CacheKey>,
}

impl<T> MutationPlan<T> {
    pub fn new(key: CacheKey, failure_message: impl Into<String>) -> Self {
        Self {
            key,
            rewrite: None,
            on_commit: None,
            success: None,
            failure_message: failure_message.into(),
            reconcile: Reconcile::Always,
            related: Vec::new(),
        }
    }

    /// Speculative rewrite applied before the request is sent.
    pub fn with_rewrite<F>(mut self, rewrite: F) -> Self
    where
        F: FnOnce(Option<CachedValue>) -> Option<CachedValue> + Send + 'static,
    {
        self.rewrite = Some(Box::new(rewrite));
        self
    }

    /// Cache update derived from the server's response, applied on commit
    /// before reconciliation starts.
    pub fn on_commit<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&T) -> Option<CacheUpdater> + Send + 'static,
    {
        self.on_commit = Some(Box::new(hook));
        self
    }

    pub fn with_success(mut self, description: impl Into<String>) -> Self {
        self.success = Some(Notification::success(description));
        self
    }

    pub fn with_success_notification(mut self, notification: Notification) -> Self {
        self.success = Some(notification);
        self
    }

    pub fn reconcile(mut self, reconcile: Reconcile) -> Self {
        self.reconcile = reconcile;
        self
    }

    /// Also refreshes `key` when the mutation reconciles.
    pub fn also_invalidate(mut self, key: CacheKey) -> Self {
        if key != self.key && !self.related.contains(&key) {
            self.related.push(key);
        }
        self
    }
}

/// Result of a settled mutation.
#[derive(Debug)]
pub struct MutationOutcome<T> {
    pub state: MutationState,
    pub result: Result<T, ApiError>,
}

impl<T> MutationOutcome<T> {
    pub fn is_committed(&self) -> bool {
        self.state == MutationState::Committed
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        self.result
    }
}

/// A mutation whose speculative rewrite has been applied.
#[derive(Debug)]
pub struct PendingMutation {
    context: PendingMutationContext,
    state: MutationState,
    started_at: Instant,
}

impl PendingMutation {
    pub fn context(&self) -> &PendingMutationContext {
        &self.context
    }

    fn transition(&mut self, next: MutationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid mutation transition {:?} -> {next:?}",
            self.state
        );
        debug!(
            key = %self.context.key,
            from = ?self.state,
            to = ?next,
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "mutation transition"
        );
        self.state = next;
    }
}

pub struct OptimisticMutator {
    cache: Arc<dyn QueryCache>,
    notifier: Arc<dyn Notifier>,
    notify_success: bool,
}

impl OptimisticMutator {
    pub fn new(cache: Arc<dyn QueryCache>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            cache,
            notifier,
            notify_success: true,
        }
    }

    pub fn with_success_notifications(mut self, enabled: bool) -> Self {
        self.notify_success = enabled;
        self
    }

    /// Idle -> Pending: cancel refreshes, snapshot and rewrite the entry.
    pub async fn begin(&self, key: &CacheKey, rewrite: Option<CacheUpdater>) -> PendingMutation {
        self.cache.cancel_pending(key).await;

        let rewritten = rewrite.is_some();
        let snapshot = match rewrite {
            Some(rewrite) => self.cache.update(key.clone(), rewrite).await,
            None => self.cache.get(key).await,
        };

        let mut pending = PendingMutation {
            context: PendingMutationContext {
                key: key.clone(),
                snapshot,
                rewritten,
            },
            state: MutationState::Idle,
            started_at: Instant::now(),
        };
        pending.transition(MutationState::Pending);
        pending
    }

    /// Runs the whole lifecycle and returns once the mutation has settled
    /// and reconciliation has been triggered.
    pub async fn execute<T, Fut>(&self, mut plan: MutationPlan<T>, request: Fut) -> MutationOutcome<T>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let rewrite = plan.rewrite.take();
        let pending = self.begin(&plan.key, rewrite).await;
        let result = request.await;
        self.settle(pending, plan, result).await
    }

    /// Applies the speculative rewrite, then finishes the mutation on a
    /// background task.
    pub async fn dispatch<T, Fut>(
        self: &Arc<Self>,
        mut plan: MutationPlan<T>,
        request: Fut,
    ) -> JoinHandle<MutationOutcome<T>>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let rewrite = plan.rewrite.take();
        let pending = self.begin(&plan.key, rewrite).await;
        let mutator = Arc::clone(self);
        tokio::spawn(async move {
            let result = request.await;
            mutator.settle(pending, plan, result).await
        })
    }

    /// Pending -> Committed | RolledBack -> Reconciling -> Idle.
    pub async fn settle<T>(
        &self,
        mut pending: PendingMutation,
        plan: MutationPlan<T>,
        result: Result<T, ApiError>,
    ) -> MutationOutcome<T> {
        let MutationPlan {
            key,
            on_commit,
            success,
            failure_message,
            reconcile,
            related,
            ..
        } = plan;

        match &result {
            Ok(value) => {
                pending.transition(MutationState::Committed);
                if let Some(hook) = on_commit
                    && let Some(updater) = hook(value)
                {
                    self.cache.update(key.clone(), updater).await;
                }
                if self.notify_success
                    && let Some(notification) = success
                {
                    self.notifier.notify(notification).await;
                }
            }
            Err(error) => {
                pending.transition(MutationState::RolledBack);
                let context = &mut pending.context;
                if context.rewritten {
                    self.cache
                        .restore(context.key.clone(), context.snapshot.take())
                        .await;
                }
                warn!(
                    key = %key,
                    status = error.status,
                    name = %error.name,
                    "mutation failed, rolled back: {}",
                    error.message
                );
                self.notifier
                    .notify(failure_notification(error, &failure_message))
                    .await;
            }
        }

        let state = pending.state;
        let should_reconcile = match reconcile {
            Reconcile::Always => true,
            Reconcile::OnSuccess => state == MutationState::Committed,
        };
        if should_reconcile {
            pending.transition(MutationState::Reconciling);
            self.cache.invalidate(&key).await;
            for related in &related {
                self.cache.invalidate(related).await;
            }
        }
        pending.transition(MutationState::Idle);

        MutationOutcome { state, result }
    }
}

fn failure_notification(error: &ApiError, fallback: &str) -> Notification {
    let title = if error.message.trim().is_empty() {
        "Error".to_string()
    } else {
        error.message.clone()
    };
    let description = error
        .info
        .clone()
        .filter(|info| !info.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    Notification::error(title, description)
}

/// Wraps a transform of an existing entry; absent entries stay absent.
pub fn map_entry<F>(f: F) -> impl FnOnce(Option<CachedValue>) -> Option<CachedValue> + Send + 'static
where
    F: FnOnce(CachedValue) -> CachedValue + Send + 'static,
{
    move |value| value.map(f)
}
