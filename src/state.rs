use crate::application::ports::notifier::Notifier;
use crate::application::ports::query_loader::QueryLoader;
use crate::application::ports::scholars_api::ScholarsApi;
use crate::application::services::{
    CommentService, CommunityService, FriendService, ModerationService, OptimisticMutator,
    PostService, ProfileService, VoteService,
};
use crate::infrastructure::cache::MemoryQueryCache;
use crate::infrastructure::http::ScholarsHttpClient;
use crate::infrastructure::notification::TracingNotifier;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;

/// Shared client state: one cache, one orchestrator and the feature services
/// built on top of them.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<MemoryQueryCache>,
    pub mutator: Arc<OptimisticMutator>,
    pub votes: Arc<VoteService>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub communities: Arc<CommunityService>,
    pub friends: Arc<FriendService>,
    pub profiles: Arc<ProfileService>,
    pub moderation: Arc<ModerationService>,
}

impl AppState {
    /// Wires the HTTP backend and logs notifications through `tracing`.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;
        let client = Arc::new(ScholarsHttpClient::new(&config.api)?);
        Ok(Self::with_ports(
            config,
            client.clone(),
            client,
            Arc::new(TracingNotifier),
        ))
    }

    /// Builds the state around explicit ports; used by front ends that bring
    /// their own notifier and by tests.
    pub fn with_ports(
        config: AppConfig,
        api: Arc<dyn ScholarsApi>,
        loader: Arc<dyn QueryLoader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cache = Arc::new(MemoryQueryCache::new(loader, config.cache.stale_time));
        let mutator = Arc::new(
            OptimisticMutator::new(cache.clone(), notifier)
                .with_success_notifications(config.cache.notify_success),
        );

        Self {
            votes: Arc::new(VoteService::new(Arc::clone(&mutator), Arc::clone(&api))),
            posts: Arc::new(PostService::new(Arc::clone(&mutator), Arc::clone(&api))),
            comments: Arc::new(CommentService::new(Arc::clone(&mutator), Arc::clone(&api))),
            communities: Arc::new(CommunityService::new(Arc::clone(&mutator), Arc::clone(&api))),
            friends: Arc::new(FriendService::new(Arc::clone(&mutator), Arc::clone(&api))),
            profiles: Arc::new(ProfileService::new(Arc::clone(&mutator), Arc::clone(&api))),
            moderation: Arc::new(ModerationService::new(Arc::clone(&mutator), api)),
            config: Arc::new(config),
            cache,
            mutator,
        }
    }
}
