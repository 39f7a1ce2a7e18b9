pub mod comment_service;
pub mod community_service;
pub mod friend_service;
pub mod moderation_service;
pub mod optimistic_mutation;
pub mod post_service;
pub mod profile_service;
pub mod vote_service;

pub use comment_service::CommentService;
pub use community_service::CommunityService;
pub use friend_service::FriendService;
pub use moderation_service::ModerationService;
pub use optimistic_mutation::{
    MutationOutcome, MutationPlan, MutationState, OptimisticMutator, PendingMutationContext,
    Reconcile,
};
pub use post_service::PostService;
pub use profile_service::ProfileService;
pub use vote_service::VoteService;
