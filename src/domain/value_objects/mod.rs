pub mod cache_key;
pub mod comment_id;
pub mod vote;

pub use cache_key::CacheKey;
pub use comment_id::{CommentId, LocalId};
pub use vote::{Votable, Vote, VoteTally, compute_vote_delta};
