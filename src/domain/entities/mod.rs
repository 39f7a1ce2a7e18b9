pub mod cached_value;
pub mod comment;
pub mod community;
pub mod post;
pub mod user;

pub use cached_value::CachedValue;
pub use comment::Comment;
pub use community::{Community, CommunityDraft, CommunityUpdate};
pub use post::{Post, PostDraft};
pub use user::UserSummary;
