//! Client-side cache synchronizer for the GenZ Scholars forum.
//!
//! Mutations (votes, posts, comments, communities, friends, profiles and
//! moderation) are applied to a shared query cache speculatively, rolled
//! back when the backend rejects them and reconciled with a background
//! refresh once they settle.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::services::{MutationOutcome, MutationState, OptimisticMutator};
pub use shared::logging::init_logging;
pub use shared::{ApiError, AppConfig, AppError, Result};
pub use state::AppState;
