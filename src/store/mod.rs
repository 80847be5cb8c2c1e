//! Batch reads against the relational store.
//!
//! Every method takes the full key set of one batch and returns the matching rows in whatever
//! order the backend produces them. Keys with no rows are simply absent from the output. The
//! loaders take care of ordering and of filling the gaps.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::LoadResult;
use crate::model::{MemberType, MemberTypeId, Post, Profile, User};

/// Read-only batch queries used by the loaders.
///
/// Implementations must be side-effect free; a failed call may be issued again for the same keys.
/// One store is shared by every loader of every request, typically as an `Arc<dyn Store>`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn users_by_ids(&self, ids: &[Uuid]) -> LoadResult<Vec<User>>;

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> LoadResult<Vec<Profile>>;

    async fn posts_by_ids(&self, ids: &[Uuid]) -> LoadResult<Vec<Post>>;

    async fn member_types_by_ids(&self, ids: &[MemberTypeId]) -> LoadResult<Vec<MemberType>>;

    /// Profiles whose `user_id` is one of `user_ids`. A user has at most one profile.
    async fn profiles_by_user_ids(&self, user_ids: &[Uuid]) -> LoadResult<Vec<Profile>>;

    /// Posts whose `author_id` is one of `author_ids`.
    async fn posts_by_author_ids(&self, author_ids: &[Uuid]) -> LoadResult<Vec<Post>>;

    /// Authors followed by each of `subscriber_ids`, as `(subscriber_id, author)` rows.
    async fn subscribed_authors(&self, subscriber_ids: &[Uuid]) -> LoadResult<Vec<(Uuid, User)>>;

    /// Followers of each of `author_ids`, as `(author_id, subscriber)` rows.
    async fn subscribers_of(&self, author_ids: &[Uuid]) -> LoadResult<Vec<(Uuid, User)>>;
}
