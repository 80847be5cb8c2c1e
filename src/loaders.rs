//! Batch functions for every relation the API resolves.
//!
//! Single-entity batch functions return `(key, row)` pairs; the loader turns keys storage did not
//! return into `None`. Grouping batch functions return rows tagged with the foreign key they were
//! matched on; the loader turns keys without rows into an empty list.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::batch_function::{BatchFunction, GroupedBatchFunction};
use crate::error::LoadResult;
use crate::model::{MemberType, MemberTypeId, Post, Profile, User};
use crate::store::Store;

/// Context shared by every batch function: the storage handle.
pub type StoreContext = Arc<dyn Store>;

pub struct UserById;

#[async_trait]
impl BatchFunction<Uuid, User> for UserById {
    type Context = StoreContext;

    async fn load(keys: &[Uuid], store: &StoreContext) -> LoadResult<Vec<(Uuid, User)>> {
        let users = store.users_by_ids(keys).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}

pub struct ProfileById;

#[async_trait]
impl BatchFunction<Uuid, Profile> for ProfileById {
    type Context = StoreContext;

    async fn load(keys: &[Uuid], store: &StoreContext) -> LoadResult<Vec<(Uuid, Profile)>> {
        let profiles = store.profiles_by_ids(keys).await?;
        Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
    }
}

pub struct PostById;

#[async_trait]
impl BatchFunction<Uuid, Post> for PostById {
    type Context = StoreContext;

    async fn load(keys: &[Uuid], store: &StoreContext) -> LoadResult<Vec<(Uuid, Post)>> {
        let posts = store.posts_by_ids(keys).await?;
        Ok(posts.into_iter().map(|p| (p.id, p)).collect())
    }
}

pub struct MemberTypeById;

#[async_trait]
impl BatchFunction<MemberTypeId, MemberType> for MemberTypeById {
    type Context = StoreContext;

    async fn load(
        keys: &[MemberTypeId],
        store: &StoreContext,
    ) -> LoadResult<Vec<(MemberTypeId, MemberType)>> {
        let member_types = store.member_types_by_ids(keys).await?;
        Ok(member_types.into_iter().map(|m| (m.id, m)).collect())
    }
}

/// Keyed by user id; a user without a profile resolves to `None`.
pub struct ProfileByUserId;

#[async_trait]
impl BatchFunction<Uuid, Profile> for ProfileByUserId {
    type Context = StoreContext;

    async fn load(keys: &[Uuid], store: &StoreContext) -> LoadResult<Vec<(Uuid, Profile)>> {
        let profiles = store.profiles_by_user_ids(keys).await?;
        Ok(profiles.into_iter().map(|p| (p.user_id, p)).collect())
    }
}

pub struct PostsByAuthorId;

#[async_trait]
impl GroupedBatchFunction<Uuid, Post> for PostsByAuthorId {
    type Context = StoreContext;

    async fn load(keys: &[Uuid], store: &StoreContext) -> LoadResult<Vec<(Uuid, Post)>> {
        let posts = store.posts_by_author_ids(keys).await?;
        Ok(posts.into_iter().map(|p| (p.author_id, p)).collect())
    }
}

/// Keyed by subscriber id; yields the authors that user follows.
pub struct SubscribedAuthors;

#[async_trait]
impl GroupedBatchFunction<Uuid, User> for SubscribedAuthors {
    type Context = StoreContext;

    async fn load(keys: &[Uuid], store: &StoreContext) -> LoadResult<Vec<(Uuid, User)>> {
        store.subscribed_authors(keys).await
    }
}

/// Keyed by author id; yields the users following that author.
pub struct Subscribers;

#[async_trait]
impl GroupedBatchFunction<Uuid, User> for Subscribers {
    type Context = StoreContext;

    async fn load(keys: &[Uuid], store: &StoreContext) -> LoadResult<Vec<(Uuid, User)>> {
        store.subscribers_of(keys).await
    }
}
