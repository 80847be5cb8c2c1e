//! Per-request loader bundle.
//!
//! Every inbound request gets a fresh [`RequestContext`]; its loaders, and their caches, are
//! dropped together with it. Nothing here is global, so two requests never see each other's
//! cached rows.

use uuid::Uuid;

use crate::config::LoaderConfig;
use crate::loader::{GroupLoader, Loader};
use crate::loaders::{
    MemberTypeById, PostById, PostsByAuthorId, ProfileById, ProfileByUserId, StoreContext,
    SubscribedAuthors, Subscribers, UserById,
};
use crate::model::{MemberType, MemberTypeId, Post, Profile, User};

/// One loader per entity or relation type.
pub struct Loaders {
    pub user: Loader<Uuid, User>,
    pub profile: Loader<Uuid, Profile>,
    pub post: Loader<Uuid, Post>,
    pub member_type: Loader<MemberTypeId, MemberType>,
    pub profile_by_user: Loader<Uuid, Profile>,
    pub posts_by_author: GroupLoader<Uuid, Post>,
    /// Authors a user is subscribed to, keyed by the subscriber's id.
    pub user_subscribed_to: GroupLoader<Uuid, User>,
    /// Users subscribed to an author, keyed by the author's id.
    pub subscribed_to_user: GroupLoader<Uuid, User>,
}

impl Loaders {
    /// Spawns the loader workers. Must be called from within a tokio runtime.
    pub fn new(store: StoreContext, config: LoaderConfig) -> Self {
        Self {
            user: Loader::with_config(UserById, store.clone(), config),
            profile: Loader::with_config(ProfileById, store.clone(), config),
            post: Loader::with_config(PostById, store.clone(), config),
            member_type: Loader::with_config(MemberTypeById, store.clone(), config),
            profile_by_user: Loader::with_config(ProfileByUserId, store.clone(), config),
            posts_by_author: GroupLoader::with_config(PostsByAuthorId, store.clone(), config),
            user_subscribed_to: GroupLoader::with_config(SubscribedAuthors, store.clone(), config),
            subscribed_to_user: GroupLoader::with_config(Subscribers, store, config),
        }
    }

    fn close(&self) {
        self.user.close();
        self.profile.close();
        self.post.close();
        self.member_type.close();
        self.profile_by_user.close();
        self.posts_by_author.close();
        self.user_subscribed_to.close();
        self.subscribed_to_user.close();
    }
}

/// Everything a resolver needs for one request: the shared store and this request's loaders.
pub struct RequestContext {
    pub store: StoreContext,
    pub loaders: Loaders,
}

impl RequestContext {
    pub fn new(store: StoreContext) -> Self {
        Self::with_config(store, LoaderConfig::default())
    }

    pub fn with_config(store: StoreContext, config: LoaderConfig) -> Self {
        tracing::debug!(?config, "building request loaders");
        Self { loaders: Loaders::new(store.clone(), config), store }
    }

    /// Ends the request. Loaders still referenced elsewhere fail every call with
    /// [`crate::LoadError::Closed`] instead of serving this request's cache.
    pub fn teardown(&self) {
        tracing::debug!("tearing down request loaders");
        self.loaders.close();
    }
}
