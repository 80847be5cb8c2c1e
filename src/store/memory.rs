use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Store;
use crate::error::{LoadError, LoadResult};
use crate::model::{MemberType, MemberTypeId, Post, Profile, Subscription, User};

/// An in-process [`Store`] holding its tables in vectors.
///
/// Besides serving rows it counts the queries it receives per method and can be told to fail,
/// which makes it convenient for exercising loaders.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    profiles: Vec<Profile>,
    posts: Vec<Post>,
    member_types: Vec<MemberType>,
    subscriptions: Vec<Subscription>,
    failure: Option<LoadError>,
    queries: HashMap<&'static str, usize>,
}

impl Tables {
    fn begin(&mut self, method: &'static str, keys: usize) -> LoadResult<()> {
        *self.queries.entry(method).or_default() += 1;
        tracing::debug!(method, keys, "memory store query");
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.lock().await.users.push(user);
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.tables.lock().await.profiles.push(profile);
    }

    pub async fn insert_post(&self, post: Post) {
        self.tables.lock().await.posts.push(post);
    }

    pub async fn insert_member_type(&self, member_type: MemberType) {
        self.tables.lock().await.member_types.push(member_type);
    }

    pub async fn subscribe(&self, subscriber_id: Uuid, author_id: Uuid) {
        self.tables.lock().await.subscriptions.push(Subscription { subscriber_id, author_id });
    }

    /// Makes every subsequent query fail with `failure`, or succeed again when `None`.
    pub async fn set_failure(&self, failure: Option<LoadError>) {
        self.tables.lock().await.failure = failure;
    }

    /// Number of queries received by `method` (e.g. `"users_by_ids"`), failed ones included.
    pub async fn query_count(&self, method: &str) -> usize {
        self.tables.lock().await.queries.get(method).copied().unwrap_or(0)
    }

    /// Number of queries received across all methods.
    pub async fn total_queries(&self) -> usize {
        self.tables.lock().await.queries.values().sum()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn users_by_ids(&self, ids: &[Uuid]) -> LoadResult<Vec<User>> {
        let mut tables = self.tables.lock().await;
        tables.begin("users_by_ids", ids.len())?;
        Ok(tables.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> LoadResult<Vec<Profile>> {
        let mut tables = self.tables.lock().await;
        tables.begin("profiles_by_ids", ids.len())?;
        Ok(tables.profiles.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
    }

    async fn posts_by_ids(&self, ids: &[Uuid]) -> LoadResult<Vec<Post>> {
        let mut tables = self.tables.lock().await;
        tables.begin("posts_by_ids", ids.len())?;
        Ok(tables.posts.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
    }

    async fn member_types_by_ids(&self, ids: &[MemberTypeId]) -> LoadResult<Vec<MemberType>> {
        let mut tables = self.tables.lock().await;
        tables.begin("member_types_by_ids", ids.len())?;
        Ok(tables.member_types.iter().filter(|m| ids.contains(&m.id)).cloned().collect())
    }

    async fn profiles_by_user_ids(&self, user_ids: &[Uuid]) -> LoadResult<Vec<Profile>> {
        let mut tables = self.tables.lock().await;
        tables.begin("profiles_by_user_ids", user_ids.len())?;
        Ok(tables.profiles.iter().filter(|p| user_ids.contains(&p.user_id)).cloned().collect())
    }

    async fn posts_by_author_ids(&self, author_ids: &[Uuid]) -> LoadResult<Vec<Post>> {
        let mut tables = self.tables.lock().await;
        tables.begin("posts_by_author_ids", author_ids.len())?;
        Ok(tables.posts.iter().filter(|p| author_ids.contains(&p.author_id)).cloned().collect())
    }

    async fn subscribed_authors(&self, subscriber_ids: &[Uuid]) -> LoadResult<Vec<(Uuid, User)>> {
        let mut tables = self.tables.lock().await;
        tables.begin("subscribed_authors", subscriber_ids.len())?;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| subscriber_ids.contains(&s.subscriber_id))
            .filter_map(|s| tables.user(s.author_id).map(|u| (s.subscriber_id, u.clone())))
            .collect())
    }

    async fn subscribers_of(&self, author_ids: &[Uuid]) -> LoadResult<Vec<(Uuid, User)>> {
        let mut tables = self.tables.lock().await;
        tables.begin("subscribers_of", author_ids.len())?;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| author_ids.contains(&s.author_id))
            .filter_map(|s| tables.user(s.subscriber_id).map(|u| (s.author_id, u.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failure_switch_counts_and_fails_queries() {
        let store = MemoryStore::new();
        store.set_failure(Some(LoadError::StorageUnavailable("down".to_owned()))).await;

        assert_eq!(
            store.users_by_ids(&[Uuid::new_v4()]).await,
            Err(LoadError::StorageUnavailable("down".to_owned()))
        );
        assert_eq!(store.query_count("users_by_ids").await, 1);

        store.set_failure(None).await;
        assert_eq!(store.users_by_ids(&[Uuid::new_v4()]).await, Ok(vec![]));
        assert_eq!(store.total_queries().await, 2);
    }

    #[tokio::test]
    async fn subscription_rows_are_tagged_with_the_queried_side() {
        let store = MemoryStore::new();
        let alice = User { id: Uuid::new_v4(), name: "alice".to_owned(), balance: 1.0 };
        let bob = User { id: Uuid::new_v4(), name: "bob".to_owned(), balance: 2.0 };
        store.insert_user(alice.clone()).await;
        store.insert_user(bob.clone()).await;
        store.subscribe(alice.id, bob.id).await;

        assert_eq!(store.subscribed_authors(&[alice.id]).await, Ok(vec![(alice.id, bob.clone())]));
        assert_eq!(store.subscribers_of(&[bob.id]).await, Ok(vec![(bob.id, alice)]));
    }
}
