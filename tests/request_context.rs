use std::sync::Arc;

use futures::future::join_all;
use memberloader::model::{MemberType, MemberTypeId, Post, Profile, User};
use memberloader::store::MemoryStore;
use memberloader::{LoadError, LoaderConfig, RequestContext};
use uuid::Uuid;

fn user(name: &str) -> User {
    User { id: Uuid::new_v4(), name: name.to_owned(), balance: 100.0 }
}

fn post(author: &User, title: &str) -> Post {
    Post {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        content: format!("{title} body"),
        author_id: author.id,
    }
}

fn profile(user: &User, member_type_id: MemberTypeId) -> Profile {
    Profile { id: Uuid::new_v4(), is_male: true, year_of_birth: 1990, user_id: user.id, member_type_id }
}

struct Fixture {
    store: Arc<MemoryStore>,
    alice: User,
    bob: User,
    carol: User,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let (alice, bob, carol) = (user("alice"), user("bob"), user("carol"));
    for u in [&alice, &bob, &carol] {
        store.insert_user(u.clone()).await;
    }
    store
        .insert_member_type(MemberType {
            id: MemberTypeId::Basic,
            discount: 2.3,
            posts_limit_per_month: 20,
        })
        .await;
    store
        .insert_member_type(MemberType {
            id: MemberTypeId::Business,
            discount: 7.7,
            posts_limit_per_month: 100,
        })
        .await;
    store.insert_profile(profile(&alice, MemberTypeId::Basic)).await;
    store.insert_profile(profile(&bob, MemberTypeId::Business)).await;
    store.insert_post(post(&alice, "first")).await;
    store.insert_post(post(&bob, "hello")).await;
    store.insert_post(post(&alice, "second")).await;
    store.subscribe(alice.id, bob.id).await;
    store.subscribe(carol.id, bob.id).await;
    store.subscribe(bob.id, alice.id).await;
    Fixture { store, alice, bob, carol }
}

#[tokio::test]
async fn nested_fields_issue_one_query_per_relation() {
    let fx = fixture().await;
    let ctx = RequestContext::new(fx.store.clone());
    let ids = vec![fx.alice.id, fx.bob.id, fx.carol.id];

    // users { profile { memberType } posts }
    let resolved = join_all(ids.iter().map(|id| {
        let loaders = &ctx.loaders;
        async move {
            let (profile, posts) = futures::join!(
                async {
                    let profile = loaders.profile_by_user.load(*id).await?;
                    let member_type = match &profile {
                        Some(p) => loaders.member_type.load(p.member_type_id).await?,
                        None => None,
                    };
                    Ok::<_, LoadError>((profile, member_type))
                },
                loaders.posts_by_author.load(*id),
            );
            let (profile, member_type) = profile?;
            Ok::<_, LoadError>((profile, member_type, posts?))
        }
    }))
    .await;

    let resolved = resolved.into_iter().collect::<Result<Vec<_>, _>>().unwrap();
    let titles = |posts: &Vec<Post>| posts.iter().map(|p| p.title.clone()).collect::<Vec<_>>();

    assert_eq!(resolved[0].1.as_ref().map(|m| m.id), Some(MemberTypeId::Basic));
    assert_eq!(titles(&resolved[0].2), vec!["first", "second"]);
    assert_eq!(resolved[1].1.as_ref().map(|m| m.id), Some(MemberTypeId::Business));
    assert_eq!(titles(&resolved[1].2), vec!["hello"]);
    assert_eq!(resolved[2].0, None);
    assert_eq!(resolved[2].1, None);
    assert!(resolved[2].2.is_empty());

    assert_eq!(fx.store.query_count("profiles_by_user_ids").await, 1);
    assert_eq!(fx.store.query_count("member_types_by_ids").await, 1);
    assert_eq!(fx.store.query_count("posts_by_author_ids").await, 1);
}

#[tokio::test]
async fn subscription_loaders_follow_both_directions() {
    let fx = fixture().await;
    let ctx = RequestContext::new(fx.store.clone());
    let loaders = &ctx.loaders;

    let (followed, followers, lonely) = futures::join!(
        loaders.user_subscribed_to.load(fx.carol.id),
        loaders.subscribed_to_user.load(fx.bob.id),
        loaders.subscribed_to_user.load(fx.carol.id),
    );

    assert_eq!(followed, Ok(vec![fx.bob.clone()]));
    let mut names = followers.unwrap().into_iter().map(|u| u.name).collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["alice", "carol"]);
    assert_eq!(lonely, Ok(vec![]));
    assert_eq!(fx.store.query_count("subscribers_of").await, 1);
}

#[tokio::test]
async fn entity_loaders_resolve_by_id() {
    let fx = fixture().await;
    let ctx = RequestContext::new(fx.store.clone());
    let posts = ctx.loaders.posts_by_author.load(fx.bob.id).await.unwrap();
    let hello = posts[0].clone();
    let profile = ctx.loaders.profile_by_user.load(fx.alice.id).await.unwrap().unwrap();

    assert_eq!(ctx.loaders.post.load(hello.id).await, Ok(Some(hello)));
    assert_eq!(ctx.loaders.profile.load(profile.id).await, Ok(Some(profile)));
    assert_eq!(ctx.loaders.user.load(fx.carol.id).await, Ok(Some(fx.carol.clone())));
    assert_eq!(ctx.loaders.user.load(Uuid::new_v4()).await, Ok(None));
}

#[tokio::test]
async fn request_contexts_do_not_share_caches() {
    let fx = fixture().await;
    let first = RequestContext::new(fx.store.clone());
    let second = RequestContext::new(fx.store.clone());

    assert_eq!(first.loaders.user.load(fx.alice.id).await, Ok(Some(fx.alice.clone())));
    assert_eq!(first.loaders.user.load(fx.alice.id).await, Ok(Some(fx.alice.clone())));
    assert_eq!(fx.store.query_count("users_by_ids").await, 1);

    assert_eq!(second.loaders.user.load(fx.alice.id).await, Ok(Some(fx.alice.clone())));
    assert_eq!(fx.store.query_count("users_by_ids").await, 2);
}

#[tokio::test]
async fn storage_failure_reaches_every_caller_of_the_batch() {
    let fx = fixture().await;
    let ctx = RequestContext::new(fx.store.clone());
    let down = LoadError::StorageUnavailable("connection refused".to_owned());
    fx.store.set_failure(Some(down.clone())).await;

    let (a, b) = futures::join!(ctx.loaders.user.load(fx.alice.id), ctx.loaders.user.load(fx.bob.id));
    assert_eq!(a, Err(down.clone()));
    assert_eq!(b, Err(down));

    fx.store.set_failure(None).await;
    assert_eq!(ctx.loaders.user.load(fx.alice.id).await, Ok(Some(fx.alice.clone())));
}

#[tokio::test]
async fn loads_after_teardown_fail_fast() {
    let fx = fixture().await;
    let ctx = Arc::new(RequestContext::new(fx.store.clone()));
    assert!(ctx.loaders.user.load(fx.alice.id).await.is_ok());

    let held = ctx.clone();
    ctx.teardown();

    assert_eq!(held.loaders.user.load(fx.alice.id).await, Err(LoadError::Closed));
    assert_eq!(held.loaders.posts_by_author.load(fx.alice.id).await, Err(LoadError::Closed));
    assert_eq!(fx.store.query_count("posts_by_author_ids").await, 0);
}

#[tokio::test]
async fn batch_size_limit_applies_to_every_loader() {
    let fx = fixture().await;
    let ctx = RequestContext::with_config(fx.store.clone(), LoaderConfig::default().max_batch_size(1));

    let users = ctx.loaders.user.load_many(vec![fx.alice.id, fx.bob.id]).await.unwrap();
    assert_eq!(users, vec![Some(fx.alice.clone()), Some(fx.bob.clone())]);
    assert_eq!(fx.store.query_count("users_by_ids").await, 2);
}
