use std::sync::Arc;

use memberloader::model::{Post, User};
use memberloader::store::MemoryStore;
use memberloader::RequestContext;
use uuid::Uuid;

// Resolves `users { posts }` for two users through one request context. Both `posts` lookups
// share a single storage query.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let store = Arc::new(MemoryStore::new());
    let hal = User { id: Uuid::new_v4(), name: "hal".to_owned(), balance: 9000.0 };
    let dave = User { id: Uuid::new_v4(), name: "dave".to_owned(), balance: 1.0 };
    store.insert_user(hal.clone()).await;
    store.insert_user(dave.clone()).await;
    store
        .insert_post(Post {
            id: Uuid::new_v4(),
            title: "a space odyssey".to_owned(),
            content: "open the pod bay doors".to_owned(),
            author_id: hal.id,
        })
        .await;

    let ctx = RequestContext::new(store.clone());
    let (hal_posts, dave_posts) = futures::join!(
        ctx.loaders.posts_by_author.load(hal.id),
        ctx.loaders.posts_by_author.load(dave.id),
    );

    assert_eq!(hal_posts.map(|posts| posts.len()), Ok(1));
    assert_eq!(dave_posts, Ok(vec![]));
    assert_eq!(store.query_count("posts_by_author_ids").await, 1);
    assert_eq!(ctx.loaders.user.load(Uuid::new_v4()).await, Ok(None));
}
