use crate::links::{ForumLinkIndex, IndexAction, Post, PostContents, PostEvent, PostKey};
use crate::store::{DocumentStore, MemoryStore};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const SYNTAX_KEY: &str = "/SyntaxError: invalid syntax/";
const EOF_KEY: &str = "/EOFError: EOF when reading a line/";

fn key(forum: &str, post: &str) -> PostKey {
    PostKey {
        course_id: "cip3".to_string(),
        forum_id: forum.to_string(),
        post_id: post.to_string(),
    }
}

fn post(text: &str) -> Post {
    Post {
        title: "stuck".to_string(),
        contents: PostContents {
            text: text.to_string(),
        },
        ..Post::default()
    }
}

fn index(store: &MemoryStore) -> ForumLinkIndex {
    ForumLinkIndex::new(Arc::new(store.clone()), "main")
}

#[tokio::test]
async fn public_post_is_linked_from_every_matching_pattern() {
    let store = MemoryStore::new();
    let index = index(&store);

    let action = index
        .on_post_updated(
            &key("main", "p1"),
            &post("SyntaxError: invalid syntax, then EOFError: EOF when reading a line"),
        )
        .await
        .unwrap();

    assert!(matches!(action, IndexAction::Link(ref patterns) if patterns.len() == 2));
    let links = store.forum_links().await.unwrap();
    assert_eq!(links[SYNTAX_KEY].post_ids, vec!["p1"]);
    assert_eq!(links[EOF_KEY].post_ids, vec!["p1"]);
}

#[tokio::test]
async fn relinking_does_not_duplicate() {
    let store = MemoryStore::new();
    let index = index(&store);
    let p = post("SyntaxError: invalid syntax");

    index.on_post_updated(&key("main", "p1"), &p).await.unwrap();
    index.on_post_updated(&key("main", "p1"), &p).await.unwrap();

    assert_eq!(store.forum_links().await.unwrap()[SYNTAX_KEY].post_ids, vec!["p1"]);
}

#[tokio::test]
async fn editing_a_post_drops_patterns_it_no_longer_matches() {
    let store = MemoryStore::new();
    let index = index(&store);
    store.add_to_link_set(SYNTAX_KEY, "p2").await.unwrap();

    index
        .on_post_updated(&key("main", "p1"), &post("SyntaxError: invalid syntax"))
        .await
        .unwrap();
    index
        .on_post_updated(&key("main", "p1"), &post("EOFError: EOF when reading a line"))
        .await
        .unwrap();

    let links = store.forum_links().await.unwrap();
    assert_eq!(links[SYNTAX_KEY].post_ids, vec!["p2"]);
    assert_eq!(links[EOF_KEY].post_ids, vec!["p1"]);

    // An edit that matches nothing leaves the post unlinked.
    index
        .on_post_updated(&key("main", "p1"), &post("my code prints nothing"))
        .await
        .unwrap();
    let links = store.forum_links().await.unwrap();
    assert!(links[EOF_KEY].post_ids.is_empty());
    assert_eq!(links[SYNTAX_KEY].post_ids, vec!["p2"]);
}

#[tokio::test]
async fn going_private_unlinks_everywhere() {
    let store = MemoryStore::new();
    let index = index(&store);
    store.add_to_link_set(SYNTAX_KEY, "p1").await.unwrap();
    store.add_to_link_set(SYNTAX_KEY, "p2").await.unwrap();
    store.add_to_link_set(EOF_KEY, "p1").await.unwrap();

    let mut hidden = post("SyntaxError: invalid syntax");
    hidden.is_private = true;
    // Forum does not matter for private posts.
    let action = index.on_post_updated(&key("other", "p1"), &hidden).await.unwrap();

    assert_eq!(action, IndexAction::Unlink);
    let links = store.forum_links().await.unwrap();
    assert_eq!(links[SYNTAX_KEY].post_ids, vec!["p2"]);
    assert!(links[EOF_KEY].post_ids.is_empty());
}

#[tokio::test]
async fn drafts_and_other_forums_leave_links_alone() {
    let store = MemoryStore::new();
    let index = index(&store);
    store.add_to_link_set(SYNTAX_KEY, "p1").await.unwrap();

    let mut draft = post("EOFError: EOF when reading a line");
    draft.is_draft = true;
    index.on_post_updated(&key("main", "p1"), &draft).await.unwrap();
    index
        .on_post_updated(&key("announcements", "p1"), &post("EOFError: EOF when reading a line"))
        .await
        .unwrap();

    let links = store.forum_links().await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[SYNTAX_KEY].post_ids, vec!["p1"]);
}

#[tokio::test]
async fn deleting_removes_the_post_from_all_entries() {
    let store = MemoryStore::new();
    let index = index(&store);
    store.add_to_link_set(SYNTAX_KEY, "p1").await.unwrap();
    store.add_to_link_set(EOF_KEY, "p1").await.unwrap();
    store.add_to_link_set(EOF_KEY, "p3").await.unwrap();

    let removed = index.on_post_deleted(&key("main", "p1")).await.unwrap();

    assert_eq!(removed, 2);
    let links = store.forum_links().await.unwrap();
    assert!(links[SYNTAX_KEY].post_ids.is_empty());
    assert_eq!(links[EOF_KEY].post_ids, vec!["p3"]);
    assert_eq!(index.on_post_deleted(&key("main", "p1")).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_updates_keep_every_post() {
    let store = MemoryStore::new();
    let index = index(&store);
    let p = post("SyntaxError: invalid syntax");
    let (k1, k2, k3) = (key("main", "p1"), key("main", "p2"), key("main", "p3"));

    let (a, b, c) = tokio::join!(
        index.on_post_updated(&k1, &p),
        index.on_post_updated(&k2, &p),
        index.on_post_updated(&k3, &p),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let mut ids = store.forum_links().await.unwrap()[SYNTAX_KEY].post_ids.clone();
    ids.sort();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
}

#[tokio::test]
async fn events_are_dispatched_by_kind() {
    let store = MemoryStore::new();
    let index = index(&store);

    index
        .handle(&PostEvent::Updated {
            key: key("main", "p1"),
            before: None,
            after: post("SyntaxError: invalid syntax"),
        })
        .await;
    assert_eq!(store.forum_links().await.unwrap()[SYNTAX_KEY].post_ids, vec!["p1"]);

    index
        .handle(&PostEvent::Deleted {
            key: key("main", "p1"),
            snapshot: Some(post("SyntaxError: invalid syntax")),
        })
        .await;
    assert!(store.forum_links().await.unwrap()[SYNTAX_KEY].post_ids.is_empty());
}
