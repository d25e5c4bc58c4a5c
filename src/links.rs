//! Keeps `forumLinks` in step with the forum.
//!
//! A post is linked from exactly the library patterns its latest public,
//! published, main-forum title or body matches; an edit drops links to
//! patterns it no longer matches. Making a post private or deleting it
//! unlinks it everywhere. Other changes (moving it out of the main forum,
//! turning it back into a draft) leave existing links alone.

use crate::patterns::{match_all, ErrorPattern};
use crate::store::{DocumentStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Where a post lives: `forumData/{courseId}/forums/{forumId}/posts/{postId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostKey {
    pub course_id: String,
    pub forum_id: String,
    pub post_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("post key must look like course/forum/post, got `{0}`")]
pub struct PostKeyError(String);

impl FromStr for PostKey {
    type Err = PostKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [course, forum, post] if !course.is_empty() && !forum.is_empty() && !post.is_empty() => {
                Ok(PostKey {
                    course_id: course.to_string(),
                    forum_id: forum.to_string(),
                    post_id: post.to_string(),
                })
            }
            _ => Err(PostKeyError(s.to_string())),
        }
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.course_id, self.forum_id, self.post_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContents {
    #[serde(default)]
    pub text: String,
}

/// The fields of a forum post the index cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub contents: PostContents,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_draft: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostEvent {
    Updated {
        key: PostKey,
        before: Option<Post>,
        after: Post,
    },
    Deleted {
        key: PostKey,
        snapshot: Option<Post>,
    },
}

impl PostEvent {
    pub fn key(&self) -> &PostKey {
        match self {
            PostEvent::Updated { key, .. } | PostEvent::Deleted { key, .. } => key,
        }
    }
}

/// What an update does to the index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexAction {
    /// Remove the post from every entry.
    Unlink,
    /// Link the post from exactly these patterns, dropping any others.
    Link(Vec<&'static ErrorPattern>),
    /// Leave the index alone.
    Ignore,
}

/// Decide what an update to `post` at `key` means for the index.
pub fn plan_update(key: &PostKey, post: &Post, main_forum: &str) -> IndexAction {
    if post.is_private {
        return IndexAction::Unlink;
    }
    if key.forum_id != main_forum || post.is_draft {
        return IndexAction::Ignore;
    }
    IndexAction::Link(match_all(&post.contents.text, &post.title))
}

pub struct ForumLinkIndex {
    store: Arc<dyn DocumentStore>,
    main_forum: String,
}

impl ForumLinkIndex {
    pub fn new(store: Arc<dyn DocumentStore>, main_forum: impl Into<String>) -> Self {
        Self {
            store,
            main_forum: main_forum.into(),
        }
    }

    /// Apply one event. Store failures are logged and the event is
    /// dropped; the next qualifying event for the post repairs the index.
    pub async fn handle(&self, event: &PostEvent) {
        let result = match event {
            PostEvent::Updated { key, after, .. } => self.on_post_updated(key, after).await.map(|_| ()),
            PostEvent::Deleted { key, .. } => self.on_post_deleted(key).await.map(|_| ()),
        };
        if let Err(e) = result {
            warn!(post = %event.key(), "forum link update failed: {}", e);
        }
    }

    pub async fn on_post_updated(&self, key: &PostKey, after: &Post) -> Result<IndexAction, StoreError> {
        let action = plan_update(key, after, &self.main_forum);
        match &action {
            IndexAction::Unlink => {
                let removed = self.unlink(&key.post_id).await?;
                info!(post = %key, removed, "private post unlinked");
            }
            IndexAction::Link(patterns) => {
                let keys: Vec<String> = patterns.iter().map(|p| p.document_key()).collect();
                for pattern_key in &keys {
                    self.store.add_to_link_set(pattern_key, &key.post_id).await?;
                }
                let stale = self.unlink_except(&key.post_id, &keys).await?;
                info!(post = %key, patterns = keys.len(), stale, "post linked");
            }
            IndexAction::Ignore => debug!(post = %key, "post does not affect forum links"),
        }
        Ok(action)
    }

    /// Returns how many entries the post was removed from.
    pub async fn on_post_deleted(&self, key: &PostKey) -> Result<usize, StoreError> {
        let removed = self.unlink(&key.post_id).await?;
        info!(post = %key, removed, "deleted post unlinked");
        Ok(removed)
    }

    async fn unlink(&self, post_id: &str) -> Result<usize, StoreError> {
        self.unlink_except(post_id, &[]).await
    }

    /// Remove `post_id` from every entry whose key is not in `keep`.
    async fn unlink_except(&self, post_id: &str, keep: &[String]) -> Result<usize, StoreError> {
        let links = self.store.forum_links().await?;
        let mut removed = 0;
        for (key, entry) in &links {
            if keep.contains(key) || !entry.post_ids.iter().any(|id| id == post_id) {
                continue;
            }
            if self.store.remove_from_link_set(key, post_id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
