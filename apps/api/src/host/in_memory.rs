//! In-process content host and option store for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::host::{ContentHost, OptionStore};
use crate::models::{
    Comment, Identity, NewComment, Post, PostOrder, PostStatus, SiteInfo, content::ARTICLE_TYPE,
};
use crate::selection::SealedPostQuery;

#[derive(Default)]
struct Inner {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    identities: Vec<Identity>,
    options: HashMap<String, Value>,
    fail_inserts: bool,
}

#[derive(Default)]
pub struct InMemoryHost {
    inner: Mutex<Inner>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_identity(&self, id: i64, display_name: &str) {
        self.inner.lock().unwrap().identities.push(Identity {
            id,
            display_name: display_name.to_string(),
        });
    }

    pub fn remove_identity(&self, id: i64) {
        self.inner.lock().unwrap().identities.retain(|i| i.id != id);
    }

    /// Adds a published article, `age_days` old.
    pub fn add_post(&self, id: i64, title: &str, content: &str, age_days: i64) {
        self.inner.lock().unwrap().posts.push(Post {
            id,
            post_type: ARTICLE_TYPE.to_string(),
            status: PostStatus::Publish,
            title: title.to_string(),
            content: content.to_string(),
            author_id: 1,
            published_at: Utc::now() - Duration::days(age_days),
            categories: vec!["News".to_string()],
        });
    }

    pub fn set_post_status(&self, id: i64, status: PostStatus) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(post) = inner.posts.iter_mut().find(|p| p.id == id) {
            post.status = status;
        }
    }

    /// Adds an approved comment and returns its id.
    pub fn add_comment(
        &self,
        post_id: i64,
        author_id: Option<i64>,
        author_name: &str,
        content: &str,
    ) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.comments.len() as i64 + 1;
        let created_at = Utc::now() - Duration::minutes(1000 - id);
        inner.comments.push(Comment {
            id,
            post_id,
            author_id,
            author_name: author_name.to_string(),
            content: content.to_string(),
            approved: true,
            parent_id: 0,
            created_at,
        });
        id
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.inner.lock().unwrap().comments.clone()
    }

    pub fn fail_inserts(&self) {
        self.inner.lock().unwrap().fail_inserts = true;
    }
}

#[async_trait]
impl ContentHost for InMemoryHost {
    async fn get_post(&self, id: i64, status: Option<PostStatus>) -> anyhow::Result<Option<Post>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .posts
            .iter()
            .find(|p| p.id == id && status.map_or(true, |s| p.status == s))
            .cloned())
    }

    async fn query_posts(&self, query: &SealedPostQuery) -> anyhow::Result<Vec<Post>> {
        let query = query.query();
        let inner = self.inner.lock().unwrap();
        let mut posts: Vec<Post> = inner
            .posts
            .iter()
            .filter(|p| p.post_type == query.post_type && p.status == query.status)
            .filter(|p| query.published_after.map_or(true, |after| p.published_at >= after))
            .filter(|p| {
                query
                    .category
                    .as_ref()
                    .map_or(true, |c| p.categories.contains(c))
            })
            .filter(|p| !query.exclude.contains(&p.id))
            .cloned()
            .collect();

        match query.order {
            PostOrder::Newest | PostOrder::Random => {
                posts.sort_by(|a, b| b.published_at.cmp(&a.published_at))
            }
            PostOrder::Oldest => posts.sort_by(|a, b| a.published_at.cmp(&b.published_at)),
        }
        posts.truncate(query.limit);
        Ok(posts)
    }

    async fn commented_post_ids(&self, identity: i64) -> anyhow::Result<Vec<i64>> {
        let inner = self.inner.lock().unwrap();
        let mut ids: Vec<i64> = inner
            .comments
            .iter()
            .filter(|c| c.author_id == Some(identity))
            .map(|c| c.post_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn get_identity(&self, id: i64) -> anyhow::Result<Option<Identity>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.identities.iter().find(|i| i.id == id).cloned())
    }

    async fn get_comment(&self, id: i64) -> anyhow::Result<Option<Comment>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn recent_comments(&self, post_id: i64, limit: usize) -> anyhow::Result<Vec<Comment>> {
        let inner = self.inner.lock().unwrap();
        let mut comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.approved)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let skip = comments.len().saturating_sub(limit);
        Ok(comments.into_iter().skip(skip).collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_inserts {
            anyhow::bail!("comments table is read-only");
        }
        let id = inner.comments.len() as i64 + 1;
        inner.comments.push(Comment {
            id,
            post_id: comment.post_id,
            author_id: Some(comment.author.id),
            author_name: comment.author.display_name,
            content: comment.content,
            approved: comment.approved,
            parent_id: comment.parent_id,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn trash_post(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.posts.iter_mut().find(|p| p.id == id) {
            Some(post) => {
                post.status = PostStatus::Trash;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn site_info(&self) -> anyhow::Result<SiteInfo> {
        Ok(SiteInfo {
            name: "Test Site".to_string(),
            description: "Just another site".to_string(),
            url: "http://example.test".to_string(),
        })
    }
}

#[async_trait]
impl OptionStore for InMemoryHost {
    async fn get_option(&self, name: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.inner.lock().unwrap().options.get(name).cloned())
    }

    async fn set_option(&self, name: &str, value: Value) -> anyhow::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .options
            .insert(name.to_string(), value);
        Ok(())
    }

    async fn delete_option(&self, name: &str) -> anyhow::Result<()> {
        self.inner.lock().unwrap().options.remove(name);
        Ok(())
    }
}
