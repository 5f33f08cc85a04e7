use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::markup::Markup;

/// One discussion topic with its posts in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Stable identifier derived from the source URL.
    pub id: String,
    pub title: String,
    pub source_url: Url,
    #[serde(default)]
    pub meta: ThreadMeta,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMeta {
    /// Breadcrumb trail below the forum root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    /// Number of pages the thread was fetched from.
    #[serde(default)]
    pub total_pages: u32,
    /// Author of the opening post, when the page names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter: Option<String>,
}

/// A single message within a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub body: Markup,
    /// Id of the post this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Zero-based position in the whole thread.
    pub ordinal: u32,
    /// One-based page the post was found on.
    pub page: u32,
    #[serde(default)]
    pub likes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted: Option<Markup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_joined: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_post_count: Option<u32>,
    #[serde(default)]
    pub is_topic_starter: bool,
}

impl Post {
    /// Minimal post with every optional field empty.
    pub fn new(id: impl Into<String>, author: impl Into<String>, body: Markup) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            author_id: None,
            timestamp: None,
            body,
            parent: None,
            ordinal: 0,
            page: 1,
            likes: 0,
            quoted: None,
            signature: None,
            author_profile: None,
            author_joined: None,
            author_post_count: None,
            is_topic_starter: false,
        }
    }
}

impl Thread {
    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// Number of distinct author names.
    pub fn unique_authors(&self) -> usize {
        let mut names: Vec<&str> = self.posts.iter().map(|p| p.author.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}
