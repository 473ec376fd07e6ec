use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned post identifier. Opaque to the client; some backends use
/// numeric ids, some use strings, so both round-trip as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Number(u64),
    Text(String),
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Number(n) => write!(f, "{n}"),
            PostId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(n) => PostId::Number(n),
            Err(_) => PostId::Text(s.to_string()),
        }
    }
}

impl FromStr for PostId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// A post as the server sends it. Everything except the id is optional on
/// the wire; normalization fills the gaps client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    pub id: PostId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date_time: Option<DateTime<Utc>>,
}

/// Body of a create request. The server assigns id, author and timestamps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A normalized post held in the client feed. Every record has a resolved
/// creation timestamp: when the server omits one, the local receipt time
/// stands in (display fallback only, never sent back).
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub content: String,
    pub image_url: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn from_raw(raw: RawPost, received_at: DateTime<Utc>) -> Self {
        Self {
            id: raw.id,
            content: raw.content.unwrap_or_default(),
            image_url: raw.image_url.filter(|url| !url.trim().is_empty()),
            author: raw.author.unwrap_or_default(),
            created_at: raw.created_date_time.unwrap_or(received_at),
            modified_at: raw.modified_date_time,
        }
    }

    /// Overlays the fields the server returned; fields the response omits
    /// keep their locally known values. A blank `imageUrl` is an explicit
    /// clear, not an omission.
    pub fn merge_raw(&mut self, raw: RawPost) {
        if let Some(content) = raw.content {
            self.content = content;
        }
        if let Some(image_url) = raw.image_url {
            self.image_url = if image_url.trim().is_empty() {
                None
            } else {
                Some(image_url)
            };
        }
        if let Some(author) = raw.author {
            self.author = author;
        }
        if let Some(created) = raw.created_date_time {
            self.created_at = created;
        }
        if let Some(modified) = raw.modified_date_time {
            self.modified_at = Some(modified);
        }
    }

    /// Full wire representation, used as the PUT body so the server sees
    /// every field it originally sent, with the edited ones changed.
    pub fn to_raw(&self) -> RawPost {
        RawPost {
            id: self.id.clone(),
            content: Some(self.content.clone()),
            image_url: self.image_url.clone(),
            author: if self.author.is_empty() {
                None
            } else {
                Some(self.author.clone())
            },
            created_date_time: Some(self.created_at),
            modified_date_time: self.modified_at,
        }
    }

    /// True only when the modification timestamp exists and differs from
    /// the creation timestamp.
    pub fn was_edited(&self) -> bool {
        self.modified_at.is_some_and(|m| m != self.created_at)
    }
}
