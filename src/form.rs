use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::post::{NewPost, Post, PostId, RawPost};

#[derive(Debug, Error)]
pub enum FormError {
    /// Local validation; nothing was sent over the network.
    #[error("post content cannot be empty")]
    EmptyContent,
    /// Double-submit guard; a previous submission has not come back yet.
    #[error("a submission is already in flight")]
    InFlight,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Draft editor for one existing post. Holds a snapshot of the record being
/// edited plus the two editable fields; the feed list is only touched by
/// whoever feeds the returned response into `Feed::apply_updated`.
pub struct EditForm {
    post: Post,
    content: String,
    image_url: String,
    saving: bool,
}

impl EditForm {
    pub fn new(post: &Post) -> Self {
        Self {
            content: post.content.clone(),
            image_url: post.image_url.clone().unwrap_or_default(),
            post: post.clone(),
            saving: false,
        }
    }

    pub fn id(&self) -> &PostId {
        &self.post.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn set_content(&mut self, value: impl Into<String>) {
        self.content = value.into();
    }

    pub fn set_image_url(&mut self, value: impl Into<String>) {
        self.image_url = value.into();
    }

    /// Validates locally, then PUTs the full record with the edited fields
    /// overlaid. Returns the server's representation for the caller to
    /// merge; on any failure the post stays in editing state so the user
    /// can retry or cancel.
    pub async fn submit(&mut self, api: &ApiClient) -> Result<RawPost, FormError> {
        if self.saving {
            return Err(FormError::InFlight);
        }
        if self.content.trim().is_empty() {
            return Err(FormError::EmptyContent);
        }

        let mut payload = self.post.to_raw();
        payload.content = Some(self.content.clone());
        // Always sent, even when blank: a blank draft clears the image and
        // the server must see that.
        let image = self.image_url.trim().to_string();
        payload.image_url = Some(image.clone());

        tracing::debug!(id = %self.post.id, "submitting update");
        self.saving = true;
        let guard = ResetOnDrop(&mut self.saving);
        let result = api.update(&self.post.id, &payload).await;
        drop(guard);

        let mut raw = result?;
        // A response that omits imageUrl falls back to what was submitted,
        // so a cleared image stays cleared after the merge.
        if raw.image_url.is_none() {
            raw.image_url = Some(image);
        }
        Ok(raw)
    }
}

/// Draft for a new post. Starts empty and clears itself after a successful
/// submission.
#[derive(Default)]
pub struct CreateForm {
    content: String,
    image_url: String,
    posting: bool,
}

impl CreateForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, value: impl Into<String>) {
        self.content = value.into();
    }

    pub fn set_image_url(&mut self, value: impl Into<String>) {
        self.image_url = value.into();
    }

    /// Same validation as the edit form; the response goes to
    /// `Feed::apply_created`.
    pub async fn submit(&mut self, api: &ApiClient) -> Result<RawPost, FormError> {
        if self.posting {
            return Err(FormError::InFlight);
        }
        if self.content.trim().is_empty() {
            return Err(FormError::EmptyContent);
        }

        let draft = NewPost {
            content: self.content.clone(),
            image_url: non_blank(&self.image_url),
        };

        tracing::debug!("submitting new post");
        self.posting = true;
        let guard = ResetOnDrop(&mut self.posting);
        let result = api.create(&draft).await;
        drop(guard);

        let raw = result?;
        self.content.clear();
        self.image_url.clear();
        Ok(raw)
    }
}

/// Clears the in-flight flag even when the submit future is dropped
/// mid-await (a caller-side timeout must not wedge the form).
struct ResetOnDrop<'a>(&'a mut bool);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
