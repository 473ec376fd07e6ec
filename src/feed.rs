use chrono::Utc;

use crate::api::{ApiClient, ApiError};
use crate::post::{Post, PostId, RawPost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
}

/// Blocking yes/no prompt, asked before a delete goes out. A seam so the
/// controller stays testable without a terminal.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined the prompt; nothing was sent.
    Declined,
    Deleted,
}

/// The authoritative in-memory feed. Forms and the session never touch the
/// list directly; every mutation goes through the methods here.
///
/// Editing state is a single nullable id rather than a per-post flag, so
/// "at most one post is being edited" holds by construction.
pub struct Feed {
    posts: Vec<Post>,
    editing: Option<PostId>,
    state: LoadState,
    last_load_error: Option<String>,
}

impl Feed {
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            editing: None,
            state: LoadState::Loading,
            last_load_error: None,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| &p.id == id)
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn last_load_error(&self) -> Option<&str> {
        self.last_load_error.as_deref()
    }

    pub fn is_editing(&self, id: &PostId) -> bool {
        self.editing.as_ref() == Some(id)
    }

    pub fn editing_id(&self) -> Option<&PostId> {
        self.editing.as_ref()
    }

    /// Fetches the whole collection and replaces the list wholesale.
    /// Failures do not propagate: they are logged and recorded, the
    /// previous list stays as-is, and the loading state still clears.
    pub async fn load_all(&mut self, api: &ApiClient) {
        self.state = LoadState::Loading;
        match api.list().await {
            Ok(raw_posts) => {
                let received_at = Utc::now();
                self.posts = raw_posts
                    .into_iter()
                    .map(|raw| Post::from_raw(raw, received_at))
                    .collect();
                self.editing = None;
                self.last_load_error = None;
                tracing::info!(count = self.posts.len(), "loaded posts");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load posts");
                self.last_load_error = Some(err.to_string());
            }
        }
        self.state = LoadState::Ready;
    }

    /// Normalizes a freshly created post and prepends it to the feed.
    pub fn apply_created(&mut self, raw: RawPost) {
        let post = Post::from_raw(raw, Utc::now());
        self.posts.insert(0, post);
    }

    /// Merges an update response into the matching entry and clears its
    /// editing state. An id no longer in the list (deleted locally while
    /// the response was in flight) is a silent no-op.
    pub fn apply_updated(&mut self, raw: RawPost) {
        let id = raw.id.clone();
        match self.posts.iter_mut().find(|p| p.id == id) {
            Some(post) => post.merge_raw(raw),
            None => {
                tracing::debug!(%id, "update response for unknown post; ignoring");
                return;
            }
        }
        if self.editing.as_ref() == Some(&id) {
            self.editing = None;
        }
    }

    /// Cancel semantics: toggling the current editor stops editing;
    /// toggling any other present post makes it the sole editor.
    pub fn toggle_editing(&mut self, id: &PostId) {
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        } else if self.posts.iter().any(|p| &p.id == id) {
            self.editing = Some(id.clone());
        }
    }

    /// Asks for confirmation BEFORE any network call. Declined is a silent
    /// no-op; a failed delete leaves the list unchanged.
    pub async fn delete_post(
        &mut self,
        api: &ApiClient,
        id: &PostId,
        confirmer: &dyn Confirm,
    ) -> Result<DeleteOutcome, ApiError> {
        let prompt = format!("Are you sure you want to delete post {id}?");
        if !confirmer.confirm(&prompt) {
            return Ok(DeleteOutcome::Declined);
        }

        api.delete(id).await?;

        self.posts.retain(|p| &p.id != id);
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        tracing::info!(%id, "deleted post");
        Ok(DeleteOutcome::Deleted)
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}
