mod api;
mod cli;
mod feed;
mod form;
mod post;
mod render;
mod session;

use std::time::Duration;

use anyhow::Context as _;
use chrono::Utc;

pub use api::{ApiClient, ApiError};
pub use cli::{Args, Command, DEFAULT_BASE_URL};
pub use feed::{Confirm, DeleteOutcome, Feed, LoadState};
pub use form::{CreateForm, EditForm, FormError};
pub use post::{NewPost, Post, PostId, RawPost};
pub use render::{render_feed, render_post};
pub use session::{AlwaysConfirm, StdinConfirm};

pub async fn run(args: Args) -> anyhow::Result<()> {
    let api = ApiClient::new(
        args.base_url.clone(),
        &args.user_agent,
        Duration::from_secs(args.timeout_secs),
    )
    .context("build api client")?;

    match args.command {
        Command::List => {
            let mut feed = Feed::new();
            feed.load_all(&api).await;
            if let Some(err) = feed.last_load_error() {
                anyhow::bail!("failed to load posts: {err}");
            }
            print!("{}", render::render_feed(&feed));
            Ok(())
        }
        Command::Create { content, image_url } => {
            let mut form = CreateForm::new();
            form.set_content(content);
            if let Some(url) = image_url {
                form.set_image_url(url);
            }
            let raw = form.submit(&api).await?;
            let post = Post::from_raw(raw, Utc::now());
            println!("Created post {}", post.id);
            print!("{}", render::render_post(&post, false));
            Ok(())
        }
        Command::Edit {
            id,
            content,
            image_url,
        } => {
            let mut feed = Feed::new();
            feed.load_all(&api).await;
            if let Some(err) = feed.last_load_error() {
                anyhow::bail!("failed to load posts: {err}");
            }
            let post = feed
                .get(&id)
                .cloned()
                .with_context(|| format!("no post with id {id}"))?;
            feed.toggle_editing(&id);

            let mut form = EditForm::new(&post);
            if let Some(content) = content {
                form.set_content(content);
            }
            if let Some(url) = image_url {
                form.set_image_url(url);
            }
            let raw = form.submit(&api).await?;
            feed.apply_updated(raw);

            if let Some(updated) = feed.get(&id) {
                println!("Updated post {id}");
                print!("{}", render::render_post(updated, false));
            }
            Ok(())
        }
        Command::Delete { id, yes } => {
            let mut feed = Feed::new();
            feed.load_all(&api).await;
            if let Some(err) = feed.last_load_error() {
                anyhow::bail!("failed to load posts: {err}");
            }
            let confirmer: &dyn Confirm = if yes { &AlwaysConfirm } else { &StdinConfirm };
            match feed.delete_post(&api, &id, confirmer).await? {
                DeleteOutcome::Deleted => println!("Post {id} deleted successfully."),
                DeleteOutcome::Declined => println!("Delete cancelled."),
            }
            Ok(())
        }
        Command::Session => session::run_session(&api).await,
    }
}
