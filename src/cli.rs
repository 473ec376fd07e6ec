use clap::{Parser, Subcommand};
use url::Url;

use crate::post::PostId;

pub const DEFAULT_BASE_URL: &str = "https://post-api-tagm.onrender.com/api/facebook/posts";

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Base URL of the posts API.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// HTTP User-Agent for API requests.
    #[arg(long, default_value = "postfeed/0.1")]
    pub user_agent: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch and print the feed.
    List,
    /// Create a new post.
    Create {
        /// Post content (must not be empty).
        #[arg(long)]
        content: String,

        /// Optional image URL.
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Edit an existing post.
    Edit {
        /// Identifier of the post to edit.
        id: PostId,

        /// Replacement content.
        #[arg(long)]
        content: Option<String>,

        /// Replacement image URL (pass an empty string to clear it).
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Delete a post (asks for confirmation unless --yes is given).
    Delete {
        /// Identifier of the post to delete.
        id: PostId,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Interactive feed session.
    Session,
}
