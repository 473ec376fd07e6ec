use chrono::{DateTime, Local, Utc};

use crate::feed::Feed;
use crate::post::Post;

pub fn render_feed(feed: &Feed) -> String {
    if feed.posts().is_empty() {
        return "No posts found. Be the first to post!\n".to_string();
    }

    let mut out = String::new();
    for post in feed.posts() {
        out.push_str(&render_post(post, feed.is_editing(&post.id)));
        out.push('\n');
    }
    out
}

pub fn render_post(post: &Post, editing: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!("[{}] {}\n", post.id, post.content));
    match post.image_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => out.push_str(&format!("    image: {url}\n")),
        _ => out.push_str("    image: (none)\n"),
    }
    out.push_str(&format!(
        "    posted by {} on {}\n",
        post.author,
        format_local(post.created_at)
    ));
    if let Some(modified) = post.modified_at.filter(|m| *m != post.created_at) {
        out.push_str(&format!("    edited {}\n", format_local(modified)));
    }
    if editing {
        out.push_str("    (currently editing)\n");
    }
    out
}

fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
