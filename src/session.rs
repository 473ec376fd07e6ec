use std::io::{self, Write as _};

use crate::api::ApiClient;
use crate::feed::{Confirm, DeleteOutcome, Feed};
use crate::form::{CreateForm, EditForm};
use crate::post::PostId;
use crate::render;

/// Prompts on the terminal and reads a y/n answer. Anything but an explicit
/// yes declines.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Non-interactive confirmation, used by `delete --yes`.
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Line-oriented loop over one feed. Commands run one at a time, so there
/// is never more than one request in flight.
pub async fn run_session(api: &ApiClient) -> anyhow::Result<()> {
    let mut feed = Feed::new();
    println!("Loading posts from {} ...", api.base_url());
    feed.load_all(api).await;
    if let Some(err) = feed.last_load_error() {
        eprintln!("warning: {err}; starting with an empty feed");
    }
    print!("{}", render::render_feed(&feed));
    print_help();

    let stdin = io::stdin();
    let mut edit: Option<EditForm> = None;

    loop {
        match edit.as_ref() {
            Some(form) => print!("editing {}> ", form.id()),
            None => print!("> "),
        }
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (cmd, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        match cmd {
            "list" => print!("{}", render::render_feed(&feed)),
            "reload" => {
                feed.load_all(api).await;
                match feed.last_load_error() {
                    Some(err) => eprintln!("reload failed: {err}; keeping the current feed"),
                    None => print!("{}", render::render_feed(&feed)),
                }
                let stale = edit.as_ref().is_some_and(|form| !feed.is_editing(form.id()));
                if stale {
                    edit = None;
                }
            }
            "post" => {
                if rest.is_empty() {
                    println!("usage: post <content>");
                    continue;
                }
                let mut form = CreateForm::new();
                form.set_content(rest);
                print!("image url (blank for none): ");
                io::stdout().flush()?;
                let mut image = String::new();
                stdin.read_line(&mut image)?;
                form.set_image_url(image.trim());

                match form.submit(api).await {
                    Ok(raw) => {
                        feed.apply_created(raw);
                        println!("Posted.");
                    }
                    Err(err) => eprintln!("failed to create post: {err}"),
                }
            }
            "edit" => {
                if rest.is_empty() {
                    println!("usage: edit <id>");
                    continue;
                }
                let id = PostId::from(rest);
                let Some(post) = feed.get(&id).cloned() else {
                    println!("no post with id {id}");
                    continue;
                };
                feed.toggle_editing(&id);
                if feed.is_editing(&id) {
                    edit = Some(EditForm::new(&post));
                    println!("editing post {id}; use `set`, then `save` or `cancel`");
                } else {
                    edit = None;
                    println!("stopped editing post {id}");
                }
            }
            "set" => {
                let Some(form) = edit.as_mut() else {
                    println!("no post is being edited");
                    continue;
                };
                match rest.split_once(' ') {
                    Some(("content", value)) => form.set_content(value.trim()),
                    Some(("image", value)) => form.set_image_url(value.trim()),
                    _ => println!("usage: set content <text> | set image <url>"),
                }
            }
            "save" => {
                let Some(mut form) = edit.take() else {
                    println!("no post is being edited");
                    continue;
                };
                match form.submit(api).await {
                    Ok(raw) => {
                        feed.apply_updated(raw);
                        println!("Saved.");
                    }
                    Err(err) => {
                        eprintln!("failed to update post: {err}");
                        edit = Some(form);
                    }
                }
            }
            "cancel" => match edit.take() {
                Some(form) => {
                    feed.toggle_editing(form.id());
                    println!("edit cancelled");
                }
                None => println!("no post is being edited"),
            },
            "delete" => {
                if rest.is_empty() {
                    println!("usage: delete <id>");
                    continue;
                }
                let id = PostId::from(rest);
                match feed.delete_post(api, &id, &StdinConfirm).await {
                    Ok(DeleteOutcome::Deleted) => {
                        if edit.as_ref().is_some_and(|form| form.id() == &id) {
                            edit = None;
                        }
                        println!("Post {id} deleted successfully.");
                    }
                    Ok(DeleteOutcome::Declined) => {}
                    Err(err) => eprintln!("failed to delete post: {err}"),
                }
            }
            "help" => print_help(),
            "quit" | "exit" => break,
            _ => println!("unknown command {cmd:?}; try `help`"),
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        "commands: list | post <content> | edit <id> | set content <text> | set image <url> \
         | save | cancel | delete <id> | reload | help | quit"
    );
}
