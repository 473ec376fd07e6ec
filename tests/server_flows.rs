use std::time::Duration;

use chrono::Utc;
use httpmock::Method::{DELETE, GET, POST, PUT};
use httpmock::MockServer;
use serde_json::json;
use url::Url;

use postfeed::{
    ApiClient, ApiError, Confirm, CreateForm, DeleteOutcome, EditForm, Feed, FormError, LoadState,
    PostId,
};

fn client(server: &MockServer) -> ApiClient {
    let base = Url::parse(&server.url("/posts")).unwrap();
    ApiClient::new(base, "postfeed-test/0.1", Duration::from_secs(5)).unwrap()
}

struct Decline;

impl Confirm for Decline {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

struct Accept;

impl Confirm for Accept {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[tokio::test]
async fn load_normalizes_every_entry() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/posts");
        then.status(200).json_body(json!([
            { "id": 1, "content": "hi", "author": "A" },
            {
                "id": 2,
                "content": "with image",
                "author": "B",
                "imageUrl": "https://example.com/a.png",
                "createdDateTime": "2026-01-30T00:00:00Z"
            }
        ]));
    });

    let api = client(&server);
    let mut feed = Feed::new();
    let before = Utc::now();
    feed.load_all(&api).await;
    let after = Utc::now();

    assert_eq!(feed.state(), LoadState::Ready);
    assert!(feed.last_load_error().is_none());
    assert_eq!(feed.posts().len(), 2);
    assert!(feed.editing_id().is_none());

    // No timestamp from the server: resolved to load time.
    let first = &feed.posts()[0];
    assert_eq!(first.id, PostId::Number(1));
    assert!(first.created_at >= before && first.created_at <= after);

    // Server timestamp wins when present.
    let second = &feed.posts()[1];
    assert_eq!(
        second.created_at.to_rfc3339(),
        "2026-01-30T00:00:00+00:00"
    );
}

#[tokio::test]
async fn load_failure_is_recorded_not_thrown() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/posts");
        then.status(500).json_body(json!({ "error": "database is down" }));
    });

    let api = client(&server);
    let mut feed = Feed::new();
    feed.load_all(&api).await;

    assert_eq!(feed.state(), LoadState::Ready);
    assert!(feed.posts().is_empty());
    let err = feed.last_load_error().unwrap();
    assert!(err.contains("500"), "got: {err}");
    assert!(err.contains("database is down"), "got: {err}");
}

#[tokio::test]
async fn create_flow_prepends_the_server_record() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/posts")
            .body_contains("\"content\":\"hello\"");
        then.status(201).json_body(json!({
            "id": 7,
            "content": "hello",
            "author": "me",
            "createdDateTime": "2026-02-01T12:00:00Z"
        }));
    });

    let api = client(&server);
    let mut feed = Feed::new();
    feed.apply_created(postfeed::RawPost {
        id: PostId::Number(1),
        content: Some("older".to_string()),
        image_url: None,
        author: None,
        created_date_time: None,
        modified_date_time: None,
    });

    let mut form = CreateForm::new();
    form.set_content("hello");
    let raw = form.submit(&api).await.unwrap();
    feed.apply_created(raw);

    create.assert();
    assert_eq!(feed.posts().len(), 2);
    assert_eq!(feed.posts()[0].id, PostId::Number(7));
    // Draft is cleared for the next post.
    assert!(form.content().is_empty());
}

#[tokio::test]
async fn blank_content_never_reaches_the_network() {
    let server = MockServer::start();
    let put = server.mock(|when, then| {
        when.method(PUT).path("/posts/1");
        then.status(200).json_body(json!({ "id": 1 }));
    });
    let post_mock = server.mock(|when, then| {
        when.method(POST).path("/posts");
        then.status(201).json_body(json!({ "id": 9 }));
    });

    let api = client(&server);
    let mut feed = Feed::new();
    feed.apply_created(postfeed::RawPost {
        id: PostId::Number(1),
        content: Some("hi".to_string()),
        image_url: None,
        author: Some("A".to_string()),
        created_date_time: None,
        modified_date_time: None,
    });
    let id = PostId::Number(1);
    feed.toggle_editing(&id);

    let mut form = EditForm::new(&feed.posts()[0]);
    form.set_content("   ");
    let err = form.submit(&api).await.unwrap_err();
    assert!(matches!(err, FormError::EmptyContent));
    // Still in editing state; the user can retry or cancel.
    assert!(feed.is_editing(&id));

    let mut create = CreateForm::new();
    create.set_content("");
    let err = create.submit(&api).await.unwrap_err();
    assert!(matches!(err, FormError::EmptyContent));

    assert_eq!(put.hits(), 0);
    assert_eq!(post_mock.hits(), 0);
}

#[tokio::test]
async fn update_sends_the_full_record_and_merges_the_response() {
    let server = MockServer::start();
    let put = server.mock(|when, then| {
        when.method(PUT)
            .path("/posts/1")
            .body_contains("\"content\":\"bye\"")
            .body_contains("\"author\":\"A\"");
        // Response omits imageUrl; the client must keep its local value.
        then.status(200).json_body(json!({
            "id": 1,
            "content": "bye",
            "author": "A"
        }));
    });

    let api = client(&server);
    let mut feed = Feed::new();
    feed.apply_created(postfeed::RawPost {
        id: PostId::Number(1),
        content: Some("hi".to_string()),
        image_url: Some("https://example.com/cat.png".to_string()),
        author: Some("A".to_string()),
        created_date_time: None,
        modified_date_time: None,
    });
    let id = PostId::Number(1);
    feed.toggle_editing(&id);

    let mut form = EditForm::new(&feed.posts()[0]);
    form.set_content("bye");
    let raw = form.submit(&api).await.unwrap();
    feed.apply_updated(raw);

    put.assert();
    let post = &feed.posts()[0];
    assert_eq!(post.content, "bye");
    assert_eq!(post.image_url.as_deref(), Some("https://example.com/cat.png"));
    assert!(!feed.is_editing(&id));
}

#[tokio::test]
async fn blank_image_url_clears_the_image() {
    let server = MockServer::start();
    // The PUT body must carry the blank explicitly; dropping the field
    // would leave the server unaware the image was cleared.
    let put = server.mock(|when, then| {
        when.method(PUT)
            .path("/posts/1")
            .body_contains("\"imageUrl\":\"\"");
        // Response omits imageUrl entirely.
        then.status(200).json_body(json!({
            "id": 1,
            "content": "hi",
            "author": "A"
        }));
    });

    let api = client(&server);
    let mut feed = Feed::new();
    feed.apply_created(postfeed::RawPost {
        id: PostId::Number(1),
        content: Some("hi".to_string()),
        image_url: Some("https://example.com/old.png".to_string()),
        author: Some("A".to_string()),
        created_date_time: None,
        modified_date_time: None,
    });
    let id = PostId::Number(1);
    feed.toggle_editing(&id);

    let mut form = EditForm::new(&feed.posts()[0]);
    assert_eq!(form.image_url(), "https://example.com/old.png");
    form.set_image_url("");
    let raw = form.submit(&api).await.unwrap();
    feed.apply_updated(raw);

    put.assert();
    let post = &feed.posts()[0];
    assert!(post.image_url.is_none(), "image should be cleared, got {:?}", post.image_url);
    assert!(postfeed::render_post(post, false).contains("image: (none)"));
}

#[tokio::test]
async fn list_retries_after_throttling() {
    let server = MockServer::start();
    let mut throttle = server.mock(|when, then| {
        when.method(GET).path("/posts");
        then.status(429).header("Retry-After", "1");
    });

    let api = client(&server);
    let pending = tokio::spawn(async move { api.list().await });

    // Once the first attempt has been throttled, swap in a healthy
    // response for the retry.
    while throttle.hits() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    throttle.delete();
    let ok = server.mock(|when, then| {
        when.method(GET).path("/posts");
        then.status(200).json_body(json!([
            { "id": 1, "content": "hi", "author": "A" }
        ]));
    });

    let posts = pending.await.unwrap().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, PostId::Number(1));
    ok.assert();
}

#[tokio::test]
async fn list_gives_up_after_repeated_throttling() {
    let server = MockServer::start();
    let throttle = server.mock(|when, then| {
        when.method(GET).path("/posts");
        then.status(429).header("Retry-After", "0");
    });

    let api = client(&server);
    let err = api.list().await.unwrap_err();

    match err {
        ApiError::Status { status, detail } => {
            assert_eq!(status.as_u16(), 429);
            let detail = detail.unwrap();
            assert!(detail.contains("gave up after 5 attempts"), "got: {detail}");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
    assert_eq!(throttle.hits(), 5);
}

#[tokio::test]
async fn dropped_submit_does_not_wedge_the_form() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PUT).path("/posts/1");
        then.status(200)
            .delay(Duration::from_millis(500))
            .json_body(json!({
                "id": 1,
                "content": "bye",
                "author": "A"
            }));
    });

    let api = client(&server);
    let mut feed = Feed::new();
    feed.apply_created(postfeed::RawPost {
        id: PostId::Number(1),
        content: Some("hi".to_string()),
        image_url: None,
        author: Some("A".to_string()),
        created_date_time: None,
        modified_date_time: None,
    });

    let mut form = EditForm::new(&feed.posts()[0]);
    form.set_content("bye");

    // A caller-side timeout drops the submit future mid-await.
    let timed_out = tokio::time::timeout(Duration::from_millis(50), form.submit(&api)).await;
    assert!(timed_out.is_err());

    // The next submit must go through, not report a phantom in-flight one.
    let raw = form.submit(&api).await.unwrap();
    assert_eq!(raw.content.as_deref(), Some("bye"));
}

#[tokio::test]
async fn update_failure_surfaces_the_server_detail() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PUT).path("/posts/1");
        then.status(500).json_body(json!({ "error": "constraint violated" }));
    });

    let api = client(&server);
    let mut feed = Feed::new();
    feed.apply_created(postfeed::RawPost {
        id: PostId::Number(1),
        content: Some("hi".to_string()),
        image_url: None,
        author: Some("A".to_string()),
        created_date_time: None,
        modified_date_time: None,
    });
    let id = PostId::Number(1);
    feed.toggle_editing(&id);

    let mut form = EditForm::new(&feed.posts()[0]);
    form.set_content("bye");
    let err = form.submit(&api).await.unwrap_err();

    match &err {
        FormError::Api(ApiError::Status { status, detail }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(detail.as_deref(), Some("constraint violated"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
    assert!(err.to_string().contains("constraint violated"));
    // The failed update must not mutate the feed or end the edit.
    assert_eq!(feed.posts()[0].content, "hi");
    assert!(feed.is_editing(&id));
}

#[tokio::test]
async fn delete_needs_confirmation_first() {
    let server = MockServer::start();
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/posts/1");
        then.status(204);
    });

    let api = client(&server);
    let mut feed = Feed::new();
    feed.apply_created(postfeed::RawPost {
        id: PostId::Number(1),
        content: Some("hi".to_string()),
        image_url: None,
        author: Some("A".to_string()),
        created_date_time: None,
        modified_date_time: None,
    });
    let id = PostId::Number(1);

    // Declined: nothing sent, nothing removed.
    let outcome = feed.delete_post(&api, &id, &Decline).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(delete.hits(), 0);
    assert_eq!(feed.posts().len(), 1);

    // Confirmed: exactly the matching entry goes away.
    let outcome = feed.delete_post(&api, &id, &Accept).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(delete.hits(), 1);
    assert!(feed.posts().is_empty());
    assert!(feed.get(&id).is_none());
}

#[tokio::test]
async fn failed_delete_leaves_the_list_unchanged() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/posts/1");
        then.status(404).json_body(json!({ "error": "no such post" }));
    });

    let api = client(&server);
    let mut feed = Feed::new();
    feed.apply_created(postfeed::RawPost {
        id: PostId::Number(1),
        content: Some("hi".to_string()),
        image_url: None,
        author: Some("A".to_string()),
        created_date_time: None,
        modified_date_time: None,
    });
    let id = PostId::Number(1);

    let err = feed.delete_post(&api, &id, &Accept).await.unwrap_err();
    assert!(err.to_string().contains("no such post"));
    assert_eq!(feed.posts().len(), 1);
}
