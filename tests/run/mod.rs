//! Full diary runs against mock GitHub and Typetalk servers.

use crate::common::*;
use diarybot::diary;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn recap_close_open_announce() {
    let github = MockServer::start().await;
    let typetalk = MockServer::start().await;

    mount_two_diary_issues(&github).await;
    mount_close(&github, 1).await;
    mount_close(&github, 2).await;
    Mock::given(method("POST"))
        .and(path("/repos/alice/habits/issues"))
        .and(body_json(json!({
            "title": "2022-06-11",
            "body": NEW_ISSUE_BODY,
            "labels": ["diary"],
            "assignees": ["alice"]
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(issue_json(3, "2022-06-11", NEW_ISSUE_BODY)),
        )
        .expect(1)
        .mount(&github)
        .await;
    // Two recaps and one announcement.
    mount_chat(&typetalk, 3).await;

    let ctx = context(&github, &typetalk, false);
    diary::run(&ctx, now()).await.unwrap();

    let messages = chat_messages(&typetalk).await;
    assert_eq!(messages.len(), 3);
    // Recaps run concurrently, so their relative order is unspecified; the
    // announcement always comes after both have settled.
    let mut recaps = vec![messages[0].clone(), messages[1].clone()];
    recaps.sort();
    let mut expected = vec![RECAP_FRIDAY.to_string(), RECAP_THURSDAY.to_string()];
    expected.sort();
    assert_eq!(recaps, expected);
    assert_eq!(messages[2], ANNOUNCEMENT);
}

#[tokio::test]
async fn dry_run_posts_the_same_messages_without_writing() {
    let github = MockServer::start().await;
    let typetalk = MockServer::start().await;

    mount_two_diary_issues(&github).await;
    mount_chat(&typetalk, 3).await;

    let ctx = context(&github, &typetalk, true);
    diary::run(&ctx, now()).await.unwrap();

    let messages = chat_messages(&typetalk).await;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2], ANNOUNCEMENT);

    // Reads only: nothing was closed, nothing was created.
    let writes: Vec<_> = github
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|req| req.method.to_string() != "GET")
        .collect();
    assert!(writes.is_empty(), "unexpected writes: {writes:?}");
}

#[tokio::test]
async fn nothing_happens_once_the_program_is_over() {
    let github = MockServer::start().await;
    let typetalk = MockServer::start().await;

    let ctx = context(&github, &typetalk, false);
    let after_the_end = "2023-04-01T00:00:00Z".parse().unwrap();
    diary::run(&ctx, after_the_end).await.unwrap();

    assert!(github.received_requests().await.unwrap().is_empty());
    assert!(typetalk.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn issue_listing_spans_multiple_pages() {
    let github = MockServer::start().await;
    let typetalk = MockServer::start().await;

    let first_page: Vec<_> = (1..=100)
        .map(|n| issue_json(n, &format!("issue {n}"), ""))
        .collect();
    Mock::given(method("GET"))
        .and(path("/repos/alice/habits/issues"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/habits/issues"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([issue_json(101, "issue 101", "")])),
        )
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/habits/issues"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/repos/alice/habits/issues/\d+/comments$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&github)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"^/repos/alice/habits/issues/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(101)
        .mount(&github)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/alice/habits/issues"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(issue_json(102, "2022-06-11", NEW_ISSUE_BODY)),
        )
        .expect(1)
        .mount(&github)
        .await;
    mount_chat(&typetalk, 102).await;

    let ctx = context(&github, &typetalk, false);
    diary::run(&ctx, now()).await.unwrap();

    let messages = chat_messages(&typetalk).await;
    assert_eq!(messages.len(), 102);
    assert_eq!(messages[101], ANNOUNCEMENT);
}

#[tokio::test]
async fn comments_span_multiple_pages() {
    let github = MockServer::start().await;
    let typetalk = MockServer::start().await;

    mount_issue_listing(&github, vec![issue_json(1, "2022-06-10", "")]).await;

    let first_page: Vec<_> = (0..100)
        .map(|n| comment_json("alice", "2022-06-10T00:00:00Z", &format!("c{n:03}")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/repos/alice/habits/issues/1/comments"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/habits/issues/1/comments"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([comment_json(
            "alice",
            "2022-06-10T00:00:00Z",
            "c100"
        )])))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/habits/issues/1/comments"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&github)
        .await;
    mount_close(&github, 1).await;
    Mock::given(method("POST"))
        .and(path("/repos/alice/habits/issues"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(issue_json(2, "2022-06-11", NEW_ISSUE_BODY)),
        )
        .expect(1)
        .mount(&github)
        .await;
    mount_chat(&typetalk, 2).await;

    let ctx = context(&github, &typetalk, false);
    diary::run(&ctx, now()).await.unwrap();

    let messages = chat_messages(&typetalk).await;
    assert_eq!(messages.len(), 2);
    let recap = &messages[0];
    // Title line, empty body line, the comments header, then all 101 comments.
    assert_eq!(recap.lines().count(), 104);
    assert!(recap.contains("09:00:00 c000\n"));
    assert!(recap.contains("09:00:00 c099\n"));
    assert!(recap.contains("09:00:00 c100\n"));
}
