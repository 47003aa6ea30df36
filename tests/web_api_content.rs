//! Integration tests for content actions on the dispatch endpoint.

use std::fs;
use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use serde_json::Value;
use tempfile::TempDir;

use folio::config::Config;
use folio::logging::LogControl;
use folio::web::handlers::AppState;
use folio::web::router::create_router;

/// Test configuration rooted in a temp directory, with a `blog` collection
/// provisioned.
fn test_config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.content.root = tmp.path().join("content").display().to_string();
    config.media.root = tmp.path().join("img").display().to_string();
    config.cache.dir = tmp.path().join("cache").display().to_string();
    fs::create_dir_all(tmp.path().join("content").join("collections").join("blog")).unwrap();
    config
}

fn server_with_config(config: Config) -> TestServer {
    let log_control = LogControl::disconnected(&config.logging);
    let state = Arc::new(AppState::new(config, log_control).expect("state"));
    TestServer::new(create_router(state)).expect("test server")
}

fn create_test_server(tmp: &TempDir) -> TestServer {
    server_with_config(test_config(tmp))
}

async fn create_file(server: &TestServer, name: &str, content: &str) {
    let response = server
        .post("/process")
        .form(&[
            ("action", "create"),
            ("file", name),
            ("content", content),
            ("collection", "blog"),
        ])
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_list_empty_collection() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let response = server
        .get("/process")
        .add_query_param("action", "list")
        .add_query_param("collection", "blog")
        .await;

    response.assert_status_ok();
    let files: Vec<String> = response.json();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_create_read_round_trip() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    create_file(&server, "hello.md", "---\ntitle: \"Hi\"\n---\n\nHello world").await;

    let response = server
        .get("/process")
        .add_query_param("action", "read")
        .add_query_param("file", "hello.md")
        .add_query_param("collection", "blog")
        .await;

    response.assert_status_ok();
    assert!(response
        .header("content-type")
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let body = response.text();
    assert!(body.contains("Hello world"));
    assert!(body.contains("title: \"Hi\""));
}

#[tokio::test]
async fn test_create_synthesizes_front_matter() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    create_file(&server, "bare.md", "Just a body").await;

    let response = server
        .get("/process")
        .add_query_param("action", "read")
        .add_query_param("file", "bare.md")
        .add_query_param("collection", "blog")
        .await;
    let body = response.text();
    assert!(body.starts_with("---\n"));
    assert!(body.contains("tags: []"));
    assert!(body.contains("Just a body"));
}

#[tokio::test]
async fn test_create_existing_conflicts() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);
    create_file(&server, "dup.md", "one").await;

    let response = server
        .post("/process")
        .form(&[
            ("action", "create"),
            ("file", "dup.md"),
            ("content", "two"),
            ("collection", "blog"),
        ])
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_save_merges_field_values() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);
    create_file(&server, "post.md", "---\nstatus: draft\n---\n\nHello").await;

    let response = server
        .post("/process")
        .form(&[
            ("action", "save"),
            ("file", "post.md"),
            ("content", "---\nstatus: draft\n---\n\nHello"),
            ("field_status", "published"),
            ("collection", "blog"),
        ])
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["method"].is_string());

    let read = server
        .get("/process")
        .add_query_param("action", "read")
        .add_query_param("file", "post.md")
        .add_query_param("collection", "blog")
        .await;
    let content = read.text();
    assert!(content.contains("status: \"published\""));
    assert!(content.contains("Hello"));
}

#[tokio::test]
async fn test_rename() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);
    create_file(&server, "old.md", "content").await;

    let response = server
        .post("/process")
        .form(&[
            ("action", "rename"),
            ("oldFilename", "old.md"),
            ("newFilename", "new.md"),
            ("collection", "blog"),
        ])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["oldName"], "old.md");
    assert_eq!(body["newName"], "new.md");

    let read = server
        .get("/process")
        .add_query_param("action", "read")
        .add_query_param("file", "new.md")
        .add_query_param("collection", "blog")
        .await;
    read.assert_status_ok();
}

#[tokio::test]
async fn test_rename_onto_existing_conflicts() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);
    create_file(&server, "a.md", "a").await;
    create_file(&server, "b.md", "b").await;

    let response = server
        .post("/process")
        .form(&[
            ("action", "rename"),
            ("oldFilename", "a.md"),
            ("newFilename", "b.md"),
            ("collection", "blog"),
        ])
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_restore_round_trip() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);
    create_file(&server, "post.md", "---\ntags: []\n---\n\nkeep me").await;

    let delete = server
        .post("/process")
        .form(&[
            ("action", "delete"),
            ("filename", "post.md"),
            ("collection", "blog"),
        ])
        .await;
    delete.assert_status_ok();

    // Gone from the active listing, present in the recycle bin
    let list = server
        .get("/process")
        .add_query_param("action", "list")
        .add_query_param("collection", "blog")
        .await;
    let files: Vec<String> = list.json();
    assert!(files.is_empty());

    let bin = server
        .get("/process")
        .add_query_param("action", "recyclebin")
        .add_query_param("type", "files")
        .add_query_param("collection", "blog")
        .await;
    let body: Value = bin.json();
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
    assert_eq!(body["files"][0]["original_name"], "post.md");

    let restore = server
        .post("/process")
        .form(&[
            ("action", "restore"),
            ("filename", "post.md"),
            ("collection", "blog"),
        ])
        .await;
    restore.assert_status_ok();

    let read = server
        .get("/process")
        .add_query_param("action", "read")
        .add_query_param("file", "post.md")
        .add_query_param("collection", "blog")
        .await;
    read.assert_status_ok();
    assert!(read.text().contains("keep me"));
}

#[tokio::test]
async fn test_permanent_delete_only_touches_recycle_bin() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);
    create_file(&server, "post.md", "x").await;

    // Not in the bin yet
    let purge = server
        .post("/process")
        .form(&[
            ("action", "permanentdelete"),
            ("filename", "post.md"),
            ("collection", "blog"),
        ])
        .await;
    purge.assert_status(axum::http::StatusCode::NOT_FOUND);

    server
        .post("/process")
        .form(&[
            ("action", "delete"),
            ("filename", "post.md"),
            ("collection", "blog"),
        ])
        .await
        .assert_status_ok();

    let purge = server
        .post("/process")
        .form(&[
            ("action", "permanentdelete"),
            ("filename", "post.md"),
            ("collection", "blog"),
        ])
        .await;
    purge.assert_status_ok();

    let bin = server
        .get("/process")
        .add_query_param("action", "recyclebin")
        .add_query_param("type", "files")
        .add_query_param("collection", "blog")
        .await;
    let body: Value = bin.json();
    assert!(body["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_recycle_bin() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);
    create_file(&server, "a.md", "a").await;
    server
        .post("/process")
        .form(&[
            ("action", "delete"),
            ("filename", "a.md"),
            ("collection", "blog"),
        ])
        .await
        .assert_status_ok();

    let response = server
        .post("/process")
        .form(&[
            ("action", "emptyrecyclebin"),
            ("type", "all"),
            ("collection", "blog"),
        ])
        .await;
    response.assert_status_ok();

    let bin = server
        .get("/process")
        .add_query_param("action", "recyclebin")
        .add_query_param("type", "files")
        .add_query_param("collection", "blog")
        .await;
    let body: Value = bin.json();
    assert!(body["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_recycle_bin_reports_failed_kind_and_empties_the_other() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    // Occupy the media root with a regular file so the image bin cannot be
    // opened while the file bin stays fully operational.
    fs::write(tmp.path().join("img"), "not a directory").unwrap();
    let server = server_with_config(config);

    create_file(&server, "junk.md", "x").await;
    server
        .post("/process")
        .form(&[
            ("action", "delete"),
            ("filename", "junk.md"),
            ("collection", "blog"),
        ])
        .await
        .assert_status_ok();

    let response = server
        .post("/process")
        .form(&[
            ("action", "emptyrecyclebin"),
            ("type", "all"),
            ("collection", "blog"),
        ])
        .await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("images"));

    // The file bin was still emptied despite the image failure.
    let bin = server
        .get("/process")
        .add_query_param("action", "recyclebin")
        .add_query_param("type", "files")
        .add_query_param("collection", "blog")
        .await;
    let body: Value = bin.json();
    assert!(body["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_read_missing_is_404() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let response = server
        .get("/process")
        .add_query_param("action", "read")
        .add_query_param("file", "ghost.md")
        .add_query_param("collection", "blog")
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_absolute_path_is_forbidden() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let response = server
        .get("/process")
        .add_query_param("action", "read")
        .add_query_param("file", "/etc/passwd.md")
        .add_query_param("collection", "blog")
        .await;

    response.assert_status(axum::http::StatusCode::FORBIDDEN);
    let body: Value = response.json();
    // The raw path never comes back in the response
    assert!(!body["message"].as_str().unwrap().contains("/etc/passwd"));
}

#[tokio::test]
async fn test_oversize_write_is_413() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.content.max_content_bytes = 32;
    let server = server_with_config(config);

    let big = "x".repeat(64);
    let response = server
        .post("/process")
        .form(&[
            ("action", "write"),
            ("file", "big.md"),
            ("content", big.as_str()),
            ("collection", "blog"),
        ])
        .await;

    response.assert_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_stale_write_conflicts() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);
    create_file(&server, "post.md", "v1").await;

    let response = server
        .post("/process")
        .form(&[
            ("action", "write"),
            ("file", "post.md"),
            ("content", "v2"),
            ("if_unmodified_since", "1"),
            ("collection", "blog"),
        ])
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_mutations_require_token_when_configured() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.web.auth_token = Some("s3cret".to_string());
    let server = server_with_config(config);

    let denied = server
        .post("/process")
        .form(&[
            ("action", "create"),
            ("file", "a.md"),
            ("content", "x"),
            ("collection", "blog"),
        ])
        .await;
    denied.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    // Reads stay open
    server
        .get("/process")
        .add_query_param("action", "list")
        .add_query_param("collection", "blog")
        .await
        .assert_status_ok();

    let allowed = server
        .post("/process")
        .add_header(AUTHORIZATION, "Bearer s3cret")
        .form(&[
            ("action", "create"),
            ("file", "a.md"),
            ("content", "x"),
            ("collection", "blog"),
        ])
        .await;
    allowed.assert_status_ok();
}

#[tokio::test]
async fn test_collections_action() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    fs::create_dir_all(
        tmp.path()
            .join("content")
            .join("collections")
            .join("docs"),
    )
    .unwrap();
    let server = server_with_config(config);

    let response = server
        .get("/process")
        .add_query_param("action", "collections")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let names: Vec<&str> = body["collections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["blog", "docs"]);
}

#[tokio::test]
async fn test_unknown_action_is_400() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let response = server
        .get("/process")
        .add_query_param("action", "explode")
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_action_is_400() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let response = server.get("/process").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logs_action_reports_and_updates() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let status = server
        .get("/process")
        .add_query_param("action", "logs")
        .await;
    status.assert_status_ok();
    let body: Value = status.json();
    assert_eq!(body["logging"], true);
    assert_eq!(body["log_level"], "info");

    let update = server
        .post("/process")
        .form(&[("action", "logs"), ("level", "debug"), ("status", "off")])
        .await;
    update.assert_status_ok();
    let body: Value = update.json();
    assert_eq!(body["logging"], false);
    assert_eq!(body["log_level"], "debug");

    let bad = server
        .post("/process")
        .form(&[("action", "logs"), ("level", "verbose")])
        .await;
    bad.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoint() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}
