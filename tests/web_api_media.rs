//! Integration tests for media actions: browsing, uploads, directories and
//! the image recycle bin.

use std::fs;
use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::Value;
use tempfile::TempDir;

use folio::config::Config;
use folio::logging::LogControl;
use folio::web::handlers::AppState;
use folio::web::router::create_router;

fn test_config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.content.root = tmp.path().join("content").display().to_string();
    config.media.root = tmp.path().join("img").display().to_string();
    config.cache.dir = tmp.path().join("cache").display().to_string();
    fs::create_dir_all(tmp.path().join("content").join("collections").join("blog")).unwrap();
    config
}

fn create_test_server(tmp: &TempDir) -> TestServer {
    let config = test_config(tmp);
    let log_control = LogControl::disconnected(&config.logging);
    let state = Arc::new(AppState::new(config, log_control).expect("state"));
    TestServer::new(create_router(state)).expect("test server")
}

fn upload_form(filename: &str, bytes: &[u8], path: &str) -> MultipartForm {
    let part = Part::bytes(bytes.to_vec())
        .file_name(filename)
        .mime_type("image/png");
    MultipartForm::new()
        .add_text("action", "upload")
        .add_text("path", path)
        .add_text("collection", "blog")
        .add_part("image", part)
}

#[tokio::test]
async fn test_upload_and_list() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let response = server
        .post("/process")
        .multipart(upload_form("My Photo.PNG", b"fakepng", ""))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "my_photo.png");
    assert_eq!(body["url"], "/img/my_photo.png");
    assert_eq!(body["size"], 7);

    let listing = server
        .get("/process")
        .add_query_param("action", "media")
        .add_query_param("path", "")
        .add_query_param("collection", "blog")
        .await;
    listing.assert_status_ok();
    let body: Value = listing.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "image");
    assert_eq!(items[0]["name"], "my_photo.png");
}

#[tokio::test]
async fn test_second_upload_gets_numeric_suffix() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    server
        .post("/process")
        .multipart(upload_form("My Photo.PNG", b"first", ""))
        .await
        .assert_status_ok();
    let second = server
        .post("/process")
        .multipart(upload_form("My Photo.PNG", b"second", ""))
        .await;
    second.assert_status_ok();
    let body: Value = second.json();
    assert_eq!(body["filename"], "my_photo_1.png");

    // First file untouched on disk
    let first_path = tmp.path().join("img").join("my_photo.png");
    assert_eq!(fs::read(first_path).unwrap(), b"first");
}

#[tokio::test]
async fn test_upload_bad_extension_rejected() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let part = Part::bytes(b"<?php".to_vec())
        .file_name("shell.php")
        .mime_type("image/png");
    let form = MultipartForm::new()
        .add_text("action", "upload")
        .add_text("collection", "blog")
        .add_part("image", part);

    let response = server.post("/process").multipart(form).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_upload_without_file_rejected() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let form = MultipartForm::new()
        .add_text("action", "upload")
        .add_text("collection", "blog");
    let response = server.post("/process").multipart(form).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_directory_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let create = server
        .post("/process")
        .form(&[
            ("action", "createdir"),
            ("dirname", "gallery"),
            ("path", ""),
            ("collection", "blog"),
        ])
        .await;
    create.assert_status_ok();

    // Again: conflict
    let again = server
        .post("/process")
        .form(&[
            ("action", "createdir"),
            ("dirname", "gallery"),
            ("path", ""),
            ("collection", "blog"),
        ])
        .await;
    again.assert_status(axum::http::StatusCode::CONFLICT);

    server
        .post("/process")
        .multipart(upload_form("shot.png", b"png", "gallery"))
        .await
        .assert_status_ok();

    // Directories sort before images in the listing
    let listing = server
        .get("/process")
        .add_query_param("action", "media")
        .add_query_param("collection", "blog")
        .await;
    let body: Value = listing.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "dir");
    assert_eq!(items[0]["name"], "gallery");

    let delete = server
        .post("/process")
        .form(&[
            ("action", "deletedir"),
            ("dirname", "gallery"),
            ("path", ""),
            ("collection", "blog"),
        ])
        .await;
    delete.assert_status_ok();
    assert!(!tmp.path().join("img").join("gallery").exists());
}

#[tokio::test]
async fn test_image_recycle_round_trip() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    server
        .post("/process")
        .multipart(upload_form("pic.png", b"bytes", ""))
        .await
        .assert_status_ok();

    let delete = server
        .post("/process")
        .form(&[
            ("action", "deleteimage"),
            ("imagename", "pic.png"),
            ("path", ""),
            ("collection", "blog"),
        ])
        .await;
    delete.assert_status_ok();
    assert!(!tmp.path().join("img").join("pic.png").exists());

    let bin = server
        .get("/process")
        .add_query_param("action", "recyclebin")
        .add_query_param("type", "images")
        .add_query_param("collection", "blog")
        .await;
    bin.assert_status_ok();
    let body: Value = bin.json();
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
    assert_eq!(body["files"][0]["name"], "pic.png");

    let restore = server
        .post("/process")
        .form(&[
            ("action", "restoreimage"),
            ("imagename", "pic.png"),
            ("path", ""),
            ("collection", "blog"),
        ])
        .await;
    restore.assert_status_ok();
    assert_eq!(
        fs::read(tmp.path().join("img").join("pic.png")).unwrap(),
        b"bytes"
    );
}

#[tokio::test]
async fn test_permanent_delete_image() {
    let tmp = TempDir::new().unwrap();
    let server = create_test_server(&tmp);

    let bin = tmp
        .path()
        .join("content")
        .join("collections")
        .join("blog")
        .join("recycle")
        .join("images");
    fs::create_dir_all(&bin).unwrap();
    fs::write(bin.join("old.png"), "x").unwrap();

    let purge = server
        .post("/process")
        .form(&[
            ("action", "permanentdeleteimage"),
            ("imagename", "old.png"),
            ("path", ""),
            ("collection", "blog"),
        ])
        .await;
    purge.assert_status_ok();
    assert!(!bin.join("old.png").exists());

    // Missing image is a 404
    let missing = server
        .post("/process")
        .form(&[
            ("action", "permanentdeleteimage"),
            ("imagename", "old.png"),
            ("collection", "blog"),
        ])
        .await;
    missing.assert_status(axum::http::StatusCode::NOT_FOUND);
}
