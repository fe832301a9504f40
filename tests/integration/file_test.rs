//! Integration tests for file upload, lifecycle and download endpoints.

mod helpers;

use axum::http::StatusCode;
use helpers::Part;
use serde_json::json;

const MB: usize = 1024 * 1024;

async fn upload_one(app: &helpers::TestApp, token: &str, filename: &str, data: &[u8]) -> String {
    let response = app
        .upload("/api/files/upload", &[Part::File { filename, data }], token)
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    response.data()["files"][0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_upload_numbers_duplicates_and_charges_quota() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let five = vec![1u8; 5 * MB];
    let response = app
        .upload(
            "/api/files/upload",
            &[
                Part::File { filename: "report.pdf", data: &five },
                Part::File { filename: "report.pdf", data: &five },
            ],
            &token,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let names: Vec<&str> = response.data()["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["report", "report (2)"]);
    assert_eq!(response.data()["added_mb"], 10.0);

    let me = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(me.data()["used_storage_mb"], 10.0);
    assert_eq!(me.data()["remaining_storage_mb"], 190.0);
}

#[tokio::test]
async fn test_upload_over_quota_is_rejected() {
    let app = helpers::TestApp::new().await;
    let user_id = app.create_user_with_quota("Tiny", 1).await;
    let token = app.login(user_id).await;

    let response = app
        .upload(
            "/api/files/upload",
            &[Part::File { filename: "big.bin", data: &vec![0u8; 2 * MB] }],
            &token,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "BAD_REQUEST");

    let all = app.request("GET", "/api/search/all", None, Some(&token)).await;
    assert!(all.data()["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_without_files_is_bad_request() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let response = app.upload("/api/files/upload", &[], &token).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_into_unknown_folder_is_not_found() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let missing = stowage_core::types::FolderId::new().to_string();

    let response = app
        .upload(
            "/api/files/upload",
            &[
                Part::Text { name: "parent_folder_id", value: &missing },
                Part::File { filename: "a.txt", data: b"a" },
            ],
            &token,
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_keeps_file_type() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let id = upload_one(&app, &token, "draft.docx", b"words").await;

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{id}/rename"),
            Some(json!({ "new_name": "final.pdf" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.data()["name"], "final");
    assert_eq!(response.data()["file_type"], "docx");
}

#[tokio::test]
async fn test_delete_recover_renumbers_when_slot_taken() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let original = upload_one(&app, &token, "notes.txt", b"first").await;
    let deleted = app
        .request("DELETE", &format!("/api/files/{original}"), None, Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    upload_one(&app, &token, "notes.txt", b"second").await;

    let recovered = app
        .request("PUT", &format!("/api/files/{original}/recover"), None, Some(&token))
        .await;
    assert_eq!(recovered.status, StatusCode::OK, "{:?}", recovered.body);
    assert_eq!(recovered.data()["name"], "notes (2).txt");
}

#[tokio::test]
async fn test_second_delete_is_not_found() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let id = upload_one(&app, &token, "once.txt", b"x").await;

    let first = app
        .request("DELETE", &format!("/api/files/{id}"), None, Some(&token))
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .request("DELETE", &format!("/api/files/{id}"), None, Some(&token))
        .await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_permanent_delete_releases_quota() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let id = upload_one(&app, &token, "video.mp4", &vec![3u8; 3 * MB]).await;

    app.request("DELETE", &format!("/api/files/{id}"), None, Some(&token))
        .await;
    let me = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(me.data()["used_storage_mb"], 3.0);

    let purged = app
        .request("DELETE", &format!("/api/files/{id}/permanent"), None, Some(&token))
        .await;
    assert_eq!(purged.status, StatusCode::OK);
    assert_eq!(purged.data()["freed_mb"], 3.0);
    assert_eq!(purged.data()["removed"], 1);

    let me = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(me.data()["used_storage_mb"], 0.0);

    let recover = app
        .request("PUT", &format!("/api/files/{id}/recover"), None, Some(&token))
        .await;
    assert_eq!(recover.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_streams_bytes() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let id = upload_one(&app, &token, "hello.txt", b"hello world").await;

    let response = app
        .request("GET", &format!("/api/files/{id}/download"), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["content-type"], "application/octet-stream");
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename=\"hello.txt\""
    );
    assert_eq!(&response.bytes[..], b"hello world");
}

#[tokio::test]
async fn test_download_of_deleted_file_is_not_found() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let id = upload_one(&app, &token, "gone.txt", b"bye").await;

    app.request("DELETE", &format!("/api/files/{id}"), None, Some(&token))
        .await;
    let response = app
        .request("GET", &format!("/api/files/{id}/download"), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
