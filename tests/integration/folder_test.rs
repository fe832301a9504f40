//! Integration tests for folder lifecycle endpoints.

mod helpers;

use axum::http::StatusCode;
use helpers::Part;
use serde_json::json;

async fn create_folder(app: &helpers::TestApp, token: &str, name: &str, parent: Option<&str>) -> String {
    let response = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": name, "parent_folder_id": parent })),
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.data()["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_duplicate_folder_names_are_numbered() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    create_folder(&app, &token, "Reports", None).await;
    let second = app
        .request("POST", "/api/folders", Some(json!({ "name": "Reports" })), Some(&token))
        .await;

    assert_eq!(second.status, StatusCode::CREATED);
    assert_eq!(second.data()["name"], "Reports (2)");
}

#[tokio::test]
async fn test_create_folder_rejects_empty_name() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let response = app
        .request("POST", "/api/folders", Some(json!({ "name": "" })), Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "BAD_REQUEST");
}

#[tokio::test]
async fn test_folder_details_count_children() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let projects = create_folder(&app, &token, "Projects", None).await;
    create_folder(&app, &token, "Alpha", Some(&projects)).await;
    let upload = app
        .upload(
            "/api/files/upload",
            &[
                Part::Text { name: "parent_folder_id", value: &projects },
                Part::File { filename: "plan.txt", data: b"roadmap" },
            ],
            &token,
        )
        .await;
    assert_eq!(upload.status, StatusCode::OK, "{:?}", upload.body);

    let details = app
        .request("GET", &format!("/api/folders/{projects}"), None, Some(&token))
        .await;

    assert_eq!(details.status, StatusCode::OK);
    assert_eq!(details.data()["name"], "Projects");
    assert_eq!(details.data()["file_count"], 1);
    assert_eq!(details.data()["subfolder_count"], 1);
}

#[tokio::test]
async fn test_rename_cascades_to_children() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let foo = create_folder(&app, &token, "Foo", None).await;
    let child = create_folder(&app, &token, "Child", Some(&foo)).await;
    let foo2 = create_folder(&app, &token, "Foo2", None).await;

    let renamed = app
        .request(
            "PUT",
            &format!("/api/folders/{foo}/rename"),
            Some(json!({ "new_name": "Bar" })),
            Some(&token),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.data()["name"], "Bar");

    let child = app
        .request("GET", &format!("/api/folders/{child}"), None, Some(&token))
        .await;
    let child_path = child.data()["path"].as_str().unwrap();
    assert!(child_path.contains("Bar"), "child path not cascaded: {child_path}");

    let untouched = app
        .request("GET", &format!("/api/folders/{foo2}"), None, Some(&token))
        .await;
    assert!(untouched.data()["path"].as_str().unwrap().ends_with("Foo2"));
}

#[tokio::test]
async fn test_delete_recover_and_purge_folder() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let photos = create_folder(&app, &token, "Photos", None).await;
    let upload = app
        .upload(
            "/api/files/upload",
            &[
                Part::Text { name: "parent_folder_id", value: &photos },
                Part::File { filename: "beach.jpg", data: &vec![7u8; 1024 * 1024] },
            ],
            &token,
        )
        .await;
    assert_eq!(upload.status, StatusCode::OK);

    let deleted = app
        .request("DELETE", &format!("/api/folders/{photos}"), None, Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app
        .request("GET", &format!("/api/folders/{photos}"), None, Some(&token))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.error_code(), "NOT_FOUND");

    let recovered = app
        .request("PUT", &format!("/api/folders/{photos}/recover"), None, Some(&token))
        .await;
    assert_eq!(recovered.status, StatusCode::OK);
    assert_eq!(recovered.data()["name"], "Photos");

    let again = app
        .request("DELETE", &format!("/api/folders/{photos}"), None, Some(&token))
        .await;
    assert_eq!(again.status, StatusCode::OK);

    let purged = app
        .request("DELETE", &format!("/api/folders/{photos}/permanent"), None, Some(&token))
        .await;
    assert_eq!(purged.status, StatusCode::OK, "{:?}", purged.body);
    assert_eq!(purged.data()["freed_mb"], 1.0);

    let me = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(me.data()["used_storage_mb"], 0.0);
}

#[tokio::test]
async fn test_permanent_delete_of_live_folder_is_not_found() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let live = create_folder(&app, &token, "Live", None).await;

    let response = app
        .request("DELETE", &format!("/api/folders/{live}/permanent"), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_folder_tree() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let response = app
        .upload(
            "/api/folders/upload",
            &[
                Part::File { filename: "a.txt", data: b"alpha" },
                Part::Text { name: "paths", value: "Trip/day1/a.txt" },
                Part::File { filename: "b.txt", data: b"beta" },
                Part::Text { name: "paths", value: "Trip/day1/b.txt" },
                Part::File { filename: "c.txt", data: b"gamma" },
                Part::Text { name: "paths", value: "Trip/day2/c.txt" },
            ],
            &token,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let folders: Vec<&str> = response.data()["folders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(folders, vec!["Trip", "day1", "day2"]);
    assert_eq!(response.data()["files"].as_array().unwrap().len(), 3);
    assert!(response.data()["failures"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_folder_rejects_traversal() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let response = app
        .upload(
            "/api/folders/upload",
            &[
                Part::File { filename: "x.txt", data: b"x" },
                Part::Text { name: "paths", value: "Trip/../x.txt" },
            ],
            &token,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_folder_as_zip() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;

    let docs = create_folder(&app, &token, "Docs", None).await;
    app.upload(
        "/api/files/upload",
        &[
            Part::Text { name: "parent_folder_id", value: &docs },
            Part::File { filename: "readme.md", data: b"# hello" },
        ],
        &token,
    )
    .await;

    let response = app
        .request("GET", &format!("/api/folders/{docs}/download"), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["content-type"], "application/zip");
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename=\"Docs.zip\""
    );
    assert!(response.bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_folders_are_private_to_their_owner() {
    let app = helpers::TestApp::new().await;
    let (_, owner) = app.signed_in("Owner").await;
    let (_, intruder) = app.signed_in("Intruder").await;

    let private = create_folder(&app, &owner, "Private", None).await;

    let response = app
        .request("GET", &format!("/api/folders/{private}"), None, Some(&intruder))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request("DELETE", &format!("/api/folders/{private}"), None, Some(&intruder))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
