//! Integration tests for search and listing endpoints.

mod helpers;

use axum::http::StatusCode;
use helpers::Part;
use serde_json::{Value, json};

fn names(list: &Value) -> Vec<String> {
    let mut names: Vec<String> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

async fn seed(app: &helpers::TestApp, token: &str) -> (String, String) {
    let work = app
        .request("POST", "/api/folders", Some(json!({ "name": "Work" })), Some(token))
        .await;
    let work = work.data()["id"].as_str().unwrap().to_string();

    let reports = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "Reports", "parent_folder_id": work })),
            Some(token),
        )
        .await;
    let reports = reports.data()["id"].as_str().unwrap().to_string();

    app.upload(
        "/api/files/upload",
        &[
            Part::Text { name: "parent_folder_id", value: &reports },
            Part::File { filename: "report-q1.pdf", data: b"q1" },
        ],
        token,
    )
    .await;
    app.upload(
        "/api/files/upload",
        &[Part::File { filename: "report-home.txt", data: b"home" }],
        token,
    )
    .await;

    (work, reports)
}

#[tokio::test]
async fn test_keyword_search_is_case_insensitive() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    seed(&app, &token).await;

    let response = app
        .request("GET", "/api/search?keyword=REPORT", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(names(&response.data()["folders"]), vec!["Reports"]);
    assert_eq!(
        names(&response.data()["files"]),
        vec!["report-home", "report-q1"]
    );
}

#[tokio::test]
async fn test_search_scoped_to_subtree() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let (work, _) = seed(&app, &token).await;

    let response = app
        .request(
            "GET",
            &format!("/api/search?keyword=report&parent_folder_id={work}"),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(names(&response.data()["folders"]), vec!["Reports"]);
    assert_eq!(names(&response.data()["files"]), vec!["report-q1"]);
}

#[tokio::test]
async fn test_blank_keyword_returns_nothing() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    seed(&app, &token).await;

    let response = app
        .request("GET", "/api/search?keyword=", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.data()["folders"].as_array().unwrap().is_empty());
    assert!(response.data()["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_children_of_root_and_folder() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let (work, _) = seed(&app, &token).await;

    let root = app.request("GET", "/api/search/list", None, Some(&token)).await;
    assert_eq!(names(&root.data()["folders"]), vec!["Work"]);
    assert_eq!(names(&root.data()["files"]), vec!["report-home"]);

    let inside = app
        .request(
            "GET",
            &format!("/api/search/list?parent_folder_id={work}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(names(&inside.data()["folders"]), vec!["Reports"]);
    assert!(inside.data()["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_and_contextual_listings() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.signed_in("Ada").await;
    let (_, reports) = seed(&app, &token).await;

    app.request("DELETE", &format!("/api/folders/{reports}"), None, Some(&token))
        .await;

    let deleted = app
        .request("GET", "/api/search/deleted", None, Some(&token))
        .await;
    assert_eq!(names(&deleted.data()["folders"]), vec!["Reports"]);
    assert_eq!(names(&deleted.data()["files"]), vec!["report-q1"]);

    let contextual = app
        .request(
            "GET",
            "/api/search/contextual?deleted_only=true",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(contextual.body["data"], deleted.body["data"]);

    let all = app.request("GET", "/api/search/all", None, Some(&token)).await;
    assert_eq!(names(&all.data()["folders"]), vec!["Work"]);
    assert_eq!(names(&all.data()["files"]), vec!["report-home"]);

    let deleted_search = app
        .request(
            "GET",
            "/api/search?keyword=q1&deleted_only=true",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(names(&deleted_search.data()["files"]), vec!["report-q1"]);
}

#[tokio::test]
async fn test_search_requires_authentication() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/search?keyword=x", None, None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
