mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;

use common::TestApp;
use edora_api::Settings;

const BOUNDARY: &str = "edora-test-boundary";

enum Part<'a> {
    File { name: &'a str, mime: &'a str, data: &'a [u8] },
    Text { field: &'a str, value: &'a str },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, mime, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n\
                         Content-Type: {mime}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { field, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/files/upload")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

#[tokio::test]
async fn upload_attach_and_download() {
    let app = TestApp::new().await;
    let (_, author) = app.user("author@example.com", "user").await;
    let channel_id = app.channel(&author, "photos").await;
    let post_id = app.new_post(&author, channel_id, "Holiday", "pics").await["id"]
        .as_i64()
        .unwrap();
    let post_id_text = post_id.to_string();

    let res = app
        .send(upload_request(
            &author,
            &[
                Part::Text { field: "post_id", value: &post_id_text },
                Part::File { name: "beach.png", mime: "image/png", data: b"\x89PNG fake" },
                Part::File { name: "../notes.txt", mime: "text/plain", data: b"hello" },
            ],
        ))
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let files = res.json();
    let files = files.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[1]["post_id"], post_id);
    assert_eq!(files[1]["size"], 5);
    assert_eq!(
        files[1]["sha256"],
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert!(files[1]["filename"].as_str().unwrap().ends_with("/notes.txt"));

    // Attached files show up on the post
    let (_, post) = app.get(&format!("/api/posts/{post_id}"), &author).await;
    assert_eq!(post["files"].as_array().unwrap().len(), 2);

    let file_id = files[1]["id"].as_i64().unwrap();
    let res = app
        .send(
            Request::builder()
                .uri(format!("/api/files/{file_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, b"hello");
    assert_eq!(res.headers[header::CONTENT_TYPE], "text/plain");
    let etag = res.headers[header::ETAG].clone();

    let res = app
        .send(
            Request::builder()
                .uri(format!("/api/files/{file_id}"))
                .header(header::IF_NONE_MATCH, etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_MODIFIED);

    let (status, _) = app.call("GET", "/api/files/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attaching_needs_edit_rights() {
    let app = TestApp::new().await;
    let (_, author) = app.user("author@example.com", "user").await;
    let (_, other) = app.user("other@example.com", "user").await;
    let channel_id = app.channel(&author, "private").await;
    let post_id = app.new_post(&author, channel_id, "Mine", "hands off").await["id"]
        .as_i64()
        .unwrap()
        .to_string();

    let res = app
        .send(upload_request(
            &other,
            &[
                Part::Text { field: "post_id", value: &post_id },
                Part::File { name: "x.txt", mime: "text/plain", data: b"x" },
            ],
        ))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // Unattached uploads are allowed
    let res = app
        .send(upload_request(
            &other,
            &[Part::File { name: "x.txt", mime: "text/plain", data: b"x" }],
        ))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert!(res.json()[0]["post_id"].is_null());
}

#[tokio::test]
async fn upload_limits() {
    let app = TestApp::with_settings(Settings {
        max_upload_bytes: 16,
        ..Settings::default()
    })
    .await;
    let (_, user) = app.user("user@example.com", "user").await;

    let res = app
        .send(upload_request(
            &user,
            &[Part::File { name: "big.bin", mime: "application/octet-stream", data: &[7u8; 17] }],
        ))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json(), json!({ "detail": "file too large" }));

    let many: Vec<Part<'_>> = (0..11)
        .map(|_| Part::File { name: "a.txt", mime: "text/plain", data: b"a" })
        .collect();
    let res = app.send(upload_request(&user, &many)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .send(upload_request(&user, &[Part::Text { field: "post_id", value: "" }]))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["detail"], "no files uploaded");
}
