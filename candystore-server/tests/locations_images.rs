mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::TestApp;
use serde_json::json;

const BOUNDARY: &str = "candystore-test-boundary";

fn multipart(image_id: Option<&str>, file: Option<(&str, &str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(id) = image_id {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image_id\"\r\n\r\n{id}\r\n")
                .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload-image")
        .header("Content-Type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn index_and_health() {
    let app = TestApp::new();

    let (status, index) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(index["name"], "candystore-server");

    let (status, health) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health, json!({ "status": "ok" }));
}

#[tokio::test]
async fn posted_location_is_returned_as_latest() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            "POST",
            "/post-location",
            Some(json!({ "email": "kid@example.com", "latitude": 33.91, "longitude": -98.49 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Location posted successfully");

    app.send(
        "POST",
        "/post-location",
        Some(json!({
            "email": "kid@example.com",
            "latitude": 33.95,
            "longitude": -98.50,
            "timestamp": "2026-01-02T03:04:05Z",
        })),
    )
    .await;

    let (status, latest) = app.get("/location/kid@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["latitude"], 33.95);
    assert_eq!(latest["timestamp"], "2026-01-02T03:04:05.000Z");

    let (_, all) = app.get("/locations").await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, body) = app.get("/location/nobody@example.com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No locations found for this email");
}

#[tokio::test]
async fn radius_search() {
    let app = TestApp::new();
    for (email, latitude, longitude) in [
        ("a@example.com", 33.9137, -98.4934),
        ("b@example.com", 32.7767, -96.7970),
    ] {
        app.send(
            "POST",
            "/post-location",
            Some(json!({ "email": email, "latitude": latitude, "longitude": longitude })),
        )
        .await;
    }

    let (status, hits) = app
        .get("/locations/within-radius?latitude=33.9&longitude=-98.5&radius=50")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["email"], "a@example.com");
    assert!(hits[0]["distance_km"].is_number());

    let (status, body) = app
        .get("/locations/within-radius?latitude=0&longitude=0&radius=10")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No locations found within the specified radius");

    let (status, _) = app
        .get("/locations/within-radius?latitude=120&longitude=0&radius=10")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_and_fetch_image() {
    let app = TestApp::new();
    let png: &[u8] = &[0x89, b'P', b'N', b'G', 1, 2, 3];

    let (status, body, _) = app
        .request(multipart(Some("logo"), Some(("logo.png", "image/png", png))))
        .await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "message": "Image uploaded successfully", "image_id": "logo" }));

    let (status, bytes, content_type) = app
        .request(Request::builder().uri("/images/logo").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, png);
    assert_eq!(content_type.as_deref(), Some("image/png"));

    let (_, listed) = app.get("/images").await;
    assert_eq!(listed["result_size"], 1);
    assert_eq!(listed["data"][0]["_id"], "logo");
    assert!(listed["data"][0].get("data").is_none());
}

#[tokio::test]
async fn upload_generates_ids_and_rejects_duplicates() {
    let app = TestApp::new();

    let (status, body, _) = app
        .request(multipart(None, Some(("a.jpg", "image/jpeg", &b"jpeg"[..]))))
        .await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let generated = body["image_id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let (status, _, _) = app
        .request(multipart(Some(generated), Some(("b.jpg", "image/jpeg", &b"again"[..]))))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = app.request(multipart(Some("no-file"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_image_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.get("/images/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Image not found in the database.");
}
