mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use common::{MAX_UPLOAD_BYTES, TestApp, json_body};
use serde_json::Value;

const BOUNDARY: &str = "asb-test-boundary";

fn multipart(field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn upload(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.send(request).await;
    let status = response.status();
    (status, json_body(response).await)
}

#[tokio::test]
async fn test_upload_and_download() {
    let app = TestApp::new().await;
    let pdf = b"%PDF-1.7 permission slip";

    let (status, file) = upload(
        &app,
        multipart("file", "permission slip.pdf", "application/pdf", pdf),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{file}");
    assert_eq!(file["original_name"], "permission slip.pdf");
    assert_eq!(file["size"], pdf.len());
    let id = file["id"].as_str().unwrap();

    let response = app
        .send(
            Request::builder()
                .uri(format!("/api/uploads/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], pdf);
}

#[tokio::test]
async fn test_upload_rejections() {
    let app = TestApp::new().await;

    let (status, _) = upload(&app, multipart("file", "notes.txt", "text/plain", b"hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = upload(&app, multipart("avatar", "me.png", "image/png", b"png")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("`file`"));

    let oversized = vec![0u8; MAX_UPLOAD_BYTES + 1];
    let (status, _) = upload(&app, multipart("file", "big.png", "image/png", &oversized)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    assert_eq!(
        std::fs::read_dir(app.upload_dir.path()).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn test_admin_manages_uploads() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let (_, file) = upload(&app, multipart("file", "poster.png", "image/png", b"\x89PNG")).await;
    let id = file["id"].as_str().unwrap();

    let (status, files) = app
        .admin(&cookie, Method::GET, "/api/admin/uploads", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(files.as_array().unwrap().len(), 1);

    let (status, _) = app
        .admin(
            &cookie,
            Method::DELETE,
            &format!("/api/admin/uploads/{id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/uploads/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
