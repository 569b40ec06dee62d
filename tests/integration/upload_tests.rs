//! Upload integration tests.
//!
//! Tests verify:
//! - Uploads are write-once and never replace an existing file
//! - Concurrent uploads to one path publish exactly one body
//! - Aborted bodies leave nothing at the destination or in staging
//! - A file standing in for a parent directory is a conflict, not a failure

use std::io;

use axum::body::Body;
use axum::http::StatusCode;
use bytes::Bytes;

use super::test_utils::{body_bytes, payload, TestGateway};

#[tokio::test]
async fn test_upload_stores_file() {
    let gateway = TestGateway::new();

    let response = gateway.put("/notes.txt", "some notes").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    assert_eq!(&body[..], b"Stored /notes.txt (10 bytes)\n");
    assert_eq!(
        std::fs::read(gateway.root().join("notes.txt")).unwrap(),
        b"some notes"
    );
    assert_eq!(gateway.staged_count(), 0);
}

#[tokio::test]
async fn test_empty_upload_creates_empty_file() {
    let gateway = TestGateway::new();

    let response = gateway.put("/empty.txt", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        std::fs::metadata(gateway.root().join("empty.txt")).unwrap().len(),
        0
    );
}

#[tokio::test]
async fn test_existing_file_is_not_overwritten() {
    let gateway = TestGateway::new();

    let response = gateway.put("/report.txt", "original").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = gateway.put("/report.txt", "replacement").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    assert_eq!(
        std::fs::read(gateway.root().join("report.txt")).unwrap(),
        b"original"
    );
    assert_eq!(gateway.staged_count(), 0);
}

#[tokio::test]
async fn test_concurrent_uploads_publish_once() {
    let gateway = TestGateway::new();
    let first = payload(64 * 1024);
    let second = vec![0xAB; 64 * 1024];

    let (a, b) = tokio::join!(
        gateway.put("/race.bin", first.clone()),
        gateway.put("/race.bin", second.clone()),
    );

    let mut statuses = [a.status(), b.status()];
    statuses.sort_by_key(|s| s.as_u16());
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let stored = std::fs::read(gateway.root().join("race.bin")).unwrap();
    assert!(stored == first || stored == second);
    assert_eq!(gateway.staged_count(), 0);
}

#[tokio::test]
async fn test_aborted_body_leaves_nothing_behind() {
    let gateway = TestGateway::new();

    let chunks: Vec<Result<Bytes, io::Error>> = vec![
        Ok(Bytes::from(payload(4096))),
        Ok(Bytes::from(payload(4096))),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
    ];
    let body = Body::from_stream(futures::stream::iter(chunks));

    let response = gateway.put("/partial.bin", body).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert!(!gateway.root().join("partial.bin").exists());
    assert_eq!(gateway.staged_count(), 0);
}

#[tokio::test]
async fn test_trailing_slash_upload_stores_file() {
    let gateway = TestGateway::new();

    let response = gateway.put("/a.txt/", "alpha").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read(gateway.root().join("a.txt")).unwrap(), b"alpha");

    let response = gateway.get("/a.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"alpha");
}

#[tokio::test]
async fn test_upload_below_regular_file_conflicts() {
    let gateway = TestGateway::new();

    let response = gateway.put("/file.txt", "data").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = gateway.put("/file.txt/child.txt", "nested").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = gateway.put("/file.txt/deeper/child.txt", "nested").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    assert_eq!(std::fs::read(gateway.root().join("file.txt")).unwrap(), b"data");
    assert_eq!(gateway.staged_count(), 0);
}

#[tokio::test]
async fn test_staging_area_is_not_downloadable() {
    let gateway = TestGateway::new();

    let response = gateway.put("/visible.txt", "data").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(gateway.staging_dir().is_dir());

    let response = gateway.get("/.fsgate/uploads").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
