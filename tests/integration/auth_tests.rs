//! Authorization integration tests.
//!
//! Tests verify:
//! - Valid signed URLs work for the method they were issued for
//! - Tampered, expired and too-distant signatures are rejected
//! - Unknown, duplicated and missing parameters are rejected
//! - Unsafe and reserved paths are rejected before touching the disk

use axum::body::Body;
use axum::http::{Request, StatusCode};

use fsgate::{SignedMethod, MAX_SIGNATURE_TTL};

use super::test_utils::{assert_forbidden, TestGateway};

fn get_request(uri: String) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn put_request(uri: String) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .body(Body::from("data"))
        .unwrap()
}

/// Flip the first hex digit of a signature.
fn tamper(signature: &str) -> String {
    let first = if signature.starts_with('0') { '1' } else { '0' };
    format!("{}{}", first, &signature[1..])
}

// =============================================================================
// Valid Signatures
// =============================================================================

#[tokio::test]
async fn test_valid_signature_succeeds() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("hello.txt"), b"hello").unwrap();

    let response = gateway.get("/hello.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signature_is_bound_to_method() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("hello.txt"), b"hello").unwrap();

    // A download URL must not authorize an upload, and vice versa.
    let get_uri = gateway.signed_uri(SignedMethod::Get, "/new.txt");
    assert_forbidden(gateway.send(put_request(get_uri)).await).await;

    let put_uri = gateway.signed_uri(SignedMethod::Put, "/hello.txt");
    assert_forbidden(gateway.send(get_request(put_uri)).await).await;

    assert!(!gateway.root().join("new.txt").exists());
}

#[tokio::test]
async fn test_signature_is_bound_to_path() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("secret.txt"), b"hidden").unwrap();

    let (signature, expires) = gateway.signer().sign_with_ttl(
        SignedMethod::Get,
        "/public.txt",
        std::time::Duration::from_secs(60),
    );
    let uri = format!("/secret.txt?signature={}&expires={}", signature, expires);

    assert_forbidden(gateway.send(get_request(uri)).await).await;
}

// =============================================================================
// Invalid Signatures
// =============================================================================

#[tokio::test]
async fn test_tampered_signature_rejected_for_both_methods() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("test.txt"), b"content").unwrap();
    let expires = fsgate::auth::unix_now() + 60;

    let signature = gateway.signer().sign(SignedMethod::Get, "/test.txt", expires);
    let uri = format!("/test.txt?signature={}&expires={}", tamper(&signature), expires);
    assert_forbidden(gateway.send(get_request(uri)).await).await;

    let signature = gateway.signer().sign(SignedMethod::Put, "/fresh.txt", expires);
    let uri = format!("/fresh.txt?signature={}&expires={}", tamper(&signature), expires);
    assert_forbidden(gateway.send(put_request(uri)).await).await;
    assert!(!gateway.root().join("fresh.txt").exists());
}

#[tokio::test]
async fn test_short_signature_rejected() {
    let gateway = TestGateway::new();
    let expires = fsgate::auth::unix_now() + 60;
    let signature = gateway.signer().sign(SignedMethod::Get, "/test.txt", expires);

    let uri = format!("/test.txt?signature={}&expires={}", &signature[..32], expires);
    assert_forbidden(gateway.send(get_request(uri)).await).await;
}

#[tokio::test]
async fn test_signature_from_other_secret_rejected() {
    let gateway = TestGateway::new();
    let other = fsgate::UrlSigner::new("some-other-secret");
    let expires = fsgate::auth::unix_now() + 60;
    let signature = other.sign(SignedMethod::Get, "/test.txt", expires);

    let uri = format!("/test.txt?signature={}&expires={}", signature, expires);
    assert_forbidden(gateway.send(get_request(uri)).await).await;
}

// =============================================================================
// Expiry
// =============================================================================

#[tokio::test]
async fn test_expired_signature_rejected() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("test.txt"), b"content").unwrap();

    let expires = fsgate::auth::unix_now() - 10;
    let signature = gateway.signer().sign(SignedMethod::Get, "/test.txt", expires);
    let uri = format!("/test.txt?signature={}&expires={}", signature, expires);

    assert_forbidden(gateway.send(get_request(uri)).await).await;
}

#[tokio::test]
async fn test_expiry_too_far_in_future_rejected() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("test.txt"), b"content").unwrap();

    let expires = fsgate::auth::unix_now() + MAX_SIGNATURE_TTL.as_secs() + 3600;
    let signature = gateway.signer().sign(SignedMethod::Get, "/test.txt", expires);
    let uri = format!("/test.txt?signature={}&expires={}", signature, expires);

    assert_forbidden(gateway.send(get_request(uri)).await).await;
}

#[tokio::test]
async fn test_non_numeric_expiry_rejected() {
    let gateway = TestGateway::new();
    let signature = gateway.signer().sign(SignedMethod::Get, "/test.txt", 0);

    let uri = format!("/test.txt?signature={}&expires=tomorrow", signature);
    assert_forbidden(gateway.send(get_request(uri)).await).await;
}

// =============================================================================
// Query Parameters
// =============================================================================

#[tokio::test]
async fn test_missing_parameters_rejected() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("test.txt"), b"content").unwrap();
    let expires = fsgate::auth::unix_now() + 60;
    let signature = gateway.signer().sign(SignedMethod::Get, "/test.txt", expires);

    let uris = [
        "/test.txt".to_string(),
        format!("/test.txt?signature={}", signature),
        format!("/test.txt?expires={}", expires),
        format!("/test.txt?signature=&expires={}", expires),
        format!("/test.txt?signature={}&expires=", signature),
    ];

    for uri in uris {
        assert_forbidden(gateway.send(get_request(uri)).await).await;
    }
}

#[tokio::test]
async fn test_extra_parameter_rejected() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("test.txt"), b"content").unwrap();

    let uri = format!("{}&download=1", gateway.signed_uri(SignedMethod::Get, "/test.txt"));
    assert_forbidden(gateway.send(get_request(uri)).await).await;
}

#[tokio::test]
async fn test_duplicate_parameter_rejected() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("test.txt"), b"content").unwrap();
    let expires = fsgate::auth::unix_now() + 60;
    let signature = gateway.signer().sign(SignedMethod::Get, "/test.txt", expires);

    let uri = format!(
        "/test.txt?signature={}&expires={}&expires={}",
        signature, expires, expires
    );
    assert_forbidden(gateway.send(get_request(uri)).await).await;
}

// =============================================================================
// Paths and Methods
// =============================================================================

#[tokio::test]
async fn test_unsafe_paths_rejected() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("test.txt"), b"content").unwrap();

    // Each path is signed correctly, so only the path check can reject it.
    let paths = [
        "/a/../test.txt",
        "/./test.txt",
        "/%252e%252e/test.txt",
        "/a//test.txt",
        "/file%20name.txt",
        "/caf%C3%A9.txt",
    ];

    for path in paths {
        let decoded = urlencoding::decode(path).unwrap().into_owned();
        let (signature, expires) = gateway.signer().sign_with_ttl(
            SignedMethod::Get,
            &decoded,
            std::time::Duration::from_secs(60),
        );
        let uri = format!("{}?signature={}&expires={}", path, signature, expires);
        assert_forbidden(gateway.send(get_request(uri)).await).await;
    }
}

#[tokio::test]
async fn test_reserved_directory_rejected() {
    let gateway = TestGateway::new();

    let uri = gateway.signed_uri(SignedMethod::Put, "/.fsgate/uploads/x.tmp");
    assert_forbidden(gateway.send(put_request(uri)).await).await;

    let uri = gateway.signed_uri(SignedMethod::Get, "/.fsgate");
    assert_forbidden(gateway.send(get_request(uri)).await).await;
}

#[tokio::test]
async fn test_root_path_rejected() {
    let gateway = TestGateway::new();

    let uri = gateway.signed_uri(SignedMethod::Get, "/");
    assert_forbidden(gateway.send(get_request(uri)).await).await;

    let uri = gateway.signed_uri(SignedMethod::Put, "/");
    assert_forbidden(gateway.send(put_request(uri)).await).await;
}

#[tokio::test]
async fn test_head_request_rejected() {
    let gateway = TestGateway::new();
    std::fs::write(gateway.root().join("test.txt"), b"content").unwrap();

    let request = Request::builder()
        .method("HEAD")
        .uri(gateway.signed_uri(SignedMethod::Get, "/test.txt"))
        .body(Body::empty())
        .unwrap();

    let response = gateway.send(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
