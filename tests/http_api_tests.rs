// Integration tests for the HTTP API
//
// The router is driven in-process with tower's `oneshot`, no socket needed.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use pcm_ingest::{create_router, Ack, AppState, FileSink, IngestOptions, IngestService, IngestStatus};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_router(dir: &TempDir) -> Result<(Router, Arc<IngestService>)> {
    let sink = FileSink::new(dir.path()).await?;
    let service = Arc::new(IngestService::new(IngestOptions::default(), Arc::new(sink)).await?);
    let router = create_router(AppState::new(Arc::clone(&service)));
    Ok((router, service))
}

async fn send(router: &Router, request: Request<Body>) -> Result<(StatusCode, Vec<u8>)> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, body.to_vec()))
}

async fn post_chunk(router: &Router, chunk: Vec<u8>) -> Result<(StatusCode, Ack)> {
    let request = Request::builder()
        .method("POST")
        .uri("/api")
        .header("content-type", "application/octet-stream")
        .body(Body::from(chunk))?;

    let (status, body) = send(router, request).await?;
    Ok((status, serde_json::from_slice(&body)?))
}

#[tokio::test]
async fn test_post_chunks_until_file_written() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (router, _service) = test_router(&temp_dir).await?;

    for i in 1..5 {
        let (status, ack) = post_chunk(&router, vec![0u8; 320]).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack.status, "success");
        assert_eq!(ack.message, format!("Data received ({} chunks pending)", i));
        assert!(ack.sequence.is_none());
        assert!(ack.file.is_none());
    }

    let (status, ack) = post_chunk(&router, vec![0u8; 320]).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack.status, "success");
    assert_eq!(ack.sequence, Some(1));
    assert_eq!(ack.file.as_deref(), Some("output1.wav"));

    let written = std::fs::read(temp_dir.path().join("output1.wav"))?;
    assert_eq!(written.len(), 44 + 5 * 320);

    Ok(())
}

#[tokio::test]
async fn test_empty_body_counts_as_chunk() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (router, service) = test_router(&temp_dir).await?;

    let (status, ack) = post_chunk(&router, Vec::new()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack.status, "success");
    assert_eq!(service.status().await.pending_chunks, 1);

    Ok(())
}

#[tokio::test]
async fn test_other_methods_are_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (router, service) = test_router(&temp_dir).await?;

    for method in ["GET", "PUT", "DELETE"] {
        let request = Request::builder().method(method).uri("/api").body(Body::empty())?;
        let (status, body) = send(&router, request).await?;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{} /api", method);
        let ack: Ack = serde_json::from_slice(&body)?;
        assert_eq!(ack.status, "error");
        assert_eq!(ack.message, "Only POST method is supported");
    }

    assert_eq!(
        service.status().await.chunks_received,
        0,
        "Rejected requests are not accumulated"
    );

    Ok(())
}

#[tokio::test]
async fn test_wrong_method_on_read_routes_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (router, _service) = test_router(&temp_dir).await?;

    for (method, uri) in [
        ("POST", "/api/status"),
        ("DELETE", "/api/status"),
        ("POST", "/health"),
        ("PUT", "/health"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(vec![1u8, 2, 3]))?;
        let (status, body) = send(&router, request).await?;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{} {}", method, uri);
        let ack: Ack = serde_json::from_slice(&body)?;
        assert_eq!(ack.status, "error");
        assert_eq!(ack.message, "Only POST method is supported");
    }

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (router, _service) = test_router(&temp_dir).await?;

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .body(Body::from(vec![1u8, 2, 3]))?;
    let (status, body) = send(&router, request).await?;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let ack: Ack = serde_json::from_slice(&body)?;
    assert_eq!(ack.status, "error");

    Ok(())
}

#[tokio::test]
async fn test_write_failure_returns_500() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (router, service) = test_router(&temp_dir).await?;

    // Something else takes the name of the first artifact after startup
    std::fs::write(temp_dir.path().join("output1.wav"), b"occupied")?;

    for _ in 0..4 {
        post_chunk(&router, vec![1u8; 10]).await?;
    }
    let (status, ack) = post_chunk(&router, vec![1u8; 10]).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ack.status, "error");
    assert!(ack.message.contains("output1.wav"), "message: {}", ack.message);
    assert_eq!(std::fs::read(temp_dir.path().join("output1.wav"))?, b"occupied");

    // A name collision can never succeed, so nothing is retained
    let stats = service.status().await;
    assert_eq!(stats.write_failures, 1);
    assert_eq!(stats.retained_artifacts, 0);
    assert_eq!(stats.next_sequence, 2);

    Ok(())
}

#[tokio::test]
async fn test_status_endpoint() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (router, _service) = test_router(&temp_dir).await?;

    for _ in 0..7 {
        post_chunk(&router, vec![0u8; 100]).await?;
    }

    let request = Request::builder().uri("/api/status").body(Body::empty())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);

    let stats: IngestStatus = serde_json::from_slice(&body)?;
    assert_eq!(stats.threshold, 5);
    assert_eq!(stats.pending_chunks, 2);
    assert_eq!(stats.pending_bytes, 200);
    assert_eq!(stats.next_sequence, 2);
    assert_eq!(stats.chunks_received, 7);
    assert_eq!(stats.bytes_received, 700);
    assert_eq!(stats.files_written, 1);
    assert_eq!(stats.write_failures, 0);

    Ok(())
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (router, _service) = test_router(&temp_dir).await?;

    let request = Request::builder().uri("/health").body(Body::empty())?;
    let (status, body) = send(&router, request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    Ok(())
}

#[tokio::test]
async fn test_body_limit() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let sink = FileSink::new(temp_dir.path()).await?;
    let service = Arc::new(IngestService::new(IngestOptions::default(), Arc::new(sink)).await?);
    let router = create_router(AppState::new(Arc::clone(&service)).with_max_body_bytes(64));

    let request = Request::builder()
        .method("POST")
        .uri("/api")
        .body(Body::from(vec![0u8; 1024]))?;
    let (status, body) = send(&router, request).await?;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let ack: Ack = serde_json::from_slice(&body)?;
    assert_eq!(ack.status, "error");
    assert!(ack.message.contains("length limit"), "message: {}", ack.message);
    assert_eq!(service.status().await.chunks_received, 0);

    Ok(())
}
