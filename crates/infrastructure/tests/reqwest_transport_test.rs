//! Integration tests for the reqwest transport against local sockets
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use gatekeep_application::ports::{HttpTransport, OutboundRequest, TransportError};
use gatekeep_domain::HttpMethod;
use gatekeep_infrastructure::ReqwestTransport;
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;
use uuid::Uuid;

fn request(url: &str, timeout: Duration) -> OutboundRequest {
    OutboundRequest {
        request_id: Uuid::now_v7(),
        method: HttpMethod::Post,
        url: Url::parse(url).unwrap(),
        headers: vec![
            ("Authorization".to_string(), "Bearer abc".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ],
        body: Some(br#"{"name":"x"}"#.to_vec()),
        timeout,
    }
}

/// Serves one connection with a fixed response and returns what it read.
async fn serve_once(listener: TcpListener, response: &'static str) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut buffer = vec![0_u8; 8192];
    let mut received = Vec::new();
    loop {
        let read = socket.read(&mut buffer).await.unwrap();
        received.extend_from_slice(&buffer[..read]);
        let text = String::from_utf8_lossy(&received);
        if read == 0 || (text.contains("\r\n\r\n") && text.ends_with(r#"{"name":"x"}"#)) {
            break;
        }
    }
    socket.write_all(response.as_bytes()).await.unwrap();
    socket.shutdown().await.unwrap();
    String::from_utf8_lossy(&received).into_owned()
}

#[tokio::test]
async fn test_sends_headers_and_body_and_reads_response() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/items", listener.local_addr().unwrap());
    let server = tokio::spawn(serve_once(
        listener,
        "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nX-CSRF-Token: csrf-2\r\nContent-Length: 8\r\nConnection: close\r\n\r\n{\"id\":1}",
    ));

    let transport = ReqwestTransport::new().unwrap();
    let response = transport
        .send(&request(&url, Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 201);
    assert_eq!(response.header("x-csrf-token"), Some("csrf-2"));
    assert_eq!(response.text(), r#"{"id":1}"#);

    let received = server.await.unwrap().to_lowercase();
    assert!(received.starts_with("post /api/items http/1.1"));
    assert!(received.contains("authorization: bearer abc"));
    assert!(received.contains("user-agent: gatekeep/"));
}

#[tokio::test]
async fn test_error_status_is_a_response() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/items", listener.local_addr().unwrap());
    let server = tokio::spawn(serve_once(
        listener,
        "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    ));

    let response = ReqwestTransport::new()
        .unwrap()
        .send(&request(&url, Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 401);
    server.await.unwrap();
}

#[tokio::test]
async fn test_refused_connection_is_transient() {
    // Bind then drop to find a port nothing listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{port}/api/items");

    let error = ReqwestTransport::new()
        .unwrap()
        .send(&request(&url, Duration::from_secs(5)))
        .await
        .unwrap_err();

    assert!(error.is_transient(), "unexpected error: {error:?}");
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/slow", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    let error = ReqwestTransport::new()
        .unwrap()
        .send(&request(&url, Duration::from_millis(200)))
        .await
        .unwrap_err();

    assert_eq!(error, TransportError::Timeout { timeout_ms: 200 });
    assert!(error.is_transient());
    server.abort();
}
