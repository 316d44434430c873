use std::sync::Arc;

use platforms_parser::extractor::{HttpFetcher, PlatformExtractor, SessionState};
use platforms_parser::extractor::platforms::Vimeo;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PAGE: &str = r#"<html><body><script>window.playerConfig = {"request":{"files":{"hls":{"cdns":{"akfire_interconnect_quic":{"avc_url":"https://cdn.example/42.m3u8"}}}}},"video":{"id":42,"title":"Demo","duration":120}};</script></body></html>"#;

async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = vec![0u8; 8192];
    let mut read = 0;
    loop {
        let n = stream.read(&mut buf[read..]).await.unwrap();
        read += n;
        if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buf[..read]).to_lowercase()
}

/// First response sets a cookie and withholds the config; the second one
/// serves the page only when the cookie comes back.
async fn serve_challenge(listener: TcpListener) -> Vec<String> {
    let mut requests = Vec::new();
    for _ in 0..2 {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;

        let response = if request.contains("cookie: vuid=abc") {
            format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                PAGE.len(),
                PAGE
            )
        } else {
            let body = "<html>checking</html>";
            format!(
                "HTTP/1.1 403 Forbidden\r\nset-cookie: vuid=abc; Path=/\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            )
        };
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        requests.push(request);
    }
    requests
}

#[tokio::test]
async fn cookie_challenge_over_http() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_challenge(listener));

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap();
    let session = SessionState::new();
    let vimeo = Vimeo::new(
        format!("http://{addr}/video/42"),
        "https://player.vimeo.com/",
        Arc::new(HttpFetcher::new(client)),
        session.clone(),
    );

    let descriptor = vimeo.extract().await.unwrap();
    assert_eq!(descriptor.id(), 42);
    assert_eq!(
        descriptor.preferred_stream_url(),
        Some("https://cdn.example/42.m3u8")
    );
    assert_eq!(session.get_cookie("vuid").as_deref(), Some("abc"));

    let requests = server.await.unwrap();
    assert!(requests[0].contains("referer: https://player.vimeo.com/"));
    assert!(requests[0].contains("accept: */*"));
    assert!(!requests[0].contains("cookie:"));
    assert!(requests[1].contains("cookie: vuid=abc"));
}
