use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{DispatchError, ErrorResponse, HealthResponse, QueryRequest, QueryResponse};
use crate::utils::url::construct_api_url;

/// The two backend endpoints the client consumes.
///
/// The terminal UI and the one-shot commands talk to [`HttpBackend`]; tests
/// substitute scripted implementations.
#[async_trait]
pub trait MedAssistBackend: Send + Sync {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, DispatchError>;
    async fn health(&self) -> Result<HealthResponse, DispatchError>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// `timeout` bounds every request end to end; `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MedAssistBackend for HttpBackend {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, DispatchError> {
        let url = construct_api_url(&self.base_url, "api/query");
        debug!(%url, with_key = request.api_key.is_some(), "sending query");

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(DispatchError::malformed);
        }

        // A non-2xx without a JSON body is indistinguishable from a broken
        // proxy, so it is reported as a transport failure.
        let error: ErrorResponse =
            serde_json::from_slice(&body).map_err(DispatchError::malformed)?;
        Err(DispatchError::Application {
            status: status.as_u16(),
            message: error.error,
        })
    }

    async fn health(&self) -> Result<HealthResponse, DispatchError> {
        let url = construct_api_url(&self.base_url, "api/health");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Application {
                status: status.as_u16(),
                message: None,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(DispatchError::malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    type CapturedRequest = (String, Vec<u8>);

    async fn read_http_request(
        stream: &mut tokio::net::TcpStream,
    ) -> Result<CapturedRequest, String> {
        let mut buffer = Vec::new();
        let mut header_end = None;
        while header_end.is_none() {
            let mut chunk = [0_u8; 1024];
            let read = stream.read(&mut chunk).await.map_err(|err| err.to_string())?;
            if read == 0 {
                return Err("Unexpected EOF while reading HTTP headers".to_string());
            }
            buffer.extend_from_slice(&chunk[..read]);
            header_end = buffer
                .windows(4)
                .position(|window| window == b"\r\n\r\n")
                .map(|index| index + 4);
        }

        let header_end = header_end.expect("header end should exist");
        let header_text =
            std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
        let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
        let request_line = lines
            .next()
            .ok_or_else(|| "Missing HTTP request line".to_string())?
            .to_string();

        let mut content_length = 0_usize;
        for line in lines {
            let mut parts = line.splitn(2, ':');
            let name = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default().trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
            }
        }

        let mut body = buffer[header_end..].to_vec();
        while body.len() < content_length {
            let mut chunk = [0_u8; 1024];
            let read = stream.read(&mut chunk).await.map_err(|err| err.to_string())?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Ok((request_line, body))
    }

    /// Serves a single canned response and hands back what the client sent.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (SocketAddr, JoinHandle<Result<CapturedRequest, String>>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");

        let server_task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
            let captured = read_http_request(&mut stream).await?;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .await
                .map_err(|err| err.to_string())?;
            Ok(captured)
        });

        (addr, server_task)
    }

    fn backend_for(addr: SocketAddr) -> HttpBackend {
        HttpBackend::new(&format!("http://{addr}/"), Some(Duration::from_secs(5)))
            .expect("client should build")
    }

    #[tokio::test]
    async fn query_posts_json_and_parses_answer() {
        let (addr, server) = serve_once(
            "200 OK",
            r#"{"answer":"<p>Factor VIII deficiency.</p>","answer_raw":"Factor VIII deficiency.","sources":[{"source":"guide.pdf","page":3,"similarity":0.842,"text":"Hemophilia A"}],"question":"What is hemophilia A?"}"#,
        )
        .await;

        let response = backend_for(addr)
            .query(&QueryRequest {
                question: "What is hemophilia A?".to_string(),
                api_key: None,
            })
            .await
            .expect("query should succeed");

        assert_eq!(response.answer, "<p>Factor VIII deficiency.</p>");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].page_number(), Some(3));

        let (request_line, body) = server.await.unwrap().unwrap();
        assert_eq!(request_line, "POST /api/query HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(sent, serde_json::json!({ "question": "What is hemophilia A?" }));
    }

    #[tokio::test]
    async fn non_success_status_becomes_application_error() {
        let (addr, server) =
            serve_once("500 Internal Server Error", r#"{"error":"index unavailable"}"#).await;

        let err = backend_for(addr)
            .query(&QueryRequest {
                question: "q".to_string(),
                api_key: Some("key".to_string()),
            })
            .await
            .expect_err("query should fail");

        assert_eq!(
            err,
            DispatchError::Application {
                status: 500,
                message: Some("index unavailable".to_string()),
            }
        );

        let (_, body) = server.await.unwrap().unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(sent["api_key"], "key");
    }

    #[tokio::test]
    async fn undecodable_body_is_a_transport_error() {
        let (addr, _server) = serve_once("200 OK", "<html>gateway</html>").await;

        let err = backend_for(addr)
            .query(&QueryRequest {
                question: "q".to_string(),
                api_key: None,
            })
            .await
            .expect_err("query should fail");

        assert!(!err.is_application());
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = backend_for(addr)
            .query(&QueryRequest {
                question: "q".to_string(),
                api_key: None,
            })
            .await
            .expect_err("query should fail");

        assert!(matches!(err, DispatchError::Transport { .. }));
    }

    #[tokio::test]
    async fn silent_server_times_out_as_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_http_request(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let backend = HttpBackend::new(&format!("http://{addr}"), Some(Duration::from_millis(200)))
            .expect("client should build");
        let err = backend
            .query(&QueryRequest {
                question: "q".to_string(),
                api_key: None,
            })
            .await
            .expect_err("query should time out");

        assert!(matches!(err, DispatchError::Transport { timed_out: true, .. }));
        server.abort();
    }

    #[tokio::test]
    async fn health_reads_connection_flag() {
        let (addr, server) = serve_once(
            "200 OK",
            r#"{"status":"healthy","endee_connected":true,"indexes":1}"#,
        )
        .await;

        let health = backend_for(addr).health().await.expect("health should parse");
        assert!(health.endee_connected);
        assert_eq!(health.indexes, Some(1));

        let (request_line, _) = server.await.unwrap().unwrap();
        assert_eq!(request_line, "GET /api/health HTTP/1.1");
    }

    #[tokio::test]
    async fn health_non_success_is_an_error() {
        let (addr, _server) = serve_once("503 Service Unavailable", "{}").await;
        let err = backend_for(addr).health().await.expect_err("health should fail");
        assert!(err.is_application());
    }
}
