//! HTTP transport
//!
//! Minimal HTTP/1.1 handling on top of tokio: one request per connection,
//! JSON in and out, permissive CORS for the browser frontend.

use crate::engine::OptimizerEngine;
use crate::error::Result;
use crate::models::{AnalyzeRequest, TextToSqlRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

const MAX_REQUEST_BYTES: usize = 1024 * 1024;

pub async fn serve(engine: Arc<OptimizerEngine>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, ai_enabled = engine.ai_enabled(), "SQL Optimizer API listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let engine = Arc::clone(&engine);
        let span = tracing::info_span!("request", request_id = %Uuid::new_v4(), %peer);
        tokio::spawn(handle_connection(engine, stream).instrument(span));
    }
}

async fn handle_connection(engine: Arc<OptimizerEngine>, mut stream: TcpStream) {
    let response = match read_request(&mut stream).await {
        Ok(Some(request)) => handle_request(&engine, &request).await,
        Ok(None) => create_response(413, "Payload Too Large", &detail("request too large")),
        Err(e) => {
            error!("Failed to read from stream: {}", e);
            return;
        }
    };

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        error!("Failed to write response: {}", e);
    }
}

/// Reads headers, then as much body as `Content-Length` announces.
/// `None` if the request exceeds the size cap.
async fn read_request<R: AsyncRead + Unpin>(stream: &mut R) -> std::io::Result<Option<String>> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
        if data.len() > MAX_REQUEST_BYTES {
            return Ok(None);
        }

        if let Some(header_end) = find_header_end(&data) {
            let head = String::from_utf8_lossy(&data[..header_end]);
            let body_len = content_length(&head).unwrap_or(0);
            let total = match header_end.checked_add(4).and_then(|n| n.checked_add(body_len)) {
                Some(total) if total <= MAX_REQUEST_BYTES => total,
                _ => return Ok(None),
            };
            if data.len() >= total {
                break;
            }
        }
    }

    Ok(Some(String::from_utf8_lossy(&data).into_owned()))
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(head: &str) -> Option<usize> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Routes one raw HTTP request and returns the raw HTTP response.
pub async fn handle_request(engine: &OptimizerEngine, request: &str) -> String {
    let request_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return create_response(400, "Bad Request", &detail("malformed request line"));
    }

    let method = parts[0];
    let path = parts[1].split('?').next().unwrap_or("/");
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    let body = request
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.trim())
        .unwrap_or("");

    info!(method, path, "handling request");

    match (method, path) {
        ("GET", "/") => create_response(
            200,
            "OK",
            r#"{"status":"ok","message":"SQL Optimizer API is running"}"#,
        ),
        ("POST", "/analyze") => {
            let request: AnalyzeRequest = match parse_body(body) {
                Ok(r) => r,
                Err(response) => return response,
            };
            match engine.analyze(&request).await {
                Ok(result) => json_response(&result),
                Err(e) => unprocessable(&e.to_string()),
            }
        }
        ("POST", "/generate-sql") => {
            let request: TextToSqlRequest = match parse_body(body) {
                Ok(r) => r,
                Err(response) => return response,
            };
            match engine.generate_sql(&request).await {
                Ok(result) => json_response(&result),
                Err(e) => unprocessable(&e.to_string()),
            }
        }
        ("OPTIONS", _) => create_response(200, "OK", ""),
        _ => {
            warn!(method, path, "route not found");
            create_response(404, "Not Found", &detail(&format!("Endpoint not found: {} {}", method, path)))
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> std::result::Result<T, String> {
    serde_json::from_str(body).map_err(|e| unprocessable(&format!("Invalid request body: {}", e)))
}

fn json_response<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => create_response(200, "OK", &json),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            create_response(500, "Internal Server Error", &detail("failed to serialize response"))
        }
    }
}

fn unprocessable(message: &str) -> String {
    create_response(422, "Unprocessable Entity", &detail(message))
}

fn detail(message: &str) -> String {
    serde_json::json!({ "detail": message }).to_string()
}

fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}
