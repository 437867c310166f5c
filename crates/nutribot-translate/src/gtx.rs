//! Client for the GTX-style translation endpoint.
//!
//! The service answers a GET with a nested JSON array: element 0 is a list of
//! `[translated, original, ...]` fragment tuples and element 2 is the detected
//! source language.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use nutribot_core::config::TranslationConfig;
use nutribot_core::types::LanguageCode;

use crate::error::TranslationError;
use crate::{Translation, TranslationClient};

/// HTTP translation client backed by `reqwest`.
pub struct GtxTranslationClient {
    endpoint: String,
    client: reqwest::Client,
}

impl GtxTranslationClient {
    /// Create a client from the translation section of the config.
    pub fn new(config: &TranslationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint: config.endpoint.clone(),
            client,
        }
    }
}

#[async_trait]
impl TranslationClient for GtxTranslationClient {
    async fn translate(
        &self,
        text: &str,
        target: &LanguageCode,
        source_hint: Option<&LanguageCode>,
    ) -> Result<Translation, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyInput);
        }

        let source = source_hint.map(|c| c.as_str()).unwrap_or("auto");
        tracing::debug!(
            source,
            target = %target,
            text_len = text.len(),
            "Requesting translation"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslationError::Malformed(e.to_string()))?;

        let fallback = source_hint.cloned().unwrap_or_else(|| target.clone());
        parse_response(&body, fallback)
    }
}

/// Extract the translation from a GTX response body.
///
/// Only the first element of each fragment tuple is used, concatenated in
/// order with no separator. `fallback_source` is reported when the body
/// carries no usable detected language.
pub fn parse_response(
    body: &Value,
    fallback_source: LanguageCode,
) -> Result<Translation, TranslationError> {
    let top = body
        .as_array()
        .ok_or_else(|| TranslationError::Malformed("expected a top-level array".to_string()))?;

    let fragments = top
        .first()
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::Malformed("missing fragment list".to_string()))?;

    let text: String = fragments
        .iter()
        .filter_map(|fragment| fragment.as_array()?.first()?.as_str())
        .collect();

    if text.is_empty() {
        return Err(TranslationError::Malformed(
            "fragment list produced no text".to_string(),
        ));
    }

    let detected_source = top
        .get(2)
        .and_then(Value::as_str)
        .and_then(|code| LanguageCode::new(code).ok())
        .unwrap_or(fallback_source);

    Ok(Translation {
        text,
        detected_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answer one HTTP request on a local port with a canned response.
    /// The join handle yields the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            request
        });
        (format!("http://{}", addr), handle)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn en() -> LanguageCode {
        LanguageCode::canonical()
    }

    #[test]
    fn test_parse_concatenates_fragments_in_order() {
        let body = json!([
            [
                ["Suggest a ", "एक सुझाव", null, null, 10],
                ["high protein lunch.", "उच्च प्रोटीन", null, null, 10]
            ],
            null,
            "hi"
        ]);
        let translation = parse_response(&body, en()).unwrap();
        assert_eq!(translation.text, "Suggest a high protein lunch.");
        assert_eq!(translation.detected_source.as_str(), "hi");
    }

    #[test]
    fn test_parse_skips_fragments_without_text() {
        let body = json!([[["Eat ", "x"], [null, "y"], ["oats.", "z"]], null, "te"]);
        let translation = parse_response(&body, en()).unwrap();
        assert_eq!(translation.text, "Eat oats.");
    }

    #[test]
    fn test_parse_falls_back_to_hint_when_detection_missing() {
        let body = json!([[["Hola", "Hello"]]]);
        let hint = LanguageCode::new("te").unwrap();
        let translation = parse_response(&body, hint.clone()).unwrap();
        assert_eq!(translation.detected_source, hint);
    }

    #[test]
    fn test_parse_ignores_invalid_detected_code() {
        let body = json!([[["ok", "ok"]], null, "not a code"]);
        let translation = parse_response(&body, en()).unwrap();
        assert_eq!(translation.detected_source, en());
    }

    #[test]
    fn test_parse_rejects_non_array_body() {
        let err = parse_response(&json!({"error": "quota"}), en()).unwrap_err();
        assert!(matches!(err, TranslationError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_missing_fragment_list() {
        let err = parse_response(&json!([null, null, "en"]), en()).unwrap_err();
        assert!(matches!(err, TranslationError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_empty_translation() {
        let err = parse_response(&json!([[], null, "en"]), en()).unwrap_err();
        assert!(matches!(err, TranslationError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_network() {
        let config = TranslationConfig {
            endpoint: "http://127.0.0.1:9/unreachable".to_string(),
            ..TranslationConfig::default()
        };
        let client = GtxTranslationClient::new(&config);
        let err = client.translate("   ", &en(), None).await.unwrap_err();
        assert_eq!(err, TranslationError::EmptyInput);
    }

    fn client_for(base_url: String) -> GtxTranslationClient {
        GtxTranslationClient::new(&TranslationConfig {
            endpoint: format!("{}/translate_a/single", base_url),
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let (url, server) = serve_once("503 Service Unavailable", "").await;
        let err = client_for(url).translate("namaste", &en(), None).await.unwrap_err();
        assert_eq!(err, TranslationError::Status(503));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let (url, server) = serve_once("200 OK", "<html>quota exceeded</html>").await;
        let err = client_for(url).translate("namaste", &en(), None).await.unwrap_err();
        assert!(matches!(err, TranslationError::Malformed(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_auto_detect_request_and_response() {
        let (url, server) = serve_once("200 OK", r#"[[["Hello","नमस्ते",null,null,10]],null,"hi"]"#).await;
        let translation = client_for(url).translate("नमस्ते", &en(), None).await.unwrap();
        assert_eq!(translation.text, "Hello");
        assert_eq!(translation.detected_source.as_str(), "hi");

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /translate_a/single?"));
        assert!(request_line.contains("client=gtx"));
        assert!(request_line.contains("sl=auto"));
        assert!(request_line.contains("tl=en"));
        assert!(request_line.contains("dt=t"));
    }
}
