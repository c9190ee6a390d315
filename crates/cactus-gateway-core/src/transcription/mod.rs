//! Audio transcription through the Gemini API

mod gemini;

pub use gemini::{first_candidate_text, GenerateContentRequest};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{TranscriptionConfig, GEMINI_API_KEY_VAR};
use crate::error::{Error, Result};
use crate::types::{TranscribeRequest, TranscribeResponse};

/// Accepts audio with or without trailing `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub struct TranscriptionService {
    client: reqwest::Client,
    config: TranscriptionConfig,
}

impl TranscriptionService {
    pub fn new(config: TranscriptionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            warn!(
                "{} not set, transcription requests will be refused",
                GEMINI_API_KEY_VAR
            );
        }

        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn transcribe(&self, request: TranscribeRequest) -> Result<TranscribeResponse> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            Error::Config(format!("{} environment variable not set", GEMINI_API_KEY_VAR))
        })?;

        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let audio = audio_payload(&request.audio_base64)?;
        info!(
            "Transcription request {}: {} base64 chars of {}",
            request_id,
            audio.len(),
            request.audio_mime_type
        );

        let body = GenerateContentRequest::audio_prompt(
            request.effective_prompt(),
            &request.audio_mime_type,
            &audio,
            self.config.max_output_tokens,
        );
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "Transcription request {} rejected by Gemini: {}",
                request_id, status
            );
            return Err(Error::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;
        let text = first_candidate_text(&payload);
        let total_time_in_ms = started.elapsed().as_secs_f64() * 1000.0;

        info!(
            "Transcription request {} finished in {:.0}ms ({} chars)",
            request_id,
            total_time_in_ms,
            text.len()
        );

        Ok(TranscribeResponse {
            confidence: if text.is_empty() { 0.0 } else { 1.0 },
            text,
            total_time_in_ms,
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Transcription(format!(
                "Gemini request timed out after {}s",
                self.config.timeout.as_secs_f64()
            ))
        } else {
            Error::Transcription(error.to_string())
        }
    }
}

/// Base64 audio with any `data:<mime>;base64,` prefix removed, re-encoded
/// as padded standard base64. Line breaks, missing padding and the URL-safe
/// alphabet are accepted.
fn audio_payload(audio_base64: &str) -> Result<String> {
    let payload = match audio_base64.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => audio_base64,
    };
    let normalized: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();

    if normalized.is_empty() {
        return Err(Error::Validation("audioBase64 must not be empty".to_string()));
    }
    let audio = LENIENT
        .decode(&normalized)
        .map_err(|e| Error::Validation(format!("audioBase64 is not valid base64: {}", e)))?;

    Ok(STANDARD.encode(audio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone)]
    struct Upstream {
        status: StatusCode,
        body: Value,
        delay: Duration,
        hits: Arc<AtomicUsize>,
        last_body: Arc<Mutex<Option<Value>>>,
    }

    impl Upstream {
        fn new(status: StatusCode, body: Value) -> Self {
            Self {
                status,
                body,
                delay: Duration::ZERO,
                hits: Arc::new(AtomicUsize::new(0)),
                last_body: Arc::new(Mutex::new(None)),
            }
        }

        /// Serve on an ephemeral port and return the base URL.
        async fn serve(&self) -> String {
            let upstream = self.clone();
            let app = Router::new().route(
                "/models/:model",
                post(move |Json(body): Json<Value>| {
                    let upstream = upstream.clone();
                    async move {
                        upstream.hits.fetch_add(1, Ordering::SeqCst);
                        *upstream.last_body.lock().unwrap() = Some(body);
                        tokio::time::sleep(upstream.delay).await;
                        (upstream.status, Json(upstream.body.clone()))
                    }
                }),
            );

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{}", addr)
        }
    }

    fn config(base_url: String, api_key: Option<&str>) -> TranscriptionConfig {
        TranscriptionConfig {
            api_key: api_key.map(String::from),
            base_url,
            model: "gemini-2.5-flash".to_string(),
            timeout: Duration::from_secs(30),
            max_output_tokens: 1024,
        }
    }

    fn request() -> TranscribeRequest {
        serde_json::from_value(json!({"audioBase64": "AAECAw=="})).unwrap()
    }

    #[tokio::test]
    async fn test_missing_api_key_makes_no_call() {
        let upstream = Upstream::new(StatusCode::OK, json!({}));
        let base_url = upstream.serve().await;
        let service = TranscriptionService::new(config(base_url, None)).unwrap();

        let err = service.transcribe(request()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "GEMINI_API_KEY environment variable not set");
        assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transcribes_first_candidate() {
        let upstream = Upstream::new(
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "x equals four"}]}}]}),
        );
        let base_url = upstream.serve().await;
        let service = TranscriptionService::new(config(base_url, Some("key"))).unwrap();

        let response = service.transcribe(request()).await.unwrap();
        assert_eq!(response.text, "x equals four");
        assert_eq!(response.confidence, 1.0);
        assert!(response.total_time_in_ms >= 0.0);

        let sent = upstream.last_body.lock().unwrap().clone().unwrap();
        assert_eq!(sent["contents"][0]["parts"][1]["inlineData"]["mimeType"], "audio/mp4");
        assert_eq!(sent["contents"][0]["parts"][1]["inlineData"]["data"], "AAECAw==");
        assert_eq!(sent["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[tokio::test]
    async fn test_no_candidates_yields_empty_text() {
        let upstream = Upstream::new(StatusCode::OK, json!({"candidates": []}));
        let base_url = upstream.serve().await;
        let service = TranscriptionService::new(config(base_url, Some("key"))).unwrap();

        let response = service.transcribe(request()).await.unwrap();
        assert_eq!(response.text, "");
        assert_eq!(response.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_upstream_status_is_preserved() {
        let upstream = Upstream::new(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"message": "quota exceeded"}}),
        );
        let base_url = upstream.serve().await;
        let service = TranscriptionService::new(config(base_url, Some("key"))).unwrap();

        match service.transcribe(request()).await.unwrap_err() {
            Error::Provider { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_transcription_error() {
        let mut upstream = Upstream::new(StatusCode::OK, json!({}));
        upstream.delay = Duration::from_secs(2);
        let base_url = upstream.serve().await;
        let mut config = config(base_url, Some("key"));
        config.timeout = Duration::from_millis(200);
        let service = TranscriptionService::new(config).unwrap();

        let err = service.transcribe(request()).await.unwrap_err();
        assert!(matches!(err, Error::Transcription(_)));
    }

    #[tokio::test]
    async fn test_invalid_audio_is_rejected_before_call() {
        let upstream = Upstream::new(StatusCode::OK, json!({}));
        let base_url = upstream.serve().await;
        let service = TranscriptionService::new(config(base_url, Some("key"))).unwrap();

        let bad: TranscribeRequest =
            serde_json::from_value(json!({"audioBase64": "@@not base64@@"})).unwrap();
        let err = service.transcribe(bad).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unpadded_audio_is_forwarded_padded() {
        let upstream = Upstream::new(
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "hello"}]}}]}),
        );
        let base_url = upstream.serve().await;
        let service = TranscriptionService::new(config(base_url, Some("key"))).unwrap();

        let unpadded: TranscribeRequest =
            serde_json::from_value(json!({"audioBase64": "AAECAw"})).unwrap();
        let response = service.transcribe(unpadded).await.unwrap();
        assert_eq!(response.text, "hello");

        let sent = upstream.last_body.lock().unwrap().clone().unwrap();
        assert_eq!(sent["contents"][0]["parts"][1]["inlineData"]["data"], "AAECAw==");
        assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_data_url_prefix_is_stripped() {
        assert_eq!(
            audio_payload("data:audio/webm;base64,AAECAw==").unwrap(),
            "AAECAw=="
        );
        assert_eq!(audio_payload("AAECAw==").unwrap(), "AAECAw==");
        assert!(audio_payload("data:audio/webm;base64,").is_err());
        assert!(audio_payload("  \n").is_err());
    }

    #[test]
    fn test_common_base64_variants_are_accepted() {
        assert_eq!(audio_payload("AAECAw").unwrap(), "AAECAw==");
        assert_eq!(audio_payload("AAEC\nAw==").unwrap(), "AAECAw==");
        assert_eq!(audio_payload("AAEC\r\nAw==\n").unwrap(), "AAECAw==");
        assert_eq!(audio_payload("_-8=").unwrap(), "/+8=");
        assert_eq!(audio_payload("data:audio/mp4;base64,_-8").unwrap(), "/+8=");
    }
}
