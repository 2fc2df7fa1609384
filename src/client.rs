//! HTTP clients for the remote tone-analysis and text services.

use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::AnalysisResult;
use crate::config::Config;
use crate::error::{Result, ToneLensError};

#[derive(Debug, Serialize)]
struct ToneRequest<'a> {
    text: &'a str,
}

/// Build the `Authorization` value the tone service expects:
/// `Basic base64("apikey:<key>")`.
pub fn basic_auth_header(api_key: &str) -> String {
    format!("Basic {}", general_purpose::STANDARD.encode(format!("apikey:{api_key}")))
}

fn build_http_client(config: &Config) -> reqwest::Client {
    // Client::builder() only fails on TLS backend init; fall back rather than panic.
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .unwrap_or_default()
}

/// Send `request`, require a 2xx status, and decode the JSON body as `T`.
async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder, url: &str) -> Result<T> {
    let resp = request.send().await.map_err(|e| ToneLensError::Connect {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ToneLensError::Http { status: status.as_u16(), url: url.to_string() });
    }

    let bytes = resp.bytes().await.map_err(|e| ToneLensError::Connect {
        url: url.to_string(),
        detail: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ToneLensError::Json { detail: e.to_string() })
}

// ---------------------------------------------------------------------------
// Tone analyzer
// ---------------------------------------------------------------------------

/// Client for the `/v3/tone` endpoint.
#[derive(Debug, Clone)]
pub struct ToneAnalyzerClient {
    client: reqwest::Client,
    endpoint: String,
    auth: String,
}

impl ToneAnalyzerClient {
    /// Fails with [`ToneLensError::MissingConfig`] when the URL or key is unset.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate_tone_analyzer()?;
        Ok(Self {
            client: build_http_client(config),
            endpoint: config.tone_endpoint(),
            auth: basic_auth_header(&config.tone_analyzer.api_key),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `text` for analysis.
    ///
    /// # Returns
    /// - `Ok(AnalysisResult)` on a 2xx response with a parseable body.
    /// - `Err(ToneLensError::Connect)` on transport failure.
    /// - `Err(ToneLensError::Http)` on a non-2xx response.
    /// - `Err(ToneLensError::Json)` when the body is not a tone result.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        debug!(chars = text.chars().count(), url = %self.endpoint, "requesting tone analysis");
        let request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, &self.auth)
            .json(&ToneRequest { text });
        let result: AnalysisResult = send_json(request, &self.endpoint).await?;
        debug!(
            sentences = result.sentences_tone.len(),
            document_tones = result.document_tone.tones.len(),
            "tone analysis complete"
        );
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Summarization / generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextService {
    Summarization,
    TextGenerator,
}

impl TextService {
    pub fn endpoint_name(&self) -> &'static str {
        match self {
            TextService::Summarization => "summarization",
            TextService::TextGenerator => "text-generator",
        }
    }
}

impl std::fmt::Display for TextService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint_name())
    }
}

#[derive(Debug, Deserialize)]
pub struct TextServiceResponse {
    #[serde(default)]
    pub output: Option<String>,
}

/// Client for the summarization and text-generation endpoints.
#[derive(Debug, Clone)]
pub struct TextServiceClient {
    client: reqwest::Client,
    config: Config,
}

impl TextServiceClient {
    /// `None` when no text-service key is configured.
    pub fn new(config: &Config) -> Option<Self> {
        if !config.text_services_enabled() {
            return None;
        }
        Some(Self { client: build_http_client(config), config: config.clone() })
    }

    /// Call `service` with `text`. `Ok(None)` means the service answered
    /// without an `output` field.
    pub async fn call(&self, service: TextService, text: &str) -> Result<Option<String>> {
        let url = self.config.text_service_endpoint(service.endpoint_name());
        debug!(%service, url = %url, "calling text service");
        let request = self
            .client
            .post(&url)
            .header("api-key", &self.config.text_services.api_key)
            .form(&[("text", text)]);
        let resp: TextServiceResponse = send_json(request, &url).await?;
        Ok(resp.output)
    }
}

/// Replace `text` with the service output. On any failure, or when the
/// service returns no output, the original text is kept.
pub async fn rewrite_text(client: Option<&TextServiceClient>, service: TextService, text: &str) -> String {
    let Some(client) = client else {
        warn!(%service, "text services disabled (no API key); keeping text");
        return text.to_string();
    };
    match client.call(service, text).await {
        Ok(Some(output)) if !output.is_empty() => output,
        Ok(_) => {
            warn!(%service, "text service returned no output; keeping text");
            text.to_string()
        }
        Err(e) => {
            warn!(%service, error = %e, "text service failed; keeping text");
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::read_request;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one request with a canned response; hand the request back.
    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<crate::web::HttpRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let req = read_request(&mut stream).await.expect("read request");
            let resp = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(resp.as_bytes()).await.expect("write");
            let _ = tx.send(req);
        });
        (format!("http://{addr}"), rx)
    }

    fn config_for(url: &str) -> Config {
        let mut c = Config::default();
        c.tone_analyzer.url = url.to_string();
        c.tone_analyzer.api_key = "k3y".to_string();
        c.text_services.base_url = url.to_string();
        c.text_services.api_key = "deep".to_string();
        c
    }

    #[test]
    fn test_basic_auth_header() {
        // base64("apikey:k3y")
        assert_eq!(basic_auth_header("k3y"), "Basic YXBpa2V5OmszeQ==");
    }

    #[test]
    fn test_text_service_names() {
        assert_eq!(TextService::Summarization.endpoint_name(), "summarization");
        assert_eq!(TextService::TextGenerator.to_string(), "text-generator");
    }

    #[test]
    fn test_tone_client_requires_config() {
        let err = ToneAnalyzerClient::new(&Config::default()).unwrap_err();
        assert!(matches!(err, ToneLensError::MissingConfig { .. }));
    }

    #[test]
    fn test_text_client_disabled_without_key() {
        assert!(TextServiceClient::new(&Config::default()).is_none());
    }

    #[test]
    fn test_tone_client_endpoint() {
        let c = ToneAnalyzerClient::new(&config_for("http://tone.local/")).expect("client");
        assert_eq!(c.endpoint(), "http://tone.local/v3/tone?version=2017-09-21");
    }

    #[tokio::test]
    async fn test_analyze_success_sends_auth_and_body() {
        let (url, rx) = one_shot_server(
            "200 OK",
            r#"{"document_tone":{"tones":[{"score":0.8,"tone_id":"joy","tone_name":"Joy"}]},"sentences_tone":[{"sentence_id":0,"text":"Great day.","tones":[]}]}"#,
        )
        .await;
        let client = ToneAnalyzerClient::new(&config_for(&url)).expect("client");
        let result = client.analyze("Great day. Truly.").await.expect("analyze");
        assert_eq!(result.document_tone.tones[0].tone_name, "Joy");
        assert_eq!(result.sentences_tone.len(), 1);

        let req = rx.await.expect("request");
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/v3/tone?version=2017-09-21");
        assert_eq!(req.header("authorization"), Some("Basic YXBpa2V5OmszeQ=="));
        let body: serde_json::Value = serde_json::from_slice(&req.body).expect("json body");
        assert_eq!(body["text"], "Great day. Truly.");
    }

    #[tokio::test]
    async fn test_analyze_non_2xx_is_http_error() {
        let (url, _rx) = one_shot_server("401 Unauthorized", r#"{"error":"nope"}"#).await;
        let client = ToneAnalyzerClient::new(&config_for(&url)).expect("client");
        let err = client.analyze("Some text here.").await.unwrap_err();
        assert!(matches!(err, ToneLensError::Http { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_analyze_malformed_body_is_json_error() {
        let (url, _rx) = one_shot_server("200 OK", "not json").await;
        let client = ToneAnalyzerClient::new(&config_for(&url)).expect("client");
        let err = client.analyze("Some text here.").await.unwrap_err();
        assert!(matches!(err, ToneLensError::Json { .. }));
    }

    #[tokio::test]
    async fn test_text_service_call_returns_output() {
        let (url, rx) = one_shot_server("200 OK", r#"{"id":"x","output":"Short."}"#).await;
        let client = TextServiceClient::new(&config_for(&url)).expect("client");
        let out = client.call(TextService::Summarization, "A long text.").await.expect("call");
        assert_eq!(out.as_deref(), Some("Short."));

        let req = rx.await.expect("request");
        assert_eq!(req.path, "/api/summarization");
        assert_eq!(req.header("api-key"), Some("deep"));
        assert_eq!(String::from_utf8_lossy(&req.body), "text=A+long+text.");
    }

    #[tokio::test]
    async fn test_rewrite_text_keeps_input_on_failure() {
        let (url, _rx) = one_shot_server("500 Internal Server Error", "{}").await;
        let client = TextServiceClient::new(&config_for(&url)).expect("client");
        let out = rewrite_text(Some(&client), TextService::TextGenerator, "keep me").await;
        assert_eq!(out, "keep me");
    }

    #[tokio::test]
    async fn test_rewrite_text_keeps_input_when_output_missing() {
        let (url, _rx) = one_shot_server("200 OK", r#"{"id":"x"}"#).await;
        let client = TextServiceClient::new(&config_for(&url)).expect("client");
        let out = rewrite_text(Some(&client), TextService::Summarization, "keep me").await;
        assert_eq!(out, "keep me");
    }

    #[tokio::test]
    async fn test_rewrite_text_without_client() {
        assert_eq!(rewrite_text(None, TextService::Summarization, "same").await, "same");
    }
}
