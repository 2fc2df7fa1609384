use colored::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::analysis::{legend, project};
use crate::client::{TextService, TextServiceClient, ToneAnalyzerClient};
use crate::config::Config;
use crate::error::{Result, ToneLensError};
use crate::session::should_analyze;

/// Largest request (head + body) the server will buffer.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;
const MAX_HEADERS: usize = 32;

/// Embedded single-page UI: text input with Summarize / Generate actions on
/// the left, overall tone, legend and highlighted sentences on the right.
///
/// `__MIN_TEXT_LEN__` is substituted at serve time.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Tone Lens</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{background:#0d1117;color:#c9d1d9;font-family:'Cascadia Code','Fira Code',monospace;min-height:100vh;display:flex;flex-direction:column}
header{padding:16px 24px;border-bottom:1px solid #21262d;display:flex;align-items:center;justify-content:space-between}
header h1{font-size:1.2rem;color:#58a6ff}
#status{font-size:.75rem;color:#8b949e}
main{flex:1;display:grid;grid-template-columns:1fr 1fr;min-height:0}
.half{padding:16px 24px;display:flex;flex-direction:column;gap:12px;overflow:auto}
.half:first-child{border-right:1px solid #21262d}
.toolContainer{display:flex;gap:8px}
.btn{border:none;padding:6px 14px;border-radius:6px;font-family:inherit;font-size:.85rem;cursor:pointer;color:#fff;background:#1f6feb}
.btn:hover{background:#388bfd}
.btn:disabled{background:#21262d;color:#484f58;cursor:not-allowed}
.textInput{flex:1;min-height:300px;background:#161b22;border:1px solid #30363d;color:#c9d1d9;padding:12px;border-radius:6px;font-family:inherit;font-size:.95rem;line-height:1.6;resize:none}
.textInput:focus{outline:none;border-color:#58a6ff}
#overall{font-size:1.05rem;color:#58a6ff}
.legend{display:flex;flex-wrap:wrap;gap:12px}
.legendItem{display:flex;align-items:center;gap:6px;font-size:.8rem}
.colorIndicator{display:inline-block;width:14px;height:14px;border-radius:3px;border:1px solid #30363d}
.sentenceResultContainer{line-height:1.9;font-size:1rem;white-space:pre-wrap;word-wrap:break-word}
.sentenceResultContainer span{border-radius:3px;padding:1px 2px;cursor:default}
</style>
</head>
<body>
<header><h1>Tone Lens</h1><span id="status"></span></header>
<main>
<div class="half">
  <div class="toolContainer">
    <button class="btn" id="summarize">Summarize</button>
    <button class="btn" id="generate">Generate</button>
  </div>
  <textarea class="textInput" id="text" placeholder="Type or paste text..."></textarea>
</div>
<div class="half">
  <div id="overall">Overall tone: </div>
  <div class="legend" id="legend"></div>
  <div class="sentenceResultContainer" id="sentences"></div>
</div>
</main>
<script>
const MIN_TEXT_LEN=__MIN_TEXT_LEN__;
const $=s=>document.querySelector(s);
const input=$('#text');
let seq=0,applied=0,timer=null;

function status(msg){$('#status').textContent=msg||'';}

function renderLegend(entries){
  const el=$('#legend');el.innerHTML='';
  for(const e of entries){
    const item=document.createElement('div');item.className='legendItem';
    const sw=document.createElement('span');sw.className='colorIndicator';sw.style.background=e.color;
    const name=document.createElement('strong');name.textContent=e.toneId;
    item.append(sw,name);el.append(item);
  }
}

function renderProjection(p){
  $('#overall').textContent='Overall tone: '+p.overallTone;
  const el=$('#sentences');el.innerHTML='';
  for(const s of p.spans){
    const span=document.createElement('span');
    span.textContent=s.text;
    span.style.background=s.color;
    span.title=s.toneName+' '+(s.score*100)+' %';
    el.append(span,document.createTextNode(' '));
  }
}

async function post(path,text){
  const res=await fetch(path,{method:'POST',headers:{'Content-Type':'application/json'},body:JSON.stringify({text})});
  const body=await res.json();
  if(!res.ok)throw new Error(body.error||('HTTP '+res.status));
  return body;
}

async function analyze(){
  const text=input.value;
  if([...text].length<=MIN_TEXT_LEN)return;
  const mine=++seq;
  status('analyzing...');
  try{
    const p=await post('/api/analyze',text);
    // last writer wins: ignore responses older than the one on screen
    if(mine<applied)return;
    applied=mine;
    renderProjection(p);
    status('');
  }catch(e){
    if(mine>=applied)status(e.message);
  }
}

function schedule(){clearTimeout(timer);timer=setTimeout(analyze,400);}
input.addEventListener('input',schedule);

async function rewrite(path){
  try{
    const r=await post(path,input.value);
    if(r.output){input.value=r.output;schedule();}
  }catch(e){status(e.message);}
}
$('#summarize').onclick=()=>rewrite('/api/summarize');
$('#generate').onclick=()=>rewrite('/api/generate');

fetch('/api/legend').then(r=>r.json()).then(renderLegend);
</script>
</body>
</html>"##;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A fully buffered inbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    /// Path including any query string.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn path_only(&self) -> &str {
        self.path.split('?').next().unwrap_or("")
    }
}

struct Head {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    len: usize,
}

fn parse_head(buf: &[u8]) -> Result<Option<Head>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let status = req
        .parse(buf)
        .map_err(|e| ToneLensError::BadRequest(e.to_string()))?;
    let httparse::Status::Complete(len) = status else {
        return Ok(None);
    };
    Ok(Some(Head {
        method: req.method.unwrap_or("").to_string(),
        path: req.path.unwrap_or("/").to_string(),
        headers: req
            .headers
            .iter()
            .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
            .collect(),
        len,
    }))
}

/// Read one request: head via `httparse`, then `Content-Length` body bytes.
pub async fn read_request<S: AsyncRead + Unpin>(stream: &mut S) -> Result<HttpRequest> {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let head = loop {
        if let Some(head) = parse_head(&buf)? {
            break head;
        }
        if buf.len() >= MAX_REQUEST_BYTES {
            return Err(ToneLensError::BadRequest("request head too large".into()));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(ToneLensError::BadRequest("connection closed mid-request".into()));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let content_length = match head
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
    {
        Some((_, v)) => v
            .trim()
            .parse::<usize>()
            .map_err(|_| ToneLensError::BadRequest(format!("bad content-length: {v}")))?,
        None => 0,
    };
    let end = match head.len.checked_add(content_length) {
        Some(end) if end <= MAX_REQUEST_BYTES => end,
        _ => return Err(ToneLensError::BadRequest("request body too large".into())),
    };

    while buf.len() < end {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(ToneLensError::BadRequest("connection closed mid-body".into()));
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = buf[head.len..end].to_vec();
    Ok(HttpRequest { method: head.method, path: head.path, headers: head.headers, body })
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    text: String,
}

#[derive(Debug, Serialize)]
struct OutputBody {
    output: Option<String>,
}

impl HttpResponse {
    pub fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body: body.into_bytes() }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self { status, content_type: "application/json", body },
            Err(e) => Self::error(500, e.to_string()),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::to_vec(&ErrorBody { error: message.into() }).unwrap_or_default();
        Self { status, content_type: "application/json", body }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            _ => "",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Shared, read-only server state.
pub struct AppState {
    pub config: Arc<Config>,
    tone: std::result::Result<ToneAnalyzerClient, String>,
    text: Option<TextServiceClient>,
}

impl AppState {
    /// A missing tone-analyzer config is not fatal here: the page still
    /// loads and `/api/analyze` answers 503 with the reason.
    pub fn new(config: Arc<Config>) -> Self {
        let tone = ToneAnalyzerClient::new(&config).map_err(|e| e.to_string());
        let text = TextServiceClient::new(&config);
        Self { config, tone, text }
    }
}

fn parse_text_body(req: &HttpRequest) -> std::result::Result<String, HttpResponse> {
    serde_json::from_slice::<TextBody>(&req.body)
        .map(|b| b.text)
        .map_err(|e| HttpResponse::error(400, format!("expected {{\"text\": string}}: {e}")))
}

async fn rewrite(state: &AppState, service: TextService, req: &HttpRequest) -> HttpResponse {
    let text = match parse_text_body(req) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let output = match &state.text {
        Some(client) => match client.call(service, &text).await {
            Ok(out) => out,
            Err(e) => {
                warn!(%service, error = %e, "text service failed");
                None
            }
        },
        None => None,
    };
    HttpResponse::json(200, &OutputBody { output })
}

/// Dispatch one request.
pub async fn route(state: &AppState, req: &HttpRequest) -> HttpResponse {
    match (req.method.as_str(), req.path_only()) {
        ("GET", "/") => HttpResponse::html(
            INDEX_HTML.replace("__MIN_TEXT_LEN__", &state.config.min_text_len.to_string()),
        ),
        ("GET", "/api/legend") => HttpResponse::json(200, &legend()),
        ("POST", "/api/analyze") => {
            let text = match parse_text_body(req) {
                Ok(t) => t,
                Err(resp) => return resp,
            };
            if !should_analyze(&text, state.config.min_text_len) {
                return HttpResponse::json(200, &project(None));
            }
            let client = match &state.tone {
                Ok(c) => c,
                Err(reason) => return HttpResponse::error(503, reason.clone()),
            };
            match client.analyze(&text).await {
                Ok(result) => HttpResponse::json(200, &project(Some(&result))),
                Err(e) => {
                    warn!(error = %e, "tone analysis failed");
                    HttpResponse::error(502, e.to_string())
                }
            }
        }
        ("POST", "/api/summarize") => rewrite(state, TextService::Summarization, req).await,
        ("POST", "/api/generate") => rewrite(state, TextService::TextGenerator, req).await,
        (_, "/" | "/api/legend" | "/api/analyze" | "/api/summarize" | "/api/generate") => {
            HttpResponse::error(405, "method not allowed")
        }
        _ => HttpResponse::error(404, "not found"),
    }
}

async fn handle_connection(mut stream: tokio::net::TcpStream, state: Arc<AppState>) -> Result<()> {
    let response = match read_request(&mut stream).await {
        Ok(req) => {
            debug!(method = %req.method, path = %req.path, "request");
            route(&state, &req).await
        }
        Err(ToneLensError::BadRequest(msg)) => HttpResponse::error(400, msg),
        Err(e) => return Err(e),
    };
    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Accept connections on `listener` forever, one task per connection.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                warn!(%addr, error = %e, "connection error");
            }
        });
    }
}

fn open_browser(url: &str) {
    #[cfg(target_os = "windows")]
    {
        let _ = std::process::Command::new("cmd").args(["/C", &format!("start {url}")]).spawn();
    }
    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("open").arg(url).spawn();
    }
    #[cfg(target_os = "linux")]
    {
        let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    }
}

/// Start the web UI server on localhost and optionally open the browser.
pub async fn serve(port: u16, config: Arc<Config>, launch_browser: bool) -> Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let url = format!("http://localhost:{}", listener.local_addr()?.port());

    eprintln!("{}", format!("  Web UI running at {url}").bright_green());
    eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());
    info!(%url, "web UI listening");

    let state = Arc::new(AppState::new(config));
    if let Err(reason) = &state.tone {
        warn!(%reason, "tone analysis unavailable; /api/analyze will answer 503");
    }
    if launch_browser {
        open_browser(&url);
    }
    run(listener, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, path: &str, body: &str) -> HttpRequest {
        HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.as_bytes().to_vec(),
        }
    }

    fn unconfigured_state() -> AppState {
        AppState::new(Arc::new(Config::default()))
    }

    fn body_json(resp: &HttpResponse) -> serde_json::Value {
        serde_json::from_slice(&resp.body).expect("json body")
    }

    // -- request parsing --

    #[tokio::test]
    async fn test_read_request_with_body() {
        let raw = b"POST /api/analyze?x=1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 13\r\n\r\n{\"text\":\"hi\"}";
        let mut reader = &raw[..];
        let req = read_request(&mut reader).await.expect("parse");
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/analyze?x=1");
        assert_eq!(req.path_only(), "/api/analyze");
        assert_eq!(req.header("host"), Some("localhost"));
        assert_eq!(req.body, br#"{"text":"hi"}"#);
    }

    #[tokio::test]
    async fn test_read_request_without_body() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let mut reader = &raw[..];
        let req = read_request(&mut reader).await.expect("parse");
        assert_eq!(req.method, "GET");
        assert!(req.body.is_empty());
    }

    #[tokio::test]
    async fn test_read_request_truncated_body() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 50\r\n\r\nshort";
        let mut reader = &raw[..];
        assert!(matches!(read_request(&mut reader).await, Err(ToneLensError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_read_request_bad_content_length() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n";
        let mut reader = &raw[..];
        assert!(matches!(read_request(&mut reader).await, Err(ToneLensError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_read_request_oversized_body() {
        let raw = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_REQUEST_BYTES + 1);
        let mut reader = raw.as_bytes();
        assert!(matches!(read_request(&mut reader).await, Err(ToneLensError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_read_request_content_length_at_usize_max() {
        let raw = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n", usize::MAX);
        let mut reader = raw.as_bytes();
        assert!(matches!(read_request(&mut reader).await, Err(ToneLensError::BadRequest(_))));
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let req = request("GET", "/", "");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
    }

    // -- responses --

    #[test]
    fn test_response_bytes_has_status_and_length() {
        let resp = HttpResponse::error(404, "not found");
        let text = String::from_utf8(resp.to_bytes()).expect("utf8");
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains(&format!("Content-Length: {}\r\n", resp.body.len())));
        assert!(text.ends_with(r#"{"error":"not found"}"#));
    }

    // -- routing --

    #[tokio::test]
    async fn test_route_index_substitutes_min_len() {
        let resp = route(&unconfigured_state(), &request("GET", "/", "")).await;
        assert_eq!(resp.status, 200);
        let html = String::from_utf8(resp.body).expect("utf8");
        assert!(html.contains("const MIN_TEXT_LEN=10;"));
        assert!(!html.contains("__MIN_TEXT_LEN__"));
    }

    #[tokio::test]
    async fn test_route_legend() {
        let resp = route(&unconfigured_state(), &request("GET", "/api/legend", "")).await;
        assert_eq!(resp.status, 200);
        let v = body_json(&resp);
        assert_eq!(v[0]["toneId"], "anger");
        assert_eq!(v[0]["color"], "rgba(245,66,66,1)");
        assert_eq!(v[6]["toneId"], "tentative");
    }

    #[tokio::test]
    async fn test_route_analyze_bad_body() {
        let resp = route(&unconfigured_state(), &request("POST", "/api/analyze", "{}")).await;
        assert_eq!(resp.status, 400);
    }

    #[tokio::test]
    async fn test_route_analyze_short_text_is_empty_projection() {
        let resp = route(&unconfigured_state(), &request("POST", "/api/analyze", r#"{"text":"short"}"#)).await;
        assert_eq!(resp.status, 200);
        let v = body_json(&resp);
        assert_eq!(v["overallTone"], "");
        assert_eq!(v["spans"].as_array().map(|a| a.len()), Some(0));
    }

    #[tokio::test]
    async fn test_route_analyze_unconfigured_is_503() {
        let resp = route(
            &unconfigured_state(),
            &request("POST", "/api/analyze", r#"{"text":"long enough text to analyze"}"#),
        )
        .await;
        assert_eq!(resp.status, 503);
        assert!(body_json(&resp)["error"].as_str().unwrap_or("").contains("tone_analyzer.url"));
    }

    #[tokio::test]
    async fn test_route_summarize_without_service_returns_null() {
        let resp = route(&unconfigured_state(), &request("POST", "/api/summarize", r#"{"text":"abc"}"#)).await;
        assert_eq!(resp.status, 200);
        assert!(body_json(&resp)["output"].is_null());
    }

    #[tokio::test]
    async fn test_route_wrong_method() {
        let resp = route(&unconfigured_state(), &request("GET", "/api/analyze", "")).await;
        assert_eq!(resp.status, 405);
    }

    #[tokio::test]
    async fn test_route_not_found() {
        let resp = route(&unconfigured_state(), &request("GET", "/nope", "")).await;
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_index_html_has_layout() {
        assert!(INDEX_HTML.contains("Summarize"));
        assert!(INDEX_HTML.contains("Generate"));
        assert!(INDEX_HTML.contains("Overall tone"));
        assert!(INDEX_HTML.contains("legend"));
        assert!(INDEX_HTML.contains("/api/analyze"));
    }

    #[test]
    fn test_index_html_counts_code_points_like_server() {
        // should_analyze counts chars; String.length would count UTF-16 units
        assert!(INDEX_HTML.contains("[...text].length<=MIN_TEXT_LEN"));
        assert!(!INDEX_HTML.contains("text.length<=MIN_TEXT_LEN"));
    }

    #[test]
    fn test_index_html_no_external_deps() {
        assert!(!INDEX_HTML.contains("cdn."));
        assert!(!INDEX_HTML.contains("unpkg.com"));
        assert!(!INDEX_HTML.contains("jsdelivr"));
    }

    // -- end to end over a real socket --

    #[tokio::test]
    async fn test_run_serves_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(run(listener, Arc::new(unconfigured_state())));

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{addr}/api/legend"))
            .send()
            .await
            .expect("send");
        assert_eq!(resp.status().as_u16(), 200);
        let v: serde_json::Value = resp.json().await.expect("json");
        assert_eq!(v.as_array().map(|a| a.len()), Some(7));

        let resp = client
            .post(format!("http://{addr}/api/analyze"))
            .body("not json")
            .send()
            .await
            .expect("send");
        assert_eq!(resp.status().as_u16(), 400);
    }
}
