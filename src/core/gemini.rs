//! Gemini implementation of the session provider.
//!
//! Each session keeps its own chat history and replays it with every request
//! so the model sees the whole conversation. Replies arrive as server-sent
//! events from `streamGenerateContent?alt=sse`.

use std::sync::{Arc, Mutex};

use futures_util::{stream, StreamExt};
use memchr::memchr;
use tracing::{debug, info, warn};

use crate::api::{Content, GenerateContentRequest, GenerateContentResponse};
use crate::core::config::data::Config;
use crate::core::credentials::resolve_api_key;
use crate::core::session::{
    FragmentStream, ProviderError, SessionHandle, SessionProvider, StreamError,
};
use crate::utils::url::stream_generate_url;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Builds a provider from saved settings and the resolved API key.
    pub fn from_config(
        config: &Config,
        model_override: Option<&str>,
        env_only: bool,
    ) -> Result<Self, ProviderError> {
        let resolved = resolve_api_key(env_only)?;
        info!(source = %resolved.source, "resolved Gemini API key");
        let model = model_override
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| config.model_or_default());
        Ok(Self::new(resolved.key)
            .with_model(model)
            .with_base_url(config.base_url_or_default()))
    }

    fn open_session(&self, system_instruction: &str) -> GeminiSession {
        let system_instruction = Some(system_instruction.trim())
            .filter(|text| !text.is_empty())
            .map(Content::instruction);

        GeminiSession {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            url: stream_generate_url(&self.base_url, &self.model),
            system_instruction,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl SessionProvider for GeminiProvider {
    fn create_session(
        &self,
        system_instruction: &str,
    ) -> Result<Arc<dyn SessionHandle>, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::unavailable("no Gemini API key configured"));
        }
        if self.model.trim().is_empty() {
            return Err(ProviderError::unavailable("no Gemini model configured"));
        }

        debug!(model = %self.model, "opening Gemini chat session");
        Ok(Arc::new(self.open_session(system_instruction)))
    }
}

pub struct GeminiSession {
    client: reqwest::Client,
    api_key: String,
    url: String,
    system_instruction: Option<Content>,
    history: Arc<Mutex<Vec<Content>>>,
}

impl GeminiSession {
    /// Completed exchanges, oldest first.
    pub fn history(&self) -> Vec<Content> {
        lock_history(&self.history).clone()
    }
}

impl SessionHandle for GeminiSession {
    fn stream_response(&self, user_text: &str) -> FragmentStream {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let url = self.url.clone();
        let system_instruction = self.system_instruction.clone();
        let history = Arc::clone(&self.history);
        let user_content = Content::text("user", user_text);

        let fragments = async_stream::stream! {
            let mut contents = lock_history(&history).clone();
            contents.push(user_content.clone());
            let request = GenerateContentRequest {
                contents,
                system_instruction,
            };

            let response = match client
                .post(&url)
                .header("x-goog-api-key", &api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    yield Err(StreamError::new(format!("request failed: {e}")));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                yield Err(StreamError::new(format_api_error(status.as_u16(), &body)));
                return;
            }

            // A trailing newline flushes a final event that lacks one.
            let mut bytes = response
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()))
                .chain(stream::iter([Ok(vec![b'\n'])]));
            let mut buffer: Vec<u8> = Vec::new();
            let mut reply = String::new();

            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => buffer.extend_from_slice(&chunk),
                    Err(e) => {
                        yield Err(StreamError::new(format!("connection interrupted: {e}")));
                        return;
                    }
                }

                for line in take_lines(&mut buffer) {
                    match line {
                        SseLine::Fragment(text) => {
                            reply.push_str(&text);
                            yield Ok(text);
                        }
                        SseLine::Ignored => {}
                        SseLine::Failed(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }

            if !reply.is_empty() {
                let mut history = lock_history(&history);
                history.push(user_content);
                history.push(Content::text("model", reply));
            }
        };

        fragments.boxed()
    }
}

fn lock_history(history: &Mutex<Vec<Content>>) -> std::sync::MutexGuard<'_, Vec<Content>> {
    history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    Fragment(String),
    Ignored,
    Failed(StreamError),
}

/// Drains every complete line from `buffer`, leaving a partial tail behind.
fn take_lines(buffer: &mut Vec<u8>) -> Vec<SseLine> {
    let mut lines = Vec::new();
    while let Some(newline_pos) = memchr(b'\n', buffer) {
        match std::str::from_utf8(&buffer[..newline_pos]) {
            Ok(line) => lines.push(parse_sse_line(line.trim())),
            Err(e) => warn!("Invalid UTF-8 in stream: {e}"),
        }
        buffer.drain(..=newline_pos);
    }
    lines
}

fn parse_sse_line(line: &str) -> SseLine {
    let Some(payload) = line.strip_prefix("data:").map(str::trim_start) else {
        return SseLine::Ignored;
    };
    if payload.is_empty() || payload == "[DONE]" {
        return SseLine::Ignored;
    }

    let value = match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => value,
        Err(_) => {
            return SseLine::Failed(StreamError::new(format!(
                "unreadable stream payload: {payload}"
            )))
        }
    };
    if value.get("error").is_some() {
        let summary = extract_error_summary(&value).unwrap_or_else(|| payload.to_string());
        return SseLine::Failed(StreamError::new(summary));
    }

    let response: GenerateContentResponse = match serde_json::from_value(value) {
        Ok(response) => response,
        Err(e) => return SseLine::Failed(StreamError::new(format!("unexpected payload: {e}"))),
    };
    if response.candidates.is_empty() {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return SseLine::Failed(StreamError::new(format!("prompt blocked: {reason}")));
        }
    }

    let text = response.text();
    if text.is_empty() {
        SseLine::Ignored
    } else {
        SseLine::Fragment(text)
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed)
}

fn format_api_error(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    let detail = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| extract_error_summary(&value))
        .unwrap_or_else(|| {
            if trimmed.is_empty() {
                "<empty>".to_string()
            } else {
                trimmed.to_string()
            }
        });
    format!("HTTP {status}: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    async fn collect(stream: FragmentStream) -> Vec<Result<String, StreamError>> {
        stream.collect().await
    }

    fn sse_event(text: &str) -> String {
        format!(
            "data: {{\"candidates\":[{{\"content\":{{\"role\":\"model\",\"parts\":[{{\"text\":\"{text}\"}}]}}}}]}}\r\n\r\n"
        )
    }

    #[test]
    fn parse_sse_line_handles_spacing_variants() {
        for line in [
            r#"data: {"candidates":[{"content":{"parts":[{"text":"Hi"}]}}]}"#,
            r#"data:{"candidates":[{"content":{"parts":[{"text":"Hi"}]}}]}"#,
        ] {
            assert_eq!(parse_sse_line(line), SseLine::Fragment("Hi".into()));
        }
        assert_eq!(parse_sse_line(""), SseLine::Ignored);
        assert_eq!(parse_sse_line(": keep-alive"), SseLine::Ignored);
        assert_eq!(parse_sse_line("event: message"), SseLine::Ignored);
    }

    #[test]
    fn parse_sse_line_routes_errors() {
        let line = r#"data: {"error":{"code":500,"message":"internal   error"}}"#;
        assert_eq!(
            parse_sse_line(line),
            SseLine::Failed(StreamError::new("internal error"))
        );
        assert!(matches!(parse_sse_line("data: {oops"), SseLine::Failed(_)));
        assert_eq!(
            parse_sse_line(r#"data: {"promptFeedback":{"blockReason":"SAFETY"}}"#),
            SseLine::Failed(StreamError::new("prompt blocked: SAFETY"))
        );
    }

    #[test]
    fn take_lines_keeps_partial_tail() {
        let mut buffer = b"data: {\"candidates\":[]}\ndata: {\"cand".to_vec();
        let lines = take_lines(&mut buffer);
        assert_eq!(lines, vec![SseLine::Ignored]);
        assert_eq!(buffer, b"data: {\"cand".to_vec());
    }

    #[test]
    fn format_api_error_prefers_json_summary() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(format_api_error(400, body), "HTTP 400: API key not valid.");
        assert_eq!(format_api_error(502, "bad gateway"), "HTTP 502: bad gateway");
        assert_eq!(format_api_error(500, "  "), "HTTP 500: <empty>");
    }

    #[test]
    fn sessions_require_api_key() {
        let provider = GeminiProvider::new("  ");
        assert!(matches!(
            provider.create_session("hi"),
            Err(ProviderError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn streams_fragments_and_records_history() {
        let mut server = mockito::Server::new_async().await;
        let body = format!("{}{}", sse_event("Hel"), sse_event("lo!"));
        let mock = server
            .mock("POST", "/models/test-model:streamGenerateContent?alt=sse")
            .match_header("x-goog-api-key", "secret")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let provider = GeminiProvider::new("secret")
            .with_model("test-model")
            .with_base_url(server.url());
        let session = provider.open_session("be nice");

        let results = collect(session.stream_response("Hi")).await;
        mock.assert_async().await;

        let fragments: Vec<String> = results.into_iter().map(|r| r.expect("fragment")).collect();
        assert_eq!(fragments, vec!["Hel".to_string(), "lo!".to_string()]);
        assert_eq!(
            session.history(),
            vec![Content::text("user", "Hi"), Content::text("model", "Hello!")]
        );
    }

    #[tokio::test]
    async fn history_is_replayed_on_next_request() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/models/m:streamGenerateContent?alt=sse")
            .with_status(200)
            .with_body(sse_event("One"))
            .expect(1)
            .create_async()
            .await;

        let provider = GeminiProvider::new("k")
            .with_model("m")
            .with_base_url(server.url());
        let session = provider.open_session("");
        let _ = collect(session.stream_response("first")).await;
        first.assert_async().await;

        let second = server
            .mock("POST", "/models/m:streamGenerateContent?alt=sse")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"contents":[{"role":"user","parts":[{"text":"first"}]},{"role":"model","parts":[{"text":"One"}]},{"role":"user","parts":[{"text":"second"}]}]}"#.to_string(),
            ))
            .with_status(200)
            .with_body(sse_event("Two"))
            .create_async()
            .await;
        let results = collect(session.stream_response("second")).await;
        second.assert_async().await;
        assert_eq!(results, vec![Ok("Two".to_string())]);
        assert_eq!(session.history().len(), 4);
    }

    #[tokio::test]
    async fn http_errors_become_stream_errors_without_history() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/m:streamGenerateContent?alt=sse")
            .with_status(403)
            .with_body(r#"{"error":{"message":"Permission denied"}}"#)
            .create_async()
            .await;

        let provider = GeminiProvider::new("k")
            .with_model("m")
            .with_base_url(server.url());
        let session = provider.open_session("");
        let results = collect(session.stream_response("Hi")).await;

        assert_eq!(
            results,
            vec![Err(StreamError::new("HTTP 403: Permission denied"))]
        );
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn mid_stream_error_follows_partial_output() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            "{}data: {{\"error\":{{\"message\":\"overloaded\"}}}}\n\n",
            sse_event("Par")
        );
        let _mock = server
            .mock("POST", "/models/m:streamGenerateContent?alt=sse")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let provider = GeminiProvider::new("k")
            .with_model("m")
            .with_base_url(server.url());
        let session = provider.open_session("");
        let results = collect(session.stream_response("Hi")).await;

        assert_eq!(
            results,
            vec![Ok("Par".to_string()), Err(StreamError::new("overloaded"))]
        );
        assert!(session.history().is_empty());
    }
}

