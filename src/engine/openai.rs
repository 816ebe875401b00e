// OpenAI chat-completions backed query engine
use crate::config::EngineConfig;
use crate::engine::prompt::{build_user_prompt, classify_reply, SYSTEM_PROMPT};
use crate::engine::{DataView, QueryEngine};
use crate::model::{AnalysisValue, EngineError};
use crate::utils::truncate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Query engine handle bound to one API key.
pub struct OpenAiEngine {
    api_key: String,
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    preview_rows: usize,
}

impl OpenAiEngine {
    pub fn new(api_key: String, config: &EngineConfig) -> Result<Self, EngineError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_seconds));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self {
            api_key,
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            preview_rows: config.preview_rows,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEngine")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl QueryEngine for OpenAiEngine {
    async fn chat(&self, view: &DataView<'_>) -> Result<AnalysisValue, EngineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let user_prompt = build_user_prompt(view, self.preview_rows);
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &user_prompt },
            ],
        };

        debug!("Sending query to {} ({})", url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            debug!("Query engine responded [{}]", status);
            return Err(EngineError::Api {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(EngineError::EmptyResponse)?;

        Ok(classify_reply(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnType, Table, Value};
    use crate::test_support::capture_logs;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and hands back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let reply = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    fn engine(base_url: String) -> OpenAiEngine {
        let config = EngineConfig {
            base_url,
            timeout_seconds: 5,
            use_system_proxy: false,
            ..EngineConfig::default()
        };
        OpenAiEngine::new("test_key".to_string(), &config).unwrap()
    }

    fn table() -> Table {
        Table::new(
            vec!["Sales".into()],
            vec![ColumnType::Int],
            vec![vec![Value::Int(5)], vec![Value::Int(7)]],
        )
    }

    #[tokio::test]
    async fn answers_are_classified() {
        let (url, server) =
            serve_once("200 OK", r#"{"choices":[{"message":{"role":"assistant","content":"12"}}]}"#).await;
        let table = table();

        let result = engine(url).chat(&DataView::new(&table, "Total sales?")).await.unwrap();
        assert_eq!(result, AnalysisValue::Number(12.0));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /chat/completions"));
        assert!(request.to_lowercase().contains("authorization: bearer test_key"));
        assert!(request.contains("Question: Total sales?"));
    }

    #[tokio::test]
    async fn api_errors_carry_status() {
        let (url, server) = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#).await;
        let table = table();

        let err = engine(url).chat(&DataView::new(&table, "q")).await.unwrap_err();
        match err {
            EngineError::Api { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn api_errors_are_not_logged_at_info() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"error":"overloaded"}"#).await;
        let table = table();

        let (logs, _guard) = capture_logs();
        let err = engine(url).chat(&DataView::new(&table, "q")).await.unwrap_err();
        assert!(matches!(err, EngineError::Api { status: 500, .. }));
        assert!(logs.lines().is_empty());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn empty_choices_are_an_error() {
        let (url, server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let table = table();

        let err = engine(url).chat(&DataView::new(&table, "q")).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyResponse));
        server.await.unwrap();
    }

    #[test]
    fn debug_output_hides_key() {
        let engine = engine("http://localhost".into());
        assert_eq!(engine.api_key(), "test_key");
        assert!(!format!("{:?}", engine).contains("test_key"));
    }
}
