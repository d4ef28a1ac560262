//! The language model behind the relay, spoken to over an OpenAI-compatible chat API.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::config::Config;

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request to the model failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("model returned no choices")]
    NoChoices,
}

pub trait ChatBackend: Send + Sync + 'static {
    /// Sends `question` as the user message and returns the first completion.
    fn complete(
        &self,
        question: &str,
    ) -> impl Future<Output = Result<String, UpstreamError>> + Send;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

pub struct OpenAiCompatible {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiCompatible {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;
        Ok(Self {
            http,
            url: format!("{}/chat/completions", config.api_base),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

impl ChatBackend for OpenAiCompatible {
    async fn complete(&self, question: &str) -> Result<String, UpstreamError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let response: ChatResponse = response.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(UpstreamError::NoChoices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use std::time::Duration;

    fn config(api_base: String) -> Config {
        Config {
            api_key: "test-key".to_string(),
            api_base,
            model: "sonar-pro".to_string(),
            max_tokens: 2048,
            allowed_origin: "http://127.0.0.1:5500".to_string(),
            bind: ([127, 0, 0, 1], 0).into(),
            upstream_timeout: Duration::from_secs(5),
        }
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}")
    }

    async fn completions(
        headers: HeaderMap,
        Json(request): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        assert_eq!(headers["authorization"], "Bearer test-key");
        assert_eq!(request["model"], "sonar-pro");
        assert_eq!(request["max_tokens"], 2048);
        assert_eq!(request["messages"][0]["role"], "system");
        assert_eq!(request["messages"][0]["content"], "You are a helpful assistant.");
        assert_eq!(request["messages"][1]["role"], "user");

        let question = request["messages"][1]["content"].as_str().unwrap_or_default();
        if question == "nothing" {
            return (StatusCode::OK, Json(serde_json::json!({"choices": []})));
        }
        if question == "overloaded" {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({"error": "slow down"})),
            );
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": format!("Antwort: {question}")}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ]
            })),
        )
    }

    #[tokio::test]
    async fn test_first_choice_is_returned() {
        let base = spawn(Router::new().route("/chat/completions", post(completions))).await;
        let backend = OpenAiCompatible::new(&config(base)).unwrap();
        assert_eq!(backend.complete("Hallo").await.unwrap(), "Antwort: Hallo");
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let base = spawn(Router::new().route("/chat/completions", post(completions))).await;
        let backend = OpenAiCompatible::new(&config(base)).unwrap();
        assert!(matches!(
            backend.complete("nothing").await,
            Err(UpstreamError::NoChoices)
        ));
    }

    #[tokio::test]
    async fn test_error_status() {
        let base = spawn(Router::new().route("/chat/completions", post(completions))).await;
        let backend = OpenAiCompatible::new(&config(base)).unwrap();
        let err = backend.complete("overloaded").await.unwrap_err();
        let UpstreamError::Status { status, .. } = err else {
            panic!("expected a status error, got {err:?}");
        };
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }
}
