use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use vocab_utils::relay::{
    ANSWER_PATH, AnswerRequest, AnswerResponse, ErrorResponse, FAILED_TO_RETRIEVE_ANSWER,
    QUESTION_REQUIRED,
};

use crate::upstream::{ChatBackend, UpstreamError};

pub struct AppState<B> {
    backend: Arc<B>,
}

// derived Clone would require `B: Clone`
impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("question is required")]
    QuestionRequired,

    #[error("failed to retrieve answer: {0}")]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::QuestionRequired => (StatusCode::BAD_REQUEST, QUESTION_REQUIRED),
            ApiError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, FAILED_TO_RETRIEVE_ANSWER),
        };
        let body = ErrorResponse {
            error: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn build_app<B: ChatBackend>(backend: B, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([allowed_origin])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let state = AppState {
        backend: Arc::new(backend),
    };

    Router::new()
        .route("/", get(|| async { "vocab trainer relay is running" }))
        .route(ANSWER_PATH, post(get_answer::<B>))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(cors)
}

async fn get_answer<B: ChatBackend>(
    State(state): State<AppState<B>>,
    request: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let question = match request {
        Ok(Json(request)) if !request.question.is_empty() => request.question,
        Ok(_) => return Err(ApiError::QuestionRequired),
        Err(rejection) => {
            log::info!("Rejecting answer request: {rejection}");
            return Err(ApiError::QuestionRequired);
        }
    };

    let answer = state
        .backend
        .complete(&question)
        .await
        .inspect_err(|e| log::error!("Error calling the model: {e}"))?;

    Ok(Json(AnswerResponse {
        answer: Some(answer),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;
    use tower::ServiceExt as _;

    const ORIGIN: &str = "http://127.0.0.1:5500";

    #[derive(Default)]
    struct Recording {
        questions: Mutex<Vec<String>>,
    }

    impl ChatBackend for Arc<Recording> {
        async fn complete(&self, question: &str) -> Result<String, UpstreamError> {
            self.questions
                .lock()
                .unwrap()
                .push(question.to_string());
            Ok(format!("Antwort auf: {question}"))
        }
    }

    struct Failing;

    impl ChatBackend for Failing {
        async fn complete(&self, _question: &str) -> Result<String, UpstreamError> {
            Err(UpstreamError::NoChoices)
        }
    }

    fn app<B: ChatBackend>(backend: B) -> Router {
        build_app(backend, HeaderValue::from_static(ORIGIN))
    }

    fn post_answer(body: &'static str) -> Request<Body> {
        Request::post(ANSWER_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_answer_is_relayed() {
        let backend = Arc::new(Recording::default());
        let response = app(backend.clone())
            .oneshot(post_answer(r#"{"question": "Was ist ein Hund?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"answer": "Antwort auf: Was ist ein Hund?"})
        );
        assert_eq!(
            *backend.questions.lock().unwrap(),
            vec!["Was ist ein Hund?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_question_is_required() {
        for body in [r#"{"question": ""}"#, "{}", "not json", r#"{"question": 3}"#] {
            let backend = Arc::new(Recording::default());
            let response = app(backend.clone()).oneshot(post_answer(body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(
                json_body(response).await,
                serde_json::json!({"error": "Question is required"})
            );
            assert!(backend.questions.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_is_rejected() {
        let request = Request::post(ANSWER_PATH)
            .body(Body::from(r#"{"question": "Hallo"}"#))
            .unwrap();
        let response = app(Arc::new(Recording::default()))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let response = app(Failing)
            .oneshot(post_answer(r#"{"question": "Hallo"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"error": "Failed to retrieve answer"})
        );
    }

    #[tokio::test]
    async fn test_liveness_route() {
        let response = app(Failing)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(ANSWER_PATH)
            .header(header::ORIGIN, ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app(Failing).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            ORIGIN
        );
    }

    #[tokio::test]
    async fn test_cors_echoes_configured_origin() {
        let request = Request::post(ANSWER_PATH)
            .header(header::ORIGIN, ORIGIN)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"question": "Hallo"}"#))
            .unwrap();
        let response = app(Arc::new(Recording::default()))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            ORIGIN
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_other_origins() {
        let request = Request::post(ANSWER_PATH)
            .header(header::ORIGIN, "http://evil.example")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"question": "Hallo"}"#))
            .unwrap();
        let response = app(Arc::new(Recording::default()))
            .oneshot(request)
            .await
            .unwrap();
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
