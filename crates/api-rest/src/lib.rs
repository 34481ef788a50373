//! # API REST
//!
//! REST API for the temporal analysis service.
//!
//! Handles:
//! - HTTP endpoints with axum (form-encoded requests, JSON responses)
//! - OpenAPI/Swagger documentation
//! - Mapping of analysis errors to HTTP status codes, and CORS
//!
//! Uses `api-shared` for form and response types and `temporal-core` for the analysis itself.

#![warn(rust_2018_idioms)]

use api_shared::{
    AnalyzeForm, AnalyzeRes, CausationRes, EntityRelationsRes, ErrorRes, EventTimelineRes,
    HealthRes, HealthService, MorphologyForm, MorphologyRes, PartsOfSpeechRes, PosForm,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use serde_json::Value;
use temporal_core::{
    AnalysisError, AnalysisService, MergedAnalysisEnvelope, MorphologyAnalysis, TaskKind,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Holds the analysis service; it is cheap to clone and shares one HTTP client.
#[derive(Clone)]
pub struct AppState {
    pub service: AnalysisService,
}

impl AppState {
    pub fn new(service: AnalysisService) -> Self {
        Self { service }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        analyze,
        analyze_pos,
        analyze_morphology,
        analyze_events,
        analyze_causation,
        analyze_entities,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        AnalyzeForm,
        PosForm,
        MorphologyForm,
        AnalyzeRes,
        EventTimelineRes,
        CausationRes,
        EntityRelationsRes,
        PartsOfSpeechRes,
        MorphologyRes,
        api_shared::FallbackFields,
        api_shared::PosToken,
        api_shared::EntityRelation,
        api_shared::CausalRelation,
    ))
)]
pub struct ApiDoc;

/// Build the application router with CORS and Swagger UI attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/analyze_pos", post(analyze_pos))
        .route("/analyze_morphology", post(analyze_morphology))
        .route("/analyze_events", post(analyze_events))
        .route("/analyze_causation", post(analyze_causation))
        .route("/analyze_entities", post(analyze_entities))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// An analysis failure on its way out as an HTTP response.
///
/// Only backend and configuration failures get here. A model reply that could not be decoded is
/// answered with `200` and the fallback payload.
#[derive(Debug)]
pub struct ApiError(AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AnalysisError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AnalysisError::InvalidTask(_) | AnalysisError::InvalidConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!("analysis request failed ({}): {}", status, self.0);
        let body = ErrorRes {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Also served at `/`. Does not contact the
/// completion backend.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/analyze",
    request_body(content = AnalyzeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Merged events, causation and entity relations",
            body = AnalyzeRes),
        (status = 502, description = "Completion backend unavailable for every part",
            body = ErrorRes),
        (status = 504, description = "Completion backend timed out for every part", body = ErrorRes)
    )
)]
/// Run the combined analysis
///
/// Events/timeline, causation and entity relations are analysed concurrently and merged. A part
/// that failed is reported under `errors`; the request only fails when all three failed.
#[axum::debug_handler]
async fn analyze(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> ApiResult<MergedAnalysisEnvelope> {
    let envelope = state
        .service
        .analyze_combined(&form.input_text, form.doc_date(), &form.language)
        .await?;
    Ok(Json(envelope))
}

#[utoipa::path(
    post,
    path = "/analyze_pos",
    request_body(content = PosForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Part-of-speech tags per token", body = PartsOfSpeechRes),
        (status = 502, description = "Completion backend unavailable", body = ErrorRes),
        (status = 504, description = "Completion backend timed out", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn analyze_pos(
    State(state): State<AppState>,
    Form(form): Form<PosForm>,
) -> ApiResult<Value> {
    let result = state
        .service
        .analyze_parts_of_speech(&form.input_text, &form.language)
        .await?;
    Ok(Json(result.into_payload(TaskKind::PartOfSpeech)))
}

#[utoipa::path(
    post,
    path = "/analyze_morphology",
    request_body(content = MorphologyForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Free-text morphological analysis of the word",
            body = MorphologyRes),
        (status = 502, description = "Completion backend unavailable", body = ErrorRes),
        (status = 504, description = "Completion backend timed out", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn analyze_morphology(
    State(state): State<AppState>,
    Form(form): Form<MorphologyForm>,
) -> ApiResult<MorphologyAnalysis> {
    let analysis = state
        .service
        .analyze_morphology(&form.word, &form.language)
        .await?;
    Ok(Json(analysis))
}

#[utoipa::path(
    post,
    path = "/analyze_events",
    request_body(content = AnalyzeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Events, named entities and timeline",
            body = EventTimelineRes),
        (status = 502, description = "Completion backend unavailable", body = ErrorRes),
        (status = 504, description = "Completion backend timed out", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn analyze_events(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> ApiResult<Value> {
    let result = state
        .service
        .analyze_events(&form.input_text, form.doc_date(), &form.language)
        .await?;
    Ok(Json(result.into_payload(TaskKind::EventTimeline)))
}

#[utoipa::path(
    post,
    path = "/analyze_causation",
    request_body(content = AnalyzeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Causal graph between events", body = CausationRes),
        (status = 502, description = "Completion backend unavailable", body = ErrorRes),
        (status = 504, description = "Completion backend timed out", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn analyze_causation(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> ApiResult<Value> {
    let result = state
        .service
        .analyze_causation(&form.input_text, &form.language)
        .await?;
    Ok(Json(result.into_payload(TaskKind::Causation)))
}

#[utoipa::path(
    post,
    path = "/analyze_entities",
    request_body(content = AnalyzeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Relations between entities", body = EntityRelationsRes),
        (status = 502, description = "Completion backend unavailable", body = ErrorRes),
        (status = 504, description = "Completion backend timed out", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn analyze_entities(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> ApiResult<Value> {
    let result = state
        .service
        .analyze_entities(&form.input_text, &form.language)
        .await?;
    Ok(Json(result.into_payload(TaskKind::EntityRelations)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use temporal_core::{
        AnalysisResult, CompletionBackend, CompletionInvoker, ModelTier, RawCompletion,
    };
    use tower::ServiceExt;

    enum Reply {
        Text(&'static str),
        Unavailable,
        TimedOut,
    }

    struct FakeBackend {
        reply: Reply,
        prompts: Mutex<Vec<(String, ModelTier)>>,
    }

    #[async_trait]
    impl CompletionBackend for FakeBackend {
        async fn complete(&self, prompt: &str, tier: ModelTier) -> AnalysisResult<RawCompletion> {
            self.prompts
                .lock()
                .expect("lock poisoned")
                .push((prompt.to_string(), tier));
            match self.reply {
                Reply::Text(text) => Ok(RawCompletion::new(text)),
                Reply::Unavailable => Err(AnalysisError::BackendUnavailable("HTTP 503".into())),
                Reply::TimedOut => Err(AnalysisError::BackendTimeout(Duration::from_secs(120))),
            }
        }
    }

    fn app(reply: Reply) -> (Router, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        let invoker = CompletionInvoker::new(backend.clone(), Duration::from_secs(5));
        let state = AppState::new(AnalysisService::new(invoker));
        (router(state), backend)
    }

    fn form_request(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request builds")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let body = serde_json::from_slice(&bytes).expect("body is JSON");
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, backend) = app(Reply::Unavailable);
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request builds");

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert!(backend.prompts.lock().expect("lock poisoned").is_empty());
    }

    #[tokio::test]
    async fn root_path_is_a_liveness_check() {
        let (app, _) = app(Reply::Unavailable);
        let request = Request::builder()
            .uri("/")
            .body(Body::empty())
            .expect("request builds");

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
    }

    #[tokio::test]
    async fn pos_language_defaults_to_english() {
        let (app, backend) = app(Reply::Text(
            r#"```json
{"parts_of_speech": [{"token": "Hello", "tokenId": 0, "partOfSpeech": "Interjection"}]}
```"#,
        ));

        let (status, body) = send(app, form_request("/analyze_pos", "input_text=Hello")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["parts_of_speech"][0]["partOfSpeech"], json!("Interjection"));

        let prompts = backend.prompts.lock().expect("lock poisoned");
        assert!(prompts[0].0.contains("THIS LANGUAGE: English"));
        assert_eq!(prompts[0].1, ModelTier::Light);
    }

    #[tokio::test]
    async fn malformed_reply_is_still_ok() {
        let (app, _) = app(Reply::Text("Sorry, I can't help with that."));

        let (status, body) = send(
            app,
            form_request(
                "/analyze",
                "input_text=The+court+ruled+on+Monday.&doc_date=2024-03-01&language=English",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"], json!([]));
        assert_eq!(body["error"], json!("JSON parsing failed"));
        assert_eq!(body["event_relations"]["relations"], json!([]));
        assert_eq!(body["entity_relations"], json!([]));
        assert_eq!(body["errors"].as_object().expect("errors map").len(), 3);
    }

    #[tokio::test]
    async fn analyze_merges_parts() {
        let (app, backend) = app(Reply::Text(
            r#"{"entity_relations": [{"source_entity": "court", "target_entity": "case", "relation": "rules on"}]}"#,
        ));

        let (status, body) = send(
            app,
            form_request("/analyze", "input_text=The+court+ruled.&doc_date=2024-03-01"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entity_relations"][0]["relation"], json!("rules on"));
        assert_eq!(body["summary"], json!(""));
        assert!(body.get("errors").is_none());

        let prompts = backend.prompts.lock().expect("lock poisoned");
        assert_eq!(prompts.len(), 3);
        assert!(prompts
            .iter()
            .any(|(prompt, _)| prompt.contains("Document Date: 2024-03-01")));
    }

    #[tokio::test]
    async fn backend_unavailable_maps_to_bad_gateway() {
        let (app, _) = app(Reply::Unavailable);

        let (status, body) =
            send(app, form_request("/analyze_entities", "input_text=text")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().expect("error message").contains("HTTP 503"));
    }

    #[tokio::test]
    async fn combined_analysis_fails_only_when_every_part_fails() {
        let (app, _) = app(Reply::Unavailable);

        let (status, body) = send(app, form_request("/analyze", "input_text=text")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn backend_timeout_maps_to_gateway_timeout() {
        let (app, _) = app(Reply::TimedOut);

        let (status, _) = send(app, form_request("/analyze_causation", "input_text=text")).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn morphology_returns_word_and_analysis() {
        let (app, backend) = app(Reply::Text("A gerund of the verb correr."));

        let (status, body) = send(
            app,
            form_request("/analyze_morphology", "word=corriendo&language=Spanish"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "word": "corriendo", "analysis": "A gerund of the verb correr." })
        );
        let prompts = backend.prompts.lock().expect("lock poisoned");
        assert!(prompts[0].0.contains("corriendo"));
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/analyze",
            "/analyze_pos",
            "/analyze_morphology",
            "/analyze_events",
            "/analyze_causation",
            "/analyze_entities",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
