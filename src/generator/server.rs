use super::api::{generate_lorem, health_check, ApiError, GeneratorState};
use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub fn create_router(state: Arc<GeneratorState>) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/lorem", post(generate_lorem));

    with_middleware(router).with_state(state)
}

/// Request tracing, plus a JSON 500 for any handler that panics
fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "Handler panicked");
    ApiError::InternalError(format!("handler panicked: {}", detail)).into_response()
}

/// Bind `listen` (`<host>:<port>`) and serve until the shutdown flag flips to true
pub async fn run_server(
    listen: &str,
    state: Arc<GeneratorState>,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(listen).await?;
    info!(addr = %listener.local_addr()?, "Generator server listening");
    serve(listener, state, shutdown_rx).await
}

/// Serve on an already bound listener
pub async fn serve(
    listener: TcpListener,
    state: Arc<GeneratorState>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|&v| v).await;
            info!("Generator server shutting down gracefully");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::api::{GenerationResponse, TASK_INDEX_HEADER};
    use crate::generator::words::{LoremWords, WordSource};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct PanickingWords;

    impl WordSource for PanickingWords {
        fn word(&self) -> &'static str {
            panic!("word source exploded")
        }
    }

    fn state_with(words: Arc<dyn WordSource>) -> Arc<GeneratorState> {
        Arc::new(GeneratorState {
            words,
            max_paragraphs: 20,
            max_words: 200,
        })
    }

    fn lorem_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/lorem")
            .header("content-type", "application/json")
            .header(TASK_INDEX_HEADER, "4")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_lorem_returns_requested_shape() {
        let app = create_router(state_with(Arc::new(LoremWords)));
        let response = app
            .oneshot(lorem_request(r#"{"paragraphs": 2, "words": 10}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: GenerationResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body.paragraphs.len(), 2);
        assert_eq!(body.paragraphs[0].split(' ').count(), 10);
    }

    #[tokio::test]
    async fn test_lorem_accepts_zero_counts() {
        let app = create_router(state_with(Arc::new(LoremWords)));
        let response = app
            .clone()
            .oneshot(lorem_request(r#"{"paragraphs": 0, "words": 10}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["paragraphs"], serde_json::json!([]));

        let response = app
            .oneshot(lorem_request(r#"{"paragraphs": 2, "words": 0}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["paragraphs"], serde_json::json!(["", ""]));
    }

    #[tokio::test]
    async fn test_lorem_rejects_negative_counts() {
        let app = create_router(state_with(Arc::new(LoremWords)));
        let response = app
            .oneshot(lorem_request(r#"{"paragraphs": -1, "words": 10}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_lorem_enforces_limits() {
        let app = create_router(state_with(Arc::new(LoremWords)));
        let response = app
            .oneshot(lorem_request(r#"{"paragraphs": 21, "words": 10}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("at most 20"));
    }

    #[tokio::test]
    async fn test_generation_panic_becomes_500() {
        let app = create_router(state_with(Arc::new(PanickingWords)));
        let response = app
            .clone()
            .oneshot(lorem_request(r#"{"paragraphs": 1, "words": 1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"].is_string());

        // The service keeps answering afterwards
        let health = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_json_500() {
        async fn explode() -> &'static str {
            panic!("handler exploded")
        }

        let app = with_middleware(Router::new().route("/explode", get(explode)));
        let response = app
            .oneshot(Request::builder().uri("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error = body_json(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("handler exploded"));
    }
}
