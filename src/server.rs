//! Webhook HTTP endpoint.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use log::{debug, error, info};
use serde::Serialize;

use crate::dingtalk::RobotMessage;
use crate::error::{RelayError, Result};
use crate::relay::{Relay, ReplySink, dispatch};

/// Shared state for the webhook handlers.
pub struct AppState {
    pub relay: Relay,
    pub sink: Arc<dyn ReplySink>,
}

#[derive(Debug, Serialize)]
struct WebhookResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            RelayError::Payload(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = WebhookResponse {
            success: false,
            message: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn webhook(State(state): State<Arc<AppState>>, body: String) -> Result<Json<WebhookResponse>> {
    if body.is_empty() {
        debug!("Webhook called with an empty body");
        return Ok(Json(WebhookResponse {
            success: true,
            message: Some("request body is empty".to_string()),
        }));
    }

    debug!("Webhook body: {body}");
    let message = RobotMessage::parse(&body)
        .inspect_err(|e| error!("Rejected webhook payload: {e}"))?;
    if !message.is_text() {
        debug!("Ignoring {:?} callback", message.msg_type);
        return Ok(Json(WebhookResponse {
            success: true,
            message: Some("ignored non-text message".to_string()),
        }));
    }
    let event = message.into_event();

    dispatch(&state.relay, state.sink.as_ref(), &event).await?;

    Ok(Json(WebhookResponse {
        success: true,
        message: None,
    }))
}

/// Builds the webhook router. `/` accepts both GET and POST callbacks.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(webhook).post(webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// Serves the webhook until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve<F>(addr: SocketAddr, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::relay::testing::{RecordingCompletion, RecordingSink};
    use crate::session::InMemorySessionStore;

    fn app(sink: Arc<RecordingSink>) -> Router {
        let relay = Relay::new(
            Arc::new(RecordingCompletion::replying("4")),
            Arc::new(InMemorySessionStore::new("clear")),
        );
        build_router(Arc::new(AppState { relay, sink }))
    }

    fn request(method: Method, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    const CALLBACK: &str = r#"{"senderId":"u1","senderNick":"Bob","msgtype":"text",
        "text":{"content":"@Bob 2+2?"},"sessionWebhook":"https://example.invalid/hook"}"#;

    #[tokio::test]
    async fn empty_body_is_acknowledged() {
        let sink = Arc::new(RecordingSink::default());
        let response = app(sink.clone())
            .oneshot(request(Method::POST, ""))
            .await
            .expect("infallible");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "request body is empty");
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let sink = Arc::new(RecordingSink::default());
        let response = app(sink.clone())
            .oneshot(request(Method::POST, "{not json"))
            .await
            .expect("infallible");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], false);
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn callback_is_answered() {
        let sink = Arc::new(RecordingSink::default());
        let response = app(sink.clone())
            .oneshot(request(Method::POST, CALLBACK))
            .await
            .expect("infallible");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sink.sent(), vec![("u1".to_string(), "@Bob\n 4".to_string())]);
    }

    #[tokio::test]
    async fn non_text_callbacks_are_ignored() {
        let sink = Arc::new(RecordingSink::default());
        let body = r#"{"senderId":"u1","senderNick":"Bob","msgtype":"picture",
            "sessionWebhook":"https://example.invalid/hook"}"#;
        let response = app(sink.clone())
            .oneshot(request(Method::POST, body))
            .await
            .expect("infallible");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "ignored non-text message");
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn get_callbacks_are_accepted() {
        let sink = Arc::new(RecordingSink::default());
        let response = app(sink.clone())
            .oneshot(request(Method::GET, CALLBACK))
            .await
            .expect("infallible");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn delivery_failure_is_server_error() {
        let response = app(Arc::new(RecordingSink::failing()))
            .oneshot(request(Method::POST, CALLBACK))
            .await
            .expect("infallible");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["success"], false);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(Arc::new(RecordingSink::default()))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("infallible");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
