use async_trait::async_trait;
use chat_relay::message::{ChatResponse, ErrorBody};
use chat_relay::routes::create_router;
use chat_relay::services::generator::{GenerateError, Generator};
use chat_relay::state::AppState;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::util::ServiceExt;

#[derive(Clone, Copy)]
enum Behaviour {
    Echo,
    PingPong,
    Empty,
    Fail,
    Panic,
    Hang,
}

struct StubGenerator {
    behaviour: Behaviour,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl StubGenerator {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, message: &str, thread_id: &str) -> Result<String, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((message.to_string(), thread_id.to_string()));
        match self.behaviour {
            Behaviour::Echo => Ok(format!("echo: {message}")),
            Behaviour::PingPong if message == "ping" => Ok("pong".to_string()),
            Behaviour::PingPong => Ok(String::new()),
            Behaviour::Empty => Ok(String::new()),
            Behaviour::Fail => Err(GenerateError::Upstream("secret stack trace".to_string())),
            Behaviour::Panic => panic!("generator exploded"),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("too late".to_string())
            }
        }
    }
}

fn app(generator: Arc<StubGenerator>, timeout: Duration) -> Router {
    let state = Arc::new(AppState::new(generator, timeout));
    create_router().with_state(state)
}

fn post_chat(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn test_chat_endpoint_round_trip() {
    let generator = StubGenerator::new(Behaviour::PingPong);
    let app = app(generator.clone(), Duration::from_secs(5));

    let response = app
        .oneshot(post_chat(r#"{"message": "ping", "threadId": "t1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat_resp: ChatResponse = read_json(response).await;
    assert_eq!(chat_resp.message.as_deref(), Some("pong"));
    assert_eq!(generator.calls(), 1);
    assert_eq!(
        generator.seen.lock().unwrap().as_slice(),
        &[("ping".to_string(), "t1".to_string())]
    );
}

#[tokio::test]
async fn test_validation_rejects_missing_or_empty_fields() {
    let generator = StubGenerator::new(Behaviour::Echo);
    let app = app(generator.clone(), Duration::from_secs(5));

    let bodies = [
        r#"{"threadId": "t1"}"#,
        r#"{"message": "hello"}"#,
        r#"{"message": "", "threadId": "t1"}"#,
        r#"{"message": "hello", "threadId": ""}"#,
        r#"{"message": null, "threadId": "t1"}"#,
        r#"{}"#,
        r#"not json at all"#,
    ];

    for body in bodies {
        let response = app.clone().oneshot(post_chat(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "message": "All fields are required" }),
            "body: {body}"
        );
    }

    assert_eq!(generator.calls(), 0, "validation failures must not reach the generator");
}

#[tokio::test]
async fn test_whitespace_fields_are_forwarded_untouched() {
    let generator = StubGenerator::new(Behaviour::Echo);
    let app = app(generator.clone(), Duration::from_secs(5));

    let response = app
        .oneshot(post_chat(r#"{"message": " ", "threadId": "  "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat_resp: ChatResponse = read_json(response).await;
    assert_eq!(chat_resp.message.as_deref(), Some("echo:  "));
    assert_eq!(generator.calls(), 1);
    assert_eq!(
        generator.seen.lock().unwrap().as_slice(),
        &[(" ".to_string(), "  ".to_string())]
    );
}

#[tokio::test]
async fn test_empty_reply_is_passed_through() {
    let generator = StubGenerator::new(Behaviour::Empty);
    let app = app(generator, Duration::from_secs(5));

    let response = app
        .oneshot(post_chat(r#"{"message": "hi", "threadId": "t1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat_resp: ChatResponse = read_json(response).await;
    assert_eq!(chat_resp.message.as_deref(), Some(""));
}

#[tokio::test]
async fn test_generator_failure_maps_to_bad_gateway_without_detail() {
    let generator = StubGenerator::new(Behaviour::Fail);
    let app = app(generator.clone(), Duration::from_secs(5));

    let response = app
        .oneshot(post_chat(r#"{"message": "hi", "threadId": "t1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.kind.as_deref(), Some("generation_failed"));
    assert!(!body.message.contains("secret"));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_generator_panic_maps_to_bad_gateway() {
    let generator = StubGenerator::new(Behaviour::Panic);
    let app = app(generator.clone(), Duration::from_secs(5));

    let response = app
        .clone()
        .oneshot(post_chat(r#"{"message": "hi", "threadId": "t1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.message, "Generation failed");
    assert_eq!(body.kind.as_deref(), Some("generation_failed"));
    assert!(!body.message.contains("exploded"));

    // The relay keeps serving after the panic.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_generator_timeout_maps_to_gateway_timeout() {
    let generator = StubGenerator::new(Behaviour::Hang);
    let app = app(generator, Duration::from_millis(20));

    let response = app
        .oneshot(post_chat(r#"{"message": "hi", "threadId": "t1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.kind.as_deref(), Some("generation_timeout"));
}

#[tokio::test]
async fn test_same_thread_requests_are_not_serialized_by_relay() {
    let generator = StubGenerator::new(Behaviour::Echo);
    let app = app(generator.clone(), Duration::from_secs(5));

    let (a, b) = tokio::join!(
        app.clone()
            .oneshot(post_chat(r#"{"message": "one", "threadId": "same"}"#)),
        app.clone()
            .oneshot(post_chat(r#"{"message": "two", "threadId": "same"}"#)),
    );

    assert_eq!(a.unwrap().status(), StatusCode::OK);
    assert_eq!(b.unwrap().status(), StatusCode::OK);
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_health() {
    let app = app(StubGenerator::new(Behaviour::Echo), Duration::from_secs(5));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
