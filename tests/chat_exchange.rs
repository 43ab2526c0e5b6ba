use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};

use omega_console::{AgentState, App, ChatClient, ChatError, Role};

type Received = Arc<Mutex<Vec<Value>>>;

/// Serve `router` on an ephemeral port and return the chat endpoint URL
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/chat")
}

/// Service that answers every question with "answer to <question>"
async fn echo_server() -> (String, Received) {
    let received: Received = Arc::default();
    let router = Router::new()
        .route(
            "/chat",
            post(|State(received): State<Received>, Json(body): Json<Value>| async move {
                let question = body["question"].as_str().unwrap_or_default().to_string();
                received.lock().unwrap().push(body);
                Json(json!({ "answer": format!("answer to {question}"), "is_verified": true }))
            }),
        )
        .with_state(received.clone());
    (spawn_server(router).await, received)
}

async fn ask_through_app(app: &mut App, question: &str) {
    app.session.input = question.to_string();
    assert!(app.send());
    app.wait_pending().await;
}

#[tokio::test]
async fn test_client_posts_question_body() {
    let (endpoint, received) = echo_server().await;
    let client = ChatClient::new(&endpoint);

    let reply = client.ask("Who leads Project Omega?").await.unwrap();

    assert_eq!(reply.answer, "answer to Who leads Project Omega?");
    assert_eq!(reply.is_verified, Some(true));
    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], json!({ "question": "Who leads Project Omega?" }));
}

#[tokio::test]
async fn test_answer_42_is_verified_with_two_trace_steps() {
    let router = Router::new().route("/chat", post(|| async { Json(json!({ "answer": "42" })) }));
    let endpoint = spawn_server(router).await;
    let mut app = App::new(ChatClient::new(&endpoint));

    ask_through_app(&mut app, "What is the answer?").await;

    let messages = &app.session.messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "42");
    assert_eq!(messages[1].is_verified, Some(true));
    assert_eq!(app.session.status, AgentState::Verified);

    let trace = &app.session.trace;
    assert_eq!(trace.len(), 2);
    assert_eq!(trace[0].name, "Researcher");
    assert_eq!(trace[1].name, "Critic");
    assert!(trace.iter().all(|step| step.status.as_str() == "success"));
}

#[tokio::test]
async fn test_two_exchanges_in_order() {
    let (endpoint, received) = echo_server().await;
    let mut app = App::new(ChatClient::new(&endpoint));

    ask_through_app(&mut app, "user1").await;
    ask_through_app(&mut app, "user2").await;

    let transcript: Vec<(Role, &str)> = app
        .session
        .messages
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        transcript,
        vec![
            (Role::User, "user1"),
            (Role::Assistant, "answer to user1"),
            (Role::User, "user2"),
            (Role::Assistant, "answer to user2"),
        ]
    );
    assert_eq!(received.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_second_submit_while_in_flight_sends_nothing() {
    let (endpoint, received) = echo_server().await;
    let mut app = App::new(ChatClient::new(&endpoint));

    app.session.input = "first".to_string();
    assert!(app.send());
    app.session.input = "second".to_string();
    assert!(!app.send());

    app.wait_pending().await;

    assert_eq!(app.session.messages.len(), 2);
    assert_eq!(received.lock().unwrap().len(), 1);
    assert_eq!(app.session.input, "second");
}

#[tokio::test]
async fn test_blank_input_sends_no_request() {
    let (endpoint, received) = echo_server().await;
    let mut app = App::new(ChatClient::new(&endpoint));

    app.session.input = " \t ".to_string();
    assert!(!app.send());
    app.wait_pending().await;

    assert!(app.session.messages.is_empty());
    assert!(received.lock().unwrap().is_empty());
    assert_eq!(app.session.status, AgentState::Idle);
}

#[tokio::test]
async fn test_non_success_status_with_answer_is_accepted() {
    let router = Router::new().route(
        "/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "answer": "degraded answer" })),
            )
        }),
    );
    let endpoint = spawn_server(router).await;
    let mut app = App::new(ChatClient::new(&endpoint));

    ask_through_app(&mut app, "anything").await;

    assert_eq!(app.session.status, AgentState::Verified);
    assert_eq!(app.session.messages[1].content, "degraded answer");
}

#[tokio::test]
async fn test_unreadable_body_is_error() {
    let router = Router::new()
        .route("/chat", post(|| async { "not json" }))
        .route("/null", post(|| async { Json(Value::Null) }));
    let endpoint = spawn_server(router).await;

    let err = ChatClient::new(&endpoint).ask("q").await.unwrap_err();
    assert!(matches!(err, ChatError::Decode(_)));

    let null_body = endpoint.replace("/chat", "/null");
    let mut app = App::new(ChatClient::new(&null_body));
    ask_through_app(&mut app, "q").await;

    assert_eq!(app.session.status, AgentState::Error);
    assert_eq!(app.session.messages.len(), 1);
    assert!(app.session.trace.is_empty());
}

#[tokio::test]
async fn test_body_without_text_answer_is_still_verified() {
    let router = Router::new()
        .route("/missing", post(|| async { Json(json!({ "reply": "wrong field" })) }))
        .route("/number", post(|| async { Json(json!({ "answer": 42 })) }));
    let base = spawn_server(router).await.replace("/chat", "");

    let mut app = App::new(ChatClient::new(&format!("{base}/missing")));
    ask_through_app(&mut app, "q").await;

    assert_eq!(app.session.status, AgentState::Verified);
    assert_eq!(app.session.messages.len(), 2);
    assert_eq!(app.session.messages[1].content, "");
    assert_eq!(app.session.messages[1].is_verified, Some(true));
    assert_eq!(app.session.trace.len(), 2);

    let mut app = App::new(ChatClient::new(&format!("{base}/number")));
    ask_through_app(&mut app, "q").await;

    assert_eq!(app.session.status, AgentState::Verified);
    assert_eq!(app.session.messages[1].content, "42");
}

#[tokio::test]
async fn test_network_failure_sets_error() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut app = App::new(ChatClient::new(&format!("http://{addr}/chat")));
    ask_through_app(&mut app, "is anyone there?").await;

    assert_eq!(app.session.status, AgentState::Error);
    assert_eq!(app.session.messages.len(), 1);
    assert_eq!(app.session.messages[0].role, Role::User);
    assert!(!app.is_processing());
}

#[tokio::test]
async fn test_configured_timeout_fails_hung_request() {
    let router = Router::new().route(
        "/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Json(json!({ "answer": "too late" }))
        }),
    );
    let endpoint = spawn_server(router).await;
    let client = ChatClient::with_timeout(&endpoint, Duration::from_millis(200)).unwrap();

    let err = client.ask("slow?").await.unwrap_err();
    assert!(matches!(err, ChatError::Transport(_)));
}
