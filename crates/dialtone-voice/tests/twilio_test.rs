//! Exercises `TwilioClient` against an in-process stand-in for the Twilio
//! REST API.

use axum::{
    extract::{Form, Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use dialtone_voice::{http_client, HttpConfig, Telephony, TwilioClient, TwilioConfig, VoiceError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Captured {
    account: String,
    resource: String,
    authorization: Option<String>,
    form: HashMap<String, String>,
}

type Log = Arc<Mutex<Vec<Captured>>>;

async fn create_resource(
    State(log): State<Log>,
    Path((account, resource)): Path<(String, String)>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let prefix = if resource == "Calls.json" { "CA" } else { "SM" };
    log.lock().unwrap().push(Captured {
        account,
        resource,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        form,
    });
    (StatusCode::CREATED, Json(json!({ "sid": format!("{prefix}0001") })))
}

async fn spawn_fake_twilio(fail: bool) -> (String, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let app = if fail {
        Router::new().route(
            "/2010-04-01/Accounts/{account}/{resource}",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "code": 21211, "message": "Invalid 'To' Phone Number" })),
                )
            }),
        )
    } else {
        Router::new()
            .route(
                "/2010-04-01/Accounts/{account}/{resource}",
                post(create_resource),
            )
            .with_state(log.clone())
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), log)
}

fn client(api_base: String) -> TwilioClient {
    let mut config = TwilioConfig::new("AC123", "token", "+15550000000");
    config.api_base = api_base;
    TwilioClient::new(http_client(&HttpConfig::default()).unwrap(), config)
}

#[tokio::test]
async fn test_place_call_posts_expected_form() {
    let (base, log) = spawn_fake_twilio(false).await;
    let twilio = client(base);

    let sid = twilio
        .place_call(
            "+15551234567",
            "https://agent.example/outgoing-call",
            Some("https://agent.example/call-status"),
        )
        .await
        .expect("call should be created");
    assert_eq!(sid, "CA0001");

    let captured = log.lock().unwrap().clone();
    assert_eq!(captured.len(), 1);
    let req = &captured[0];
    assert_eq!(req.account, "AC123");
    assert_eq!(req.resource, "Calls.json");
    assert!(req
        .authorization
        .as_deref()
        .is_some_and(|v| v.starts_with("Basic ")));
    assert_eq!(req.form["To"], "+15551234567");
    assert_eq!(req.form["From"], "+15550000000");
    assert_eq!(req.form["Url"], "https://agent.example/outgoing-call");
    assert_eq!(req.form["Method"], "POST");
    assert_eq!(req.form["StatusCallback"], "https://agent.example/call-status");
    assert_eq!(req.form["StatusCallbackMethod"], "POST");
}

#[tokio::test]
async fn test_place_call_without_status_callback() {
    let (base, log) = spawn_fake_twilio(false).await;
    let twilio = client(base);

    twilio
        .place_call("+15551234567", "https://agent.example/outgoing-call", None)
        .await
        .expect("call should be created");

    let captured = log.lock().unwrap().clone();
    assert!(!captured[0].form.contains_key("StatusCallback"));
}

#[tokio::test]
async fn test_send_message_posts_body() {
    let (base, log) = spawn_fake_twilio(false).await;
    let twilio = client(base);

    let sid = twilio
        .send_message("+15559990000", "Your appointment has been confirmed")
        .await
        .expect("message should be queued");
    assert_eq!(sid, "SM0001");

    let captured = log.lock().unwrap().clone();
    assert_eq!(captured[0].resource, "Messages.json");
    assert_eq!(captured[0].form["To"], "+15559990000");
    assert_eq!(captured[0].form["Body"], "Your appointment has been confirmed");
}

#[tokio::test]
async fn test_provider_error_is_typed() {
    let (base, _) = spawn_fake_twilio(true).await;
    let twilio = client(base);

    let result = twilio.place_call("bogus", "https://agent.example/x", None).await;
    match result {
        Err(VoiceError::Provider {
            service,
            status,
            body,
        }) => {
            assert_eq!(service, "twilio");
            assert_eq!(status, 400);
            assert!(body.contains("Invalid 'To' Phone Number"));
        }
        other => panic!("Expected Provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_provider_is_http_error() {
    // Nothing listens on the discard port.
    let twilio = client("http://127.0.0.1:9".to_string());
    let result = twilio.send_message("+15550000001", "hi").await;
    assert!(matches!(result, Err(VoiceError::Http(_))), "{:?}", result);
}
