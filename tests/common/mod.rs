#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServerHandle, ServiceResponse},
    test as actix_test,
    web::{self, Data},
    App, HttpRequest, HttpResponse, HttpServer,
};
use pm_agent_relay::{build_app, config::RelayConfig, web::cors::CorsPolicy, AppState};
use serde_json::Value;

/// What the mock completion API answers with.
#[derive(Clone)]
pub enum MockReply {
    Json(u16, Value),
    Text(u16, String),
    Delayed(Duration, Value),
}

/// One request as seen by the mock upstream.
#[derive(Clone, Debug)]
pub struct ReceivedCall {
    pub body: Value,
    pub authorization: Option<String>,
}

struct MockState {
    reply: MockReply,
    calls: Arc<Mutex<Vec<ReceivedCall>>>,
}

/// Chat-completion server bound to an ephemeral local port.
pub struct MockUpstream {
    pub url: String,
    calls: Arc<Mutex<Vec<ReceivedCall>>>,
    handle: ServerHandle,
}

impl MockUpstream {
    pub async fn start(reply: MockReply) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = Data::new(MockState {
            reply,
            calls: calls.clone(),
        });

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .route("/v1/chat/completions", web::post().to(mock_chat_completions))
        })
        .workers(1)
        .disable_signals()
        .listen(listener)
        .unwrap()
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            url: format!("http://127.0.0.1:{}/v1/chat/completions", port),
            calls,
            handle,
        }
    }

    pub fn calls(&self) -> Vec<ReceivedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn mock_chat_completions(
    state: web::Data<MockState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    state.calls.lock().unwrap().push(ReceivedCall {
        body: body.into_inner(),
        authorization: req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    match &state.reply {
        MockReply::Json(status, value) => status_builder(*status).json(value),
        MockReply::Text(status, text) => status_builder(*status).content_type("text/plain").body(text.clone()),
        MockReply::Delayed(delay, value) => {
            actix_web::rt::time::sleep(*delay).await;
            HttpResponse::Ok().json(value)
        }
    }
}

fn status_builder(status: u16) -> actix_web::HttpResponseBuilder {
    HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap())
}

/// Relay configuration pointing at `upstream_url`, with extra overrides.
pub fn relay_config(upstream_url: &str, overrides: &[(&str, &str)]) -> RelayConfig {
    let mut vars: Vec<(String, String)> = vec![
        ("UPSTREAM_URL".into(), upstream_url.into()),
        ("OPENAI_API_KEY".into(), "sk-test".into()),
        ("SYSTEM_PROMPT".into(), "You are a test PM agent.".into()),
        ("ORG_CONTEXT".into(), "Org: Test".into()),
        ("UPSTREAM_TIMEOUT_SECS".into(), "5".into()),
    ];
    for (k, v) in overrides {
        vars.retain(|(key, _)| key != k);
        vars.push((k.to_string(), v.to_string()));
    }
    RelayConfig::from_lookup(|key| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())).unwrap()
}

/// Relay app wired the same way the server wires it.
pub async fn relay_service(
    config: &RelayConfig,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    let state = Data::new(AppState::new(config).unwrap());
    let cors = Data::new(CorsPolicy::new(&config.cors));
    actix_test::init_service(build_app(state, cors, config.server.json_limit)).await
}
