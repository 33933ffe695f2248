use actix_web::{web, HttpResponse, Responder};
use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use serde_json::json;
use uuid::Uuid;

use crate::error::RelayResult;
use crate::web::models::{ConversationRequest, RelayReply};
use crate::web::prompt::parse_turns;
use crate::AppState;

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// Root liveness endpoint
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "pm-agent",
        "root": true,
        "time": now(),
    }))
}

// Health check endpoint
pub async fn ping() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok", "time": now() }))
}

// PM agent relay endpoint
pub async fn pm_agent(
    data: web::Data<AppState>,
    req: web::Json<ConversationRequest>,
) -> RelayResult<HttpResponse> {
    let request_id = Uuid::new_v4();
    let turns = parse_turns(req.into_inner().messages)?;
    info!("[{}] Relaying conversation with {} client turns", request_id, turns.len());

    let messages = data.prompts.assemble(turns);
    debug!("[{}] Upstream messages: {:?}", request_id, messages);

    let reply = data.client.complete(messages).await?;
    info!("[{}] Reply ready ({} characters)", request_id, reply.len());

    Ok(HttpResponse::Ok().json(RelayReply { reply }))
}
