// HTTP handler bindings for the game relay
//
// This module provides thin wrapper functions that bind Rocket HTTP routes
// to the shared session host. Handlers are responsible for:
// - Deserializing incoming JSON requests
// - Turning each request into a session event for the host
// - Returning the messages the engine queued for the game server

use log::warn;
use rocket::response::status::BadRequest;
use rocket::serde::json::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use tron_engine::debug_logger::SessionEvent;
use tron_engine::session::SessionHost;
use tron_engine::types::{AgentId, FinalScore, RawPositions};

#[derive(Deserialize)]
pub struct PlayerRequest {
    pub player_id: AgentId,
}

#[derive(Deserialize)]
pub struct StateRequest {
    pub positions: RawPositions,
}

#[derive(Deserialize)]
pub struct FinishRequest {
    #[serde(default)]
    pub scores: Vec<FinalScore>,
}

#[derive(Deserialize)]
pub struct ErrorRequest {
    pub player_id: AgentId,
    pub code: u8,
}

type Reply = Result<Json<Value>, BadRequest<String>>;

fn dispatch(host: &SessionHost, event: SessionEvent) -> Reply {
    match host.handle(event) {
        Ok(handled) => {
            let mut body = json!({ "messages": handled.messages });
            if handled.outcome.is_some() {
                let chosen = handled.chosen_move();
                body["move"] = json!(chosen);
                body["code"] = json!(chosen.map(|d| d.code()));
            }
            Ok(Json(body))
        }
        Err(e) => {
            warn!("Rejected event: {}", e);
            Err(BadRequest(e.to_string()))
        }
    }
}

/// GET / endpoint
/// Returns engine metadata, the current session phase and any queued messages
/// (the join request queued at startup is delivered this way)
#[get("/")]
pub fn index(host: &rocket::State<SessionHost>) -> Json<Value> {
    host.with_engine(|engine| {
        let messages = engine.transport_mut().drain();
        Json(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "phase": format!("{:?}", engine.phase()),
            "player_id": engine.self_id(),
            "grid": {
                "width": engine.config().grid.width,
                "height": engine.config().grid.height,
            },
            "messages": messages,
        }))
    })
}

/// POST /start endpoint
/// Called when a game starts and assigns our identity
#[post("/start", format = "json", data = "<req>")]
pub fn start(host: &rocket::State<SessionHost>, req: Json<PlayerRequest>) -> Reply {
    dispatch(
        host,
        SessionEvent::Start {
            player_id: req.player_id,
        },
    )
}

/// POST /state endpoint
/// Called every tick with the four raw positions; returns the chosen move
#[post("/state", format = "json", data = "<req>")]
pub fn update(host: &rocket::State<SessionHost>, req: Json<StateRequest>) -> Reply {
    dispatch(
        host,
        SessionEvent::State {
            positions: req.positions,
            chosen_move: None,
        },
    )
}

/// POST /die endpoint
/// Called when any player dies
#[post("/die", format = "json", data = "<req>")]
pub fn die(host: &rocket::State<SessionHost>, req: Json<PlayerRequest>) -> Reply {
    dispatch(
        host,
        SessionEvent::Die {
            player_id: req.player_id,
        },
    )
}

/// POST /finish endpoint
/// Called when the session ends; the engine resets and queues a rejoin
#[post("/finish", format = "json", data = "<req>")]
pub fn finish(host: &rocket::State<SessionHost>, req: Json<FinishRequest>) -> Reply {
    dispatch(
        host,
        SessionEvent::Finish {
            scores: req.into_inner().scores,
        },
    )
}

/// POST /error endpoint
/// Called when the game server reports an error for a player
#[post("/error", format = "json", data = "<req>")]
pub fn server_error(host: &rocket::State<SessionHost>, req: Json<ErrorRequest>) -> Reply {
    dispatch(
        host,
        SessionEvent::Error {
            player_id: req.player_id,
            code: req.code,
        },
    )
}
