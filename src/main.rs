#[macro_use]
extern crate rocket;

use log::{info, warn};
use rocket::fairing::AdHoc;
use std::env;

use tron_engine::config::Config;
use tron_engine::debug_logger::DebugLogger;
use tron_engine::engine::{EngineController, Outbox};
use tron_engine::session::SessionHost;

mod handler;

#[launch]
async fn rocket() -> _ {
    // Lots of web hosting services expect you to bind to the port specified by the `PORT`
    // environment variable. However, Rocket looks at the `ROCKET_PORT` environment variable.
    // If we find a value for `PORT`, we set `ROCKET_PORT` to that value.
    if let Ok(port) = env::var("PORT") {
        env::set_var("ROCKET_PORT", &port);
    }

    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting Tron engine...");

    // Load configuration once at startup
    let config = Config::load_or_default();
    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;

    let mut engine = EngineController::new(config, Outbox::new());
    if let Err(e) = engine.join() {
        warn!("Initial join failed: {}", e);
    }

    rocket::build()
        .manage(SessionHost::new(engine, logger))
        .attach(AdHoc::on_response("Server ID Middleware", |_, res| {
            Box::pin(async move {
                res.set_raw_header("Server", "tron-engine");
            })
        }))
        .mount(
            "/",
            routes![
                handler::index,
                handler::start,
                handler::update,
                handler::die,
                handler::finish,
                handler::server_error
            ],
        )
}
