use std::{fs::OpenOptions, sync::Arc};

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use bimap::BiMap;
use server::{auth_endpoint, server_state::ServerState, trip_endpoint};
use tokio::{net::TcpListener, sync::Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trip_planner_data_management::DataManager;

const LISTEN_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    std::fs::create_dir_all("server/log")?;
    let log_file = "server/log/server.log";

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .init();

    tracing::info!("Starting server...");

    let data_manager = DataManager::start()
        .await
        .map_err(|err| anyhow::anyhow!("Failed to start data manager: {err}"))?;

    let server_state = Arc::new(ServerState {
        data_manager,
        sessions: Mutex::new(BiMap::new()),
    });

    let app = Router::new()
        .route("/api/register", post(auth_endpoint::register))
        .route("/api/login", post(auth_endpoint::login))
        .route("/api/logout", post(auth_endpoint::logout))
        .route("/api/reset_password", post(auth_endpoint::reset_password))
        .route("/api/me", get(auth_endpoint::me))
        .route("/api/trips", get(trip_endpoint::get_trips).post(trip_endpoint::create_trip))
        .route(
            "/api/trips/{trip_id}",
            get(trip_endpoint::get_trip)
                .put(trip_endpoint::update_trip)
                .delete(trip_endpoint::delete_trip),
        )
        .route("/api/trips/{trip_id}/participants", get(trip_endpoint::get_participants))
        .route("/api/trips/{trip_id}/members", post(trip_endpoint::add_member))
        .route("/api/trips/{trip_id}/members/{user_id}", delete(trip_endpoint::remove_member))
        .route(
            "/api/trips/{trip_id}/places",
            get(trip_endpoint::get_places).post(trip_endpoint::add_place),
        )
        .route("/api/trips/{trip_id}/places/by_day", get(trip_endpoint::get_places_by_day))
        .route(
            "/api/trips/{trip_id}/places/{place_id}",
            put(trip_endpoint::update_place).delete(trip_endpoint::delete_place),
        )
        .with_state(server_state);

    let listener = TcpListener::bind(LISTEN_ADDR).await?;
    tracing::debug!("Listening on {}", LISTEN_ADDR);

    axum::serve(listener, app).await?;

    Ok(())
}
