mod api;
mod auth_context;
mod config;
mod cookies;
mod desk;
mod guard;
mod routes;
mod session;
mod state;
mod sweeper;
mod views;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let api = api::ApiClient::new(config.timeouts).expect("http client init failed");
    let directory = Arc::new(api::directory::RemoteDirectory::new(api.clone(), config.endpoints.clone()));
    let views = views::Views::new().expect("page templates failed to compile");
    tracing::info!(
        auth = %config.endpoints.auth_base,
        appointment = %config.endpoints.appointment_base,
        admin = %config.endpoints.admin_base,
        "remote api configured"
    );

    let state = state::AppState::new(config, api, directory, views);

    // Spawn background desk sweeper.
    let _sweeper = sweeper::spawn_desk_sweeper(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "carepanel listening");
    axum::serve(listener, app).await.expect("server failed");
}
