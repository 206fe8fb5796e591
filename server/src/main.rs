mod config;
mod rate_limit;
mod routes;
mod seed;
mod services;
mod state;

#[tokio::main]
async fn main() {
    // Missing .env is fine; the process environment still applies.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env();
    let port = config.port;

    let store = match &config.seed_file {
        Some(path) => seed::load(path).expect("seed load failed"),
        None => {
            tracing::warn!("SEED_FILE not set; starting with an empty store");
            state::Store::new()
        }
    };

    let state = state::AppState::new(config, store);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "stonecrm listening");
    axum::serve(listener, app).await.expect("server failed");
}
