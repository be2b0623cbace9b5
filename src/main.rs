use hrm_api::config::AppConfig;
use hrm_api::database::manager;
use hrm_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    tracing::info!("Starting HRM API in {:?} mode", config.environment);

    let pool = match manager::connect(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("failed to configure database pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = manager::migrate(&pool).await {
        tracing::error!("failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let port = config.server.port;
    let state = AppState::new(pool, config);
    let app = hrm_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("HRM API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
