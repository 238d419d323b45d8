use std::{net::SocketAddr, sync::Arc};

use backend::{
    create_router,
    database::Database,
    providers::{HttpTripServices, TripServicesConfig},
    AppState,
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "waymark", about = "Route checkpoint planning service")]
struct Args {
    /// Address to bind the HTTP server on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// OpenRouteService API key (geocoding + directions).
    #[arg(long, env = "ORS_API_KEY")]
    ors_api_key: String,

    /// OpenWeatherMap API key.
    #[arg(long, env = "OWM_API_KEY")]
    owm_api_key: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let db = Database::connect(&args.database_url)
        .await
        .expect("connect to database");
    db.migrate().await.expect("run database migrations");

    let services = HttpTripServices::new(TripServicesConfig::new(
        args.ors_api_key,
        args.owm_api_key,
    ))
    .expect("build provider HTTP client");

    let state = AppState {
        db: Arc::new(db),
        services: Arc::new(services),
    };
    let app = create_router(state);

    tracing::info!("starting backend on http://{}", args.bind);
    axum::serve(tokio::net::TcpListener::bind(args.bind).await.unwrap(), app)
        .await
        .unwrap();
}
