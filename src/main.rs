use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod handlers;

use handlers::{allocate, health};
use tansho::core::allocator::{AllocatorConfig, WinBetAllocator};

/// Application state shared across handlers
pub struct AppState {
    pub allocator: WinBetAllocator,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{}:{}", host, port);

    let config = AllocatorConfig {
        budget: env_parse("BUDGET", 1000),
        pred_threshold: env_parse("PRED_THRESHOLD", 0.0),
        odds_threshold: env_parse("ODDS_THRESHOLD", 1.0),
        exceed_profit_rate: env_parse("TARGET_RATE", 1.1),
        unit: env_parse("UNIT", 100),
        ..Default::default()
    };
    config.validate().expect("Invalid allocator configuration");

    info!(
        budget = config.budget,
        unit = config.unit,
        "allocator configured"
    );

    let app_state = Arc::new(AppState {
        allocator: WinBetAllocator::new(config),
    });

    info!("Starting allocation API server at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/allocate", web::post().to(allocate::allocate_race))
    })
    .bind(&addr)?
    .run()
    .await
}
