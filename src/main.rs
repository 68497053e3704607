use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

mod catalog;
mod download;
mod error;
mod init;
mod page;
mod routes;
mod search;
mod ytmusic;

use download::{AudioExtractor, DownloadMode};
use init::SingleFlight;
use ytmusic::YtMusicClient;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<SingleFlight<YtMusicClient>>,
    pub extractor: Arc<AudioExtractor>,
    pub download_mode: DownloadMode,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize Logging
    tracing_subscriber::fmt()
        .with_env_filter("info,ytm_player=debug")
        .init();

    // 2. Load Config
    dotenvy::dotenv().ok();
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let download_mode = DownloadMode::from_env(
        &std::env::var("DOWNLOAD_MODE").unwrap_or_else(|_| "stream".to_string()),
    );
    let ytdlp_path = std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string());
    info!("Download mode: {:?}", download_mode);

    // 3. Build State
    // The catalog client is not connected here; the single-flight
    // initializer builds it on first demand and shares it process-wide.
    let state = AppState {
        catalog: Arc::new(SingleFlight::new(YtMusicClient::connect)),
        extractor: Arc::new(AudioExtractor::new(ytdlp_path)),
        download_mode,
    };

    // 4. Setup Router
    let app = Router::new()
        .route("/", get(page::web_interface))
        .route("/api/search", get(routes::api_search))
        .route("/api/download/:video_id", get(routes::api_download))
        .route("/api/artist/:artist_id", get(routes::api_artist))
        .route("/api/health", get(routes::api_health))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    // 5. Start Server
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Music server listening on http://{}", addr);

    // Warm the catalog client so the first search skips the cold start. A
    // failed warm-up resets the initializer; later requests retry.
    let warmup = state.catalog.clone();
    tokio::spawn(async move {
        if let Err(e) = warmup.get().await {
            error!("Catalog warm-up failed: {}", e);
        }
    });

    axum::serve(listener, app).await?;

    Ok(())
}
