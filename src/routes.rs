use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::catalog::{Catalog, Track};
use crate::download::{is_valid_video_id, sanitize_title, watch_url, DelegatedDownload, DownloadMode};
use crate::error::ApiError;
use crate::search::search_tracks;
use crate::AppState;

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

pub async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Track>>, ApiError> {
    let query = params.q.unwrap_or_default();
    let limit = params.limit.unwrap_or(20);
    info!("search: {query:?} (limit {limit})");

    let tracks = search_tracks(state.catalog.as_ref(), &query, limit).await?;
    info!("search: {} tracks for {query:?}", tracks.len());
    Ok(Json(tracks))
}

pub async fn api_download(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Response, ApiError> {
    if !is_valid_video_id(&video_id) {
        return Err(ApiError::Validation("Invalid video ID"));
    }
    let url = watch_url(&video_id);

    match state.download_mode {
        DownloadMode::Delegate => {
            info!("download (delegated): {video_id}");
            Ok(Json(DelegatedDownload::for_video(&video_id)).into_response())
        }
        DownloadMode::Stream => {
            info!("download (stream): {video_id}");
            let title = state.extractor.title(&url).await?;
            let stream = state.extractor.audio_stream(&url)?;
            Ok(AudioStreamResponse {
                filename: sanitize_title(&title),
                stream: Box::pin(stream),
            }
            .into_response())
        }
    }
}

pub async fn api_artist(
    State(state): State<AppState>,
    Path(artist_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let client = state.catalog.get().await?;
    let data = client
        .artist(&artist_id)
        .await
        .map_err(|e| ApiError::upstream("Failed to get artist data", e))?;
    Ok(Json(data))
}

pub async fn api_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "initialized": state.catalog.is_ready(),
    }))
}

/// Streaming download response. Headers are fixed here, before the first
/// byte moves; an extractor failure later can only cut the stream short.
struct AudioStreamResponse {
    filename: String,
    stream: std::pin::Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>,
}

impl IntoResponse for AudioStreamResponse {
    fn into_response(self) -> Response {
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "audio/mpeg")
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.mp3\"", self.filename),
            )
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from_stream(self.stream))
            .unwrap()
    }
}
