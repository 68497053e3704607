use std::process::Stdio;

use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::error;

use crate::error::ApiError;

/// Which download strategy this deployment runs. The two are mutually
/// exclusive; clients tell them apart by the response content type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadMode {
    /// Extract an audio-only stream and pipe the bytes through.
    Stream,
    /// Hand back the watch URL plus instructions, no byte transfer.
    Delegate,
}

impl DownloadMode {
    pub fn from_env(value: &str) -> Self {
        if value.eq_ignore_ascii_case("delegate") {
            DownloadMode::Delegate
        } else {
            DownloadMode::Stream
        }
    }
}

/// Video ids are fixed-width base64url tokens.
pub fn is_valid_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/watch?v={video_id}")
}

/// Reduces a track title to something safe for a Content-Disposition
/// filename: ASCII alphanumerics and single spaces, capped at 50 chars,
/// "song" when nothing survives.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(50).collect();
    if capped.is_empty() {
        "song".to_string()
    } else {
        capped
    }
}

/// Structured response for the delegated strategy.
#[derive(Clone, Debug, Serialize)]
pub struct DelegatedDownload {
    pub success: bool,
    pub message: String,
    pub instructions: Vec<String>,
    #[serde(rename = "externalUrl")]
    pub external_url: String,
}

impl DelegatedDownload {
    pub fn for_video(video_id: &str) -> Self {
        Self {
            success: false,
            message: "Direct download is not available on this deployment".to_string(),
            instructions: vec![
                "Open the link below in a new tab".to_string(),
                "Paste it into a YouTube-to-MP3 converter of your choice".to_string(),
                "Save the converted file to your device".to_string(),
            ],
            external_url: watch_url(video_id),
        }
    }
}

/// Audio extraction via the yt-dlp binary.
///
/// Metadata lookup and the byte stream are separate invocations so the
/// attachment filename can be resolved before any response headers go out.
pub struct AudioExtractor {
    ytdlp_path: String,
}

impl AudioExtractor {
    pub fn new(ytdlp_path: String) -> Self {
        Self { ytdlp_path }
    }

    /// Resolves the track title for the attachment filename.
    pub async fn title(&self, url: &str) -> Result<String, ApiError> {
        let output = Command::new(&self.ytdlp_path)
            .args([
                "--dump-json",
                "--no-warnings",
                "--no-playlist",
                "--skip-download",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ApiError::upstream("Unable to get video information", e.into()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApiError::Upstream {
                context: "Unable to get video information",
                message: stderr.trim().to_string(),
            });
        }

        let info: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ApiError::upstream("Unable to get video information", e.into()))?;
        Ok(info
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("song")
            .to_string())
    }

    /// Spawns an audio-only extraction writing to stdout and yields its
    /// chunks. Spawn failures surface here, before any header is sent;
    /// failures after the first chunk can only terminate the stream.
    pub fn audio_stream(
        &self,
        url: &str,
    ) -> Result<impl Stream<Item = Result<Bytes, std::io::Error>>, ApiError> {
        let mut child = Command::new(&self.ytdlp_path)
            .args(["-f", "bestaudio", "--no-warnings", "--no-playlist", "-o", "-", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ApiError::upstream("Download failed", e.into()))?;

        let mut stdout = child.stdout.take().ok_or_else(|| ApiError::Upstream {
            context: "Download failed",
            message: "extractor produced no output stream".to_string(),
        })?;

        Ok(async_stream::try_stream! {
            let mut buf = vec![0u8; 64 * 1024];
            loop {
                let n = stdout.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
            // Child is owned by the stream; a client disconnect drops it and
            // kill_on_drop reaps the extractor.
            match child.wait().await {
                Ok(status) if !status.success() => {
                    error!("audio extraction exited with {status}");
                }
                Err(e) => error!("audio extraction did not shut down cleanly: {e}"),
                _ => {}
            }
        })
    }
}
