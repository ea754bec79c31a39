// Saving the current audio to disk
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::error::PlayerError;
use crate::media::{BlobStore, MediaSource};

/// Filename for a download of `source`.
///
/// The last path segment wins when it looks like it carries an extension;
/// anything else (blob references, bare hosts, unparsable strings) falls back
/// to `default_filename`.
pub fn download_filename(source: &MediaSource, default_filename: &str) -> String {
    let url = match source.parse_url() {
        Ok(url) => url,
        Err(e) => {
            log::warn!("{}; using default filename", e);
            return default_filename.to_string();
        }
    };

    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| segment.contains('.'))
        .map(str::to_string)
        .unwrap_or_else(|| default_filename.to_string())
}

/// What to hand the save mechanism
#[derive(Debug, Clone)]
pub enum SaveRequest {
    /// Bytes already in memory
    Bytes {
        bytes: Arc<Vec<u8>>,
        filename: String,
    },
    /// A network or file address; the server may rename it
    Url { url: Url, filename_hint: String },
}

/// Host mechanism that performs a client-side save
#[async_trait]
pub trait DownloadTrigger: Send + Sync {
    /// Returns where the audio ended up
    async fn save(&self, request: SaveRequest) -> Result<PathBuf, PlayerError>;
}

/// Saves downloads into a directory, never overwriting existing files
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
    client: reqwest::Client,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PlayerError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PlayerError::Save(format!("Failed to create {:?}: {}", self.dir, e)))?;

        let path = unique_path(&self.dir, &sanitize_filename(filename));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PlayerError::Save(format!("Failed to write {:?}: {}", path, e)))?;

        log::info!("Saved {} bytes to {:?}", bytes.len(), path);
        Ok(path)
    }

    async fn fetch_remote(&self, url: &Url, filename_hint: &str) -> Result<PathBuf, PlayerError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PlayerError::FetchFailure(e.to_string()))?;

        // The server's name takes precedence over ours
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(content_disposition_filename)
            .unwrap_or_else(|| filename_hint.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlayerError::FetchFailure(e.to_string()))?;

        self.write(&filename, &bytes).await
    }
}

#[async_trait]
impl DownloadTrigger for DirectoryDownloader {
    async fn save(&self, request: SaveRequest) -> Result<PathBuf, PlayerError> {
        match request {
            SaveRequest::Bytes { bytes, filename } => self.write(&filename, &bytes).await,
            SaveRequest::Url { url, filename_hint } => match url.scheme() {
                "http" | "https" => self.fetch_remote(&url, &filename_hint).await,
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| PlayerError::UnsupportedSource(url.to_string()))?;
                    let bytes = tokio::fs::read(&path)
                        .await
                        .map_err(|e| PlayerError::FetchFailure(format!("{:?}: {}", path, e)))?;
                    self.write(&filename_hint, &bytes).await
                }
                _ => Err(PlayerError::UnsupportedSource(url.to_string())),
            },
        }
    }
}

/// Fetch the source if it is a transient blob, then save it.
///
/// The fetched copy is the only transient resource this creates and is
/// released when the save finishes; the element's own blob stays live.
pub async fn save_source(
    blobs: &BlobStore,
    trigger: &dyn DownloadTrigger,
    source: &MediaSource,
    filename: String,
) -> Result<PathBuf, PlayerError> {
    let request = if source.is_blob() {
        let blob = blobs.fetch(source).await?;
        SaveRequest::Bytes {
            bytes: blob.bytes,
            filename,
        }
    } else {
        let url = source
            .parse_url()
            .map_err(|e| PlayerError::FetchFailure(e.to_string()))?;
        SaveRequest::Url {
            url,
            filename_hint: filename,
        }
    };
    trigger.save(request).await
}

/// `filename` parameter of a Content-Disposition header
fn content_disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// Keep only the final path component
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() || base == "." || base == ".." {
        "download".to_string()
    } else {
        base.to_string()
    }
}

/// `name`, or `stem (n).ext` for the first free n
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    };
    (1..)
        .map(|n| dir.join(format!("{} ({}){}", stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
