// Application state management
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::PlayerError;
use crate::media::BlobStore;
use crate::player::download::{DirectoryDownloader, DownloadTrigger};
use crate::settings::PlayerSettings;

/// Shared collaborators of a mounted player. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<PlayerSettings>,
    pub blobs: BlobStore,
    pub downloader: Arc<dyn DownloadTrigger>,
    pub app_dir: PathBuf,
}

impl AppState {
    pub fn new(settings: PlayerSettings, downloader: Arc<dyn DownloadTrigger>, app_dir: PathBuf) -> Self {
        Self {
            settings: Arc::new(settings),
            blobs: BlobStore::new(),
            downloader,
            app_dir,
        }
    }

    /// Settings from `app_dir`, downloads into the configured directory
    pub fn load(app_dir: PathBuf) -> Result<Self, PlayerError> {
        let settings = PlayerSettings::load(&app_dir)?;
        let downloader = Arc::new(DirectoryDownloader::new(settings.resolved_download_dir()));
        Ok(Self::new(settings, downloader, app_dir))
    }
}
