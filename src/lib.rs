// ttsplayer - audio player controller for text-to-speech playback
// Module declarations
pub mod audio;
pub mod error;
pub mod media;
pub mod player;
pub mod runtime;
pub mod settings;
pub mod state;

pub use error::{PlayerError, Severity, UserMessage};
pub use media::{BlobStore, HeadlessMediaElement, MediaElement, MediaEvent, MediaSource};
pub use player::{AudioPlayerController, Gesture, HostEvent, PlaybackViewState, PlayerStatus, PlayerView};
pub use runtime::{EventLoop, EventQueue, HostSender, PlayerObserver};
pub use settings::PlayerSettings;
pub use state::AppState;

#[cfg(feature = "native-output")]
pub use app::run;

#[cfg(feature = "native-output")]
mod app {
    use anyhow::{bail, Context, Result};
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::audio::NativeMediaElement;
    use crate::media::MediaSource;
    use crate::player::{AudioPlayerController, Gesture, HostEvent, PlaybackViewState, PlayerStatus, PlayerView};
    use crate::runtime::{EventLoop, EventQueue, HostSender, PlayerObserver};
    use crate::state::AppState;

    /// Logs the controls whenever they change and stops the loop once playback finishes
    struct ConsoleView {
        last: String,
        host: HostSender,
    }

    impl PlayerObserver for ConsoleView {
        fn on_update(&mut self, view: &PlayerView, state: &PlaybackViewState) {
            let summary = view.summary();
            if summary != self.last {
                log::info!("{}", summary);
                self.last = summary;
            }
            if let Some(message) = view.banner.current() {
                log::debug!("banner: {}", message.text);
            }
            if matches!(state.status, PlayerStatus::Finished | PlayerStatus::Failed) {
                self.host.post(HostEvent::Shutdown);
            }
        }
    }

    fn app_dir() -> PathBuf {
        std::env::var_os("TTSPLAYER_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("ttsplayer"))
    }

    /// Play one file through the default output device
    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let Some(file) = std::env::args_os().nth(1).map(PathBuf::from) else {
            bail!("usage: ttsplayer <audio file>");
        };
        let file = file
            .canonicalize()
            .with_context(|| format!("Failed to resolve {:?}", file))?;
        let url = url::Url::from_file_path(&file)
            .map_err(|_| anyhow::anyhow!("{:?} is not an absolute path", file))?;

        let app = AppState::load(app_dir()).context("Failed to load settings")?;
        let interval = Duration::from_millis(app.settings.time_update_interval_ms);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build async runtime")?;

        runtime.block_on(async move {
            let queue = EventQueue::new();
            let host = queue.sender();
            let media = NativeMediaElement::new(host.media_sink(), app.blobs.clone(), interval)
                .context("Failed to open audio output")?;
            let controller = AudioPlayerController::new(media, app, host.clone());

            let mut event_loop = EventLoop::new(controller, queue);
            event_loop.add_observer(Box::new(ConsoleView {
                last: String::new(),
                host: host.clone(),
            }));

            let interrupt = host.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    interrupt.post(HostEvent::Shutdown);
                }
            });

            event_loop.gesture(Gesture::AttachSource(MediaSource::from(url)));
            event_loop.gesture(Gesture::PlayPauseClicked);
            event_loop.run().await;
            Ok(())
        })
    }
}
