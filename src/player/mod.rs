// Audio player controller
// State projection, widget view, gesture handling and downloads

pub mod controller;
pub mod download;
pub mod messages;
pub mod state;
pub mod view;

pub use controller::AudioPlayerController;
pub use messages::{Gesture, HostEvent};
pub use state::{PlaybackViewState, PlayerStatus};
pub use view::PlayerView;
