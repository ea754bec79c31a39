// Settings module
// Loads and persists player settings as JSON

#[allow(clippy::module_inception)]
pub mod settings;

pub use settings::{AlertSettings, PlayerSettings, ProgressColors};
