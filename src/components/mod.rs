//! The components module contains all shared components for our app.

mod audio_manager;
#[cfg(target_arch = "wasm32")]
mod dom_events;
mod icons;
mod player;
mod views;
mod wake_lock;

pub use audio_manager::{AudioControls, AudioPlayer, PLAY_PAUSE_BUTTON_ID};
pub use icons::*;
pub use player::*;
pub use views::Home;
pub use wake_lock::{use_wake_lock, WakeLockStatus};
