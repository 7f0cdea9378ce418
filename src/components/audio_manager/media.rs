use futures_util::future::LocalBoxFuture;
use std::rc::Rc;

/// Pending result of a `play()` request. Resolves once the platform accepts
/// or rejects playback.
pub type PlayFuture = LocalBoxFuture<'static, Result<(), PlaybackError>>;

/// The single streaming media element the controller owns.
pub trait MediaElement {
    fn play(&self) -> PlayFuture;
    fn pause(&self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// NaN until metadata has loaded.
    fn duration(&self) -> f64;
    fn has_metadata(&self) -> bool;
}

impl<T: MediaElement + ?Sized> MediaElement for Rc<T> {
    fn play(&self) -> PlayFuture {
        (**self).play()
    }

    fn pause(&self) {
        (**self).pause()
    }

    fn is_paused(&self) -> bool {
        (**self).is_paused()
    }

    fn current_time(&self) -> f64 {
        (**self).current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        (**self).set_current_time(seconds)
    }

    fn duration(&self) -> f64 {
        (**self).duration()
    }

    fn has_metadata(&self) -> bool {
        (**self).has_metadata()
    }
}

/// Notifications the element emits on its own; the controller mirrors them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    Play,
    Pause,
    TimeUpdate,
    LoadedMetadata,
}

impl MediaEvent {
    pub const ALL: [MediaEvent; 4] = [
        MediaEvent::Play,
        MediaEvent::Pause,
        MediaEvent::TimeUpdate,
        MediaEvent::LoadedMetadata,
    ];

    /// DOM event name.
    pub fn name(self) -> &'static str {
        match self {
            MediaEvent::Play => "play",
            MediaEvent::Pause => "pause",
            MediaEvent::TimeUpdate => "timeupdate",
            MediaEvent::LoadedMetadata => "loadedmetadata",
        }
    }
}

/// Who asked for playback. Decides how a rejection is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOrigin {
    Autoplay,
    Toggle,
    Gesture,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Autoplay policy or missing user activation (`NotAllowedError`).
    NotAllowed(String),
    /// Any other refusal: unsupported source, aborted load, decode failure.
    Rejected(String),
    /// Only the browser build looks the element up.
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    NoElement,
}

impl PlaybackError {
    /// Classify a DOMException by its `name`.
    pub fn from_dom(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" => PlaybackError::NotAllowed(message.to_string()),
            _ if message.trim().is_empty() => PlaybackError::Rejected(name.to_string()),
            _ => PlaybackError::Rejected(format!("{name}: {message}")),
        }
    }
}

impl std::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackError::NotAllowed(msg) => write!(f, "playback not allowed: {msg}"),
            PlaybackError::Rejected(msg) => write!(f, "playback rejected: {msg}"),
            PlaybackError::NoElement => write!(f, "audio element is not mounted"),
        }
    }
}

impl std::error::Error for PlaybackError {}
