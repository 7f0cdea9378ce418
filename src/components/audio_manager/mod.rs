//! Audio Manager - owns the page's single `<audio>` element and keeps playback
//! side-effects out of the render cycle. Signals only mirror what the element
//! reports; they are never written by the controls directly.

use crate::config::PlayerConfig;
use crate::diagnostics::log_error;
#[cfg(target_arch = "wasm32")]
use crate::utils::sleep_ms;
use dioxus::prelude::*;
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;

mod controller;
mod media;
#[cfg(target_arch = "wasm32")]
mod web_media;

use controller::{PlaybackHandle, PlaybackSnapshot};
use media::PlaybackError;

pub const AUDIO_ELEMENT_ID: &str = "discplayer-audio";
pub const PLAY_PAUSE_BUTTON_ID: &str = "play-pause-btn";

/// Shown when the user presses play and the browser still refuses.
pub const PLAY_FIRST_MESSAGE: &str = "Please click the play button first to start the music.";

/// Reactive copy of the controller snapshot.
#[derive(Clone, Copy, PartialEq)]
pub struct AudioState {
    pub is_playing: Signal<bool>,
    pub current_time: Signal<f64>,
    pub duration: Signal<f64>,
}

impl AudioState {
    fn apply(self, snapshot: &PlaybackSnapshot) {
        let AudioState {
            mut is_playing,
            mut current_time,
            mut duration,
        } = self;
        if *is_playing.peek() != snapshot.is_playing {
            is_playing.set(snapshot.is_playing);
        }
        if *current_time.peek() != snapshot.current_time {
            current_time.set(snapshot.current_time);
        }
        if *duration.peek() != snapshot.duration {
            duration.set(snapshot.duration);
        }
    }
}

/// Handle given to the page once the player is mounted.
#[derive(Clone)]
pub struct AudioControls {
    handle: Rc<dyn PlaybackHandle>,
    pub state: AudioState,
}

impl PartialEq for AudioControls {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle) && self.state == other.state
    }
}

impl AudioControls {
    pub fn new(handle: Rc<dyn PlaybackHandle>, state: AudioState) -> Self {
        Self { handle, state }
    }

    pub fn toggle_play_pause(&self) {
        let pending = self.handle.clone().toggle_play_pause();
        spawn(async move {
            if let Err(err) = pending.await {
                alert_playback_error(&err);
            }
        });
    }

    pub fn skip_forward(&self) {
        self.handle.skip_forward();
    }

    pub fn skip_backward(&self) {
        self.handle.skip_backward();
    }

    pub fn seek(&self, seconds: f64) {
        self.handle.seek(seconds);
    }

    pub fn is_playing(&self) -> bool {
        (self.state.is_playing)()
    }

    pub fn current_time(&self) -> f64 {
        (self.state.current_time)()
    }

    pub fn duration(&self) -> f64 {
        (self.state.duration)()
    }
}

#[cfg(target_arch = "wasm32")]
fn alert_playback_error(err: &PlaybackError) {
    log_error("playback", &format!("toggle failed: {err}"));
    if let Some(win) = web_sys::window() {
        let _ = win.alert_with_message(PLAY_FIRST_MESSAGE);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn alert_playback_error(err: &PlaybackError) {
    log_error("playback", &format!("toggle failed: {err} ({PLAY_FIRST_MESSAGE})"));
}

/// Hidden, looping `<audio>` element plus the controller that drives it.
#[component]
pub fn AudioPlayer(
    src: String,
    #[props(default = true)] autoplay: bool,
    on_play_pause_change: Option<EventHandler<bool>>,
    on_controls_ready: Option<EventHandler<AudioControls>>,
) -> Element {
    let config = PlayerConfig {
        autoplay,
        ..PlayerConfig::with_source(src.clone())
    };
    let resolved_src = config.resolved_src();
    let state = AudioState {
        is_playing: use_signal(|| false),
        current_time: use_signal(|| 0.0f64),
        duration: use_signal(|| 0.0f64),
    };

    #[cfg(target_arch = "wasm32")]
    {
        use dioxus::core::{Runtime, RuntimeGuard};

        let session = use_hook(|| Rc::new(RefCell::new(None::<web_media::PlayerSession>)));

        {
            let session = session.clone();
            use_effect(move || {
                if session.borrow().is_some() {
                    return;
                }
                let Some(audio) = web_media::find_audio_element(AUDIO_ELEMENT_ID) else {
                    log_error("playback", &PlaybackError::NoElement.to_string());
                    return;
                };

                let runtime = Runtime::current();
                let started = web_media::PlayerSession::attach(audio, &config);
                let controller = started.controller();

                {
                    let runtime = runtime.clone();
                    controller.subscribe(move |snapshot| {
                        let _guard = RuntimeGuard::new(runtime.clone());
                        state.apply(snapshot);
                    });
                }
                if let Some(handler) = on_play_pause_change {
                    let runtime = runtime.clone();
                    controller.on_play_pause_change(move |playing| {
                        let _guard = RuntimeGuard::new(runtime.clone());
                        handler.call(playing);
                    });
                }

                started.mount();
                if let Some(handler) = on_controls_ready {
                    handler.call(AudioControls::new(controller.clone(), state));
                }

                // Periodic flush; the task dies with this component's scope.
                let flush_every = config.flush_interval_ms;
                let flusher = controller.clone();
                spawn(async move {
                    loop {
                        sleep_ms(flush_every).await;
                        flusher.flush_if_playing();
                    }
                });

                *session.borrow_mut() = Some(started);
            });
        }

        use_drop(move || {
            if let Some(started) = session.borrow_mut().take() {
                started.teardown();
            }
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (&state, &on_play_pause_change, &on_controls_ready);
    }

    rsx! {
        audio {
            id: AUDIO_ELEMENT_ID,
            src: "{resolved_src}",
            preload: "auto",
            class: "hidden",
        }
    }
}
