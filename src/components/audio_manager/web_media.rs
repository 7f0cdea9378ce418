//! Browser side of the playback controller: the `<audio>` element adapter and
//! the listener/timer wiring that lives for one mount of the player.

use super::controller::PlaybackController;
use super::media::{MediaElement, MediaEvent, PlayFuture, PlaybackError};
use super::PLAY_PAUSE_BUTTON_ID;
use crate::components::dom_events::EventListener;
use crate::config::PlayerConfig;
use crate::db::BrowserStore;
use crate::diagnostics::log_diag;
use futures_util::future::ready;
use futures_util::FutureExt;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, Element, Event, HtmlAudioElement};

pub type WebPlaybackController = PlaybackController<WebMedia, BrowserStore>;

/// `HTMLMediaElement.HAVE_METADATA`
const HAVE_METADATA: u16 = 1;

#[derive(Clone)]
pub struct WebMedia(HtmlAudioElement);

impl WebMedia {
    pub fn new(audio: HtmlAudioElement) -> Self {
        Self(audio)
    }
}

fn js_string_field(value: &JsValue, field: &str) -> String {
    js_sys::Reflect::get(value, &field.into())
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default()
}

fn playback_error_from_js(err: &JsValue) -> PlaybackError {
    let name = js_string_field(err, "name");
    let message = js_string_field(err, "message");
    if name.is_empty() && message.is_empty() {
        return PlaybackError::Rejected(format!("{err:?}"));
    }
    PlaybackError::from_dom(&name, &message)
}

impl MediaElement for WebMedia {
    fn play(&self) -> PlayFuture {
        match self.0.play() {
            Ok(promise) => async move {
                JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|err| playback_error_from_js(&err))
            }
            .boxed_local(),
            Err(err) => ready(Err(playback_error_from_js(&err))).boxed_local(),
        }
    }

    fn pause(&self) {
        let _ = self.0.pause();
    }

    fn is_paused(&self) -> bool {
        self.0.paused()
    }

    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.0.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.0.duration()
    }

    fn has_metadata(&self) -> bool {
        self.0.ready_state() >= HAVE_METADATA
    }
}

/// Whether the event started inside an element matching `selector`.
fn lands_on(event: &Event, selector: &str) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(|element| element.closest(selector).ok().flatten())
        .is_some()
}

/// Look up the rendered `<audio>` element.
pub fn find_audio_element(id: &str) -> Option<HtmlAudioElement> {
    let document = window()?.document()?;
    document.get_element_by_id(id)?.dyn_into::<HtmlAudioElement>().ok()
}

/// Listeners owned by one mount of the player. Dropping it detaches them.
pub struct PlayerSession {
    controller: Rc<WebPlaybackController>,
    _listeners: Vec<EventListener>,
}

impl PlayerSession {
    /// Build the controller around `audio` and attach element, gesture and
    /// unload listeners. Observers must be registered before [`Self::mount`].
    pub fn attach(audio: HtmlAudioElement, config: &PlayerConfig) -> Self {
        audio.set_loop(true);
        let controller = PlaybackController::new(WebMedia::new(audio.clone()), BrowserStore, config);
        let mut listeners = Vec::new();

        for event in MediaEvent::ALL {
            let controller = controller.clone();
            listeners.extend(EventListener::new(&audio, event.name(), move |_| {
                controller.handle_event(event);
            }));
        }

        if let Some(document) = window().and_then(|w| w.document()) {
            let play_button = format!("#{PLAY_PAUSE_BUTTON_ID}");
            for gesture in ["click", "touchstart"] {
                let controller = controller.clone();
                let play_button = play_button.clone();
                listeners.extend(EventListener::new(&document, gesture, move |event| {
                    if !controller.awaiting_gesture() {
                        return;
                    }
                    // The button's own toggle handles this press.
                    if lands_on(&event, &play_button) {
                        controller.cancel_gesture_retry();
                        return;
                    }
                    let controller = controller.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let _ = controller.on_user_gesture().await;
                    });
                }));
            }
        }

        if let Some(win) = window() {
            let controller = controller.clone();
            listeners.extend(EventListener::new(&win, "beforeunload", move |_| {
                controller.flush_if_playing();
            }));
        }

        Self {
            controller,
            _listeners: listeners,
        }
    }

    pub fn controller(&self) -> Rc<WebPlaybackController> {
        self.controller.clone()
    }

    pub fn mount(&self) {
        self.controller.mount();
        log_diag(
            "playback",
            &format!(
                "mounted {} at {:.1}s",
                self.controller.storage_key(),
                self.controller.snapshot().current_time
            ),
        );
        wasm_bindgen_futures::spawn_local(self.controller.clone().autoplay());
    }

    /// Flush the position, then detach every listener.
    pub fn teardown(self) {
        self.controller.unmount();
    }
}
