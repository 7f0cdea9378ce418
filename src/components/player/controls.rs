use crate::components::{AudioControls, Icon, PLAY_PAUSE_BUTTON_ID};
use dioxus::prelude::*;

/// Play/pause. Shows what the element reports, not what was last clicked.
#[component]
pub(super) fn PlayPauseButton(controls: Option<AudioControls>) -> Element {
    let playing = controls.as_ref().map(|c| c.is_playing()).unwrap_or(false);
    let ready = controls.is_some();

    rsx! {
        button {
            id: PLAY_PAUSE_BUTTON_ID,
            r#type: "button",
            disabled: !ready,
            class: "play-button",
            onclick: move |_| {
                if let Some(controls) = controls.as_ref() {
                    controls.toggle_play_pause();
                }
            },
            if playing {
                Icon {
                    name: "pause".to_string(),
                    class: "icon-md".to_string(),
                }
            } else {
                Icon {
                    name: "play".to_string(),
                    class: "icon-md icon-play".to_string(),
                }
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
pub(super) enum SkipDirection {
    Backward,
    Forward,
}

/// Jump by the fixed skip offset in either direction.
#[component]
pub(super) fn SkipButton(controls: Option<AudioControls>, direction: SkipDirection) -> Element {
    let (id, icon, label) = match direction {
        SkipDirection::Backward => ("skip-back-btn", "rewind", "Back 2:30"),
        SkipDirection::Forward => ("skip-forward-btn", "forward", "Forward 2:30"),
    };
    let ready = controls.is_some();

    rsx! {
        button {
            id: "{id}",
            r#type: "button",
            title: label,
            disabled: !ready,
            class: "skip-button",
            onclick: move |_| {
                if let Some(controls) = controls.as_ref() {
                    match direction {
                        SkipDirection::Backward => controls.skip_backward(),
                        SkipDirection::Forward => controls.skip_forward(),
                    }
                }
            },
            Icon { name: icon.to_string(), class: "icon-md".to_string() }
        }
    }
}
