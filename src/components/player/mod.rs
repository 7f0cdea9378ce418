use crate::components::AudioControls;
use crate::utils::{format_clock, seconds_to_slider, slider_to_seconds};
use dioxus::prelude::*;

mod controls;

use controls::{PlayPauseButton, SkipButton, SkipDirection};

/// Transport strip under the disc: skip back, play/pause, skip forward and a
/// seek slider with clock labels.
#[component]
pub fn PlayerBar(controls: Option<AudioControls>) -> Element {
    let (current_time, duration) = controls
        .as_ref()
        .map(|c| (c.current_time(), c.duration()))
        .unwrap_or((0.0, 0.0));
    let seekable = controls.is_some() && duration > 0.0;

    let on_seek = {
        let controls = controls.clone();
        move |e: Event<FormData>| {
            let Some(controls) = controls.as_ref() else {
                return;
            };
            if let Ok(value) = e.value().parse::<f64>() {
                if let Some(target) = slider_to_seconds(value, controls.duration()) {
                    controls.seek(target);
                }
            }
        }
    };

    rsx! {
        div { class: "player-bar",
            div { class: "player-buttons",
                SkipButton { controls: controls.clone(), direction: SkipDirection::Backward }
                PlayPauseButton { controls: controls.clone() }
                SkipButton { controls: controls.clone(), direction: SkipDirection::Forward }
            }
            div { class: "seek-row",
                span { class: "seek-clock seek-clock-start", "{format_clock(current_time)}" }
                input {
                    r#type: "range",
                    min: "0",
                    max: "1000",
                    disabled: !seekable,
                    value: seconds_to_slider(current_time, duration).round() as i32,
                    class: "seek-slider",
                    onchange: on_seek,
                }
                span { class: "seek-clock", "{format_clock(duration)}" }
            }
        }
    }
}
