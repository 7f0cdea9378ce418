use crate::components::{use_wake_lock, AudioControls, AudioPlayer, Icon, PlayerBar, WakeLockStatus};
use crate::config::{PlayerConfig, BASE_PATH};
use crate::diagnostics::log_diag;
use crate::utils::sleep_ms;
use dioxus::prelude::*;

const DISC_LABEL: &str = "musica_ares_16";

/// Label text laid along a circle inside the disc.
fn disc_label_svg(label: &str) -> String {
    format!(
        r##"<svg class="disc-label-svg" viewBox="0 0 200 200"><defs><path id="disc-label-path" d="M 100, 100 m -75, 0 a 75,75 0 1,1 150,0 a 75,75 0 1,1 -150,0" /></defs><text class="disc-label-text"><textPath href="#disc-label-path" startOffset="0%">{label}</textPath></text></svg>"##
    )
}

fn wake_lock_message(status: WakeLockStatus) -> &'static str {
    match (status.is_supported, status.is_active) {
        (false, _) => "Wake lock is not supported on this device",
        (true, true) => "Wake lock is active",
        (true, false) => "Wake lock is inactive",
    }
}

/// Flip a flag on a fixed interval for as long as the calling component lives.
fn use_badge_toggle(interval_ms: u32) -> Signal<bool> {
    let mut flag = use_signal(|| false);
    use_future(move || async move {
        loop {
            sleep_ms(interval_ms).await;
            let next = !*flag.peek();
            flag.set(next);
        }
    });
    flag
}

#[component]
pub fn Home() -> Element {
    let config = PlayerConfig::default();
    let wake_lock = use_wake_lock();
    let mut controls = use_signal(|| None::<AudioControls>);
    let badge_alt = use_badge_toggle(config.badge_interval_ms);

    use_effect(move || {
        log_diag("home", wake_lock_message(wake_lock()));
    });

    let background = format!(
        "background-image: url({BASE_PATH}/butterfly-bg.jpg), linear-gradient(160deg, #1f2937, #0b0f14);"
    );

    rsx! {
        div { class: "page",
            div { class: "page-backdrop", style: "{background}" }
            div { class: "page-overlay" }

            main { class: "page-content",
                AudioPlayer {
                    src: config.src.clone(),
                    autoplay: config.autoplay,
                    on_play_pause_change: move |playing: bool| {
                        log_diag("home", if playing { "playing" } else { "paused" });
                    },
                    on_controls_ready: move |ready: AudioControls| controls.set(Some(ready)),
                }

                HandleBadge { alternate: badge_alt() }

                div { class: "disc-stage",
                    Disc {}
                    PlayerBar { controls: controls() }
                }
            }

            footer { class: "page-footer",
                span { "musica_ares_16 · set @eugeniosaintemarie" }
                if wake_lock().is_active {
                    span { class: "wake-indicator", title: "Screen stays on",
                        Icon { name: "sun".to_string(), class: "icon-sm".to_string() }
                    }
                }
            }
        }
    }
}

#[component]
fn HandleBadge(alternate: bool) -> Element {
    let class = if alternate { "handle-badge handle-badge-alt" } else { "handle-badge" };
    let glyph = if alternate { "music" } else { "spotify" };

    rsx! {
        div { class: "{class}",
            Icon { name: glyph.to_string(), class: "icon-sm".to_string() }
            span { "@eugenio" }
            span { class: "underline", "sainte" }
            span { "marie" }
        }
    }
}

#[component]
fn Disc() -> Element {
    rsx! {
        div { class: "disc-wrap",
            div { class: "disc",
                div { class: "disc-hub" }
                div { class: "disc-label", dangerous_inner_html: disc_label_svg(DISC_LABEL) }
            }
            div { class: "disc-reflection" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_lock_status_lines() {
        let unsupported = WakeLockStatus::default();
        assert_eq!(
            wake_lock_message(unsupported),
            "Wake lock is not supported on this device"
        );
        let held = WakeLockStatus {
            is_supported: true,
            is_active: true,
        };
        assert_eq!(wake_lock_message(held), "Wake lock is active");
        let idle = WakeLockStatus {
            is_supported: true,
            is_active: false,
        };
        assert_eq!(wake_lock_message(idle), "Wake lock is inactive");
    }

    #[test]
    fn label_is_drawn_on_the_circle_path() {
        let svg = disc_label_svg(DISC_LABEL);
        assert!(svg.contains(r##"href="#disc-label-path""##));
        assert!(svg.contains(">musica_ares_16</textPath>"));
    }
}
