/// Utility helpers for discplayer

/// Format seconds as `m:ss`, or `h:mm:ss` once past the hour. Unknown or
/// negative values render as `0:00`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

/// Map a 0..=1000 slider value onto a track position.
pub fn slider_to_seconds(value: f64, duration: f64) -> Option<f64> {
    if !value.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    Some((value.clamp(0.0, 1000.0) / 1000.0) * duration)
}

pub fn seconds_to_slider(seconds: f64, duration: f64) -> f64 {
    if !seconds.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    ((seconds / duration) * 1000.0).clamp(0.0, 1000.0)
}

/// Sleep on the UI loop. Host builds have no browser timer and never wake.
pub async fn sleep_ms(ms: u32) {
    #[cfg(target_arch = "wasm32")]
    {
        gloo_timers::future::TimeoutFuture::new(ms).await;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = ms;
        futures_util::future::pending::<()>().await;
    }
}
