//! Player configuration. Everything is fixed at build time; the only
//! environment-derived value is the optional base path for local assets.

/// Prefix prepended to local asset URLs when the site is served from a
/// sub-path (for example `/discplayer` on a project page).
pub const BASE_PATH: &str = match option_env!("DISCPLAYER_BASE_PATH") {
    Some(path) => path,
    None => "",
};

/// Storage keys are `POSITION_KEY_PREFIX + source`.
pub const POSITION_KEY_PREFIX: &str = "audio-position-";

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Source locator as written in the page, before the base path is applied.
    pub src: String,
    pub autoplay: bool,
    /// Seconds jumped by the forward and backward controls.
    pub skip_offset_secs: f64,
    pub flush_interval_ms: u32,
    pub badge_interval_ms: u32,
    pub base_path: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            src: "/set.mp3".to_string(),
            autoplay: true,
            skip_offset_secs: 150.0,
            flush_interval_ms: 5_000,
            badge_interval_ms: 3_000,
            base_path: BASE_PATH.to_string(),
        }
    }
}

impl PlayerConfig {
    pub fn with_source(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Self::default()
        }
    }

    /// URL handed to the media element. Remote sources are used verbatim.
    pub fn resolved_src(&self) -> String {
        let src = self.src.trim();
        if src.starts_with("http://") || src.starts_with("https://") {
            return src.to_string();
        }
        let base = self.base_path.trim_end_matches('/');
        if base.is_empty() {
            return src.to_string();
        }
        if src.starts_with('/') {
            format!("{base}{src}")
        } else {
            format!("{base}/{src}")
        }
    }

    pub fn position_key(&self) -> String {
        format!("{POSITION_KEY_PREFIX}{}", self.src)
    }
}
