//! Playback position persistence.
//!
//! One value per source: the elapsed seconds as a plain decimal string
//! (`"50"`, `"50.5"`), overwritten in place.

#[cfg(target_arch = "wasm32")]
use gloo_storage::{LocalStorage, Storage};
use std::rc::Rc;

/// Error type for storage writes
#[derive(Debug, Clone, PartialEq)]
pub struct StorageError(String);

impl StorageError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StorageError {}

/// Durable per-origin key-value storage for playback positions.
pub trait PositionStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: PositionStore + ?Sized> PositionStore for Rc<T> {
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).save(key, value)
    }
}

/// `window.localStorage`, written as raw strings rather than JSON.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStore;

#[cfg(target_arch = "wasm32")]
impl PositionStore for BrowserStore {
    fn load(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| StorageError::new(format!("localStorage write failed: {e:?}")))
    }
}

/// Plain positional decimal (`50`, `0.0000001`), never exponent notation,
/// so very large or very small values differ from JavaScript's
/// `Number.toString`. `parse_position` reads both forms.
pub fn format_position(seconds: f64) -> String {
    format!("{seconds}")
}

/// Lenient parse of a stored position: the longest leading decimal prefix is
/// used (`"12.5s"` reads as 12.5). Non-finite and negative values are rejected.
pub fn parse_position(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let value: f64 = text[..end].parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

pub fn load_position<S: PositionStore + ?Sized>(store: &S, key: &str) -> Option<f64> {
    store.load(key).as_deref().and_then(parse_position)
}

pub fn save_position<S: PositionStore + ?Sized>(
    store: &S,
    key: &str,
    seconds: f64,
) -> Result<(), StorageError> {
    store.save(key, &format_position(seconds))
}
