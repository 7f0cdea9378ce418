//! Screen wake lock: keeps the display on while the page is visible.
//!
//! Failures never leave this module. A refused request only means the
//! manager stays inactive.

use crate::diagnostics::log_diag;
use dioxus::prelude::*;
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[cfg(target_arch = "wasm32")]
mod web;

#[derive(Debug, Clone, PartialEq)]
pub enum LockError {
    NotAllowed(String),
    NotSupported(String),
    Other(String),
}

impl LockError {
    pub fn from_dom(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" => LockError::NotAllowed(message.to_string()),
            "NotSupportedError" => LockError::NotSupported(message.to_string()),
            _ => LockError::Other(message.to_string()),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LockError::NotAllowed(msg) | LockError::NotSupported(msg) | LockError::Other(msg) => {
                msg
            }
        }
    }
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockError::NotAllowed(msg) => write!(f, "wake lock not allowed: {msg}"),
            LockError::NotSupported(msg) => write!(f, "wake lock not supported: {msg}"),
            LockError::Other(msg) => write!(f, "wake lock failed: {msg}"),
        }
    }
}

impl std::error::Error for LockError {}

/// A granted lock. The platform may release it on its own (tab hidden).
pub trait LockSentinel {
    fn on_release(&self, callback: Box<dyn Fn()>);
    fn release(&self) -> LocalBoxFuture<'static, Result<(), LockError>>;
    fn is_released(&self) -> bool;
}

pub trait WakeLockPlatform {
    type Sentinel: LockSentinel + 'static;

    fn is_supported(&self) -> bool;
    fn request(&self) -> LocalBoxFuture<'static, Result<Self::Sentinel, LockError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unsupported,
    Inactive,
    Active,
}

impl LockState {
    pub fn is_supported(self) -> bool {
        self != LockState::Unsupported
    }

    pub fn is_active(self) -> bool {
        self == LockState::Active
    }
}

type StateObserver = Box<dyn Fn(LockState)>;

pub struct WakeLockManager<P: WakeLockPlatform> {
    platform: P,
    state: Cell<LockState>,
    sentinel: RefCell<Option<P::Sentinel>>,
    /// Bumped per grant and on teardown so stale release callbacks are ignored.
    generation: Cell<u64>,
    pending: Cell<bool>,
    torn_down: Cell<bool>,
    observers: RefCell<Vec<StateObserver>>,
}

impl<P: WakeLockPlatform + 'static> WakeLockManager<P> {
    /// Capability detection happens here, synchronously.
    pub fn new(platform: P) -> Rc<Self> {
        let state = if platform.is_supported() {
            LockState::Inactive
        } else {
            LockState::Unsupported
        };
        Rc::new(Self {
            platform,
            state: Cell::new(state),
            sentinel: RefCell::new(None),
            generation: Cell::new(0),
            pending: Cell::new(false),
            torn_down: Cell::new(false),
            observers: RefCell::new(Vec::new()),
        })
    }

    pub fn state(&self) -> LockState {
        self.state.get()
    }

    pub fn subscribe(&self, observer: impl Fn(LockState) + 'static) {
        self.observers.borrow_mut().push(Box::new(observer));
    }

    fn set_state(&self, next: LockState) {
        if self.state.get() == next || self.state.get() == LockState::Unsupported {
            return;
        }
        self.state.set(next);
        for observer in self.observers.borrow().iter() {
            observer(next);
        }
    }

    /// Request the lock unless it is held, pending, unsupported or torn down.
    pub async fn acquire(self: Rc<Self>) {
        if self.state.get() != LockState::Inactive || self.pending.get() || self.torn_down.get()
        {
            return;
        }
        self.pending.set(true);
        let request = self.platform.request();
        let result = request.await;
        self.pending.set(false);

        match result {
            Ok(sentinel) => {
                if self.torn_down.get() {
                    release_quietly(sentinel.release()).await;
                    return;
                }
                let generation = self.generation.get() + 1;
                self.generation.set(generation);
                let weak: Weak<Self> = Rc::downgrade(&self);
                sentinel.on_release(Box::new(move || {
                    if let Some(manager) = weak.upgrade() {
                        manager.handle_release(generation);
                    }
                }));
                *self.sentinel.borrow_mut() = Some(sentinel);
                self.set_state(LockState::Active);
                log_diag("wake-lock", "Wake Lock is active");
            }
            Err(err) => {
                match &err {
                    LockError::NotAllowed(_) => log_diag(
                        "wake-lock",
                        "Wake Lock permission denied - continuing without wake lock",
                    ),
                    LockError::NotSupported(_) => {
                        log_diag("wake-lock", "Wake Lock not supported on this device")
                    }
                    LockError::Other(msg) => {
                        log_diag("wake-lock", &format!("Wake Lock failed: {msg}"))
                    }
                }
                self.set_state(LockState::Inactive);
            }
        }
    }

    fn handle_release(&self, generation: u64) {
        if generation != self.generation.get() {
            return;
        }
        self.sentinel.borrow_mut().take();
        self.set_state(LockState::Inactive);
    }

    /// Re-acquire when the page comes back into view.
    pub async fn on_visibility_change(self: Rc<Self>, visible: bool) {
        if visible {
            self.acquire().await;
        }
    }

    /// Stop observing, drop to inactive and hand back the release of any held
    /// lock. Release failures are logged by the returned future.
    pub fn teardown(&self) -> LocalBoxFuture<'static, ()> {
        self.torn_down.set(true);
        self.generation.set(self.generation.get() + 1);
        self.observers.borrow_mut().clear();
        let sentinel = self.sentinel.borrow_mut().take();
        self.set_state(LockState::Inactive);

        match sentinel {
            Some(sentinel) if !sentinel.is_released() => release_quietly(sentinel.release()),
            _ => async {}.boxed_local(),
        }
    }
}

fn release_quietly(
    pending: LocalBoxFuture<'static, Result<(), LockError>>,
) -> LocalBoxFuture<'static, ()> {
    async move {
        if let Err(err) = pending.await {
            log_diag(
                "wake-lock",
                &format!("Wake lock release failed: {}", err.message()),
            );
        }
    }
    .boxed_local()
}

/// What the page reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WakeLockStatus {
    pub is_supported: bool,
    pub is_active: bool,
}

impl From<LockState> for WakeLockStatus {
    fn from(state: LockState) -> Self {
        Self {
            is_supported: state.is_supported(),
            is_active: state.is_active(),
        }
    }
}

/// Hold a screen wake lock for the lifetime of the calling component.
#[cfg(target_arch = "wasm32")]
pub fn use_wake_lock() -> Signal<WakeLockStatus> {
    web::use_browser_wake_lock()
}

/// Native builds have no screen lock surface.
#[cfg(not(target_arch = "wasm32"))]
pub fn use_wake_lock() -> Signal<WakeLockStatus> {
    use_signal(|| WakeLockStatus::from(LockState::Unsupported))
}
