use super::{LockError, LockSentinel, LockState, WakeLockManager, WakeLockPlatform, WakeLockStatus};
use crate::components::dom_events::EventListener;
use dioxus::core::{Runtime, RuntimeGuard};
use dioxus::prelude::*;
use futures_util::future::{ready, LocalBoxFuture};
use futures_util::FutureExt;
use js_sys::{Function, Promise, Reflect};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, EventTarget, VisibilityState};

/// `navigator.wakeLock`, reached through reflection so older browsers that
/// lack it simply report unsupported.
pub struct BrowserWakeLock;

fn wake_lock_object() -> Option<JsValue> {
    let navigator = window()?.navigator();
    let lock = Reflect::get(&navigator, &"wakeLock".into()).ok()?;
    (!lock.is_undefined() && !lock.is_null()).then_some(lock)
}

fn call_method(target: &JsValue, name: &str, arg: Option<&JsValue>) -> Result<Promise, LockError> {
    let method: Function = Reflect::get(target, &name.into())
        .ok()
        .and_then(|value| value.dyn_into().ok())
        .ok_or_else(|| LockError::NotSupported(format!("{name} is not callable")))?;
    let result = match arg {
        Some(arg) => method.call1(target, arg),
        None => method.call0(target),
    };
    result
        .map_err(|err| lock_error_from_js(&err))?
        .dyn_into::<Promise>()
        .map_err(|_| LockError::Other(format!("{name} did not return a promise")))
}

fn lock_error_from_js(err: &JsValue) -> LockError {
    let field = |name: &str| {
        Reflect::get(err, &name.into())
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default()
    };
    let name = field("name");
    let message = field("message");
    if name.is_empty() && message.is_empty() {
        return LockError::Other(format!("{err:?}"));
    }
    LockError::from_dom(&name, &message)
}

impl WakeLockPlatform for BrowserWakeLock {
    type Sentinel = BrowserSentinel;

    fn is_supported(&self) -> bool {
        window()
            .map(|w| Reflect::has(&w.navigator(), &"wakeLock".into()).unwrap_or(false))
            .unwrap_or(false)
    }

    fn request(&self) -> LocalBoxFuture<'static, Result<BrowserSentinel, LockError>> {
        let Some(lock) = wake_lock_object() else {
            return ready(Err(LockError::NotSupported(
                "navigator.wakeLock is unavailable".to_string(),
            )))
            .boxed_local();
        };
        let promise = match call_method(&lock, "request", Some(&"screen".into())) {
            Ok(promise) => promise,
            Err(err) => return ready(Err(err)).boxed_local(),
        };
        async move {
            let sentinel = JsFuture::from(promise)
                .await
                .map_err(|err| lock_error_from_js(&err))?;
            Ok(BrowserSentinel {
                inner: sentinel,
                listener: RefCell::new(None),
            })
        }
        .boxed_local()
    }
}

/// `WakeLockSentinel`: an `EventTarget` that fires `release`.
pub struct BrowserSentinel {
    inner: JsValue,
    listener: RefCell<Option<EventListener>>,
}

impl LockSentinel for BrowserSentinel {
    fn on_release(&self, callback: Box<dyn Fn()>) {
        let target: &EventTarget = self.inner.unchecked_ref();
        *self.listener.borrow_mut() = EventListener::new(target, "release", move |_| callback());
    }

    fn release(&self) -> LocalBoxFuture<'static, Result<(), LockError>> {
        match call_method(&self.inner, "release", None) {
            Ok(promise) => async move {
                JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|err| lock_error_from_js(&err))
            }
            .boxed_local(),
            Err(err) => ready(Err(err)).boxed_local(),
        }
    }

    fn is_released(&self) -> bool {
        Reflect::get(&self.inner, &"released".into())
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

pub(super) fn use_browser_wake_lock() -> Signal<WakeLockStatus> {
    let manager = use_hook(|| WakeLockManager::new(BrowserWakeLock));
    let status = use_signal(|| WakeLockStatus::from(manager.state()));
    let visibility = use_hook(|| Rc::new(RefCell::new(None::<EventListener>)));

    {
        let manager = manager.clone();
        let visibility = visibility.clone();
        use_effect(move || {
            if visibility.borrow().is_some() || manager.state() == LockState::Unsupported {
                return;
            }
            let runtime = Runtime::current();
            manager.subscribe(move |state| {
                let _guard = RuntimeGuard::new(runtime.clone());
                let mut status = status;
                status.set(WakeLockStatus::from(state));
            });

            wasm_bindgen_futures::spawn_local(manager.clone().acquire());

            let Some(document) = window().and_then(|w| w.document()) else {
                return;
            };
            let on_visible = manager.clone();
            let watched = document.clone();
            *visibility.borrow_mut() = EventListener::new(&document, "visibilitychange", move |_| {
                let visible = watched.visibility_state() == VisibilityState::Visible;
                wasm_bindgen_futures::spawn_local(on_visible.clone().on_visibility_change(visible));
            });
        });
    }

    use_drop(move || {
        visibility.borrow_mut().take();
        wasm_bindgen_futures::spawn_local(manager.teardown());
    });

    status
}
