//! Playback controller: owns the media element, persists the position and
//! mirrors element notifications into an observable snapshot.
//!
//! Commands go to the element; state only changes when the element reports
//! back through [`PlaybackController::handle_event`]. A rejected `play()`
//! therefore never leaves the UI claiming that audio is running.

use super::media::{MediaElement, MediaEvent, PlayOrigin, PlaybackError};
use crate::config::PlayerConfig;
use crate::db::{load_position, save_position, PositionStore};
use crate::diagnostics::{log_diag, log_error};
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// What the UI renders. Duration is 0 until the element knows it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
}

type SnapshotObserver = Box<dyn Fn(&PlaybackSnapshot)>;
type PlayPauseObserver = Box<dyn Fn(bool)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureRetry {
    Idle,
    Armed,
    Spent,
}

/// Finite positive durations only; live streams report `Infinity`.
fn known_duration(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

pub struct PlaybackController<M, S> {
    media: M,
    store: S,
    key: String,
    autoplay: bool,
    skip_offset: f64,
    snapshot: Cell<PlaybackSnapshot>,
    observers: RefCell<Vec<SnapshotObserver>>,
    play_pause_observers: RefCell<Vec<PlayPauseObserver>>,
    gesture_retry: Cell<GestureRetry>,
}

impl<M: MediaElement, S: PositionStore> PlaybackController<M, S> {
    pub fn new(media: M, store: S, config: &PlayerConfig) -> Rc<Self> {
        Rc::new(Self {
            media,
            store,
            key: config.position_key(),
            autoplay: config.autoplay,
            skip_offset: config.skip_offset_secs,
            snapshot: Cell::new(PlaybackSnapshot::default()),
            observers: RefCell::new(Vec::new()),
            play_pause_observers: RefCell::new(Vec::new()),
            gesture_retry: Cell::new(GestureRetry::Idle),
        })
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.get()
    }

    pub fn subscribe(&self, observer: impl Fn(&PlaybackSnapshot) + 'static) {
        self.observers.borrow_mut().push(Box::new(observer));
    }

    pub fn on_play_pause_change(&self, observer: impl Fn(bool) + 'static) {
        self.play_pause_observers
            .borrow_mut()
            .push(Box::new(observer));
    }

    fn update(&self, f: impl FnOnce(&mut PlaybackSnapshot)) {
        let mut next = self.snapshot.get();
        f(&mut next);
        if next == self.snapshot.get() {
            return;
        }
        self.snapshot.set(next);
        for observer in self.observers.borrow().iter() {
            observer(&next);
        }
    }

    fn set_playing(&self, playing: bool) {
        if self.snapshot.get().is_playing == playing {
            return;
        }
        self.update(|s| s.is_playing = playing);
        for observer in self.play_pause_observers.borrow().iter() {
            observer(playing);
        }
    }

    fn persist(&self, seconds: f64) {
        let mut seconds = seconds.max(0.0);
        if let Some(duration) = known_duration(self.media.duration()) {
            seconds = seconds.min(duration);
        }
        if let Err(err) = save_position(&self.store, &self.key, seconds) {
            log_error("playback", &format!("failed to save position: {err}"));
        }
    }

    fn apply_offset(&self, seconds: f64) {
        self.media.set_current_time(seconds);
        self.update(|s| s.current_time = seconds);
        self.persist(seconds);
    }

    /// Restore the saved offset and line the snapshot up with the element.
    pub fn mount(&self) {
        if let Some(saved) = load_position(&self.store, &self.key) {
            let saved = match known_duration(self.media.duration()) {
                Some(duration) => saved.min(duration),
                None => saved,
            };
            self.media.set_current_time(saved);
            self.update(|s| s.current_time = saved);
        }
        if self.media.has_metadata() {
            if let Some(duration) = known_duration(self.media.duration()) {
                self.update(|s| s.duration = duration);
            }
        }
        self.set_playing(!self.media.is_paused());
    }

    /// Mirror an element notification. The only writer of `is_playing`.
    pub fn handle_event(&self, event: MediaEvent) {
        match event {
            MediaEvent::Play => self.set_playing(true),
            MediaEvent::Pause => self.set_playing(false),
            MediaEvent::TimeUpdate => {
                let time = self.media.current_time();
                self.update(|s| s.current_time = time);
            }
            MediaEvent::LoadedMetadata => {
                if let Some(duration) = known_duration(self.media.duration()) {
                    self.update(|s| s.duration = duration);
                }
            }
        }
    }

    pub async fn play_from(self: Rc<Self>, origin: PlayOrigin) -> Result<(), PlaybackError> {
        let pending = self.media.play();
        let Err(err) = pending.await else {
            return Ok(());
        };
        match origin {
            PlayOrigin::Autoplay => {
                log_error("playback", &format!("Auto-play failed: {err}"));
                if self.gesture_retry.get() == GestureRetry::Idle {
                    self.gesture_retry.set(GestureRetry::Armed);
                    log_diag("playback", "waiting for first user interaction to start");
                }
            }
            PlayOrigin::Gesture => {
                log_error("playback", &format!("Play failed after user interaction: {err}"));
            }
            PlayOrigin::Toggle => {
                log_error("playback", &format!("Error during playback: {err}"));
            }
        }
        Err(err)
    }

    /// Initial play attempt. Failures are logged and arm the gesture retry.
    pub async fn autoplay(self: Rc<Self>) {
        if !self.autoplay {
            return;
        }
        let _ = self.play_from(PlayOrigin::Autoplay).await;
    }

    /// First pointer or touch interaction after a rejected autoplay. Retries once.
    pub async fn on_user_gesture(self: Rc<Self>) -> Result<(), PlaybackError> {
        if self.gesture_retry.get() != GestureRetry::Armed {
            return Ok(());
        }
        self.gesture_retry.set(GestureRetry::Spent);
        if !self.media.is_paused() {
            return Ok(());
        }
        self.play_from(PlayOrigin::Gesture).await
    }

    pub fn awaiting_gesture(&self) -> bool {
        self.gesture_retry.get() == GestureRetry::Armed
    }

    /// An explicit play/pause press replaces the pending gesture retry.
    pub fn cancel_gesture_retry(&self) {
        if self.gesture_retry.get() == GestureRetry::Armed {
            self.gesture_retry.set(GestureRetry::Spent);
        }
    }

    /// Play if paused, pause if playing. The snapshot follows the element's
    /// own play/pause notification.
    pub async fn toggle(self: Rc<Self>) -> Result<(), PlaybackError> {
        if self.media.is_paused() {
            self.play_from(PlayOrigin::Toggle).await
        } else {
            self.media.pause();
            Ok(())
        }
    }

    /// Needs a known duration to clamp against; otherwise a no-op.
    pub fn skip_forward(&self) {
        let Some(duration) = known_duration(self.media.duration()) else {
            return;
        };
        let target = (self.media.current_time() + self.skip_offset).min(duration);
        self.apply_offset(target);
    }

    pub fn skip_backward(&self) {
        let mut target = (self.media.current_time() - self.skip_offset).max(0.0);
        if let Some(duration) = known_duration(self.media.duration()) {
            target = target.min(duration);
        }
        self.apply_offset(target);
    }

    /// Jump to `seconds`, clamped to `[0, duration]`. No-op before metadata.
    pub fn seek(&self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let Some(duration) = known_duration(self.media.duration()) else {
            return;
        };
        self.apply_offset(seconds.clamp(0.0, duration));
    }

    /// Write the current offset if audio is running. Returns whether it wrote.
    pub fn flush_if_playing(&self) -> bool {
        if self.media.is_paused() {
            return false;
        }
        self.persist(self.media.current_time());
        true
    }

    /// Final flush. Listener and timer teardown belongs to the driver.
    pub fn unmount(&self) {
        self.flush_if_playing();
        self.observers.borrow_mut().clear();
        self.play_pause_observers.borrow_mut().clear();
    }
}

/// Object-safe view of a controller so views need not name the media or
/// storage types.
pub trait PlaybackHandle {
    fn toggle_play_pause(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), PlaybackError>>;
    fn skip_forward(&self);
    fn skip_backward(&self);
    fn seek(&self, seconds: f64);
    fn snapshot(&self) -> PlaybackSnapshot;
}

impl<M, S> PlaybackHandle for PlaybackController<M, S>
where
    M: MediaElement + 'static,
    S: PositionStore + 'static,
{
    fn toggle_play_pause(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), PlaybackError>> {
        // Disarm before the press reaches the document-level gesture listener.
        self.cancel_gesture_retry();
        self.toggle().boxed_local()
    }

    fn skip_forward(&self) {
        PlaybackController::skip_forward(self);
    }

    fn skip_backward(&self) {
        PlaybackController::skip_backward(self);
    }

    fn seek(&self, seconds: f64) {
        PlaybackController::seek(self, seconds);
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackController::snapshot(self)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeMedia;
    use super::*;
    use crate::db::testing::MemoryStore;

    type TestController = PlaybackController<Rc<FakeMedia>, Rc<MemoryStore>>;

    fn controller(
        src: &str,
        duration: f64,
        store: MemoryStore,
    ) -> (Rc<TestController>, Rc<FakeMedia>, Rc<MemoryStore>) {
        let media = Rc::new(FakeMedia::with_duration(duration));
        let store = Rc::new(store);
        let config = PlayerConfig::with_source(src);
        let ctrl = PlaybackController::new(media.clone(), store.clone(), &config);
        (ctrl, media, store)
    }

    fn run<T>(fut: impl std::future::Future<Output = T>) -> T {
        fut.now_or_never().expect("fake futures resolve immediately")
    }

    #[test]
    fn restores_saved_position_and_clamps_skip_forward() {
        let store = MemoryStore::with("audio-position-track.mp3", "50");
        let (ctrl, media, store) = controller("track.mp3", 200.0, store);

        ctrl.mount();
        assert_eq!(media.time.get(), 50.0);
        assert_eq!(ctrl.snapshot().current_time, 50.0);
        assert_eq!(ctrl.snapshot().duration, 200.0);

        ctrl.skip_forward();
        assert_eq!(media.time.get(), 200.0);
        assert_eq!(ctrl.snapshot().current_time, 200.0);
        assert_eq!(
            store.get("audio-position-track.mp3").as_deref(),
            Some("200")
        );
    }

    #[test]
    fn saved_position_past_the_end_is_clamped_on_mount() {
        let store = MemoryStore::with("audio-position-track.mp3", "500");
        let (ctrl, media, store) = controller("track.mp3", 200.0, store);

        ctrl.mount();
        assert_eq!(media.time.get(), 200.0);
        assert_eq!(ctrl.snapshot().current_time, 200.0);

        ctrl.skip_backward();
        assert_eq!(media.time.get(), 50.0);
        assert_eq!(
            store.get("audio-position-track.mp3").as_deref(),
            Some("50")
        );
    }

    #[test]
    fn skip_forward_moves_by_offset_when_room_remains() {
        let (ctrl, media, store) = controller("track.mp3", 600.0, MemoryStore::default());
        ctrl.mount();
        media.time.set(10.0);

        ctrl.skip_forward();
        assert_eq!(media.time.get(), 160.0);
        assert_eq!(store.get(ctrl.storage_key()).as_deref(), Some("160"));
    }

    #[test]
    fn skip_backward_never_goes_below_zero() {
        let (ctrl, media, store) = controller("track.mp3", 600.0, MemoryStore::default());
        ctrl.mount();
        media.time.set(100.0);

        ctrl.skip_backward();
        assert_eq!(media.time.get(), 0.0);
        assert_eq!(store.get(ctrl.storage_key()).as_deref(), Some("0"));

        media.time.set(400.0);
        ctrl.skip_backward();
        assert_eq!(media.time.get(), 250.0);
    }

    #[test]
    fn seek_sets_time_and_persists_string_form() {
        let (ctrl, media, store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();

        for target in [0.0, 0.5, 73.25, 199.9, 200.0] {
            ctrl.seek(target);
            assert_eq!(ctrl.snapshot().current_time, target);
            assert_eq!(media.time.get(), target);
            assert_eq!(
                store.get("audio-position-track.mp3"),
                Some(target.to_string())
            );
        }
    }

    #[test]
    fn seek_clamps_out_of_range_targets() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();

        ctrl.seek(-5.0);
        assert_eq!(media.time.get(), 0.0);
        ctrl.seek(500.0);
        assert_eq!(media.time.get(), 200.0);
        ctrl.seek(f64::NAN);
        assert_eq!(media.time.get(), 200.0);
    }

    #[test]
    fn offset_changes_wait_for_metadata() {
        let (ctrl, media, store) = controller("track.mp3", f64::NAN, MemoryStore::default());
        ctrl.mount();
        media.time.set(20.0);

        ctrl.skip_forward();
        ctrl.seek(30.0);
        assert_eq!(media.time.get(), 20.0);
        assert_eq!(store.writes.get(), 0);

        media.duration.set(300.0);
        ctrl.handle_event(MediaEvent::LoadedMetadata);
        assert_eq!(ctrl.snapshot().duration, 300.0);
        ctrl.skip_forward();
        assert_eq!(media.time.get(), 170.0);
    }

    #[test]
    fn corrupt_saved_position_starts_at_zero() {
        let store = MemoryStore::with("audio-position-track.mp3", "garbage");
        let (ctrl, media, _store) = controller("track.mp3", 200.0, store);
        ctrl.mount();
        assert_eq!(media.time.get(), 0.0);
        assert_eq!(ctrl.snapshot().current_time, 0.0);
    }

    #[test]
    fn toggle_leaves_state_to_element_events() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();
        assert!(!ctrl.snapshot().is_playing);

        run(ctrl.clone().toggle()).unwrap();
        assert!(!media.paused.get());
        assert!(!ctrl.snapshot().is_playing);

        ctrl.handle_event(MediaEvent::Play);
        assert!(ctrl.snapshot().is_playing);
    }

    #[test]
    fn play_pause_play_ends_playing() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();

        run(ctrl.clone().toggle()).unwrap();
        ctrl.handle_event(MediaEvent::Play);
        assert!(ctrl.snapshot().is_playing);

        run(ctrl.clone().toggle()).unwrap();
        ctrl.handle_event(MediaEvent::Pause);
        assert!(media.paused.get());
        assert!(!ctrl.snapshot().is_playing);

        run(ctrl.clone().toggle()).unwrap();
        ctrl.handle_event(MediaEvent::Play);
        assert!(ctrl.snapshot().is_playing);
    }

    #[test]
    fn rejected_toggle_reports_error_and_stays_paused() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();
        media.reject_next_play(PlaybackError::NotAllowed("no gesture".to_string()));

        let result = run(ctrl.clone().toggle());
        assert!(matches!(result, Err(PlaybackError::NotAllowed(_))));
        assert!(media.paused.get());
        assert!(!ctrl.snapshot().is_playing);
        assert!(!ctrl.awaiting_gesture());
    }

    #[test]
    fn rejected_autoplay_retries_once_on_first_gesture() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();
        media.reject_next_play(PlaybackError::NotAllowed("autoplay policy".to_string()));

        run(ctrl.clone().autoplay());
        assert!(media.paused.get());
        assert!(ctrl.awaiting_gesture());

        run(ctrl.clone().on_user_gesture()).unwrap();
        assert!(!media.paused.get());
        assert_eq!(media.play_calls.get(), 2);
        assert!(!ctrl.awaiting_gesture());

        media.paused.set(true);
        run(ctrl.clone().on_user_gesture()).unwrap();
        assert_eq!(media.play_calls.get(), 2);
    }

    #[test]
    fn play_button_press_replaces_gesture_retry() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();
        media.reject_next_play(PlaybackError::NotAllowed("autoplay policy".to_string()));
        run(ctrl.clone().autoplay());
        assert!(ctrl.awaiting_gesture());

        let handle: Rc<dyn PlaybackHandle> = ctrl.clone();
        let pressed = handle.toggle_play_pause();
        assert!(!ctrl.awaiting_gesture());

        run(ctrl.clone().on_user_gesture()).unwrap();
        assert_eq!(media.play_calls.get(), 1);

        run(pressed).unwrap();
        assert!(!media.paused.get());
        assert_eq!(media.play_calls.get(), 2);
    }

    #[test]
    fn gesture_does_nothing_after_successful_autoplay() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();

        run(ctrl.clone().autoplay());
        assert_eq!(media.play_calls.get(), 1);
        run(ctrl.clone().on_user_gesture()).unwrap();
        assert_eq!(media.play_calls.get(), 1);
    }

    #[test]
    fn gesture_retry_skips_when_already_playing() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();
        media.reject_next_play(PlaybackError::Rejected("AbortError".to_string()));
        run(ctrl.clone().autoplay());

        media.paused.set(false);
        run(ctrl.clone().on_user_gesture()).unwrap();
        assert_eq!(media.play_calls.get(), 1);
        assert!(!ctrl.awaiting_gesture());
    }

    #[test]
    fn disabled_autoplay_never_calls_play() {
        let media = Rc::new(FakeMedia::with_duration(200.0));
        let store = Rc::new(MemoryStore::default());
        let mut config = PlayerConfig::with_source("track.mp3");
        config.autoplay = false;
        let ctrl = PlaybackController::new(media.clone(), store, &config);

        ctrl.mount();
        run(ctrl.clone().autoplay());
        assert_eq!(media.play_calls.get(), 0);
    }

    #[test]
    fn observers_see_play_pause_transitions_once() {
        let (ctrl, _media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        ctrl.on_play_pause_change(move |playing| sink.borrow_mut().push(playing));
        ctrl.mount();

        ctrl.handle_event(MediaEvent::Play);
        ctrl.handle_event(MediaEvent::Play);
        ctrl.handle_event(MediaEvent::Pause);
        assert_eq!(*changes.borrow(), vec![true, false]);
    }

    #[test]
    fn time_updates_reach_snapshot_observers() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        let seen = Rc::new(Cell::new(0.0));
        let sink = seen.clone();
        ctrl.subscribe(move |snapshot| sink.set(snapshot.current_time));
        ctrl.mount();

        media.time.set(12.5);
        ctrl.handle_event(MediaEvent::TimeUpdate);
        assert_eq!(seen.get(), 12.5);
    }

    #[test]
    fn flush_only_writes_while_playing() {
        let (ctrl, media, store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();
        media.time.set(42.0);

        assert!(!ctrl.flush_if_playing());
        assert_eq!(store.get(ctrl.storage_key()), None);

        media.paused.set(false);
        assert!(ctrl.flush_if_playing());
        assert_eq!(store.get(ctrl.storage_key()).as_deref(), Some("42"));
    }

    #[test]
    fn unmount_flushes_active_playback() {
        let (ctrl, media, store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();
        run(ctrl.clone().toggle()).unwrap();
        media.time.set(88.5);

        ctrl.unmount();
        assert_eq!(store.get(ctrl.storage_key()).as_deref(), Some("88.5"));
    }

    #[test]
    fn reload_resumes_from_flushed_position() {
        let store = Rc::new(MemoryStore::default());
        let config = PlayerConfig::with_source("track.mp3");

        let first_media = Rc::new(FakeMedia::with_duration(200.0));
        let first = PlaybackController::new(first_media.clone(), store.clone(), &config);
        first.mount();
        run(first.clone().autoplay());
        first_media.time.set(64.0);
        first.unmount();

        let second_media = Rc::new(FakeMedia::with_duration(200.0));
        let second = PlaybackController::new(second_media.clone(), store.clone(), &config);
        second.mount();
        assert_eq!(second_media.time.get(), 64.0);
    }

    #[test]
    fn storage_failures_do_not_block_seeking() {
        let (ctrl, media, store) = controller("track.mp3", 200.0, MemoryStore::default());
        store.fail_writes.set(true);
        ctrl.mount();

        ctrl.seek(30.0);
        assert_eq!(media.time.get(), 30.0);
        assert_eq!(ctrl.snapshot().current_time, 30.0);
    }

    #[test]
    fn handle_drives_controller_through_trait_object() {
        let (ctrl, media, _store) = controller("track.mp3", 200.0, MemoryStore::default());
        ctrl.mount();
        let handle: Rc<dyn PlaybackHandle> = ctrl.clone();

        handle.seek(20.0);
        handle.skip_forward();
        assert_eq!(media.time.get(), 170.0);
        run(handle.clone().toggle_play_pause()).unwrap();
        assert!(!media.paused.get());
        assert_eq!(handle.snapshot().current_time, 170.0);
    }
}
