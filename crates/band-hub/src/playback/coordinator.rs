//! Single-playback coordination across mounted players.
//!
//! Players register their controls by name once loaded and unregister when
//! torn down. Starting one player pauses every other player, so at most one
//! recording is audible at a time. The coordinator keeps only `Weak`
//! references; players own their controls.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::error::ControlError;
use crate::playback::controls::{PlaybackControls, SeekTarget};

struct CurrentUnit {
    name: String,
    controls: Weak<dyn PlaybackControls>,
}

/// Snapshot of the unit currently allowed to play.
#[derive(Clone, Debug, PartialEq)]
pub struct NowPlaying {
    pub name: String,
    pub is_playing: bool,
    pub position_secs: f64,
    pub duration_secs: f64,
}

/// Owned registry of playback units plus the current-unit reference.
///
/// Mutated only through `&mut self` from the UI thread; calls are not
/// reentrant, so every update lands within one callback turn.
#[derive(Default)]
pub struct PlaybackCoordinator {
    units: HashMap<String, Weak<dyn PlaybackControls>>,
    current: Option<CurrentUnit>,
    playing: bool,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the controls for `name`.
    ///
    /// Has no effect on playback. When `name` is the current unit its controls
    /// reference is swapped in place without interrupting it.
    pub fn register_unit(&mut self, name: impl Into<String>, controls: &Arc<dyn PlaybackControls>) {
        let name = name.into();
        let weak = Arc::downgrade(controls);
        if let Some(current) = self.current.as_mut() {
            if current.name == name {
                current.controls = weak.clone();
            }
        }
        tracing::debug!(unit = %name, "playback unit registered");
        self.units.insert(name, weak);
    }

    /// Remove the registration for `name`.
    ///
    /// If it was the current unit the reference is dropped; the unit is not
    /// paused since its player is assumed to be torn down already. Returns
    /// whether a registration existed.
    pub fn unregister_unit(&mut self, name: &str) -> bool {
        let existed = self.units.remove(name).is_some();
        if self.current.as_ref().is_some_and(|c| c.name == name) {
            self.current = None;
            self.playing = false;
        }
        tracing::debug!(unit = %name, existed, "playback unit unregistered");
        existed
    }

    /// Record that `name` started playing and pause everything else.
    ///
    /// All other units reporting `is_playing()` are paused before this returns.
    /// A failing `pause()` is logged and does not stop the remaining pauses.
    /// Returns how many units were paused.
    pub fn notify_started(&mut self, name: &str, controls: &Arc<dyn PlaybackControls>) -> usize {
        let mut paused = 0usize;
        let mut stale = Vec::new();
        for (other, weak) in &self.units {
            if other == name {
                continue;
            }
            match weak.upgrade() {
                Some(unit) => {
                    if pause_if_playing(other, unit.as_ref()) {
                        paused += 1;
                    }
                }
                None => stale.push(other.clone()),
            }
        }
        for other in stale {
            self.units.remove(&other);
        }

        if let Some(previous) = self.current.take() {
            if previous.name != name && !self.units.contains_key(&previous.name) {
                if let Some(unit) = previous.controls.upgrade() {
                    if pause_if_playing(&previous.name, unit.as_ref()) {
                        paused += 1;
                    }
                }
            }
        }

        self.current = Some(CurrentUnit {
            name: name.to_string(),
            controls: Arc::downgrade(controls),
        });
        self.playing = true;
        tracing::info!(unit = %name, paused, "playback started");
        paused
    }

    /// Update the global playing flag; the current unit is unchanged.
    pub fn notify_play_state_changed(&mut self, is_playing: bool) {
        self.playing = is_playing;
    }

    /// Pause the current unit and clear it. No-op without a current unit.
    pub fn stop_current(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        if let Some(unit) = current.controls.upgrade() {
            if let Err(err) = unit.pause() {
                tracing::warn!(unit = %current.name, error = %err, "pause failed while stopping");
            }
        }
        self.playing = false;
        tracing::info!(unit = %current.name, "playback stopped");
    }

    /// Play/pause the current unit. No-op without a current unit.
    pub fn toggle_current(&mut self) -> Result<(), ControlError> {
        let Some(unit) = self.current_controls() else {
            return Ok(());
        };
        unit.play_pause()
    }

    /// Seek the current unit. No-op without a current unit.
    pub fn seek_current(&mut self, target: SeekTarget) -> Result<(), ControlError> {
        let Some(unit) = self.current_controls() else {
            return Ok(());
        };
        unit.seek_to(target)
    }

    /// Global "is anything playing" flag.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.name.as_str())
    }

    /// Names of registered units whose players are still alive, sorted.
    pub fn registered_units(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .units
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn now_playing(&self) -> Option<NowPlaying> {
        let current = self.current.as_ref()?;
        let unit = current.controls.upgrade()?;
        Some(NowPlaying {
            name: current.name.clone(),
            is_playing: self.playing,
            position_secs: unit.current_time(),
            duration_secs: unit.duration(),
        })
    }

    /// Upgrade the current unit, dropping the reference if its player is gone.
    fn current_controls(&mut self) -> Option<Arc<dyn PlaybackControls>> {
        let unit = self.current.as_ref()?.controls.upgrade();
        if unit.is_none() {
            self.current = None;
            self.playing = false;
        }
        unit
    }
}

fn pause_if_playing(name: &str, unit: &dyn PlaybackControls) -> bool {
    if !unit.is_playing() {
        return false;
    }
    match unit.pause() {
        Ok(()) => {
            tracing::debug!(unit = %name, "paused for new playback");
            true
        }
        Err(err) => {
            tracing::warn!(unit = %name, error = %err, "failed to pause unit");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockPlayer {
        playing: AtomicBool,
        fail_pause: bool,
        pause_calls: AtomicUsize,
        position: Mutex<f64>,
    }

    impl MockPlayer {
        fn playing() -> Arc<Self> {
            let player = Self::default();
            player.playing.store(true, Ordering::SeqCst);
            Arc::new(player)
        }

        fn idle() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn broken_playing() -> Arc<Self> {
            let player = Self {
                fail_pause: true,
                ..Self::default()
            };
            player.playing.store(true, Ordering::SeqCst);
            Arc::new(player)
        }

        fn pause_calls(&self) -> usize {
            self.pause_calls.load(Ordering::SeqCst)
        }
    }

    impl PlaybackControls for MockPlayer {
        fn play(&self) -> Result<(), ControlError> {
            self.playing.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn pause(&self) -> Result<(), ControlError> {
            self.pause_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_pause {
                return Err(ControlError::Backend("decoder crashed".to_string()));
            }
            self.playing.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::SeqCst)
        }

        fn current_time(&self) -> f64 {
            *self.position.lock().unwrap()
        }

        fn duration(&self) -> f64 {
            180.0
        }

        fn seek_to(&self, target: SeekTarget) -> Result<(), ControlError> {
            *self.position.lock().unwrap() = target.to_seconds(self.duration());
            Ok(())
        }
    }

    fn dyn_controls(player: &Arc<MockPlayer>) -> Arc<dyn PlaybackControls> {
        player.clone()
    }

    #[test]
    fn starting_one_unit_pauses_the_others() {
        let a = MockPlayer::playing();
        let b = MockPlayer::idle();
        let c = MockPlayer::idle();
        let (ca, cb, cc) = (dyn_controls(&a), dyn_controls(&b), dyn_controls(&c));
        let mut coordinator = PlaybackCoordinator::new();
        coordinator.register_unit("A", &ca);
        coordinator.register_unit("B", &cb);
        coordinator.register_unit("C", &cc);
        coordinator.notify_started("A", &ca);

        b.play().unwrap();
        let paused = coordinator.notify_started("B", &cb);

        assert_eq!(paused, 1);
        assert!(!a.is_playing());
        assert!(b.is_playing());
        assert_eq!(coordinator.current_name(), Some("B"));
        assert!(coordinator.is_playing());
        assert_eq!(c.pause_calls(), 0);
        assert!(!c.is_playing());
    }

    #[test]
    fn pause_failure_does_not_block_other_units() {
        let a = MockPlayer::broken_playing();
        let b = MockPlayer::idle();
        let c = MockPlayer::playing();
        let (ca, cb, cc) = (dyn_controls(&a), dyn_controls(&b), dyn_controls(&c));
        let mut coordinator = PlaybackCoordinator::new();
        coordinator.register_unit("A", &ca);
        coordinator.register_unit("B", &cb);
        coordinator.register_unit("C", &cc);

        coordinator.notify_started("B", &cb);

        assert_eq!(a.pause_calls(), 1);
        assert_eq!(c.pause_calls(), 1);
        assert!(!c.is_playing());
        assert_eq!(coordinator.current_name(), Some("B"));
    }

    #[test]
    fn restarting_current_unit_does_not_pause_itself() {
        let a = MockPlayer::playing();
        let ca = dyn_controls(&a);
        let mut coordinator = PlaybackCoordinator::new();
        coordinator.register_unit("A", &ca);
        coordinator.notify_started("A", &ca);
        coordinator.notify_started("A", &ca);
        assert_eq!(a.pause_calls(), 0);
        assert!(a.is_playing());
    }

    #[test]
    fn reregistering_current_unit_keeps_playing() {
        let first = MockPlayer::playing();
        let second = MockPlayer::playing();
        let (c1, c2) = (dyn_controls(&first), dyn_controls(&second));
        let mut coordinator = PlaybackCoordinator::new();
        coordinator.register_unit("A", &c1);
        coordinator.notify_started("A", &c1);

        coordinator.register_unit("A", &c2);

        assert_eq!(first.pause_calls(), 0);
        assert_eq!(second.pause_calls(), 0);
        assert_eq!(coordinator.current_name(), Some("A"));
        coordinator.stop_current();
        assert_eq!(second.pause_calls(), 1);
        assert_eq!(first.pause_calls(), 0);
    }

    #[test]
    fn unregistering_current_clears_identity_without_pausing() {
        let a = MockPlayer::playing();
        let ca = dyn_controls(&a);
        let mut coordinator = PlaybackCoordinator::new();
        coordinator.register_unit("A", &ca);
        coordinator.notify_started("A", &ca);

        assert!(coordinator.unregister_unit("A"));
        assert_eq!(coordinator.current_name(), None);
        assert_eq!(a.pause_calls(), 0);

        coordinator.stop_current();
        assert!(coordinator.toggle_current().is_ok());
        assert!(coordinator.now_playing().is_none());
        assert!(!coordinator.unregister_unit("A"));
    }

    #[test]
    fn stop_current_pauses_and_clears() {
        let a = MockPlayer::playing();
        let ca = dyn_controls(&a);
        let mut coordinator = PlaybackCoordinator::new();
        coordinator.register_unit("A", &ca);
        coordinator.notify_started("A", &ca);

        coordinator.stop_current();

        assert!(!a.is_playing());
        assert!(!coordinator.is_playing());
        assert_eq!(coordinator.current_name(), None);
    }

    #[test]
    fn toggle_current_flips_play_state() {
        let a = MockPlayer::playing();
        let ca = dyn_controls(&a);
        let mut coordinator = PlaybackCoordinator::new();
        coordinator.register_unit("A", &ca);
        coordinator.notify_started("A", &ca);

        coordinator.toggle_current().unwrap();
        assert!(!a.is_playing());
        coordinator.notify_play_state_changed(false);
        assert!(!coordinator.is_playing());
        assert_eq!(coordinator.current_name(), Some("A"));

        coordinator.toggle_current().unwrap();
        assert!(a.is_playing());
    }

    #[test]
    fn previous_unregistered_current_is_paused() {
        let a = MockPlayer::playing();
        let b = MockPlayer::playing();
        let (ca, cb) = (dyn_controls(&a), dyn_controls(&b));
        let mut coordinator = PlaybackCoordinator::new();
        coordinator.notify_started("A", &ca);

        coordinator.notify_started("B", &cb);

        assert!(!a.is_playing());
        assert!(b.is_playing());
    }

    #[test]
    fn dropped_players_are_pruned() {
        let a = MockPlayer::playing();
        let b = MockPlayer::idle();
        let cb = dyn_controls(&b);
        let mut coordinator = PlaybackCoordinator::new();
        {
            let ca = dyn_controls(&a);
            coordinator.register_unit("A", &ca);
        }
        drop(a);
        coordinator.register_unit("B", &cb);
        assert_eq!(coordinator.registered_units(), vec!["B".to_string()]);

        coordinator.notify_started("B", &cb);
        assert_eq!(coordinator.registered_units(), vec!["B".to_string()]);
    }

    #[test]
    fn now_playing_reports_position_after_seek() {
        let a = MockPlayer::playing();
        let ca = dyn_controls(&a);
        let mut coordinator = PlaybackCoordinator::new();
        coordinator.register_unit("Song - Take 2", &ca);
        coordinator.notify_started("Song - Take 2", &ca);

        coordinator.seek_current(SeekTarget::Fraction(0.5)).unwrap();

        let snapshot = coordinator.now_playing().expect("now playing");
        assert_eq!(snapshot.name, "Song - Take 2");
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.position_secs, 90.0);
        assert_eq!(snapshot.duration_secs, 180.0);
    }
}
