//! Playback capability trait and the single-playback coordinator.

pub mod controls;
pub mod coordinator;

pub use controls::{PlaybackControls, SeekTarget};
pub use coordinator::{NowPlaying, PlaybackCoordinator};
