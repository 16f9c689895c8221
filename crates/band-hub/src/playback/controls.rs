use crate::error::ControlError;

/// Seek request accepted by [`PlaybackControls::seek_to`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeekTarget {
    /// Position as a fraction of the duration; clamped to `0.0..=1.0`.
    Fraction(f64),
    /// Absolute position in seconds.
    Seconds(f64),
}

impl SeekTarget {
    /// Resolve to an absolute position in seconds for a track of `duration` seconds.
    pub fn to_seconds(self, duration: f64) -> f64 {
        let duration = duration.max(0.0);
        match self {
            SeekTarget::Fraction(fraction) => {
                let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
                fraction * duration
            }
            SeekTarget::Seconds(secs) => {
                if secs.is_nan() {
                    0.0
                } else {
                    secs.clamp(0.0, duration)
                }
            }
        }
    }
}

/// Transport capability exposed by one audio player.
///
/// Implemented by whatever backend renders a recording; the coordinator only
/// calls through this trait.
pub trait PlaybackControls: Send + Sync {
    fn play(&self) -> Result<(), ControlError>;
    fn pause(&self) -> Result<(), ControlError>;
    fn is_playing(&self) -> bool;
    /// Current position in seconds.
    fn current_time(&self) -> f64;
    /// Total duration in seconds (`0.0` if unknown).
    fn duration(&self) -> f64;
    fn seek_to(&self, target: SeekTarget) -> Result<(), ControlError>;

    /// Pause when playing, play when paused.
    fn play_pause(&self) -> Result<(), ControlError> {
        if self.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_clamped() {
        assert_eq!(SeekTarget::Fraction(0.5).to_seconds(120.0), 60.0);
        assert_eq!(SeekTarget::Fraction(1.7).to_seconds(120.0), 120.0);
        assert_eq!(SeekTarget::Fraction(-0.2).to_seconds(120.0), 0.0);
        assert_eq!(SeekTarget::Fraction(f64::NAN).to_seconds(120.0), 0.0);
    }

    #[test]
    fn seconds_are_bounded_by_duration() {
        assert_eq!(SeekTarget::Seconds(30.0).to_seconds(120.0), 30.0);
        assert_eq!(SeekTarget::Seconds(500.0).to_seconds(120.0), 120.0);
        assert_eq!(SeekTarget::Seconds(-1.0).to_seconds(120.0), 0.0);
    }
}
