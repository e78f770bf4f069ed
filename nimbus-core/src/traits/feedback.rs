//! Haptic feedback

/// Vibration patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VibePattern {
    /// Remote data changed
    Short,
    /// Forecast request sent
    Double,
    /// Sync error
    Long,
}

impl VibePattern {
    /// Alternating on/off durations in milliseconds, starting with on
    pub fn segments_ms(self) -> &'static [u32] {
        match self {
            VibePattern::Short => &[100],
            VibePattern::Double => &[100, 100, 100],
            VibePattern::Long => &[500],
        }
    }

    /// Total duration of the pattern in milliseconds
    pub fn duration_ms(self) -> u32 {
        self.segments_ms().iter().sum()
    }
}

/// Trait for the vibration motor
///
/// Purely advisory: implementations swallow their own failures.
pub trait Feedback {
    /// Play a pattern
    fn vibrate(&mut self, pattern: VibePattern);

    fn short_pulse(&mut self) {
        self.vibrate(VibePattern::Short);
    }

    fn double_pulse(&mut self) {
        self.vibrate(VibePattern::Double);
    }

    fn long_pulse(&mut self) {
        self.vibrate(VibePattern::Long);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_durations() {
        assert_eq!(VibePattern::Short.duration_ms(), 100);
        assert_eq!(VibePattern::Double.duration_ms(), 300);
        assert_eq!(VibePattern::Long.duration_ms(), 500);
    }

    #[test]
    fn test_double_pattern_has_two_pulses() {
        let pulses = VibePattern::Double.segments_ms().iter().step_by(2).count();
        assert_eq!(pulses, 2);
    }
}
