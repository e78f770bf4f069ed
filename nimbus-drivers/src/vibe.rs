//! Vibration motor
//!
//! A coin motor switched by a GPIO pin (directly or via a MOSFET). Each
//! pattern is played by toggling the pin and blocking for each segment.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use nimbus_core::traits::{Feedback, VibePattern};

/// Vibration motor feedback
pub struct VibeMotor<P, D> {
    pin: P,
    delay: D,
    /// Patterns played so far
    played: u32,
}

impl<P: OutputPin, D: DelayNs> VibeMotor<P, D> {
    /// Create a motor driver; the motor starts off
    pub fn new(pin: P, delay: D) -> Self {
        let mut motor = Self {
            pin,
            delay,
            played: 0,
        };
        motor.set_on(false);
        motor
    }

    /// Number of patterns played
    pub fn played(&self) -> u32 {
        self.played
    }

    /// Give back the pin and delay
    pub fn release(mut self) -> (P, D) {
        self.set_on(false);
        (self.pin, self.delay)
    }

    fn set_on(&mut self, on: bool) {
        // Feedback is advisory; a stuck pin is not worth failing over
        let _ = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
    }
}

impl<P: OutputPin, D: DelayNs> Feedback for VibeMotor<P, D> {
    fn vibrate(&mut self, pattern: VibePattern) {
        for (i, &ms) in pattern.segments_ms().iter().enumerate() {
            self.set_on(i % 2 == 0);
            self.delay.delay_ms(ms);
        }
        self.set_on(false);
        self.played += 1;
    }
}
