//! Operator LEDs and Morse signalling.
//!
//! Pass/fail LEDs tell the operator how the last sequence ended; the status
//! LED doubles as a Morse beacon (the boot path blinks SOS when the brain
//! VCC check fails, since serial may not be up yet).

use crate::pins;
use crate::ports::{Clock, DigitalIo, PinMode};

/// Morse timing: the dot is the base unit; a dash is three dots; on/off
/// gaps within a letter are one dot; words are separated by seven dots.
const DOT_MS: u32 = 250;
const DASH_MS: u32 = 3 * DOT_MS;
const WORD_GAP_MS: u32 = 7 * DOT_MS;

pub struct JigLeds<G: DigitalIo, C: Clock> {
    io: G,
    clock: C,
    /// Status LED pin — usually [`pins::LED_STAT_GPIO`], but a custom jig
    /// can route it elsewhere.
    stat_pin: i32,
}

impl<G: DigitalIo, C: Clock> JigLeds<G, C> {
    pub fn new(io: G, clock: C, stat_pin: i32) -> Self {
        let mut leds = Self {
            io,
            clock,
            stat_pin,
        };
        for pin in [
            pins::LED_PRETEST_PASS_GPIO,
            pins::LED_TEST_PASS_GPIO,
            pins::LED_FAIL_GPIO,
            stat_pin,
        ] {
            leds.io.set_mode(pin, PinMode::Output);
        }
        // Freshly-configured outputs may hold stale levels.
        leds.all_off();
        leds
    }

    pub fn stat_on(&mut self) {
        self.io.write(self.stat_pin, true);
    }

    pub fn stat_off(&mut self) {
        self.io.write(self.stat_pin, false);
    }

    pub fn set_pretest_pass(&mut self, lit: bool) {
        self.io.write(pins::LED_PRETEST_PASS_GPIO, lit);
    }

    pub fn set_test_pass(&mut self, lit: bool) {
        self.io.write(pins::LED_TEST_PASS_GPIO, lit);
    }

    pub fn set_fail(&mut self, lit: bool) {
        self.io.write(pins::LED_FAIL_GPIO, lit);
    }

    /// All LEDs dark (power-on state).
    pub fn all_off(&mut self) {
        self.set_pretest_pass(false);
        self.set_test_pass(false);
        self.set_fail(false);
        self.stat_off();
    }

    /// One Morse dot on `pin` (status LED if `None`).
    pub fn dot(&mut self, pin: Option<i32>) {
        self.blink(pin, DOT_MS);
    }

    /// One Morse dash on `pin` (status LED if `None`).
    pub fn dash(&mut self, pin: Option<i32>) {
        self.blink(pin, DASH_MS);
    }

    /// Blink SOS (· · · — — — · · ·) followed by a word gap.
    pub fn sos(&mut self, pin: Option<i32>) {
        for _ in 0..3 {
            self.dot(pin);
        }
        for _ in 0..3 {
            self.dash(pin);
        }
        for _ in 0..3 {
            self.dot(pin);
        }
        self.clock.delay_ms(WORD_GAP_MS);
    }

    fn blink(&mut self, pin: Option<i32>, on_ms: u32) {
        let pin = pin.unwrap_or(self.stat_pin);
        self.io.write(pin, true);
        self.clock.delay_ms(on_ms);
        self.io.write(pin, false);
        self.clock.delay_ms(DOT_MS);
    }
}
