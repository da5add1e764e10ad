//! Top-level jig facade: composition, reset, and monitor wiring.

use anyhow::{ensure, Result};
use log::info;

use crate::config::JigConfig;
use crate::drivers::bus::BusBuffers;
use crate::drivers::buttons::{ButtonMonitor, CapacitiveButtons, DigitalButtons};
use crate::drivers::leds::JigLeds;
use crate::drivers::power::PowerRails;
use crate::pins;
use crate::ports::{AnalogIn, Clock, DigitalInput, DigitalIo, ResetHook, TouchSense};

/// The jig: rails, LEDs and bus buffers behind one handle, plus the
/// board-specific reset hook.
///
/// The button monitor is constructed separately (see
/// [`capacitive_monitor`] / [`digital_monitor`]) because its sensing
/// strategy is chosen per jig build and fixed for the object's lifetime.
pub struct TestJig<G, A, C, R>
where
    G: DigitalIo + Clone,
    A: AnalogIn,
    C: Clock + Clone,
    R: ResetHook,
{
    rails: PowerRails<G, A, C>,
    leds: JigLeds<G, C>,
    buffers: BusBuffers<G>,
    hook: R,
    config: JigConfig,
}

impl<G, A, C, R> TestJig<G, A, C, R>
where
    G: DigitalIo + Clone,
    A: AnalogIn,
    C: Clock + Clone,
    R: ResetHook,
{
    /// Build the jig and drive every output to its power-on state.
    ///
    /// Fails if `config.vcc` is not one of the supported brain supplies
    /// (3.3 or 5.0): the ADC conversions and short thresholds are only
    /// calibrated for those.
    pub fn new(io: G, adc: A, clock: C, hook: R, config: JigConfig) -> Result<Self> {
        ensure!(
            (3.29..=3.31).contains(&config.vcc) || (4.99..=5.01).contains(&config.vcc),
            "unsupported jig VCC {:.2} (expected 3.3 or 5.0)",
            config.vcc
        );

        let mut jig = Self {
            rails: PowerRails::new(io.clone(), adc, clock.clone(), config.vcc),
            leds: JigLeds::new(io.clone(), clock, pins::LED_STAT_GPIO),
            buffers: BusBuffers::new(io),
            hook,
            config,
        };
        jig.reset();
        Ok(jig)
    }

    /// Return every jig output to its power-on state, then invoke the
    /// board-specific reset hook.
    pub fn reset(&mut self) {
        info!("jig: reset");
        self.leds.all_off();
        self.rails.all_off();
        self.buffers.disable_all();
        self.hook.on_reset();
    }

    pub fn config(&self) -> &JigConfig {
        &self.config
    }

    pub fn rails(&mut self) -> &mut PowerRails<G, A, C> {
        &mut self.rails
    }

    pub fn leds(&mut self) -> &mut JigLeds<G, C> {
        &mut self.leds
    }

    pub fn buffers(&mut self) -> &mut BusBuffers<G> {
        &mut self.buffers
    }
}

/// Wire a capacitive button monitor to the standard jig touch pads.
pub fn capacitive_monitor<T: TouchSense, C: Clock>(
    touch: T,
    clock: C,
    config: &JigConfig,
) -> ButtonMonitor<CapacitiveButtons<T>, C> {
    let sense = CapacitiveButtons::new(
        touch,
        [pins::TOUCH_BUTTON_1_PAD, pins::TOUCH_BUTTON_2_PAD],
        config.touch_press_threshold,
    );
    ButtonMonitor::new(sense, clock, config.poll_interval_ms)
}

/// Wire a digital button monitor to the standard jig button inputs, for
/// jigs fitted with a touch IC exposing a digital output.
pub fn digital_monitor<G: DigitalInput, C: Clock + Clone>(
    io: G,
    clock: C,
    config: &JigConfig,
) -> ButtonMonitor<DigitalButtons<G, C>, C> {
    let sense = DigitalButtons::new(
        io,
        clock.clone(),
        [pins::DIGITAL_BUTTON_1_GPIO, pins::DIGITAL_BUTTON_2_GPIO],
        config.digital_samples,
        config.digital_sample_spacing_us,
    );
    ButtonMonitor::new(sense, clock, config.poll_interval_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::{SimAnalog, SimClock, SimDigitalIo};
    use crate::ports::{NoopResetHook, PinMode};

    #[test]
    fn rejects_unsupported_vcc() {
        let clock = SimClock::new();
        let io = SimDigitalIo::new(clock.clone());
        let config = JigConfig {
            vcc: 4.0,
            ..JigConfig::default()
        };
        let result = TestJig::new(io, SimAnalog::new(), clock, NoopResetHook, config);
        assert!(result.is_err());
    }

    #[test]
    fn construction_parks_all_outputs() {
        let clock = SimClock::new();
        let io = SimDigitalIo::new(clock.clone());
        let jig = TestJig::new(
            io.clone(),
            SimAnalog::new(),
            clock,
            NoopResetHook,
            JigConfig::default(),
        );
        assert!(jig.is_ok());

        assert_eq!(io.level(crate::pins::LED_FAIL_GPIO), Some(false));
        assert_eq!(io.level(crate::pins::V1_POWER_GPIO), Some(false));
        assert_eq!(io.level(crate::pins::I2C_EN_GPIO), Some(false));
        assert_eq!(
            io.mode(crate::pins::POWER_TEST_CONTROL_GPIO),
            Some(PinMode::Input)
        );
    }

    #[test]
    fn reset_invokes_the_user_hook() {
        use std::cell::Cell;
        use std::rc::Rc;

        #[derive(Clone)]
        struct CountingHook(Rc<Cell<u32>>);
        impl ResetHook for CountingHook {
            fn on_reset(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let calls = Rc::new(Cell::new(0));
        let clock = SimClock::new();
        let io = SimDigitalIo::new(clock.clone());
        let mut jig = TestJig::new(
            io,
            SimAnalog::new(),
            clock,
            CountingHook(calls.clone()),
            JigConfig::default(),
        )
        .unwrap();

        assert_eq!(calls.get(), 1); // construction resets once
        jig.reset();
        assert_eq!(calls.get(), 2);
    }
}
