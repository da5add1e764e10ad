//! Target power rails: voltage selection, short detection, rail verification.
//!
//! Both rails are adjustable regulators whose output is picked by grounding
//! one resistor of a feedback ladder, then connected to the target through a
//! high-side switch. Short detection never powers the target: it feeds a
//! small probe voltage through a diode and a 100k/110k divider onto the rail
//! sense node and checks whether the target drags the reading down.
//!
//! Failure policy throughout: log, fail closed, return a sentinel verdict.
//! Nothing in this module panics or returns `Result`.

use log::{debug, error, warn};

use crate::measure::{counts_to_volts, within_tolerance};
use crate::pins;
use crate::ports::{AnalogIn, Clock, DigitalIo, PinMode};

/// The two target supply rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rail {
    V1,
    V2,
}

/// Settle time between driving a probe/control pin and sampling the ADC.
const SETTLE_MS: u32 = 200;

/// Allowed deviation when verifying a powered rail against its setting.
const RAIL_TOLERANCE_PERCENT: f32 = 5.0;

/// The rail sense nodes sit behind a 10k/100k divider; a powered rail reads
/// 10/11 of its true voltage.
const SENSE_DIVIDER_RATIO: f32 = 10.0 / 11.0;

/// Probe-divider reading (10-bit counts) with a dead short on the rail is
/// ~413 (3.3 V jig) or ~438 (5 V jig); with no load it is ~789 / ~837.
/// Anything below 90 % of the no-load value is called a short.
const NO_SHORT_MIN_COUNTS_3V3: u16 = 710;
const NO_SHORT_MIN_COUNTS_5V0: u16 = 753;

/// Empirical centre of the jumper band for the custom pre-test pins.
const JUMPER_BAND_COUNTS: f32 = 486.0;
const JUMPER_BAND_PERCENT: f32 = 3.0;

/// A 3.3 V jig brain reads its own Zener pegged at full scale; anything
/// below this means VCC is miswired or misconfigured.
const ZENER_MIN_COUNTS_3V3: u16 = 950;

pub struct PowerRails<G: DigitalIo, A: AnalogIn, C: Clock> {
    io: G,
    adc: A,
    clock: C,
    vcc: f32,
    /// Voltage each rail will produce when enabled. 0.0 = never configured.
    v1_setting: f32,
    v2_setting: f32,
    /// Voltage each rail is currently producing. 0.0 = disabled.
    v1_actual: f32,
    v2_actual: f32,
}

impl<G: DigitalIo, A: AnalogIn, C: Clock> PowerRails<G, A, C> {
    pub fn new(io: G, adc: A, clock: C, vcc: f32) -> Self {
        Self {
            io,
            adc,
            clock,
            vcc,
            v1_setting: 0.0,
            v2_setting: 0.0,
            v1_actual: 0.0,
            v2_actual: 0.0,
        }
    }

    /// Voltage the rail will produce once enabled (0.0 if not configured).
    pub fn setting(&self, rail: Rail) -> f32 {
        match rail {
            Rail::V1 => self.v1_setting,
            Rail::V2 => self.v2_setting,
        }
    }

    /// Voltage the rail is currently producing (0.0 if disabled).
    pub fn actual(&self, rail: Rail) -> f32 {
        match rail {
            Rail::V1 => self.v1_actual,
            Rail::V2 => self.v2_actual,
        }
    }

    // ── Voltage selection ─────────────────────────────────────

    /// Configure the rail's regulator for `volts` without connecting it to
    /// the target. V1 offers 3.3/5.0; V2 offers 3.3/3.7/4.2/5.0. An
    /// out-of-menu request logs an error and falls back to 3.3 V.
    pub fn set_voltage(&mut self, rail: Rail, volts: f32) {
        match rail {
            Rail::V1 => self.set_voltage_v1(volts),
            Rail::V2 => self.set_voltage_v2(volts),
        }
    }

    fn set_voltage_v1(&mut self, volts: f32) {
        self.release_ladder(&[pins::V1_SEL_3V3_GPIO, pins::V1_SEL_5V0_GPIO]);

        let (sel, setting) = if (3.25..=3.35).contains(&volts) {
            (pins::V1_SEL_3V3_GPIO, 3.3)
        } else if (4.95..=5.05).contains(&volts) {
            (pins::V1_SEL_5V0_GPIO, 5.0)
        } else {
            error!("power: V1 cannot produce {volts:.2} V, defaulting to 3.3 V");
            (pins::V1_SEL_3V3_GPIO, 3.3)
        };

        self.ground_ladder_pin(sel);
        self.v1_setting = setting;
    }

    fn set_voltage_v2(&mut self, volts: f32) {
        self.release_ladder(&[
            pins::V2_SEL_3V3_GPIO,
            pins::V2_SEL_3V7_GPIO,
            pins::V2_SEL_4V2_GPIO,
            pins::V2_SEL_5V0_GPIO,
        ]);

        let (sel, setting) = if (3.25..=3.35).contains(&volts) {
            (pins::V2_SEL_3V3_GPIO, 3.3)
        } else if (3.65..=3.75).contains(&volts) {
            (pins::V2_SEL_3V7_GPIO, 3.7)
        } else if (4.15..=4.25).contains(&volts) {
            (pins::V2_SEL_4V2_GPIO, 4.2)
        } else if (4.95..=5.05).contains(&volts) {
            (pins::V2_SEL_5V0_GPIO, 5.0)
        } else {
            error!("power: V2 cannot produce {volts:.2} V, defaulting to 3.3 V");
            (pins::V2_SEL_3V3_GPIO, 3.3)
        };

        self.ground_ladder_pin(sel);
        self.v2_setting = setting;
    }

    /// Pull every listed ladder pin low and release it to input.
    fn release_ladder(&mut self, sel_pins: &[i32]) {
        for &pin in sel_pins {
            self.io.write(pin, false);
            self.io.set_mode(pin, PinMode::Input);
        }
    }

    fn ground_ladder_pin(&mut self, pin: i32) {
        self.io.set_mode(pin, PinMode::Output);
        self.io.write(pin, false);
    }

    // ── High-side switches ────────────────────────────────────

    /// Connect the rail's regulator to the target. Refused (logged) if the
    /// rail voltage was never configured.
    pub fn enable(&mut self, rail: Rail) {
        if self.setting(rail) == 0.0 {
            error!("power: {rail:?} enabled before set_voltage; refusing");
            return;
        }
        let pin = Self::power_pin(rail);
        self.io.write(pin, true);
        self.io.set_mode(pin, PinMode::Output);
        match rail {
            Rail::V1 => self.v1_actual = self.v1_setting,
            Rail::V2 => self.v2_actual = self.v2_setting,
        }
    }

    /// Disconnect the rail from the target.
    pub fn disable(&mut self, rail: Rail) {
        let pin = Self::power_pin(rail);
        self.io.write(pin, false);
        self.io.set_mode(pin, PinMode::Output);
        match rail {
            Rail::V1 => self.v1_actual = 0.0,
            Rail::V2 => self.v2_actual = 0.0,
        }
    }

    fn power_pin(rail: Rail) -> i32 {
        match rail {
            Rail::V1 => pins::V1_POWER_GPIO,
            Rail::V2 => pins::V2_POWER_GPIO,
        }
    }

    fn sense_channel(rail: Rail) -> i32 {
        match rail {
            Rail::V1 => pins::PT_READ_V1_GPIO,
            Rail::V2 => pins::PT_READ_V2_GPIO,
        }
    }

    // ── Short detection ───────────────────────────────────────

    /// Probe the rail for a short to ground on the unpowered target.
    /// Returns true if a short is detected. Both rails are disabled first.
    pub fn is_shorted(&mut self, rail: Rail) -> bool {
        self.disable(Rail::V1);
        self.disable(Rail::V2);

        let counts = self.probe_counts(pins::POWER_TEST_CONTROL_GPIO, Self::sense_channel(rail));

        let no_short_min = if (3.29..=3.31).contains(&self.vcc) {
            NO_SHORT_MIN_COUNTS_3V3
        } else {
            NO_SHORT_MIN_COUNTS_5V0
        };

        debug!("power: {rail:?} short probe read {counts} (clean ≥ {no_short_min})");
        counts < no_short_min
    }

    /// Jumper pre-test on caller-chosen pins. Returns true if all is good,
    /// false if a jumper/short is detected in the empirical band.
    pub fn pretest_custom(&mut self, control_pin: i32, read_channel: i32) -> bool {
        !self.is_short_to_ground_custom(control_pin, read_channel)
    }

    /// Returns true if the custom probe reads inside the jumper band —
    /// i.e. a short to ground is present.
    pub fn is_short_to_ground_custom(&mut self, control_pin: i32, read_channel: i32) -> bool {
        let counts = self.probe_counts(control_pin, read_channel);
        debug!("power: custom jumper probe read {counts}");

        let shorted = within_tolerance(f32::from(counts), JUMPER_BAND_COUNTS, JUMPER_BAND_PERCENT);
        if shorted {
            warn!("power: jumper detected on channel {read_channel} (read {counts})");
        }
        shorted
    }

    /// Drive `control_pin` high, settle, sample `read_channel`, release the
    /// control pin back to input.
    fn probe_counts(&mut self, control_pin: i32, read_channel: i32) -> u16 {
        self.io.set_mode(control_pin, PinMode::Output);
        self.io.write(control_pin, true);

        self.clock.delay_ms(SETTLE_MS);
        let counts = self.adc.read_counts(read_channel);

        self.io.write(control_pin, false);
        self.io.set_mode(control_pin, PinMode::Input);
        counts
    }

    // ── Voltage verification ──────────────────────────────────

    /// Settle, sample the channel, convert to volts against the jig VCC and
    /// verify against `expected_volts` ± `allowed_percent`.
    pub fn verify_voltage(
        &mut self,
        channel: i32,
        expected_volts: f32,
        allowed_percent: f32,
    ) -> bool {
        self.clock.delay_ms(SETTLE_MS);
        let counts = self.adc.read_counts(channel);
        let volts = counts_to_volts(counts, self.vcc);

        debug!(
            "power: channel {channel} read {counts} counts = {volts:.2} V \
             (expect {expected_volts:.2} V ± {allowed_percent}%)"
        );
        within_tolerance(volts, expected_volts, allowed_percent)
    }

    /// Check that an enabled rail is actually producing its configured
    /// voltage, compensating for the sense divider. A disabled rail
    /// (actual 0.0) fails unless the sense node genuinely reads zero.
    pub fn test_voltage(&mut self, rail: Rail) -> bool {
        let expected = self.actual(rail) * SENSE_DIVIDER_RATIO;
        self.verify_voltage(Self::sense_channel(rail), expected, RAIL_TOLERANCE_PERCENT)
    }

    /// Check the jig brain's own supply against the 3.3 V Zener reference.
    ///
    /// On a 3.3 V jig the Zener reads pegged near full scale; on a 5 V jig
    /// it must read 3.3 V ± 10 %.
    pub fn test_vcc(&mut self) -> bool {
        if (3.29..=3.31).contains(&self.vcc) {
            let counts = self.adc.read_counts(pins::BRAIN_VCC_GPIO);
            debug!("power: VCC zener read {counts} (expect ≥ {ZENER_MIN_COUNTS_3V3})");
            return counts >= ZENER_MIN_COUNTS_3V3;
        }
        self.verify_voltage(pins::BRAIN_VCC_GPIO, 3.3, 10.0)
    }

    /// Return every power output to its power-on state: rails disabled,
    /// ladders released, probe divider released.
    pub fn all_off(&mut self) {
        self.disable(Rail::V1);
        self.disable(Rail::V2);
        self.release_ladder(&[
            pins::V1_SEL_3V3_GPIO,
            pins::V1_SEL_5V0_GPIO,
            pins::V2_SEL_3V3_GPIO,
            pins::V2_SEL_3V7_GPIO,
            pins::V2_SEL_4V2_GPIO,
            pins::V2_SEL_5V0_GPIO,
        ]);
        self.io.write(pins::POWER_TEST_CONTROL_GPIO, false);
        self.io.set_mode(pins::POWER_TEST_CONTROL_GPIO, PinMode::Input);
        self.v1_setting = 0.0;
        self.v2_setting = 0.0;
    }
}
