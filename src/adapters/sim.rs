//! Deterministic simulation adapters for host-side tests.
//!
//! Simulated time advances only inside the clock's `delay_*` calls, so a
//! poll loop steps the world forward one poll interval at a time and every
//! scenario is exactly reproducible. Button presses, touch magnitudes and
//! digital levels are scripted as time windows against that clock.
//!
//! All adapters are cheap `Rc` handles: clones observe the same state,
//! which lets a test keep a handle while the driver owns another.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::drivers::buttons::{Button, PressSense};
use crate::ports::{AnalogIn, Clock, DigitalIo, PinMode, TouchSense};

// ── Clock ─────────────────────────────────────────────────────

/// Virtual monotonic clock starting at t = 0.
#[derive(Clone, Default)]
pub struct SimClock {
    now_us: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw microsecond count (used by [`SimDigitalIo`] window scripting).
    pub fn raw_us(&self) -> u64 {
        self.now_us.get()
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_us.get() / 1000
    }

    fn delay_ms(&self, ms: u32) {
        self.now_us.set(self.now_us.get() + u64::from(ms) * 1000);
    }

    fn delay_us(&self, us: u32) {
        self.now_us.set(self.now_us.get() + u64::from(us));
    }
}

// ── Scripted button state ─────────────────────────────────────

/// Press schedule for the two operator buttons: each entry holds a button
/// pressed during `[from_ms, to_ms)`.
pub struct ScriptedButtons {
    clock: SimClock,
    windows: Vec<(Button, u64, u64)>,
}

impl ScriptedButtons {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            windows: Vec::new(),
        }
    }

    /// Schedule a press of `button` during `[from_ms, to_ms)`.
    pub fn press(&mut self, button: Button, from_ms: u64, to_ms: u64) {
        self.windows.push((button, from_ms, to_ms));
    }
}

impl PressSense for ScriptedButtons {
    fn is_pressed(&mut self, button: Button) -> bool {
        let now = self.clock.now_ms();
        self.windows
            .iter()
            .any(|&(b, from, to)| b == button && now >= from && now < to)
    }
}

// ── Scripted touch magnitudes ─────────────────────────────────

/// Raw capacitive magnitude per pad, scripted as time windows. Outside any
/// window a pad reads `idle`; a window may carry a negative value to
/// simulate a sensing fault.
pub struct ScriptedTouch {
    clock: SimClock,
    idle: i32,
    windows: Vec<(i32, u64, u64, i32)>,
}

impl ScriptedTouch {
    pub fn new(clock: SimClock, idle: i32) -> Self {
        Self {
            clock,
            idle,
            windows: Vec::new(),
        }
    }

    /// Schedule `pad` to read `raw` during `[from_ms, to_ms)`.
    pub fn magnitude(&mut self, pad: i32, from_ms: u64, to_ms: u64, raw: i32) {
        self.windows.push((pad, from_ms, to_ms, raw));
    }
}

impl TouchSense for ScriptedTouch {
    fn read_raw(&mut self, pad: i32) -> i32 {
        let now = self.clock.now_ms();
        self.windows
            .iter()
            .find(|&&(p, from, to, _)| p == pad && now >= from && now < to)
            .map_or(self.idle, |&(_, _, _, raw)| raw)
    }
}

// ── Digital I/O ───────────────────────────────────────────────

#[derive(Default)]
struct PinState {
    levels: HashMap<i32, bool>,
    modes: HashMap<i32, PinMode>,
    inputs: HashMap<i32, bool>,
    /// Input pins forced high during `[from_us, to_us)`.
    windows_us: Vec<(i32, u64, u64)>,
}

/// Recording digital I/O fake with scripted inputs.
#[derive(Clone)]
pub struct SimDigitalIo {
    clock: SimClock,
    state: Rc<RefCell<PinState>>,
}

impl SimDigitalIo {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            state: Rc::new(RefCell::new(PinState::default())),
        }
    }

    /// Pin a static input level.
    pub fn set_input(&self, pin: i32, high: bool) {
        self.state.borrow_mut().inputs.insert(pin, high);
    }

    /// Force `pin` to read high during `[from_us, to_us)` (microseconds —
    /// fine enough for sample-train scripting).
    pub fn input_window_us(&self, pin: i32, from_us: u64, to_us: u64) {
        self.state.borrow_mut().windows_us.push((pin, from_us, to_us));
    }

    /// Last level written to `pin`, if any.
    pub fn level(&self, pin: i32) -> Option<bool> {
        self.state.borrow().levels.get(&pin).copied()
    }

    /// Last mode set on `pin`, if any.
    pub fn mode(&self, pin: i32) -> Option<PinMode> {
        self.state.borrow().modes.get(&pin).copied()
    }

    fn now_us(&self) -> u64 {
        self.clock.raw_us()
    }
}

impl DigitalIo for SimDigitalIo {
    fn set_mode(&mut self, pin: i32, mode: PinMode) {
        self.state.borrow_mut().modes.insert(pin, mode);
    }

    fn write(&mut self, pin: i32, high: bool) {
        self.state.borrow_mut().levels.insert(pin, high);
    }

    fn read(&mut self, pin: i32) -> bool {
        let now_us = self.now_us();
        let state = self.state.borrow();
        if state
            .windows_us
            .iter()
            .any(|&(p, from, to)| p == pin && now_us >= from && now_us < to)
        {
            return true;
        }
        state
            .inputs
            .get(&pin)
            .or_else(|| state.levels.get(&pin))
            .copied()
            .unwrap_or(false)
    }
}

// ── Analog ────────────────────────────────────────────────────

/// Programmable ADC returning fixed 10-bit counts per channel.
#[derive(Clone, Default)]
pub struct SimAnalog {
    counts: Rc<RefCell<HashMap<i32, u16>>>,
}

impl SimAnalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_counts(&self, channel: i32, counts: u16) {
        self.counts.borrow_mut().insert(channel, counts);
    }
}

impl AnalogIn for SimAnalog {
    fn read_counts(&mut self, channel: i32) -> u16 {
        self.counts.borrow().get(&channel).copied().unwrap_or(0)
    }
}

// ── I2C bus ───────────────────────────────────────────────────

/// Fake I2C bus that acknowledges a fixed set of addresses.
pub struct SimI2cBus {
    present: Vec<u8>,
}

impl SimI2cBus {
    pub fn new(present: &[u8]) -> Self {
        Self {
            present: present.to_vec(),
        }
    }
}

/// Probe failure: address not acknowledged.
#[derive(Debug)]
pub struct SimI2cError;

impl embedded_hal::i2c::Error for SimI2cError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        embedded_hal::i2c::ErrorKind::NoAcknowledge(
            embedded_hal::i2c::NoAcknowledgeSource::Address,
        )
    }
}

impl embedded_hal::i2c::ErrorType for SimI2cBus {
    type Error = SimI2cError;
}

impl embedded_hal::i2c::I2c for SimI2cBus {
    fn transaction(
        &mut self,
        address: u8,
        _operations: &mut [embedded_hal::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.present.contains(&address) {
            Ok(())
        } else {
            Err(SimI2cError)
        }
    }
}
