//! Port traits — the boundary between jig logic and the outside world.
//!
//! Adapters implement these traits; the drivers consume them via generics,
//! so the debounce state machine and the rail/short tests never touch
//! hardware directly.
//!
//! Implementations are expected to be cheap handles: the jig facade and the
//! drivers each hold their own clone of an adapter.

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic wall clock plus cooperative delays.
///
/// `delay_*` is the only suspension point in the driver: every busy-poll
/// loop yields through it so the scheduler (or simulated time) can advance.
pub trait Clock {
    /// Milliseconds since boot. Monotonic, never goes backwards.
    fn now_ms(&self) -> u64;

    /// Yield for at least `ms` milliseconds.
    fn delay_ms(&self, ms: u32);

    /// Busy-wait for `us` microseconds (sub-millisecond sample spacing).
    fn delay_us(&self, us: u32);
}

// ───────────────────────────────────────────────────────────────
// Digital I/O
// ───────────────────────────────────────────────────────────────

/// Pin direction for [`DigitalIo::set_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// High-impedance input. Used to release ladder resistors and CS lines.
    Input,
    /// Push-pull output.
    Output,
}

/// Raw digital pin access.
pub trait DigitalIo {
    fn set_mode(&mut self, pin: i32, mode: PinMode);
    fn write(&mut self, pin: i32, high: bool);
    fn read(&mut self, pin: i32) -> bool;
}

/// Read-only digital input — all the digital button strategy needs.
pub trait DigitalInput {
    fn read_input(&mut self, pin: i32) -> bool;
}

impl<T: DigitalIo> DigitalInput for T {
    fn read_input(&mut self, pin: i32) -> bool {
        self.read(pin)
    }
}

// ───────────────────────────────────────────────────────────────
// Analog
// ───────────────────────────────────────────────────────────────

/// One-shot analog conversion.
///
/// Readings are normalised to 10-bit counts (0–1023) regardless of the
/// native converter width; the empirical short/jumper thresholds are
/// calibrated in these counts.
pub trait AnalogIn {
    fn read_counts(&mut self, channel: i32) -> u16;
}

/// Full scale of the normalised ADC counts.
pub const ADC_FULL_SCALE: u16 = 1024;

// ───────────────────────────────────────────────────────────────
// Capacitive touch
// ───────────────────────────────────────────────────────────────

/// Raw capacitive magnitude for one touch pad.
///
/// A negative value signals a sensing fault (peripheral timeout, pad
/// disconnected). Callers must treat faults as "not pressed", never abort.
pub trait TouchSense {
    fn read_raw(&mut self, pad: i32) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Reset hook
// ───────────────────────────────────────────────────────────────

/// Board-specific reset callback, invoked at the end of [`TestJig::reset`]
/// (after every jig output has been returned to its power-on state).
///
/// Test programs supply one at construction to de-power or de-configure the
/// board under test; the default is a no-op.
///
/// [`TestJig::reset`]: crate::jig::TestJig::reset
pub trait ResetHook {
    fn on_reset(&mut self);
}

/// Default hook: does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResetHook;

impl ResetHook for NoopResetHook {
    fn on_reset(&mut self) {}
}
