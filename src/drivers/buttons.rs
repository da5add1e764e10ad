//! Debounced dual-button monitor.
//!
//! Converts two raw, possibly noisy "is pressed" signals into three
//! blocking, timeout-bounded operator gestures:
//!
//! | Operation                        | Gesture                              |
//! |----------------------------------|--------------------------------------|
//! | `wait_for_press`                 | press held ≥ min_hold                |
//! | `wait_for_press_release`         | press, then clean release            |
//! | `wait_for_release_press_release` | idle, then press, then clean release |
//!
//! Each operation busy-polls both buttons, yielding to the scheduler through
//! [`Clock::delay_ms`] between polls, and resolves to [`WaitOutcome`] — a
//! timeout is an ordinary outcome, never an error.
//!
//! ## Budget composition
//!
//! Every deadline is computed from one start timestamp. The `*_from`
//! variants let a caller chain phases under that single budget: the
//! three-phase gesture re-supplies its original start to the inner
//! press-release wait, so total latency is bounded by one timeout rather
//! than the sum of per-phase timeouts. Callers that want independent
//! budgets simply use the plain variants, which capture a fresh "now".

use log::warn;

use crate::ports::{Clock, DigitalInput, TouchSense};

// ── Button identities ─────────────────────────────────────────

/// The two operator buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Button 1 — the PRETEST (program & test) pad.
    One,
    /// Button 2 — the TEST pad.
    Two,
}

/// Result of a wait operation.
///
/// Discriminants are fixed at 0/1/2 — jig test logs and fixture scripts
/// identify buttons by these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WaitOutcome {
    /// No qualifying gesture before the deadline.
    TimedOut = 0,
    Button1 = 1,
    Button2 = 2,
}

impl WaitOutcome {
    /// The 0/1/2 code used in fixture scripts.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The accepted button, if any.
    pub const fn button(self) -> Option<Button> {
        match self {
            Self::TimedOut => None,
            Self::Button1 => Some(Button::One),
            Self::Button2 => Some(Button::Two),
        }
    }
}

impl From<Button> for WaitOutcome {
    fn from(b: Button) -> Self {
        match b {
            Button::One => Self::Button1,
            Button::Two => Self::Button2,
        }
    }
}

// ── Sensing strategies ────────────────────────────────────────

/// A source of debounce-ready button state. One fresh reading per poll;
/// nothing is cached between polls.
pub trait PressSense {
    fn is_pressed(&mut self, button: Button) -> bool;
}

/// Capacitive strategy: a pad counts as pressed while its raw magnitude
/// exceeds the configured threshold.
pub struct CapacitiveButtons<T: TouchSense> {
    touch: T,
    pads: [i32; 2],
    threshold: i32,
}

impl<T: TouchSense> CapacitiveButtons<T> {
    /// `pads` are the touch pads for button 1 and button 2, in that order.
    pub fn new(touch: T, pads: [i32; 2], threshold: i32) -> Self {
        Self {
            touch,
            pads,
            threshold,
        }
    }

    /// Magnitude above which a pad counts as pressed.
    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Retune the press threshold (e.g. after a jig re-calibration).
    pub fn set_threshold(&mut self, threshold: i32) {
        self.threshold = threshold;
    }

    fn pad(&self, button: Button) -> i32 {
        match button {
            Button::One => self.pads[0],
            Button::Two => self.pads[1],
        }
    }
}

impl<T: TouchSense> PressSense for CapacitiveButtons<T> {
    fn is_pressed(&mut self, button: Button) -> bool {
        let pad = self.pad(button);
        let raw = self.touch.read_raw(pad);
        if raw < 0 {
            // Sensing fault — read as released and keep polling.
            warn!("buttons: touch read fault on pad {pad} (raw={raw})");
            return false;
        }
        raw > self.threshold
    }
}

/// Digital strategy: the pin must read high on every one of `samples`
/// reads spaced `spacing_us` apart. A single low sample rejects the poll,
/// which filters noise spikes and the heartbeat pulses some touch ICs
/// emit on their digital output.
pub struct DigitalButtons<G: DigitalInput, C: Clock> {
    io: G,
    clock: C,
    pins: [i32; 2],
    samples: u8,
    spacing_us: u32,
}

impl<G: DigitalInput, C: Clock> DigitalButtons<G, C> {
    /// `pins` are the inputs for button 1 and button 2, in that order.
    pub fn new(io: G, clock: C, pins: [i32; 2], samples: u8, spacing_us: u32) -> Self {
        Self {
            io,
            clock,
            pins,
            samples: samples.max(1),
            spacing_us,
        }
    }

    pub fn samples(&self) -> u8 {
        self.samples
    }

    /// Change the per-poll sample count. Zero is refused (it would make
    /// every poll read as pressed).
    pub fn set_samples(&mut self, samples: u8) {
        if samples == 0 {
            warn!("buttons: ignoring sample count of 0");
            return;
        }
        self.samples = samples;
    }

    fn pin(&self, button: Button) -> i32 {
        match button {
            Button::One => self.pins[0],
            Button::Two => self.pins[1],
        }
    }
}

impl<G: DigitalInput, C: Clock> PressSense for DigitalButtons<G, C> {
    fn is_pressed(&mut self, button: Button) -> bool {
        let pin = self.pin(button);
        for i in 0..self.samples {
            if i > 0 {
                self.clock.delay_us(self.spacing_us);
            }
            if !self.io.read_input(pin) {
                return false;
            }
        }
        true
    }
}

// ── Monitor ───────────────────────────────────────────────────

/// Blocking wait-for-button state machine over an owned sensing strategy.
///
/// Non-reentrant: one caller, one thread of control. The only shared state
/// across calls is the strategy's tunables; all press/release timers are
/// local to a single wait.
pub struct ButtonMonitor<S: PressSense, C: Clock> {
    sense: S,
    clock: C,
    poll_interval_ms: u32,
}

impl<S: PressSense, C: Clock> ButtonMonitor<S, C> {
    pub fn new(sense: S, clock: C, poll_interval_ms: u32) -> Self {
        Self {
            sense,
            clock,
            poll_interval_ms,
        }
    }

    /// Access the sensing strategy (e.g. to retune its threshold).
    pub fn sense_mut(&mut self) -> &mut S {
        &mut self.sense
    }

    /// Single poll of button 1 (PRETEST), no debounce.
    pub fn is_pretest_pressed(&mut self) -> bool {
        self.sense.is_pressed(Button::One)
    }

    /// Single poll of button 2 (TEST), no debounce.
    pub fn is_test_pressed(&mut self) -> bool {
        self.sense.is_pressed(Button::Two)
    }

    /// Block until either button has been held continuously for
    /// `min_hold_ms`, or the budget runs out.
    ///
    /// The deadline is `now + timeout_ms + min_hold_ms`: a press that lands
    /// right at the timeout boundary still gets its full debounce window.
    /// With `min_hold_ms == 0` a press is accepted on the first poll that
    /// observes it.
    pub fn wait_for_press(&mut self, timeout_ms: u64, min_hold_ms: u64) -> WaitOutcome {
        let start = self.clock.now_ms();
        self.wait_for_press_from(start, timeout_ms, min_hold_ms)
    }

    /// [`wait_for_press`](Self::wait_for_press) against an existing budget:
    /// the deadline is computed from `start_ms`, not from "now".
    pub fn wait_for_press_from(
        &mut self,
        start_ms: u64,
        timeout_ms: u64,
        min_hold_ms: u64,
    ) -> WaitOutcome {
        let deadline = start_ms + timeout_ms + min_hold_ms;
        // Candidate button and the instant its candidacy began.
        let mut candidate: Option<(Button, u64)> = None;

        loop {
            let now = self.clock.now_ms();
            if now > deadline {
                return WaitOutcome::TimedOut;
            }

            let one = self.sense.is_pressed(Button::One);
            let two = self.sense.is_pressed(Button::Two);

            match candidate {
                None => {
                    // Button 1 wins a simultaneous press; button 2 is not
                    // considered for this candidacy.
                    if one {
                        candidate = Some((Button::One, now));
                    } else if two {
                        candidate = Some((Button::Two, now));
                    }
                }
                Some((held, _)) => {
                    let still_pressed = match held {
                        Button::One => one,
                        Button::Two => two,
                    };
                    if !still_pressed {
                        // Bounce — drop the candidate and keep searching.
                        // No penalty beyond the time already spent.
                        candidate = None;
                    }
                }
            }

            if let Some((held, since)) = candidate {
                if now - since >= min_hold_ms {
                    return held.into();
                }
            }

            self.clock.delay_ms(self.poll_interval_ms);
        }
    }

    /// Block until a button is pressed (per [`wait_for_press`]) and then
    /// observed continuously released for `min_release_ms`.
    ///
    /// A re-press of the accepted button during the release window resets
    /// the release timer: the operator must produce one clean release.
    ///
    /// [`wait_for_press`]: Self::wait_for_press
    pub fn wait_for_press_release(
        &mut self,
        timeout_ms: u64,
        min_hold_ms: u64,
        min_release_ms: u64,
    ) -> WaitOutcome {
        let start = self.clock.now_ms();
        self.wait_for_press_release_from(start, timeout_ms, min_hold_ms, min_release_ms)
    }

    /// [`wait_for_press_release`](Self::wait_for_press_release) against an
    /// existing budget.
    pub fn wait_for_press_release_from(
        &mut self,
        start_ms: u64,
        timeout_ms: u64,
        min_hold_ms: u64,
        min_release_ms: u64,
    ) -> WaitOutcome {
        let accepted = match self
            .wait_for_press_from(start_ms, timeout_ms, min_hold_ms)
            .button()
        {
            Some(b) => b,
            None => return WaitOutcome::TimedOut,
        };

        let deadline = start_ms + timeout_ms + min_hold_ms + min_release_ms;
        // Instant the accepted button was last observed released.
        let mut released_since: Option<u64> = None;

        loop {
            let now = self.clock.now_ms();
            if now > deadline {
                return WaitOutcome::TimedOut;
            }

            if self.sense.is_pressed(accepted) {
                released_since = None;
            } else {
                let since = *released_since.get_or_insert(now);
                if now - since >= min_release_ms {
                    return accepted.into();
                }
            }

            self.clock.delay_ms(self.poll_interval_ms);
        }
    }

    /// Three-phase gesture that guards against a button already held down
    /// when the call is made: wait for both buttons released continuously
    /// for `min_pre_release_ms`, then for a press, then for a clean release.
    ///
    /// Phase 1 runs within budget `timeout + pre + hold + post`; phases 2/3
    /// delegate to [`wait_for_press_release_from`] with the original start,
    /// so the whole gesture is bounded by a single budget.
    ///
    /// [`wait_for_press_release_from`]: Self::wait_for_press_release_from
    pub fn wait_for_release_press_release(
        &mut self,
        timeout_ms: u64,
        min_pre_release_ms: u64,
        min_hold_ms: u64,
        min_post_release_ms: u64,
    ) -> WaitOutcome {
        let start = self.clock.now_ms();
        self.wait_for_release_press_release_from(
            start,
            timeout_ms,
            min_pre_release_ms,
            min_hold_ms,
            min_post_release_ms,
        )
    }

    /// [`wait_for_release_press_release`](Self::wait_for_release_press_release)
    /// against an existing budget.
    pub fn wait_for_release_press_release_from(
        &mut self,
        start_ms: u64,
        timeout_ms: u64,
        min_pre_release_ms: u64,
        min_hold_ms: u64,
        min_post_release_ms: u64,
    ) -> WaitOutcome {
        let deadline =
            start_ms + timeout_ms + min_pre_release_ms + min_hold_ms + min_post_release_ms;
        // Instant both buttons were last observed released.
        let mut idle_since: Option<u64> = None;

        loop {
            let now = self.clock.now_ms();
            if now > deadline {
                return WaitOutcome::TimedOut;
            }

            let any_pressed =
                self.sense.is_pressed(Button::One) || self.sense.is_pressed(Button::Two);
            if any_pressed {
                idle_since = None;
            } else {
                let since = *idle_since.get_or_insert(now);
                if now - since >= min_pre_release_ms {
                    break;
                }
            }

            self.clock.delay_ms(self.poll_interval_ms);
        }

        self.wait_for_press_release_from(start_ms, timeout_ms, min_hold_ms, min_post_release_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::{ScriptedButtons, ScriptedTouch, SimClock, SimDigitalIo};

    fn monitor(
        clock: &SimClock,
        presses: &[(Button, u64, u64)],
    ) -> ButtonMonitor<ScriptedButtons, SimClock> {
        let mut buttons = ScriptedButtons::new(clock.clone());
        for &(b, from, to) in presses {
            buttons.press(b, from, to);
        }
        ButtonMonitor::new(buttons, clock.clone(), 1)
    }

    #[test]
    fn clean_press_accepted_after_hold() {
        let clock = SimClock::new();
        let mut m = monitor(&clock, &[(Button::One, 50, 400)]);
        let outcome = m.wait_for_press(1000, 100);
        assert_eq!(outcome, WaitOutcome::Button1);
        // Candidacy starts at t=50, accepted once held 100 ms.
        let now = clock.now_ms();
        assert!((150..=155).contains(&now), "accepted at t={now}");
    }

    #[test]
    fn zero_hold_accepts_on_first_poll() {
        let clock = SimClock::new();
        let mut m = monitor(&clock, &[(Button::Two, 10, 40)]);
        assert_eq!(m.wait_for_press(100, 0), WaitOutcome::Button2);
        assert!(clock.now_ms() <= 12);
    }

    #[test]
    fn no_press_times_out_after_budget() {
        let clock = SimClock::new();
        let mut m = monitor(&clock, &[]);
        assert_eq!(m.wait_for_press(200, 50), WaitOutcome::TimedOut);
        let now = clock.now_ms();
        assert!((250..=255).contains(&now), "timed out at t={now}");
    }

    #[test]
    fn short_bounce_is_rejected() {
        // 30 ms blip, shorter than the 100 ms hold; nothing else follows.
        let clock = SimClock::new();
        let mut m = monitor(&clock, &[(Button::One, 20, 50)]);
        assert_eq!(m.wait_for_press(200, 100), WaitOutcome::TimedOut);
    }

    #[test]
    fn bounce_then_real_press_is_accepted() {
        let clock = SimClock::new();
        let mut m = monitor(
            &clock,
            &[(Button::One, 20, 50), (Button::One, 100, 300)],
        );
        assert_eq!(m.wait_for_press(1000, 100), WaitOutcome::Button1);
        let now = clock.now_ms();
        assert!((200..=205).contains(&now), "accepted at t={now}");
    }

    #[test]
    fn simultaneous_press_resolves_to_button1() {
        let clock = SimClock::new();
        let mut m = monitor(
            &clock,
            &[(Button::One, 10, 500), (Button::Two, 10, 500)],
        );
        assert_eq!(m.wait_for_press(1000, 50), WaitOutcome::Button1);
    }

    #[test]
    fn button2_candidacy_survives_a_later_button1_press() {
        // Button 2 is already the candidate when button 1 appears; the
        // candidacy is not stolen mid-hold.
        let clock = SimClock::new();
        let mut m = monitor(
            &clock,
            &[(Button::Two, 10, 500), (Button::One, 60, 500)],
        );
        assert_eq!(m.wait_for_press(1000, 100), WaitOutcome::Button2);
    }

    #[test]
    fn press_release_returns_after_clean_release() {
        let clock = SimClock::new();
        let mut m = monitor(&clock, &[(Button::One, 10, 200)]);
        let outcome = m.wait_for_press_release(1000, 50, 100);
        assert_eq!(outcome, WaitOutcome::Button1);
        // Release observed from t=200; accepted 100 ms later.
        let now = clock.now_ms();
        assert!((300..=305).contains(&now), "released at t={now}");
    }

    #[test]
    fn re_press_restarts_the_release_timer() {
        // Released for 99 ms (one short of the window), re-pressed, then
        // released for good: the gesture must still succeed, but only a
        // full 100 ms after the final release.
        let clock = SimClock::new();
        let mut m = monitor(
            &clock,
            &[(Button::One, 0, 100), (Button::One, 199, 250)],
        );
        let outcome = m.wait_for_press_release(1000, 50, 100);
        assert_eq!(outcome, WaitOutcome::Button1);
        let now = clock.now_ms();
        assert!(now >= 350, "must not finish before t=350, got t={now}");
    }

    #[test]
    fn press_release_timeout_when_never_released() {
        let clock = SimClock::new();
        let mut m = monitor(&clock, &[(Button::Two, 0, 10_000)]);
        assert_eq!(
            m.wait_for_press_release(200, 50, 50),
            WaitOutcome::TimedOut
        );
        // Overall deadline: 200 + 50 + 50.
        let now = clock.now_ms();
        assert!((300..=305).contains(&now), "timed out at t={now}");
    }

    #[test]
    fn held_button_must_clear_before_three_phase_gesture() {
        // Button held from before the call until t=100; pressed again at
        // t=300. Phase 1 requires 50 ms of idle first.
        let clock = SimClock::new();
        let mut m = monitor(
            &clock,
            &[(Button::One, 0, 100), (Button::One, 300, 450)],
        );
        let outcome = m.wait_for_release_press_release(1000, 50, 50, 50);
        assert_eq!(outcome, WaitOutcome::Button1);
        // Press candidacy at 300, hold until 350, release at 450 + 50.
        let now = clock.now_ms();
        assert!((500..=505).contains(&now), "finished at t={now}");
    }

    #[test]
    fn three_phase_budget_does_not_compound() {
        // Phases 2/3 inherit the original start: their deadline is
        // start + timeout + hold + post, NOT extended by the pre window.
        // A press arriving just past that boundary must time out.
        let clock = SimClock::new();
        let mut m = monitor(&clock, &[(Button::One, 380, 10_000)]);
        // Budget for phases 2/3: 200 + 50 + 50 = 300 ms from t=0.
        let outcome = m.wait_for_release_press_release(200, 100, 50, 50);
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[test]
    fn three_phase_times_out_if_never_idle() {
        let clock = SimClock::new();
        let mut m = monitor(&clock, &[(Button::Two, 0, 10_000)]);
        assert_eq!(
            m.wait_for_release_press_release(100, 50, 50, 50),
            WaitOutcome::TimedOut
        );
        let now = clock.now_ms();
        assert!((250..=255).contains(&now), "timed out at t={now}");
    }

    #[test]
    fn capacitive_fault_reads_as_released() {
        let clock = SimClock::new();
        let mut touch = ScriptedTouch::new(clock.clone(), 200);
        touch.magnitude(10, 0, 10_000, -1); // sensing fault on pad 10
        let caps = CapacitiveButtons::new(touch, [10, 11], 5000);
        let mut m = ButtonMonitor::new(caps, clock.clone(), 1);
        assert_eq!(m.wait_for_press(50, 10), WaitOutcome::TimedOut);
    }

    #[test]
    fn capacitive_threshold_is_strict() {
        let clock = SimClock::new();
        let mut touch = ScriptedTouch::new(clock.clone(), 200);
        touch.magnitude(10, 0, 10_000, 5000); // exactly at threshold
        let caps = CapacitiveButtons::new(touch, [10, 11], 5000);
        let mut m = ButtonMonitor::new(caps, clock.clone(), 1);
        assert_eq!(m.wait_for_press(50, 0), WaitOutcome::TimedOut);

        let mut touch = ScriptedTouch::new(clock.clone(), 200);
        touch.magnitude(10, 0, 20_000, 5001); // one count over
        let caps = CapacitiveButtons::new(touch, [10, 11], 5000);
        let mut m = ButtonMonitor::new(caps, clock.clone(), 1);
        assert_eq!(m.wait_for_press(50, 0), WaitOutcome::Button1);
    }

    #[test]
    fn digital_spike_shorter_than_sample_train_is_rejected() {
        let clock = SimClock::new();
        let io = SimDigitalIo::new(clock.clone());
        // High for only 10 µs — the 6-sample train spans 25 µs.
        io.input_window_us(5, 0, 10);
        let mut d = DigitalButtons::new(io, clock.clone(), [5, 6], 6, 5);
        assert!(!d.is_pressed(Button::One));
    }

    #[test]
    fn digital_steady_high_is_pressed() {
        let clock = SimClock::new();
        let io = SimDigitalIo::new(clock.clone());
        io.set_input(5, true);
        let mut d = DigitalButtons::new(io, clock.clone(), [5, 6], 6, 5);
        assert!(d.is_pressed(Button::One));
        assert!(!d.is_pressed(Button::Two));
    }

    #[test]
    fn sample_count_of_zero_is_refused() {
        let clock = SimClock::new();
        let io = SimDigitalIo::new(clock.clone());
        let mut d = DigitalButtons::new(io, clock.clone(), [5, 6], 6, 5);
        d.set_samples(0);
        assert_eq!(d.samples(), 6);
    }

    #[test]
    fn outcome_codes_are_stable() {
        assert_eq!(WaitOutcome::TimedOut.code(), 0);
        assert_eq!(WaitOutcome::Button1.code(), 1);
        assert_eq!(WaitOutcome::Button2.code(), 2);
    }
}
