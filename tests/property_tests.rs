//! Property-based tests for the tolerance verifier and the button monitor.
//!
//! Host-only: proptest is a dev-dependency for non-espidf targets.

#![cfg(not(target_os = "espidf"))]

use proptest::prelude::*;

use testjig_bsp::adapters::sim::{ScriptedButtons, SimClock};
use testjig_bsp::measure::{counts_to_volts, within_tolerance};
use testjig_bsp::ports::{Clock, ADC_FULL_SCALE};
use testjig_bsp::{Button, ButtonMonitor, WaitOutcome};

fn monitor_with_press(
    clock: &SimClock,
    from_ms: u64,
    to_ms: u64,
) -> ButtonMonitor<ScriptedButtons, SimClock> {
    let mut buttons = ScriptedButtons::new(clock.clone());
    buttons.press(Button::One, from_ms, to_ms);
    ButtonMonitor::new(buttons, clock.clone(), 1)
}

proptest! {
    #[test]
    fn exact_reading_always_verifies(
        expected in 0.1f32..1000.0,
        percent in 0.0f32..50.0,
    ) {
        prop_assert!(within_tolerance(expected, expected, percent));
    }

    #[test]
    fn reading_well_inside_the_window_verifies(
        expected in 1.0f32..1000.0,
        percent in 1.0f32..50.0,
        // Fraction of the half-window, kept clear of the boundary.
        offset in -0.9f32..0.9,
    ) {
        let measured = expected * (1.0 + offset * percent / 100.0);
        prop_assert!(within_tolerance(measured, expected, percent));
    }

    #[test]
    fn reading_well_outside_the_window_fails(
        expected in 1.0f32..1000.0,
        percent in 1.0f32..50.0,
        // At least 10% beyond the window edge.
        excess in 1.1f32..3.0,
    ) {
        let high = expected * (1.0 + excess * percent / 100.0);
        let low = expected * (1.0 - excess * percent / 100.0);
        prop_assert!(!within_tolerance(high, expected, percent));
        prop_assert!(!within_tolerance(low, expected, percent));
    }

    #[test]
    fn converted_counts_never_exceed_vcc(counts in 0u16..ADC_FULL_SCALE) {
        let volts = counts_to_volts(counts, 3.3);
        prop_assert!(volts >= 0.0);
        prop_assert!(volts < 3.3 + f32::EPSILON);
    }

    #[test]
    fn long_enough_press_is_always_accepted(
        press_at in 0u64..200,
        min_hold in 0u64..100,
        // Margin over the hold window absorbs poll-grid quantisation.
        extra in 5u64..200,
    ) {
        let clock = SimClock::new();
        let mut m = monitor_with_press(&clock, press_at, press_at + min_hold + extra);
        let outcome = m.wait_for_press(1000, min_hold);
        prop_assert_eq!(outcome, WaitOutcome::Button1);
    }

    #[test]
    fn too_short_press_never_qualifies(
        press_at in 0u64..200,
        duration in 0u64..95,
    ) {
        // Strictly shorter than the hold window, with poll-grid margin.
        let min_hold = duration + 5;
        let clock = SimClock::new();
        let mut m = monitor_with_press(&clock, press_at, press_at + duration);
        let outcome = m.wait_for_press(300, min_hold);
        prop_assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[test]
    fn wait_never_overruns_its_budget(
        press_at in 0u64..500,
        duration in 0u64..500,
        timeout in 1u64..400,
        min_hold in 0u64..100,
    ) {
        let clock = SimClock::new();
        let mut m = monitor_with_press(&clock, press_at, press_at + duration);
        let _ = m.wait_for_press(timeout, min_hold);
        // One poll interval of slack past the deadline.
        prop_assert!(clock.now_ms() <= timeout + min_hold + 2);
    }
}
