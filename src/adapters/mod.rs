//! Port implementations.
//!
//! `hardware` is the only module in the crate that touches real peripherals
//! and only exists on the jig controller; `sim` provides the deterministic
//! fakes the host test suite runs against.

#[cfg(target_os = "espidf")]
pub mod hardware;

#[cfg(not(target_os = "espidf"))]
pub mod sim;
