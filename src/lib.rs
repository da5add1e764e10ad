//! Board-support driver for the ESP32-S3 production test jig.
//!
//! The jig powers a target board under test through two switchable rails,
//! senses whether the target is shorted, verifies rail voltages, drives the
//! operator LEDs, gates the bus buffers between the jig brain and the target,
//! and reads the two capacitive touch buttons the operator uses to sequence
//! test steps.
//!
//! All hardware access goes through the port traits in [`ports`]. On the
//! jig controller (`target_os = "espidf"`) the [`adapters::hardware`] module
//! implements them over ESP-IDF; on the host the [`adapters::sim`] module
//! provides deterministic fakes for the test suite.

#![deny(unused_must_use)]

pub mod config;
pub mod jig;
pub mod measure;
pub mod pins;
pub mod ports;

pub mod adapters;
pub mod drivers;

pub use config::JigConfig;
pub use drivers::buttons::{Button, ButtonMonitor, CapacitiveButtons, DigitalButtons, WaitOutcome};
pub use drivers::power::{PowerRails, Rail};
pub use jig::TestJig;
pub use measure::within_tolerance;
