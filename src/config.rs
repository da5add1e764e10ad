//! Jig configuration parameters.
//!
//! All tunable parameters for the test jig driver. Defaults carry the
//! empirical values measured on the reference jig; a provisioning blob can
//! override them at setup time. Runtime-mutable knobs (touch threshold,
//! sample count) are changed through explicit setters on the owning driver,
//! never behind its back.

use serde::{Deserialize, Serialize};

/// Core jig configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JigConfig {
    // --- Supply ---
    /// The jig brain's own supply voltage. 3.3 or 5.0.
    /// Used in ADC count → volt conversions and short-test thresholds.
    pub vcc: f32,

    // --- Buttons ---
    /// Capacitive magnitude above which a pad counts as pressed.
    pub touch_press_threshold: i32,
    /// Number of consecutive digital samples that must all read high.
    pub digital_samples: u8,
    /// Spacing between digital samples (microseconds).
    pub digital_sample_spacing_us: u32,
    /// Scheduler yield between button polls (milliseconds).
    pub poll_interval_ms: u32,
}

impl Default for JigConfig {
    fn default() -> Self {
        Self {
            vcc: 3.3,

            // Buttons
            touch_press_threshold: 5000,
            digital_samples: 6,
            digital_sample_spacing_us: 5,
            poll_interval_ms: 1,
        }
    }
}
