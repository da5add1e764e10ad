//! ESP-IDF hardware adapter for the jig controller.
//!
//! Implements the port traits over raw `esp_idf_svc::sys` calls. One-shot
//! peripheral setup happens in the constructors, which are called once from
//! the fixture program before its control loop starts; everything here is
//! single-threaded after that.

use core::fmt;

use esp_idf_svc::sys::{
    adc_atten_t_ADC_ATTEN_DB_11, adc_oneshot_chan_cfg_t, adc_oneshot_config_channel,
    adc_oneshot_new_unit, adc_oneshot_read, adc_oneshot_unit_handle_t,
    adc_oneshot_unit_init_cfg_t, adc_unit_t_ADC_UNIT_1, esp_rom_delay_us, esp_timer_get_time,
    gpio_get_level, gpio_mode_t_GPIO_MODE_INPUT, gpio_mode_t_GPIO_MODE_OUTPUT, gpio_set_direction,
    gpio_set_level, touch_pad_config, touch_pad_fsm_start, touch_pad_init,
    touch_pad_read_raw_data, touch_pad_set_fsm_mode, touch_pad_fsm_mode_t_TOUCH_FSM_MODE_TIMER,
    ESP_OK,
};
use log::info;

use crate::pins;
use crate::ports::{AnalogIn, Clock, DigitalIo, PinMode, TouchSense};

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    TouchInitFailed(i32),
}

impl fmt::Display for HwInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={rc})"),
            Self::TouchInitFailed(rc) => write!(f, "touch peripheral init failed (rc={rc})"),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── Clock ─────────────────────────────────────────────────────

/// Monotonic clock over the ESP high-resolution timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspClock;

impl Clock for EspClock {
    fn now_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is thread-safe and always available
        // after boot.
        (unsafe { esp_timer_get_time() }) as u64 / 1000
    }

    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }

    fn delay_us(&self, us: u32) {
        // Busy-wait: sub-millisecond sample spacing must not yield.
        unsafe { esp_rom_delay_us(us) };
    }
}

// ── Digital I/O ───────────────────────────────────────────────

/// Raw GPIO access. Stateless handle; clones address the same pins.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspGpio;

impl DigitalIo for EspGpio {
    fn set_mode(&mut self, pin: i32, mode: PinMode) {
        let dir = match mode {
            PinMode::Input => gpio_mode_t_GPIO_MODE_INPUT,
            PinMode::Output => gpio_mode_t_GPIO_MODE_OUTPUT,
        };
        // SAFETY: pin numbers come from `pins` or validated fixture config.
        unsafe { gpio_set_direction(pin, dir) };
    }

    fn write(&mut self, pin: i32, high: bool) {
        unsafe { gpio_set_level(pin, u32::from(high)) };
    }

    fn read(&mut self, pin: i32) -> bool {
        (unsafe { gpio_get_level(pin) }) != 0
    }
}

// ── Analog ────────────────────────────────────────────────────

/// ADC1 oneshot reader, normalised to 10-bit counts.
pub struct EspAnalog {
    unit: adc_oneshot_unit_handle_t,
}

impl EspAnalog {
    /// Create the ADC1 unit and configure the jig sense channels.
    pub fn new() -> Result<Self, HwInitError> {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ..Default::default()
        };
        let mut unit: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: called once at fixture startup, before any reads.
        let rc = unsafe { adc_oneshot_new_unit(&init_cfg, &mut unit) };
        if rc != ESP_OK {
            return Err(HwInitError::AdcInitFailed(rc));
        }

        let mut adc = Self { unit };
        for gpio in [
            pins::PT_READ_V1_GPIO,
            pins::PT_READ_V2_GPIO,
            pins::BRAIN_VCC_GPIO,
        ] {
            adc.config_channel(gpio)?;
        }
        info!("hardware: ADC1 configured");
        Ok(adc)
    }

    fn config_channel(&mut self, gpio: i32) -> Result<(), HwInitError> {
        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_11,
            ..Default::default()
        };
        let rc = unsafe { adc_oneshot_config_channel(self.unit, Self::channel(gpio), &chan_cfg) };
        if rc != ESP_OK {
            return Err(HwInitError::AdcInitFailed(rc));
        }
        Ok(())
    }

    /// ADC1 channel for a sense GPIO (on the S3, channel = GPIO − 1).
    fn channel(gpio: i32) -> u32 {
        (gpio - 1) as u32
    }
}

impl AnalogIn for EspAnalog {
    fn read_counts(&mut self, channel_gpio: i32) -> u16 {
        let mut raw: i32 = 0;
        let rc =
            unsafe { adc_oneshot_read(self.unit, Self::channel(channel_gpio), &mut raw) };
        if rc != ESP_OK {
            // Fail closed: a dead converter reads as 0 counts.
            return 0;
        }
        // Native 12-bit → calibrated 10-bit counts.
        (raw >> 2) as u16
    }
}

// ── Capacitive touch ──────────────────────────────────────────

/// Raw touch magnitudes from the S3 touch peripheral.
#[derive(Debug, Clone, Copy)]
pub struct EspTouch;

impl EspTouch {
    /// Initialise the touch FSM and configure the two button pads.
    pub fn new() -> Result<Self, HwInitError> {
        unsafe {
            let rc = touch_pad_init();
            if rc != ESP_OK {
                return Err(HwInitError::TouchInitFailed(rc));
            }
            for pad in [pins::TOUCH_BUTTON_1_PAD, pins::TOUCH_BUTTON_2_PAD] {
                let rc = touch_pad_config(pad as u32);
                if rc != ESP_OK {
                    return Err(HwInitError::TouchInitFailed(rc));
                }
            }
            touch_pad_set_fsm_mode(touch_pad_fsm_mode_t_TOUCH_FSM_MODE_TIMER);
            let rc = touch_pad_fsm_start();
            if rc != ESP_OK {
                return Err(HwInitError::TouchInitFailed(rc));
            }
        }
        info!("hardware: touch peripheral started");
        Ok(Self)
    }
}

impl TouchSense for EspTouch {
    fn read_raw(&mut self, pad: i32) -> i32 {
        let mut raw: u32 = 0;
        let rc = unsafe { touch_pad_read_raw_data(pad as u32, &mut raw) };
        if rc != ESP_OK {
            // Sensing fault sentinel; the button strategy logs and treats
            // it as released.
            return -1;
        }
        raw as i32
    }
}
