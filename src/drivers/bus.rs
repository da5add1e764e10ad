//! Target bus buffers and I2C device probing.
//!
//! Four 74LVC4066 analog switches isolate the jig brain from the target's
//! I2C, serial, SPI, and microSD buses so an unpowered or faulty target
//! can't back-feed the brain. Chip-select lines are parked deselected
//! before the corresponding buffer closes.

use embedded_hal::i2c::I2c;
use heapless::Vec;
use log::info;

use crate::pins;
use crate::ports::{DigitalIo, PinMode};

/// Most addresses a single scan reports; a real target bus has far fewer
/// devices than this.
pub const MAX_SCAN_HITS: usize = 16;

pub struct BusBuffers<G: DigitalIo> {
    io: G,
}

impl<G: DigitalIo> BusBuffers<G> {
    pub fn new(io: G) -> Self {
        Self { io }
    }

    pub fn enable_i2c(&mut self) {
        self.io.set_mode(pins::I2C_EN_GPIO, PinMode::Output);
        self.io.write(pins::I2C_EN_GPIO, true);
    }

    pub fn disable_i2c(&mut self) {
        self.io.write(pins::I2C_EN_GPIO, false);
        self.io.set_mode(pins::I2C_EN_GPIO, PinMode::Output);
    }

    pub fn enable_serial(&mut self) {
        self.io.set_mode(pins::SERIAL_EN_GPIO, PinMode::Output);
        self.io.write(pins::SERIAL_EN_GPIO, true);
    }

    pub fn disable_serial(&mut self) {
        self.io.write(pins::SERIAL_EN_GPIO, false);
        self.io.set_mode(pins::SERIAL_EN_GPIO, PinMode::Output);
    }

    /// Deselects the target's SPI device before closing the switch.
    pub fn enable_spi(&mut self) {
        self.io.set_mode(pins::TARGET_CS_GPIO, PinMode::Output);
        self.io.write(pins::TARGET_CS_GPIO, true);
        self.io.set_mode(pins::SPI_EN_GPIO, PinMode::Output);
        self.io.write(pins::SPI_EN_GPIO, true);
    }

    pub fn disable_spi(&mut self) {
        self.io.write(pins::SPI_EN_GPIO, false);
        self.io.set_mode(pins::SPI_EN_GPIO, PinMode::Output);
        // Park CS high-impedance; it is re-driven when the buffer re-opens.
        self.io.write(pins::TARGET_CS_GPIO, true);
        self.io.set_mode(pins::TARGET_CS_GPIO, PinMode::Input);
    }

    /// Deselects the microSD card before closing the switch.
    pub fn enable_microsd(&mut self) {
        self.io.set_mode(pins::MICROSD_CS_GPIO, PinMode::Output);
        self.io.write(pins::MICROSD_CS_GPIO, true);
        self.io.set_mode(pins::MICROSD_EN_GPIO, PinMode::Output);
        self.io.write(pins::MICROSD_EN_GPIO, true);
    }

    pub fn disable_microsd(&mut self) {
        self.io.write(pins::MICROSD_EN_GPIO, false);
        self.io.set_mode(pins::MICROSD_EN_GPIO, PinMode::Output);
        self.io.write(pins::MICROSD_CS_GPIO, true);
        self.io.set_mode(pins::MICROSD_CS_GPIO, PinMode::Input);
    }

    /// All buffers open, CS lines parked (power-on state).
    pub fn disable_all(&mut self) {
        self.disable_i2c();
        self.disable_serial();
        self.disable_spi();
        self.disable_microsd();
    }
}

/// Probe the target's I2C bus with zero-length writes.
///
/// With `address = Some(a)` only that device is pinged; with `None` the full
/// 7-bit range (1..=126) is scanned. Returns the responding addresses (up to
/// [`MAX_SCAN_HITS`]); an empty result means nothing acknowledged. Bus
/// errors on a probe count as "no device", matching the fail-closed policy.
pub fn scan_i2c<I: I2c>(bus: &mut I, address: Option<u8>) -> Vec<u8, MAX_SCAN_HITS> {
    let mut found = Vec::new();

    for device in 1..=126u8 {
        if let Some(a) = address {
            if device != a {
                continue;
            }
        }
        if bus.write(device, &[]).is_ok() {
            info!("bus: I2C device found at 0x{device:02x}");
            if found.push(device).is_err() {
                break;
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::{SimClock, SimDigitalIo, SimI2cBus};

    #[test]
    fn spi_enable_deselects_target_first() {
        let clock = SimClock::new();
        let io = SimDigitalIo::new(clock);
        let mut buffers = BusBuffers::new(io.clone());

        buffers.enable_spi();
        assert_eq!(io.level(pins::TARGET_CS_GPIO), Some(true));
        assert_eq!(io.level(pins::SPI_EN_GPIO), Some(true));

        buffers.disable_spi();
        assert_eq!(io.level(pins::SPI_EN_GPIO), Some(false));
        assert_eq!(io.mode(pins::TARGET_CS_GPIO), Some(PinMode::Input));
    }

    #[test]
    fn disable_all_opens_every_buffer() {
        let clock = SimClock::new();
        let io = SimDigitalIo::new(clock);
        let mut buffers = BusBuffers::new(io.clone());

        buffers.enable_i2c();
        buffers.enable_serial();
        buffers.enable_microsd();
        buffers.disable_all();

        for pin in [
            pins::I2C_EN_GPIO,
            pins::SERIAL_EN_GPIO,
            pins::SPI_EN_GPIO,
            pins::MICROSD_EN_GPIO,
        ] {
            assert_eq!(io.level(pin), Some(false), "buffer pin {pin} still high");
        }
    }

    #[test]
    fn full_scan_reports_exactly_the_responders() {
        let mut bus = SimI2cBus::new(&[0x29, 0x68]);
        let found = scan_i2c(&mut bus, None);
        assert_eq!(found.as_slice(), &[0x29, 0x68]);
    }

    #[test]
    fn single_address_probe() {
        let mut bus = SimI2cBus::new(&[0x29, 0x68]);
        assert_eq!(scan_i2c(&mut bus, Some(0x68)).as_slice(), &[0x68]);
        assert!(scan_i2c(&mut bus, Some(0x50)).is_empty());
    }
}
