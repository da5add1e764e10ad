//! Jig drivers: button monitor, power rails, LEDs, and bus buffers.

pub mod bus;
pub mod buttons;
pub mod leds;
pub mod power;
