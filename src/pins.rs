//! GPIO / peripheral pin assignments for the test jig controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Operator LEDs (active HIGH)
// ---------------------------------------------------------------------------

/// Lit when the pre-test (program & test) phase passes.
pub const LED_PRETEST_PASS_GPIO: i32 = 35;
/// Lit when the final test phase passes.
pub const LED_TEST_PASS_GPIO: i32 = 36;
/// Lit on any failure.
pub const LED_FAIL_GPIO: i32 = 37;
/// General status LED, also used for Morse signalling.
pub const LED_STAT_GPIO: i32 = 38;

// ---------------------------------------------------------------------------
// Rail voltage selection ladders
//
// Each pin enables one feedback resistor off the regulator adjust line.
// Driving a pin LOW enables its resistor; releasing the pin to input
// disables it.
// ---------------------------------------------------------------------------

pub const V1_SEL_3V3_GPIO: i32 = 39;
pub const V1_SEL_5V0_GPIO: i32 = 40;

pub const V2_SEL_3V3_GPIO: i32 = 41;
pub const V2_SEL_3V7_GPIO: i32 = 42;
pub const V2_SEL_4V2_GPIO: i32 = 45;
pub const V2_SEL_5V0_GPIO: i32 = 46;

/// High-side switch: HIGH connects regulator 1 to the target.
pub const V1_POWER_GPIO: i32 = 47;
/// High-side switch: HIGH connects regulator 2 to the target.
pub const V2_POWER_GPIO: i32 = 48;

// ---------------------------------------------------------------------------
// Short-circuit pre-test divider
//
// Driving the control pin HIGH feeds a small voltage through a diode and a
// 100k/110k divider onto the rail sense nodes. A shorted target drags the
// sense reading down.
// ---------------------------------------------------------------------------

pub const POWER_TEST_CONTROL_GPIO: i32 = 21;
/// Rail 1 sense node — ADC channel.
pub const PT_READ_V1_GPIO: i32 = 5;
/// Rail 2 sense node — ADC channel.
pub const PT_READ_V2_GPIO: i32 = 6;
/// 3.3 V Zener on the jig brain's own supply — ADC channel.
pub const BRAIN_VCC_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Operator touch buttons
// ---------------------------------------------------------------------------

/// Touch pad for button 1 (PRETEST / program & test).
pub const TOUCH_BUTTON_1_PAD: i32 = 10;
/// Touch pad for button 2 (TEST).
pub const TOUCH_BUTTON_2_PAD: i32 = 11;

/// Discrete-input alternatives for jigs fitted with a touch IC that
/// exposes a digital output instead of a raw pad.
pub const DIGITAL_BUTTON_1_GPIO: i32 = 12;
pub const DIGITAL_BUTTON_2_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Target bus buffers (74LVC4066 switches, enable HIGH)
// ---------------------------------------------------------------------------

pub const I2C_EN_GPIO: i32 = 15;
pub const SERIAL_EN_GPIO: i32 = 16;
pub const SPI_EN_GPIO: i32 = 17;
pub const MICROSD_EN_GPIO: i32 = 18;

/// Chip select for the jig-side microSD slot.
pub const MICROSD_CS_GPIO: i32 = 33;
/// Chip select routed to the target board's SPI device.
pub const TARGET_CS_GPIO: i32 = 34;

// ---------------------------------------------------------------------------
// I2C bus to the target (behind the I2C buffer)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
