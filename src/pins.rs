//! GPIO / peripheral pin assignments for the coop door board (ESP32-C3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Stepper motor (28BYJ-48 on a ULN2003 darlington array)
// ---------------------------------------------------------------------------

pub const STEPPER_IN1_GPIO: i32 = 2;
pub const STEPPER_IN2_GPIO: i32 = 3;
pub const STEPPER_IN3_GPIO: i32 = 4;
pub const STEPPER_IN4_GPIO: i32 = 5;

/// Coil pins in phase order IN1..IN4.
pub const STEPPER_COIL_GPIOS: [i32; 4] = [
    STEPPER_IN1_GPIO,
    STEPPER_IN2_GPIO,
    STEPPER_IN3_GPIO,
    STEPPER_IN4_GPIO,
];

// ---------------------------------------------------------------------------
// Door-position switch
// ---------------------------------------------------------------------------

/// Digital input with pull-up.  HIGH = door open (before inversion).
pub const DOOR_SWITCH_GPIO: i32 = 10;

// ---------------------------------------------------------------------------
// I²C bus (DS3231 RTC)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 6;
pub const I2C_SCL_GPIO: i32 = 7;
/// I²C bus clock for the RTC.
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Status LED (discrete RGB, common cathode)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 0;
pub const LED_G_GPIO: i32 = 1;
pub const LED_B_GPIO: i32 = 8;

// ---------------------------------------------------------------------------
// UART command link
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 18;
pub const UART_RX_GPIO: i32 = 19;
pub const UART_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC frequency for the RGB status LED (1 kHz).
pub const LED_PWM_FREQ_HZ: u32 = 1_000;
