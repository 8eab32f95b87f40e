//! Coop door firmware: main entry point.
//!
//! Hexagonal architecture with a fixed-rate control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter         SerialLink       LogEventSink         │
//! │  (Clock+Switch+Motor+LED) (CommandPort)   (EventSink)          │
//! │  EmbeddedConfig                                                │
//! │  (ConfigPort)                                                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            DoorController (pure logic)                 │    │
//! │  │  Mode FSM · Schedule · Recheck                         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Worker threads: stepper · status LED · serial reader          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::Delay;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::{error, info};

use coopdoor::adapters::embedded_config::EmbeddedConfig;
use coopdoor::adapters::hardware::HardwareAdapter;
use coopdoor::adapters::log_sink::LogEventSink;
use coopdoor::adapters::serial_link::{self, LineChannel, SerialLink, UartRx, UartTx};
use coopdoor::app::DoorController;
use coopdoor::app::ports::ClockPort;
use coopdoor::drivers::door_switch::DoorSwitch;
use coopdoor::drivers::ds3231::Ds3231;
use coopdoor::drivers::gpio::GpioPin;
use coopdoor::drivers::hw_init;
use coopdoor::drivers::status_led::{LedcRgb, StatusLed};
use coopdoor::drivers::stepper::{StepperMotor, close_stops_at_switch};
use coopdoor::drivers::watchdog::Watchdog;
use coopdoor::error::Error;
use coopdoor::pins;
use coopdoor::schedule::DEFAULT_SCHEDULE;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CoopDoor v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = EmbeddedConfig::from_build_env().load_or_default();

    // ── 3. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals().map_err(|e| {
        error!("HAL init failed: {}", e);
        Error::Init("peripherals")
    })?;
    let peripherals = Peripherals::take()?;

    // RTC on I2C0 (SDA/SCL per pins::I2C_SDA_GPIO / I2C_SCL_GPIO).
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6,
        peripherals.pins.gpio7,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;
    let mut rtc = Ds3231::new(i2c);
    let boot_time = rtc.now().map_err(|e| {
        error!("RTC unreadable at boot: {}", e);
        Error::from(e)
    })?;
    info!("RTC: {}", boot_time);

    // Command link on UART1 (TX/RX per pins::UART_TX_GPIO / UART_RX_GPIO).
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio18,
        peripherals.pins.gpio19,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(pins::UART_BAUD)),
    )?;
    let (uart_tx, uart_rx) = uart.into_split();

    // ── 4. Worker threads ─────────────────────────────────────
    let switch = DoorSwitch::new(
        GpioPin::new(pins::DOOR_SWITCH_GPIO),
        config.invert_door_switch,
    );
    let close_guard = close_stops_at_switch(DoorSwitch::new(
        GpioPin::new(pins::DOOR_SWITCH_GPIO),
        config.invert_door_switch,
    ));
    let motor = StepperMotor::spawn(
        pins::STEPPER_COIL_GPIOS.map(GpioPin::new),
        Delay::new_default(),
        close_guard,
        &config,
    )
    .map_err(Error::from)?;

    let led = StatusLed::spawn(LedcRgb)?;

    let queue = Arc::new(LineChannel::new());
    serial_link::spawn_reader(UartRx(uart_rx), Arc::clone(&queue))?;
    let mut link = SerialLink::new(UartTx(uart_tx), queue);

    // ── 5. Controller ─────────────────────────────────────────
    let mut hw = HardwareAdapter::new(rtc, switch, motor, led);
    hw.all_off();

    let mut sink = LogEventSink::new();
    let mut controller = DoorController::new(config.clone(), DEFAULT_SCHEDULE.clone());
    controller.start(&mut sink);

    let watchdog = Watchdog::new(Watchdog::timeout_for(config.tick_interval_ms));
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        controller.tick(&mut hw, &mut link, &mut sink);
        watchdog.feed();
        std::thread::sleep(tick);
    }
}
