//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter           | Implements          | Connects to                 |
//! |-------------------|---------------------|-----------------------------|
//! | `hardware`        | ClockPort           | DS3231 RTC (I²C)            |
//! |                   | DoorSwitchPort      | Door switch GPIO            |
//! |                   | MotorPort           | Stepper worker thread       |
//! |                   | IndicatorPort       | Status LED blinker thread   |
//! | `serial_link`     | CommandPort         | UART1 reader thread         |
//! | `log_sink`        | EventSink           | Serial log output           |
//! | `embedded_config` | ConfigPort          | `COOP_CONFIG_JSON` at build |

pub mod embedded_config;
pub mod hardware;
pub mod log_sink;
pub mod serial_link;
