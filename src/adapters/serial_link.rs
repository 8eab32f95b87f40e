//! Serial command link.
//!
//! A reader thread pulls bytes from the receive half of the UART, frames
//! them into lines with a [`LineDecoder`] and pushes complete lines into
//! a bounded channel.  The control loop owns the [`SerialLink`], which
//! implements [`CommandPort`]: it drains the channel without blocking
//! and writes replies on the transmit half.
//!
//! ```text
//!  UART RX ──▶ reader thread ──▶ LineChannel ──try_receive──▶ SerialLink ──▶ controller
//!  UART TX ◀──────────────────────────────────────────────── reply() ◀──────┘
//! ```
//!
//! A full channel drops the line with a warning.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::ports::CommandPort;
use crate::command::codec::{CommandLine, LineDecoder};
use crate::command::transport::Transport;
use crate::drivers::task::spawn_task;

/// Lines buffered between the reader thread and the control loop.
pub const LINE_QUEUE_DEPTH: usize = 8;

/// Channel carrying complete command lines.
pub type LineChannel = Channel<CriticalSectionRawMutex, CommandLine, LINE_QUEUE_DEPTH>;

const READ_CHUNK: usize = 32;
const IDLE_BACKOFF: Duration = Duration::from_millis(10);
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

const READER_PRIORITY: u8 = 4;
const READER_STACK_KB: usize = 3;

/// Read one chunk from `rx` and queue every completed line.
/// Returns the number of bytes read.
pub fn pump<R: Transport>(
    rx: &mut R,
    decoder: &mut LineDecoder,
    queue: &LineChannel,
) -> Result<usize, R::Error> {
    let mut buf = [0u8; READ_CHUNK];
    let n = rx.read(&mut buf)?;
    decoder.feed(&buf[..n], |line| {
        if queue.try_send(line).is_err() {
            warn!("Command queue full, dropping line");
        }
    });
    Ok(n)
}

/// Spawn the reader thread on the receive half of a transport.
pub fn spawn_reader<R>(mut rx: R, queue: Arc<LineChannel>) -> std::io::Result<JoinHandle<()>>
where
    R: Transport + Send + 'static,
{
    spawn_task(READER_PRIORITY, READER_STACK_KB, "serial_rx\0", move || {
        let mut decoder = LineDecoder::new();
        loop {
            match pump(&mut rx, &mut decoder, &queue) {
                Ok(0) => std::thread::sleep(IDLE_BACKOFF),
                Ok(_) => {}
                Err(e) => {
                    warn!("Serial read failed: {:?}", e);
                    decoder.reset();
                    std::thread::sleep(ERROR_BACKOFF);
                }
            }
        }
    })
}

/// Control-loop side of the link.
pub struct SerialLink<W: Transport> {
    tx: W,
    queue: Arc<LineChannel>,
}

impl<W: Transport> SerialLink<W> {
    pub fn new(tx: W, queue: Arc<LineChannel>) -> Self {
        Self { tx, queue }
    }
}

impl<W: Transport> CommandPort for SerialLink<W> {
    fn poll_line(&mut self) -> Option<CommandLine> {
        self.queue.try_receive().ok()
    }

    fn reply(&mut self, line: &[u8]) {
        if let Err(e) = self.tx.write_all(line) {
            warn!("Serial reply failed: {:?}", e);
        }
    }
}

// ── ESP-IDF UART halves ───────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use uart::{UartRx, UartTx};

#[cfg(target_os = "espidf")]
mod uart {
    use esp_idf_hal::delay::{BLOCK, TickType};
    use esp_idf_hal::sys::EspError;
    use esp_idf_hal::uart::{UartRxDriver, UartTxDriver};

    use crate::command::transport::Transport;

    const READ_TIMEOUT_MS: u64 = 100;

    /// Receive half.  Writes are not supported and report zero bytes.
    pub struct UartRx(pub UartRxDriver<'static>);

    impl Transport for UartRx {
        type Error = EspError;

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
            self.0
                .read(buf, TickType::new_millis(READ_TIMEOUT_MS).into())
        }

        fn write(&mut self, _data: &[u8]) -> Result<usize, EspError> {
            Ok(0)
        }

        fn flush(&mut self) -> Result<(), EspError> {
            Ok(())
        }
    }

    /// Transmit half.  Reads always return zero bytes.
    pub struct UartTx(pub UartTxDriver<'static>);

    impl Transport for UartTx {
        type Error = EspError;

        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, EspError> {
            Ok(0)
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
            self.0.write(data)
        }

        fn flush(&mut self) -> Result<(), EspError> {
            self.0.wait_done(BLOCK)
        }
    }
}
