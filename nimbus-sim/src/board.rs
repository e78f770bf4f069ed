//! Simulated watch hardware
//!
//! Stand-ins for the peripherals the drivers expect: the link stream, the
//! vibration motor pin, the screen and the packed icon resources.

use core::convert::Infallible;

use embassy_sync::pipe::TryReadError;
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use log::*;
use nimbus_core::icon::icon_name;
use nimbus_core::traits::WeatherDisplay;
use nimbus_drivers::heap_bitmap::BITMAP_HEADER_SIZE;
use nimbus_drivers::{solid_bitmap, HeapBitmap};

use crate::channels::{LinkPipe, PHONE_TO_WATCH, WATCH_TO_PHONE};

/// Watch end of the phone link
pub struct PipeStream {
    rx: &'static LinkPipe,
    tx: &'static LinkPipe,
}

impl PipeStream {
    pub const fn new(rx: &'static LinkPipe, tx: &'static LinkPipe) -> Self {
        Self { rx, tx }
    }

    pub fn watch_side() -> Self {
        Self::new(&PHONE_TO_WATCH, &WATCH_TO_PHONE)
    }
}

impl ErrorType for PipeStream {
    type Error = ErrorKind;
}

impl Read for PipeStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
        match self.rx.try_read(buf) {
            Ok(n) => Ok(n),
            Err(TryReadError::Empty) => Ok(0),
        }
    }
}

impl ReadReady for PipeStream {
    fn read_ready(&mut self) -> Result<bool, ErrorKind> {
        Ok(!self.rx.is_empty())
    }
}

impl Write for PipeStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        if buf.is_empty() {
            return Ok(0);
        }
        // Phone not draining; treat like a full UART FIFO. Partial writes
        // would leave half a frame in the pipe.
        if self.tx.free_capacity() < buf.len() {
            return Err(ErrorKind::OutOfMemory);
        }
        self.tx.try_write(buf).map_err(|_| ErrorKind::OutOfMemory)
    }

    fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

/// Output pin that logs its level
pub struct LogPin {
    name: &'static str,
}

impl LogPin {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl embedded_hal::digital::ErrorType for LogPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for LogPin {
    fn set_high(&mut self) -> Result<(), Infallible> {
        trace!("{} on", self.name);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        trace!("{} off", self.name);
        Ok(())
    }
}

/// Delay for the vibe motor that logs instead of waiting
///
/// A real delay would block the single-threaded executor for the whole
/// pattern and stall the phone and tick tasks.
pub struct LogDelay;

impl embedded_hal::delay::DelayNs for LogDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        trace!("vibe segment {} ms", ms);
    }
}

/// Screen that prints the watch face to the log
#[derive(Default)]
pub struct ConsoleDisplay {
    icon: &'static str,
    temperature: String,
    time: String,
}

impl ConsoleDisplay {
    fn render(&self) {
        info!(
            "| {:^6} | {:>6} | {:>8} |",
            self.icon, self.temperature, self.time
        );
    }
}

impl WeatherDisplay<HeapBitmap> for ConsoleDisplay {
    fn show_icon(&mut self, bitmap: Option<&HeapBitmap>) {
        self.icon = bitmap.map_or("", |b| icon_name(b.id()));
        self.render();
    }

    fn show_temperature(&mut self, text: &str) {
        self.temperature = text.to_owned();
        self.render();
    }

    fn show_time(&mut self, text: &str) {
        self.time = text.to_owned();
        self.render();
    }
}

/// Icon edge length in pixels
const ICON_SIZE: u16 = 80;

const ICON_BLOB_LEN: usize = BITMAP_HEADER_SIZE + (ICON_SIZE as usize / 8) * ICON_SIZE as usize;

static SUN: [u8; ICON_BLOB_LEN] = solid_bitmap(ICON_SIZE, ICON_SIZE, 0xFF);
static CLOUD: [u8; ICON_BLOB_LEN] = solid_bitmap(ICON_SIZE, ICON_SIZE, 0xAA);
static RAIN: [u8; ICON_BLOB_LEN] = solid_bitmap(ICON_SIZE, ICON_SIZE, 0x55);
static SNOW: [u8; ICON_BLOB_LEN] = solid_bitmap(ICON_SIZE, ICON_SIZE, 0x11);

/// Packed icons, resource ids 1-4
pub static ICON_PACK: [&[u8]; 4] = [&SUN, &CLOUD, &RAIN, &SNOW];
