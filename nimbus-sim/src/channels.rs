//! Inter-task communication channels
//!
//! The watch and the simulated phone talk over two byte pipes, one per
//! direction, standing in for the serial link. Minute ticks reach the
//! controller through a signal.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_sync::signal::Signal;

/// Bytes buffered per link direction
pub const LINK_PIPE_SIZE: usize = 512;

pub type LinkPipe = Pipe<CriticalSectionRawMutex, LINK_PIPE_SIZE>;

/// Frames from the watch to the phone
pub static WATCH_TO_PHONE: LinkPipe = Pipe::new();

/// Frames from the phone to the watch
pub static PHONE_TO_WATCH: LinkPipe = Pipe::new();

/// Minute tick, carrying minutes since midnight of day zero
pub static MINUTE_TICK: Signal<CriticalSectionRawMutex, u64> = Signal::new();
