//! Minute tick task
//!
//! Stands in for the watch's minute timer. A simulated minute lasts
//! `minute_ms` real milliseconds.

use embassy_time::{Duration, Ticker};
use log::*;

use crate::channels::MINUTE_TICK;

/// Tick task - signals the controller once per simulated minute
#[embassy_executor::task]
pub async fn tick_task(minute_ms: u64, start_minute: u64) {
    info!("Tick task started: 1 min = {} ms", minute_ms);

    let mut ticker = Ticker::every(Duration::from_millis(minute_ms));
    let mut minute = start_minute;

    loop {
        // First tick goes out immediately so the time is drawn at startup
        MINUTE_TICK.signal(minute);
        ticker.next().await;
        minute += 1;
    }
}
