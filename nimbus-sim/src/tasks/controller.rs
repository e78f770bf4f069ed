//! Main controller task
//!
//! Owns the watch-face state and feeds it minute ticks and link events.
//! A fatal error ends the process, the simulator's equivalent of the
//! watch restarting the app.

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};
use log::*;

use nimbus_core::traits::TransportError;
use nimbus_core::{FatalError, WallTime, WatchFaceConfig, WatchFaceState};
use nimbus_drivers::{AppMessageLink, HeapBitmapLoader, LinkEvent, VibeMotor};

use crate::board::{ConsoleDisplay, LogDelay, LogPin, PipeStream, ICON_PACK};
use crate::channels::MINUTE_TICK;

/// How often the link is checked for input
const LINK_POLL_MS: u64 = 20;

type Face = WatchFaceState<
    AppMessageLink<PipeStream>,
    HeapBitmapLoader,
    ConsoleDisplay,
    VibeMotor<LogPin, LogDelay>,
>;

/// Controller task - main coordination loop
#[embassy_executor::task]
pub async fn controller_task(config: &'static WatchFaceConfig) {
    info!("Controller task started");

    let link = AppMessageLink::from_config(PipeStream::watch_side(), config);
    let vibe = VibeMotor::new(LogPin::new("vibe"), LogDelay);
    let mut face: Face = match WatchFaceState::new(
        config,
        link,
        HeapBitmapLoader::new(&ICON_PACK),
        ConsoleDisplay::default(),
        vibe,
    ) {
        Ok(face) => face,
        Err(e) => fatal(e),
    };

    let mut poll = Ticker::every(Duration::from_millis(LINK_POLL_MS));

    loop {
        match select(MINUTE_TICK.wait(), poll.next()).await {
            Either::First(minute) => {
                face.on_minute_tick(WallTime::from_minutes(minute));
            }
            Either::Second(()) => {
                if let Err(e) = drain_link(&mut face) {
                    face.shutdown();
                    fatal(e);
                }
            }
        }
    }
}

/// Handle everything the link has buffered
fn drain_link(face: &mut Face) -> Result<(), FatalError> {
    loop {
        match face.transport_mut().poll() {
            Ok(Some(LinkEvent::Received(dictionary))) => {
                let changed = face.on_message_received(&dictionary)?;
                debug!("Update applied, {} keys changed", changed);
            }
            Ok(Some(LinkEvent::Delivered(txid))) => trace!("Push {} delivered", txid),
            Ok(Some(LinkEvent::Rejected(txid))) => {
                debug!("Push {} rejected", txid);
                face.on_send_failed(TransportError::Nacked);
            }
            Ok(None) => return Ok(()),
            Err(e) => {
                // Parser has resynchronised; pick up again on the next poll
                face.on_message_dropped(e);
                return Ok(());
            }
        }
    }
}

fn fatal(error: FatalError) -> ! {
    error!("Fatal error: {:?}", error);
    std::process::exit(1)
}
