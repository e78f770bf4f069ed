//! Nimbus - Weather Watch Face Simulator
//!
//! Runs the watch face on the host together with a simulated phone.
//! The two talk AppMessage frames over in-process pipes, exactly as the
//! watch would over its serial link.
//!
//! Usage: `nimbus-sim [config.toml]`. Set `RUST_LOG=debug` (or `trace`)
//! for more detail.

use std::path::PathBuf;

use embassy_executor::Spawner;
use log::*;
use static_cell::StaticCell;

mod board;
mod channels;
mod config;
mod tasks;

use crate::config::SimConfig;

// Configuration must live forever for task references
static CONFIG: StaticCell<SimConfig> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Nimbus simulator starting...");

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match config::load(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:?}", e);
            std::process::exit(2);
        }
    };
    let config: &'static SimConfig = CONFIG.init(config);
    info!("Configuration loaded");

    spawner
        .spawn(tasks::tick_task(
            config.clock.minute_ms,
            config.clock.start_minute,
        ))
        .unwrap();
    spawner.spawn(tasks::phone_task(config.phone)).unwrap();
    spawner
        .spawn(tasks::controller_task(&config.watchface))
        .unwrap();

    info!("All tasks spawned");
}
