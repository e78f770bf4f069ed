//! Board-agnostic core logic for the Nimbus weather watch face
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (transport, display, feedback, resource loader)
//! - Sync store: the dataset shared with the phone
//! - Icon resource manager
//! - Refresh scheduler
//! - Watch-face state and event handlers
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod app;
pub mod clock;
pub mod config;
pub mod icon;
pub mod scheduler;
pub mod sync;
pub mod traits;

pub use app::{FatalError, WatchFaceState, WeatherPresenter};
pub use clock::{format_time, WallTime};
pub use config::{ClockStyle, ConfigError, WatchFaceConfig};
pub use icon::{IconResourceManager, IconState};
pub use scheduler::{minute_of_hour, RefreshScheduler};
pub use sync::{SyncError, SyncObserver, SyncStore};
