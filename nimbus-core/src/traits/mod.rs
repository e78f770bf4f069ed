//! Collaborator traits
//!
//! These traits define the interface between the watch-face logic and
//! the things around it: the phone link, the vibration motor, the screen
//! and the resource store.

pub mod display;
pub mod feedback;
pub mod resources;
pub mod transport;

pub use display::WeatherDisplay;
pub use feedback::{Feedback, VibePattern};
pub use resources::{AllocError, ResourceId, ResourceLoader};
pub use transport::{Transport, TransportError};
