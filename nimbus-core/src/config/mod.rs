//! Configuration types
//!
//! Board-agnostic watch-face settings. The defaults reproduce the shipped
//! watch face; hosts may override them from a config file.

pub mod types;

pub use types::*;
