//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the collaborator
//! traits defined in nimbus-core:
//!
//! - Vibration motor on a GPIO pin (`Feedback`)
//! - Framed phone link over a byte stream (`Transport`)
//! - Heap bitmap loader with a fixed budget (`ResourceLoader`)

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod heap_bitmap;
pub mod link;
pub mod vibe;

pub use heap_bitmap::{solid_bitmap, BitmapHeader, HeapBitmap, HeapBitmapLoader, BITMAP_BUFFER_BYTES};
pub use link::{AppMessageLink, LinkEvent};
pub use vibe::VibeMotor;
