//! Weather icon resources
//!
//! The watch face keeps exactly one icon bitmap in memory. Icon codes
//! from the phone are mapped to resource ids through a fixed table.

pub mod manager;
pub mod table;

pub use manager::{IconResourceManager, IconState};
pub use table::{
    icon_for_code, icon_name, RESOURCE_ID_IMAGE_CLOUD, RESOURCE_ID_IMAGE_RAIN,
    RESOURCE_ID_IMAGE_SNOW, RESOURCE_ID_IMAGE_SUN, WEATHER_ICONS,
};
