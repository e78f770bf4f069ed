//! Icon code to resource id table
//!
//! The order of `WEATHER_ICONS` is part of the phone contract: icon code
//! `n` from the phone selects `WEATHER_ICONS[n]`.

use crate::traits::ResourceId;

pub const RESOURCE_ID_IMAGE_SUN: ResourceId = ResourceId(1);
pub const RESOURCE_ID_IMAGE_CLOUD: ResourceId = ResourceId(2);
pub const RESOURCE_ID_IMAGE_RAIN: ResourceId = ResourceId(3);
pub const RESOURCE_ID_IMAGE_SNOW: ResourceId = ResourceId(4);

/// Icons indexed by the code the phone sends
pub const WEATHER_ICONS: [ResourceId; 4] = [
    RESOURCE_ID_IMAGE_SUN,
    RESOURCE_ID_IMAGE_CLOUD,
    RESOURCE_ID_IMAGE_RAIN,
    RESOURCE_ID_IMAGE_SNOW,
];

/// Resource for an icon code, or `None` if the code is out of range
pub fn icon_for_code(code: u8) -> Option<ResourceId> {
    WEATHER_ICONS.get(code as usize).copied()
}

/// Human-readable icon name for logs
pub fn icon_name(id: ResourceId) -> &'static str {
    match id {
        RESOURCE_ID_IMAGE_SUN => "sun",
        RESOURCE_ID_IMAGE_CLOUD => "cloud",
        RESOURCE_ID_IMAGE_RAIN => "rain",
        RESOURCE_ID_IMAGE_SNOW => "snow",
        ResourceId::NONE => "none",
        _ => "unknown",
    }
}
