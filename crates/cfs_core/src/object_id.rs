//! Object ids carried in a float colour channel.
//!
//! An id image stores each object's integer id bit-for-bit in the red
//! channel, so decoding is a reinterpretation, not a conversion.

use crate::property::Rgba;

pub type ObjectId = i32;

/// Pixels that show no object.
pub const BACKGROUND_ID: ObjectId = 0;

pub fn id_to_channel(id: ObjectId) -> f32 {
    f32::from_bits(id as u32)
}

pub fn channel_to_id(channel: f32) -> ObjectId {
    channel.to_bits() as ObjectId
}

pub fn id_to_color(id: ObjectId) -> Rgba {
    Rgba::new(id_to_channel(id), 0.0, 0.0, 1.0)
}

pub fn color_to_id(color: Rgba) -> ObjectId {
    channel_to_id(color.r)
}

/// Decodes a red-channel buffer into ids.
pub fn decode_channels(channels: &[f32]) -> Vec<ObjectId> {
    channels.iter().map(|c| channel_to_id(*c)).collect()
}
