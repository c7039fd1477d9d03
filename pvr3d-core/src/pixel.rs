/// 16-bit texel formats and RGB888 conversion
use std::fmt;
use std::str::FromStr;

use crate::color::Color;

pub const BYTES_PER_TEXEL: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 5-6-5 opaque color
    #[default]
    Rgb565,
    /// 1-bit alpha, 5-5-5 color
    Argb1555,
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Rgb565 => f.write_str("rgb565"),
            PixelFormat::Argb1555 => f.write_str("argb1555"),
        }
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb565" | "565" => Ok(PixelFormat::Rgb565),
            "argb1555" | "1555" => Ok(PixelFormat::Argb1555),
            other => Err(format!("unknown pixel format '{}'", other)),
        }
    }
}

fn quantize(channel: u8, max: u16) -> u16 {
    (channel as u32 * max as u32 / 255) as u16
}

fn expand(value: u16, max: u16) -> u8 {
    (value as u32 * 255 / max as u32) as u8
}

/// Encode one RGB888 pixel. ARGB1555 treats pure black as transparent.
pub fn encode(r: u8, g: u8, b: u8, format: PixelFormat) -> u16 {
    match format {
        PixelFormat::Rgb565 => quantize(r, 31) << 11 | quantize(g, 63) << 5 | quantize(b, 31),
        PixelFormat::Argb1555 => {
            let alpha = u16::from(r != 0 || g != 0 || b != 0);
            alpha << 15 | quantize(r, 31) << 10 | quantize(g, 31) << 5 | quantize(b, 31)
        }
    }
}

pub fn decode(texel: u16, format: PixelFormat) -> Color {
    match format {
        PixelFormat::Rgb565 => Color::rgb(
            expand(texel >> 11 & 0x1F, 31),
            expand(texel >> 5 & 0x3F, 63),
            expand(texel & 0x1F, 31),
        ),
        PixelFormat::Argb1555 => Color::new(
            expand(texel >> 10 & 0x1F, 31),
            expand(texel >> 5 & 0x1F, 31),
            expand(texel & 0x1F, 31),
            if texel & 0x8000 != 0 { 255 } else { 0 },
        ),
    }
}

/// Convert packed RGB888 data into little-endian 16-bit texels.
/// A trailing partial pixel is dropped.
pub fn encode_rgb888(data: &[u8], format: PixelFormat) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 3 * BYTES_PER_TEXEL);
    for rgb in data.chunks_exact(3) {
        out.extend_from_slice(&encode(rgb[0], rgb[1], rgb[2], format).to_le_bytes());
    }
    out
}
