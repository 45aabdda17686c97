//! Pixel format adapter
//!
//! Describes the packed encodings a `PixelBuffer` can hold and maps RGB
//! triples to and from their native values. Only RGB565 is eligible for the
//! integer fast-path scaler; every other format routes to the generic path.

use sdl2::pixels::PixelFormatEnum;

/// Packed pixel encodings understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 16-bit 5:6:5, native-endian u16
    Rgb565,
    /// 24-bit R, G, B byte order (asset input only)
    Rgb24,
    /// 32-bit with unused top byte, native-endian u32
    Xrgb8888,
    /// 32-bit with opaque alpha in the top byte, native-endian u32
    Argb8888,
}

impl PixelFormat {
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb565 => 2,
            Self::Rgb24 => 3,
            Self::Xrgb8888 | Self::Argb8888 => 4,
        }
    }

    /// True for the 2-bytes-per-pixel packed format the fast scaler handles
    #[inline]
    pub fn is_fast_path(self) -> bool {
        self == Self::Rgb565
    }

    /// Map an RGB triple to this format's native pixel value.
    /// Channels are truncated to the format's bit depth, like `SDL_MapRGB`.
    #[inline]
    pub fn map_rgb(self, r: u8, g: u8, b: u8) -> u32 {
        match self {
            Self::Rgb565 => ((r as u32 >> 3) << 11) | ((g as u32 >> 2) << 5) | (b as u32 >> 3),
            Self::Rgb24 | Self::Xrgb8888 => ((r as u32) << 16) | ((g as u32) << 8) | b as u32,
            Self::Argb8888 => 0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32,
        }
    }

    /// Expand a native value back to 8-bit channels (bit replication for 565)
    #[inline]
    pub fn unmap_rgb(self, value: u32) -> (u8, u8, u8) {
        match self {
            Self::Rgb565 => {
                let r5 = (value >> 11) & 0x1F;
                let g6 = (value >> 5) & 0x3F;
                let b5 = value & 0x1F;
                (
                    ((r5 << 3) | (r5 >> 2)) as u8,
                    ((g6 << 2) | (g6 >> 4)) as u8,
                    ((b5 << 3) | (b5 >> 2)) as u8,
                )
            },
            Self::Rgb24 | Self::Xrgb8888 | Self::Argb8888 => {
                ((value >> 16) as u8, (value >> 8) as u8, value as u8)
            },
        }
    }

    /// Decode one pixel from its bytes
    #[inline]
    pub fn read(self, bytes: &[u8]) -> u32 {
        match self {
            Self::Rgb565 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u32,
            Self::Rgb24 => ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32,
            Self::Xrgb8888 | Self::Argb8888 => {
                u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            },
        }
    }

    /// Encode one pixel into its bytes
    #[inline]
    pub fn write(self, bytes: &mut [u8], value: u32) {
        match self {
            Self::Rgb565 => bytes[..2].copy_from_slice(&(value as u16).to_ne_bytes()),
            Self::Rgb24 => {
                bytes[0] = (value >> 16) as u8;
                bytes[1] = (value >> 8) as u8;
                bytes[2] = value as u8;
            },
            Self::Xrgb8888 | Self::Argb8888 => bytes[..4].copy_from_slice(&value.to_ne_bytes()),
        }
    }

    /// Re-encode a native value of `from` into this format
    #[inline]
    pub fn convert_from(self, from: PixelFormat, value: u32) -> u32 {
        if from == self {
            return value;
        }
        let (r, g, b) = from.unmap_rgb(value);
        self.map_rgb(r, g, b)
    }

    /// Translate an SDL format. Unknown formats yield None so callers fall
    /// back to a 32-bit buffer and the generic scaler.
    pub fn from_sdl(format: PixelFormatEnum) -> Option<Self> {
        match format {
            PixelFormatEnum::RGB565 => Some(Self::Rgb565),
            PixelFormatEnum::RGB24 => Some(Self::Rgb24),
            PixelFormatEnum::RGB888 => Some(Self::Xrgb8888),
            PixelFormatEnum::ARGB8888 => Some(Self::Argb8888),
            _ => None,
        }
    }

    pub fn to_sdl(self) -> PixelFormatEnum {
        match self {
            Self::Rgb565 => PixelFormatEnum::RGB565,
            Self::Rgb24 => PixelFormatEnum::RGB24,
            Self::Xrgb8888 => PixelFormatEnum::RGB888,
            Self::Argb8888 => PixelFormatEnum::ARGB8888,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rgb565 => "RGB565",
            Self::Rgb24 => "RGB24",
            Self::Xrgb8888 => "XRGB8888",
            Self::Argb8888 => "ARGB8888",
        }
    }
}
