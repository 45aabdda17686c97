use super::format::PixelFormat;
use crate::geometry::Rect;

// ============================================================================
// Utility Functions
// ============================================================================

/// Row stride in bytes, padded to 4-byte alignment like SDL surfaces
#[inline]
fn aligned_pitch(width: u32, format: PixelFormat) -> usize {
    (width as usize * format.bytes_per_pixel() + 3) & !3
}

/// Allocate a zeroed pixel store, reporting allocation failure instead of aborting
fn try_alloc(len: usize) -> Result<Vec<u8>, String> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|e| format!("Failed to allocate {} bytes: {}", len, e))?;
    pixels.resize(len, 0);
    Ok(pixels)
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// Packed pixel buffer in a specific `PixelFormat`
/// Used both for the screen framebuffer and for the sprite sheet variants
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    colorkey: Option<u32>,
}

impl PixelBuffer {
    /// Create a zeroed buffer
    pub fn with_size(width: u32, height: u32, format: PixelFormat) -> Self {
        let pitch = aligned_pitch(width, format);
        Self {
            pixels: vec![0; pitch * height as usize],
            width,
            height,
            pitch,
            format,
            colorkey: None,
        }
    }

    /// Create a zeroed buffer, returning an error if the allocation fails
    pub fn try_with_size(width: u32, height: u32, format: PixelFormat) -> Result<Self, String> {
        let pitch = aligned_pitch(width, format);
        let pixels = try_alloc(pitch * height as usize)?;
        Ok(Self {
            pixels,
            width,
            height,
            pitch,
            format,
            colorkey: None,
        })
    }

    /// Copy pixels out of a foreign buffer with an arbitrary row pitch
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        pitch: usize,
        data: &[u8],
    ) -> Result<Self, String> {
        let row_bytes = width as usize * format.bytes_per_pixel();
        if pitch < row_bytes || data.len() < pitch * height.saturating_sub(1) as usize + row_bytes
        {
            return Err(format!(
                "Pixel data too small for {}x{} {} (pitch {}, {} bytes)",
                width,
                height,
                format.name(),
                pitch,
                data.len()
            ));
        }
        let mut buffer = Self::try_with_size(width, height, format)?;
        for y in 0..height as usize {
            let src = &data[y * pitch..y * pitch + row_bytes];
            buffer.row_mut(y as u32)[..row_bytes].copy_from_slice(src);
        }
        Ok(buffer)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, including padding
    #[inline]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Whole-buffer rectangle
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    // ========================================================================
    // Colorkey
    // ========================================================================

    /// Native value treated as transparent, if any
    #[inline]
    pub fn colorkey(&self) -> Option<u32> {
        self.colorkey
    }

    /// Map an RGB triple into this buffer's format and use it as the colorkey
    pub fn set_colorkey_rgb(&mut self, rgb: (u8, u8, u8)) {
        self.colorkey = Some(self.format.map_rgb(rgb.0, rgb.1, rgb.2));
    }

    // ========================================================================
    // Pixel Access
    // ========================================================================

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Byte offset of pixel (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.pitch + x as usize * self.format.bytes_per_pixel()
    }

    /// Read a native pixel value (bounds checked)
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some(self.format.read(&self.pixels[idx..]))
        } else {
            None
        }
    }

    /// Read a pixel as 8-bit RGB (bounds checked)
    #[cfg(test)]
    pub fn get_rgb(&self, x: i32, y: i32) -> Option<(u8, u8, u8)> {
        self.get_pixel(x, y).map(|v| self.format.unmap_rgb(v))
    }

    /// Write a native pixel value (bounds checked)
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, value: u32) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            self.format.write(&mut self.pixels[idx..], value);
        }
    }

    /// Write an RGB triple (bounds checked)
    pub fn set_rgb(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8) {
        let value = self.format.map_rgb(r, g, b);
        self.set_pixel(x, y, value);
    }

    /// One row of raw bytes, padding included
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.pitch;
        &self.pixels[start..start + self.pitch]
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.pitch;
        &mut self.pixels[start..start + self.pitch]
    }

    // ========================================================================
    // Fills
    // ========================================================================

    /// Fill a rectangle (clipped to the buffer) with a native value
    pub fn fill_rect(&mut self, rect: Rect, value: u32) {
        let Some(clip) = rect.clip_to(self.width, self.height) else {
            return;
        };
        let bpp = self.format.bytes_per_pixel();
        let format = self.format;
        let x0 = clip.x as usize * bpp;
        let x1 = clip.right() as usize * bpp;
        for y in clip.y..clip.bottom() {
            let row = self.row_mut(y as u32);
            for px in row[x0..x1].chunks_exact_mut(bpp) {
                format.write(px, value);
            }
        }
    }

    /// Fill the whole buffer with a native value
    pub fn clear(&mut self, value: u32) {
        self.fill_rect(self.bounds(), value);
    }

    // ========================================================================
    // Conversion and Rotation
    // ========================================================================

    /// Re-encode into another format. The colorkey is not carried over since
    /// its native value changes; callers reapply it after conversion.
    pub fn convert(&self, format: PixelFormat) -> Result<Self, String> {
        let mut out = Self::try_with_size(self.width, self.height, format)?;
        let src_bpp = self.format.bytes_per_pixel();
        let dst_bpp = format.bytes_per_pixel();
        for y in 0..self.height {
            let src_row = self.row(y);
            let dst_row = out.row_mut(y);
            for x in 0..self.width as usize {
                let value = self.format.read(&src_row[x * src_bpp..]);
                format.write(
                    &mut dst_row[x * dst_bpp..],
                    format.convert_from(self.format, value),
                );
            }
        }
        Ok(out)
    }

    /// Create a new buffer rotated by 90 degrees clockwise.
    /// Output dimensions are swapped; source (x, y) lands at (height - 1 - y, x).
    /// The colorkey is left unset for the caller to reapply.
    pub fn rotated_quarter_cw(&self) -> Result<Self, String> {
        let new_width = self.height;
        let new_height = self.width;
        let mut rotated = Self::try_with_size(new_width, new_height, self.format)?;
        let bpp = self.format.bytes_per_pixel();

        for y in 0..self.height {
            let src_row = self.row(y);
            let new_x = (self.height - 1 - y) as usize * bpp;
            for x in 0..self.width {
                let src_idx = x as usize * bpp;
                let dst_idx = x as usize * rotated.pitch + new_x;
                rotated.pixels[dst_idx..dst_idx + bpp]
                    .copy_from_slice(&src_row[src_idx..src_idx + bpp]);
            }
        }

        Ok(rotated)
    }

    /// Raw bytes for SDL texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// True when both buffers hold the same visible pixels (padding ignored)
    #[cfg(test)]
    pub fn same_pixels(&self, other: &PixelBuffer) -> bool {
        if self.width != other.width || self.height != other.height || self.format != other.format
        {
            return false;
        }
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        (0..self.height).all(|y| self.row(y)[..row_bytes] == other.row(y)[..row_bytes])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbered(width: u32, height: u32, format: PixelFormat) -> PixelBuffer {
        let mut buf = PixelBuffer::with_size(width, height, format);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                buf.set_pixel(x, y, (y * width as i32 + x) as u32 & 0xFFFF);
            }
        }
        buf
    }

    #[test]
    fn test_pitch_is_aligned() {
        let buf = PixelBuffer::with_size(3, 2, PixelFormat::Rgb565);
        assert_eq!(buf.pitch(), 8);
        assert_eq!(buf.as_bytes().len(), 16);
        let buf = PixelBuffer::with_size(3, 2, PixelFormat::Argb8888);
        assert_eq!(buf.pitch(), 12);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut buf = PixelBuffer::with_size(4, 4, PixelFormat::Rgb565);
        buf.set_pixel(-1, 0, 7);
        buf.set_pixel(4, 0, 7);
        assert_eq!(buf.get_pixel(4, 0), None);
        assert_eq!(buf.get_pixel(-1, 2), None);
        assert!(buf.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut buf = PixelBuffer::with_size(4, 4, PixelFormat::Rgb565);
        buf.fill_rect(Rect::new(2, 2, 10, 10), 0xABCD);
        assert_eq!(buf.get_pixel(3, 3), Some(0xABCD));
        assert_eq!(buf.get_pixel(2, 2), Some(0xABCD));
        assert_eq!(buf.get_pixel(1, 3), Some(0));
    }

    #[test]
    fn test_rotate_maps_corner() {
        // 3 wide, 2 tall: pixel (2, 0) -> (2 - 1 - 0, 2) = (1, 2)
        let buf = numbered(3, 2, PixelFormat::Rgb565);
        let rot = buf.rotated_quarter_cw().unwrap();
        assert_eq!((rot.width(), rot.height()), (2, 3));
        assert_eq!(rot.get_pixel(1, 2), buf.get_pixel(2, 0));
        assert_eq!(rot.get_pixel(0, 0), buf.get_pixel(0, 1));
    }

    #[test]
    fn test_rotate_drops_colorkey() {
        let mut buf = numbered(4, 2, PixelFormat::Rgb565);
        buf.set_colorkey_rgb((32, 32, 32));
        let rot = buf.rotated_quarter_cw().unwrap();
        assert_eq!(rot.colorkey(), None);
    }

    #[test]
    fn test_convert_24_to_565() {
        let mut src = PixelBuffer::with_size(2, 1, PixelFormat::Rgb24);
        src.set_rgb(0, 0, 32, 32, 32);
        src.set_rgb(1, 0, 255, 0, 0);
        let out = src.convert(PixelFormat::Rgb565).unwrap();
        assert_eq!(out.get_pixel(0, 0), Some(0x2104));
        assert_eq!(out.get_pixel(1, 0), Some(0xF800));
    }

    #[test]
    fn test_from_raw_respects_pitch() {
        // 2x2 RGB24 with 8-byte rows (2 bytes padding)
        let data = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
        let buf = PixelBuffer::from_raw(2, 2, PixelFormat::Rgb24, 8, &data).unwrap();
        assert_eq!(buf.get_rgb(1, 1), Some((10, 11, 12)));
        assert!(PixelBuffer::from_raw(2, 2, PixelFormat::Rgb24, 8, &data[..10]).is_err());
    }

    proptest! {
        #[test]
        fn prop_four_quarter_turns_identity(w in 1u32..24, h in 1u32..24, wide in any::<bool>()) {
            let format = if wide { PixelFormat::Argb8888 } else { PixelFormat::Rgb565 };
            let buf = numbered(w, h, format);
            let mut rot = buf.clone();
            for _ in 0..4 {
                rot = rot.rotated_quarter_cw().unwrap();
            }
            prop_assert_eq!((rot.width(), rot.height()), (w, h));
            prop_assert!(rot.same_pixels(&buf));
        }

        #[test]
        fn prop_quarter_turn_swaps_dims(w in 1u32..40, h in 1u32..40) {
            let rot = numbered(w, h, PixelFormat::Rgb565).rotated_quarter_cw().unwrap();
            prop_assert_eq!((rot.width(), rot.height()), (h, w));
        }
    }
}
