//! Sprite sheet sources
//!
//! Either a 24-bit BMP loaded through SDL or a procedurally generated
//! rainbow sheet. Both come back in the screen format, colorkey not yet set.

use crate::display::{PixelBuffer, PixelFormat};
use crate::geometry::Rect;
use crate::session::COLORKEY;
use crate::util::hsv_to_rgb;
use sdl2::pixels::PixelFormatEnum;
use sdl2::surface::Surface;
use std::path::Path;

/// Cell size of the generated sheet
pub const BUILTIN_FRAME_SIZE: u32 = 64;

/// Load a BMP and convert it to `format`
pub fn load_sheet(path: impl AsRef<Path>, format: PixelFormat) -> Result<PixelBuffer, String> {
    let path = path.as_ref();
    let surface = Surface::load_bmp(path)
        .map_err(|e| format!("Failed to load sprite sheet {}: {}", path.display(), e))?;
    let surface = surface
        .convert_format(PixelFormatEnum::RGB24)
        .map_err(|e| format!("Failed to convert {}: {}", path.display(), e))?;

    let (width, height, pitch) = (surface.width(), surface.height(), surface.pitch() as usize);
    let rgb = surface.with_lock(|pixels| {
        PixelBuffer::from_raw(width, height, PixelFormat::Rgb24, pitch, pixels)
    })?;
    log::debug!("Loaded {} ({}x{})", path.display(), width, height);

    rgb.convert(format)
}

/// Generate a `cols` x `rows` sheet of `frame_w` x `frame_h` cells.
/// Each cell holds a disc filled with a diagonal rainbow on the key
/// background; the hue phase advances one full cycle across the frames.
pub fn generate_sheet(
    cols: u32,
    rows: u32,
    frame_w: u32,
    frame_h: u32,
    format: PixelFormat,
) -> Result<PixelBuffer, String> {
    if cols == 0 || rows == 0 || frame_w == 0 || frame_h == 0 {
        return Err(format!(
            "Invalid generated sheet {}x{} cells of {}x{}",
            cols, rows, frame_w, frame_h
        ));
    }
    let mut sheet = PixelBuffer::try_with_size(cols * frame_w, rows * frame_h, format)?;
    let (kr, kg, kb) = COLORKEY;
    sheet.clear(format.map_rgb(kr, kg, kb));

    let frames = (cols * rows) as f32;
    let (fw, fh) = (frame_w as i32, frame_h as i32);
    let cx = (fw - 1) as f32 * 0.5;
    let cy = (fh - 1) as f32 * 0.5;
    let radius = (fw.min(fh) as f32 * 0.5 - 0.5).max(0.5);
    let diagonal = (fw + fh).max(1) as f32;

    for row in 0..rows as i32 {
        for col in 0..cols as i32 {
            let cell = Rect::new(col * fw, row * fh, fw, fh);
            let phase = (row * cols as i32 + col) as f32 * 360.0 / frames;
            for y in 0..fh {
                for x in 0..fw {
                    let (dx, dy) = (x as f32 - cx, y as f32 - cy);
                    if dx * dx + dy * dy > radius * radius {
                        continue;
                    }
                    let hue = phase + (x + y) as f32 * 360.0 / diagonal;
                    let (r, g, b) = hsv_to_rgb(hue, 1.0, 1.0);
                    sheet.set_rgb(cell.x + x, cell.y + y, r, g, b);
                }
            }
        }
    }

    Ok(sheet)
}
