//! Colorkeyed scaling blits
//!
//! Dispatch order:
//! - RGB565 -> RGB565 at 0.5x, 2x, 3x, 4x: integer fast loops
//! - 1x: unscaled colorkey copy
//! - anything else: generic nearest-neighbor for any scale and format pair
//!
//! Keyed source pixels never touch the destination, so the caller clears the
//! destination region beforehand.

use crate::display::{PixelBuffer, PixelFormat};
use crate::geometry::Rect;

/// Which loop a blit runs through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitPath {
    /// Integer replication by the given factor
    FastUpscale(i32),
    /// Every other row and column
    FastHalf,
    Unscaled,
    Generic,
}

/// Capability check: both sides 16-bit and an exact fast scale
pub fn select_path(src: PixelFormat, dst: PixelFormat, scale: f32) -> BlitPath {
    if src.is_fast_path() && dst.is_fast_path() {
        if scale == 2.0 {
            return BlitPath::FastUpscale(2);
        } else if scale == 3.0 {
            return BlitPath::FastUpscale(3);
        } else if scale == 4.0 {
            return BlitPath::FastUpscale(4);
        } else if scale == 0.5 {
            return BlitPath::FastHalf;
        }
    }
    if scale == 1.0 {
        BlitPath::Unscaled
    } else {
        BlitPath::Generic
    }
}

/// Destination length for a source length at `scale`, rounded to nearest.
/// Matches the fast loops exactly: `len * k` for upscales, `ceil(len / 2)` at 0.5.
#[inline]
pub fn scaled_extent(len: i32, scale: f32) -> i32 {
    (len as f32 * scale + 0.5) as i32
}

/// Destination rectangle at (x, y) for a source rectangle drawn at `scale`
pub fn dest_rect(x: i32, y: i32, src_rect: Rect, scale: f32) -> Rect {
    Rect::new(
        x,
        y,
        scaled_extent(src_rect.w, scale),
        scaled_extent(src_rect.h, scale),
    )
}

/// Copy `src_rect` of `src` into `dst_rect` of `dst` at `scale`, skipping
/// pixels equal to `key`. Writes are clipped to `dst_rect` and the
/// destination bounds. Returns false when nothing sensible can be drawn
/// (empty or out-of-bounds source, non-positive scale).
pub fn blit_scaled(
    src: &PixelBuffer,
    src_rect: Rect,
    dst: &mut PixelBuffer,
    dst_rect: Rect,
    key: Option<u32>,
    scale: f32,
) -> bool {
    if !(scale.is_finite() && scale > 0.0) {
        return false;
    }
    if src_rect.is_empty() || src.bounds().intersect(&src_rect) != Some(src_rect) {
        return false;
    }
    let Some(clip) = dst_rect.clip_to(dst.width(), dst.height()) else {
        // Entirely off-screen: nothing to write, nothing failed
        return true;
    };

    match select_path(src.format(), dst.format(), scale) {
        BlitPath::FastUpscale(k) => upscale_rgb565(src, src_rect, dst, dst_rect, clip, key, k),
        BlitPath::FastHalf => half_rgb565(src, src_rect, dst, dst_rect, clip, key),
        BlitPath::Unscaled => copy_unscaled(src, src_rect, dst, dst_rect, clip, key),
        BlitPath::Generic => scale_nearest(src, src_rect, dst, dst_rect, clip, key),
    }
    true
}

#[inline]
fn read_565(row: &[u8], x: i32) -> u16 {
    let i = x as usize * 2;
    u16::from_ne_bytes([row[i], row[i + 1]])
}

#[inline]
fn write_565(row: &mut [u8], x: i32, pix: u16) {
    let i = x as usize * 2;
    row[i..i + 2].copy_from_slice(&pix.to_ne_bytes());
}

/// Integer upscale: each source pixel becomes a k x k block
fn upscale_rgb565(
    src: &PixelBuffer,
    sr: Rect,
    dst: &mut PixelBuffer,
    dr: Rect,
    clip: Rect,
    key: Option<u32>,
    k: i32,
) {
    let key = key.map(|v| v as u16);
    for sy in 0..sr.h {
        let src_row = src.row((sr.y + sy) as u32);
        for vy in 0..k {
            let dy = dr.y + sy * k + vy;
            if dy < clip.y {
                continue;
            }
            if dy >= clip.bottom() {
                return;
            }
            let dst_row = dst.row_mut(dy as u32);
            let mut dx = dr.x;
            for sx in 0..sr.w {
                if dx >= clip.right() {
                    break;
                }
                let pix = read_565(src_row, sr.x + sx);
                if key != Some(pix) {
                    // Replicate horizontally, trimmed to the clip
                    for x in dx.max(clip.x)..(dx + k).min(clip.right()) {
                        write_565(dst_row, x, pix);
                    }
                }
                dx += k;
            }
        }
    }
}

/// Downscale by 2: nearest sample of every other pixel, no averaging
fn half_rgb565(
    src: &PixelBuffer,
    sr: Rect,
    dst: &mut PixelBuffer,
    dr: Rect,
    clip: Rect,
    key: Option<u32>,
) {
    let key = key.map(|v| v as u16);
    for sy in (0..sr.h).step_by(2) {
        let dy = dr.y + (sy >> 1);
        if dy < clip.y {
            continue;
        }
        if dy >= clip.bottom() {
            return;
        }
        let src_row = src.row((sr.y + sy) as u32);
        let dst_row = dst.row_mut(dy as u32);
        let mut dx = dr.x;
        for sx in (0..sr.w).step_by(2) {
            if dx >= clip.right() {
                break;
            }
            let pix = read_565(src_row, sr.x + sx);
            if dx >= clip.x && key != Some(pix) {
                write_565(dst_row, dx, pix);
            }
            dx += 1;
        }
    }
}

/// 1:1 copy with colorkey, converting formats when they differ
fn copy_unscaled(
    src: &PixelBuffer,
    sr: Rect,
    dst: &mut PixelBuffer,
    dr: Rect,
    clip: Rect,
    key: Option<u32>,
) {
    let src_fmt = src.format();
    let dst_fmt = dst.format();
    let sbpp = src_fmt.bytes_per_pixel();
    let dbpp = dst_fmt.bytes_per_pixel();

    let y0 = clip.y.max(dr.y);
    let y1 = clip.bottom().min(dr.y + sr.h);
    let x0 = clip.x.max(dr.x);
    let x1 = clip.right().min(dr.x + sr.w);

    for dy in y0..y1 {
        let src_row = src.row((sr.y + dy - dr.y) as u32);
        let dst_row = dst.row_mut(dy as u32);
        for dx in x0..x1 {
            let si = (sr.x + dx - dr.x) as usize * sbpp;
            let pix = src_fmt.read(&src_row[si..]);
            if key == Some(pix) {
                continue;
            }
            let di = dx as usize * dbpp;
            dst_fmt.write(&mut dst_row[di..], dst_fmt.convert_from(src_fmt, pix));
        }
    }
}

/// Generic nearest-neighbor: every destination pixel in the clip picks the
/// source pixel at `dx * src_w / dst_w`
fn scale_nearest(
    src: &PixelBuffer,
    sr: Rect,
    dst: &mut PixelBuffer,
    dr: Rect,
    clip: Rect,
    key: Option<u32>,
) {
    if dr.is_empty() {
        return;
    }
    let src_fmt = src.format();
    let dst_fmt = dst.format();
    let sbpp = src_fmt.bytes_per_pixel();
    let dbpp = dst_fmt.bytes_per_pixel();

    for dy in clip.y..clip.bottom() {
        let sy = sr.y + ((dy - dr.y) as i64 * sr.h as i64 / dr.h as i64) as i32;
        let src_row = src.row(sy as u32);
        let dst_row = dst.row_mut(dy as u32);
        for dx in clip.x..clip.right() {
            let sx = sr.x + ((dx - dr.x) as i64 * sr.w as i64 / dr.w as i64) as i32;
            let pix = src_fmt.read(&src_row[sx as usize * sbpp..]);
            if key == Some(pix) {
                continue;
            }
            let di = dx as usize * dbpp;
            dst_fmt.write(&mut dst_row[di..], dst_fmt.convert_from(src_fmt, pix));
        }
    }
}
