//! Sprite sheet with precomputed quarter-turn variants
//!
//! The base sheet is rotated three times at startup so drawing never has to
//! rotate pixels at runtime. Frame lookup maps a logical frame index into the
//! grid of whichever variant is active.

use crate::display::PixelBuffer;
use crate::geometry::Rect;

/// How the base sheet is divided into animation frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteGrid {
    pub cols: u32,
    pub rows: u32,
    /// Nominal frame size in the base orientation (truncated division)
    pub frame_w: u32,
    pub frame_h: u32,
}

impl SpriteGrid {
    pub fn new(sheet_w: u32, sheet_h: u32, cols: u32, rows: u32) -> Result<Self, String> {
        if cols == 0 || rows == 0 {
            return Err(format!("Sprite grid must be non-empty, got {}x{}", cols, rows));
        }
        if sheet_w < cols || sheet_h < rows {
            return Err(format!(
                "Sheet {}x{} is too small for a {}x{} grid",
                sheet_w, sheet_h, cols, rows
            ));
        }
        Ok(Self {
            cols,
            rows,
            frame_w: sheet_w / cols,
            frame_h: sheet_h / rows,
        })
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    /// Grid as seen in a rotated variant: (cols, rows, frame_w, frame_h).
    /// Odd quarter turns swap both the counts and the frame dimensions.
    pub fn for_rotation(&self, rot: u8) -> (u32, u32, u32, u32) {
        if rot & 1 == 0 {
            (self.cols, self.rows, self.frame_w, self.frame_h)
        } else {
            (self.rows, self.cols, self.frame_h, self.frame_w)
        }
    }

    /// Map a base grid cell to its cell in the variant rotated `rot` quarter
    /// turns clockwise. Returns (row, col) in the rotated grid.
    pub fn map_cell(&self, rot: u8, row: u32, col: u32) -> (u32, u32) {
        let c = self.cols;
        let r = self.rows;
        match rot & 3 {
            0 => (row, col),
            1 => (col, r - 1 - row),
            2 => (r - 1 - row, c - 1 - col),
            _ => (c - 1 - col, row),
        }
    }
}

/// Base sheet plus its 90/180/270 degree clockwise variants, indexed by quarter turns
pub struct SpriteSheet {
    variants: [PixelBuffer; 4],
    grid: SpriteGrid,
}

impl SpriteSheet {
    /// Build all four orientations from a base buffer already in the screen
    /// format. The colorkey is mapped and applied to every variant.
    pub fn build(
        mut base: PixelBuffer,
        cols: u32,
        rows: u32,
        key: (u8, u8, u8),
    ) -> Result<Self, String> {
        let grid = SpriteGrid::new(base.width(), base.height(), cols, rows)?;
        base.set_colorkey_rgb(key);

        let mut rot90 = base
            .rotated_quarter_cw()
            .map_err(|e| format!("Rotating sheet to 90 degrees failed: {}", e))?;
        rot90.set_colorkey_rgb(key);
        let mut rot180 = rot90
            .rotated_quarter_cw()
            .map_err(|e| format!("Rotating sheet to 180 degrees failed: {}", e))?;
        rot180.set_colorkey_rgb(key);
        let mut rot270 = rot180
            .rotated_quarter_cw()
            .map_err(|e| format!("Rotating sheet to 270 degrees failed: {}", e))?;
        rot270.set_colorkey_rgb(key);

        Ok(Self {
            variants: [base, rot90, rot180, rot270],
            grid,
        })
    }

    #[inline]
    pub fn grid(&self) -> &SpriteGrid {
        &self.grid
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.grid.frame_count()
    }

    /// Sheet variant for a rotation (0..=3 quarter turns)
    #[inline]
    pub fn variant(&self, rot: u8) -> &PixelBuffer {
        &self.variants[(rot & 3) as usize]
    }

    /// Source rectangle of a frame inside the variant for `rot`.
    /// Cell size comes from the rotated buffer itself; the last column and
    /// row stretch to the buffer edge so truncation remainders are covered.
    pub fn locate(&self, frame: usize, rot: u8) -> Rect {
        let sheet = self.variant(rot);
        let sheet_w = sheet.width() as i32;
        let sheet_h = sheet.height() as i32;
        let (cols_r, rows_r, _, _) = self.grid.for_rotation(rot);

        let fw = sheet_w / cols_r as i32;
        let fh = sheet_h / rows_r as i32;

        let frame = (frame % self.grid.frame_count()) as u32;
        let base_col = frame % self.grid.cols;
        let base_row = frame / self.grid.cols;
        let (row, col) = self.grid.map_cell(rot, base_row, base_col);
        let (row, col) = (row as i32, col as i32);

        let mut x = col * fw;
        let mut y = row * fh;
        let mut w = if col == cols_r as i32 - 1 { sheet_w - x } else { fw };
        let mut h = if row == rows_r as i32 - 1 { sheet_h - y } else { fh };

        x = x.clamp(0, sheet_w);
        y = y.clamp(0, sheet_h);
        w = w.max(0).min(sheet_w - x);
        h = h.max(0).min(sheet_h - y);

        Rect::new(x, y, w, h)
    }
}
