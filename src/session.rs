//! Session state and the per-tick update/draw cycle
//!
//! Owns the sprite sheet variants, view (rotation + scale), animation,
//! motion and dirty-rect tracking. Commands change the view; `tick` erases
//! the previous draw, advances state and blits the current frame.

use std::ops::ControlFlow;

use crate::config::Config;
use crate::display::PixelBuffer;
use crate::geometry::Rect;
use crate::sprite::{
    blit_scaled, dest_rect, scaled_extent, select_path, AnimationState, BlitPath, Bounce,
    MotionState, SpriteSheet,
};

/// Scale presets cycled by the scale command
pub const SCALE_OPTIONS: [f32; 10] = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 5.0, 6.0];

/// Transparent background of the sprite sheet
pub const COLORKEY: (u8, u8, u8) = (32, 32, 32);

/// Screen clear color
pub const BACKGROUND: (u8, u8, u8) = (0, 0, 0);

/// Discrete user commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Rotate,
    CycleScale,
    Exit,
}

/// Index of the preset closest to `target` (earliest wins ties)
pub fn closest_scale_index(target: f32) -> usize {
    let mut best = 0;
    let mut best_diff = f32::INFINITY;
    for (i, &s) in SCALE_OPTIONS.iter().enumerate() {
        let diff = (target - s).abs();
        if diff < best_diff {
            best_diff = diff;
            best = i;
        }
    }
    best
}

/// Rotation in quarter turns and the selected scale preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    rotation: u8,
    scale_idx: usize,
}

impl ViewState {
    pub fn new(scale_idx: usize) -> Self {
        Self {
            rotation: 0,
            scale_idx: scale_idx % SCALE_OPTIONS.len(),
        }
    }

    #[inline]
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    #[inline]
    pub fn scale_index(&self) -> usize {
        self.scale_idx
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        SCALE_OPTIONS[self.scale_idx]
    }

    fn rotate(&mut self) {
        self.rotation = (self.rotation + 1) & 3;
    }

    fn cycle_scale(&mut self) {
        self.scale_idx = (self.scale_idx + 1) % SCALE_OPTIONS.len();
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// False when the blit failed; the frame is dropped
    pub drawn: bool,
    pub frame: usize,
    pub src: Rect,
    /// On-screen region written this tick (next tick's dirty rect)
    pub dst: Option<Rect>,
    pub path: BlitPath,
    pub bounce: Bounce,
}

pub struct Session {
    sheet: SpriteSheet,
    view: ViewState,
    anim: AnimationState,
    motion: MotionState,
    /// Region drawn last tick
    dirty: Option<Rect>,
    /// Set by view changes: the whole screen is cleared before the next draw
    full_clear: bool,
    screen_w: u32,
    screen_h: u32,
    background: u32,
}

impl Session {
    /// Start at rotation 0, the preset closest to the configured scale,
    /// centered on the screen
    pub fn new(sheet: SpriteSheet, screen: &PixelBuffer, config: &Config) -> Self {
        let view = ViewState::new(closest_scale_index(config.default_scale));
        let mut anim = AnimationState::new(sheet.frame_count(), config.fps);
        anim.apply_scale_budget(view.scale());

        let (r, g, b) = BACKGROUND;
        let mut session = Self {
            sheet,
            view,
            anim,
            motion: MotionState::new(0.0, 0.0, config.speed_x, config.speed_y),
            dirty: None,
            full_clear: true,
            screen_w: screen.width(),
            screen_h: screen.height(),
            background: screen.format().map_rgb(r, g, b),
        };

        let (dw, dh) = session.draw_size();
        session.motion.x = (session.screen_w as i32 - dw) as f32 * 0.5;
        session.motion.y = (session.screen_h as i32 - dh) as f32 * 0.5;
        session.clamp_position();
        session
    }

    #[cfg(test)]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[cfg(test)]
    pub fn animation(&self) -> &AnimationState {
        &self.anim
    }

    #[cfg(test)]
    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    /// Previous tick's drawn region, None right after a view change
    #[cfg(test)]
    pub fn dirty_rect(&self) -> Option<Rect> {
        self.dirty
    }

    /// Nominal scaled sprite size for the current rotation and scale
    pub fn draw_size(&self) -> (i32, i32) {
        let (_, _, fw, fh) = self.sheet.grid().for_rotation(self.view.rotation());
        let scale = self.view.scale();
        (scaled_extent(fw as i32, scale), scaled_extent(fh as i32, scale))
    }

    /// Source rectangle and on-screen size of the current frame. The last
    /// grid column/row absorbs sheet remainders, so this can exceed `draw_size`.
    fn frame_extent(&self) -> (Rect, i32, i32) {
        let rot = self.view.rotation();
        let scale = self.view.scale();
        let src = self.sheet.locate(self.anim.frame, rot);
        (src, scaled_extent(src.w, scale), scaled_extent(src.h, scale))
    }

    fn clamp_position(&mut self) {
        let (_, dw, dh) = self.frame_extent();
        self.motion.clamp_to(dw, dh, self.screen_w, self.screen_h);
    }

    /// The draw rectangle changes size, so the next tick clears everything
    fn invalidate(&mut self) {
        self.dirty = None;
        self.full_clear = true;
        self.clamp_position();
    }

    /// Apply a command. `Break` ends the run loop.
    pub fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Exit => {
                log::info!("Exit requested");
                return ControlFlow::Break(());
            },
            Command::Rotate => {
                self.view.rotate();
                self.invalidate();
                let (dw, dh) = self.draw_size();
                log::info!(
                    "Rotated to {}*90 cw; draw {}x{} (scale={:.2})",
                    self.view.rotation(),
                    dw,
                    dh,
                    self.view.scale()
                );
            },
            Command::CycleScale => {
                self.view.cycle_scale();
                self.anim.apply_scale_budget(self.view.scale());
                self.invalidate();
                let (dw, dh) = self.draw_size();
                log::info!(
                    "Scale {:.2}; draw {}x{}; anim step {}ms",
                    self.view.scale(),
                    dw,
                    dh,
                    self.anim.effective_step_ms()
                );
            },
        }
        ControlFlow::Continue(())
    }

    /// One update/draw cycle into `screen`
    pub fn tick(&mut self, elapsed_ms: u32, screen: &mut PixelBuffer) -> FrameReport {
        if self.full_clear {
            screen.clear(self.background);
            self.full_clear = false;
        } else if let Some(prev) = self.dirty.take() {
            screen.fill_rect(prev, self.background);
        }

        self.anim.advance(elapsed_ms);
        // Bounce against the frame actually drawn, remainder included
        let (src, dw, dh) = self.frame_extent();
        let bounce = self.motion.step(dw, dh, self.screen_w, self.screen_h);

        let rot = self.view.rotation();
        let scale = self.view.scale();
        let frame = self.anim.frame;
        let sheet = self.sheet.variant(rot);
        let (x, y) = self.motion.origin();
        let dst = dest_rect(x, y, src, scale);

        let path = select_path(sheet.format(), screen.format(), scale);
        let drawn = blit_scaled(sheet, src, screen, dst, sheet.colorkey(), scale);
        if !drawn {
            log::warn!(
                "Blit failed ({:?}): src {},{} {}x{}  dst {},{} {}x{}",
                path,
                src.x,
                src.y,
                src.w,
                src.h,
                dst.x,
                dst.y,
                dst.w,
                dst.h
            );
        }

        self.dirty = dst.clip_to(self.screen_w, self.screen_h);
        FrameReport {
            drawn,
            frame,
            src,
            dst: self.dirty,
            path,
            bounce,
        }
    }

    /// Startup summary of sizes and render settings
    pub fn log_state(&self) {
        let base = self.sheet.variant(0);
        let grid = self.sheet.grid();
        let (dw, dh) = self.draw_size();
        log::info!(
            "SPRITE: {}x{}  grid {}x{}  frame {}x{}  draw {}x{}  fps={}  rot={}*90  scale={:.2} (preset {})  fast565={}",
            base.width(),
            base.height(),
            grid.cols,
            grid.rows,
            grid.frame_w,
            grid.frame_h,
            dw,
            dh,
            1000 / self.anim.step_ms(),
            self.view.rotation(),
            self.view.scale(),
            self.view.scale_index(),
            base.format().is_fast_path()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::PixelFormat;

    const SENTINEL: u32 = 0x1234;

    /// 80x40 sheet, 8x4 grid of 10x10 cells on the key color, each cell
    /// with an opaque 2x2 dot in its top-left corner
    fn small_sheet(format: PixelFormat) -> SpriteSheet {
        let mut base = PixelBuffer::with_size(80, 40, format);
        let (kr, kg, kb) = COLORKEY;
        base.clear(format.map_rgb(kr, kg, kb));
        for row in 0..4 {
            for col in 0..8 {
                base.fill_rect(Rect::new(col * 10, row * 10, 2, 2), format.map_rgb(255, 0, 0));
            }
        }
        SpriteSheet::build(base, 8, 4, COLORKEY).unwrap()
    }

    /// Opaque red sheet on an 8x4 grid, any size
    fn solid_sheet(w: u32, h: u32) -> SpriteSheet {
        let mut base = PixelBuffer::with_size(w, h, PixelFormat::Rgb565);
        base.clear(0xF800);
        SpriteSheet::build(base, 8, 4, COLORKEY).unwrap()
    }

    fn session(format: PixelFormat) -> (Session, PixelBuffer) {
        let screen = PixelBuffer::with_size(200, 120, format);
        let session = Session::new(small_sheet(format), &screen, &Config::default());
        (session, screen)
    }

    #[test]
    fn test_closest_scale_index() {
        assert_eq!(closest_scale_index(2.0), 3);
        assert_eq!(closest_scale_index(0.1), 0);
        assert_eq!(closest_scale_index(100.0), SCALE_OPTIONS.len() - 1);
        // Tie between 1.0 and 1.5 goes to the first
        assert_eq!(closest_scale_index(1.25), 1);
    }

    #[test]
    fn test_initial_state_centered() {
        let (session, _) = session(PixelFormat::Rgb565);
        assert_eq!(session.view().rotation(), 0);
        assert_eq!(session.view().scale(), 2.0);
        assert_eq!(session.draw_size(), (20, 20));
        assert_eq!((session.motion().x, session.motion().y), (90.0, 50.0));
    }

    #[test]
    fn test_scale_cycle_from_default() {
        let (mut session, _) = session(PixelFormat::Rgb565);
        for _ in 0..3 {
            assert_eq!(session.handle_command(Command::CycleScale), ControlFlow::Continue(()));
        }
        assert_eq!(session.view().scale(), 3.5);
        assert_eq!(session.view().scale_index(), 6);
        assert_eq!(session.animation().effective_step_ms(), 41 * 3);
    }

    #[test]
    fn test_scale_cycle_wraps() {
        let (mut session, _) = session(PixelFormat::Rgb565);
        for _ in 0..SCALE_OPTIONS.len() - 3 {
            session.handle_command(Command::CycleScale);
        }
        assert_eq!(session.view().scale_index(), 0);
        assert_eq!(session.view().scale(), 0.5);
        assert_eq!(session.animation().effective_step_ms(), 41);
    }

    #[test]
    fn test_rotation_cycles() {
        let (mut session, _) = session(PixelFormat::Rgb565);
        for expected in [1, 2, 3, 0] {
            session.handle_command(Command::Rotate);
            assert_eq!(session.view().rotation(), expected);
        }
    }

    #[test]
    fn test_exit_breaks() {
        let (mut session, _) = session(PixelFormat::Rgb565);
        assert_eq!(session.handle_command(Command::Exit), ControlFlow::Break(()));
    }

    #[test]
    fn test_tick_draws_opaque_only() {
        let (mut session, mut screen) = session(PixelFormat::Rgb565);
        let report = session.tick(0, &mut screen);
        assert!(report.drawn);
        assert_eq!(report.path, BlitPath::FastUpscale(2));
        let dst = report.dst.unwrap();
        assert_eq!((dst.w, dst.h), (20, 20));
        // 2x2 dot scaled to 4x4; the keyed remainder stays background
        assert_eq!(screen.get_pixel(dst.x, dst.y), Some(0xF800));
        assert_eq!(screen.get_pixel(dst.x + 3, dst.y + 3), Some(0xF800));
        assert_eq!(screen.get_pixel(dst.x + 4, dst.y + 4), Some(0));
    }

    #[test]
    fn test_dirty_rect_erased_next_tick() {
        let (mut session, mut screen) = session(PixelFormat::Rgb565);
        let first = session.tick(0, &mut screen).dst.unwrap();
        assert_eq!(session.dirty_rect(), Some(first));
        let second = session.tick(0, &mut screen).dst.unwrap();
        assert_ne!(first, second);
        // The old dot corner is not covered by the new draw and must be cleared
        assert!(!second.contains(first.x, first.y));
        assert_eq!(screen.get_pixel(first.x, first.y), Some(0));
    }

    #[test]
    fn test_view_change_forces_full_clear() {
        let (mut session, mut screen) = session(PixelFormat::Rgb565);
        session.tick(0, &mut screen);
        screen.set_pixel(0, 0, SENTINEL);
        session.tick(0, &mut screen);
        // Only the dirty rect was erased
        assert_eq!(screen.get_pixel(0, 0), Some(SENTINEL));

        session.handle_command(Command::Rotate);
        assert_eq!(session.dirty_rect(), None);
        session.tick(0, &mut screen);
        assert_eq!(screen.get_pixel(0, 0), Some(0));
    }

    #[test]
    fn test_animation_advances_with_time() {
        let (mut session, mut screen) = session(PixelFormat::Rgb565);
        assert_eq!(session.tick(0, &mut screen).frame, 0);
        assert_eq!(session.tick(41, &mut screen).frame, 1);
        assert_eq!(session.tick(41 * 2, &mut screen).frame, 3);
    }

    #[test]
    fn test_rotated_frame_uses_rotated_variant() {
        let (mut session, mut screen) = session(PixelFormat::Rgb565);
        session.handle_command(Command::Rotate);
        let report = session.tick(0, &mut screen);
        // Frame 0 sits in the top-right cell of the 90 degree sheet
        assert_eq!(report.src, Rect::new(30, 0, 10, 10));
        let dst = report.dst.unwrap();
        // The dot rotates to the cell's top-right corner
        assert_eq!(screen.get_pixel(dst.right() - 1, dst.y), Some(0xF800));
        assert_eq!(screen.get_pixel(dst.x, dst.y), Some(0));
    }

    #[test]
    fn test_generic_path_on_wide_screen() {
        let (mut session, mut screen) = session(PixelFormat::Xrgb8888);
        let report = session.tick(0, &mut screen);
        assert!(report.drawn);
        assert_eq!(report.path, BlitPath::Generic);
        let dst = report.dst.unwrap();
        assert_eq!(screen.get_rgb(dst.x, dst.y), Some((255, 0, 0)));
    }

    #[test]
    fn test_stays_on_screen_at_every_scale() {
        let (mut session, mut screen) = session(PixelFormat::Rgb565);
        for _ in 0..SCALE_OPTIONS.len() {
            session.handle_command(Command::CycleScale);
            let (dw, dh) = session.draw_size();
            for _ in 0..200 {
                session.tick(16, &mut screen);
                let (x, y) = session.motion().origin();
                assert!(x >= 0 && y >= 0);
                assert!(x + dw <= 200 && y + dh <= 120, "scale {}", session.view().scale());
            }
        }
    }

    #[test]
    fn test_remainder_frame_bounces_inside_screen() {
        // 83 = 8 * 10 + 3, so the last column is 13 wide
        let mut screen = PixelBuffer::with_size(200, 120, PixelFormat::Rgb565);
        let mut session = Session::new(solid_sheet(83, 40), &screen, &Config::default());
        assert_eq!(session.draw_size(), (20, 20));
        session.motion.x = 190.0;

        let report = session.tick(41 * 7, &mut screen);
        assert_eq!(report.frame, 7);
        assert_eq!(report.src.w, 13);
        assert!(report.bounce.x);
        let dst = report.dst.unwrap();
        assert_eq!(dst.w, 26);
        assert_eq!(dst.right(), 200);
        assert_eq!(screen.get_pixel(199, dst.y), Some(0xF800));

        // Never clipped at any frame: the drawn rect is the full 2x source
        for _ in 0..500 {
            let report = session.tick(16, &mut screen);
            let dst = report.dst.unwrap();
            assert_eq!((dst.w, dst.h), (report.src.w * 2, report.src.h * 2));
        }
    }

    #[test]
    fn test_rotate_reclamps_to_rotated_size() {
        // 10x5 cells drawn 20x10 at 2x, 10x20 after a quarter turn
        let mut screen = PixelBuffer::with_size(200, 120, PixelFormat::Rgb565);
        let mut session = Session::new(solid_sheet(80, 20), &screen, &Config::default());
        assert_eq!(session.draw_size(), (20, 10));
        session.motion.x = 180.0;
        session.motion.y = 110.0;

        session.handle_command(Command::Rotate);
        assert_eq!(session.draw_size(), (10, 20));
        let m = session.motion();
        assert_eq!((m.x, m.y), (180.0, 100.0));
        // Clamping leaves velocity alone
        assert_eq!((m.vx, m.vy), (1.8, 1.4));
        let (x, y) = m.origin();
        let (dw, dh) = session.draw_size();
        assert!(x + dw <= 200 && y + dh <= 120);

        let dst = session.tick(0, &mut screen).dst.unwrap();
        assert_eq!((dst.w, dst.h), (10, 20));
        assert!(dst.right() <= 200 && dst.bottom() <= 120);
    }
}
