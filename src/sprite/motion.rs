//! Animation timing and bounce physics
//!
//! Both advance once per loop tick. Animation is driven by elapsed
//! milliseconds; motion uses a fixed per-tick velocity.

/// Frame counter with a millisecond accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub frame: usize,
    frame_count: usize,
    accum_ms: u32,
    step_ms: u32,
    step_ms_eff: u32,
}

impl AnimationState {
    /// `fps` sets the nominal step; zero fps or zero frames are clamped to one
    pub fn new(frame_count: usize, fps: u32) -> Self {
        let step_ms = (1000 / fps.max(1)).max(1);
        Self {
            frame: 0,
            frame_count: frame_count.max(1),
            accum_ms: 0,
            step_ms,
            step_ms_eff: step_ms,
        }
    }

    #[inline]
    pub fn step_ms(&self) -> u32 {
        self.step_ms
    }

    /// Step actually in use after the scale budget is applied
    #[inline]
    pub fn effective_step_ms(&self) -> u32 {
        self.step_ms_eff
    }

    #[cfg(test)]
    pub fn accumulated_ms(&self) -> u32 {
        self.accum_ms
    }

    /// Slow the animation at large scales so per-second pixel work stays bounded
    pub fn apply_scale_budget(&mut self, scale: f32) {
        self.step_ms_eff = self.step_ms * budget_multiplier(scale);
        // Keep the accumulator invariant under the new step
        self.accum_ms %= self.step_ms_eff;
    }

    /// Accumulate elapsed time, advancing as many frames as it covers.
    /// Returns the number of frames advanced.
    pub fn advance(&mut self, elapsed_ms: u32) -> u32 {
        self.accum_ms = self.accum_ms.saturating_add(elapsed_ms);
        let mut advanced = 0;
        while self.accum_ms >= self.step_ms_eff {
            self.accum_ms -= self.step_ms_eff;
            self.frame = (self.frame + 1) % self.frame_count;
            advanced += 1;
        }
        advanced
    }
}

/// 1x below 2.5, 2x in [2.5, 3.5), 3x from 3.5 up
pub fn budget_multiplier(scale: f32) -> u32 {
    if scale >= 3.5 {
        3
    } else if scale >= 2.5 {
        2
    } else {
        1
    }
}

/// Which axes reflected during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounce {
    pub x: bool,
    pub y: bool,
}

impl Bounce {
    pub fn any(&self) -> bool {
        self.x || self.y
    }
}

/// Position and per-tick velocity in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl MotionState {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32) -> Self {
        Self { x, y, vx, vy }
    }

    /// Euler step followed by elastic reflection at the screen edges.
    /// `draw_w`/`draw_h` is the scaled sprite size.
    pub fn step(&mut self, draw_w: i32, draw_h: i32, screen_w: u32, screen_h: u32) -> Bounce {
        self.x += self.vx;
        self.y += self.vy;
        Bounce {
            x: reflect_axis(&mut self.x, &mut self.vx, draw_w, screen_w),
            y: reflect_axis(&mut self.y, &mut self.vy, draw_h, screen_h),
        }
    }

    /// Pull the position back inside the screen without touching velocity.
    /// Used after the draw size changes (rotate, rescale).
    pub fn clamp_to(&mut self, draw_w: i32, draw_h: i32, screen_w: u32, screen_h: u32) {
        self.x = clamp_axis(self.x, draw_w, screen_w);
        self.y = clamp_axis(self.y, draw_h, screen_h);
    }

    /// Integer draw origin
    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

/// Upper bound for the position on one axis; zero when the sprite is larger than the screen
#[inline]
fn max_pos(size: i32, screen: u32) -> f32 {
    (screen as i32 - size).max(0) as f32
}

fn clamp_axis(pos: f32, size: i32, screen: u32) -> f32 {
    pos.clamp(0.0, max_pos(size, screen))
}

fn reflect_axis(pos: &mut f32, vel: &mut f32, size: i32, screen: u32) -> bool {
    let hi = max_pos(size, screen);
    if *pos < 0.0 {
        *pos = 0.0;
        *vel = -*vel;
        true
    } else if *pos > hi {
        *pos = hi;
        *vel = -*vel;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_step_duration_from_fps() {
        let anim = AnimationState::new(32, 24);
        assert_eq!(anim.step_ms(), 41);
        assert_eq!(anim.effective_step_ms(), 41);
    }

    #[test]
    fn test_advance_catches_up() {
        let mut anim = AnimationState::new(32, 24);
        assert_eq!(anim.advance(40), 0);
        assert_eq!(anim.frame, 0);
        assert_eq!(anim.advance(1), 1);
        assert_eq!(anim.frame, 1);
        // Scheduling hiccup: several frames in one tick
        assert_eq!(anim.advance(41 * 3 + 5), 3);
        assert_eq!(anim.frame, 4);
        assert_eq!(anim.accumulated_ms(), 5);
    }

    #[test]
    fn test_advance_wraps() {
        let mut anim = AnimationState::new(4, 10);
        anim.advance(100 * 5);
        assert_eq!(anim.frame, 1);
    }

    #[test]
    fn test_scale_budget() {
        let mut anim = AnimationState::new(32, 24);
        for (scale, mul) in [
            (0.5, 1),
            (2.0, 1),
            (2.5, 2),
            (3.0, 2),
            (3.5, 3),
            (4.0, 3),
            (6.0, 3),
        ] {
            anim.apply_scale_budget(scale);
            assert_eq!(anim.effective_step_ms(), 41 * mul, "scale {}", scale);
        }
    }

    #[test]
    fn test_budget_keeps_accumulator_below_step() {
        let mut anim = AnimationState::new(32, 24);
        anim.apply_scale_budget(4.0);
        anim.advance(100);
        assert_eq!(anim.accumulated_ms(), 100);
        anim.apply_scale_budget(1.0);
        assert!(anim.accumulated_ms() < anim.effective_step_ms());
    }

    #[test]
    fn test_left_wall_bounce() {
        let mut m = MotionState::new(0.0, 0.0, -1.8, 1.4);
        let bounce = m.step(100, 100, 720, 720);
        assert_eq!(m.x, 0.0);
        assert_eq!(m.vx, 1.8);
        assert!((m.y - 1.4).abs() < 1e-6);
        assert_eq!(m.vy, 1.4);
        assert_eq!(bounce, Bounce { x: true, y: false });
    }

    #[test]
    fn test_corner_bounces_both_axes() {
        let mut m = MotionState::new(619.5, 619.5, 1.0, 1.0);
        let bounce = m.step(100, 100, 720, 720);
        assert_eq!((m.x, m.y), (620.0, 620.0));
        assert_eq!((m.vx, m.vy), (-1.0, -1.0));
        assert!(bounce.x && bounce.y);
    }

    #[test]
    fn test_clamp_keeps_velocity() {
        let mut m = MotionState::new(700.0, -5.0, 2.0, -2.0);
        m.clamp_to(200, 200, 720, 720);
        assert_eq!((m.x, m.y), (520.0, 0.0));
        assert_eq!((m.vx, m.vy), (2.0, -2.0));
    }

    #[test]
    fn test_oversized_sprite_pins_to_origin() {
        let mut m = MotionState::new(10.0, 10.0, 1.0, 1.0);
        m.step(800, 800, 720, 720);
        assert_eq!((m.x, m.y), (0.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_tick_stays_on_screen(
            x in -50.0f32..800.0,
            y in -50.0f32..800.0,
            vx in -8.0f32..8.0,
            vy in -8.0f32..8.0,
            w in 1i32..300,
            h in 1i32..300,
        ) {
            let (sw, sh) = (720u32, 480u32);
            let mut m = MotionState::new(x, y, vx, vy);
            let before = m;
            let bounce = m.step(w, h, sw, sh);
            let (ox, oy) = m.origin();
            prop_assert!(ox >= 0 && oy >= 0);
            prop_assert!(ox + w <= sw as i32);
            prop_assert!(oy + h <= sh as i32);
            prop_assert_eq!(m.vx, if bounce.x { -before.vx } else { before.vx });
            prop_assert_eq!(m.vy, if bounce.y { -before.vy } else { before.vy });
        }

        #[test]
        fn prop_accumulator_below_step(elapsed in proptest::collection::vec(0u32..500, 1..20)) {
            let mut anim = AnimationState::new(32, 24);
            for ms in elapsed {
                anim.advance(ms);
                prop_assert!(anim.accumulated_ms() < anim.effective_step_ms());
                prop_assert!(anim.frame < 32);
            }
        }
    }
}
