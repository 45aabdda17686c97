mod blit;
mod motion;
mod sheet;

pub use blit::{blit_scaled, dest_rect, scaled_extent, select_path, BlitPath};
pub use motion::{AnimationState, Bounce, MotionState};
pub use sheet::SpriteSheet;
