//! Runtime configuration
//!
//! Built-in defaults, optionally overridden by a JSON file (`--config`),
//! then by individual command-line flags.

use crate::display::PixelFormat;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_WIDTH: u32 = 720;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_SHEET: &str = "sheet.bmp";

/// Framebuffer format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatChoice {
    /// Whatever the window reports
    Native,
    Rgb565,
    Xrgb8888,
    Argb8888,
}

impl FormatChoice {
    fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "rgb565" | "565" => Ok(Self::Rgb565),
            "xrgb8888" | "rgb888" => Ok(Self::Xrgb8888),
            "argb8888" => Ok(Self::Argb8888),
            other => Err(format!("Unknown pixel format '{}'", other)),
        }
    }

    /// Resolve against the window's native format. Formats the renderer
    /// can't hold fall back to XRGB8888 and the generic blit path.
    pub fn resolve(self, native: Option<PixelFormat>) -> PixelFormat {
        match self {
            Self::Native => match native {
                Some(PixelFormat::Rgb24) | None => PixelFormat::Xrgb8888,
                Some(format) => format,
            },
            Self::Rgb565 => PixelFormat::Rgb565,
            Self::Xrgb8888 => PixelFormat::Xrgb8888,
            Self::Argb8888 => PixelFormat::Argb8888,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// Present with vsync instead of relying on the sleep pacing alone
    pub vsync: bool,
    /// 24-bit BMP sprite sheet
    pub sheet: String,
    pub cols: u32,
    pub rows: u32,
    /// Nominal animation rate
    pub fps: u32,
    pub default_scale: f32,
    /// Velocity in pixels per tick
    pub speed_x: f32,
    pub speed_y: f32,
    /// Fixed sleep between ticks
    pub sleep_ms: u64,
    pub pixel_format: FormatChoice,
    /// Generate the sheet procedurally instead of loading `sheet`
    pub builtin_sheet: bool,
    /// Accept commands on the control socket
    pub remote: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fullscreen: false,
            vsync: false,
            sheet: DEFAULT_SHEET.to_string(),
            cols: 8,
            rows: 4,
            fps: 24,
            default_scale: 2.0,
            speed_x: 1.8,
            speed_y: 1.4,
            sleep_ms: 16,
            pixel_format: FormatChoice::Native,
            builtin_sheet: false,
            remote: false,
        }
    }
}

/// Result of command-line parsing
#[derive(Debug)]
pub enum Cli {
    Run(Config),
    Help,
}

impl Config {
    /// Load a JSON config file; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        serde_json::from_str(&json)
            .map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))
    }

    /// Reject values the renderer can't work with
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("Invalid resolution {}x{}", self.width, self.height));
        }
        if self.cols == 0 || self.rows == 0 {
            return Err(format!("Invalid sprite grid {}x{}", self.cols, self.rows));
        }
        if self.fps == 0 {
            return Err("Animation fps must be positive".to_string());
        }
        if !(self.default_scale.is_finite() && self.default_scale > 0.0) {
            return Err(format!("Invalid default scale {}", self.default_scale));
        }
        if !(self.speed_x.is_finite() && self.speed_y.is_finite()) {
            return Err("Speeds must be finite".to_string());
        }
        Ok(())
    }

    /// Parse command-line arguments (without the program name)
    pub fn from_args(args: &[String]) -> Result<Cli, String> {
        let mut config = match find_value(args, "--config") {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--help" => return Ok(Cli::Help),
                "--fullscreen" => config.fullscreen = true,
                "--vsync" => config.vsync = true,
                "--builtin" => config.builtin_sheet = true,
                "--remote" => config.remote = true,
                "--config" => i += 1,
                "--width" | "-w" => {
                    config.width = parse_num(value(args, i)?, "width")?;
                    i += 1;
                },
                "--height" | "-h" => {
                    config.height = parse_num(value(args, i)?, "height")?;
                    i += 1;
                },
                "--resolution" | "-r" => {
                    (config.width, config.height) = parse_pair(value(args, i)?, "resolution")?;
                    i += 1;
                },
                "--sheet" => {
                    config.sheet = value(args, i)?.to_string();
                    i += 1;
                },
                "--grid" => {
                    (config.cols, config.rows) = parse_pair(value(args, i)?, "grid")?;
                    i += 1;
                },
                "--fps" => {
                    config.fps = parse_num(value(args, i)?, "fps")?;
                    i += 1;
                },
                "--scale" => {
                    config.default_scale = parse_num(value(args, i)?, "scale")?;
                    i += 1;
                },
                "--sleep" => {
                    config.sleep_ms = parse_num(value(args, i)?, "sleep")?;
                    i += 1;
                },
                "--format" => {
                    config.pixel_format = FormatChoice::parse(value(args, i)?)?;
                    i += 1;
                },
                other => return Err(format!("Unknown argument '{}' (see --help)", other)),
            }
            i += 1;
        }

        config.validate()?;
        Ok(Cli::Run(config))
    }
}

pub fn print_usage() {
    println!("Usage: tag_bounce [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config PATH         Load settings from a JSON file");
    println!(
        "  --width W, -w W       Window width (default: {})",
        DEFAULT_WIDTH
    );
    println!(
        "  --height H, -h H      Window height (default: {})",
        DEFAULT_HEIGHT
    );
    println!("  --resolution WxH, -r WxH  Set resolution (e.g., 720x720)");
    println!("  --fullscreen          Fullscreen window");
    println!("  --vsync               Present with vsync");
    println!("  --sheet PATH          Sprite sheet BMP (default: {})", DEFAULT_SHEET);
    println!("  --builtin             Use the generated rainbow sheet");
    println!("  --grid CxR            Sheet grid (default: 8x4)");
    println!("  --fps N               Animation rate (default: 24)");
    println!("  --scale S             Starting scale, snapped to the preset list (default: 2)");
    println!("  --sleep MS            Sleep between ticks (default: 16)");
    println!("  --format F            native | rgb565 | xrgb8888 | argb8888");
    println!("  --remote              Accept commands on the control socket");
    println!("  --help                Show this help message");
}

fn find_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn value(args: &[String], i: usize) -> Result<&str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {}", args[i]))
}

fn parse_num<T: std::str::FromStr>(s: &str, what: &str) -> Result<T, String> {
    s.parse().map_err(|_| format!("Invalid {} '{}'", what, s))
}

/// Parse `AxB` (e.g. 1920x1080)
fn parse_pair(s: &str, what: &str) -> Result<(u32, u32), String> {
    let (a, b) = s
        .split_once('x')
        .ok_or_else(|| format!("Invalid {} '{}', expected AxB", what, s))?;
    Ok((parse_num(a, what)?, parse_num(b, what)?))
}
