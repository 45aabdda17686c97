mod format;
mod pixel_buffer;

pub use format::PixelFormat;
pub use pixel_buffer::PixelBuffer;

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

pub struct Display {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    width: u32,
    height: u32,
}

/// Streaming texture the screen buffer is uploaded into each frame
pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
}

impl Display {
    /// Create display with custom resolution, VSync and fullscreen settings.
    /// In fullscreen the reported size is the actual output size.
    pub fn with_options(
        title: &str,
        width: u32,
        height: u32,
        vsync: bool,
        fullscreen: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>), String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let mut window_builder = video_subsystem.window(title, width, height);
        window_builder.position_centered();
        if fullscreen {
            window_builder.fullscreen_desktop();
        }
        let window = window_builder.build().map_err(|e| e.to_string())?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(|e| e.to_string())?;
        let (width, height) = canvas.output_size()?;

        if fullscreen {
            sdl_context.mouse().show_cursor(false);
        }

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;

        Ok((
            Self {
                canvas,
                event_pump,
                width,
                height,
            },
            texture_creator,
        ))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format the window surface reports, if it is one we can draw into
    pub fn native_format(&self) -> Option<PixelFormat> {
        PixelFormat::from_sdl(self.canvas.window().window_pixel_format())
    }

    pub fn present(
        &mut self,
        target: &mut RenderTarget,
        buffer: &PixelBuffer,
    ) -> Result<(), String> {
        if buffer.format() != target.format
            || buffer.width() != target.width
            || buffer.height() != target.height
        {
            return Err(format!(
                "Screen buffer {}x{} {} does not match render target {}x{} {}",
                buffer.width(),
                buffer.height(),
                buffer.format().name(),
                target.width,
                target.height,
                target.format.name()
            ));
        }
        target
            .texture
            .update(None, buffer.as_bytes(), buffer.pitch())
            .map_err(|e| e.to_string())?;

        self.canvas.copy(&target.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                _ => {},
            }
        }

        events
    }
}

impl<'a> RenderTarget<'a> {
    /// Create render target matching the screen buffer's size and format
    pub fn with_size(
        texture_creator: &'a TextureCreator<WindowContext>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, String> {
        let texture = texture_creator
            .create_texture_streaming(format.to_sdl(), width, height)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            texture,
            width,
            height,
            format,
        })
    }
}
