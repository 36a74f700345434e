//! winit shell: window creation, event routing, the synchronous frame loop,
//! and presentation of the framebuffer through softbuffer.

use std::error::Error;
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::assets::AssetManager;
use crate::core::input::{self, InputState};
use crate::game::{gameplay, parsing::chart_json};
use crate::gfx::Framebuffer;

struct Gfx {
    _context: softbuffer::Context<Arc<Window>>,
    surface: softbuffer::Surface<Arc<Window>, Arc<Window>>,
}

struct App {
    window: Option<Arc<Window>>,
    gfx: Option<Gfx>,
    framebuffer: Framebuffer,
    assets: Option<AssetManager>,
    session: Option<gameplay::State>,
    input: InputState,
    title_timer: Instant,
    frames: u32,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            gfx: None,
            framebuffer: Framebuffer::new(0, 0),
            assets: None,
            session: None,
            input: input::init_state(),
            title_timer: Instant::now(),
            frames: 0,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn Error>> {
        let config = crate::config::get();

        let attrs = Window::default_attributes()
            .with_title("phiplay")
            .with_inner_size(LogicalSize::new(config.display_width, config.display_height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        info!("Initializing softbuffer surface...");
        let context = softbuffer::Context::new(window.clone())?;
        let surface = softbuffer::Surface::new(&context, window.clone())?;

        let size = window.inner_size();
        self.framebuffer
            .resize(size.width as usize, size.height as usize);

        let assets = AssetManager::load(
            Path::new(&config.assets_dir),
            Path::new(&config.illustration_path),
            config.background_blur,
        );
        let chart = chart_json::load_chart(Path::new(&config.chart_path))?;
        self.session = Some(gameplay::init(chart, &config));
        self.assets = Some(assets);

        self.gfx = Some(Gfx {
            _context: context,
            surface,
        });
        self.window = Some(window);
        Ok(())
    }

    fn frame(&mut self) -> Result<(), Box<dyn Error>> {
        let (Some(session), Some(assets), Some(gfx)) =
            (self.session.as_mut(), self.assets.as_ref(), self.gfx.as_mut())
        else {
            return Ok(());
        };

        gameplay::handle_input(session, &self.input);
        gameplay::update(session);
        gameplay::render(session, &mut self.framebuffer, assets);
        self.input.begin_frame();

        let (w, h) = (self.framebuffer.width() as u32, self.framebuffer.height() as u32);
        let (Some(w_nz), Some(h_nz)) = (NonZeroU32::new(w), NonZeroU32::new(h)) else {
            return Ok(());
        };
        gfx.surface.resize(w_nz, h_nz)?;
        let mut buffer = gfx.surface.buffer_mut()?;
        self.framebuffer.pack_into(&mut buffer);
        buffer.present()?;

        self.frames += 1;
        if self.title_timer.elapsed().as_secs_f32() >= 1.0 {
            if let Some(window) = &self.window {
                let state = if session.clock.is_paused() { "paused" } else { "playing" };
                window.set_title(&format!(
                    "phiplay | {} | {} FPS | combo {}",
                    state,
                    self.frames,
                    session.scheduler.combo()
                ));
            }
            self.frames = 0;
            self.title_timer = Instant::now();
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none()
            && let Err(e) = self.init_graphics(event_loop)
        {
            error!("Failed to initialize: {e}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref().cloned() else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested. Shutting down.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    self.framebuffer
                        .resize(new_size.width as usize, new_size.height as usize);
                }
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                input::handle_keyboard_input(&key_event, &mut self.input);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.mouse_x = position.x as f32;
                self.input.mouse_y = position.y as f32;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                input::handle_mouse_button(button, state.is_pressed(), &mut self.input);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                input::handle_mouse_wheel(delta, &mut self.input);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.frame() {
                    error!("Frame failed: {e}");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
