mod assets;
mod audio;
mod cli;
mod device;
mod gpu;
mod reflect;

use std::path::{Path, PathBuf};

use clap::Parser;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use groov_core::{
    DynamicTexture, FrameInput, FrameTimer, ParameterSurface, PlaybackController, PlaybackEvent,
    ProceduralKind, SceneRenderer, TextureSource, Viewport,
};

use crate::assets::{is_audio_file, load_texture, ShaderSet};
use crate::audio::WavTransport;
use crate::cli::Args;
use crate::device::DeviceSlot;
use crate::gpu::WgpuBackend;

const BPM_STEP: u32 = 5;
const ROTATION_STEP: f32 = 0.005;
const HUE_STEP: f32 = 10.0;
const COLOR_STEP: f32 = 0.05;
const WIGGLE_STEP: f32 = 0.25;
// One wheel notch; pixel deltas are scaled to match.
const WHEEL_STEP: f32 = 0.1;
const PIXELS_PER_NOTCH: f64 = 50.0;

struct App<'w> {
    window: &'w Window,
    backend: DeviceSlot<WgpuBackend<'w>>,
    renderer: SceneRenderer,
    params: ParameterSurface,
    playback: PlaybackController<WavTransport>,
    timer: FrameTimer,
    textures: Vec<TextureSource>,
    texture_index: usize,
    shader_dir: Option<PathBuf>,
    cursor: (f32, f32),
    title: String,
}

impl<'w> App<'w> {
    fn new(window: &'w Window, args: &Args) -> Self {
        let params = ParameterSurface::new(args.initial_parameters());
        let mut renderer = SceneRenderer::new(args.scene_config(), params.reader());

        let shaders = match &args.shaders {
            Some(dir) => ShaderSet::load_dir(dir).unwrap_or_else(|e| {
                log::warn!("cannot read shaders from {}: {e}", dir.display());
                ShaderSet::default()
            }),
            None => ShaderSet::default(),
        };
        apply_shaders(&mut renderer, shaders);

        let mut app = Self {
            window,
            backend: DeviceSlot::default(),
            renderer,
            params,
            playback: PlaybackController::new(WavTransport::new()),
            timer: FrameTimer::new(),
            textures: vec![
                TextureSource::Dynamic(DynamicTexture::new()),
                TextureSource::Procedural(ProceduralKind::PermGradient),
                TextureSource::Procedural(ProceduralKind::Gradient4),
                TextureSource::Procedural(ProceduralKind::SimplexLookup),
            ],
            texture_index: 0,
            shader_dir: args.shaders.clone(),
            cursor: (0.0, 0.0),
            title: String::new(),
        };
        let opened = args.texture.as_deref().is_some_and(|path| app.open_texture(path));
        if !opened {
            app.select_texture(0);
        }
        if let Some(path) = &args.audio {
            app.open_audio(path);
        }
        app
    }

    /// First device; failing here is fatal.
    fn create_backend(&mut self) -> anyhow::Result<()> {
        let backend = pollster::block_on(WgpuBackend::new(self.window))?;
        self.renderer.on_context_created();
        self.backend.install(backend);
        Ok(())
    }

    fn frame(&mut self) {
        match self.playback.poll() {
            Some(PlaybackEvent::Started) => self.renderer.start_playing(),
            Some(PlaybackEvent::Stopped) => self.renderer.stop_playing(),
            None => {}
        }

        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }
        let window = self.window;
        let renderer = &mut self.renderer;
        let Some(backend) = self.backend.get_or_create(
            || pollster::block_on(WgpuBackend::new(window)),
            || renderer.on_context_created(),
        ) else {
            return;
        };

        let input = FrameInput {
            dt: self.timer.tick(),
            now_ms: self.timer.now_ms(),
            viewport: Viewport::new(size.width, size.height),
        };
        let report = self.renderer.render_frame(backend, input);
        if report.context_lost {
            log::warn!("device lost; recreating on the next frame");
            self.backend.drop_device();
        }
        self.update_title();
    }

    fn shutdown(&mut self) {
        self.playback.stop();
        if let Some(backend) = self.backend.get_mut() {
            self.renderer.release_gpu_resources(backend);
        }
        self.backend.drop_device();
    }

    fn update_title(&mut self) {
        let params = self.params.current();
        let title = format!(
            "groov | {} bpm{} | {:?} | {}",
            self.params.target_bpm(),
            if params.frozen { " (frozen)" } else { "" },
            self.playback.state(),
            self.renderer.status_text()
        );
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }

    fn open_audio(&mut self, path: &Path) {
        if let Err(e) = self.playback.open(path) {
            log::warn!("{e}");
        }
    }

    fn open_texture(&mut self, path: &Path) -> bool {
        match load_texture(path) {
            Ok(source) => {
                // The user's image goes first in the cycle and replaces an earlier one.
                if matches!(self.textures.first(), Some(TextureSource::UserFile { .. })) {
                    self.textures[0] = source;
                } else {
                    self.textures.insert(0, source);
                }
                self.select_texture(0);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    fn select_texture(&mut self, index: usize) {
        if let Some(source) = self.textures.get(index) {
            self.texture_index = index;
            self.renderer.set_texture(source.clone());
        }
    }

    fn reload_shaders(&mut self) {
        let Some(dir) = &self.shader_dir else {
            log::info!("no shader directory given (--shaders)");
            return;
        };
        match ShaderSet::load_dir(dir) {
            Ok(set) => {
                log::info!("reloading shaders from {}", dir.display());
                apply_shaders(&mut self.renderer, set);
            }
            Err(e) => log::warn!("cannot read shaders from {}: {e}", dir.display()),
        }
    }

    fn on_key(&mut self, key: &Key) -> bool {
        let p = self.params.current().clone();
        match key {
            Key::Named(NamedKey::Escape) => return false,
            Key::Named(NamedKey::Space) => {
                if let Err(e) = self.playback.toggle() {
                    log::warn!("{e}");
                }
            }
            Key::Named(NamedKey::ArrowUp) => {
                self.params.set_bpm(self.params.target_bpm() + BPM_STEP);
            }
            Key::Named(NamedKey::ArrowDown) => {
                self.params
                    .set_bpm(self.params.target_bpm().saturating_sub(BPM_STEP));
            }
            Key::Named(NamedKey::ArrowRight) => {
                self.params.set_rotation_speed(p.rotation_speed + ROTATION_STEP);
            }
            Key::Named(NamedKey::ArrowLeft) => {
                self.params.set_rotation_speed(p.rotation_speed - ROTATION_STEP);
            }
            Key::Character(c) => match c.as_str() {
                "f" | "F" => self.params.toggle_freeze(),
                "b" | "B" => self.params.set_scale_bounce(!p.do_scale_bounce),
                "[" => self.params.set_bg_hue(p.bg_hue - HUE_STEP),
                "]" => self.params.set_bg_hue(p.bg_hue + HUE_STEP),
                "1" => self.params.set_color_sat(p.color_sat - COLOR_STEP),
                "2" => self.params.set_color_sat(p.color_sat + COLOR_STEP),
                "3" => self.params.set_color_val(p.color_val - COLOR_STEP),
                "4" => self.params.set_color_val(p.color_val + COLOR_STEP),
                "q" | "Q" => self.params.set_wiggle_speed(p.wiggle_speed - WIGGLE_STEP),
                "w" | "W" => self.params.set_wiggle_speed(p.wiggle_speed + WIGGLE_STEP),
                "t" | "T" => {
                    let next = (self.texture_index + 1) % self.textures.len().max(1);
                    self.select_texture(next);
                }
                "r" | "R" => self.reload_shaders(),
                _ => {}
            },
            _ => {}
        }
        true
    }

    fn on_mouse_button(&mut self, state: ElementState) {
        let orientation = self.renderer.orientation_mut();
        match state {
            ElementState::Pressed => orientation.mouse_down(self.cursor.0, self.cursor.1),
            ElementState::Released => orientation.mouse_up(),
        }
    }

    fn on_cursor_moved(&mut self, x: f32, y: f32) {
        self.cursor = (x, y);
        let orientation = self.renderer.orientation_mut();
        if orientation.is_dragging() {
            orientation.mouse_drag(x, y);
        }
    }

    fn on_wheel(&mut self, delta: MouseScrollDelta) {
        let notches = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_NOTCH) as f32,
        };
        self.params.adjust_scale(notches * WHEEL_STEP);
    }

    fn on_dropped_file(&mut self, path: &Path) {
        if is_audio_file(path) {
            self.open_audio(path);
        } else {
            self.open_texture(path);
        }
    }
}

fn apply_shaders(renderer: &mut SceneRenderer, set: ShaderSet) {
    renderer.set_shaders(set.scene_vertex, set.scene_fragment);
    renderer.set_sky_shaders(set.sky_vertex, set.sky_fragment);
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::builder()
        .filter_level(args.log_level)
        .parse_default_env()
        .init();

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("groov")
        .with_inner_size(PhysicalSize::new(args.width, args.height))
        .build(&event_loop)?;

    let mut app = App::new(&window, &args);
    app.create_backend()?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    app.shutdown();
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    if let Some(backend) = app.backend.get_mut() {
                        backend.resize(size.width, size.height);
                    }
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    if !app.on_key(&logical_key) {
                        app.shutdown();
                        elwt.exit();
                    }
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => app.on_mouse_button(state),
                WindowEvent::CursorMoved { position, .. } => {
                    app.on_cursor_moved(position.x as f32, position.y as f32)
                }
                WindowEvent::MouseWheel { delta, .. } => app.on_wheel(delta),
                WindowEvent::TouchpadMagnify { delta, .. } => {
                    app.params.adjust_scale(delta as f32)
                }
                WindowEvent::DroppedFile(path) => app.on_dropped_file(&path),
                _ => {}
            },
            Event::AboutToWait => app.frame(),
            _ => {}
        }
    })?;
    Ok(())
}
