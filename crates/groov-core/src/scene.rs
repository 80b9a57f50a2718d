//! Per-frame draw orchestration.
//!
//! [`SceneRenderer::render_frame`] is the whole frame:
//!
//! 1. drain cross-thread requests and read the latest parameter snapshot;
//! 2. make sure the noise and user textures exist (and refresh animated ones);
//! 3. compile any pending shader source;
//! 4. lazily (re)build meshes for the programs in use;
//! 5. advance the animation clock by the measured frame time;
//! 6. draw the sky box (depth writes off), the central shape, then both
//!    orbital sets.
//!
//! Nothing in here aborts the host's frame loop. Failures end up in the
//! returned [`FrameReport`]; a lost context drops every handle so the next
//! frame rebuilds from scratch.

use std::f64::consts::FRAC_PI_2;
use std::sync::mpsc::{self, Receiver, Sender};

use fnv::FnvHashSet;
use glam::{Mat4, Vec3};
use smallvec::SmallVec;

use crate::clock::{AnimationClock, BouncingNumber};
use crate::color::{angle_to_rgb, phase_to_hue};
use crate::constants::{
    eye_vec3, light_vec3, BG_SATURATION, BG_VALUE, CENTRAL_NEAR_PLANE, DEFAULT_ORBITAL_COUNT,
    ORBITAL_SCALE, ORBIT_RADIUS, SKY_BOX_SIZE, SKY_NEAR_PLANE, UNIT_GRAD_TEXTURE,
    UNIT_PERM_TEXTURE, UNIT_SIMPLEX_TEXTURE, UNIT_USER_TEXTURE,
};
use crate::error::{AssetLoadError, GpuError, RenderError};
use crate::gpu::{GpuBackend, MeshId, TextureId, UniformValue};
use crate::mesh::{AssetLoader, BuiltinAssets, MeshData};
use crate::noise::NoiseTextures;
use crate::orientation::DragOrientation;
use crate::params::{ParameterReader, RenderParameters};
use crate::shader::{ProgramBindings, ShaderManager, Uniform};
use crate::texture::{TextureBuffer, TextureRefresh, TextureSource};
use crate::transform::{
    beat_rotation, central_model_matrix, compute_normal_matrix, compute_projection,
    normal_matrix_to_array, to_render_matrix4, view_matrix, Viewport,
};

const MESH_ASSET: &str = "cube";

/// Which optional stages run, and the per-component near planes.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub orbital_count: usize,
    pub orbitals_enabled: bool,
    pub sky_enabled: bool,
    pub central_near_plane: f32,
    pub sky_near_plane: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            orbital_count: DEFAULT_ORBITAL_COUNT,
            orbitals_enabled: true,
            sky_enabled: true,
            central_near_plane: CENTRAL_NEAR_PLANE,
            sky_near_plane: SKY_NEAR_PLANE,
        }
    }
}

/// Work posted from other threads, applied at the start of the next frame.
#[derive(Debug)]
pub enum RenderRequest {
    SetShaders { vertex: String, fragment: String },
    SetSkyShaders { vertex: String, fragment: String },
    SetTexture(TextureSource),
    PlaybackStarted,
    PlaybackStopped,
}

#[derive(Clone, Debug)]
pub struct RenderRequestSender {
    tx: Sender<RenderRequest>,
}

impl RenderRequestSender {
    /// Returns `false` once the renderer is gone.
    pub fn send(&self, request: RenderRequest) -> bool {
        self.tx.send(request).is_ok()
    }

    pub fn set_shaders(&self, vertex: impl Into<String>, fragment: impl Into<String>) -> bool {
        self.send(RenderRequest::SetShaders {
            vertex: vertex.into(),
            fragment: fragment.into(),
        })
    }

    pub fn set_texture(&self, source: TextureSource) -> bool {
        self.send(RenderRequest::SetTexture(source))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub dt: f64,
    /// Monotonic milliseconds, for animated textures and bouncing numbers.
    pub now_ms: f64,
    pub viewport: Viewport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrbitAxis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drawable {
    Sky,
    Central,
    Orbital(OrbitAxis, usize),
}

/// What happened during one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// The frame reached `end_frame` without a device error.
    pub presented: bool,
    pub context_lost: bool,
    pub draw_calls: usize,
    pub drawn: Vec<Drawable>,
    /// Drawables whose program was ready but whose mesh was not.
    pub skipped: Vec<Drawable>,
    pub errors: Vec<RenderError>,
}

impl FrameReport {
    pub fn is_clean(&self) -> bool {
        self.presented && self.errors.is_empty() && self.skipped.is_empty()
    }
}

/// Orbiting cubes around one axis; orbital `i` sits `i·π/2` ahead of the first.
#[derive(Clone, Debug)]
pub struct OrbitalSet {
    axis: OrbitAxis,
    count: usize,
    meshes: SmallVec<[MeshId; 8]>,
}

impl OrbitalSet {
    pub fn new(axis: OrbitAxis, count: usize) -> Self {
        Self {
            axis,
            count,
            meshes: SmallVec::new(),
        }
    }

    pub fn axis(&self) -> OrbitAxis {
        self.axis
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn meshes(&self) -> &[MeshId] {
        &self.meshes
    }

    pub fn is_created(&self) -> bool {
        self.meshes.len() == self.count
    }

    pub fn angular_offset(index: usize) -> f64 {
        index as f64 * FRAC_PI_2
    }

    /// Point on the orbit circle. The X set circles in the YZ plane, the Y
    /// set in the XZ plane.
    pub fn position(&self, angle: f64, radius: f32) -> Vec3 {
        let (s, c) = angle.sin_cos();
        let (s, c) = (s as f32 * radius, c as f32 * radius);
        match self.axis {
            OrbitAxis::X => Vec3::new(0.0, s, c),
            OrbitAxis::Y => Vec3::new(s, 0.0, c),
        }
    }

    fn release<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G) {
        for mesh in self.meshes.drain(..) {
            gpu.delete_mesh(mesh);
        }
    }

    fn forget(&mut self) {
        self.meshes.clear();
    }
}

/// Which GPU objects currently exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneResources {
    pub scene_program: bool,
    pub sky_program: bool,
    pub central_mesh: bool,
    pub sky_mesh: bool,
    pub orbital_meshes: usize,
    pub noise_textures: usize,
    pub user_texture: bool,
}

impl SceneResources {
    pub fn any(&self) -> bool {
        self.scene_program
            || self.sky_program
            || self.central_mesh
            || self.sky_mesh
            || self.orbital_meshes > 0
            || self.noise_textures > 0
            || self.user_texture
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct NoiseTextureIds {
    perm: Option<TextureId>,
    simplex: Option<TextureId>,
    grad: Option<TextureId>,
}

impl NoiseTextureIds {
    fn count(&self) -> usize {
        [self.perm, self.simplex, self.grad]
            .iter()
            .filter(|t| t.is_some())
            .count()
    }
}

pub struct SceneRenderer {
    config: SceneConfig,
    params: ParameterReader,
    assets: Box<dyn AssetLoader + Send>,
    requests_tx: Sender<RenderRequest>,
    requests_rx: Receiver<RenderRequest>,

    scene_shader: ShaderManager,
    sky_shader: ShaderManager,

    clock: AnimationClock,
    orientation: DragOrientation,
    rotation: f32,
    bouncing: BouncingNumber,

    mesh_data: Option<MeshData>,
    central_mesh: Option<MeshId>,
    sky_mesh: Option<MeshId>,
    orbitals: [OrbitalSet; 2],

    noise: Option<NoiseTextures>,
    noise_ids: NoiseTextureIds,
    texture_source: Option<TextureSource>,
    texture_buffer: TextureBuffer,
    texture_refresh: TextureRefresh,
    texture_dirty: bool,
    user_texture: Option<(TextureId, u32, u32)>,

    warned: FnvHashSet<String>,
}

impl SceneRenderer {
    pub fn new(config: SceneConfig, params: ParameterReader) -> Self {
        Self::with_assets(config, params, Box::new(BuiltinAssets))
    }

    pub fn with_assets(
        config: SceneConfig,
        params: ParameterReader,
        assets: Box<dyn AssetLoader + Send>,
    ) -> Self {
        let (requests_tx, requests_rx) = mpsc::channel();
        let count = config.orbital_count;
        Self {
            config,
            params,
            assets,
            requests_tx,
            requests_rx,
            scene_shader: ShaderManager::new("scene"),
            sky_shader: ShaderManager::new("sky"),
            clock: AnimationClock::new(),
            orientation: DragOrientation::new(),
            rotation: 0.0,
            bouncing: BouncingNumber::new(),
            mesh_data: None,
            central_mesh: None,
            sky_mesh: None,
            orbitals: [
                OrbitalSet::new(OrbitAxis::X, count),
                OrbitalSet::new(OrbitAxis::Y, count),
            ],
            noise: None,
            noise_ids: NoiseTextureIds::default(),
            texture_source: None,
            texture_buffer: TextureBuffer::new(1, 1),
            texture_refresh: TextureRefresh::Static,
            texture_dirty: false,
            user_texture: None,
            warned: FnvHashSet::default(),
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn request_sender(&self) -> RenderRequestSender {
        RenderRequestSender {
            tx: self.requests_tx.clone(),
        }
    }

    pub fn set_shaders(&mut self, vertex: impl Into<String>, fragment: impl Into<String>) {
        self.scene_shader.request(vertex, fragment);
    }

    pub fn set_sky_shaders(&mut self, vertex: impl Into<String>, fragment: impl Into<String>) {
        self.sky_shader.request(vertex, fragment);
    }

    pub fn set_texture(&mut self, source: TextureSource) {
        log::info!("texture: {}", source.name());
        self.texture_source = Some(source);
        self.texture_dirty = true;
    }

    pub fn start_playing(&mut self) {
        self.clock.start_playing();
    }

    pub fn stop_playing(&mut self) {
        self.clock.stop_playing();
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn orientation(&self) -> &DragOrientation {
        &self.orientation
    }

    pub fn orientation_mut(&mut self) -> &mut DragOrientation {
        &mut self.orientation
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scene_shader(&self) -> &ShaderManager {
        &self.scene_shader
    }

    pub fn sky_shader(&self) -> &ShaderManager {
        &self.sky_shader
    }

    pub fn orbitals(&self) -> &[OrbitalSet; 2] {
        &self.orbitals
    }

    /// Status line: the first shader error, else the scene shader's status.
    pub fn status_text(&self) -> String {
        if let Some(err) = self.scene_shader.last_error() {
            return err.to_string();
        }
        if let Some(err) = self.sky_shader.last_error() {
            return format!("sky: {err}");
        }
        self.scene_shader.status().to_string()
    }

    pub fn resources(&self) -> SceneResources {
        SceneResources {
            scene_program: self.scene_shader.current_program().is_some(),
            sky_program: self.sky_shader.current_program().is_some(),
            central_mesh: self.central_mesh.is_some(),
            sky_mesh: self.sky_mesh.is_some(),
            orbital_meshes: self.orbitals.iter().map(|s| s.meshes().len()).sum(),
            noise_textures: self.noise_ids.count(),
            user_texture: self.user_texture.is_some(),
        }
    }

    /// The graphics context is gone: forget every handle without touching
    /// the GPU. Everything is rebuilt lazily by the next frame.
    pub fn on_context_lost(&mut self) {
        log::info!("graphics context lost; dropping GPU handles");
        self.forget_gpu_handles();
    }

    /// A fresh context is current. Handles from any earlier context are
    /// meaningless here, so they are forgotten and the next frame rebuilds
    /// everything from the last working shaders.
    pub fn on_context_created(&mut self) {
        log::info!("graphics context created");
        self.forget_gpu_handles();
    }

    fn forget_gpu_handles(&mut self) {
        self.central_mesh = None;
        self.sky_mesh = None;
        for set in self.orbitals.iter_mut() {
            set.forget();
        }
        self.scene_shader.invalidate();
        self.sky_shader.invalidate();
        self.noise_ids = NoiseTextureIds::default();
        self.user_texture = None;
        self.texture_dirty = self.texture_source.is_some();
    }

    /// Destroys every GPU object while the context is still usable, in the
    /// order meshes, programs, textures.
    pub fn release_gpu_resources<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G) {
        self.release_scene_meshes(gpu);
        if let Some(mesh) = self.sky_mesh.take() {
            gpu.delete_mesh(mesh);
        }

        self.scene_shader.release(gpu);
        self.sky_shader.release(gpu);
        self.scene_shader.invalidate();
        self.sky_shader.invalidate();

        if let Some((texture, _, _)) = self.user_texture.take() {
            gpu.delete_texture(texture);
        }
        let ids = std::mem::take(&mut self.noise_ids);
        for texture in [ids.perm, ids.simplex, ids.grad].into_iter().flatten() {
            gpu.delete_texture(texture);
        }
        self.texture_dirty = self.texture_source.is_some();
        log::debug!("released GPU resources");
    }

    fn release_scene_meshes<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G) {
        if let Some(mesh) = self.central_mesh.take() {
            gpu.delete_mesh(mesh);
        }
        for set in self.orbitals.iter_mut() {
            set.release(gpu);
        }
    }

    fn drain_requests(&mut self) {
        while let Ok(request) = self.requests_rx.try_recv() {
            match request {
                RenderRequest::SetShaders { vertex, fragment } => self.set_shaders(vertex, fragment),
                RenderRequest::SetSkyShaders { vertex, fragment } => {
                    self.set_sky_shaders(vertex, fragment)
                }
                RenderRequest::SetTexture(source) => self.set_texture(source),
                RenderRequest::PlaybackStarted => self.start_playing(),
                RenderRequest::PlaybackStopped => self.stop_playing(),
            }
        }
    }

    fn warn_once(&mut self, key: &str, message: &str) {
        if self.warned.insert(key.to_string()) {
            log::warn!("{message}");
        } else {
            log::debug!("{message}");
        }
    }

    /// Runs one frame. Never panics on GPU or asset failures.
    pub fn render_frame<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        input: FrameInput,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        self.drain_requests();
        let params = self.params.latest();

        match self.frame(gpu, &input, &params, &mut report) {
            Ok(()) => report.presented = true,
            Err(GpuError::ContextLost) => {
                self.on_context_lost();
                report.context_lost = true;
                report.errors.push(RenderError::ContextLost);
            }
            Err(e) => {
                let error = RenderError::Backend(e);
                log::warn!("{error}");
                report.errors.push(error);
            }
        }
        report
    }

    fn frame<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        input: &FrameInput,
        params: &RenderParameters,
        report: &mut FrameReport,
    ) -> Result<(), GpuError> {
        let bg = angle_to_rgb(params.bg_hue, BG_SATURATION, BG_VALUE);
        gpu.begin_frame(input.viewport, [bg.x, bg.y, bg.z, 1.0])?;
        self.orientation
            .set_viewport(input.viewport.width, input.viewport.height);

        self.ensure_textures(gpu, input.now_ms, report)?;
        self.compile_shaders(gpu, report);
        self.ensure_meshes(gpu, report)?;

        let bpm = f64::from(params.bpm);
        self.clock.advance(input.dt, bpm);
        if params.do_scale_bounce {
            self.clock.advance_bounce(input.dt, bpm);
        }

        let view = view_matrix();
        let aspect = input.viewport.aspect();
        self.bind_textures(gpu);

        if self.config.sky_enabled {
            self.draw_sky(gpu, params, &view, aspect, report);
        }
        self.draw_central(gpu, params, &view, aspect, input.now_ms, report);
        if self.config.orbitals_enabled {
            self.draw_orbitals(gpu, params, &view, aspect, input.now_ms, report);
        }

        if !self.orientation.is_dragging() {
            self.rotation += params.rotation_speed;
        }

        gpu.end_frame()
    }

    fn ensure_textures<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        now_ms: f64,
        report: &mut FrameReport,
    ) -> Result<(), GpuError> {
        let noise = self.noise.get_or_insert_with(NoiseTextures::generate);
        let slots = [
            (&mut self.noise_ids.perm, &noise.perm_gradient, "permTexture"),
            (&mut self.noise_ids.simplex, &noise.simplex, "simplexTexture"),
            (&mut self.noise_ids.grad, &noise.gradient4, "gradTexture"),
        ];
        for (slot, image, name) in slots {
            if slot.is_none() {
                *slot = upload_texture(gpu, image, name, report)?;
            }
        }

        let Some(source) = self.texture_source.as_mut() else {
            return Ok(());
        };
        let wanted = self.texture_dirty
            || self.user_texture.is_none()
            || self.texture_refresh == TextureRefresh::EveryFrame;
        if !wanted {
            return Ok(());
        }
        self.texture_refresh = source.render(now_ms, &mut self.texture_buffer);
        self.texture_dirty = false;

        let image = &self.texture_buffer;
        let current = self.user_texture;
        match current {
            Some((id, w, h)) if w == image.width && h == image.height => {
                match gpu.update_texture(id, image) {
                    Ok(()) => {}
                    Err(GpuError::ContextLost) => return Err(GpuError::ContextLost),
                    Err(err) => report.errors.push(
                        AssetLoadError::Upload {
                            name: "textureSampler".to_string(),
                            source: err,
                        }
                        .into(),
                    ),
                }
            }
            previous => {
                if let Some((old, _, _)) = previous {
                    gpu.delete_texture(old);
                }
                self.user_texture = upload_texture(gpu, image, "textureSampler", report)?
                    .map(|id| (id, image.width, image.height));
            }
        }
        Ok(())
    }

    fn compile_shaders<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G, report: &mut FrameReport) {
        let central = &mut self.central_mesh;
        let orbitals = &mut self.orbitals;
        let scene = self.scene_shader.compile_pending(gpu, |g| {
            if let Some(mesh) = central.take() {
                g.delete_mesh(mesh);
            }
            for set in orbitals.iter_mut() {
                set.release(g);
            }
        });
        if let Some(Err(e)) = scene {
            report.errors.push(e.into());
        }

        let sky_mesh = &mut self.sky_mesh;
        let sky = self.sky_shader.compile_pending(gpu, |g| {
            if let Some(mesh) = sky_mesh.take() {
                g.delete_mesh(mesh);
            }
        });
        if let Some(Err(e)) = sky {
            report.errors.push(e.into());
        }
    }

    fn load_mesh_data(&mut self) -> Result<MeshData, AssetLoadError> {
        if let Some(data) = &self.mesh_data {
            return Ok(data.clone());
        }
        let data = self.assets.load_mesh(MESH_ASSET)?;
        data.validate(MESH_ASSET)?;
        self.mesh_data = Some(data.clone());
        Ok(data)
    }

    fn ensure_meshes<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        report: &mut FrameReport,
    ) -> Result<(), GpuError> {
        let scene_ready = self.scene_shader.current_program().is_some();
        let sky_ready = self.config.sky_enabled && self.sky_shader.current_program().is_some();
        let need_central = scene_ready && self.central_mesh.is_none();
        let need_orbitals = scene_ready
            && self.config.orbitals_enabled
            && self.orbitals.iter().any(|s| !s.is_created());
        let need_sky = sky_ready && self.sky_mesh.is_none();
        if !(need_central || need_orbitals || need_sky) {
            return Ok(());
        }

        let data = match self.load_mesh_data() {
            Ok(data) => data,
            Err(e) => {
                self.warn_once(MESH_ASSET, &format!("mesh unavailable, drawables skipped: {e}"));
                report.errors.push(e.into());
                return Ok(());
            }
        };

        if need_central {
            self.central_mesh = upload_mesh(gpu, &data, report)?;
        }
        if need_orbitals {
            for set in self.orbitals.iter_mut() {
                while set.meshes.len() < set.count {
                    match upload_mesh(gpu, &data, report)? {
                        Some(mesh) => set.meshes.push(mesh),
                        None => break,
                    }
                }
            }
        }
        if need_sky {
            self.sky_mesh = upload_mesh(gpu, &data, report)?;
        }
        Ok(())
    }

    fn bind_textures<G: GpuBackend + ?Sized>(&self, gpu: &mut G) {
        let units = [
            (UNIT_USER_TEXTURE, self.user_texture.map(|(id, _, _)| id)),
            (UNIT_PERM_TEXTURE, self.noise_ids.perm),
            (UNIT_SIMPLEX_TEXTURE, self.noise_ids.simplex),
            (UNIT_GRAD_TEXTURE, self.noise_ids.grad),
        ];
        for (unit, texture) in units {
            if let Some(texture) = texture {
                gpu.bind_texture(unit, texture);
            }
        }
    }

    fn draw_sky<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        params: &RenderParameters,
        view: &Mat4,
        aspect: f32,
        report: &mut FrameReport,
    ) {
        let Some(bindings) = self.sky_shader.bindings().cloned() else {
            return;
        };
        let Some(mesh) = self.sky_mesh else {
            report.skipped.push(Drawable::Sky);
            return;
        };
        let projection = compute_projection(params.scale, aspect, self.config.sky_near_plane);
        let model = Mat4::from_translation(eye_vec3()) * Mat4::from_scale(Vec3::splat(SKY_BOX_SIZE));

        gpu.use_program(bindings.program());
        gpu.set_depth_write(false);
        set_camera(gpu, &bindings, view, &projection.to_matrix());
        bindings.set(gpu, Uniform::ModelMatrix, UniformValue::Mat4(to_render_matrix4(&model)));
        bindings.set(gpu, Uniform::Looper, UniformValue::Float(self.clock.phase() as f32));
        set_samplers(gpu, &bindings);
        gpu.draw_mesh(mesh);
        gpu.set_depth_write(true);

        report.draw_calls += 1;
        report.drawn.push(Drawable::Sky);
    }

    fn draw_central<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        params: &RenderParameters,
        view: &Mat4,
        aspect: f32,
        now_ms: f64,
        report: &mut FrameReport,
    ) {
        let Some(bindings) = self.scene_shader.bindings().cloned() else {
            return;
        };
        let Some(mesh) = self.central_mesh else {
            report.skipped.push(Drawable::Central);
            return;
        };
        let projection = compute_projection(params.scale, aspect, self.config.central_near_plane);
        let model = central_model_matrix(
            self.rotation,
            &self.orientation.rotation_matrix(),
            self.clock.bounce_scale(),
        );
        let normal = match compute_normal_matrix(&model) {
            Ok(n) => n,
            Err(e) => {
                self.warn_once("degenerate", &format!("{e}; using identity normal matrix"));
                report.errors.push(e.into());
                glam::Mat3::IDENTITY
            }
        };

        gpu.use_program(bindings.program());
        gpu.set_depth_write(true);
        set_camera(gpu, &bindings, view, &projection.to_matrix());
        self.set_shading(gpu, &bindings, params, now_ms);
        bindings.set(gpu, Uniform::ModelMatrix, UniformValue::Mat4(to_render_matrix4(&model)));
        bindings.set(gpu, Uniform::NormalMatrix, UniformValue::Mat3(normal_matrix_to_array(&normal)));
        gpu.draw_mesh(mesh);

        report.draw_calls += 1;
        report.drawn.push(Drawable::Central);
    }

    fn draw_orbitals<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        params: &RenderParameters,
        view: &Mat4,
        aspect: f32,
        now_ms: f64,
        report: &mut FrameReport,
    ) {
        let Some(bindings) = self.scene_shader.bindings().cloned() else {
            return;
        };
        let projection = compute_projection(params.scale, aspect, self.config.central_near_plane);
        let radius = ORBIT_RADIUS + self.clock.wiggle_offset(params.wiggle_speed);
        let spin = beat_rotation(self.rotation);
        let scale = Mat4::from_scale(Vec3::splat(ORBITAL_SCALE));

        gpu.use_program(bindings.program());
        set_camera(gpu, &bindings, view, &projection.to_matrix());
        self.set_shading(gpu, &bindings, params, now_ms);

        for set in self.orbitals.iter() {
            for index in 0..set.len() {
                let Some(&mesh) = set.meshes().get(index) else {
                    report.skipped.push(Drawable::Orbital(set.axis(), index));
                    continue;
                };
                let position = set.position(self.clock.orbit_angle(index), radius);
                let model = Mat4::from_translation(position) * spin * scale;
                // Uniform scale and a rotation: never singular.
                let normal = compute_normal_matrix(&model).unwrap_or(glam::Mat3::IDENTITY);
                bindings.set(gpu, Uniform::ModelMatrix, UniformValue::Mat4(to_render_matrix4(&model)));
                bindings.set(
                    gpu,
                    Uniform::NormalMatrix,
                    UniformValue::Mat3(normal_matrix_to_array(&normal)),
                );
                gpu.draw_mesh(mesh);
                report.draw_calls += 1;
                report.drawn.push(Drawable::Orbital(set.axis(), index));
            }
        }
    }

    fn set_shading<G: GpuBackend + ?Sized>(
        &self,
        gpu: &mut G,
        bindings: &ProgramBindings,
        params: &RenderParameters,
        now_ms: f64,
    ) {
        let color = angle_to_rgb(phase_to_hue(self.clock.phase()), params.color_sat, params.color_val);
        bindings.set(gpu, Uniform::EyePosition, UniformValue::Vec3(eye_vec3().to_array()));
        bindings.set(gpu, Uniform::LightPosition, UniformValue::Vec3(light_vec3().to_array()));
        bindings.set(gpu, Uniform::UserColor, UniformValue::Vec3(color.to_array()));
        bindings.set(gpu, Uniform::Looper, UniformValue::Float(self.clock.phase() as f32));
        bindings.set(gpu, Uniform::BouncingNumber, UniformValue::Float(self.bouncing.value(now_ms)));
        set_samplers(gpu, bindings);
    }
}

fn set_camera<G: GpuBackend + ?Sized>(
    gpu: &mut G,
    bindings: &ProgramBindings,
    view: &Mat4,
    projection: &Mat4,
) {
    bindings.set(gpu, Uniform::ViewMatrix, UniformValue::Mat4(to_render_matrix4(view)));
    bindings.set(gpu, Uniform::ProjectionMatrix, UniformValue::Mat4(to_render_matrix4(projection)));
}

fn set_samplers<G: GpuBackend + ?Sized>(gpu: &mut G, bindings: &ProgramBindings) {
    bindings.set(gpu, Uniform::TextureSampler, UniformValue::Sampler(UNIT_USER_TEXTURE));
    bindings.set(gpu, Uniform::PermTexture, UniformValue::Sampler(UNIT_PERM_TEXTURE));
    bindings.set(gpu, Uniform::SimplexTexture, UniformValue::Sampler(UNIT_SIMPLEX_TEXTURE));
    bindings.set(gpu, Uniform::GradTexture, UniformValue::Sampler(UNIT_GRAD_TEXTURE));
}

/// `Err` only for a lost context; other failures are reported and yield `None`.
fn upload_mesh<G: GpuBackend + ?Sized>(
    gpu: &mut G,
    data: &MeshData,
    report: &mut FrameReport,
) -> Result<Option<MeshId>, GpuError> {
    match gpu.create_mesh(data) {
        Ok(mesh) => Ok(Some(mesh)),
        Err(GpuError::ContextLost) => Err(GpuError::ContextLost),
        Err(source) => {
            report.errors.push(
                AssetLoadError::Upload {
                    name: MESH_ASSET.to_string(),
                    source,
                }
                .into(),
            );
            Ok(None)
        }
    }
}

fn upload_texture<G: GpuBackend + ?Sized>(
    gpu: &mut G,
    image: &TextureBuffer,
    name: &str,
    report: &mut FrameReport,
) -> Result<Option<TextureId>, GpuError> {
    match gpu.create_texture(image) {
        Ok(texture) => Ok(Some(texture)),
        Err(GpuError::ContextLost) => Err(GpuError::ContextLost),
        Err(source) => {
            report.errors.push(
                AssetLoadError::Upload {
                    name: name.to_string(),
                    source,
                }
                .into(),
            );
            Ok(None)
        }
    }
}
