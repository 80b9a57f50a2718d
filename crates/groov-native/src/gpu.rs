//! wgpu implementation of the core's immediate-mode [`GpuBackend`].
//!
//! Calls between `begin_frame` and `end_frame` are recorded: every draw
//! snapshots the current program's uniform block into a ring buffer (one
//! 512-byte slot per draw, bound with a dynamic offset) together with the
//! textures bound to units 0..3. `end_frame` replays the list in a single
//! render pass and presents.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fnv::FnvHashMap;
use wgpu::util::DeviceExt;
use winit::window::Window;

use groov_core::{
    AttributeLocation, GpuBackend, GpuError, MeshData, MeshId, ProgramId, TextureBuffer,
    TextureDimension, TextureId, UniformLocation, UniformValue, Vertex, Viewport,
};

use crate::reflect::{
    ProgramLayout, UniformKind, FIRST_TEXTURE_BINDING, SAMPLER_BINDING, TEXTURE_UNITS,
    UNIFORM_BINDING, UNIFORM_SLOT_SIZE,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// View dimension expected at each texture unit.
const UNIT_DIMENSIONS: [wgpu::TextureViewDimension; TEXTURE_UNITS as usize] = [
    wgpu::TextureViewDimension::D2,
    wgpu::TextureViewDimension::D2,
    wgpu::TextureViewDimension::D1,
    wgpu::TextureViewDimension::D2,
];

struct Program {
    layout: ProgramLayout,
    /// Indexed by depth-write enabled.
    pipelines: [wgpu::RenderPipeline; 2],
    staging: Vec<u8>,
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    dimension: wgpu::TextureViewDimension,
}

struct Placeholders {
    d1: wgpu::TextureView,
    d2: wgpu::TextureView,
}

struct DrawCmd {
    program: u32,
    depth_write: bool,
    mesh: u32,
    uniform_offset: u32,
    textures: TextureSet,
}

type TextureSet = [Option<u32>; TEXTURE_UNITS as usize];

struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    clear: wgpu::Color,
    draws: Vec<DrawCmd>,
    uniforms: Vec<u8>,
}

pub struct WgpuBackend<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    placeholders: Placeholders,
    uniform_ring: wgpu::Buffer,
    bind_groups: FnvHashMap<TextureSet, wgpu::BindGroup>,

    programs: FnvHashMap<u32, Program>,
    meshes: FnvHashMap<u32, GpuMesh>,
    textures: FnvHashMap<u32, GpuTexture>,
    next_id: u32,

    current: Option<u32>,
    depth_write: bool,
    bound: TextureSet,
    frame: Option<Frame>,
    lost: Arc<AtomicBool>,
}

impl<'w> WgpuBackend<'w> {
    pub async fn new(window: &'w Window) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;
        log::info!("adapter: {:?}", adapter.get_info());

        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            log::warn!("device lost ({reason:?}): {message}");
            flag.store(true, Ordering::Release);
        });
        device.on_uncaptured_error(Box::new(|err| {
            log::error!("uncaptured wgpu error: {err}");
        }));

        let caps = surface.get_capabilities(&adapter);
        // Colours are computed for direct output, so prefer a non-sRGB target.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, &config);

        let bind_group_layout = create_bind_group_layout(&device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("groov"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nearest-repeat"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let placeholders = Placeholders {
            d1: create_placeholder(&device, &queue, wgpu::TextureDimension::D1),
            d2: create_placeholder(&device, &queue, wgpu::TextureDimension::D2),
        };
        let uniform_ring = create_ring(&device, u64::from(UNIFORM_SLOT_SIZE) * 16);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            bind_group_layout,
            pipeline_layout,
            sampler,
            placeholders,
            uniform_ring,
            bind_groups: FnvHashMap::default(),
            programs: FnvHashMap::default(),
            meshes: FnvHashMap::default(),
            textures: FnvHashMap::default(),
            next_id: 0,
            current: None,
            depth_write: true,
            bound: [None; TEXTURE_UNITS as usize],
            frame: None,
            lost,
        })
    }

    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn create_pipeline(
        &self,
        layout: &ProgramLayout,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        depth_write: bool,
    ) -> wgpu::RenderPipeline {
        let attributes: Vec<wgpu::VertexAttribute> = layout
            .inputs
            .iter()
            .map(|input| wgpu::VertexAttribute {
                format: input.format,
                offset: input.offset,
                shader_location: input.location,
            })
            .collect();
        let buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(if depth_write { "depth-write" } else { "depth-read" }),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some(layout.vertex_entry.as_str()),
                    buffers: &buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some(layout.fragment_entry.as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                cache: None,
                multiview: None,
            })
    }

    fn bind_group(&mut self, set: TextureSet) -> &wgpu::BindGroup {
        let Self {
            bind_groups,
            device,
            bind_group_layout,
            uniform_ring,
            sampler,
            textures,
            placeholders,
            ..
        } = self;
        bind_groups.entry(set).or_insert_with(|| {
            let views: Vec<&wgpu::TextureView> = set
                .iter()
                .zip(UNIT_DIMENSIONS)
                .map(|(id, dim)| {
                    id.and_then(|id| textures.get(&id))
                        .filter(|t| t.dimension == dim)
                        .map(|t| &t.view)
                        .unwrap_or(match dim {
                            wgpu::TextureViewDimension::D1 => &placeholders.d1,
                            _ => &placeholders.d2,
                        })
                })
                .collect();
            let mut entries = vec![
                wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: uniform_ring,
                        offset: 0,
                        size: wgpu::BufferSize::new(u64::from(UNIFORM_SLOT_SIZE)),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ];
            for (unit, view) in views.into_iter().enumerate() {
                entries.push(wgpu::BindGroupEntry {
                    binding: FIRST_TEXTURE_BINDING + unit as u32,
                    resource: wgpu::BindingResource::TextureView(view),
                });
            }
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("groov"),
                layout: bind_group_layout,
                entries: &entries,
            })
        })
    }

    fn ensure_ring_capacity(&mut self, bytes: u64) {
        if bytes <= self.uniform_ring.size() {
            return;
        }
        let size = bytes.next_power_of_two();
        log::debug!("growing uniform ring to {size} bytes");
        self.uniform_ring = create_ring(&self.device, size);
        self.bind_groups.clear();
    }
}

impl GpuBackend for WgpuBackend<'_> {
    fn language_version(&self) -> String {
        "WGSL".to_string()
    }

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, GpuError> {
        let layout = ProgramLayout::link(vertex, fragment)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vs = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("vertex"),
                source: wgpu::ShaderSource::Wgsl(vertex.into()),
            });
        let fs = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("fragment"),
                source: wgpu::ShaderSource::Wgsl(fragment.into()),
            });
        let pipelines = [false, true].map(|depth_write| self.create_pipeline(&layout, &vs, &fs, depth_write));
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::Compile(err.to_string()));
        }

        let id = self.next();
        let staging = vec![0; layout.block_size as usize];
        self.programs.insert(
            id,
            Program {
                layout,
                pipelines,
                staging,
            },
        );
        Ok(ProgramId(id))
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program.0);
        if self.current == Some(program.0) {
            self.current = None;
        }
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation> {
        let index = self.programs.get(&program.0)?.layout.attribute_index(name)?;
        Some(AttributeLocation {
            program,
            index: index as u32,
        })
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let index = self.programs.get(&program.0)?.layout.uniform_index(name)?;
        Some(UniformLocation {
            program,
            index: index as u32,
        })
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> Result<MeshId, GpuError> {
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(GpuError::Resource("empty mesh".to_string()));
        }
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertices"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("indices"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let id = self.next();
        self.meshes.insert(
            id,
            GpuMesh {
                vertices,
                indices,
                index_count: mesh.indices.len() as u32,
            },
        );
        Ok(MeshId(id))
    }

    fn delete_mesh(&mut self, mesh: MeshId) {
        if let Some(m) = self.meshes.remove(&mesh.0) {
            m.vertices.destroy();
            m.indices.destroy();
        }
    }

    fn create_texture(&mut self, image: &TextureBuffer) -> Result<TextureId, GpuError> {
        let limits = self.device.limits();
        let (dimension, view_dimension, max) = match image.dimension {
            TextureDimension::D1 => (
                wgpu::TextureDimension::D1,
                wgpu::TextureViewDimension::D1,
                limits.max_texture_dimension_1d,
            ),
            TextureDimension::D2 => (
                wgpu::TextureDimension::D2,
                wgpu::TextureViewDimension::D2,
                limits.max_texture_dimension_2d,
            ),
        };
        if image.width == 0 || image.height == 0 || image.width > max || image.height > max {
            return Err(GpuError::Resource(format!(
                "texture size {}x{} not supported",
                image.width, image.height
            )));
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("texture"),
            size: extent(image),
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_texture(&self.queue, &texture, image);
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(view_dimension),
            ..Default::default()
        });
        let id = self.next();
        self.textures.insert(
            id,
            GpuTexture {
                texture,
                view,
                width: image.width,
                height: image.height,
                dimension: view_dimension,
            },
        );
        Ok(TextureId(id))
    }

    fn update_texture(&mut self, texture: TextureId, image: &TextureBuffer) -> Result<(), GpuError> {
        let Some(t) = self.textures.get(&texture.0) else {
            return Err(GpuError::Resource(format!("unknown texture {}", texture.0)));
        };
        if (t.width, t.height) != (image.width, image.height) {
            return Err(GpuError::Resource(format!(
                "texture is {}x{}, image is {}x{}",
                t.width, t.height, image.width, image.height
            )));
        }
        write_texture(&self.queue, &t.texture, image);
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(t) = self.textures.remove(&texture.0) {
            t.texture.destroy();
            self.bind_groups.retain(|set, _| !set.contains(&Some(texture.0)));
        }
        for unit in self.bound.iter_mut() {
            if *unit == Some(texture.0) {
                *unit = None;
            }
        }
    }

    fn begin_frame(&mut self, viewport: Viewport, clear_color: [f32; 4]) -> Result<(), GpuError> {
        if self.is_lost() {
            return Err(GpuError::ContextLost);
        }
        if viewport.width == 0 || viewport.height == 0 {
            return Err(GpuError::Resource("surface has zero size".to_string()));
        }
        self.resize(viewport.width, viewport.height);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.surface
                    .get_current_texture()
                    .map_err(|e| GpuError::Resource(e.to_string()))?
            }
            Err(e) => return Err(GpuError::Resource(e.to_string())),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let [r, g, b, a] = clear_color.map(f64::from);
        self.frame = Some(Frame {
            surface_texture,
            view,
            clear: wgpu::Color { r, g, b, a },
            draws: Vec::new(),
            uniforms: Vec::new(),
        });
        self.depth_write = true;
        Ok(())
    }

    fn use_program(&mut self, program: ProgramId) {
        if self.programs.contains_key(&program.0) {
            self.current = Some(program.0);
        }
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(program) = self.programs.get_mut(&location.program.0) else {
            return;
        };
        let Some(slot) = program.layout.uniforms.get(location.index as usize) else {
            return;
        };
        let offset = slot.offset as usize;
        let staging = &mut program.staging;
        match (slot.kind, value) {
            (UniformKind::Mat4, UniformValue::Mat4(m)) => write_floats(staging, offset, &m),
            (UniformKind::Mat3, UniformValue::Mat3(m)) => {
                // Columns of a uniform mat3x3 are 16 bytes apart.
                for (c, column) in m.chunks_exact(3).enumerate() {
                    write_floats(staging, offset + c * 16, column);
                }
            }
            (UniformKind::Vec3, UniformValue::Vec3(v)) => write_floats(staging, offset, &v),
            (UniformKind::Float, UniformValue::Float(f)) => write_floats(staging, offset, &[f]),
            (UniformKind::Texture { binding }, UniformValue::Sampler(unit)) => {
                if binding != FIRST_TEXTURE_BINDING + unit {
                    log::debug!(
                        "'{}' is fixed to unit {}, ignoring unit {unit}",
                        slot.name,
                        binding - FIRST_TEXTURE_BINDING
                    );
                }
            }
            (kind, value) => log::debug!("'{}' is {kind:?}, got {value:?}", slot.name),
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        if let Some(slot) = self.bound.get_mut(unit as usize) {
            *slot = Some(texture.0);
        }
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn draw_mesh(&mut self, mesh: MeshId) {
        let (Some(frame), Some(current)) = (self.frame.as_mut(), self.current) else {
            return;
        };
        let Some(program) = self.programs.get(&current) else {
            return;
        };
        if !self.meshes.contains_key(&mesh.0) {
            return;
        }
        let uniform_offset = frame.uniforms.len() as u32;
        frame.uniforms.extend_from_slice(&program.staging);
        frame
            .uniforms
            .resize(uniform_offset as usize + UNIFORM_SLOT_SIZE as usize, 0);
        frame.draws.push(DrawCmd {
            program: current,
            depth_write: self.depth_write,
            mesh: mesh.0,
            uniform_offset,
            textures: self.bound,
        });
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        if self.is_lost() {
            return Err(GpuError::ContextLost);
        }

        self.ensure_ring_capacity(frame.uniforms.len() as u64);
        if !frame.uniforms.is_empty() {
            self.queue.write_buffer(&self.uniform_ring, 0, &frame.uniforms);
        }
        for draw in &frame.draws {
            self.bind_group(draw.textures);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            for draw in &frame.draws {
                let (Some(program), Some(mesh), Some(bind_group)) = (
                    self.programs.get(&draw.program),
                    self.meshes.get(&draw.mesh),
                    self.bind_groups.get(&draw.textures),
                ) else {
                    continue;
                };
                rpass.set_pipeline(&program.pipelines[usize::from(draw.depth_write)]);
                rpass.set_bind_group(0, bind_group, &[draw.uniform_offset]);
                rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
                rpass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        frame.surface_texture.present();

        if self.is_lost() {
            return Err(GpuError::ContextLost);
        }
        Ok(())
    }
}

fn write_floats(staging: &mut [u8], offset: usize, values: &[f32]) {
    let bytes: &[u8] = bytemuck::cast_slice(values);
    if let Some(dst) = staging.get_mut(offset..offset + bytes.len()) {
        dst.copy_from_slice(bytes);
    }
}

fn extent(image: &TextureBuffer) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    }
}

fn write_texture(queue: &wgpu::Queue, texture: &wgpu::Texture, image: &TextureBuffer) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        extent(image),
    );
}

fn create_ring(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("uniform ring"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("depth"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_placeholder(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    dimension: wgpu::TextureDimension,
) -> wgpu::TextureView {
    let image = TextureBuffer {
        width: 1,
        height: 1,
        dimension: match dimension {
            wgpu::TextureDimension::D1 => TextureDimension::D1,
            _ => TextureDimension::D2,
        },
        pixels: vec![255; 4],
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("placeholder"),
        size: extent(&image),
        mip_level_count: 1,
        sample_count: 1,
        dimension,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_texture(queue, &texture, &image);
    texture.create_view(&wgpu::TextureViewDescriptor {
        dimension: Some(match dimension {
            wgpu::TextureDimension::D1 => wgpu::TextureViewDimension::D1,
            _ => wgpu::TextureViewDimension::D2,
        }),
        ..Default::default()
    })
}

fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        wgpu::BindGroupLayoutEntry {
            binding: UNIFORM_BINDING,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: None,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ];
    for (unit, view_dimension) in UNIT_DIMENSIONS.into_iter().enumerate() {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: FIRST_TEXTURE_BINDING + unit as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension,
                multisampled: false,
            },
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("groov"),
        entries: &entries,
    })
}
