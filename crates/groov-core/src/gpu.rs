//! The seam between the render core and a graphics API.
//!
//! The core never talks to a GPU directly. It drives a [`GpuBackend`] with a
//! small, immediate-mode command set: compile a program, look up its inputs by
//! name, upload meshes and textures, then per frame set uniforms, bind
//! textures and draw. `groov-native` implements it on wgpu; the tests
//! implement it with a recorder.

use crate::error::GpuError;
use crate::mesh::MeshData;
use crate::texture::TextureBuffer;
use crate::transform::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Resolved vertex input of a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributeLocation {
    pub program: ProgramId,
    pub index: u32,
}

/// Resolved uniform of a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub program: ProgramId,
    pub index: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Mat4([f32; 16]),
    Mat3([f32; 9]),
    Vec3([f32; 3]),
    Float(f32),
    /// Texture unit a sampler reads from.
    Sampler(u32),
}

/// Immediate-mode graphics device.
///
/// Calls that create objects may fail; calls that use them are infallible and
/// quietly ignore stale ids. A backend that loses its device reports
/// [`GpuError::ContextLost`] from [`begin_frame`](Self::begin_frame) or
/// [`end_frame`](Self::end_frame).
pub trait GpuBackend {
    /// Human-readable shading language tag, e.g. `"WGSL"`.
    fn language_version(&self) -> String;

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, GpuError>;
    fn delete_program(&mut self, program: ProgramId);
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation>;
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn create_mesh(&mut self, mesh: &MeshData) -> Result<MeshId, GpuError>;
    fn delete_mesh(&mut self, mesh: MeshId);

    fn create_texture(&mut self, image: &TextureBuffer) -> Result<TextureId, GpuError>;
    fn update_texture(&mut self, texture: TextureId, image: &TextureBuffer) -> Result<(), GpuError>;
    fn delete_texture(&mut self, texture: TextureId);

    fn begin_frame(&mut self, viewport: Viewport, clear_color: [f32; 4]) -> Result<(), GpuError>;
    fn use_program(&mut self, program: ProgramId);
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);
    fn bind_texture(&mut self, unit: u32, texture: TextureId);
    fn set_depth_write(&mut self, enabled: bool);
    fn draw_mesh(&mut self, mesh: MeshId);
    fn end_frame(&mut self) -> Result<(), GpuError>;
}
