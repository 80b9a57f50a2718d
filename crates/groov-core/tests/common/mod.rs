// Test doubles shared by the integration tests: a GPU that records every
// call instead of drawing, and a scripted audio transport.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;

use groov_core::{
    AttributeLocation, AudioTransport, GpuBackend, GpuError, MeshData, MeshId, ProgramId,
    TextureBuffer, TextureId, TransportError, UniformLocation, UniformValue, Viewport,
};

/// Sources containing this marker fail to compile.
pub const COMPILE_ERROR_MARKER: &str = "#error";

pub const SCENE_VS: &str =
    "scene vs: position normal sourceColor textureCoordIn modelMatrix viewMatrix projectionMatrix normalMatrix";
pub const SCENE_FS: &str =
    "scene fs: lightPosition eyePosition userColor looper bouncingNumber textureSampler";
pub const SKY_VS: &str = "sky vs: position modelMatrix viewMatrix projectionMatrix";
pub const SKY_FS: &str = "sky fs: looper permTexture simplexTexture gradTexture";
pub const BROKEN_FS: &str = "#error: expected ';' at line 3";

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CompileProgram(ProgramId),
    CompileFailed,
    DeleteProgram(ProgramId),
    CreateMesh(MeshId),
    DeleteMesh(MeshId),
    CreateTexture(TextureId, u32, u32),
    UpdateTexture(TextureId),
    DeleteTexture(TextureId),
    BeginFrame,
    UseProgram(ProgramId),
    SetUniform(&'static str, UniformValue),
    BindTexture(u32, TextureId),
    DepthWrite(bool),
    Draw(MeshId),
    EndFrame,
}

const KNOWN_NAMES: [&str; 17] = [
    "position",
    "normal",
    "sourceColor",
    "textureCoordIn",
    "modelMatrix",
    "viewMatrix",
    "projectionMatrix",
    "normalMatrix",
    "eyePosition",
    "lightPosition",
    "userColor",
    "looper",
    "bouncingNumber",
    "textureSampler",
    "permTexture",
    "simplexTexture",
    "gradTexture",
];

/// Declares an input when its name appears anywhere in either source, the
/// way a GL driver reports active uniforms.
#[derive(Default)]
pub struct RecordingGpu {
    pub calls: Vec<Call>,
    next_id: u32,
    programs: HashMap<ProgramId, Vec<&'static str>>,
    pub live_meshes: HashSet<MeshId>,
    pub live_textures: HashSet<TextureId>,
    /// Uses of ids that were never created or already deleted.
    pub misuse: Vec<String>,
    /// Next `begin_frame` reports a lost device.
    pub lose_context: bool,
    pub fail_mesh_uploads: bool,
    /// Next `begin_frame` fails without losing the device.
    pub fail_next_frame: bool,
    current: Option<ProgramId>,
    in_frame: bool,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn draws(&self) -> Vec<MeshId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    pub fn position_of(&self, wanted: &Call) -> Option<usize> {
        self.calls.iter().position(|c| c == wanted)
    }

    /// Values set for `name`, in call order.
    pub fn uniform_values(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SetUniform(n, v) if *n == name => Some(*v),
                _ => None,
            })
            .collect()
    }

    /// Simulates the device going away: every object is gone.
    pub fn drop_device(&mut self) {
        self.programs.clear();
        self.live_meshes.clear();
        self.live_textures.clear();
        self.current = None;
        self.in_frame = false;
    }
}

impl GpuBackend for RecordingGpu {
    fn language_version(&self) -> String {
        "MOCK".to_string()
    }

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, GpuError> {
        if vertex.contains(COMPILE_ERROR_MARKER) || fragment.contains(COMPILE_ERROR_MARKER) {
            self.calls.push(Call::CompileFailed);
            let message = if fragment.contains(COMPILE_ERROR_MARKER) {
                fragment
            } else {
                vertex
            };
            return Err(GpuError::Compile(message.to_string()));
        }
        let id = ProgramId(self.next());
        let declared = KNOWN_NAMES
            .iter()
            .copied()
            .filter(|n| vertex.contains(n) || fragment.contains(n))
            .collect();
        self.programs.insert(id, declared);
        self.calls.push(Call::CompileProgram(id));
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_none() {
            self.misuse.push(format!("delete unknown {program:?}"));
        }
        self.calls.push(Call::DeleteProgram(program));
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation> {
        let names = self.programs.get(&program)?;
        let index = names.iter().position(|n| *n == name)?;
        Some(AttributeLocation {
            program,
            index: index as u32,
        })
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let names = self.programs.get(&program)?;
        let index = names.iter().position(|n| *n == name)?;
        Some(UniformLocation {
            program,
            index: index as u32,
        })
    }

    fn create_mesh(&mut self, _mesh: &MeshData) -> Result<MeshId, GpuError> {
        if self.fail_mesh_uploads {
            return Err(GpuError::Resource("out of memory".to_string()));
        }
        let id = MeshId(self.next());
        self.live_meshes.insert(id);
        self.calls.push(Call::CreateMesh(id));
        Ok(id)
    }

    fn delete_mesh(&mut self, mesh: MeshId) {
        if !self.live_meshes.remove(&mesh) {
            self.misuse.push(format!("delete unknown {mesh:?}"));
        }
        self.calls.push(Call::DeleteMesh(mesh));
    }

    fn create_texture(&mut self, image: &TextureBuffer) -> Result<TextureId, GpuError> {
        let id = TextureId(self.next());
        self.live_textures.insert(id);
        self.calls
            .push(Call::CreateTexture(id, image.width, image.height));
        Ok(id)
    }

    fn update_texture(&mut self, texture: TextureId, _image: &TextureBuffer) -> Result<(), GpuError> {
        if !self.live_textures.contains(&texture) {
            self.misuse.push(format!("update unknown {texture:?}"));
        }
        self.calls.push(Call::UpdateTexture(texture));
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if !self.live_textures.remove(&texture) {
            self.misuse.push(format!("delete unknown {texture:?}"));
        }
        self.calls.push(Call::DeleteTexture(texture));
    }

    fn begin_frame(&mut self, _viewport: Viewport, _clear_color: [f32; 4]) -> Result<(), GpuError> {
        if self.lose_context {
            self.lose_context = false;
            self.drop_device();
            return Err(GpuError::ContextLost);
        }
        if self.fail_next_frame {
            self.fail_next_frame = false;
            return Err(GpuError::Resource("surface outdated".to_string()));
        }
        self.in_frame = true;
        self.calls.push(Call::BeginFrame);
        Ok(())
    }

    fn use_program(&mut self, program: ProgramId) {
        if !self.programs.contains_key(&program) {
            self.misuse.push(format!("use unknown {program:?}"));
        }
        self.current = Some(program);
        self.calls.push(Call::UseProgram(program));
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        if Some(location.program) != self.current {
            self.misuse
                .push(format!("uniform for {:?} while another program is bound", location.program));
        }
        let name = self
            .programs
            .get(&location.program)
            .and_then(|names| names.get(location.index as usize).copied())
            .unwrap_or("?");
        self.calls.push(Call::SetUniform(name, value));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        if !self.live_textures.contains(&texture) {
            self.misuse.push(format!("bind unknown {texture:?}"));
        }
        self.calls.push(Call::BindTexture(unit, texture));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.calls.push(Call::DepthWrite(enabled));
    }

    fn draw_mesh(&mut self, mesh: MeshId) {
        if !self.in_frame {
            self.misuse.push("draw outside frame".to_string());
        }
        if !self.live_meshes.contains(&mesh) {
            self.misuse.push(format!("draw unknown {mesh:?}"));
        }
        self.calls.push(Call::Draw(mesh));
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        self.in_frame = false;
        self.calls.push(Call::EndFrame);
        Ok(())
    }
}

/// Transport whose "is playing" flag the test controls.
#[derive(Default)]
pub struct ScriptedTransport {
    pub opened: Vec<String>,
    pub playing: bool,
    pub fail_play: bool,
    /// `play` succeeds but the device never reports playing.
    pub silent_play: bool,
    pub starts: usize,
    pub stops: usize,
    pub rewinds: usize,
}

impl AudioTransport for ScriptedTransport {
    fn open(&mut self, path: &Path) -> Result<(), TransportError> {
        if path.extension().and_then(|e| e.to_str()) != Some("wav") {
            return Err(TransportError::Open {
                path: path.display().to_string(),
                reason: "unsupported format".to_string(),
            });
        }
        self.opened.push(path.display().to_string());
        Ok(())
    }

    fn play(&mut self) -> Result<(), TransportError> {
        if self.fail_play {
            return Err(TransportError::Device("no output device".to_string()));
        }
        self.starts += 1;
        self.playing = !self.silent_play;
        Ok(())
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.playing = false;
    }

    fn rewind(&mut self) {
        self.rewinds += 1;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
