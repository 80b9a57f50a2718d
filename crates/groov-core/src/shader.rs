//! Compiles shader source pairs on demand and tracks the program in use.
//!
//! A failed compile never disturbs the program that is already running: the
//! error is kept for display and the failed source is dropped, so a broken
//! edit is tried once and not every frame.

use crate::error::ShaderCompileError;
use crate::gpu::{AttributeLocation, GpuBackend, ProgramId, UniformLocation, UniformValue};

/// Vertex inputs the meshes provide, by shader name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    Normal,
    SourceColor,
    TextureCoordIn,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Position,
        Attribute::Normal,
        Attribute::SourceColor,
        Attribute::TextureCoordIn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Position => "position",
            Attribute::Normal => "normal",
            Attribute::SourceColor => "sourceColor",
            Attribute::TextureCoordIn => "textureCoordIn",
        }
    }
}

/// Uniforms the renderer knows how to feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Uniform {
    ModelMatrix,
    ViewMatrix,
    ProjectionMatrix,
    NormalMatrix,
    EyePosition,
    LightPosition,
    UserColor,
    Looper,
    BouncingNumber,
    TextureSampler,
    PermTexture,
    SimplexTexture,
    GradTexture,
}

impl Uniform {
    pub const ALL: [Uniform; 13] = [
        Uniform::ModelMatrix,
        Uniform::ViewMatrix,
        Uniform::ProjectionMatrix,
        Uniform::NormalMatrix,
        Uniform::EyePosition,
        Uniform::LightPosition,
        Uniform::UserColor,
        Uniform::Looper,
        Uniform::BouncingNumber,
        Uniform::TextureSampler,
        Uniform::PermTexture,
        Uniform::SimplexTexture,
        Uniform::GradTexture,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Uniform::ModelMatrix => "modelMatrix",
            Uniform::ViewMatrix => "viewMatrix",
            Uniform::ProjectionMatrix => "projectionMatrix",
            Uniform::NormalMatrix => "normalMatrix",
            Uniform::EyePosition => "eyePosition",
            Uniform::LightPosition => "lightPosition",
            Uniform::UserColor => "userColor",
            Uniform::Looper => "looper",
            Uniform::BouncingNumber => "bouncingNumber",
            Uniform::TextureSampler => "textureSampler",
            Uniform::PermTexture => "permTexture",
            Uniform::SimplexTexture => "simplexTexture",
            Uniform::GradTexture => "gradTexture",
        }
    }
}

/// Locations of every known input in one program. Inputs the shader does
/// not declare are `None` and are skipped when set.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramBindings {
    program: ProgramId,
    attributes: [Option<AttributeLocation>; 4],
    uniforms: [Option<UniformLocation>; 13],
}

impl ProgramBindings {
    pub fn resolve<G: GpuBackend + ?Sized>(gpu: &G, program: ProgramId) -> Self {
        let attributes = Attribute::ALL.map(|a| gpu.attribute_location(program, a.name()));
        let uniforms = Uniform::ALL.map(|u| gpu.uniform_location(program, u.name()));
        Self {
            program,
            attributes,
            uniforms,
        }
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn attribute(&self, attribute: Attribute) -> Option<AttributeLocation> {
        self.attributes[attribute as usize]
    }

    pub fn uniform(&self, uniform: Uniform) -> Option<UniformLocation> {
        self.uniforms[uniform as usize]
    }

    /// Sets `uniform` if the program declares it.
    pub fn set<G: GpuBackend + ?Sized>(&self, gpu: &mut G, uniform: Uniform, value: UniformValue) {
        if let Some(location) = self.uniform(uniform) {
            gpu.set_uniform(location, value);
        }
    }

    pub fn absent_uniforms(&self) -> impl Iterator<Item = Uniform> + '_ {
        Uniform::ALL
            .into_iter()
            .filter(move |u| self.uniform(*u).is_none())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderState {
    Uncompiled,
    Linked,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShaderSource {
    vertex: String,
    fragment: String,
}

/// One vertex/fragment program slot (the scene shader or the sky shader).
#[derive(Debug)]
pub struct ShaderManager {
    label: &'static str,
    program: Option<ProgramId>,
    bindings: Option<ProgramBindings>,
    pending: Option<ShaderSource>,
    last_good: Option<ShaderSource>,
    last_error: Option<String>,
    status: String,
    state: ShaderState,
}

impl ShaderManager {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            program: None,
            bindings: None,
            pending: None,
            last_good: None,
            last_error: None,
            status: String::new(),
            state: ShaderState::Uncompiled,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Queues a source pair for the next [`compile_pending`](Self::compile_pending).
    /// Two empty strings mean "no change" and are ignored.
    pub fn request(&mut self, vertex: impl Into<String>, fragment: impl Into<String>) {
        let (vertex, fragment) = (vertex.into(), fragment.into());
        if vertex.is_empty() && fragment.is_empty() {
            return;
        }
        self.pending = Some(ShaderSource { vertex, fragment });
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Compiles the queued source, if any.
    ///
    /// On success the order is: new program compiled, `release_dependents`
    /// called (meshes built against the old program), old program deleted,
    /// new program installed. On failure nothing but the error changes.
    /// The queued source is consumed either way. Returns `None` when nothing
    /// was queued.
    pub fn compile_pending<G, F>(
        &mut self,
        gpu: &mut G,
        release_dependents: F,
    ) -> Option<Result<ProgramId, ShaderCompileError>>
    where
        G: GpuBackend + ?Sized,
        F: FnOnce(&mut G),
    {
        let source = self.pending.take()?;

        let result = if source.vertex.is_empty() || source.fragment.is_empty() {
            Err(ShaderCompileError {
                message: "vertex and fragment source are both required".to_string(),
            })
        } else {
            gpu.compile_program(&source.vertex, &source.fragment)
                .map_err(ShaderCompileError::from)
        };

        match result {
            Ok(program) => {
                release_dependents(&mut *gpu);
                self.bindings = None;
                if let Some(old) = self.program.take() {
                    gpu.delete_program(old);
                }
                let bindings = ProgramBindings::resolve(gpu, program);
                let absent: Vec<&str> = bindings.absent_uniforms().map(Uniform::name).collect();
                if !absent.is_empty() {
                    log::debug!("{} shader does not use: {}", self.label, absent.join(", "));
                }
                self.program = Some(program);
                self.bindings = Some(bindings);
                self.last_good = Some(source);
                self.last_error = None;
                self.state = ShaderState::Linked;
                self.status = format!("{}: {} shader ready", gpu.language_version(), self.label);
                log::info!("{}", self.status);
                Some(Ok(program))
            }
            Err(err) => {
                log::warn!("{} shader rejected: {}", self.label, err.message);
                self.status = err.message.clone();
                self.last_error = Some(err.message.clone());
                if self.program.is_none() {
                    self.state = ShaderState::Failed;
                }
                Some(Err(err))
            }
        }
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn bindings(&self) -> Option<&ProgramBindings> {
        self.bindings.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Text for the status line: the language tag after a good compile,
    /// otherwise the compiler message.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn state(&self) -> ShaderState {
        self.state
    }

    /// Deletes the program while the context is still usable.
    pub fn release<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G) {
        self.bindings = None;
        if let Some(program) = self.program.take() {
            gpu.delete_program(program);
        }
        self.state = ShaderState::Uncompiled;
    }

    /// Forgets the program after the context is gone (no GPU calls) and
    /// queues the last working source so it is rebuilt on the next frame.
    pub fn invalidate(&mut self) {
        self.bindings = None;
        self.program = None;
        self.state = ShaderState::Uncompiled;
        if self.pending.is_none() {
            self.pending = self.last_good.clone();
        }
    }
}
