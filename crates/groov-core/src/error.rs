//! Error taxonomy for the render core.
//!
//! Nothing here is fatal to the frame loop: the renderer logs these, records
//! them in its [`FrameReport`](crate::scene::FrameReport) and carries on.

use thiserror::Error;

/// Failures reported by a [`GpuBackend`](crate::gpu::GpuBackend).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GpuError {
    #[error("shader compile failed: {0}")]
    Compile(String),
    #[error("program link failed: {0}")]
    Link(String),
    #[error("resource creation failed: {0}")]
    Resource(String),
    #[error("graphics context lost")]
    ContextLost,
}

/// A vertex/fragment pair that could not be turned into a program.
///
/// The previously linked program, if any, stays in use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ShaderCompileError {
    pub message: String,
}

impl From<GpuError> for ShaderCompileError {
    fn from(e: GpuError) -> Self {
        let message = match e {
            GpuError::Compile(m) | GpuError::Link(m) | GpuError::Resource(m) => m,
            GpuError::ContextLost => "graphics context lost during compile".to_string(),
        };
        Self { message }
    }
}

/// A mesh or texture asset that could not be produced or uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetLoadError {
    #[error("unknown asset '{0}'")]
    NotFound(String),
    #[error("asset '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },
    #[error("upload of '{name}' failed: {source}")]
    Upload {
        name: String,
        #[source]
        source: GpuError,
    },
}

/// Model matrix with no inverse; the normal matrix falls back to identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("model matrix is singular")]
pub struct DegenerateTransform;

/// Audio transport failures surfaced by [`AudioTransport`](crate::playback::AudioTransport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("cannot open '{path}': {reason}")]
    Open { path: String, reason: String },
    #[error("no file loaded")]
    NothingLoaded,
    #[error("audio device error: {0}")]
    Device(String),
}

/// Everything a frame can run into, matching the render-loop error taxonomy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error(transparent)]
    ShaderCompile(#[from] ShaderCompileError),
    #[error("graphics context lost; resources will be rebuilt on the next frame")]
    ContextLost,
    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),
    #[error(transparent)]
    DegenerateTransform(#[from] DegenerateTransform),
    /// The backend refused the frame itself; nothing was presented.
    #[error("frame dropped: {0}")]
    Backend(GpuError),
}
