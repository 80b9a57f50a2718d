//! Files the front-end reads from disk: user textures and shader overrides.

use std::io;
use std::path::{Path, PathBuf};

use groov_core::{
    AssetLoadError, TextureBuffer, TextureSource, SCENE_FRAGMENT_WGSL, SCENE_VERTEX_WGSL,
    SKY_FRAGMENT_WGSL, SKY_VERTEX_WGSL,
};

pub fn load_texture(path: &Path) -> Result<TextureSource, AssetLoadError> {
    let name = path.display().to_string();
    let image = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) if io.kind() == io::ErrorKind::NotFound => {
            AssetLoadError::NotFound(name.clone())
        }
        other => AssetLoadError::Invalid {
            name: name.clone(),
            reason: other.to_string(),
        },
    })?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let buffer = TextureBuffer::from_rgba(&name, width, height, rgba.into_raw())?;
    log::info!("loaded texture {name} ({width}x{height})");
    Ok(TextureSource::user_file(path, buffer))
}

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

/// WGSL sources for both programs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSet {
    pub scene_vertex: String,
    pub scene_fragment: String,
    pub sky_vertex: String,
    pub sky_fragment: String,
}

impl Default for ShaderSet {
    fn default() -> Self {
        Self {
            scene_vertex: SCENE_VERTEX_WGSL.to_string(),
            scene_fragment: SCENE_FRAGMENT_WGSL.to_string(),
            sky_vertex: SKY_VERTEX_WGSL.to_string(),
            sky_fragment: SKY_FRAGMENT_WGSL.to_string(),
        }
    }
}

impl ShaderSet {
    /// Reads `scene_vertex.wgsl` etc. from `dir`; files that are missing
    /// keep the built-in source.
    pub fn load_dir(dir: &Path) -> io::Result<Self> {
        if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            ));
        }
        let mut set = Self::default();
        for (file, slot) in [
            ("scene_vertex.wgsl", &mut set.scene_vertex),
            ("scene_fragment.wgsl", &mut set.scene_fragment),
            ("sky_vertex.wgsl", &mut set.sky_vertex),
            ("sky_fragment.wgsl", &mut set.sky_fragment),
        ] {
            let path: PathBuf = dir.join(file);
            match std::fs::read_to_string(&path) {
                Ok(source) => *slot = source,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("{} not found, using built-in", path.display());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(set)
    }
}
