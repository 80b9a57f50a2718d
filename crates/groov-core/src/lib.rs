pub mod clock;
pub mod color;
pub mod constants;
pub mod error;
pub mod gpu;
pub mod mesh;
pub mod noise;
pub mod orientation;
pub mod params;
pub mod playback;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod transform;

pub static SCENE_VERTEX_WGSL: &str = include_str!("../shaders/scene_vertex.wgsl");
pub static SCENE_FRAGMENT_WGSL: &str = include_str!("../shaders/scene_fragment.wgsl");
pub static SKY_VERTEX_WGSL: &str = include_str!("../shaders/sky_vertex.wgsl");
pub static SKY_FRAGMENT_WGSL: &str = include_str!("../shaders/sky_fragment.wgsl");

pub use clock::*;
pub use color::*;
pub use constants::*;
pub use error::*;
pub use gpu::*;
pub use mesh::*;
pub use orientation::*;
pub use params::*;
pub use playback::*;
pub use scene::*;
pub use shader::*;
pub use texture::*;
pub use transform::*;
