use glam::Vec3;

// Shared visual/animation tuning constants used by the core and the native frontend.

// Camera and lighting
pub const EYE_POSITION: [f32; 3] = [0.0, 5.0, 10.0]; // fixed world-space eye, looking at the origin
pub const LIGHT_POSITION: [f32; 3] = [-15.0, 10.0, 15.0];

// Projection
pub const FAR_PLANE: f32 = 30.0;
pub const CENTRAL_NEAR_PLANE: f32 = 4.0; // central shape + orbitals
pub const SKY_NEAR_PLANE: f32 = 3.0; // sky box sits closer to the eye than the scene
pub const MIN_PROJECTION_SCALE: f32 = 0.01; // scale below this blows up the frustum width

// Spin
pub const BEAT_ROTATION_Z: f32 = -0.3; // constant roll applied with the per-frame spin

// Meshes
pub const MESH_SCALE: f32 = 0.3; // unit cube is shrunk to this half-extent on load
pub const MESH_COLOR: [f32; 4] = [0.0, 0.5, 0.0, 1.0];

// Orbitals
pub const DEFAULT_ORBITAL_COUNT: usize = 4;
pub const ORBIT_RADIUS: f32 = 0.8; // world units from the central shape
pub const ORBITAL_SCALE: f32 = 0.35; // orbital size relative to the central shape
pub const WIGGLE_AMPLITUDE: f32 = 0.15; // max radial wiggle while audio plays

// Sky box
pub const SKY_BOX_SIZE: f32 = 14.0; // scale on the shared cube; corners stay inside FAR_PLANE
pub const BG_SATURATION: f32 = 0.4;
pub const BG_VALUE: f32 = 0.15;

// Parameter ranges (slider limits)
pub const SCALE_RANGE: (f32, f32) = (1.0, 4.0);
pub const ROTATION_SPEED_RANGE: (f32, f32) = (0.0, 0.5);
pub const BPM_MAX: u32 = 250;

// Parameter defaults
pub const DEFAULT_SCALE: f32 = 2.5;
pub const DEFAULT_ROTATION_SPEED: f32 = 0.01;
pub const DEFAULT_BPM: u32 = 120;
pub const DEFAULT_WIGGLE_SPEED: f32 = 2.0;
pub const DEFAULT_COLOR_SAT: f32 = 0.8;
pub const DEFAULT_COLOR_VAL: f32 = 0.9;
pub const DEFAULT_BG_HUE: f32 = 220.0;

// Texture units, matching the uniform names the shaders sample through
pub const UNIT_USER_TEXTURE: u32 = 0;
pub const UNIT_PERM_TEXTURE: u32 = 1;
pub const UNIT_SIMPLEX_TEXTURE: u32 = 2;
pub const UNIT_GRAD_TEXTURE: u32 = 3;

// Dynamic texture edge length (pixels)
pub const DYNAMIC_TEXTURE_SIZE: u32 = 128;
pub const MAX_TEXTURE_SIZE: u32 = 1024;

#[inline]
pub fn eye_vec3() -> Vec3 {
    Vec3::from(EYE_POSITION)
}

#[inline]
pub fn light_vec3() -> Vec3 {
    Vec3::from(LIGHT_POSITION)
}
