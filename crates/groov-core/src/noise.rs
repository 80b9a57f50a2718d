//! Lookup textures for the 4D simplex-noise sky shader.
//!
//! The sky fragment shader samples three textures built here:
//!
//! * a 256x256 RGBA "permutation-gradient" texture: RGB holds a 3D gradient
//!   picked through the permutation table, A holds the permuted value itself;
//! * a 256x256 RGBA "gradient4" texture holding 4D gradients;
//! * a 64-texel 1D table ranking the components of a 4D offset, used to find
//!   the simplex a point lies in.
//!
//! Gradient components are stored as `component * 64 + 64`, so -1, 0 and 1
//! become 0, 64 and 128. The shader undoes this with `* 4.0 - 1.0` after
//! normalising to \[0, 1\].
//!
//! Everything is derived from fixed tables and is byte-identical across runs.

use crate::texture::TextureBuffer;

pub const NOISE_TEXTURE_SIZE: u32 = 256;
pub const SIMPLEX_LOOKUP_SIZE: u32 = 64;

/// Ken Perlin's reference permutation of 0..=255.
#[rustfmt::skip]
pub const PERM: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225,
    140, 36, 103, 30, 69, 142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148,
    247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219, 203, 117, 35, 11, 32,
    57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122,
    60, 211, 133, 230, 220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54,
    65, 25, 63, 161, 1, 216, 80, 73, 209, 76, 132, 187, 208, 89, 18, 169,
    200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173, 186, 3, 64,
    52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212,
    207, 206, 59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213,
    119, 248, 152, 2, 44, 154, 163, 70, 221, 153, 101, 155, 167, 43, 172, 9,
    129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232, 178, 185, 112, 104,
    218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162, 241,
    81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157,
    184, 84, 204, 176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93,
    222, 114, 67, 29, 24, 72, 243, 141, 128, 195, 78, 66, 215, 61, 156, 180,
];

/// Gradients for 3D noise. Entries 12..16 repeat earlier directions to pad the table to 16.
#[rustfmt::skip]
pub const GRAD3: [[i8; 3]; 16] = [
    [0, 1, 1], [0, 1, -1], [0, -1, 1], [0, -1, -1],
    [1, 0, 1], [1, 0, -1], [-1, 0, 1], [-1, 0, -1],
    [1, 1, 0], [1, -1, 0], [-1, 1, 0], [-1, -1, 0],
    [1, 0, -1], [-1, 0, -1], [0, -1, 1], [0, 1, 1],
];

/// All 32 edge directions of the 4D hypercube.
#[rustfmt::skip]
pub const GRAD4: [[i8; 4]; 32] = [
    [0, 1, 1, 1], [0, 1, 1, -1], [0, 1, -1, 1], [0, 1, -1, -1],
    [0, -1, 1, 1], [0, -1, 1, -1], [0, -1, -1, 1], [0, -1, -1, -1],
    [1, 0, 1, 1], [1, 0, 1, -1], [1, 0, -1, 1], [1, 0, -1, -1],
    [-1, 0, 1, 1], [-1, 0, 1, -1], [-1, 0, -1, 1], [-1, 0, -1, -1],
    [1, 1, 0, 1], [1, 1, 0, -1], [1, -1, 0, 1], [1, -1, 0, -1],
    [-1, 1, 0, 1], [-1, 1, 0, -1], [-1, -1, 0, 1], [-1, -1, 0, -1],
    [1, 1, 1, 0], [1, 1, -1, 0], [1, -1, 1, 0], [1, -1, -1, 0],
    [-1, 1, 1, 0], [-1, 1, -1, 0], [-1, -1, 1, 0], [-1, -1, -1, 0],
];

/// Component rank per simplex corner ordering, scaled by 64. Unreachable orderings are zero.
#[rustfmt::skip]
pub const SIMPLEX4: [[u8; 4]; 64] = [
    [0, 64, 128, 192], [0, 64, 192, 128], [0, 0, 0, 0], [0, 128, 192, 64],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [64, 128, 192, 0],
    [0, 128, 64, 192], [0, 0, 0, 0], [0, 192, 64, 128], [0, 192, 128, 64],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [64, 192, 128, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [64, 128, 0, 192], [0, 0, 0, 0], [64, 192, 0, 128], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [128, 192, 0, 64], [128, 192, 64, 0],
    [64, 0, 128, 192], [64, 0, 192, 128], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [128, 0, 192, 64], [0, 0, 0, 0], [128, 64, 192, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [128, 0, 64, 192], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [192, 0, 64, 128], [192, 0, 128, 64], [0, 0, 0, 0], [192, 64, 128, 0],
    [128, 64, 0, 192], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [192, 64, 0, 128], [0, 0, 0, 0], [192, 128, 0, 64], [192, 128, 64, 0],
];

/// Maps a gradient component onto a texel byte.
///
/// Components in the tables are all -1, 0 or 1, so the mapping never leaves
/// the byte range; anything larger saturates instead of wrapping.
#[inline]
pub fn pack_component(c: i8) -> u8 {
    (i16::from(c) * 64 + 64).clamp(0, 255) as u8
}

#[inline]
fn permuted(i: usize, j: usize) -> u8 {
    PERM[(j + PERM[i] as usize) & 0xff]
}

/// Texel `(row i, column j)` is `[grad3[v & 15] packed, v]` with
/// `v = perm[(j + perm[i]) & 255]`.
pub fn build_perm_gradient() -> TextureBuffer {
    let size = NOISE_TEXTURE_SIZE as usize;
    let mut tex = TextureBuffer::new(NOISE_TEXTURE_SIZE, NOISE_TEXTURE_SIZE);
    for (i, row) in tex.pixels.chunks_exact_mut(size * 4).enumerate() {
        for (j, texel) in row.chunks_exact_mut(4).enumerate() {
            let v = permuted(i, j);
            let g = GRAD3[(v & 0x0f) as usize];
            texel.copy_from_slice(&[
                pack_component(g[0]),
                pack_component(g[1]),
                pack_component(g[2]),
                v,
            ]);
        }
    }
    tex
}

pub fn build_gradient4() -> TextureBuffer {
    let size = NOISE_TEXTURE_SIZE as usize;
    let mut tex = TextureBuffer::new(NOISE_TEXTURE_SIZE, NOISE_TEXTURE_SIZE);
    for (i, row) in tex.pixels.chunks_exact_mut(size * 4).enumerate() {
        for (j, texel) in row.chunks_exact_mut(4).enumerate() {
            let g = GRAD4[(permuted(i, j) & 0x1f) as usize];
            for (dst, c) in texel.iter_mut().zip(g) {
                *dst = pack_component(c);
            }
        }
    }
    tex
}

pub fn build_simplex_lookup() -> TextureBuffer {
    let mut tex = TextureBuffer::new_1d(SIMPLEX_LOOKUP_SIZE);
    for (texel, entry) in tex.pixels.chunks_exact_mut(4).zip(SIMPLEX4.iter()) {
        texel.copy_from_slice(entry);
    }
    tex
}

/// The three noise lookups, built together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseTextures {
    pub perm_gradient: TextureBuffer,
    pub gradient4: TextureBuffer,
    pub simplex: TextureBuffer,
}

impl NoiseTextures {
    pub fn generate() -> Self {
        let textures = Self {
            perm_gradient: build_perm_gradient(),
            gradient4: build_gradient4(),
            simplex: build_simplex_lookup(),
        };
        log::debug!(
            "generated noise textures ({} bytes)",
            textures.perm_gradient.pixels.len()
                + textures.gradient4.pixels.len()
                + textures.simplex.pixels.len()
        );
        textures
    }
}
