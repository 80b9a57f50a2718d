// Noise lookup textures: known texels and whole-texture checksums.

use groov_core::noise::{
    build_gradient4, build_perm_gradient, build_simplex_lookup, NoiseTextures, NOISE_TEXTURE_SIZE,
    SIMPLEX_LOOKUP_SIZE,
};
use groov_core::TextureDimension;

fn texel(pixels: &[u8], row: usize, col: usize) -> [u8; 4] {
    let o = (row * NOISE_TEXTURE_SIZE as usize + col) * 4;
    [pixels[o], pixels[o + 1], pixels[o + 2], pixels[o + 3]]
}

fn byte_sum(pixels: &[u8]) -> u64 {
    pixels.iter().map(|b| u64::from(*b)).sum()
}

#[test]
fn perm_gradient_known_texels() {
    let tex = build_perm_gradient();
    assert_eq!((tex.width, tex.height), (256, 256));
    assert_eq!(tex.pixels.len(), 256 * 256 * 4);
    let cases = [
        ((0, 0), [64, 128, 0, 17]),
        ((0, 1), [0, 64, 128, 182]),
        ((1, 0), [0, 64, 0, 119]),
        ((17, 42), [128, 64, 0, 229]),
        ((255, 255), [0, 64, 0, 253]),
        ((128, 3), [0, 64, 0, 87]),
    ];
    for ((i, j), want) in cases {
        assert_eq!(texel(&tex.pixels, i, j), want, "texel ({i}, {j})");
    }
    // TextureBuffer::pixel takes (column, row).
    assert_eq!(tex.pixel(42, 17), [128, 64, 0, 229]);
}

#[test]
fn gradient4_known_texels() {
    let tex = build_gradient4();
    let cases = [
        ((0, 0), [128, 128, 64, 0]),
        ((0, 1), [0, 0, 64, 128]),
        ((1, 0), [0, 0, 64, 0]),
        ((17, 42), [64, 0, 128, 0]),
        ((255, 255), [0, 128, 0, 64]),
        ((128, 3), [0, 0, 64, 0]),
    ];
    for ((i, j), want) in cases {
        assert_eq!(texel(&tex.pixels, i, j), want, "texel ({i}, {j})");
    }
}

#[test]
fn checksums_match() {
    assert_eq!(byte_sum(&build_perm_gradient().pixels), 20_938_752);
    assert_eq!(byte_sum(&build_gradient4().pixels), 16_777_216);
    assert_eq!(byte_sum(&build_simplex_lookup().pixels), 9216);
}

#[test]
fn simplex_lookup_is_one_dimensional() {
    let tex = build_simplex_lookup();
    assert_eq!(tex.dimension, TextureDimension::D1);
    assert_eq!((tex.width, tex.height), (SIMPLEX_LOOKUP_SIZE, 1));
    assert_eq!(tex.pixels.len(), 64 * 4);
    let non_zero = tex
        .pixels
        .chunks_exact(4)
        .filter(|t| t.iter().any(|b| *b != 0))
        .count();
    assert_eq!(non_zero, 24);
}

#[test]
fn regeneration_is_deterministic() {
    assert_eq!(NoiseTextures::generate(), NoiseTextures::generate());
}

#[test]
fn gradient_components_are_packed_from_unit_values() {
    let tex = build_gradient4();
    for b in tex.pixels.iter() {
        assert!(matches!(b, 0 | 64 | 128), "unexpected byte {b}");
    }
    let perm = build_perm_gradient();
    for t in perm.pixels.chunks_exact(4) {
        assert!(t[..3].iter().all(|b| matches!(b, 0 | 64 | 128)));
    }
}
