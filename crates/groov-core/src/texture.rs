//! CPU-side texture images and the sources the user can pick from.

use std::path::PathBuf;

use crate::clock::BouncingNumber;
use crate::constants::{DYNAMIC_TEXTURE_SIZE, MAX_TEXTURE_SIZE};
use crate::error::AssetLoadError;
use crate::noise::{build_gradient4, build_perm_gradient, build_simplex_lookup};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
}

/// Tightly packed RGBA8 pixels, row-major, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureBuffer {
    pub width: u32,
    pub height: u32,
    pub dimension: TextureDimension,
    pub pixels: Vec<u8>,
}

impl TextureBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            dimension: TextureDimension::D2,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn new_1d(width: u32) -> Self {
        Self {
            dimension: TextureDimension::D1,
            ..Self::new(width, 1)
        }
    }

    /// Wraps decoded RGBA8 pixels, checking the length matches.
    pub fn from_rgba(
        name: &str,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, AssetLoadError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(AssetLoadError::Invalid {
                name: name.to_string(),
                reason: format!(
                    "{}x{} needs {expected} bytes, got {}",
                    width,
                    height,
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            dimension: TextureDimension::D2,
            pixels,
        })
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Transparent black outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let o = self.offset(x, y);
        match self.pixels.get(o..o + 4) {
            Some(&[r, g, b, a]) => [r, g, b, a],
            _ => [0; 4],
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let o = self.offset(x, y);
        self.pixels[o..o + 4].copy_from_slice(&rgba);
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for texel in self.pixels.chunks_exact_mut(4) {
            texel.copy_from_slice(&rgba);
        }
    }

    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }
}

/// Rescales (nearest neighbour) to the next power of two on each axis,
/// capped at [`MAX_TEXTURE_SIZE`]. Images that already have power-of-two
/// sides are returned unchanged; an empty image becomes one transparent texel.
pub fn resize_to_power_of_two(image: &TextureBuffer) -> TextureBuffer {
    if image.width == 0 || image.height == 0 {
        return TextureBuffer::new(1, 1);
    }
    if image.is_power_of_two() {
        return image.clone();
    }
    let width = image.width.next_power_of_two().min(MAX_TEXTURE_SIZE);
    let height = image.height.next_power_of_two().min(MAX_TEXTURE_SIZE);
    let mut out = TextureBuffer::new(width, height);
    for y in 0..height {
        let sy = (u64::from(y) * u64::from(image.height) / u64::from(height)) as u32;
        for x in 0..width {
            let sx = (u64::from(x) * u64::from(image.width) / u64::from(width)) as u32;
            out.set_pixel(x, y, image.pixel(sx, sy));
        }
    }
    out
}

/// Whether a texture has to be re-rendered and re-uploaded every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureRefresh {
    Static,
    EveryFrame,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProceduralKind {
    PermGradient,
    Gradient4,
    SimplexLookup,
}

/// 128x128 animated image: a green dot bouncing inside a framed cyan square.
#[derive(Clone, Debug)]
pub struct DynamicTexture {
    pub x: BouncingNumber,
    pub y: BouncingNumber,
}

impl DynamicTexture {
    pub fn new() -> Self {
        Self {
            x: BouncingNumber::new(),
            y: BouncingNumber::new(),
        }
    }

    fn draw(&self, now_ms: f64, into: &mut TextureBuffer) {
        const LIGHT_CYAN: [u8; 4] = [224, 255, 255, 255];
        const DARK_RED: [u8; 4] = [139, 0, 0, 255];
        const GREEN: [u8; 4] = [0, 128, 0, 255];
        const BORDER: u32 = 2;

        let size = DYNAMIC_TEXTURE_SIZE;
        if into.width != size || into.height != size || into.dimension != TextureDimension::D2 {
            *into = TextureBuffer::new(size, size);
        }
        into.fill(LIGHT_CYAN);

        for i in 0..size {
            for b in 0..BORDER {
                into.set_pixel(i, b, DARK_RED);
                into.set_pixel(i, size - 1 - b, DARK_RED);
                into.set_pixel(b, i, DARK_RED);
                into.set_pixel(size - 1 - b, i, DARK_RED);
            }
        }

        let s = size as f32;
        let radius = s * 0.05;
        let cx = self.x.value(now_ms) * s * 0.9 + radius;
        let cy = self.y.value(now_ms) * s * 0.9 + radius;
        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil() as u32).min(size);
        let y1 = ((cy + radius).ceil() as u32).min(size);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    into.set_pixel(x, y, GREEN);
                }
            }
        }
    }
}

impl Default for DynamicTexture {
    fn default() -> Self {
        Self::new()
    }
}

/// Every kind of image the user texture slot can show.
#[derive(Clone, Debug)]
pub enum TextureSource {
    /// Bundled image, already decoded.
    Asset { name: String, image: TextureBuffer },
    /// Image the user opened from disk.
    UserFile { path: PathBuf, image: TextureBuffer },
    Procedural(ProceduralKind),
    Dynamic(DynamicTexture),
}

impl TextureSource {
    pub fn asset(name: impl Into<String>, image: TextureBuffer) -> Self {
        Self::Asset {
            name: name.into(),
            image: resize_to_power_of_two(&image),
        }
    }

    pub fn user_file(path: impl Into<PathBuf>, image: TextureBuffer) -> Self {
        Self::UserFile {
            path: path.into(),
            image: resize_to_power_of_two(&image),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Asset { name, .. } => name.clone(),
            Self::UserFile { path, .. } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Procedural(ProceduralKind::PermGradient) => "Noise permutation".to_string(),
            Self::Procedural(ProceduralKind::Gradient4) => "Noise gradients".to_string(),
            Self::Procedural(ProceduralKind::SimplexLookup) => "Simplex lookup".to_string(),
            Self::Dynamic(_) => "Dynamically-generated texture".to_string(),
        }
    }

    /// Draws the current image into `into`.
    ///
    /// `now_ms` is a monotonic millisecond clock; only the dynamic texture
    /// reads it.
    pub fn render(&mut self, now_ms: f64, into: &mut TextureBuffer) -> TextureRefresh {
        match self {
            Self::Asset { image, .. } | Self::UserFile { image, .. } => {
                into.clone_from(image);
                TextureRefresh::Static
            }
            Self::Procedural(kind) => {
                *into = match kind {
                    ProceduralKind::PermGradient => build_perm_gradient(),
                    ProceduralKind::Gradient4 => build_gradient4(),
                    ProceduralKind::SimplexLookup => build_simplex_lookup(),
                };
                TextureRefresh::Static
            }
            Self::Dynamic(dynamic) => {
                dynamic.draw(now_ms, into);
                TextureRefresh::EveryFrame
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_power_of_two_is_rescaled_and_capped() {
        let img = TextureBuffer::new(300, 2000);
        let out = resize_to_power_of_two(&img);
        assert_eq!((out.width, out.height), (512, 1024));
        assert_eq!(out.pixels.len(), 512 * 1024 * 4);
    }

    #[test]
    fn power_of_two_is_untouched() {
        let mut img = TextureBuffer::new(64, 32);
        img.set_pixel(3, 4, [1, 2, 3, 4]);
        assert_eq!(resize_to_power_of_two(&img), img);
    }

    #[test]
    fn empty_images_become_a_single_texel() {
        for (w, h) in [(0, 0), (0, 4), (3, 0)] {
            let out = resize_to_power_of_two(&TextureBuffer::new(w, h));
            assert_eq!((out.width, out.height), (1, 1));
            assert_eq!(out.pixels, vec![0; 4]);
        }
        let TextureSource::UserFile { image, .. } =
            TextureSource::user_file("blank.png", TextureBuffer::new(0, 0))
        else {
            panic!("expected a user file");
        };
        assert_eq!((image.width, image.height), (1, 1));
    }

    #[test]
    fn from_rgba_rejects_short_buffers() {
        assert!(TextureBuffer::from_rgba("x", 2, 2, vec![0; 15]).is_err());
        assert!(TextureBuffer::from_rgba("x", 2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn dynamic_texture_has_frame_and_dot() {
        let mut source = TextureSource::Dynamic(DynamicTexture::new());
        let mut buf = TextureBuffer::new(1, 1);
        assert_eq!(source.render(1234.0, &mut buf), TextureRefresh::EveryFrame);
        assert_eq!((buf.width, buf.height), (DYNAMIC_TEXTURE_SIZE, DYNAMIC_TEXTURE_SIZE));
        assert_eq!(buf.pixel(0, 0), [139, 0, 0, 255]);
        let green = buf
            .pixels
            .chunks_exact(4)
            .filter(|p| *p == [0, 128, 0, 255])
            .count();
        assert!(green > 0);
    }
}
