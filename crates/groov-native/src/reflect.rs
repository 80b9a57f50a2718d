//! What a WGSL program declares, read with naga so the backend can answer
//! name-based attribute and uniform lookups.
//!
//! Every program shares one bind group layout: the uniform block at
//! binding 0, a sampler at 1 and texture units 0..3 at bindings 2..5.

use naga::{AddressSpace, Binding, ShaderStage, TypeInner, VectorSize};

use groov_core::{GpuError, VERTEX_ATTRIBUTES};

/// Bytes reserved per draw in the uniform ring; also the dynamic-offset stride.
pub const UNIFORM_SLOT_SIZE: u32 = 512;

pub const UNIFORM_BINDING: u32 = 0;
pub const SAMPLER_BINDING: u32 = 1;
pub const FIRST_TEXTURE_BINDING: u32 = 2;
pub const TEXTURE_UNITS: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Mat4,
    Mat3,
    Vec3,
    Float,
    /// A texture global; set through its unit, not through the block.
    Texture { binding: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexInput {
    pub name: String,
    pub location: u32,
    pub offset: u64,
    pub format: wgpu::VertexFormat,
}

#[derive(Clone, Debug, Default)]
struct StageInfo {
    entry_point: String,
    inputs: Vec<(String, u32)>,
    uniforms: Vec<UniformSlot>,
    block_size: u32,
}

/// The linked view of a vertex/fragment pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramLayout {
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub inputs: Vec<VertexInput>,
    pub uniforms: Vec<UniformSlot>,
    pub block_size: u32,
}

impl ProgramLayout {
    pub fn link(vertex: &str, fragment: &str) -> Result<Self, GpuError> {
        let vs = reflect_stage(vertex, ShaderStage::Vertex)?;
        let fs = reflect_stage(fragment, ShaderStage::Fragment)?;

        let mut uniforms = vs.uniforms;
        for slot in fs.uniforms {
            match uniforms.iter().find(|u| u.name == slot.name) {
                Some(existing) if *existing != slot => {
                    return Err(GpuError::Link(format!(
                        "uniform '{}' differs between stages ({:?} at {} vs {:?} at {})",
                        slot.name, existing.kind, existing.offset, slot.kind, slot.offset
                    )));
                }
                Some(_) => {}
                None => uniforms.push(slot),
            }
        }

        let block_size = vs.block_size.max(fs.block_size);
        if block_size > UNIFORM_SLOT_SIZE {
            return Err(GpuError::Link(format!(
                "uniform block is {block_size} bytes; at most {UNIFORM_SLOT_SIZE} are supported"
            )));
        }

        let inputs = vs
            .inputs
            .into_iter()
            .map(|(name, location)| vertex_input(name, location))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            vertex_entry: vs.entry_point,
            fragment_entry: fs.entry_point,
            inputs,
            uniforms,
            block_size,
        })
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|i| i.name == name)
    }

    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|u| u.name == name)
    }
}

fn vertex_input(name: String, location: u32) -> Result<VertexInput, GpuError> {
    let format = match name.as_str() {
        "position" | "normal" => wgpu::VertexFormat::Float32x3,
        "sourceColor" => wgpu::VertexFormat::Float32x4,
        "textureCoordIn" => wgpu::VertexFormat::Float32x2,
        _ => {
            return Err(GpuError::Link(format!(
                "vertex input '{name}' is not provided by meshes"
            )))
        }
    };
    let offset = VERTEX_ATTRIBUTES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, o)| *o)
        .unwrap_or(0);
    Ok(VertexInput {
        name,
        location,
        offset,
        format,
    })
}

fn reflect_stage(source: &str, stage: ShaderStage) -> Result<StageInfo, GpuError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| GpuError::Compile(e.emit_to_string(source)))?;

    let entry = module
        .entry_points
        .iter()
        .find(|e| e.stage == stage)
        .ok_or_else(|| GpuError::Link(format!("no {stage:?} entry point")))?;

    let mut info = StageInfo {
        entry_point: entry.name.clone(),
        ..StageInfo::default()
    };

    if stage == ShaderStage::Vertex {
        for arg in &entry.function.arguments {
            match (&arg.binding, &module.types[arg.ty].inner) {
                (Some(Binding::Location { location, .. }), _) => {
                    info.inputs
                        .push((arg.name.clone().unwrap_or_default(), *location));
                }
                (None, TypeInner::Struct { members, .. }) => {
                    for m in members {
                        if let Some(Binding::Location { location, .. }) = m.binding {
                            info.inputs.push((m.name.clone().unwrap_or_default(), location));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        if binding.group != 0 {
            return Err(GpuError::Link(format!(
                "only bind group 0 is available (found group {})",
                binding.group
            )));
        }
        let inner = &module.types[var.ty].inner;
        match (var.space, inner) {
            (AddressSpace::Uniform, TypeInner::Struct { members, span }) => {
                if binding.binding != UNIFORM_BINDING {
                    return Err(GpuError::Link(format!(
                        "uniform block must use binding {UNIFORM_BINDING}"
                    )));
                }
                info.block_size = *span;
                for m in members {
                    let Some(name) = &m.name else { continue };
                    let kind = match module.types[m.ty].inner {
                        TypeInner::Matrix {
                            columns: VectorSize::Quad,
                            rows: VectorSize::Quad,
                            ..
                        } => UniformKind::Mat4,
                        TypeInner::Matrix {
                            columns: VectorSize::Tri,
                            rows: VectorSize::Tri,
                            ..
                        } => UniformKind::Mat3,
                        TypeInner::Vector {
                            size: VectorSize::Tri,
                            ..
                        } => UniformKind::Vec3,
                        TypeInner::Scalar(_) => UniformKind::Float,
                        ref other => {
                            log::debug!("uniform '{name}' has unsupported type {other:?}");
                            continue;
                        }
                    };
                    info.uniforms.push(UniformSlot {
                        name: name.clone(),
                        offset: m.offset,
                        kind,
                    });
                }
            }
            (AddressSpace::Handle, TypeInner::Image { .. }) => {
                let last = FIRST_TEXTURE_BINDING + TEXTURE_UNITS - 1;
                if !(FIRST_TEXTURE_BINDING..=last).contains(&binding.binding) {
                    return Err(GpuError::Link(format!(
                        "textures must use bindings {FIRST_TEXTURE_BINDING}..={last}"
                    )));
                }
                info.uniforms.push(UniformSlot {
                    name: var.name.clone().unwrap_or_default(),
                    offset: 0,
                    kind: UniformKind::Texture {
                        binding: binding.binding,
                    },
                });
            }
            (AddressSpace::Handle, TypeInner::Sampler { .. }) => {}
            (space, _) => {
                return Err(GpuError::Link(format!(
                    "unsupported resource at binding {} ({space:?})",
                    binding.binding
                )));
            }
        }
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use groov_core::{SCENE_FRAGMENT_WGSL, SCENE_VERTEX_WGSL, SKY_FRAGMENT_WGSL, SKY_VERTEX_WGSL};

    #[test]
    fn scene_program_layout() {
        let layout = ProgramLayout::link(SCENE_VERTEX_WGSL, SCENE_FRAGMENT_WGSL).unwrap();
        assert_eq!(layout.vertex_entry, "vs_main");
        assert_eq!(layout.fragment_entry, "fs_main");
        assert_eq!(layout.block_size, 288);
        let offset = |name: &str| layout.uniforms[layout.uniform_index(name).unwrap()].offset;
        assert_eq!(offset("modelMatrix"), 0);
        assert_eq!(offset("normalMatrix"), 192);
        assert_eq!(offset("looper"), 252);
        assert_eq!(offset("userColor"), 272);
        let names: Vec<_> = layout
            .inputs
            .iter()
            .map(|i| (i.name.as_str(), i.location, i.offset))
            .collect();
        assert_eq!(
            names,
            [
                ("position", 0, 0),
                ("normal", 1, 12),
                ("sourceColor", 2, 24),
                ("textureCoordIn", 3, 40)
            ]
        );
        let tex = &layout.uniforms[layout.uniform_index("textureSampler").unwrap()];
        assert_eq!(tex.kind, UniformKind::Texture { binding: 2 });
    }

    #[test]
    fn sky_program_layout() {
        let layout = ProgramLayout::link(SKY_VERTEX_WGSL, SKY_FRAGMENT_WGSL).unwrap();
        assert_eq!(layout.inputs.len(), 1);
        for (name, binding) in [("permTexture", 3), ("simplexTexture", 4), ("gradTexture", 5)] {
            let slot = &layout.uniforms[layout.uniform_index(name).unwrap()];
            assert_eq!(slot.kind, UniformKind::Texture { binding });
        }
        assert!(layout.uniform_index("normalMatrix").is_none());
    }

    #[test]
    fn parse_errors_are_compile_errors() {
        let err = ProgramLayout::link("fn vs_main( {", SCENE_FRAGMENT_WGSL).unwrap_err();
        assert!(matches!(err, GpuError::Compile(_)));
    }

    #[test]
    fn mismatched_blocks_fail_to_link() {
        let vertex = SCENE_VERTEX_WGSL.replace(
            "    modelMatrix: mat4x4<f32>,\n",
            "    modelMatrix: mat4x4<f32>,\n    extra: vec4<f32>,\n",
        );
        assert!(matches!(
            ProgramLayout::link(&vertex, SCENE_FRAGMENT_WGSL),
            Err(GpuError::Link(_))
        ));
    }
}
