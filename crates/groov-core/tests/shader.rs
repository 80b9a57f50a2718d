// Shader program lifecycle against a recording backend.

mod common;

use common::{Call, RecordingGpu, BROKEN_FS, SCENE_FS, SCENE_VS};
use groov_core::{
    Attribute, GpuBackend, MeshData, ProgramBindings, ShaderManager, ShaderState, Uniform,
    UniformValue,
};

fn compile(manager: &mut ShaderManager, gpu: &mut RecordingGpu) -> Option<bool> {
    manager.compile_pending(gpu, |_| {}).map(|r| r.is_ok())
}

#[test]
fn nothing_pending_means_no_gpu_work() {
    let mut gpu = RecordingGpu::new();
    let mut m = ShaderManager::new("scene");
    assert_eq!(compile(&mut m, &mut gpu), None);
    m.request("", "");
    assert!(!m.has_pending());
    assert!(gpu.calls.is_empty());
    assert_eq!(m.state(), ShaderState::Uncompiled);
}

#[test]
fn good_source_links_and_resolves_inputs() {
    let mut gpu = RecordingGpu::new();
    let mut m = ShaderManager::new("scene");
    m.request(SCENE_VS, SCENE_FS);
    assert_eq!(compile(&mut m, &mut gpu), Some(true));
    assert_eq!(m.state(), ShaderState::Linked);
    assert_eq!(m.status(), "MOCK: scene shader ready");

    let b = m.bindings().unwrap();
    for a in Attribute::ALL {
        assert!(b.attribute(a).is_some(), "missing attribute {}", a.name());
    }
    assert!(b.uniform(Uniform::ModelMatrix).is_some());
    assert!(b.uniform(Uniform::PermTexture).is_none());
    let absent: Vec<Uniform> = b.absent_uniforms().collect();
    assert_eq!(
        absent,
        [Uniform::PermTexture, Uniform::SimplexTexture, Uniform::GradTexture]
    );
}

#[test]
fn broken_edit_keeps_the_running_program() {
    let mut gpu = RecordingGpu::new();
    let mut m = ShaderManager::new("scene");
    m.request(SCENE_VS, SCENE_FS);
    compile(&mut m, &mut gpu);
    let running = m.current_program().unwrap();

    m.request(SCENE_VS, BROKEN_FS);
    assert_eq!(compile(&mut m, &mut gpu), Some(false));
    assert_eq!(m.current_program(), Some(running));
    assert_eq!(m.state(), ShaderState::Linked);
    assert_eq!(m.last_error(), Some(BROKEN_FS));
    assert_eq!(m.status(), BROKEN_FS);
    assert!(!gpu.calls.contains(&Call::DeleteProgram(running)));

    // The broken source is dropped, not retried every frame.
    assert!(!m.has_pending());
    assert_eq!(compile(&mut m, &mut gpu), None);
}

#[test]
fn first_compile_failing_leaves_no_program() {
    let mut gpu = RecordingGpu::new();
    let mut m = ShaderManager::new("scene");
    m.request(SCENE_VS, BROKEN_FS);
    assert_eq!(compile(&mut m, &mut gpu), Some(false));
    assert_eq!(m.current_program(), None);
    assert_eq!(m.state(), ShaderState::Failed);
    assert!(m.bindings().is_none());
}

#[test]
fn missing_stage_is_rejected_without_compiling() {
    let mut gpu = RecordingGpu::new();
    let mut m = ShaderManager::new("scene");
    m.request(SCENE_VS, "");
    assert_eq!(compile(&mut m, &mut gpu), Some(false));
    assert!(gpu.calls.is_empty());
    assert!(m.last_error().is_some());
}

#[test]
fn replacement_releases_dependents_before_deleting_old_program() {
    let mut gpu = RecordingGpu::new();
    let mut m = ShaderManager::new("scene");
    m.request(SCENE_VS, SCENE_FS);
    compile(&mut m, &mut gpu);
    let old = m.current_program().unwrap();
    let mesh = gpu.create_mesh(&MeshData::cube()).unwrap();
    gpu.clear_calls();

    m.request(SCENE_VS, SCENE_FS);
    let result = m.compile_pending(&mut gpu, |g| g.delete_mesh(mesh));
    let new = result.unwrap().unwrap();
    assert_ne!(new, old);

    let compiled = gpu.position_of(&Call::CompileProgram(new)).unwrap();
    let released = gpu.position_of(&Call::DeleteMesh(mesh)).unwrap();
    let deleted = gpu.position_of(&Call::DeleteProgram(old)).unwrap();
    assert!(compiled < released && released < deleted, "{:?}", gpu.calls);
    assert_eq!(gpu.live_programs(), 1);
    assert!(gpu.misuse.is_empty(), "{:?}", gpu.misuse);
}

#[test]
fn absent_uniforms_are_skipped_when_set() {
    let mut gpu = RecordingGpu::new();
    let program = gpu.compile_program("modelMatrix", "looper").unwrap();
    let bindings = ProgramBindings::resolve(&gpu, program);
    gpu.use_program(program);
    gpu.clear_calls();

    bindings.set(&mut gpu, Uniform::UserColor, UniformValue::Vec3([1.0, 0.0, 0.0]));
    bindings.set(&mut gpu, Uniform::Looper, UniformValue::Float(1.5));
    assert_eq!(gpu.calls, [Call::SetUniform("looper", UniformValue::Float(1.5))]);
}

#[test]
fn invalidate_requeues_the_last_good_source() {
    let mut gpu = RecordingGpu::new();
    let mut m = ShaderManager::new("sky");
    m.request(SCENE_VS, SCENE_FS);
    compile(&mut m, &mut gpu);
    gpu.drop_device();
    gpu.clear_calls();

    m.invalidate();
    assert_eq!(m.current_program(), None);
    assert_eq!(m.state(), ShaderState::Uncompiled);
    assert!(gpu.calls.is_empty());
    assert!(m.has_pending());
    assert_eq!(compile(&mut m, &mut gpu), Some(true));
    assert!(gpu.misuse.is_empty(), "{:?}", gpu.misuse);
}

#[test]
fn release_deletes_the_program_once() {
    let mut gpu = RecordingGpu::new();
    let mut m = ShaderManager::new("scene");
    m.request(SCENE_VS, SCENE_FS);
    compile(&mut m, &mut gpu);
    m.release(&mut gpu);
    m.release(&mut gpu);
    assert_eq!(gpu.live_programs(), 0);
    let deletes = gpu
        .calls
        .iter()
        .filter(|c| matches!(c, Call::DeleteProgram(_)))
        .count();
    assert_eq!(deletes, 1);
}
