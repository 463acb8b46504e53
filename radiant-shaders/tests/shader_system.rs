use radiant_shaders::{HeadlessDevice, ProgramKind, ShaderSystem, ShaderSystemConfig, StageBlend};
use std::path::PathBuf;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn config() -> ShaderSystemConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    ShaderSystemConfig {
        runtime_data_path: data_dir(),
        base_path: data_dir(),
        ..Default::default()
    }
}

fn realised_system(config: ShaderSystemConfig) -> ShaderSystem<HeadlessDevice> {
    let mut system = ShaderSystem::new(config, HeadlessDevice::new());
    system.realise();
    system
}

fn shader_names(system: &ShaderSystem<HeadlessDevice>) -> Vec<String> {
    let mut names = Vec::new();
    system.foreach_shader_name(|name| names.push(name.to_string()));
    names
}

fn active_shader_states(system: &ShaderSystem<HeadlessDevice>) -> Vec<(String, bool)> {
    system
        .active_shaders()
        .map(|shader| (shader.name().to_string(), shader.is_realised()))
        .collect()
}

#[test]
fn defined_names_are_listed_in_order() {
    let system = realised_system(config());
    assert_eq!(
        shader_names(&system),
        vec![
            "textures/base/floor",
            "textures/base/glass",
            "textures/wood/missing_image",
            "textures/wood/oak",
        ]
    );
}

#[test]
fn realise_unrealise_realise_keeps_the_same_active_shaders() {
    let mut system = realised_system(config());
    for name in ["textures/base/floor", "textures/wood/oak", "textures/never/declared"] {
        system.get_shader_for_name(name);
    }
    let before = active_shader_states(&system);
    assert_eq!(before.len(), 3);
    assert!(before.iter().all(|(_, realised)| *realised));

    system.unrealise();
    assert!(!system.is_realised());
    assert!(active_shader_states(&system)
        .iter()
        .all(|(_, realised)| !*realised));

    system.realise();
    assert_eq!(active_shader_states(&system), before);
}

#[test]
fn built_ins_default_to_arb() {
    let system = realised_system(config());
    for name in ["depthFill", "bumpMap"] {
        let program = system.get_built_in_program(name).unwrap();
        assert_eq!(program.kind(), ProgramKind::Arb);
        assert!(program.is_created());
    }
}

#[test]
fn unknown_built_in_is_a_lookup_error() {
    let system = realised_system(config());
    let err = system.get_built_in_program("stencilShadow").err().unwrap();
    assert!(err.is_lookup());
}

#[test]
fn later_file_overrides_earlier_definition() {
    let system = realised_system(config());
    let oak = system.library().definition("textures/wood/oak").unwrap();
    assert_eq!(oak.description, "oak from wood.mtr");
    assert_eq!(oak.file, "materials/wood.mtr");
    assert_eq!(oak.specular.as_deref(), Some("textures/wood/oak_s"));

    let report = system.last_load_report();
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.overwritten, vec!["textures/wood/oak".to_string()]);
}

#[test]
fn malformed_block_is_skipped_and_reported() {
    let system = realised_system(config());
    assert!(system.library().definition("textures/base/broken").is_none());
    // its neighbours still load
    assert!(system.library().definition("textures/base/glass").is_some());
    assert!(system.library().definition("textures/wood/oak").is_some());

    let errors = &system.last_load_report().errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].file, "materials/base.mtr");
    assert_eq!(errors[0].line, 25);
}

#[test]
fn material_details_survive_parsing() {
    let system = realised_system(config());

    let floor = system.library().definition("textures/base/floor").unwrap();
    assert_eq!(floor.description, "concrete floor");
    assert_eq!(floor.editor_image.as_deref(), Some("textures/base/floor_ed"));
    assert_eq!(floor.bump.as_deref(), Some("textures/base/floor_local"));

    let glass = system.library().definition("textures/base/glass").unwrap();
    assert!(glass.is_translucent());
    assert_eq!(glass.stages.len(), 1);
    assert_eq!(
        glass.stages[0].blend,
        StageBlend::Other("gl_dst_color, gl_zero".to_string())
    );
    assert_eq!(glass.editor_image_reference(), Some("textures/base/glass_d"));
}

#[test]
fn shaders_share_textures_by_path() {
    let mut system = realised_system(config());
    system.set_lighting_enabled(true);

    let oak = system.get_shader_for_name("textures/wood/oak");
    let bindings = oak.bindings().unwrap().clone();
    assert_eq!(bindings.editor_image, bindings.diffuse);
    assert!(bindings.specular.is_some());

    let uploads = system.device().uploads();
    let loose = system
        .load_texture_from_file("textures/wood/oak_d.png")
        .unwrap();
    assert_eq!(Some(loose), bindings.diffuse);
    assert_eq!(system.device().uploads(), uploads);

    let texture = system.texture_manager().texture(loose).unwrap();
    assert!(!texture.is_placeholder());
    assert_eq!(texture.size(), (8, 4));
    assert_eq!(texture.ref_count(), 3);
    system.release_texture(loose);
}

#[test]
fn missing_image_falls_back_to_the_placeholder() {
    let mut system = realised_system(config());
    let shader = system.get_shader_for_name("textures/wood/missing_image");
    assert!(shader.is_valid());
    let key = shader.editor_texture().unwrap();
    let texture = system.texture_manager().texture(key).unwrap();
    assert!(texture.is_placeholder());
    assert_eq!(texture.size(), (8, 8));
}

#[test]
fn unknown_shader_is_the_not_found_stub() {
    let mut system = realised_system(config());
    let shader = system.get_shader_for_name("textures/never/declared");
    assert!(!shader.is_valid());
    assert_eq!(shader.name(), "textures/never/declared");
    assert_eq!(shader.shader_file_name(), "");
    let key = shader.editor_texture().unwrap();
    assert!(system.texture_manager().texture(key).unwrap().is_placeholder());
}

#[test]
fn shaders_requested_before_realise_are_realised_with_the_system() {
    let mut system = ShaderSystem::new(config(), HeadlessDevice::new());
    assert!(!system.get_shader_for_name("textures/base/glass").is_realised());
    assert_eq!(system.device().live_textures(), 0);

    system.realise();
    let glass = system.library().shader("textures/base/glass").unwrap();
    let key = glass.editor_texture().unwrap();
    let texture = system.texture_manager().texture(key).unwrap();
    assert_eq!(texture.size(), (4, 4));
    assert_eq!(
        system.device().texture_size(texture.handle()),
        Some((4, 4))
    );
}

#[test]
fn unrealise_frees_every_gpu_object() {
    let mut system = realised_system(config());
    system.set_lighting_enabled(true);
    for name in ["textures/base/floor", "textures/wood/oak", "textures/nope"] {
        system.get_shader_for_name(name);
    }
    system.get_program("water_vp.glp", "water_fp.glp").unwrap();
    assert!(system.device().live_textures() > 0);
    assert_eq!(system.device().live_programs(), 6);

    system.unrealise();
    assert_eq!(system.device().live_textures(), 0);
    assert_eq!(system.device().live_programs(), 0);
    assert!(system.texture_manager().is_empty());
    // definitions outlive the GPU state
    assert_eq!(system.library().definition_count(), 4);

    system.realise();
    let floor = system.library().shader("textures/base/floor").unwrap();
    assert!(floor.is_realised());
}

#[test]
fn game_programs_are_cached_per_pair() {
    let mut system = realised_system(config());
    let a = system.get_program("water_vp.glp", "water_fp.glp").unwrap();
    let b = system.get_program("water_vp.glp", "water_fp.glp").unwrap();
    assert_eq!(a, b);
    assert_eq!(system.program_factory().program_count(), 1);
    assert!(system.program_factory().program(a).unwrap().is_created());
}

#[test]
fn missing_game_program_fails_once_per_realise() {
    let mut system = realised_system(config());
    assert!(system.get_program("water_vp.glp", "absent_fp.glp").is_err());
    let key = system.get_program("water_vp.glp", "absent_fp.glp").unwrap();
    assert!(!system.program_factory().program(key).unwrap().is_created());

    system.unrealise();
    system.realise();
    assert!(system.get_program("water_vp.glp", "absent_fp.glp").is_err());
}

#[test]
fn driver_rejected_program_is_logged_not_fatal() {
    let mut system = realised_system(config());
    let key = system.get_program("water_vp.glp", "broken_fp.glp").unwrap();
    assert!(system.program_factory().program(key).unwrap().is_created());
}

#[test]
fn switching_to_glsl_while_realised() {
    let mut system = realised_system(config());
    assert_eq!(system.device().live_programs(), 4);

    system.set_using_glsl(true);
    let bump = system.get_built_in_program("bumpMap").unwrap();
    assert_eq!(bump.kind(), ProgramKind::Glsl);
    assert!(bump.is_created());
    assert_eq!(system.device().live_programs(), 2);

    system.enable_built_in_program("bumpMap").unwrap();
    assert!(system.device().bound_glsl_program().is_some());
    system.disable_built_in_program("bumpMap").unwrap();
    assert!(system.device().bound_glsl_program().is_none());
}

#[test]
fn refresh_reloads_and_stays_realised() {
    let mut system = realised_system(config());
    system.get_shader_for_name("textures/base/floor");
    system.refresh();

    assert!(system.is_realised());
    assert_eq!(system.library().definition_count(), 4);
    assert_eq!(system.active_shaders().count(), 0);
    assert_eq!(system.device().live_textures(), 0);
}

#[test]
fn config_file_drives_the_system() {
    let path = std::env::temp_dir().join(format!("shader-system-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        format!(
            "runtime_data_path = {:?}\nbase_path = {:?}\nuse_glsl = true\n",
            data_dir().display().to_string(),
            data_dir().display().to_string()
        ),
    )
    .unwrap();

    let config = ShaderSystemConfig::load_from_file(&path).unwrap();
    let system = realised_system(config);
    assert_eq!(system.texture_prefix(), "textures/");
    assert_eq!(
        system.get_built_in_program("depthFill").unwrap().kind(),
        ProgramKind::Glsl
    );
    assert_eq!(shader_names(&system).len(), 4);
}
