//! Generated WGSL must parse and validate before it ever reaches a device.

use naga::valid::{Capabilities, ValidationFlags, Validator};

fn validate(name: &str, source: &str) {
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => panic!("{name} failed to parse:\n{}", e.emit_to_string(source)),
    };
    if let Err(e) = Validator::new(ValidationFlags::all(), Capabilities::all()).validate(&module) {
        panic!("{name} failed validation: {e:?}");
    }
}

#[test]
fn test_sprite_shader_validates() {
    validate("sprite", &neuroboot::shader::sprite_shader());
}

#[test]
fn test_segment_shader_validates() {
    validate("segment", &neuroboot::shader::segment_shader());
}

#[test]
fn test_shaders_have_entry_points() {
    for source in [neuroboot::shader::sprite_shader(), neuroboot::shader::segment_shader()] {
        let module = naga::front::wgsl::parse_str(&source).unwrap();
        let names: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"vs_main"), "{names:?}");
        assert!(names.contains(&"fs_main"), "{names:?}");
    }
}
