//! WGSL sources and the GPU-side layouts they read.
//!
//! Both pipelines draw six vertices per instance and expand them in the
//! vertex shader, so the only vertex buffers are the per-instance arrays
//! below.

use bytemuck::{Pod, Zeroable};

use crate::frame::{Layer, Segment, Sprite, Viewport};

/// Per-layer uniforms. Matches `LayerUniforms` in both shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LayerUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    /// Fog near and far view depth.
    pub fog: [f32; 2],
    pub attenuate: u32,
    pub fog_enabled: u32,
    pub _padding: [f32; 2],
}

impl LayerUniforms {
    pub fn new(layer: &Layer, viewport: Viewport) -> Self {
        let (fog, fog_enabled) = match layer.fog {
            Some(f) => ([f.near, f.far], 1),
            None => ([0.0, 0.0], 0),
        };
        Self {
            view_proj: layer.view_proj.to_cols_array_2d(),
            model: layer.model.to_cols_array_2d(),
            viewport: [viewport.width, viewport.height],
            fog,
            attenuate: layer.attenuate as u32,
            fog_enabled,
            _padding: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpriteInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
    pub shape: u32,
    pub param: f32,
}

impl From<&Sprite> for SpriteInstance {
    fn from(s: &Sprite) -> Self {
        Self {
            position: s.position.to_array(),
            size: s.size,
            color: s.color,
            shape: s.shape as u32,
            param: s.param,
        }
    }
}

impl SpriteInstance {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32,
        2 => Float32x4,
        3 => Uint32,
        4 => Float32
    ];
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SegmentInstance {
    pub start: [f32; 3],
    pub width: f32,
    pub end: [f32; 3],
    pub color: [f32; 4],
}

impl From<&Segment> for SegmentInstance {
    fn from(s: &Segment) -> Self {
        Self {
            start: s.start.to_array(),
            width: s.width,
            end: s.end.to_array(),
            color: s.color,
        }
    }
}

impl SegmentInstance {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32,
        2 => Float32x3,
        3 => Float32x4
    ];
}

const LAYER_UNIFORMS: &str = r#"
struct LayerUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    viewport: vec2<f32>,
    fog: vec2<f32>,
    attenuate: u32,
    fog_enabled: u32,
    _padding: vec2<f32>,
};

@group(0) @binding(0) var<uniform> uniforms: LayerUniforms;

fn fog_factor(depth: f32) -> f32 {
    if uniforms.fog_enabled == 0u {
        return 1.0;
    }
    return 1.0 - smoothstep(uniforms.fog.x, uniforms.fog.y, depth);
}
"#;

const SPRITE_BODY: &str = r#"
struct SpriteIn {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) color: vec4<f32>,
    @location(3) shape: u32,
    @location(4) param: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) @interpolate(flat) shape: u32,
    @location(3) param: f32,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, sprite: SpriteIn) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
    );
    let corner = corners[vertex_index];

    let center = uniforms.view_proj * uniforms.model * vec4<f32>(sprite.position, 1.0);

    // Attenuated sprites are `size` world units across; the rest `size` pixels.
    var half_extent: vec2<f32>;
    if uniforms.attenuate != 0u {
        half_extent = sprite.size * 0.5 * vec2<f32>(uniforms.viewport.y / uniforms.viewport.x, 1.0);
    } else {
        half_extent = sprite.size / uniforms.viewport * center.w;
    }

    var out: VertexOutput;
    out.clip_position = center + vec4<f32>(corner * half_extent, 0.0, 0.0);
    out.uv = corner;
    out.color = vec4<f32>(sprite.color.rgb, sprite.color.a * fog_factor(center.w));
    out.shape = sprite.shape;
    out.param = sprite.param;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let r = length(in.uv);
    let aa = max(fwidth(r), 1e-4);

    var coverage = 1.0;
    switch in.shape {
        case 0u: {
            coverage = exp(-r * r * 4.0) * (1.0 - step(1.0, r));
        }
        case 1u: {
            coverage = 1.0 - smoothstep(1.0 - aa, 1.0, r);
        }
        case 2u: {
            let inner = 1.0 - in.param;
            coverage = smoothstep(inner - aa, inner, r) * (1.0 - smoothstep(1.0 - aa, 1.0, r));
        }
        case 3u: {
            coverage = 1.0;
        }
        default: {
            let falloff = max(1.0 - r, 0.0);
            coverage = falloff * falloff;
        }
    }

    if coverage <= 0.0 {
        discard;
    }
    return vec4<f32>(in.color.rgb, in.color.a * coverage);
}
"#;

const SEGMENT_BODY: &str = r#"
struct SegmentIn {
    @location(0) start: vec3<f32>,
    @location(1) width: f32,
    @location(2) end: vec3<f32>,
    @location(3) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, segment: SegmentIn) -> VertexOutput {
    // x picks the endpoint, y the side of the line
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, -1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
    );
    let corner = corners[vertex_index];

    let transform = uniforms.view_proj * uniforms.model;
    let a = transform * vec4<f32>(segment.start, 1.0);
    let b = transform * vec4<f32>(segment.end, 1.0);

    let screen_a = a.xy / a.w * uniforms.viewport;
    let screen_b = b.xy / b.w * uniforms.viewport;
    let delta = screen_b - screen_a;
    var dir = vec2<f32>(1.0, 0.0);
    if dot(delta, delta) > 1e-8 {
        dir = normalize(delta);
    }
    let normal = vec2<f32>(-dir.y, dir.x);

    let clip = mix(a, b, corner.x);
    let offset = normal * corner.y * segment.width / uniforms.viewport * clip.w;

    var out: VertexOutput;
    out.clip_position = clip + vec4<f32>(offset, 0.0, 0.0);
    out.color = vec4<f32>(segment.color.rgb, segment.color.a * fog_factor(clip.w));
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Full WGSL for the sprite pipeline.
pub fn sprite_shader() -> String {
    format!("{LAYER_UNIFORMS}{SPRITE_BODY}")
}

/// Full WGSL for the segment pipeline.
pub fn segment_shader() -> String {
    format!("{LAYER_UNIFORMS}{SEGMENT_BODY}")
}
