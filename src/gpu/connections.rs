//! Line segments between neurons, expanded to screen-space quads.
//!
//! Line-list primitives are one pixel wide on most backends, so every
//! segment becomes two triangles whose width is given in pixels.

use super::{create_instanced_pipeline, InstanceBuffer};
use crate::frame::BlendMode;
use crate::shader::{segment_shader, SegmentInstance};

pub struct SegmentPipeline {
    alpha: wgpu::RenderPipeline,
    additive: wgpu::RenderPipeline,
}

impl SegmentPipeline {
    pub fn new(device: &wgpu::Device, layout: &wgpu::PipelineLayout, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Segment Shader"),
            source: wgpu::ShaderSource::Wgsl(segment_shader().into()),
        });

        let instance_layout = || wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SegmentInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &SegmentInstance::ATTRIBUTES,
        };

        Self {
            alpha: create_instanced_pipeline(
                device,
                "Segment Pipeline (alpha)",
                &shader,
                layout,
                instance_layout(),
                format,
                BlendMode::Alpha,
            ),
            additive: create_instanced_pipeline(
                device,
                "Segment Pipeline (additive)",
                &shader,
                layout,
                instance_layout(),
                format,
                BlendMode::Additive,
            ),
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, blend: BlendMode, instances: &InstanceBuffer) {
        if instances.is_empty() {
            return;
        }
        pass.set_pipeline(match blend {
            BlendMode::Alpha => &self.alpha,
            BlendMode::Additive => &self.additive,
        });
        pass.set_vertex_buffer(0, instances.slice());
        pass.draw(0..6, 0..instances.len());
    }
}
