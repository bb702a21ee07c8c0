//! Instanced sprite quads: neurons, packets, gate nodes and the enter rings.

use super::{create_instanced_pipeline, InstanceBuffer};
use crate::frame::BlendMode;
use crate::shader::{sprite_shader, SpriteInstance};

pub struct SpritePipeline {
    alpha: wgpu::RenderPipeline,
    additive: wgpu::RenderPipeline,
}

impl SpritePipeline {
    pub fn new(device: &wgpu::Device, layout: &wgpu::PipelineLayout, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(sprite_shader().into()),
        });

        let instance_layout = || wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &SpriteInstance::ATTRIBUTES,
        };

        Self {
            alpha: create_instanced_pipeline(
                device,
                "Sprite Pipeline (alpha)",
                &shader,
                layout,
                instance_layout(),
                format,
                BlendMode::Alpha,
            ),
            additive: create_instanced_pipeline(
                device,
                "Sprite Pipeline (additive)",
                &shader,
                layout,
                instance_layout(),
                format,
                BlendMode::Additive,
            ),
        }
    }

    /// Draw `instances` with the layer's bind group already set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, blend: BlendMode, instances: &InstanceBuffer) {
        if instances.is_empty() {
            return;
        }
        let pipeline = match blend {
            BlendMode::Alpha => &self.alpha,
            BlendMode::Additive => &self.additive,
        };
        pass.set_pipeline(pipeline);
        pass.set_vertex_buffer(0, instances.slice());
        pass.draw(0..6, 0..instances.len());
    }
}
