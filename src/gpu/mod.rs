//! wgpu backend for the draw list in [`crate::frame`].
//!
//! Each [`Layer`] owns a uniform buffer and two growable instance buffers.
//! A frame is one render pass: clear, then per layer the segments and
//! sprites, world before overlay.

mod connections;
mod sprites;

use std::sync::Arc;

use bytemuck::Pod;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::GpuError;
use crate::frame::{BlendMode, Frame, Layer, Viewport};
use crate::shader::{LayerUniforms, SegmentInstance, SpriteInstance};

pub use connections::SegmentPipeline;
pub use sprites::SpritePipeline;

/// Smallest instance buffer allocation, in instances.
const MIN_INSTANCES: usize = 256;

/// Color blend state for a layer's blend mode.
pub fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
    }
}

/// Build one instanced triangle-list pipeline (six vertices per instance,
/// no depth buffer).
fn create_instanced_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    instance_layout: wgpu::VertexBufferLayout<'_>,
    format: wgpu::TextureFormat,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[instance_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend_state(blend)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Vertex buffer of per-instance data that grows to fit.
pub struct InstanceBuffer {
    buffer: wgpu::Buffer,
    label: &'static str,
    stride: usize,
    capacity: usize,
    len: u32,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, label: &'static str, stride: usize) -> Self {
        Self {
            buffer: Self::allocate(device, label, stride, MIN_INSTANCES),
            label,
            stride,
            capacity: MIN_INSTANCES,
            len: 0,
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, stride: usize, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (stride * capacity) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Replace the contents, reallocating when `data` outgrows the buffer.
    fn write<T: Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        if data.len() > self.capacity {
            self.capacity = data.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.stride, self.capacity);
            tracing::debug!(buffer = self.label, capacity = self.capacity, "grew instance buffer");
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.len = data.len() as u32;
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..(self.len as usize * self.stride) as wgpu::BufferAddress)
    }
}

/// GPU copy of one [`Layer`].
struct LayerResources {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    sprites: InstanceBuffer,
    segments: InstanceBuffer,
    sprite_scratch: Vec<SpriteInstance>,
    segment_scratch: Vec<SegmentInstance>,
    blend: BlendMode,
}

impl LayerResources {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, name: &'static str) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(name),
            contents: bytemuck::bytes_of(&LayerUniforms::new(&Layer::new(), Viewport::new(1, 1))),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        Self {
            uniform_buffer,
            bind_group,
            sprites: InstanceBuffer::new(device, "Sprite Instances", std::mem::size_of::<SpriteInstance>()),
            segments: InstanceBuffer::new(device, "Segment Instances", std::mem::size_of::<SegmentInstance>()),
            sprite_scratch: Vec::new(),
            segment_scratch: Vec::new(),
            blend: BlendMode::Alpha,
        }
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layer: &Layer, viewport: Viewport) {
        let uniforms = LayerUniforms::new(layer, viewport);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        self.sprite_scratch.clear();
        self.sprite_scratch.extend(layer.sprites.iter().map(SpriteInstance::from));
        self.sprites.write(device, queue, &self.sprite_scratch);

        self.segment_scratch.clear();
        self.segment_scratch.extend(layer.segments.iter().map(SegmentInstance::from));
        self.segments.write(device, queue, &self.segment_scratch);

        self.blend = layer.blend;
    }
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    sprites: SpritePipeline,
    segments: SegmentPipeline,
    world: LayerResources,
    overlay: LayerResources,
}

impl GpuState {
    /// Acquire a surface, adapter and device for `window`.
    ///
    /// Any failure means the environment cannot show the loader.
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let layer_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layer Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Layer Pipeline Layout"),
            bind_group_layouts: &[&layer_layout],
            push_constant_ranges: &[],
        });

        let sprites = SpritePipeline::new(&device, &pipeline_layout, surface_format);
        let segments = SegmentPipeline::new(&device, &pipeline_layout, surface_format);
        let world = LayerResources::new(&device, &layer_layout, "World Layer");
        let overlay = LayerResources::new(&device, &layer_layout, "Overlay Layer");

        tracing::info!(
            adapter = %adapter.get_info().name,
            format = ?surface_format,
            width = config.width,
            height = config.height,
            "gpu ready"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            sprites,
            segments,
            world,
            overlay,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure after the surface was lost or went stale.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    pub fn render(&mut self, frame: &Frame) -> Result<(), wgpu::SurfaceError> {
        let viewport = self.viewport();
        self.world.upload(&self.device, &self.queue, &frame.world, viewport);
        self.overlay.upload(&self.device, &self.queue, &frame.overlay, viewport);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b, a] = frame.clear;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for layer in [&self.world, &self.overlay] {
                render_pass.set_bind_group(0, &layer.bind_group, &[]);
                self.segments.draw(&mut render_pass, layer.blend, &layer.segments);
                self.sprites.draw(&mut render_pass, layer.blend, &layer.sprites);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
