//! Renderer-agnostic draw list.
//!
//! A loader fills a [`Frame`] each tick with sprites and line segments in
//! two layers: a perspective `world` layer and a pixel-space `overlay`.
//! The GPU backend turns each layer into two instanced draws, so nothing in
//! the simulation touches wgpu and every loader can be tested headless.

use glam::{Mat4, Vec2, Vec3};

/// Sprite shape selector, read by the fragment shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Shape {
    /// Gaussian falloff, used for point clouds.
    SoftDisc = 0,
    /// Hard-edged filled disc.
    Disc = 1,
    /// Annulus. `param` is the stroke width as a fraction of the radius.
    Ring = 2,
    /// Filled square.
    Square = 3,
    /// Wide halo with a quadratic falloff.
    Glow = 4,
}

/// One instanced quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    /// World position, or pixel position (z ignored) in the overlay.
    pub position: Vec3,
    /// Diameter in world units (attenuated layers) or pixels.
    pub size: f32,
    /// Linear RGBA, alpha not premultiplied.
    pub color: [f32; 4],
    pub shape: Shape,
    /// Shape-specific parameter.
    pub param: f32,
}

impl Sprite {
    pub fn new(position: Vec3, size: f32, color: [f32; 4]) -> Self {
        Self {
            position,
            size,
            color,
            shape: Shape::SoftDisc,
            param: 0.0,
        }
    }

    pub fn with_shape(mut self, shape: Shape, param: f32) -> Self {
        self.shape = shape;
        self.param = param;
        self
    }
}

/// One line segment expanded to a screen-space quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
    /// Width in pixels.
    pub width: f32,
    /// Linear RGBA, alpha not premultiplied.
    pub color: [f32; 4],
}

impl Segment {
    pub fn new(start: Vec3, end: Vec3, width: f32, color: [f32; 4]) -> Self {
        Self { start, end, width, color }
    }
}

/// How a layer composites onto the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Source alpha over.
    #[default]
    Alpha,
    /// Colors accumulate, so overlapping glows brighten.
    Additive,
}

/// Linear depth fog toward the clear color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub near: f32,
    pub far: f32,
}

/// A set of primitives sharing one transform and blend mode.
///
/// Segments are drawn before sprites.
#[derive(Debug, Clone)]
pub struct Layer {
    pub view_proj: Mat4,
    pub model: Mat4,
    /// Sprite sizes shrink with distance.
    pub attenuate: bool,
    pub fog: Option<Fog>,
    pub blend: BlendMode,
    pub sprites: Vec<Sprite>,
    pub segments: Vec<Segment>,
}

impl Layer {
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            attenuate: false,
            fog: None,
            blend: BlendMode::Alpha,
            sprites: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Drop last frame's primitives, keeping allocations.
    pub fn clear(&mut self) {
        self.sprites.clear();
        self.segments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty() && self.segments.is_empty()
    }

    pub fn segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn sprite(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

/// Viewport in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Orthographic projection mapping pixels (origin top left, y down)
    /// to clip space.
    pub fn pixel_projection(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.width, self.height, 0.0, -1.0, 1.0)
    }
}

/// Everything drawn in one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub clear: [f32; 4],
    pub world: Layer,
    pub overlay: Layer,
}

impl Frame {
    pub fn new(viewport: Viewport) -> Self {
        let mut overlay = Layer::new();
        overlay.view_proj = viewport.pixel_projection();
        Self {
            clear: [0.0, 0.0, 0.0, 1.0],
            world: Layer::new(),
            overlay,
        }
    }

    /// Reset both layers for a new frame at the given viewport.
    pub fn begin(&mut self, viewport: Viewport) {
        self.world.clear();
        self.overlay.clear();
        self.overlay.view_proj = viewport.pixel_projection();
        self.overlay.model = Mat4::IDENTITY;
        self.overlay.attenuate = false;
        self.overlay.fog = None;
    }

    pub fn primitive_count(&self) -> usize {
        self.world.sprites.len()
            + self.world.segments.len()
            + self.overlay.sprites.len()
            + self.overlay.segments.len()
    }
}

/// A loader the driver can mount.
///
/// `update` is the whole simulation step; `draw` only reads state. Neither
/// touches the window or the GPU.
pub trait Visualization {
    /// Advance to time `t` (seconds since mount), `dt` seconds after the
    /// previous update.
    fn update(&mut self, t: f32, dt: f32);

    /// Emit this frame's primitives.
    fn draw(&self, frame: &mut Frame, viewport: Viewport);

    /// Pointer moved, in window pixels.
    fn pointer_moved(&mut self, position: Vec2, viewport: Viewport);

    /// Window resized. Rebuilds projection state only.
    fn resized(&mut self, viewport: Viewport);

    /// Loading has finished; play out the current cycle and hold.
    fn set_loaded(&mut self, t: f32);

    /// Short status label for the window title.
    fn status(&self) -> &str;
}
