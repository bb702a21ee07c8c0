//! winit driver.
//!
//! Owns scheduling and teardown. The loader itself never sees the window:
//! each redraw the driver reads the clock, forwards the load signal, runs
//! `update`, turns clicks into the ready signal, collects a [`Frame`] and
//! hands it to the GPU. Every handler checks for a live [`Mount`] first,
//! so events arriving after teardown are ignored.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use crate::config::LoaderConfig;
use crate::cortex::CortexLoader;
use crate::enter::EnterButton;
use crate::error::LoaderError;
use crate::frame::{Frame, Visualization};
use crate::gate::SynapseGate;
use crate::gpu::GpuState;
use crate::input::{Input, KeyCode, MouseButton};
use crate::signals::{HoverState, LoadSignal};
use crate::spawn::rng_from_seed;
use crate::time::Clock;

/// Frames between fps log lines.
const FPS_LOG_INTERVAL: u64 = 600;

/// Which loader to mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// The 3D neuron cloud.
    #[default]
    Cortex,
    /// The lighter 2D gate.
    Gate,
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cortex" => Ok(Variant::Cortex),
            "gate" => Ok(Variant::Gate),
            other => Err(format!("unknown variant `{other}` (expected `cortex` or `gate`)")),
        }
    }
}

/// Builder and entry point for a loader window.
///
/// ```ignore
/// use neuroboot::prelude::*;
///
/// let signal = LoadSignal::new();
/// // hand `signal.clone()` to whatever loads the real assets
/// LoaderApp::new(LoaderConfig::default())
///     .with_variant(Variant::Gate)
///     .with_signal(signal)
///     .run()?;
/// ```
pub struct LoaderApp {
    config: LoaderConfig,
    variant: Variant,
    signal: LoadSignal,
}

impl LoaderApp {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            variant: Variant::default(),
            signal: LoadSignal::new(),
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Share load/ready flags with the host.
    pub fn with_signal(mut self, signal: LoadSignal) -> Self {
        self.signal = signal;
        self
    }

    /// A handle to this loader's flags.
    pub fn signal(&self) -> LoadSignal {
        self.signal.clone()
    }

    /// Open the window and block until the loader unmounts.
    ///
    /// An environment without a usable GPU is not an error: the loader logs
    /// a warning and returns without showing anything.
    pub fn run(self) -> Result<(), LoaderError> {
        self.config.validate()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut driver = Driver {
            config: self.config,
            variant: self.variant,
            signal: self.signal,
            mount: None,
            attempted: false,
        };
        event_loop.run_app(&mut driver)?;
        Ok(())
    }
}

/// Everything that exists only while the loader is on screen.
struct Mount {
    window: Arc<Window>,
    gpu: GpuState,
    visualization: Box<dyn Visualization>,
    enter: EnterButton,
    input: Input,
    clock: Clock,
    hover: HoverState,
    frame: Frame,
    loaded: bool,
    title: String,
    base_title: String,
}

/// What the driver should do after a frame.
enum Outcome {
    Continue,
    Unmount(&'static str),
}

impl Mount {
    fn new(config: &LoaderConfig, variant: Variant, event_loop: &ActiveEventLoop) -> Result<Self, LoaderError> {
        let render = &config.render;
        let mut attrs = Window::default_attributes()
            .with_title(render.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(render.width, render.height));
        if render.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(event_loop.create_window(attrs)?);
        let gpu = pollster::block_on(GpuState::new(window.clone()))?;
        let viewport = gpu.viewport();

        let mut rng = rng_from_seed(config.seed);
        let visualization: Box<dyn Visualization> = match variant {
            Variant::Cortex => Box::new(CortexLoader::new(config, viewport)?),
            Variant::Gate => Box::new(SynapseGate::new(config.gate.clone(), viewport, &mut rng)?),
        };
        let enter = EnterButton::new(config.enter, &mut rng);

        let mut input = Input::new();
        let size = window.inner_size();
        input.set_window_size(size.width, size.height);

        tracing::info!(?variant, width = size.width, height = size.height, "loader mounted");

        Ok(Self {
            window,
            gpu,
            visualization,
            enter,
            input,
            clock: Clock::new(),
            hover: HoverState::default(),
            frame: Frame::new(viewport),
            loaded: false,
            title: String::new(),
            base_title: render.title.clone(),
        })
    }

    fn redraw(&mut self, signal: &LoadSignal) -> Outcome {
        let (t, dt) = self.clock.update();

        if !self.loaded && signal.is_loaded() {
            self.loaded = true;
            self.visualization.set_loaded(t);
            self.enter.set_loaded(t);
            tracing::info!(t, "load complete");
        }

        self.visualization.update(t, dt);
        self.enter.update(t);

        let viewport = self.gpu.viewport();
        let pointer = self.input.mouse_position();
        let clicked =
            self.input.mouse_pressed(MouseButton::Left) && self.enter.accepts_click(pointer, viewport);
        let keyed = self.input.key_pressed(KeyCode::Enter) && self.enter.is_loaded();
        if (clicked || keyed) && signal.mark_ready() {
            tracing::info!(t, "user entered");
        }
        self.hover
            .set(self.enter.pointer_style(pointer, viewport), self.window.as_ref());
        self.input.begin_frame();

        if signal.is_ready() {
            return Outcome::Unmount("ready");
        }

        self.frame.begin(viewport);
        self.visualization.draw(&mut self.frame, viewport);
        self.enter.draw(&mut self.frame.overlay, viewport);
        self.sync_title();

        if self.clock.frame() % FPS_LOG_INTERVAL == 0 {
            tracing::debug!(
                fps = self.clock.fps(),
                primitives = self.frame.primitive_count(),
                "frame stats"
            );
        }

        match self.gpu.render(&self.frame) {
            Ok(()) => Outcome::Continue,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                Outcome::Continue
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::warn!("surface out of memory");
                Outcome::Unmount("out of memory")
            }
            Err(e) => {
                tracing::warn!(error = ?e, "render error");
                Outcome::Continue
            }
        }
    }

    fn sync_title(&mut self) {
        let status = self.visualization.status();
        let title = if status.is_empty() {
            format!("{} - {}", self.base_title, self.enter.label())
        } else {
            format!("{} - {} - {}", self.base_title, self.enter.label(), status)
        };
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }
}

struct Driver {
    config: LoaderConfig,
    variant: Variant,
    signal: LoadSignal,
    mount: Option<Mount>,
    /// Mounting is tried once; a failed environment stays failed.
    attempted: bool,
}

impl Driver {
    fn unmount(&mut self, event_loop: &ActiveEventLoop, reason: &str) {
        if let Some(mount) = self.mount.take() {
            tracing::info!(reason, frames = mount.clock.frame(), "loader unmounted");
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for Driver {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.mount.is_some() || self.attempted {
            return;
        }
        self.attempted = true;

        match Mount::new(&self.config, self.variant, event_loop) {
            Ok(mount) => {
                mount.window.request_redraw();
                self.mount = Some(mount);
            }
            Err(e) => {
                tracing::warn!(error = %e, "environment unavailable, loader not shown");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(mount) = self.mount.as_mut() else {
            return;
        };
        mount.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => self.unmount(event_loop, "closed"),
            WindowEvent::Resized(size) => {
                mount.gpu.resize(size);
                mount.visualization.resized(mount.gpu.viewport());
            }
            WindowEvent::CursorMoved { .. } => {
                let viewport = mount.gpu.viewport();
                mount
                    .visualization
                    .pointer_moved(mount.input.mouse_position(), viewport);
            }
            WindowEvent::RedrawRequested => match mount.redraw(&self.signal) {
                Outcome::Continue => mount.window.request_redraw(),
                Outcome::Unmount(reason) => self.unmount(event_loop, reason),
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing() {
        assert_eq!("cortex".parse::<Variant>(), Ok(Variant::Cortex));
        assert_eq!("gate".parse::<Variant>(), Ok(Variant::Gate));
        assert!("brain".parse::<Variant>().is_err());
        assert_eq!(Variant::default(), Variant::Cortex);
    }

    #[test]
    fn test_builder_shares_signal() {
        let signal = LoadSignal::new();
        let app = LoaderApp::new(LoaderConfig::default())
            .with_variant(Variant::Gate)
            .with_signal(signal.clone());
        assert_eq!(app.variant, Variant::Gate);
        app.signal().mark_loaded();
        assert!(signal.is_loaded());
    }
}
