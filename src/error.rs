//! Error types for Neuroboot.
//!
//! Nothing here is meant to reach the user: the driver logs these and
//! unmounts the loader, leaving the page (or desktop) without animation.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter(wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    NoSurfaceFormat,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter(e) => write!(f, "No compatible GPU adapter found: {}", e),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::NoSurfaceFormat => write!(f, "Surface exposes no texture formats"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::NoAdapter(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoSurfaceFormat => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestAdapterError> for GpuError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        GpuError::NoAdapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors raised while loading or validating a [`LoaderConfig`](crate::LoaderConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    Io(std::io::Error),
    /// The config file is not valid JSON for this schema.
    Parse(serde_json::Error),
    /// A phase schedule needs at least one phase.
    EmptySchedule,
    /// Phase durations must be finite and strictly positive.
    PhaseDuration { index: usize, duration: f32 },
    /// A numeric field is outside its allowed range.
    Range { field: &'static str },
    /// The gate pulse path names a node that does not exist.
    PulsePath { node: usize, count: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::EmptySchedule => write!(f, "Phase schedule has no phases"),
            ConfigError::PhaseDuration { index, duration } => {
                write!(f, "Phase {} has invalid duration {}", index, duration)
            }
            ConfigError::Range { field } => write!(f, "Config field `{}` is out of range", field),
            ConfigError::PulsePath { node, count } => {
                write!(f, "Pulse path references node {} but only {} nodes exist", node, count)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that can occur when running a loader.
#[derive(Debug)]
pub enum LoaderError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            LoaderError::Window(e) => write!(f, "Failed to create window: {}", e),
            LoaderError::Gpu(e) => write!(f, "GPU error: {}", e),
            LoaderError::Config(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl std::error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoaderError::EventLoop(e) => Some(e),
            LoaderError::Window(e) => Some(e),
            LoaderError::Gpu(e) => Some(e),
            LoaderError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for LoaderError {
    fn from(e: winit::error::EventLoopError) -> Self {
        LoaderError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for LoaderError {
    fn from(e: winit::error::OsError) -> Self {
        LoaderError::Window(e)
    }
}

impl From<GpuError> for LoaderError {
    fn from(e: GpuError) -> Self {
        LoaderError::Gpu(e)
    }
}

impl From<ConfigError> for LoaderError {
    fn from(e: ConfigError) -> Self {
        LoaderError::Config(e)
    }
}
