//! Error types for the particle field.
//!
//! Errors cover resource acquisition (window, GPU), configuration loading
//! and per-frame rendering. Numeric degeneracy inside the simulation is
//! never an error: it is clamped where it happens.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur while loading or validating a [`FieldConfig`](crate::FieldConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    Io(std::io::Error),
    /// The file is not valid JSON for this schema.
    Json(serde_json::Error),
    /// A value is out of its meaningful range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to access config file: {}", e),
            ConfigError::Json(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid(_) => None,
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
        ConfigError::Json(e)
    }
}

/// Errors that prevent the field from being mounted.
#[derive(Debug)]
pub enum MountError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            MountError::Window(e) => write!(f, "Failed to create window: {}", e),
            MountError::Gpu(e) => write!(f, "GPU error: {}", e),
            MountError::Config(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl std::error::Error for MountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MountError::EventLoop(e) => Some(e),
            MountError::Window(e) => Some(e),
            MountError::Gpu(e) => Some(e),
            MountError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for MountError {
    fn from(e: winit::error::EventLoopError) -> Self {
        MountError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for MountError {
    fn from(e: winit::error::OsError) -> Self {
        MountError::Window(e)
    }
}

impl From<GpuError> for MountError {
    fn from(e: GpuError) -> Self {
        MountError::Gpu(e)
    }
}

impl From<ConfigError> for MountError {
    fn from(e: ConfigError) -> Self {
        MountError::Config(e)
    }
}

/// Errors reported by a render backend for a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The surface must be reconfigured before the next frame.
    SurfaceLost,
    /// The backend ran out of memory; rendering cannot continue.
    OutOfMemory,
    /// Any other transient failure. The frame is skipped.
    Other(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::SurfaceLost => write!(f, "Render surface lost"),
            RenderError::OutOfMemory => write!(f, "Render backend out of memory"),
            RenderError::Other(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(e: wgpu::SurfaceError) -> Self {
        match e {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            other => RenderError::Other(format!("{:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = MountError::from(ConfigError::from(io));
        assert!(err.to_string().contains("missing"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_surface_error_mapping() {
        assert_eq!(RenderError::from(wgpu::SurfaceError::Lost), RenderError::SurfaceLost);
        assert_eq!(RenderError::from(wgpu::SurfaceError::Outdated), RenderError::SurfaceLost);
        assert_eq!(RenderError::from(wgpu::SurfaceError::OutOfMemory), RenderError::OutOfMemory);
        assert!(matches!(RenderError::from(wgpu::SurfaceError::Timeout), RenderError::Other(_)));
    }
}
