//! Error types
//!
//! Initialization failures are fatal; runtime failures degrade instead of
//! erroring (see `sim::tick`).

use thiserror::Error;

/// Fatal errors raised while bringing up the world or its GPU resources
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Rendering to floating-point textures is required but not supported")]
    UnsupportedRenderTarget,
    #[error("Failed to allocate {what}: {reason}")]
    Allocation { what: &'static str, reason: String },
    #[error("Failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("Surface reports no supported texture formats")]
    NoSurfaceFormat,
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// OBJ/MTL import failures. The model is optional, so callers log these and
/// carry on without it.
#[derive(Error, Debug, PartialEq)]
pub enum MeshError {
    #[error("line {line}: invalid number `{token}`")]
    InvalidNumber { line: usize, token: String },
    #[error("line {line}: expected {expected} components, found {found}")]
    MissingComponents {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: index {index} out of range")]
    IndexOutOfRange { line: usize, index: i64 },
    #[error("mesh has no triangles")]
    Empty,
}
