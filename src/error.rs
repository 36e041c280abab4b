// SPDX-License-Identifier: GPL-3.0-only

//! Closed error taxonomy shared by every component in the core.

use thiserror::Error;

/// Stable failure kinds. Every public entry point in the core returns one of
/// these (wrapped in a `Result`) rather than panicking.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SwlError {
    #[error("out of memory")]
    NoMem,
    #[error("backend error")]
    Backend,
    #[error("configuration error")]
    Config,
    #[error("wayland protocol error")]
    Wayland,
    #[error("invalid argument")]
    InvalidArg,
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("i/o error")]
    Io,
    #[error("xwayland error")]
    XWayland,
}

impl SwlError {
    /// Stable string form, matching what a CLI reports on exit.
    pub fn error_string(self) -> &'static str {
        match self {
            SwlError::NoMem => "out of memory",
            SwlError::Backend => "backend error",
            SwlError::Config => "configuration error",
            SwlError::Wayland => "wayland protocol error",
            SwlError::InvalidArg => "invalid argument",
            SwlError::NotFound => "not found",
            SwlError::AlreadyExists => "already exists",
            SwlError::Io => "i/o error",
            SwlError::XWayland => "xwayland error",
        }
    }
}

pub type Result<T> = std::result::Result<T, SwlError>;
