//! Core types shared across all muxvet crates.
//!
//! Defines the styled-cell vocabulary (RGB colors, style keys, attribute
//! maps), terminal dimensions, multiplexer version handling, and the error
//! taxonomy used by the terminal and harness crates.

pub mod dims;
pub mod error;
pub mod style;
pub mod version;

pub use dims::Dimensions;
pub use error::MuxvetError;
pub use style::{AttributeMap, Label, Rgb, StyleKey};
pub use version::Version;
