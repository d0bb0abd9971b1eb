//! # lumen-geometry
//!
//! Geometry value types built on `lumen-core` tensors.
//!
//! [`Image`] is a rows × cols × channels view over a tensor. It either
//! allocates fresh storage or wraps a caller's tensor without copying, and
//! rejects shapes, channel counts and layouts it cannot represent.

pub mod descriptor;
pub mod error;
pub mod image;

pub use descriptor::ImageDescriptor;
pub use error::GeometryError;
pub use image::Image;

pub type Result<T> = std::result::Result<T, GeometryError>;
