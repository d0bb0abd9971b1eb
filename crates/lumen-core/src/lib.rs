//! # lumen-core
//!
//! Minimal tensor layer for the lumen geometry types.
//!
//! Provides the `Tensor` type with:
//! - A closed set of dtypes (Float32, Float64, Int32, Int64, UInt8, UInt16, Bool)
//! - Device tags (`CPU:0`, `CUDA:n`); host memory is the only allocation backend
//! - Zero-copy views (reshape, slice) over reference-counted shared storage
//! - Aliasing checks (`Tensor::is_same`) and contiguity reporting

pub mod dtype;
pub mod device;
pub mod storage;
pub mod shape;
pub mod tensor;
pub mod error;
pub mod prelude;

pub use dtype::{DType, Element};
pub use device::Device;
pub use storage::Storage;
pub use shape::Shape;
pub use tensor::Tensor;
pub use error::CoreError;

pub type Result<T> = std::result::Result<T, CoreError>;
