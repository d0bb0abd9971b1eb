//! Convenience re-exports for common lumen-core types.
//!
//! ```rust
//! use lumen_core::prelude::*;
//! ```

pub use crate::Tensor;
pub use crate::DType;
pub use crate::Device;
pub use crate::Element;
pub use crate::Shape;
pub use crate::CoreError;
pub use crate::Result;
