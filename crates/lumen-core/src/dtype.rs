use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Element data types supported by lumen tensors.
///
/// The set is closed: anything a tensor can hold is one of these variants, so
/// geometry types built on top inherit the same list without re-validating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// 32-bit IEEE 754 single-precision float
    Float32,
    /// 64-bit IEEE 754 double-precision float
    Float64,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// Boolean, stored as one byte (0 or 1)
    Bool,
}

impl DType {
    /// Every supported dtype, in declaration order.
    pub const ALL: [DType; 7] = [
        DType::Float32,
        DType::Float64,
        DType::Int32,
        DType::Int64,
        DType::UInt8,
        DType::UInt16,
        DType::Bool,
    ];

    /// Size in bytes of a single element.
    pub fn byte_size(&self) -> usize {
        match self {
            DType::Float32 | DType::Int32 => 4,
            DType::Float64 | DType::Int64 => 8,
            DType::UInt16 => 2,
            DType::UInt8 | DType::Bool => 1,
        }
    }

    /// Number of bytes needed to store `n` elements of this dtype, or `None`
    /// if that does not fit in `usize`.
    pub fn storage_bytes(&self, n: usize) -> Option<usize> {
        self.byte_size().checked_mul(n)
    }

    /// Whether this dtype is a floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    /// Whether this dtype is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(self, DType::Int32 | DType::Int64 | DType::UInt8 | DType::UInt16)
    }

    fn name(&self) -> &'static str {
        match self {
            DType::Float32 => "Float32",
            DType::Float64 => "Float64",
            DType::Int32 => "Int32",
            DType::Int64 => "Int64",
            DType::UInt8 => "UInt8",
            DType::UInt16 => "UInt16",
            DType::Bool => "Bool",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = CoreError;

    /// Accepts the variant name (`"UInt8"`) or the short form (`"u8"`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dtype = match s.to_ascii_lowercase().as_str() {
            "float32" | "f32" => DType::Float32,
            "float64" | "f64" => DType::Float64,
            "int32" | "i32" => DType::Int32,
            "int64" | "i64" => DType::Int64,
            "uint8" | "u8" => DType::UInt8,
            "uint16" | "u16" => DType::UInt16,
            "bool" => DType::Bool,
            _ => return Err(CoreError::ParseDType(s.to_string())),
        };
        Ok(dtype)
    }
}

/// A Rust scalar type that maps onto exactly one [`DType`].
///
/// Elements are read and written through native-endian byte slices of length
/// `DTYPE.byte_size()`; storage buffers carry no alignment guarantee.
pub trait Element: Copy + Send + Sync + 'static {
    /// The dtype tag for this element type.
    const DTYPE: DType;

    /// Decode one element from exactly `DTYPE.byte_size()` bytes.
    fn read_ne(bytes: &[u8]) -> Self;

    /// Encode this element into exactly `DTYPE.byte_size()` bytes.
    fn write_ne(self, out: &mut [u8]);
}

macro_rules! impl_pod_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                fn read_ne(bytes: &[u8]) -> Self {
                    bytemuck::pod_read_unaligned(bytes)
                }

                fn write_ne(self, out: &mut [u8]) {
                    out.copy_from_slice(bytemuck::bytes_of(&self));
                }
            }
        )*
    };
}

impl_pod_element!(
    f32 => Float32,
    f64 => Float64,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
);

// bool is not Pod: any non-zero byte reads as true.
impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn read_ne(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    fn write_ne(self, out: &mut [u8]) {
        out[0] = u8::from(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_sizes() {
        assert_eq!(DType::Float32.byte_size(), 4);
        assert_eq!(DType::Float64.byte_size(), 8);
        assert_eq!(DType::Int32.byte_size(), 4);
        assert_eq!(DType::Int64.byte_size(), 8);
        assert_eq!(DType::UInt8.byte_size(), 1);
        assert_eq!(DType::UInt16.byte_size(), 2);
        assert_eq!(DType::Bool.byte_size(), 1);
        assert_eq!(DType::UInt16.storage_bytes(10), Some(20));
        assert_eq!(DType::Int64.storage_bytes(usize::MAX / 4), None);
    }

    #[test]
    fn test_dtype_categories() {
        assert!(DType::Float32.is_float());
        assert!(!DType::Float32.is_integer());
        assert!(DType::UInt16.is_integer());
        assert!(!DType::Bool.is_integer());
        assert!(!DType::Bool.is_float());
    }

    #[test]
    fn test_display_parse() {
        for dtype in DType::ALL {
            assert_eq!(dtype.to_string().parse::<DType>().unwrap(), dtype);
        }
        assert_eq!("u8".parse::<DType>().unwrap(), DType::UInt8);
        assert_eq!("FLOAT64".parse::<DType>().unwrap(), DType::Float64);
        assert!(matches!("f16".parse::<DType>(), Err(CoreError::ParseDType(_))));
    }

    #[test]
    fn test_serde_uses_variant_names() {
        let json = serde_json::to_string(&DType::UInt16).unwrap();
        assert_eq!(json, "\"UInt16\"");
        let back: DType = serde_json::from_str("\"Bool\"").unwrap();
        assert_eq!(back, DType::Bool);
    }

    #[test]
    fn test_element_encoding() {
        let mut buf = [0u8; 8];
        (-3i64).write_ne(&mut buf);
        assert_eq!(i64::read_ne(&buf), -3);

        let mut buf = [0u8; 2];
        513u16.write_ne(&mut buf);
        assert_eq!(u16::read_ne(&buf), 513);

        let mut buf = [0u8; 1];
        true.write_ne(&mut buf);
        assert_eq!(buf, [1]);
        assert!(bool::read_ne(&[7]));
        assert!(!bool::read_ne(&[0]));
    }
}
