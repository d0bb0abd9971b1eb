//! Serializable image configuration.

use lumen_core::{DType, Device};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Geometry, dtype and device of an image, as found in configuration files.
///
/// Values are not validated here; [`Image::from_descriptor`](crate::Image::from_descriptor)
/// applies the same checks as [`Image::new`](crate::Image::new).
///
/// ```json
/// { "rows": 480, "cols": 640, "channels": 3, "dtype": "UInt8", "device": "CPU:0" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageDescriptor {
    pub rows: i64,
    pub cols: i64,

    #[serde(default = "default_channels")]
    pub channels: i64,

    #[serde(default = "default_dtype")]
    pub dtype: DType,

    #[serde(default)]
    pub device: Device,
}

fn default_channels() -> i64 {
    1
}

fn default_dtype() -> DType {
    DType::Float32
}

impl ImageDescriptor {
    /// Single-channel Float32 on `CPU:0`.
    pub fn new(rows: i64, cols: i64) -> Self {
        Self {
            rows,
            cols,
            channels: default_channels(),
            dtype: default_dtype(),
            device: Device::default(),
        }
    }

    pub fn with_channels(mut self, channels: i64) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Parse a descriptor from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeometryError;

    #[test]
    fn test_from_json_full() {
        let desc = ImageDescriptor::from_json(
            r#"{ "rows": 480, "cols": 640, "channels": 3, "dtype": "UInt8", "device": "CPU:0" }"#,
        )
        .unwrap();
        assert_eq!(
            desc,
            ImageDescriptor::new(480, 640)
                .with_channels(3)
                .with_dtype(DType::UInt8)
                .with_device(Device::Cpu)
        );
    }

    #[test]
    fn test_from_json_defaults() {
        let desc = ImageDescriptor::from_json(r#"{ "rows": 2, "cols": 5 }"#).unwrap();
        assert_eq!(desc.channels, 1);
        assert_eq!(desc.dtype, DType::Float32);
        assert_eq!(desc.device, Device::Cpu);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        for json in [
            r#"{ "rows": 2 }"#,
            r#"{ "rows": 2, "cols": 2, "dtype": "Float16" }"#,
            r#"{ "rows": 2, "cols": 2, "device": "TPU:0" }"#,
            r#"{ "rows": 2, "cols": 2, "stride": 4 }"#,
        ] {
            let err = ImageDescriptor::from_json(json).unwrap_err();
            assert!(matches!(err, GeometryError::Config(_)), "{json}");
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let desc = ImageDescriptor::new(3, 4).with_dtype(DType::Bool).with_device(Device::Cuda(1));
        let json = desc.to_json().unwrap();
        assert!(json.contains("\"CUDA:1\""));
        assert_eq!(ImageDescriptor::from_json(&json).unwrap(), desc);
    }
}
