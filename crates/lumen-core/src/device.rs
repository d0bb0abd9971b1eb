use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Memory space holding tensor storage.
///
/// Formats and parses as `KIND:INDEX`, e.g. `CPU:0` or `CUDA:1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    /// Host memory. There is exactly one, `CPU:0`.
    #[default]
    Cpu,
    /// CUDA GPU with device index
    Cuda(usize),
}

impl Device {
    /// Whether this is a CPU device.
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }

    /// Whether this is a CUDA device.
    pub fn is_cuda(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }

    /// Get the device index (`0` for the host).
    pub fn index(&self) -> usize {
        match self {
            Device::Cpu => 0,
            Device::Cuda(idx) => *idx,
        }
    }

    /// Whether storage can be allocated on this device in this build.
    ///
    /// Only host memory has a backend.
    pub fn is_available(&self) -> bool {
        self.is_cpu()
    }

    /// All devices storage can be allocated on, host first.
    pub fn available() -> Vec<Device> {
        vec![Device::Cpu]
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "CPU:0"),
            Device::Cuda(idx) => write!(f, "CUDA:{idx}"),
        }
    }
}

impl FromStr for Device {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || CoreError::ParseDevice(s.to_string());
        let (kind, index) = match s.split_once(':') {
            Some((kind, index)) => (kind, Some(index.parse::<usize>().map_err(|_| bad())?)),
            None => (s, None),
        };
        match (kind.to_ascii_lowercase().as_str(), index) {
            ("cpu", None | Some(0)) => Ok(Device::Cpu),
            ("cuda", Some(idx)) => Ok(Device::Cuda(idx)),
            ("cuda", None) => Ok(Device::Cuda(0)),
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for Device {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_properties() {
        assert!(Device::Cpu.is_cpu());
        assert!(!Device::Cpu.is_cuda());
        assert!(Device::Cuda(0).is_cuda());
        assert_eq!(Device::Cuda(1).index(), 1);
        assert_eq!(Device::Cpu.index(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Device::Cpu), "CPU:0");
        assert_eq!(format!("{}", Device::Cuda(0)), "CUDA:0");
    }

    #[test]
    fn test_parse() {
        assert_eq!("CPU:0".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA:2".parse::<Device>().unwrap(), Device::Cuda(2));
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda(0));
        assert!("CPU:1".parse::<Device>().is_err());
        assert!("CUDA:x".parse::<Device>().is_err());
        assert!("TPU:0".parse::<Device>().is_err());
    }

    #[test]
    fn test_default() {
        assert_eq!(Device::default(), Device::Cpu);
        assert_eq!(Device::default().to_string(), "CPU:0");
    }

    #[test]
    fn test_available() {
        let devices = Device::available();
        assert_eq!(devices.first(), Some(&Device::Cpu));
        assert!(devices.iter().all(Device::is_available));
        assert!(!Device::Cuda(0).is_available());
    }

    #[test]
    fn test_serde_string_form() {
        assert_eq!(serde_json::to_string(&Device::Cuda(3)).unwrap(), "\"CUDA:3\"");
        let d: Device = serde_json::from_str("\"CPU:0\"").unwrap();
        assert_eq!(d, Device::Cpu);
        assert!(serde_json::from_str::<Device>("\"GPU\"").is_err());
    }
}
