use std::sync::Arc;

use parking_lot::RwLock;

use crate::dtype::Element;
use crate::{CoreError, DType, Device, Result};

/// Shared, reference-counted tensor storage.
///
/// Cloning a `Storage` yields another handle to the *same* buffer: writes made
/// through one handle are visible through every other. The buffer is freed when
/// the last handle drops. Reads and writes take a short lock on the buffer; no
/// ordering between handles is provided beyond that.
#[derive(Debug, Clone)]
pub struct Storage {
    data: Arc<RwLock<Vec<u8>>>,
    dtype: DType,
    device: Device,
    /// Number of logical elements (not bytes).
    numel: usize,
}

impl Storage {
    /// Allocate zero-filled storage for `numel` elements of the given dtype.
    pub fn zeros(dtype: DType, numel: usize, device: Device) -> Result<Self> {
        if !device.is_available() {
            return Err(CoreError::DeviceUnavailable(device));
        }
        let nbytes = dtype.storage_bytes(numel).ok_or_else(|| CoreError::ShapeOverflow {
            shape: vec![numel],
            dtype,
        })?;
        tracing::trace!(%dtype, %device, numel, nbytes, "allocating storage");
        Ok(Self::from_raw(vec![0u8; nbytes], dtype, device, numel))
    }

    /// Create storage holding a copy of `data`.
    pub fn from_elements<T: Element>(data: &[T], device: Device) -> Result<Self> {
        if !device.is_available() {
            return Err(CoreError::DeviceUnavailable(device));
        }
        let size = T::DTYPE.byte_size();
        let nbytes = T::DTYPE.storage_bytes(data.len()).ok_or_else(|| CoreError::ShapeOverflow {
            shape: vec![data.len()],
            dtype: T::DTYPE,
        })?;
        let mut bytes = vec![0u8; nbytes];
        for (value, out) in data.iter().zip(bytes.chunks_exact_mut(size)) {
            value.write_ne(out);
        }
        Ok(Self::from_raw(bytes, T::DTYPE, device, data.len()))
    }

    pub(crate) fn from_raw(bytes: Vec<u8>, dtype: DType, device: Device, numel: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(bytes)),
            dtype,
            device,
            numel,
        }
    }

    /// Get the dtype of this storage.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Get the device of this storage.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Number of logical elements.
    pub fn numel(&self) -> usize {
        self.numel
    }

    /// Size in bytes.
    pub fn nbytes(&self) -> usize {
        self.data.read().len()
    }

    /// Whether both handles refer to the same buffer.
    pub fn ptr_eq(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live handles sharing this buffer.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    /// Whether this storage is uniquely owned (no other handles).
    pub fn is_unique(&self) -> bool {
        self.handle_count() == 1
    }

    /// Read element `index` (in elements, not bytes).
    ///
    /// The caller has already checked the dtype and bounds.
    pub(crate) fn read_element<T: Element>(&self, index: usize) -> T {
        let size = self.dtype.byte_size();
        let data = self.data.read();
        T::read_ne(&data[index * size..(index + 1) * size])
    }

    /// Write element `index` (in elements, not bytes).
    pub(crate) fn write_element<T: Element>(&self, index: usize, value: T) {
        let size = self.dtype.byte_size();
        let mut data = self.data.write();
        value.write_ne(&mut data[index * size..(index + 1) * size]);
    }

    /// Run `f` with read access to the raw bytes.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.data.read())
    }

    /// Run `f` with write access to the raw bytes. Visible through every handle.
    pub fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(&mut self.data.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let s = Storage::zeros(DType::Float32, 10, Device::Cpu).unwrap();
        assert_eq!(s.dtype(), DType::Float32);
        assert_eq!(s.device(), Device::Cpu);
        assert_eq!(s.numel(), 10);
        assert_eq!(s.nbytes(), 40);
        assert!(s.with_bytes(|b| b.iter().all(|&v| v == 0)));
    }

    #[test]
    fn test_zeros_unavailable_device() {
        let err = Storage::zeros(DType::UInt8, 4, Device::Cuda(0)).unwrap_err();
        assert_eq!(err, CoreError::DeviceUnavailable(Device::Cuda(0)));
    }

    #[test]
    fn test_zeros_byte_count_overflow() {
        let err = Storage::zeros(DType::Float64, usize::MAX / 2, Device::Cpu).unwrap_err();
        assert_eq!(
            err,
            CoreError::ShapeOverflow {
                shape: vec![usize::MAX / 2],
                dtype: DType::Float64
            }
        );
    }

    #[test]
    fn test_from_elements() {
        let s = Storage::from_elements(&[1u16, 2, 3], Device::Cpu).unwrap();
        assert_eq!(s.dtype(), DType::UInt16);
        assert_eq!(s.numel(), 3);
        assert_eq!(s.nbytes(), 6);
        assert_eq!(s.read_element::<u16>(2), 3);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let s1 = Storage::from_elements(&[1.0f32, 2.0, 3.0], Device::Cpu).unwrap();
        let s2 = s1.clone();
        assert!(s1.ptr_eq(&s2));
        assert!(!s1.is_unique());

        s2.write_element(0, 99.0f32);
        assert_eq!(s1.read_element::<f32>(0), 99.0);

        drop(s2);
        assert!(s1.is_unique());
    }

    #[test]
    fn test_separate_allocations_differ() {
        let a = Storage::zeros(DType::Bool, 4, Device::Cpu).unwrap();
        let b = Storage::zeros(DType::Bool, 4, Device::Cpu).unwrap();
        assert!(!a.ptr_eq(&b));
    }
}
