use std::fmt;

use smallvec::SmallVec;

use crate::dtype::{DType, Element};
use crate::device::Device;
use crate::error::CoreError;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

/// A strided view over shared [`Storage`].
///
/// Cloning a tensor, reshaping it or slicing it never copies element data:
/// every resulting handle refers to the same buffer and writes through one are
/// visible through all of them. Use [`Tensor::contiguous`] or
/// [`Tensor::deep_clone`] to get an independent copy.
///
/// # Examples
///
/// ```
/// use lumen_core::{DType, Device, Tensor};
///
/// let t = Tensor::zeros(&[480, 640], DType::UInt8, Device::Cpu).unwrap();
/// let v = t.reshape(&[480, 640, 1]).unwrap();
/// assert!(!v.is_same(&t));
/// assert!(v.reshape(&[480, 640]).unwrap().is_same(&t));
/// ```
#[derive(Clone)]
pub struct Tensor {
    storage: Storage,
    shape: Shape,
    strides: SmallVec<[usize; 4]>,
    offset: usize,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a zero-filled contiguous tensor.
    ///
    /// Fails with [`CoreError::ShapeOverflow`] if the element or byte count does
    /// not fit in `usize`. Shapes with a zero dimension always succeed on an
    /// available device, however large the other dimensions.
    pub fn zeros(shape: &[usize], dtype: DType, device: Device) -> Result<Self> {
        let s = Shape::new(shape);
        let numel = checked_numel(&s, dtype)?;
        let storage = Storage::zeros(dtype, numel, device).map_err(|e| match e {
            CoreError::ShapeOverflow { .. } => CoreError::ShapeOverflow {
                shape: shape.to_vec(),
                dtype,
            },
            other => other,
        })?;
        Ok(Self::wrap(storage, s))
    }

    /// Create a contiguous tensor from element data with the given shape.
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: Device) -> Result<Self> {
        let s = Shape::new(shape);
        let numel = checked_numel(&s, T::DTYPE)?;
        if numel != data.len() {
            return Err(CoreError::ShapeMismatch {
                expected: vec![numel],
                got: vec![data.len()],
            });
        }
        let storage = Storage::from_elements(data, device)?;
        Ok(Self::wrap(storage, s))
    }

    /// Create a contiguous tensor with every element set to `value`.
    pub fn full<T: Element>(value: T, shape: &[usize], device: Device) -> Result<Self> {
        let t = Self::zeros(shape, T::DTYPE, device)?;
        t.fill(value)?;
        Ok(t)
    }

    fn wrap(storage: Storage, shape: Shape) -> Self {
        let strides = shape.contiguous_strides();
        Self {
            storage,
            shape,
            strides,
            offset: 0,
        }
    }

    /// Get a reference to the underlying storage.
    pub fn storage_ref(&self) -> &Storage {
        &self.storage
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Shape of the tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Data type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Device.
    pub fn device(&self) -> Device {
        self.storage.device()
    }

    /// Strides (in elements, not bytes).
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Offset of the first element into the storage (in elements).
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the elements of this view occupy consecutive storage slots in
    /// row-major order.
    ///
    /// Strides of size-1 dimensions never affect layout and are ignored; an
    /// empty tensor is trivially contiguous.
    pub fn is_contiguous(&self) -> bool {
        if self.numel() == 0 {
            return true;
        }
        let expected = self.shape.contiguous_strides();
        self.shape
            .dims()
            .iter()
            .zip(self.strides.iter().zip(expected.iter()))
            .all(|(&dim, (&stride, &want))| dim == 1 || stride == want)
    }

    /// Whether `other` is the same view of the same buffer: shared storage,
    /// identical shape, strides, offset and dtype.
    ///
    /// Two separately allocated tensors are never the same, even with equal
    /// contents.
    pub fn is_same(&self, other: &Tensor) -> bool {
        self.storage.ptr_eq(&other.storage)
            && self.shape == other.shape
            && self.strides == other.strides
            && self.offset == other.offset
            && self.dtype() == other.dtype()
    }

    // =========================================================================
    // Data access
    // =========================================================================

    /// Read the element at a multi-dimensional index.
    pub fn get<T: Element>(&self, index: &[usize]) -> Result<T> {
        self.check_dtype::<T>()?;
        let physical = self.physical_index(index)?;
        Ok(self.storage.read_element(physical))
    }

    /// Write the element at a multi-dimensional index.
    ///
    /// Takes `&self`: the write lands in the shared buffer and is visible
    /// through every view of it.
    pub fn set<T: Element>(&self, index: &[usize], value: T) -> Result<()> {
        self.check_dtype::<T>()?;
        let physical = self.physical_index(index)?;
        self.storage.write_element(physical, value);
        Ok(())
    }

    /// Set every element of this view to `value`.
    pub fn fill<T: Element>(&self, value: T) -> Result<()> {
        self.check_dtype::<T>()?;
        let size = T::DTYPE.byte_size();
        let positions: Vec<usize> = (0..self.numel()).map(|i| self.flat_to_physical(i)).collect();
        self.storage.with_bytes_mut(|bytes| {
            for p in positions {
                value.write_ne(&mut bytes[p * size..(p + 1) * size]);
            }
        });
        Ok(())
    }

    /// Copy the elements out in logical row-major order.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.check_dtype::<T>()?;
        Ok((0..self.numel())
            .map(|i| self.storage.read_element(self.flat_to_physical(i)))
            .collect())
    }

    fn check_dtype<T: Element>(&self) -> Result<()> {
        if T::DTYPE != self.dtype() {
            return Err(CoreError::DTypeMismatch {
                expected: self.dtype(),
                got: T::DTYPE,
            });
        }
        Ok(())
    }

    fn physical_index(&self, index: &[usize]) -> Result<usize> {
        let in_bounds = index.len() == self.ndim()
            && index.iter().zip(self.shape.dims()).all(|(&i, &d)| i < d);
        if !in_bounds {
            return Err(CoreError::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape.dims().to_vec(),
            });
        }
        Ok(self.offset + index.iter().zip(&self.strides).map(|(&i, &s)| i * s).sum::<usize>())
    }

    /// Convert a logical row-major position to a physical storage index.
    /// `flat_index` must be below `numel()`.
    fn flat_to_physical(&self, flat_index: usize) -> usize {
        let mut remaining = flat_index;
        let mut physical = self.offset;
        let contiguous_strides = self.shape.contiguous_strides();

        for (i, &cs) in contiguous_strides.iter().enumerate() {
            if cs == 0 {
                continue;
            }
            let idx = remaining / cs;
            remaining %= cs;
            physical += idx * self.strides[i];
        }

        physical
    }

    // =========================================================================
    // Shape operations (zero-copy views)
    // =========================================================================

    /// Reshape the tensor into a view over the same buffer.
    ///
    /// One dimension may be `-1` and is inferred. Fails for non-contiguous
    /// tensors rather than copying.
    pub fn reshape(&self, new_shape: &[isize]) -> Result<Tensor> {
        let resolved = self.shape.resolve_reshape(new_shape).ok_or_else(|| {
            CoreError::InvalidReshape {
                numel: self.numel(),
                shape: new_shape.to_vec(),
            }
        })?;

        if !self.is_contiguous() {
            return Err(CoreError::NonContiguous);
        }

        tracing::trace!(from = %self.shape, to = %resolved, "reshape view");
        let strides = resolved.contiguous_strides();
        Ok(Tensor {
            storage: self.storage.clone(), // Arc clone — shared data
            shape: resolved,
            strides,
            offset: self.offset,
        })
    }

    /// Slice `dim` to `start..stop` with the given `step`, as a view over the
    /// same buffer.
    ///
    /// Negative `start`/`stop` count from the end; both are clamped to the
    /// dimension. The result's contiguity follows from its strides, so a
    /// stepped slice is generally non-contiguous.
    pub fn slice(&self, dim: usize, start: isize, stop: isize, step: usize) -> Result<Tensor> {
        let ndim = self.ndim();
        if dim >= ndim {
            return Err(CoreError::InvalidAxis { axis: dim, ndim });
        }
        if step == 0 {
            return Err(CoreError::InvalidSlice("step must be at least 1".into()));
        }

        let size = self.shape.dims()[dim];
        let clamp = |i: isize| -> usize {
            let i = if i < 0 { i + size as isize } else { i };
            i.clamp(0, size as isize) as usize
        };
        let (start, stop) = (clamp(start), clamp(stop));
        let len = if stop > start { (stop - start).div_ceil(step) } else { 0 };

        let mut dims = self.shape.dims().to_vec();
        dims[dim] = len;
        let mut strides = self.strides.clone();
        let empty = dims.contains(&0);
        // strides of an empty view may be saturated; it addresses nothing
        let offset = if empty { self.offset } else { self.offset + start * strides[dim] };
        strides[dim] = strides[dim].saturating_mul(step);

        tracing::trace!(dim, start, stop, step, len, "slice view");
        Ok(Tensor {
            storage: self.storage.clone(),
            shape: Shape::from(dims),
            strides,
            offset,
        })
    }

    // =========================================================================
    // Copies and device transfer
    // =========================================================================

    /// Return `self` if already contiguous, otherwise a packed copy in a new buffer.
    pub fn contiguous(&self) -> Tensor {
        if self.is_contiguous() {
            return self.clone();
        }
        self.deep_clone()
    }

    /// Copy this view's elements into a fresh contiguous buffer.
    pub fn deep_clone(&self) -> Tensor {
        let size = self.dtype().byte_size();
        let numel = self.numel();
        // a view never holds more elements than its storage, so this cannot overflow
        let mut packed = vec![0u8; numel * size];
        self.storage.with_bytes(|src| {
            for (i, out) in packed.chunks_exact_mut(size).enumerate() {
                let p = self.flat_to_physical(i);
                out.copy_from_slice(&src[p * size..(p + 1) * size]);
            }
        });
        let storage = Storage::from_raw(packed, self.dtype(), self.device(), numel);
        Self::wrap(storage, self.shape.clone())
    }

    /// Whether this tensor is on CPU.
    pub fn is_cpu(&self) -> bool {
        self.device().is_cpu()
    }

    /// Move the tensor to `device`. Returns an aliasing clone if already there.
    pub fn to(&self, device: Device) -> Result<Tensor> {
        if device == self.device() {
            return Ok(self.clone());
        }
        // Host memory is the only backend, so any other target is a device
        // this build cannot reach.
        Err(CoreError::DeviceUnavailable(device))
    }
}

/// Element count of `shape`, or `ShapeOverflow` if it does not fit in `usize`.
fn checked_numel(shape: &Shape, dtype: DType) -> Result<usize> {
    shape.checked_numel().ok_or_else(|| CoreError::ShapeOverflow {
        shape: shape.dims().to_vec(),
        dtype,
    })
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={}, strides={:?}, offset={}, dtype={}, device={}, contiguous={})",
            self.shape,
            self.strides.as_slice(),
            self.offset,
            self.dtype(),
            self.device(),
            self.is_contiguous(),
        )
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tensor(shape={}, dtype={}, device={})",
            self.shape,
            self.dtype(),
            self.device()
        )
    }
}
