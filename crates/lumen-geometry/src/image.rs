use std::fmt;

use lumen_core::{DType, Device, Element, Tensor};

use crate::descriptor::ImageDescriptor;
use crate::{GeometryError, Result};

/// A rows × cols × channels image backed by a [`Tensor`].
///
/// The backing tensor is always 3-D, `(rows, cols, channels)`, and contiguous
/// when the image is built. Rows, cols, channels, dtype and device are read
/// off the tensor, so the image holds no state of its own.
///
/// # Examples
///
/// ```
/// use lumen_core::{DType, Device, Tensor};
/// use lumen_geometry::Image;
///
/// let t = Tensor::zeros(&[480, 640, 3], DType::UInt8, Device::Cpu).unwrap();
/// let im = Image::from_tensor(t.clone()).unwrap();
/// assert_eq!((im.rows(), im.cols(), im.channels()), (480, 640, 3));
/// assert!(im.as_tensor().is_same(&t));
/// ```
#[derive(Debug, Clone)]
pub struct Image {
    data: Tensor,
}

impl Image {
    /// Allocate a zero-filled image.
    ///
    /// `rows` and `cols` must be non-negative and `channels` at least 1;
    /// they are checked in that order and nothing is allocated on failure.
    /// Every [`DType`] is accepted. A size whose element or byte count does
    /// not fit in `usize` fails with [`GeometryError::Tensor`].
    pub fn new(rows: i64, cols: i64, channels: i64, dtype: DType, device: Device) -> Result<Self> {
        if rows < 0 || cols < 0 {
            return Err(GeometryError::InvalidShape { rows, cols });
        }
        if channels < 1 {
            return Err(GeometryError::InvalidChannelCount(channels));
        }

        let shape = [rows as usize, cols as usize, channels as usize];
        let data = Tensor::zeros(&shape, dtype, device)?;
        tracing::debug!(rows, cols, channels, %dtype, %device, "allocated image");
        Ok(Self { data })
    }

    /// Wrap an existing tensor without copying.
    ///
    /// A 3-D tensor is kept as is, its last dimension giving the channel count,
    /// and the image's tensor [`is_same`](Tensor::is_same) as the input. A 2-D
    /// tensor is a single-channel image and is reshaped to `(rows, cols, 1)`:
    /// a new view over the same buffer, which reshapes back to a handle that
    /// is the same as the input. Writes through either side are visible
    /// through the other.
    pub fn from_tensor(tensor: Tensor) -> Result<Self> {
        let dims = tensor.shape().dims().to_vec();
        let data = match dims.as_slice() {
            &[rows, cols] => {
                Self::check_contiguous(&tensor)?;
                tracing::debug!(rows, cols, "wrapping 2-D tensor as single-channel image view");
                tensor.reshape(&[rows as isize, cols as isize, 1])?
            }
            &[rows, cols, channels] => {
                if channels == 0 {
                    return Err(GeometryError::InvalidChannelCount(0));
                }
                Self::check_contiguous(&tensor)?;
                tracing::debug!(rows, cols, channels, "aliasing 3-D tensor as image");
                tensor
            }
            _ => return Err(GeometryError::UnsupportedRank(dims.len())),
        };
        Ok(Self { data })
    }

    fn check_contiguous(tensor: &Tensor) -> Result<()> {
        if tensor.is_contiguous() {
            Ok(())
        } else {
            Err(GeometryError::NonContiguousStorage)
        }
    }

    /// Allocate an image as described by a configuration record.
    pub fn from_descriptor(desc: &ImageDescriptor) -> Result<Self> {
        Self::new(desc.rows, desc.cols, desc.channels, desc.dtype, desc.device)
    }

    /// Describe this image's geometry, dtype and device.
    pub fn descriptor(&self) -> ImageDescriptor {
        ImageDescriptor {
            rows: self.rows(),
            cols: self.cols(),
            channels: self.channels(),
            dtype: self.dtype(),
            device: self.device(),
        }
    }

    fn dim(&self, axis: usize) -> i64 {
        self.data.shape().dims()[axis] as i64
    }

    /// Number of rows.
    pub fn rows(&self) -> i64 {
        self.dim(0)
    }

    /// Number of columns.
    pub fn cols(&self) -> i64 {
        self.dim(1)
    }

    /// Number of channels (at least 1).
    pub fn channels(&self) -> i64 {
        self.dim(2)
    }

    /// `(rows, cols, channels)`.
    pub fn shape(&self) -> (i64, i64, i64) {
        (self.rows(), self.cols(), self.channels())
    }

    /// Element data type.
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Device holding the pixels.
    pub fn device(&self) -> Device {
        self.data.device()
    }

    /// Whether the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    /// The backing tensor.
    pub fn as_tensor(&self) -> &Tensor {
        &self.data
    }

    /// Unwrap into the backing tensor.
    pub fn into_tensor(self) -> Tensor {
        self.data
    }

    /// Reset to a 0×0 single-channel image, keeping dtype and device.
    ///
    /// The old buffer is released once no other tensor refers to it.
    pub fn clear(&mut self) -> Result<()> {
        self.data = Tensor::zeros(&[0, 0, 1], self.dtype(), self.device())?;
        Ok(())
    }

    /// Move the image to `device`. On the same device this aliases `self`.
    pub fn to(&self, device: Device) -> Result<Self> {
        Ok(Self {
            data: self.data.to(device)?,
        })
    }

    /// Copy into a fresh buffer that shares nothing with `self`.
    pub fn deep_clone(&self) -> Self {
        Self {
            data: self.data.deep_clone(),
        }
    }

    /// Read one channel of one pixel.
    pub fn get<T: Element>(&self, row: usize, col: usize, channel: usize) -> Result<T> {
        Ok(self.data.get(&[row, col, channel])?)
    }

    /// Write one channel of one pixel, visible through every alias of the buffer.
    pub fn set<T: Element>(&self, row: usize, col: usize, channel: usize, value: T) -> Result<()> {
        Ok(self.data.set(&[row, col, channel], value)?)
    }
}

impl Default for Image {
    /// An empty 0×0 single-channel Float32 image on `CPU:0`.
    fn default() -> Self {
        let data = Tensor::zeros(&[0, 0, 1], DType::Float32, Device::Cpu)
            .expect("empty host tensor always allocates");
        Self { data }
    }
}

impl TryFrom<Tensor> for Image {
    type Error = GeometryError;

    fn try_from(tensor: Tensor) -> Result<Self> {
        Self::from_tensor(tensor)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Image[size={{{},{}}}, channels={}, dtype={}, device={}]",
            self.rows(),
            self.cols(),
            self.channels(),
            self.dtype(),
            self.device()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let im = Image::default();
        assert_eq!(im.shape(), (0, 0, 1));
        assert_eq!(im.dtype(), DType::Float32);
        assert_eq!(im.device(), Device::Cpu);
        assert!(im.is_empty());
    }

    #[test]
    fn test_validation_order() {
        // rows/cols are reported before channels
        let err = Image::new(-1, 640, 0, DType::UInt8, Device::Cpu).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidShape { rows: -1, cols: 640 }));
    }

    #[test]
    fn test_unavailable_device_is_tensor_error() {
        let err = Image::new(4, 4, 1, DType::UInt8, Device::Cuda(0)).unwrap_err();
        assert!(matches!(err, GeometryError::Tensor(_)));
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_zero_channel_tensor_rejected() {
        let t = Tensor::zeros(&[4, 4, 0], DType::UInt8, Device::Cpu).unwrap();
        let err = Image::from_tensor(t).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidChannelCount(0)));
    }

    #[test]
    fn test_clear_keeps_dtype_and_device() {
        let mut im = Image::new(8, 8, 3, DType::UInt16, Device::Cpu).unwrap();
        let alias = im.as_tensor().clone();
        im.clear().unwrap();
        assert_eq!(im.shape(), (0, 0, 1));
        assert_eq!(im.dtype(), DType::UInt16);
        assert!(alias.storage_ref().is_unique());
    }

    #[test]
    fn test_display() {
        let im = Image::new(480, 640, 3, DType::UInt8, Device::Cpu).unwrap();
        assert_eq!(
            im.to_string(),
            "Image[size={480,640}, channels=3, dtype=UInt8, device=CPU:0]"
        );
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let im = Image::new(2, 3, 4, DType::Int64, Device::Cpu).unwrap();
        let desc = im.descriptor();
        let again = Image::from_descriptor(&desc).unwrap();
        assert_eq!(again.shape(), (2, 3, 4));
        assert_eq!(again.dtype(), DType::Int64);
    }
}
