//! Typed numeric array buffers.
//!
//! An [`ArrayBuffer`] is raw element bytes plus everything needed to read
//! them: element kind, shape, strides and byte order.
//!
//! # Shape convention
//!
//! `dims` is row-major, slowest axis first: `[height, width]` for an image,
//! `[depth, height, width]` for a cube. Width is the number of columns
//! (the wire's `xdim`), height the number of rows (`ydim`). Both the
//! outbound and the inbound path use this convention.

use crate::kind::Scalar;
use crate::{ByteOrder, Element, ElementKind, MarshalError};

/// A 2-D or 3-D numeric array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayBuffer {
    kind: ElementKind,
    dims: Vec<usize>,
    /// Element strides per axis. Row-major contiguous unless transposed.
    strides: Vec<usize>,
    order: ByteOrder,
    data: Vec<u8>,
}

impl ArrayBuffer {
    /// Builds a contiguous, host-order array from typed values.
    ///
    /// # Errors
    /// [`MarshalError::UnsupportedRank`] unless `dims` has 2 or 3 axes;
    /// [`MarshalError::ShapeMismatch`] if `values` doesn't fill the shape.
    pub fn from_elements<T: Element>(
        values: &[T],
        dims: &[usize],
    ) -> Result<Self, MarshalError> {
        let mut data = Vec::with_capacity(values.len() * T::KIND.byte_width());
        for &v in values {
            v.write(ByteOrder::Native, &mut data);
        }
        Self::from_bytes(T::KIND, dims, ByteOrder::Native, data)
    }

    /// Wraps raw bytes already laid out row-major in `order`.
    ///
    /// # Errors
    /// Same as [`from_elements`](Self::from_elements).
    pub fn from_bytes(
        kind: ElementKind,
        dims: &[usize],
        order: ByteOrder,
        data: Vec<u8>,
    ) -> Result<Self, MarshalError> {
        if !(2..=3).contains(&dims.len()) {
            return Err(MarshalError::UnsupportedRank(dims.len()));
        }
        let expected = checked_byte_len(dims, kind).ok_or_else(|| {
            MarshalError::TooLarge {
                dims: dims.to_vec(),
                kind,
            }
        })?;
        if data.len() != expected {
            return Err(MarshalError::ShapeMismatch {
                dims: dims.to_vec(),
                kind,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            kind,
            dims: dims.to_vec(),
            strides: row_major_strides(dims),
            order,
            data,
        })
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Row-major dimensions, slowest axis first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.dims[self.dims.len() - 1]
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.dims[self.dims.len() - 2]
    }

    /// Number of planes; 1 for a 2-D array.
    pub fn depth(&self) -> usize {
        if self.dims.len() == 3 { self.dims[0] } else { 1 }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the bytes are laid out row-major with no gaps.
    pub fn is_contiguous(&self) -> bool {
        self.strides == row_major_strides(&self.dims)
    }

    /// The underlying bytes, in storage (not logical) order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Swaps the two fastest axes without moving any data, like a matrix
    /// transpose view. The result is not contiguous.
    pub fn transposed(mut self) -> Self {
        let n = self.dims.len();
        self.dims.swap(n - 1, n - 2);
        self.strides.swap(n - 1, n - 2);
        self
    }

    /// Byte offset of each element, in logical row-major order.
    fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        let width = self.kind.byte_width();
        (0..self.len()).map(move |mut flat| {
            let mut offset = 0;
            for axis in (0..self.dims.len()).rev() {
                let idx = flat % self.dims[axis];
                flat /= self.dims[axis];
                offset += idx * self.strides[axis];
            }
            offset * width
        })
    }

    /// Copies the array into a contiguous row-major buffer. Cheap clone if
    /// it already is one.
    pub fn to_contiguous(&self) -> Self {
        if self.is_contiguous() {
            return self.clone();
        }
        let width = self.kind.byte_width();
        let mut data = Vec::with_capacity(self.len() * width);
        for offset in self.offsets() {
            data.extend_from_slice(&self.data[offset..offset + width]);
        }
        Self {
            kind: self.kind,
            dims: self.dims.clone(),
            strides: row_major_strides(&self.dims),
            order: self.order,
            data,
        }
    }

    /// Converts every element to `kind`, producing a contiguous array in
    /// the same (resolved) byte order.
    pub fn cast(&self, kind: ElementKind) -> Self {
        let width = self.kind.byte_width();
        let order = self.order.resolve();
        let mut data = Vec::with_capacity(self.len() * kind.byte_width());
        for offset in self.offsets() {
            let value: Scalar = self
                .kind
                .read_scalar(&self.data[offset..offset + width], self.order);
            kind.write_scalar(value, order, &mut data);
        }
        Self {
            kind,
            dims: self.dims.clone(),
            strides: row_major_strides(&self.dims),
            order,
            data,
        }
    }

    /// Re-encodes the elements in `order`, contiguous.
    pub fn with_order(&self, order: ByteOrder) -> Self {
        let contiguous = self.to_contiguous();
        if contiguous.order.same_as(order) {
            return Self { order, ..contiguous };
        }
        let width = self.kind.byte_width();
        let mut data = contiguous.data;
        for chunk in data.chunks_exact_mut(width) {
            chunk.reverse();
        }
        Self {
            order,
            data,
            ..contiguous
        }
    }

    /// Reads the elements in logical row-major order.
    ///
    /// # Errors
    /// [`MarshalError::KindMismatch`] if `T` isn't the stored kind.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, MarshalError> {
        if T::KIND != self.kind {
            return Err(MarshalError::KindMismatch {
                requested: T::KIND,
                actual: self.kind,
            });
        }
        let width = self.kind.byte_width();
        Ok(self
            .offsets()
            .map(|offset| T::read(&self.data[offset..offset + width], self.order))
            .collect())
    }
}

/// Byte length of a row-major array, `None` on overflow. Every axis is
/// multiplied in, so a zero-length axis doesn't hide an oversized one.
pub(crate) fn checked_byte_len(dims: &[usize], kind: ElementKind) -> Option<usize> {
    let mut total = kind.byte_width();
    let mut empty = false;
    for &dim in dims {
        if dim == 0 {
            empty = true;
        } else {
            total = total.checked_mul(dim)?;
        }
    }
    Some(if empty { 0 } else { total })
}

fn row_major_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; dims.len()];
    for axis in (0..dims.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1].saturating_mul(dims[axis + 1]);
    }
    strides
}
