//! Array ↔ wire conversion.

use crate::{
    ArrayBuffer, ArrayParams, BitpixTable, ByteOrder, ElementKind, MarshalError,
    WideningPolicy,
};

/// An array ready to send: the `array [...]` command and its raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedArray {
    pub params: ArrayParams,
    pub data: Vec<u8>,
}

impl EncodedArray {
    /// The command string, e.g. `array [xdim=4,ydim=5,bitpix=32,endian=big]`.
    pub fn command(&self) -> String {
        self.params.to_string()
    }
}

/// Converts arrays to and from their wire form.
///
/// Holds the bitpix table and widening policy it was built with; both are
/// fixed for the marshaller's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayMarshaller {
    table: BitpixTable,
    widening: WideningPolicy,
}

impl ArrayMarshaller {
    pub fn new(table: BitpixTable, widening: WideningPolicy) -> Self {
        Self { table, widening }
    }

    pub fn table(&self) -> &BitpixTable {
        &self.table
    }

    pub fn widening(&self) -> &WideningPolicy {
        &self.widening
    }

    /// Prepares `array` for transmission.
    ///
    /// With `target` set the array is converted to that kind and the
    /// widening policy is skipped entirely. Otherwise the policy widens
    /// kinds the viewer lacks. The result is contiguous and its byte order
    /// is stated explicitly, `Native` resolving to the host's order.
    ///
    /// # Errors
    /// [`MarshalError::UnsupportedKind`] if the final kind has no bitpix,
    /// e.g. `uint64` without an explicit `target`.
    pub fn encode(
        &self,
        array: &ArrayBuffer,
        target: Option<ElementKind>,
    ) -> Result<EncodedArray, MarshalError> {
        let converted = match target {
            Some(kind) if kind != array.kind() => array.cast(kind),
            Some(_) => array.clone(),
            None => self.widening.apply(array),
        };
        let bitpix = self.table.bitpix_of(converted.kind())?;
        let packed = converted.to_contiguous();

        let params = ArrayParams {
            width: packed.width(),
            height: packed.height(),
            depth: packed.depth(),
            bitpix,
            endian: packed.order().resolve(),
        };
        tracing::debug!(command = %params, bytes = packed.as_bytes().len(), "encoded array");
        Ok(EncodedArray {
            params,
            data: packed.as_bytes().to_vec(),
        })
    }

    /// Rebuilds an array from its parameters and raw bytes.
    ///
    /// Bytes beyond the described shape are ignored; too few bytes is an
    /// error.
    ///
    /// # Errors
    /// [`MarshalError::UnsupportedBitpix`] for an unknown bitpix,
    /// [`MarshalError::ShapeMismatch`] for a short buffer,
    /// [`MarshalError::TooLarge`] if the shape can't be addressed at all.
    pub fn decode(
        &self,
        params: &ArrayParams,
        data: &[u8],
    ) -> Result<ArrayBuffer, MarshalError> {
        let kind = self.table.kind_of(params.bitpix)?;
        let dims = params.dims();
        let expected = params.byte_len(kind).ok_or_else(|| MarshalError::TooLarge {
            dims: dims.clone(),
            kind,
        })?;
        if data.len() < expected {
            return Err(MarshalError::ShapeMismatch {
                dims,
                kind,
                expected,
                actual: data.len(),
            });
        }
        if data.len() > expected {
            tracing::debug!(
                extra = data.len() - expected,
                "ignoring bytes past the array shape"
            );
        }
        ArrayBuffer::from_bytes(kind, &dims, params.endian, data[..expected].to_vec())
    }

    /// Describes an array the viewer reported piecewise (width, height,
    /// depth, bitpix) in the given byte order.
    pub fn describe(
        &self,
        width: usize,
        height: usize,
        depth: usize,
        bitpix: i32,
        order: ByteOrder,
    ) -> ArrayParams {
        ArrayParams {
            width,
            height,
            depth: depth.max(1),
            bitpix,
            endian: order.resolve(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_big_endian_int32_params() {
        let values: Vec<i32> = (0..20).collect();
        let arr = ArrayBuffer::from_elements(&values, &[5, 4])
            .unwrap()
            .with_order(ByteOrder::Big);

        let encoded = ArrayMarshaller::default().encode(&arr, None).unwrap();
        assert_eq!(encoded.command(), "array [xdim=4,ydim=5,bitpix=32,endian=big]");
        assert_eq!(&encoded.data[..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_encode_native_states_host_order() {
        let arr = ArrayBuffer::from_elements(&[1.0f64; 6], &[2, 3]).unwrap();
        let encoded = ArrayMarshaller::default().encode(&arr, None).unwrap();
        assert_eq!(encoded.params.endian, ByteOrder::host());
        assert!(encoded.command().ends_with(&format!(
            "endian={}]",
            ByteOrder::host().wire_name()
        )));
    }

    #[test]
    fn test_encode_widens_int8() {
        let arr = ArrayBuffer::from_elements(&[1i8, -2, 3, -4], &[2, 2]).unwrap();
        let encoded = ArrayMarshaller::default().encode(&arr, None).unwrap();
        assert_eq!(encoded.params.bitpix, 16);
        assert_eq!(encoded.data.len(), 8);
    }

    #[test]
    fn test_explicit_target_overrides_widening() {
        let arr = ArrayBuffer::from_elements(&[1u64, 2, 3, 4], &[2, 2]).unwrap();
        let marshaller = ArrayMarshaller::default();

        assert!(matches!(
            marshaller.encode(&arr, None),
            Err(MarshalError::UnsupportedKind(ElementKind::U64))
        ));
        let encoded = marshaller.encode(&arr, Some(ElementKind::F64)).unwrap();
        assert_eq!(encoded.params.bitpix, -64);

        let i8_arr = ArrayBuffer::from_elements(&[1i8; 4], &[2, 2]).unwrap();
        let as_float = marshaller.encode(&i8_arr, Some(ElementKind::F32)).unwrap();
        assert_eq!(as_float.params.bitpix, -32);
    }

    #[test]
    fn test_encode_copies_non_contiguous() {
        let arr = ArrayBuffer::from_elements(&[1u8, 2, 3, 4, 5, 6], &[2, 3])
            .unwrap()
            .transposed();
        let encoded = ArrayMarshaller::default().encode(&arr, None).unwrap();
        assert_eq!(encoded.params.width, 2);
        assert_eq!(encoded.params.height, 3);
        assert_eq!(encoded.data, vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let params = ArrayParams {
            width: 2,
            height: 2,
            depth: 1,
            bitpix: 16,
            endian: ByteOrder::Little,
        };
        assert!(matches!(
            ArrayMarshaller::default().decode(&params, &[0; 7]),
            Err(MarshalError::ShapeMismatch { expected: 8, actual: 7, .. })
        ));
    }

    #[test]
    fn test_decode_ignores_trailing_byte() {
        let params = ArrayParams {
            width: 2,
            height: 1,
            depth: 1,
            bitpix: 8,
            endian: ByteOrder::Little,
        };
        let arr = ArrayMarshaller::default().decode(&params, &[7, 9, 0]).unwrap();
        assert_eq!(arr.to_vec::<u8>().unwrap(), vec![7, 9]);
    }

    #[test]
    fn test_decode_cube_shape() {
        let marshaller = ArrayMarshaller::default();
        let params = marshaller.describe(2, 3, 4, -32, ByteOrder::Native);
        let arr = marshaller.decode(&params, &vec![0u8; 2 * 3 * 4 * 4]).unwrap();
        assert_eq!(arr.dims(), &[4, 3, 2]);
        assert_eq!(arr.kind(), ElementKind::F32);
    }

    #[test]
    fn test_decode_rejects_unaddressable_shape() {
        let huge = 1usize << (usize::BITS / 2);
        let params = ArrayParams {
            width: huge,
            height: huge,
            depth: 1,
            bitpix: 8,
            endian: ByteOrder::Little,
        };
        let err = ArrayMarshaller::default().decode(&params, &[0; 16]).unwrap_err();
        assert!(matches!(err, MarshalError::TooLarge { kind: ElementKind::U8, .. }));
    }
}
