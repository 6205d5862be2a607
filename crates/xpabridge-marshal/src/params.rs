//! The array parameter string.
//!
//! An array travels as a raw buffer plus a command describing it:
//!
//! ```text
//! array [xdim=4,ydim=5,bitpix=32,endian=big]
//! ```
//!
//! Keys are always written in the order `xdim`, `ydim`, (`zdim`,) `bitpix`,
//! `endian`. `zdim` only appears for cubes with more than one plane.

use std::fmt;
use std::str::FromStr;

use crate::array::checked_byte_len;
use crate::{ByteOrder, ElementKind, MarshalError};

/// Decoded form of an `array [...]` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayParams {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// Planes; 1 for an image.
    pub depth: usize,
    pub bitpix: i32,
    /// Always `Little` or `Big` once parsed or built by the marshaller.
    pub endian: ByteOrder,
}

impl ArrayParams {
    /// Row-major dims: `[height, width]` or `[depth, height, width]`.
    pub fn dims(&self) -> Vec<usize> {
        if self.depth > 1 {
            vec![self.depth, self.height, self.width]
        } else {
            vec![self.height, self.width]
        }
    }

    /// Bytes the described array takes up with elements of `kind`, or
    /// `None` if that overflows `usize`.
    pub fn byte_len(&self, kind: ElementKind) -> Option<usize> {
        checked_byte_len(&self.dims(), kind)
    }
}

impl fmt::Display for ArrayParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "array [xdim={},ydim={}", self.width, self.height)?;
        if self.depth > 1 {
            write!(f, ",zdim={}", self.depth)?;
        }
        write!(
            f,
            ",bitpix={},endian={}]",
            self.bitpix,
            self.endian.wire_name()
        )
    }
}

impl FromStr for ArrayParams {
    type Err = MarshalError;

    /// Parses `array [k=v,k=v ...]`. Pairs may be separated by commas or
    /// whitespace. `dim=N` sets both `xdim` and `ydim`. A missing `endian`
    /// means the host's order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MarshalError::InvalidParams(s.to_string());

        let rest = s.trim().strip_prefix("array").ok_or_else(invalid)?.trim();
        let body = rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(invalid)?;

        let (mut width, mut height, mut depth) = (None, None, 1usize);
        let mut bitpix = None;
        let mut endian = ByteOrder::Native;

        for pair in body
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
        {
            let (key, value) = pair.split_once('=').ok_or_else(invalid)?;
            let number = || -> Result<usize, MarshalError> {
                value.parse().map_err(|_| MarshalError::InvalidNumber {
                    field: key.to_string(),
                    value: value.to_string(),
                })
            };
            match key.to_ascii_lowercase().as_str() {
                "xdim" => width = Some(number()?),
                "ydim" => height = Some(number()?),
                "zdim" => depth = number()?,
                "dim" => {
                    let n = number()?;
                    width = Some(n);
                    height = Some(n);
                }
                "bitpix" => {
                    bitpix = Some(value.parse().map_err(|_| {
                        MarshalError::InvalidNumber {
                            field: "bitpix".to_string(),
                            value: value.to_string(),
                        }
                    })?)
                }
                "endian" | "arch" => {
                    endian = match value.to_ascii_lowercase().as_str() {
                        "little" | "littleendian" => ByteOrder::Little,
                        "big" | "bigendian" => ByteOrder::Big,
                        "native" => ByteOrder::Native,
                        _ => return Err(invalid()),
                    }
                }
                // Header skip and similar keys don't change the layout we read.
                _ => {}
            }
        }

        Ok(Self {
            width: width.ok_or_else(invalid)?,
            height: height.ok_or_else(invalid)?,
            depth: depth.max(1),
            bitpix: bitpix.ok_or_else(invalid)?,
            endian: endian.resolve(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_exact_format() {
        let params = ArrayParams {
            width: 4,
            height: 5,
            depth: 1,
            bitpix: 32,
            endian: ByteOrder::Big,
        };
        assert_eq!(params.to_string(), "array [xdim=4,ydim=5,bitpix=32,endian=big]");
    }

    #[test]
    fn test_display_cube_adds_zdim() {
        let params = ArrayParams {
            width: 4,
            height: 5,
            depth: 3,
            bitpix: -32,
            endian: ByteOrder::Little,
        };
        assert_eq!(
            params.to_string(),
            "array [xdim=4,ydim=5,zdim=3,bitpix=-32,endian=little]"
        );
        assert_eq!(params.dims(), vec![3, 5, 4]);
    }

    #[test]
    fn test_parse_roundtrips_display() {
        let text = "array [xdim=10,ydim=7,bitpix=-64,endian=little]";
        let params: ArrayParams = text.parse().unwrap();
        assert_eq!(params.width, 10);
        assert_eq!(params.height, 7);
        assert_eq!(params.depth, 1);
        assert_eq!(params.bitpix, -64);
        assert_eq!(params.to_string(), text);
    }

    #[test]
    fn test_parse_space_separated_without_endian() {
        let params: ArrayParams =
            "array [xdim=1024 ydim=512 bitpix=-32]".parse().unwrap();
        assert_eq!(params.dims(), vec![512, 1024]);
        assert_eq!(params.endian, ByteOrder::host());
    }

    #[test]
    fn test_parse_square_dim() {
        let params: ArrayParams = "array [dim=8,bitpix=8]".parse().unwrap();
        assert_eq!((params.width, params.height), (8, 8));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("fits [xdim=1]".parse::<ArrayParams>().is_err());
        assert!("array xdim=1,ydim=1,bitpix=8".parse::<ArrayParams>().is_err());
        assert!("array [xdim=1,bitpix=8]".parse::<ArrayParams>().is_err());
        assert!(matches!(
            "array [xdim=a,ydim=1,bitpix=8]".parse::<ArrayParams>(),
            Err(MarshalError::InvalidNumber { .. })
        ));
    }
}
