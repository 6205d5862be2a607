//! Element kind ↔ bitpix mapping.
//!
//! bitpix is the signed code the viewer uses for element types: positive
//! values are integer widths in bits, negative values are floating point.
//! `-16` is borrowed for unsigned 16-bit data, which the container format
//! otherwise has no code for.

use crate::{ElementKind, MarshalError};

/// An immutable, bijective kind ↔ bitpix table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitpixTable {
    entries: Vec<(ElementKind, i32)>,
}

impl BitpixTable {
    /// The table the viewer understands.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                (ElementKind::U8, 8),
                (ElementKind::I16, 16),
                (ElementKind::I32, 32),
                (ElementKind::I64, 64),
                (ElementKind::F32, -32),
                (ElementKind::F64, -64),
                (ElementKind::U16, -16),
            ],
        }
    }

    /// bitpix code for `kind`.
    ///
    /// # Errors
    /// [`MarshalError::UnsupportedKind`] if the kind has no code.
    pub fn bitpix_of(&self, kind: ElementKind) -> Result<i32, MarshalError> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, bp)| *bp)
            .ok_or(MarshalError::UnsupportedKind(kind))
    }

    /// Element kind for a bitpix code.
    ///
    /// # Errors
    /// [`MarshalError::UnsupportedBitpix`] if the code is unknown.
    pub fn kind_of(&self, bitpix: i32) -> Result<ElementKind, MarshalError> {
        self.entries
            .iter()
            .find(|(_, bp)| *bp == bitpix)
            .map(|(k, _)| *k)
            .ok_or(MarshalError::UnsupportedBitpix(bitpix))
    }

    /// Returns `true` if `kind` can be sent without conversion.
    pub fn supports(&self, kind: ElementKind) -> bool {
        self.entries.iter().any(|(k, _)| *k == kind)
    }

    pub fn entries(&self) -> &[(ElementKind, i32)] {
        &self.entries
    }
}

impl Default for BitpixTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: [(i32, ElementKind); 7] = [
        (8, ElementKind::U8),
        (16, ElementKind::I16),
        (32, ElementKind::I32),
        (64, ElementKind::I64),
        (-32, ElementKind::F32),
        (-64, ElementKind::F64),
        (-16, ElementKind::U16),
    ];

    #[test]
    fn test_bitpix_to_kind() {
        let table = BitpixTable::standard();
        for (bitpix, kind) in PAIRS {
            assert_eq!(table.kind_of(bitpix).unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_to_bitpix() {
        let table = BitpixTable::standard();
        for (bitpix, kind) in PAIRS {
            assert_eq!(table.bitpix_of(kind).unwrap(), bitpix);
        }
    }

    #[test]
    fn test_mapping_is_a_bijection() {
        let table = BitpixTable::standard();
        for &(kind, bitpix) in table.entries() {
            assert_eq!(table.kind_of(table.bitpix_of(kind).unwrap()).unwrap(), kind);
            assert_eq!(table.bitpix_of(table.kind_of(bitpix).unwrap()).unwrap(), bitpix);
        }
    }

    #[test]
    fn test_unsupported_bitpix_fails() {
        let err = BitpixTable::standard().kind_of(43).unwrap_err();
        assert_eq!(err.to_string(), "unsupported bitpix: 43");
    }

    #[test]
    fn test_unsupported_kinds_fail() {
        let table = BitpixTable::standard();
        for kind in [
            ElementKind::I8,
            ElementKind::U32,
            ElementKind::U64,
            ElementKind::F16,
        ] {
            let err = table.bitpix_of(kind).unwrap_err();
            assert!(err.to_string().starts_with("unsupported dtype"));
            assert!(!table.supports(kind));
        }
    }
}
