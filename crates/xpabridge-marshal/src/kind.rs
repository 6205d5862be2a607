//! Element kinds and typed element access.

use std::fmt;

use half::f16;
use serde::{Deserialize, Serialize};

use crate::ByteOrder;

/// The numeric type of one array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F16,
    F32,
    F64,
}

impl ElementKind {
    /// Every kind, narrowest integers first.
    pub const ALL: [ElementKind; 11] = [
        Self::U8,
        Self::I8,
        Self::U16,
        Self::I16,
        Self::U32,
        Self::I32,
        Self::U64,
        Self::I64,
        Self::F16,
        Self::F32,
        Self::F64,
    ];

    /// Size of one element in bytes.
    pub const fn byte_width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32 | Self::F64)
    }

    /// Conventional lowercase name, e.g. `"float32"`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::U32 => "uint32",
            Self::I32 => "int32",
            Self::U64 => "uint64",
            Self::I64 => "int64",
            Self::F16 => "float16",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    /// Reads one element of this kind as a wide scalar.
    pub(crate) fn read_scalar(self, bytes: &[u8], order: ByteOrder) -> Scalar {
        match self {
            Self::U8 => Scalar::Int(u8::read(bytes, order).into()),
            Self::I8 => Scalar::Int(i8::read(bytes, order).into()),
            Self::U16 => Scalar::Int(u16::read(bytes, order).into()),
            Self::I16 => Scalar::Int(i16::read(bytes, order).into()),
            Self::U32 => Scalar::Int(u32::read(bytes, order).into()),
            Self::I32 => Scalar::Int(i32::read(bytes, order).into()),
            Self::U64 => Scalar::Int(u64::read(bytes, order).into()),
            Self::I64 => Scalar::Int(i64::read(bytes, order).into()),
            Self::F16 => Scalar::Float(f16::read(bytes, order).to_f64()),
            Self::F32 => Scalar::Float(f32::read(bytes, order).into()),
            Self::F64 => Scalar::Float(f64::read(bytes, order)),
        }
    }

    /// Appends `value` converted to this kind. Floats bound for an integer
    /// kind are truncated toward zero first; integer narrowing wraps.
    pub(crate) fn write_scalar(
        self,
        value: Scalar,
        order: ByteOrder,
        out: &mut Vec<u8>,
    ) {
        match self {
            Self::U8 => (value.int() as u8).write(order, out),
            Self::I8 => (value.int() as i8).write(order, out),
            Self::U16 => (value.int() as u16).write(order, out),
            Self::I16 => (value.int() as i16).write(order, out),
            Self::U32 => (value.int() as u32).write(order, out),
            Self::I32 => (value.int() as i32).write(order, out),
            Self::U64 => (value.int() as u64).write(order, out),
            Self::I64 => (value.int() as i64).write(order, out),
            Self::F16 => f16::from_f64(value.float()).write(order, out),
            Self::F32 => (value.float() as f32).write(order, out),
            Self::F64 => value.float().write(order, out),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An element value widened to a common representation for conversions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Scalar {
    Int(i128),
    Float(f64),
}

impl Scalar {
    fn int(self) -> i128 {
        match self {
            Self::Int(i) => i,
            Self::Float(f) => f as i128,
        }
    }

    fn float(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A Rust type that can live in an [`ArrayBuffer`](crate::ArrayBuffer).
pub trait Element: Copy + Send + Sync + 'static {
    /// The kind this type is stored as.
    const KIND: ElementKind;

    /// Appends this value's bytes in `order`.
    fn write(self, order: ByteOrder, out: &mut Vec<u8>);

    /// Reads a value from exactly `KIND.byte_width()` bytes in `order`.
    fn read(bytes: &[u8], order: ByteOrder) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$kind;

                fn write(self, order: ByteOrder, out: &mut Vec<u8>) {
                    match order.resolve() {
                        ByteOrder::Big => out.extend_from_slice(&self.to_be_bytes()),
                        _ => out.extend_from_slice(&self.to_le_bytes()),
                    }
                }

                fn read(bytes: &[u8], order: ByteOrder) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                    match order.resolve() {
                        ByteOrder::Big => <$ty>::from_be_bytes(raw),
                        _ => <$ty>::from_le_bytes(raw),
                    }
                }
            }
        )*
    };
}

impl_element! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f16 => F16,
    f32 => F32,
    f64 => F64,
}
