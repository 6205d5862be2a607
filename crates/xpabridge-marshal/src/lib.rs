//! Data marshalling for XPA viewer exchange.
//!
//! Converts between in-memory numeric arrays and the raw byte buffers the
//! viewer understands:
//!
//! - **Arrays** ([`ArrayBuffer`], [`Element`], [`ElementKind`]): typed 2-D
//!   and 3-D buffers with explicit shape, strides and byte order.
//! - **Parameters** ([`ArrayParams`]): the `array [xdim=..,ydim=..,...]`
//!   command that describes a raw buffer on the wire.
//! - **Marshaller** ([`ArrayMarshaller`]): applies the [`BitpixTable`] and
//!   the [`WideningPolicy`] to go from one to the other.
//! - **Containers** ([`ContainerCodec`], [`FitsBlocks`]): whole-file
//!   formats moved as opaque buffers.
//!
//! # Architecture
//!
//! Nothing here does I/O. The session layer fetches or sends bytes; this
//! crate only decides what those bytes mean.
//!
//! ```text
//! ArrayBuffer → ArrayMarshaller → (ArrayParams, bytes) → Session → Transport
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod array;
mod bitpix;
mod container;
mod error;
mod kind;
mod marshaller;
mod order;
mod params;
mod widen;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use array::ArrayBuffer;
pub use bitpix::BitpixTable;
pub use container::{
    BLOCK_SIZE, CARD_SIZE, ContainerCodec, FitsBlocks, FitsFile, NoContainerCodec,
    build_fits,
};
pub use error::MarshalError;
pub use kind::{Element, ElementKind};
pub use marshaller::{ArrayMarshaller, EncodedArray};
pub use order::ByteOrder;
pub use params::ArrayParams;
pub use widen::WideningPolicy;
