//! Container codec trait and implementations.
//!
//! A "container" is a self-describing binary file (a FITS file, for the
//! viewer). The session layer only moves whole container buffers; what is
//! inside them belongs to the codec. That split is the [`ContainerCodec`]
//! trait: swap the codec and nothing else changes.
//!
//! Two codecs ship here:
//!
//! - [`FitsBlocks`] checks the block structure and primary header of a FITS
//!   file and keeps the bytes intact.
//! - [`NoContainerCodec`] is the stand-in when no container support is
//!   wired in. Every call fails with [`MarshalError::CodecUnavailable`].

use crate::MarshalError;

/// FITS files are made of blocks of this many bytes.
pub const BLOCK_SIZE: usize = 2880;

/// Header cards are this many bytes.
pub const CARD_SIZE: usize = 80;

/// Converts between container bytes and a decoded document.
///
/// ## Trait bounds
///
/// - `Send + Sync + 'static` → one codec can be built at startup and
///   shared by every session.
pub trait ContainerCodec: Send + Sync + 'static {
    /// The decoded structure.
    type Document;

    /// Decodes a complete container buffer.
    ///
    /// # Errors
    /// [`MarshalError::WrongContainer`] if the bytes aren't a container of
    /// this format.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Document, MarshalError>;

    /// Encodes a document back into bytes.
    ///
    /// # Errors
    /// [`MarshalError::WrongContainer`] if the document isn't structurally
    /// valid for this format.
    fn encode(&self, document: &Self::Document) -> Result<Vec<u8>, MarshalError>;
}

// ---------------------------------------------------------------------------
// FitsFile / FitsBlocks
// ---------------------------------------------------------------------------

/// A structurally valid FITS file held as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitsFile {
    bytes: Vec<u8>,
}

impl FitsFile {
    /// Validates and wraps `bytes`.
    ///
    /// # Errors
    /// [`MarshalError::WrongContainer`] unless the buffer is a whole number
    /// of 2880-byte blocks, starts with a `SIMPLE` card and has an `END`
    /// card in its primary header.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, MarshalError> {
        validate(&bytes)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Primary header cards up to, not including, `END`, trailing blanks
    /// trimmed.
    pub fn header_cards(&self) -> Vec<String> {
        self.bytes
            .chunks_exact(CARD_SIZE)
            .map(|card| String::from_utf8_lossy(card).trim_end().to_string())
            .take_while(|card| card != "END")
            .collect()
    }

    /// Value of the first primary header card with `keyword`, without any
    /// `/ comment` and quotes.
    pub fn keyword(&self, keyword: &str) -> Option<String> {
        self.header_cards().into_iter().find_map(|card| {
            let key = card.get(..8)?.trim_end();
            if !key.eq_ignore_ascii_case(keyword) || card.get(8..10) != Some("= ") {
                return None;
            }
            let value = card[10..].split('/').next().unwrap_or("").trim();
            Some(value.trim_matches('\'').trim().to_string())
        })
    }
}

fn validate(bytes: &[u8]) -> Result<(), MarshalError> {
    if bytes.is_empty() || bytes.len() % BLOCK_SIZE != 0 {
        return Err(MarshalError::WrongContainer(format!(
            "length {} is not a multiple of {BLOCK_SIZE}",
            bytes.len()
        )));
    }
    if !bytes.starts_with(b"SIMPLE  =") {
        return Err(MarshalError::WrongContainer(
            "primary header does not start with SIMPLE".to_string(),
        ));
    }
    let has_end = bytes
        .chunks_exact(CARD_SIZE)
        .any(|card| card.starts_with(b"END") && card[3..].iter().all(|&b| b == b' '));
    if !has_end {
        return Err(MarshalError::WrongContainer(
            "primary header has no END card".to_string(),
        ));
    }
    Ok(())
}

/// The FITS container codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitsBlocks;

impl ContainerCodec for FitsBlocks {
    type Document = FitsFile;

    fn decode(&self, bytes: &[u8]) -> Result<FitsFile, MarshalError> {
        FitsFile::from_bytes(bytes.to_vec())
    }

    fn encode(&self, document: &FitsFile) -> Result<Vec<u8>, MarshalError> {
        validate(&document.bytes)?;
        Ok(document.bytes.clone())
    }
}

// ---------------------------------------------------------------------------
// NoContainerCodec
// ---------------------------------------------------------------------------

/// A codec for builds without container support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContainerCodec;

impl ContainerCodec for NoContainerCodec {
    type Document = Vec<u8>;

    fn decode(&self, _bytes: &[u8]) -> Result<Vec<u8>, MarshalError> {
        Err(MarshalError::CodecUnavailable("container"))
    }

    fn encode(&self, _document: &Vec<u8>) -> Result<Vec<u8>, MarshalError> {
        Err(MarshalError::CodecUnavailable("container"))
    }
}

/// Builds a minimal FITS file with the given header cards and data bytes.
/// Cards are padded to 80 bytes, `END` is appended and both header and
/// data are padded to whole blocks.
pub fn build_fits(cards: &[&str], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for card in cards.iter().copied().chain(std::iter::once("END")) {
        let mut line = card.as_bytes().to_vec();
        line.resize(CARD_SIZE, b' ');
        out.extend_from_slice(&line[..CARD_SIZE]);
    }
    pad_to_block(&mut out, b' ');
    if !data.is_empty() {
        out.extend_from_slice(data);
        pad_to_block(&mut out, 0);
    }
    out
}

fn pad_to_block(buf: &mut Vec<u8>, fill: u8) {
    let rem = buf.len() % BLOCK_SIZE;
    if rem != 0 {
        buf.resize(buf.len() + BLOCK_SIZE - rem, fill);
    }
}
