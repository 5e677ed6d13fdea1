//! Application image handling for RDA8910 LogicROM firmware.
//!
//! The vendor packaging tool expects the application image (`APPIMG`) to be a flat binary whose
//! header carries the padded image size at offset 4 and a CRC32 at offset 8. [finalize] produces
//! that format from the raw output of `objcopy -O binary` (or [elf::flatten]).

pub mod elf;

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Images are padded to a multiple of this many bytes.
pub const IMAGE_ALIGN: usize = 0x80;

/// Offset of the little-endian `u32` total image size in the header.
pub const SIZE_OFFSET: usize = 4;

/// Offset of the little-endian `u32` CRC32 in the header.
pub const CRC_OFFSET: usize = 8;

/// Shortest input for which both header fields are in range.
pub const MIN_IMAGE_LEN: usize = CRC_OFFSET + 4;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image is {len} bytes, header needs at least 12")]
    InvalidInput { len: usize },

    #[error("image is {len} bytes, which does not fit the 32-bit header size field")]
    TooLarge { len: usize },

    #[error("failed to parse ELF file: {0}")]
    Elf(#[from] ::elf::ParseError),

    #[error("ELF file has no loadable segments with file data")]
    NoLoadableSegments,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// Round `len` up to the next multiple of [IMAGE_ALIGN].
pub const fn align_up(len: usize) -> usize {
    (len + (IMAGE_ALIGN - 1)) & !(IMAGE_ALIGN - 1)
}

/// An application image with its size and checksum header fields filled in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FinalizedImage {
    bytes: Vec<u8>,
    original_size: usize,
}

impl FinalizedImage {
    /// Length of the raw image before padding.
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    /// The size field at [SIZE_OFFSET].
    pub fn declared_size(&self) -> u32 {
        read_u32_le(&self.bytes, SIZE_OFFSET)
    }

    /// The checksum field at [CRC_OFFSET].
    pub fn checksum(&self) -> u32 {
        read_u32_le(&self.bytes, CRC_OFFSET)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    let mut field = [0u8; 4];
    field.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(field)
}

/// Pad `raw` to [IMAGE_ALIGN] and patch the header size and CRC32 fields.
///
/// The CRC covers the whole padded buffer after the size field has been written, with the
/// checksum field still holding whatever `raw` had there. It is not zeroed first.
pub fn finalize(raw: &[u8]) -> Result<FinalizedImage> {
    let original_size = raw.len();
    if original_size < MIN_IMAGE_LEN {
        return Err(ImageError::InvalidInput { len: original_size });
    }

    let padded_size = align_up(original_size);
    let declared = u32::try_from(padded_size)
        .map_err(|_| ImageError::TooLarge { len: original_size })?;

    let mut bytes = Vec::with_capacity(padded_size);
    bytes.extend_from_slice(raw);
    bytes.resize(padded_size, 0);

    bytes[SIZE_OFFSET..SIZE_OFFSET + 4].copy_from_slice(&declared.to_le_bytes());   // size
    let crc = crc32fast::hash(&bytes);
    bytes[CRC_OFFSET..CRC_OFFSET + 4].copy_from_slice(&crc.to_le_bytes());          // crc

    debug!("finalized image: {original_size} -> {padded_size} bytes, crc {crc:#010x}");

    Ok(FinalizedImage { bytes, original_size })
}

/// Finalize the raw image at `path`, overwriting it with the result.
pub fn finalize_file(path: &Path) -> Result<FinalizedImage> {
    let raw = std::fs::read(path).map_err(|source| ImageError::Io { path: path.to_path_buf(), source })?;
    info!("Binary size: {}", raw.len());

    let image = finalize(&raw)?;
    std::fs::write(path, image.as_bytes())
        .map_err(|source| ImageError::Io { path: path.to_path_buf(), source })?;

    Ok(image)
}
