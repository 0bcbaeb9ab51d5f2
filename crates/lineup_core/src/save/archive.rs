//! Single-file container for snapshot blobs.
//!
//! Layout: LZ4 (size-prepended) of a MessagePack `Archive`, followed by a
//! 32-byte SHA-256 of the compressed payload.

use super::error::SaveError;
use super::format::{current_timestamp, SnapshotBlobs};
use super::ARCHIVE_VERSION;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const CHECKSUM_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    pub version: u32,
    /// Unix milliseconds
    pub saved_at: u64,
    pub blobs: SnapshotBlobs,
}

impl Archive {
    pub fn new(blobs: SnapshotBlobs) -> Self {
        Self { version: ARCHIVE_VERSION, saved_at: current_timestamp(), blobs }
    }
}

pub fn serialize_and_compress(archive: &Archive) -> Result<Vec<u8>, SaveError> {
    let msgpack = to_vec_named(archive)?;
    let mut out = compress_prepend_size(&msgpack);
    let checksum = Sha256::digest(&out);
    out.extend_from_slice(&checksum);
    Ok(out)
}

pub fn decompress_and_deserialize(bytes: &[u8]) -> Result<Archive, SaveError> {
    if bytes.len() < 4 + CHECKSUM_LEN {
        return Err(SaveError::Corrupted);
    }
    let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if Sha256::digest(payload).as_slice() != checksum {
        return Err(SaveError::ChecksumMismatch);
    }

    let msgpack = decompress_size_prepended(payload).map_err(|_| SaveError::Decompression)?;
    let archive: Archive = from_slice(&msgpack)?;

    if archive.version > ARCHIVE_VERSION {
        return Err(SaveError::VersionMismatch { found: archive.version, expected: ARCHIVE_VERSION });
    }
    Ok(archive)
}
