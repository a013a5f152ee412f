//! Binary persistence for built forests.
//!
//! # File Format (v1.0)
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Header (16 bytes)                        │
//! │ ├── magic: [u8; 4] = "BSQF"              │
//! │ ├── version_major: u8 = 1                │
//! │ ├── version_minor: u8 = 0                │
//! │ ├── reserved: [u8; 2]                    │
//! │ └── payload_len: u64 (LE)                │
//! ├──────────────────────────────────────────┤
//! │ Payload: bincode-encoded Forest          │
//! ├──────────────────────────────────────────┤
//! │ CRC32 (IEEE, LE) over header + payload   │
//! └──────────────────────────────────────────┘
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::forest::Forest;
use crate::error::{BosqueError, Result};

const MAGIC: [u8; 4] = *b"BSQF";
const VERSION: (u8, u8) = (1, 0);
const HEADER_SIZE: usize = 16;
const CHECKSUM_SIZE: usize = 4;

impl Forest {
    /// Encodes the forest (store, trees and config) into bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        Ok(frame(&payload))
    }

    /// Decodes a forest produced by [`Forest::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::FormatError`] for truncated input, bad magic or
    /// an inconsistent tree structure, [`BosqueError::UnsupportedVersion`]
    /// for a newer major version, [`BosqueError::ChecksumMismatch`] for
    /// corrupted content and [`BosqueError::Serialization`] if the payload
    /// does not decode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(format_error("file too small for header and checksum"));
        }
        if bytes[0..4] != MAGIC {
            return Err(format_error(&format!(
                "invalid magic bytes: {:?}",
                &bytes[0..4]
            )));
        }

        let found = (bytes[4], bytes[5]);
        if found.0 != VERSION.0 {
            return Err(BosqueError::UnsupportedVersion {
                found,
                supported: VERSION,
            });
        }

        let body_end = bytes.len() - CHECKSUM_SIZE;
        let stored = read_u32_le(&bytes[body_end..]);
        let computed = crc32(&bytes[..body_end]);
        if stored != computed {
            return Err(BosqueError::ChecksumMismatch {
                expected: stored,
                actual: computed,
            });
        }

        let payload_len = read_u64_le(&bytes[8..16]);
        let payload = &bytes[HEADER_SIZE..body_end];
        if payload.len() as u64 != payload_len {
            return Err(format_error(&format!(
                "payload length {} does not match header ({payload_len})",
                payload.len()
            )));
        }

        let forest: Forest = bincode::deserialize(payload)?;
        if let Some(reason) = forest.structure_error() {
            return Err(format_error(&reason));
        }
        Ok(forest)
    }

    /// Saves the forest to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let start = Instant::now();
        let bytes = self.to_bytes()?;
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        info!(
            path = %path.as_ref().display(),
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "forest saved"
        );
        Ok(())
    }

    /// Loads a forest saved with [`Forest::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the file is not a valid forest.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let start = Instant::now();
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let forest = Self::from_bytes(&bytes)?;
        info!(
            path = %path.as_ref().display(),
            n_items = forest.len(),
            n_trees = forest.n_trees(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "forest loaded"
        );
        Ok(forest)
    }
}

/// Wraps an encoded payload in the header and trailing checksum.
fn frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len() + CHECKSUM_SIZE);
    bytes.extend_from_slice(&MAGIC);
    bytes.push(VERSION.0);
    bytes.push(VERSION.1);
    bytes.extend_from_slice(&[0u8; 2]);
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(payload);

    let checksum = crc32(&bytes);
    bytes.extend_from_slice(&checksum.to_le_bytes());
    bytes
}

fn format_error(message: &str) -> BosqueError {
    BosqueError::FormatError {
        message: message.to_string(),
    }
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

/// CRC32 checksum (IEEE polynomial)
pub(crate) fn crc32(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ TABLE[idx];
    }
    !crc
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod persist_tests;
