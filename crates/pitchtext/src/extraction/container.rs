//! ZIP package access for Office Open XML documents.
//!
//! [`Container`] wraps a `zip::ZipArchive` over borrowed bytes and exposes parts by their
//! in-package path. Text decoding goes through an ordered list of [`DecoderAttempt`]s so
//! that parts written by unusual producers (UTF-16 XML, bad CRCs, stored-but-mislabelled
//! entries) still yield text. A part that no attempt can decode reads as an empty string.

use crate::error::{PitchtextError, Result};
use flate2::read::DeflateDecoder;
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use zip::{CompressionMethod, ZipArchive};

/// Upper bound on the decompressed size of a single part.
const MAX_PART_SIZE: u64 = 256 * 1024 * 1024;

/// A named payload inside a package.
///
/// Holds both the bytes the archive produced when decompressing the entry (if it could)
/// and the bytes exactly as stored, so decoder attempts stay pure functions of the part.
#[derive(Debug, Clone)]
pub struct PackagePart {
    pub path: String,
    pub compression: CompressionMethod,
    decompressed: Option<Vec<u8>>,
    stored: Option<Vec<u8>>,
}

impl PackagePart {
    pub fn new(
        path: impl Into<String>,
        compression: CompressionMethod,
        decompressed: Option<Vec<u8>>,
        stored: Option<Vec<u8>>,
    ) -> Self {
        Self {
            path: path.into(),
            compression,
            decompressed,
            stored,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.decompressed.as_deref()
    }
}

/// One strategy for turning a part into text; `None` means "try the next one".
pub type DecoderAttempt = fn(&PackagePart) -> Option<String>;

/// Decoder attempts in the order they are tried.
pub const DECODER_ATTEMPTS: [(&str, DecoderAttempt); 4] = [
    ("text", decode_as_text),
    ("buffer", decode_as_buffer),
    ("inflate", decode_inflated),
    ("raw", decode_raw),
];

/// Decode a part to text, falling through [`DECODER_ATTEMPTS`] in order.
///
/// Returns an empty string when every attempt fails; callers treat that as "no content".
pub fn decode_text(part: &PackagePart) -> String {
    for (name, attempt) in DECODER_ATTEMPTS {
        if let Some(text) = attempt(part) {
            if name != "text" {
                tracing::debug!("Decoded part {} with the '{}' decoder", part.path, name);
            }
            return text;
        }
    }
    tracing::debug!("No decoder could read part {}", part.path);
    String::new()
}

/// The archive's own decompression, strict UTF-8.
fn decode_as_text(part: &PackagePart) -> Option<String> {
    let bytes = part.decompressed.as_deref()?;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).ok().map(str::to_string)
}

/// The archive's own decompression, with byte-order-mark detection for UTF-16 parts.
fn decode_as_buffer(part: &PackagePart) -> Option<String> {
    let bytes = part.decompressed.as_deref()?;
    decode_unicode(bytes)
}

/// Inflate the stored bytes directly, ignoring the entry's checksum.
fn decode_inflated(part: &PackagePart) -> Option<String> {
    if part.compression != CompressionMethod::Deflated {
        return None;
    }
    let stored = part.stored.as_deref()?;
    let mut inflated = Vec::new();
    let mut decoder = DeflateDecoder::new(stored).take(MAX_PART_SIZE);
    if let Err(e) = decoder.read_to_end(&mut inflated) {
        if inflated.is_empty() {
            tracing::debug!("Raw inflate of {} failed: {}", part.path, e);
            return None;
        }
        tracing::debug!("Raw inflate of {} recovered {} bytes before error", part.path, inflated.len());
    }
    Some(decode_unicode(&inflated).unwrap_or_else(|| String::from_utf8_lossy(&inflated).into_owned()))
}

/// Last resort: the stored bytes of an uncompressed entry, decoded lossily.
fn decode_raw(part: &PackagePart) -> Option<String> {
    if part.compression != CompressionMethod::Stored {
        return None;
    }
    let stored = part.stored.as_deref()?;
    Some(String::from_utf8_lossy(stored).into_owned())
}

fn decode_unicode(bytes: &[u8]) -> Option<String> {
    if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE") {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).ok().map(str::to_string)
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]])).collect();
    String::from_utf16(&units).ok()
}

/// Normalize an archive entry name to the canonical in-package form.
pub fn normalize_part_name(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Read access to named text parts.
///
/// Implemented by [`Container`]; the map implementation backs unit tests and callers that
/// already hold decoded parts.
pub trait PartSource {
    /// Canonical names of all parts, in package order.
    fn part_names(&self) -> Vec<String>;

    /// Decoded text of a part, or `None` when the package has no such part.
    fn read_text(&mut self, path: &str) -> Option<String>;
}

impl PartSource for BTreeMap<String, String> {
    fn part_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn read_text(&mut self, path: &str) -> Option<String> {
        self.get(path).cloned()
    }
}

/// An opened document package.
pub struct Container<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    names: Vec<String>,
    index: HashMap<String, usize>,
    lowercase_index: HashMap<String, usize>,
}

impl<'a> Container<'a> {
    /// Open a package from bytes.
    ///
    /// # Errors
    ///
    /// `CorruptContainer` if the bytes are not a readable ZIP archive. Reading from memory
    /// cannot hit the file system, so archive I/O errors are corruption too.
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| PitchtextError::corrupt_container_with_source(format!("Failed to open package: {}", e), e))?;

        let mut names = Vec::with_capacity(archive.len());
        let mut index = HashMap::with_capacity(archive.len());
        let mut lowercase_index = HashMap::with_capacity(archive.len());
        for i in 0..archive.len() {
            let Some(raw_name) = archive.name_for_index(i) else {
                continue;
            };
            if raw_name.ends_with('/') {
                continue;
            }
            let name = normalize_part_name(raw_name);
            lowercase_index.entry(name.to_lowercase()).or_insert(i);
            if index.insert(name.clone(), i).is_none() {
                names.push(name);
            }
        }

        Ok(Self {
            archive,
            names,
            index,
            lowercase_index,
        })
    }

    pub fn has_part(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    fn lookup(&self, path: &str) -> Option<usize> {
        let name = normalize_part_name(path);
        self.index
            .get(&name)
            .or_else(|| self.lowercase_index.get(&name.to_lowercase()))
            .copied()
    }

    /// Load a part, or `None` if the package has no part at `path`.
    ///
    /// Lookup is exact first, then case-insensitive.
    pub fn get_part(&mut self, path: &str) -> Option<PackagePart> {
        let idx = self.lookup(path)?;

        let (compression, decompressed) = match self.archive.by_index(idx) {
            Ok(file) => {
                let compression = file.compression();
                let mut buf = Vec::new();
                match file.take(MAX_PART_SIZE).read_to_end(&mut buf) {
                    Ok(_) => (compression, Some(buf)),
                    Err(e) => {
                        tracing::debug!("Archive could not decompress {}: {}", path, e);
                        (compression, None)
                    }
                }
            }
            Err(e) => {
                tracing::debug!("Archive could not open {}: {}", path, e);
                (CompressionMethod::Stored, None)
            }
        };

        let stored = match self.archive.by_index_raw(idx) {
            Ok(file) => {
                let mut buf = Vec::new();
                file.take(MAX_PART_SIZE).read_to_end(&mut buf).ok().map(|_| buf)
            }
            Err(e) => {
                tracing::debug!("Archive could not read stored bytes of {}: {}", path, e);
                None
            }
        };

        Some(PackagePart::new(normalize_part_name(path), compression, decompressed, stored))
    }

    /// Raw decompressed bytes of a part.
    pub fn read_bytes(&mut self, path: &str) -> Option<Vec<u8>> {
        self.get_part(path).and_then(|part| part.decompressed)
    }
}

impl PartSource for Container<'_> {
    fn part_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn read_text(&mut self, path: &str) -> Option<String> {
        self.get_part(path).map(|part| decode_text(&part))
    }
}
