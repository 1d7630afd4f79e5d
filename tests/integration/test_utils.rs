//! Test utilities for integration tests.
//!
//! Builders for tile streams, LZF payloads and `.kra` archives, all in memory.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use kra_raster::container::EntrySource;
use kra_raster::error::ContainerError;

// =============================================================================
// LZF Payloads
// =============================================================================

/// Largest literal run a single control byte can announce.
const MAX_LITERAL_RUN: usize = 32;

/// Encode `raw` as LZF literal runs only.
///
/// Valid input for any conforming decompressor, just not smaller.
pub fn lzf_literal(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + raw.len() / MAX_LITERAL_RUN + 1);
    for chunk in raw.chunks(MAX_LITERAL_RUN) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
    out
}

/// Longest back-reference an instruction can encode: 7 + 255 + 2.
const MAX_MATCH: usize = 264;

/// Furthest back a reference can reach: 13 offset bits, plus one.
const MAX_DISTANCE: usize = 1 << 13;

const HASH_BITS: u32 = 14;

/// Compress `raw` the way liblzf does: a hash of the next three bytes finds
/// the latest earlier position with the same prefix, and greedy matches
/// become back-references.
pub fn lzf_compress(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut literals = Vec::new();
    let mut table = vec![usize::MAX; 1 << HASH_BITS];
    let mut ip = 0;

    while ip + 2 < raw.len() {
        let slot = hash3(&raw[ip..ip + 3]);
        let candidate = table[slot];
        table[slot] = ip;

        let is_match = candidate != usize::MAX
            && ip - candidate <= MAX_DISTANCE
            && raw[candidate..candidate + 3] == raw[ip..ip + 3];
        if !is_match {
            literals.push(raw[ip]);
            ip += 1;
            continue;
        }

        let limit = (raw.len() - ip).min(MAX_MATCH);
        let mut len = 3;
        while len < limit && raw[candidate + len] == raw[ip + len] {
            len += 1;
        }

        flush_literals(&mut out, &mut literals);
        let offset = ip - candidate - 1;
        let encoded_len = len - 2;
        if encoded_len < 7 {
            out.push(((encoded_len << 5) | (offset >> 8)) as u8);
        } else {
            out.push(((7 << 5) | (offset >> 8)) as u8);
            out.push((encoded_len - 7) as u8);
        }
        out.push((offset & 0xFF) as u8);
        ip += len;
    }

    literals.extend_from_slice(&raw[ip..]);
    flush_literals(&mut out, &mut literals);
    out
}

fn hash3(bytes: &[u8]) -> usize {
    let key = (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32;
    (key.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize
}

fn flush_literals(out: &mut Vec<u8>, literals: &mut Vec<u8>) {
    for chunk in literals.chunks(MAX_LITERAL_RUN) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
    literals.clear();
}

/// Deterministic noise that the compressor cannot shorten on its own.
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

/// A payload that references output before anything was written.
pub fn lzf_corrupt() -> Vec<u8> {
    vec![0x20, 0x00]
}

// =============================================================================
// Tile Streams
// =============================================================================

/// How a tile's payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Raw,
    Lzf,
}

/// One record of a test stream.
#[derive(Debug, Clone)]
pub struct TileSpec {
    pub x: i32,
    pub y: i32,
    pub label: &'static str,
    pub flag: u8,
    pub payload: Vec<u8>,
}

impl TileSpec {
    /// A tile holding `pixels` (planar), stored as requested.
    pub fn new(x: i32, y: i32, storage: Storage, pixels: &[u8]) -> Self {
        let (flag, payload) = match storage {
            Storage::Raw => (0, pixels.to_vec()),
            Storage::Lzf => (1, lzf_literal(pixels)),
        };
        Self {
            x,
            y,
            label: "LZF",
            flag,
            payload,
        }
    }

    /// A record with an explicit flag byte and payload.
    pub fn with_payload(x: i32, y: i32, flag: u8, payload: Vec<u8>) -> Self {
        Self {
            x,
            y,
            label: "LZF",
            flag,
            payload,
        }
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

/// Serialize a tile stream with the given geometry and records.
pub fn raster_stream(tile_width: u32, tile_height: u32, pixel_size: u32, tiles: &[TileSpec]) -> Vec<u8> {
    let mut out = format!(
        "VERSION 2\nTILEWIDTH {}\nTILEHEIGHT {}\nPIXELSIZE {}\nDATA {}\n",
        tile_width,
        tile_height,
        pixel_size,
        tiles.len()
    )
    .into_bytes();

    for tile in tiles {
        out.extend_from_slice(
            format!("{},{},{},{}\n", tile.x, tile.y, tile.label, tile.payload.len() + 1).as_bytes(),
        );
        out.push(tile.flag);
        out.extend_from_slice(&tile.payload);
    }
    out
}

/// A planar BGRA tile filled with a single color.
pub fn solid_tile(tile_width: usize, tile_height: usize, bgra: [u8; 4]) -> Vec<u8> {
    let plane = tile_width * tile_height;
    bgra.iter()
        .flat_map(|&channel| std::iter::repeat(channel).take(plane))
        .collect()
}

/// A planar single-channel tile counting up from `start`.
pub fn gradient_tile(tile_width: usize, tile_height: usize, start: u8) -> Vec<u8> {
    (0..tile_width * tile_height)
        .map(|i| start.wrapping_add(i as u8))
        .collect()
}

// =============================================================================
// Archives
// =============================================================================

/// Build a `.kra` archive: the mimetype entry first and stored, then `entries`.
pub fn kra_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file("mimetype", stored).unwrap();
    writer.write_all(b"application/x-krita").unwrap();

    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

// =============================================================================
// Mock Entry Source
// =============================================================================

/// An entry source backed by a map, counting every open.
pub struct MockEntrySource {
    entries: HashMap<String, Bytes>,
    opens: AtomicUsize,
}

impl MockEntrySource {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            opens: AtomicUsize::new(0),
        }
    }

    pub fn with_entry(mut self, path: &str, data: Vec<u8>) -> Self {
        self.entries.insert(path.to_string(), Bytes::from(data));
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl EntrySource for MockEntrySource {
    fn open_entry(&self, path: &str) -> Result<Bytes, ContainerError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| ContainerError::EntryNotFound(path.to_string()))
    }
}

// =============================================================================
// Image Checks
// =============================================================================

pub fn is_valid_png(data: &[u8]) -> bool {
    data.len() > 8 && data[..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
}

pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() > 4 && data[..2] == [0xFF, 0xD8] && data[data.len() - 2..] == [0xFF, 0xD9]
}

pub fn is_valid_bmp(data: &[u8]) -> bool {
    data.len() >= 54 && &data[..2] == b"BM"
}
