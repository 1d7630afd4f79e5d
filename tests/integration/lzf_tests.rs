//! LZF decoding against compressor output.
//!
//! Tests verify:
//! - Compressed buffers expand byte-exact, including long and distant matches
//! - Compressed tiles decode to the same canvas as their raw form
//! - Parallel decoding of compressed tiles matches sequential decoding

use kra_raster::format::lzf::decompress;
use kra_raster::raster::{decode_layer, DecodeOptions};

use super::test_utils::{lzf_compress, noise, raster_stream, Storage, TileSpec};

const TILE: usize = 64;

/// A planar 64x64 BGRA tile: diagonal gradient, repeating noise, flat red, opaque.
fn textured_tile(seed: u8) -> Vec<u8> {
    let plane = TILE * TILE;
    let mut pixels = Vec::with_capacity(plane * 4);

    for y in 0..TILE {
        for x in 0..TILE {
            pixels.push(((x + y) * 2) as u8 ^ seed);
        }
    }
    pixels.extend(noise(plane / 4, seed as u32 + 1).repeat(4));
    pixels.extend(std::iter::repeat(0x80 ^ seed).take(plane));
    pixels.extend(std::iter::repeat(0xFF).take(plane));
    pixels
}

/// Interleave a planar tile into BGRA pixels.
fn interleave(planar: &[u8]) -> Vec<[u8; 4]> {
    let plane = planar.len() / 4;
    (0..plane)
        .map(|i| {
            [
                planar[i],
                planar[plane + i],
                planar[2 * plane + i],
                planar[3 * plane + i],
            ]
        })
        .collect()
}

#[test]
fn test_repeated_block_far_back() {
    // Second half is a 600-byte copy of the first
    let block = noise(600, 7);
    let data = [block.clone(), block].concat();
    let compressed = lzf_compress(&data);

    assert!(compressed.len() < 700, "compressed to {} bytes", compressed.len());
    assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn test_long_zero_run() {
    let data = vec![0u8; 2000];
    let compressed = lzf_compress(&data);

    assert!(compressed.len() < 64, "compressed to {} bytes", compressed.len());
    assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn test_mixed_content() {
    let data = [
        noise(300, 3),
        vec![0u8; 700],
        noise(300, 3),
        b"abc".repeat(200),
        noise(1000, 9),
        noise(300, 3),
    ]
    .concat();
    let compressed = lzf_compress(&data);

    assert!(compressed.len() < data.len());
    assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn test_incompressible_input() {
    let data = noise(500, 42);
    assert_eq!(decompress(&lzf_compress(&data)).unwrap(), data);
}

#[test]
fn test_compressed_tiles_decode_onto_canvas() {
    let left = textured_tile(0);
    let right = textured_tile(1);
    let stream = raster_stream(
        TILE as u32,
        TILE as u32,
        4,
        &[
            TileSpec::with_payload(0, 0, 1, lzf_compress(&left)),
            TileSpec::with_payload(TILE as i32, 0, 1, lzf_compress(&right)),
        ],
    );

    let layer = decode_layer(stream, &DecodeOptions::default()).unwrap();
    let canvas = &layer.canvas;
    assert_eq!((canvas.width, canvas.height), (2 * TILE, TILE));
    assert!(layer.warnings.is_empty());

    for (tile_x, planar) in [(0, &left), (TILE, &right)] {
        let expected = interleave(planar);
        for y in 0..TILE {
            for x in 0..TILE {
                assert_eq!(
                    canvas.pixel(tile_x + x, y),
                    Some(&expected[y * TILE + x][..]),
                    "pixel ({}, {})",
                    tile_x + x,
                    y
                );
            }
        }
    }
}

#[test]
fn test_compressed_and_raw_tiles_agree() {
    let planar = textured_tile(5);
    let compressed = raster_stream(
        TILE as u32,
        TILE as u32,
        4,
        &[TileSpec::with_payload(0, 0, 1, lzf_compress(&planar))],
    );
    let raw = raster_stream(
        TILE as u32,
        TILE as u32,
        4,
        &[TileSpec::new(0, 0, Storage::Raw, &planar)],
    );

    let from_compressed = decode_layer(compressed, &DecodeOptions::default()).unwrap();
    let from_raw = decode_layer(raw, &DecodeOptions::default()).unwrap();
    assert_eq!(from_compressed.canvas.pixels, from_raw.canvas.pixels);
}

#[test]
fn test_parallel_decode_of_compressed_tiles() {
    let tiles: Vec<TileSpec> = (0..6)
        .map(|i| {
            let x = (i % 3) as i32 * TILE as i32;
            let y = (i / 3) as i32 * TILE as i32;
            TileSpec::with_payload(x, y, 1, lzf_compress(&textured_tile(i as u8)))
        })
        .collect();
    let stream = raster_stream(TILE as u32, TILE as u32, 4, &tiles);

    let sequential = decode_layer(stream.clone(), &DecodeOptions::default()).unwrap();
    let parallel = decode_layer(stream, &DecodeOptions::default().with_parallel(true)).unwrap();
    assert_eq!(sequential.canvas, parallel.canvas);
}
