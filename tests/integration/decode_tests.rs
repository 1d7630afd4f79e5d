//! End-to-end decoding tests.
//!
//! Tests verify:
//! - Multi-tile streams reassemble onto the right canvas
//! - Raw and LZF tiles can be mixed in one stream
//! - Parallel decoding matches sequential decoding
//! - Corrupt and misplaced tiles follow the configured policies
//! - Malformed streams fail with positioned errors

use kra_raster::error::{CompositionWarning, DecompressionError, FormatError, LayerError};
use kra_raster::raster::{
    decode_layer, summarize, BoundingBox, CorruptTilePolicy, DecodeOptions, PlacementPolicy,
};

use super::test_utils::{
    gradient_tile, lzf_corrupt, raster_stream, solid_tile, Storage, TileSpec,
};

// =============================================================================
// Reassembly
// =============================================================================

#[test]
fn test_two_by_two_grid_of_bgra_tiles() {
    let red = [0x00, 0x00, 0xFF, 0xFF];
    let green = [0x00, 0xFF, 0x00, 0xFF];
    let blue = [0xFF, 0x00, 0x00, 0xFF];
    let white = [0xFF; 4];

    let stream = raster_stream(
        4,
        4,
        4,
        &[
            TileSpec::new(0, 0, Storage::Lzf, &solid_tile(4, 4, red)),
            TileSpec::new(4, 0, Storage::Raw, &solid_tile(4, 4, green)),
            TileSpec::new(0, 4, Storage::Lzf, &solid_tile(4, 4, blue)),
            TileSpec::new(4, 4, Storage::Raw, &solid_tile(4, 4, white)),
        ],
    );

    let layer = decode_layer(stream, &DecodeOptions::default()).unwrap();
    let canvas = &layer.canvas;

    assert_eq!((canvas.width, canvas.height), (8, 8));
    assert!(layer.warnings.is_empty());
    assert_eq!(canvas.pixel(0, 0), Some(&red[..]));
    assert_eq!(canvas.pixel(7, 0), Some(&green[..]));
    assert_eq!(canvas.pixel(3, 7), Some(&blue[..]));
    assert_eq!(canvas.pixel(7, 7), Some(&white[..]));
    assert_eq!(canvas.pixel(8, 0), None);
}

#[test]
fn test_negative_tile_coordinates_shift_origin() {
    let stream = raster_stream(
        2,
        2,
        1,
        &[
            TileSpec::new(-4, -2, Storage::Lzf, &gradient_tile(2, 2, 10)),
            TileSpec::new(0, 0, Storage::Lzf, &gradient_tile(2, 2, 20)),
        ],
    );

    let layer = decode_layer(stream, &DecodeOptions::default()).unwrap();
    let canvas = &layer.canvas;

    assert_eq!((canvas.origin_x, canvas.origin_y), (-4, -2));
    assert_eq!((canvas.width, canvas.height), (6, 4));
    assert_eq!(canvas.row(0), Some(&[10, 11, 0, 0, 0, 0][..]));
    assert_eq!(canvas.row(1), Some(&[12, 13, 0, 0, 0, 0][..]));
    assert_eq!(canvas.row(2), Some(&[0, 0, 0, 0, 20, 21][..]));
    assert_eq!(canvas.row(3), Some(&[0, 0, 0, 0, 22, 23][..]));
}

#[test]
fn test_gaps_between_tiles_stay_transparent() {
    let stream = raster_stream(
        1,
        1,
        4,
        &[
            TileSpec::new(0, 0, Storage::Raw, &[1, 2, 3, 4]),
            TileSpec::new(2, 0, Storage::Raw, &[5, 6, 7, 8]),
        ],
    );

    let layer = decode_layer(stream, &DecodeOptions::default()).unwrap();
    assert_eq!(layer.canvas.pixels, vec![1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8]);
}

#[test]
fn test_back_reference_payload() {
    // "ABC" literal, then a 3-byte match at distance 1
    let payload = vec![0x02, b'A', b'B', b'C', 0x20, 0x00];
    let stream = raster_stream(6, 1, 1, &[TileSpec::with_payload(0, 0, 1, payload)]);

    let layer = decode_layer(stream, &DecodeOptions::default()).unwrap();
    assert_eq!(layer.canvas.pixels, b"ABCCCC".to_vec());
}

#[test]
fn test_empty_stream_gives_empty_canvas() {
    let stream = raster_stream(64, 64, 4, &[]);
    let layer = decode_layer(stream, &DecodeOptions::default()).unwrap();

    assert_eq!(layer.header.tile_count, 0);
    assert!(layer.canvas.is_empty());
    assert_eq!((layer.canvas.width, layer.canvas.height), (0, 0));
}

#[test]
fn test_flag_byte_wins_over_label() {
    // Label says something else, flag says compressed: the payload is inflated
    let pixels = gradient_tile(4, 1, 1);
    let stream = raster_stream(
        4,
        1,
        1,
        &[TileSpec::new(0, 0, Storage::Lzf, &pixels).label("NONE")],
    );

    let layer = decode_layer(stream, &DecodeOptions::default()).unwrap();
    assert_eq!(layer.canvas.pixels, pixels);
}

// =============================================================================
// Parallel Decoding
// =============================================================================

#[test]
fn test_parallel_matches_sequential() {
    let mut tiles = Vec::new();
    for ty in 0..6 {
        for tx in 0..6 {
            let start = (tx * 6 + ty) as u8;
            let storage = if (tx + ty) % 2 == 0 { Storage::Lzf } else { Storage::Raw };
            tiles.push(TileSpec::new(tx * 8, ty * 8, storage, &gradient_tile(8, 8, start)));
        }
    }
    // Duplicate coordinates: the later record must win in both modes
    tiles.push(TileSpec::new(0, 0, Storage::Lzf, &gradient_tile(8, 8, 200)));

    let stream = raster_stream(8, 8, 1, &tiles);

    let sequential = decode_layer(stream.clone(), &DecodeOptions::default()).unwrap();
    let parallel = decode_layer(stream, &DecodeOptions::default().with_parallel(true)).unwrap();

    assert_eq!(sequential.canvas, parallel.canvas);
    assert_eq!(parallel.canvas.pixel(0, 0), Some(&[200][..]));
}

// =============================================================================
// Corrupt Tiles
// =============================================================================

#[test]
fn test_corrupt_tile_aborts_by_default() {
    let stream = raster_stream(
        2,
        2,
        1,
        &[
            TileSpec::new(0, 0, Storage::Lzf, &[1, 2, 3, 4]),
            TileSpec::with_payload(2, 0, 1, lzf_corrupt()),
        ],
    );

    let err = decode_layer(stream, &DecodeOptions::default()).unwrap_err();
    match err {
        LayerError::Decompression(DecompressionError::InTile {
            tile_index, source, ..
        }) => {
            assert_eq!(tile_index, 1);
            assert!(matches!(*source, DecompressionError::BadReference { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_corrupt_tile_blanked_on_request() {
    let stream = raster_stream(
        2,
        2,
        1,
        &[
            TileSpec::new(0, 0, Storage::Lzf, &[1, 2, 3, 4]),
            TileSpec::with_payload(2, 0, 1, lzf_corrupt()),
        ],
    );

    let options = DecodeOptions::default().with_corrupt_tiles(CorruptTilePolicy::Blank);
    let layer = decode_layer(stream, &options).unwrap();

    assert_eq!((layer.canvas.width, layer.canvas.height), (4, 2));
    assert_eq!(layer.canvas.pixels, vec![1, 2, 0, 0, 3, 4, 0, 0]);
    assert!(matches!(
        layer.warnings.as_slice(),
        [CompositionWarning::BlankedTile { tile_index: 1, grid_x: 2, grid_y: 0, .. }]
    ));

    let message = layer.warnings[0].to_string();
    assert_eq!(message.matches("Tile 1").count(), 1, "{message}");
}

#[test]
fn test_blanked_tile_survives_fail_fast_placement() {
    let stream = raster_stream(1, 1, 1, &[TileSpec::with_payload(0, 0, 1, lzf_corrupt())]);

    let options = DecodeOptions::default()
        .with_corrupt_tiles(CorruptTilePolicy::Blank)
        .with_placement(PlacementPolicy::FailFast);
    let layer = decode_layer(stream, &options).unwrap();

    assert_eq!(layer.canvas.pixels, vec![0]);
    assert_eq!(layer.warnings.len(), 1);
}

#[test]
fn test_wrong_decoded_length_is_corrupt() {
    // 2x2 tile but only three raw bytes
    let stream = raster_stream(2, 2, 1, &[TileSpec::new(0, 0, Storage::Raw, &[1, 2, 3])]);

    let err = decode_layer(stream, &DecodeOptions::default()).unwrap_err();
    match err {
        LayerError::Decompression(DecompressionError::InTile { source, .. }) => {
            assert_eq!(
                *source,
                DecompressionError::LengthMismatch {
                    expected: 4,
                    actual: 3,
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

// =============================================================================
// Placement
// =============================================================================

#[test]
fn test_tile_outside_explicit_bounds() {
    let stream = raster_stream(
        2,
        2,
        1,
        &[
            TileSpec::new(0, 0, Storage::Raw, &[1, 2, 3, 4]),
            TileSpec::new(-2, 0, Storage::Raw, &[9, 9, 9, 9]),
        ],
    );
    let bounds = BoundingBox::new(0, 0, 2, 2);

    let layer = decode_layer(stream.clone(), &DecodeOptions::default().with_bounds(bounds)).unwrap();
    assert_eq!(layer.canvas.pixels, vec![1, 2, 3, 4]);
    assert!(matches!(
        layer.warnings.as_slice(),
        [CompositionWarning::NegativeOffset { tile_index: 1, .. }]
    ));

    let strict = DecodeOptions::default()
        .with_bounds(bounds)
        .with_placement(PlacementPolicy::FailFast);
    let err = decode_layer(stream, &strict).unwrap_err();
    assert!(matches!(
        err,
        LayerError::Placement(CompositionWarning::NegativeOffset { tile_index: 1, .. })
    ));
}

#[test]
fn test_canvas_limit() {
    let stream = raster_stream(
        64,
        64,
        4,
        &[
            TileSpec::new(0, 0, Storage::Lzf, &solid_tile(64, 64, [0; 4])),
            TileSpec::new(6400, 6400, Storage::Lzf, &solid_tile(64, 64, [0; 4])),
        ],
    );

    let options = DecodeOptions::default().with_max_canvas_bytes(1024 * 1024);
    let err = decode_layer(stream, &options).unwrap_err();
    assert!(matches!(
        err,
        LayerError::Format(FormatError::CanvasTooLarge { width: 6464, height: 6464, .. })
    ));
}

// =============================================================================
// Malformed Streams
// =============================================================================

#[test]
fn test_truncated_payload() {
    let mut stream = raster_stream(2, 2, 1, &[TileSpec::new(0, 0, Storage::Raw, &[1, 2, 3, 4])]);
    stream.truncate(stream.len() - 2);

    let err = decode_layer(stream, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        LayerError::Format(FormatError::Truncated {
            tile_index: 0,
            requested: 5,
            available: 3,
            ..
        })
    ));
}

#[test]
fn test_fewer_records_than_declared() {
    let mut stream = raster_stream(1, 1, 1, &[TileSpec::new(0, 0, Storage::Raw, &[7])]);
    // Claim two tiles
    let text = String::from_utf8_lossy(&stream).replace("DATA 1", "DATA 2");
    stream = text.into_bytes();

    let err = decode_layer(stream, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        LayerError::Format(FormatError::MalformedRecord { tile_index: 1, .. })
    ));
}

#[test]
fn test_missing_data_field() {
    let stream = b"TILEWIDTH 64\nTILEHEIGHT 64\nPIXELSIZE 4\n".repeat(6);
    let err = decode_layer(stream, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        LayerError::Format(FormatError::MissingData { max_lines: 16 })
    ));
}

// =============================================================================
// Summary
// =============================================================================

#[test]
fn test_summary_counts_tiles() {
    let stream = raster_stream(
        4,
        4,
        1,
        &[
            TileSpec::new(0, 0, Storage::Lzf, &gradient_tile(4, 4, 0)),
            TileSpec::new(4, 0, Storage::Raw, &gradient_tile(4, 4, 0)),
            TileSpec::new(8, 4, Storage::Raw, &gradient_tile(4, 4, 0)).label("RAW"),
        ],
    );

    let summary = summarize(stream).unwrap();
    assert_eq!(summary.header.tile_count, 3);
    assert_eq!(summary.compressed_tiles, 1);
    assert_eq!(summary.raw_tiles, 2);
    assert_eq!(summary.bounds, BoundingBox::new(0, 0, 12, 8));
    assert_eq!(summary.methods.get("LZF"), Some(&2));
    assert_eq!(summary.methods.get("RAW"), Some(&1));
}
