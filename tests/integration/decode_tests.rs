//! Decoder integration tests.
//!
//! Tests verify:
//! - Big-endian streams with out-of-line values decode correctly
//! - Out-of-line reads return the cursor to the entry table
//! - Sub-directory offset tables are followed and their next pointers ignored
//! - Malformed streams fail cleanly with the expected error

use std::io::Cursor;

use tiff_dir::{
    decode, ByteOrder, CoderRegistry, DecodeError, DecodeOptions, Decoder, HeaderError, IoError,
    Rational, Value, SUB_IFDS,
};

use super::test_utils::{StreamBuilder, TrackingReader};

const LE: ByteOrder = ByteOrder::LittleEndian;
const BE: ByteOrder = ByteOrder::BigEndian;

/// Big-endian directory at 8 with one inline and two out-of-line values.
///
/// Layout: entries 10..46, next 46..50, SHORT[3] at 52, RATIONAL at 60.
fn big_endian_stream() -> StreamBuilder {
    let mut s = StreamBuilder::new(BE, 8);
    s.u16(3)
        .entry(256, 4, 1, 2048)
        .entry(258, 3, 3, 52)
        .entry(282, 5, 1, 60)
        .u32(0)
        .pad_to(52)
        .u16(8)
        .u16(8)
        .u16(8)
        .pad_to(60)
        .u32(300)
        .u32(1);
    s
}

// =============================================================================
// Byte Order Tests
// =============================================================================

#[test]
fn test_big_endian_out_of_line_values() {
    let container = decode(big_endian_stream().cursor()).unwrap();

    assert_eq!(container.len(), 1);
    let dir = &container.directories[0];
    assert_eq!(dir.len(), 3);
    assert_eq!(dir.get(256), Some(&Value::Long(vec![2048])));
    assert_eq!(dir.get(258), Some(&Value::Short(vec![8, 8, 8])));
    assert_eq!(
        dir.get(282),
        Some(&Value::Rational(vec![Rational::new(300, 1)]))
    );
}

#[test]
fn test_same_structure_in_both_byte_orders() {
    let build = |order| {
        let mut s = StreamBuilder::new(order, 8);
        s.u16(2).short_entry(1, 0x0102).entry(2, 4, 1, 0x0A0B0C0D).u32(0);
        decode(s.cursor()).unwrap()
    };

    let little = build(LE);
    let big = build(BE);
    assert_eq!(little, big);
    assert_eq!(
        little.directories[0].get(2),
        Some(&Value::Long(vec![0x0A0B0C0D]))
    );
}

// =============================================================================
// Jump Pattern Tests
// =============================================================================

#[test]
fn test_out_of_line_reads_return_to_entry_table() {
    let reader = TrackingReader::new(big_endian_stream().finish());
    let handle = reader.clone();

    decode(reader).unwrap();

    // Entry 258's field ends at 34 and entry 282's at 46
    let seeks = handle.seek_targets();
    assert!(
        seeks.ends_with(&[52, 34, 60, 46]),
        "unexpected seek sequence: {:?}",
        seeks
    );
}

#[test]
fn test_oversized_count_is_rejected_before_reading() {
    let mut s = StreamBuilder::new(LE, 8);
    s.u16(1).entry(273, 4, u32::MAX, 26).u32(0);

    let reader = TrackingReader::new(s.finish());
    let handle = reader.clone();
    let result = decode(reader);

    assert!(matches!(
        result,
        Err(DecodeError::Io(IoError::Truncated { offset: 26, .. }))
    ));
    // Header, entry count, one entry and nothing more
    assert!(handle.read_count() <= 8, "reads: {}", handle.read_count());
}

// =============================================================================
// Sub-directory Tests
// =============================================================================

#[test]
fn test_sub_directory_offset_table() {
    let mut s = StreamBuilder::new(LE, 8);
    // IFD 0 at 8, offset table at 26
    s.u16(1).entry(SUB_IFDS, 4, 2, 26).u32(0);
    s.u32(34).u32(52);
    // Child A at 34; its next pointer names child B and must be ignored
    s.u16(1).short_entry(1, 10).u32(52);
    // Child B at 52
    s.u16(1).short_entry(1, 20).u32(0);

    let container = decode(s.cursor()).unwrap();

    assert_eq!(container.len(), 1);
    let dir = &container.directories[0];
    assert!(dir.is_empty(), "offsets should be consumed");
    assert_eq!(dir.sub_directories.len(), 2);
    assert_eq!(dir.sub_directories[0].get(1), Some(&Value::Short(vec![10])));
    assert_eq!(dir.sub_directories[1].get(1), Some(&Value::Short(vec![20])));
}

#[test]
fn test_nested_sub_directories() {
    let mut s = StreamBuilder::new(BE, 8);
    // IFD 0 at 8 -> child at 26 -> grandchild at 44
    s.u16(1).entry(SUB_IFDS, 4, 1, 26).u32(0);
    s.u16(1).entry(SUB_IFDS, 4, 1, 44).u32(0);
    s.u16(1).short_entry(7, 77).u32(0);

    let container = decode(s.cursor()).unwrap();

    let child = &container.directories[0].sub_directories[0];
    assert!(child.is_empty());
    let grandchild = &child.sub_directories[0];
    assert_eq!(grandchild.get(7), Some(&Value::Short(vec![77])));
    assert_eq!(container.directories[0].tree_size(), 3);
}

#[test]
fn test_shared_sub_directory_is_a_cycle() {
    let mut s = StreamBuilder::new(LE, 8);
    // IFD 0 at 8 lists the directory at 26 twice
    s.u16(1).entry(SUB_IFDS, 4, 2, 26).u32(0);
    s.u32(34).u32(34);
    s.u16(0).u32(0);

    let result = decode(s.cursor());
    assert!(matches!(
        result,
        Err(DecodeError::DirectoryCycle { offset: 34 })
    ));
}

#[test]
fn test_depth_limit_counts_from_top_level() {
    let mut s = StreamBuilder::new(LE, 8);
    s.u16(1).entry(SUB_IFDS, 4, 1, 26).u32(0);
    s.u16(1).entry(SUB_IFDS, 4, 1, 44).u32(0);
    s.u16(0).u32(0);

    let registry = CoderRegistry::builtin();
    let shallow = Decoder::new(&registry).with_options(DecodeOptions::default().with_max_depth(1));
    assert!(matches!(
        shallow.decode(s.cursor()),
        Err(DecodeError::NestingTooDeep { depth: 2, .. })
    ));

    let deep = Decoder::new(&registry).with_options(DecodeOptions::default().with_max_depth(2));
    assert!(deep.decode(s.cursor()).is_ok());
}

// =============================================================================
// Malformed Stream Tests
// =============================================================================

#[test]
fn test_empty_stream() {
    let result = decode(Cursor::new(Vec::new()));
    assert!(matches!(
        result,
        Err(DecodeError::Io(IoError::Truncated { offset: 0, .. }))
    ));
}

#[test]
fn test_not_a_tiff() {
    let result = decode(Cursor::new(b"GIF89a\x01\x00\x01\x00".to_vec()));
    assert!(matches!(
        result,
        Err(DecodeError::MalformedHeader(HeaderError::InvalidByteOrder(_)))
    ));
}

#[test]
fn test_bigtiff_magic_rejected() {
    let mut s = StreamBuilder::new(LE, 8);
    s.u16(0).u32(0);
    let mut bytes = s.finish();
    bytes[2] = 43;

    let result = decode(Cursor::new(bytes));
    assert!(matches!(
        result,
        Err(DecodeError::MalformedHeader(HeaderError::InvalidMagic(43)))
    ));
}

#[test]
fn test_next_pointer_past_end() {
    let mut s = StreamBuilder::new(LE, 8);
    s.u16(0).u32(4096);

    let result = decode(s.cursor());
    assert!(matches!(
        result,
        Err(DecodeError::InvalidDirectoryOffset { offset: 4096, size: 14 })
    ));
}

#[test]
fn test_missing_next_pointer() {
    // Entry table complete, next pointer cut off
    let mut s = StreamBuilder::new(LE, 8);
    s.u16(1).short_entry(1, 1).u16(0);

    let result = decode(s.cursor());
    assert!(matches!(
        result,
        Err(DecodeError::Io(IoError::Truncated { offset: 22, .. }))
    ));
}

#[test]
fn test_decode_from_file() {
    let path = std::env::temp_dir().join(format!("tiff-dir-decode-{}.tif", std::process::id()));
    std::fs::write(&path, big_endian_stream().finish()).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let container = decode(std::io::BufReader::new(file)).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
        container.directories[0].get(258),
        Some(&Value::Short(vec![8, 8, 8]))
    );
}
